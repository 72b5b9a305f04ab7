//! hmm-bw core library.
//!
//! Discrete hidden Markov model estimation with Baum–Welch:
//! - [`estimator`]: forward, backward, posteriors and EM re-estimation
//! - [`trace`]: training outcome and derived convergence series
//! - [`logspace`]: log-domain likelihood for long sequences
//! - [`sample`]: seeded synthetic sequences
//! - [`report`]: command payloads and renderings
//!
//! The binary entry point is in `main.rs`.

pub mod estimator;
pub mod exit_codes;
pub mod logging;
pub mod logspace;
pub mod report;
pub mod sample;
pub mod schema;
pub mod trace;

pub use estimator::{EstimatorError, HmmEstimator, Posteriors, EPSILON};
pub use sample::{sample_sequence, SampledSequence};
pub use trace::TrainingOutcome;
