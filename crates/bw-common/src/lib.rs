//! hmm-bw common types and errors.
//!
//! This crate provides foundational types shared across the workspace:
//! - The unified error type with stable codes
//! - Output formats
//! - Observation sequence parsing

pub mod error;
pub mod observation;
pub mod output;

pub use error::{format_error_human, Error, ErrorCategory, Result, StructuredError};
pub use observation::{format_observations, parse_observations, ObservationParseError};
pub use output::OutputFormat;
