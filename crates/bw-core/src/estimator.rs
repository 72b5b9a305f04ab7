//! Discrete HMM estimator: forward, backward and Baum–Welch re-estimation.
//!
//! Probabilities are kept in the raw (unscaled) domain. Every division in the
//! E-step and M-step adds [`EPSILON`] to its denominator, so a sequence with
//! zero probability under the current parameters yields zeros rather than a
//! division by zero. Raw lattices underflow for long sequences; see
//! [`crate::logspace`] for the log-domain likelihood.
//!
//! ```
//! use bw_core::estimator::HmmEstimator;
//!
//! let mut hmm = HmmEstimator::from_rows(
//!     vec![vec![0.7, 0.3], vec![0.4, 0.6]],
//!     vec![vec![0.1, 0.9], vec![0.6, 0.4]],
//!     vec![0.6, 0.4],
//! )
//! .unwrap();
//! let outcome = hmm.train(&[0, 1, 1, 0, 1], 30).unwrap();
//! assert_eq!(outcome.log_likelihoods.len(), 30);
//! ```

use bw_config::ModelSpec;
use bw_math::{Matrix, MatrixError};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, trace};

use crate::trace::TrainingOutcome;

/// Additive floor applied to every denominator and to the likelihood before
/// taking its logarithm.
pub const EPSILON: f64 = 1e-10;

/// Errors raised by the estimator.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EstimatorError {
    #[error("observation sequence is empty")]
    EmptyObservation,

    #[error("symbol {symbol} at position {index} is outside [0, {n_symbols})")]
    InvalidObservation {
        index: usize,
        symbol: usize,
        n_symbols: usize,
    },

    #[error("{what} has {got} {unit}, expected {expected}")]
    DimensionMismatch {
        what: &'static str,
        unit: &'static str,
        expected: usize,
        got: usize,
    },

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error(transparent)]
    Matrix(#[from] MatrixError),
}

impl From<EstimatorError> for bw_common::Error {
    fn from(err: EstimatorError) -> Self {
        match err {
            EstimatorError::EmptyObservation | EstimatorError::InvalidObservation { .. } => {
                bw_common::Error::InvalidObservation(err.to_string())
            }
            EstimatorError::DimensionMismatch { .. }
            | EstimatorError::InvalidParameter(_)
            | EstimatorError::Matrix(_) => bw_common::Error::InvalidParameter(err.to_string()),
        }
    }
}

/// E-step posteriors for one observation sequence.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Posteriors {
    /// P(O | λ), the sum of the last forward row.
    pub probability: f64,
    /// γ\[t\]\[i\]: probability of being in state i at time t. T×N.
    pub gamma: Matrix,
    /// ξ\[t\]\[i\]\[j\]: probability of moving i→j between t and t+1.
    /// One N×N matrix per transition, T-1 in total.
    pub xi: Vec<Matrix>,
}

/// Discrete HMM parameters λ = (A, B, π) and the operations on them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HmmEstimator {
    transition: Matrix,
    emission: Matrix,
    initial: Vec<f64>,
}

impl HmmEstimator {
    /// Create an estimator from initial guesses.
    ///
    /// Only shapes are checked: A must be N×N, B must have N rows and at
    /// least one column, π must have N entries. Rows are not required to
    /// sum to one.
    pub fn new(
        transition: Matrix,
        emission: Matrix,
        initial: Vec<f64>,
    ) -> Result<Self, EstimatorError> {
        let n = transition.rows();
        if n == 0 {
            return Err(EstimatorError::InvalidParameter(
                "model needs at least one state".to_string(),
            ));
        }
        if transition.cols() != n {
            return Err(EstimatorError::DimensionMismatch {
                what: "transition matrix",
                unit: "columns",
                expected: n,
                got: transition.cols(),
            });
        }
        if emission.rows() != n {
            return Err(EstimatorError::DimensionMismatch {
                what: "emission matrix",
                unit: "rows",
                expected: n,
                got: emission.rows(),
            });
        }
        if emission.cols() == 0 {
            return Err(EstimatorError::InvalidParameter(
                "emission matrix needs at least one symbol column".to_string(),
            ));
        }
        if initial.len() != n {
            return Err(EstimatorError::DimensionMismatch {
                what: "initial distribution",
                unit: "entries",
                expected: n,
                got: initial.len(),
            });
        }
        Ok(Self {
            transition,
            emission,
            initial,
        })
    }

    /// Create an estimator from nested rows.
    pub fn from_rows(
        transition: Vec<Vec<f64>>,
        emission: Vec<Vec<f64>>,
        initial: Vec<f64>,
    ) -> Result<Self, EstimatorError> {
        Self::new(
            Matrix::from_rows(transition)?,
            Matrix::from_rows(emission)?,
            initial,
        )
    }

    /// Create an estimator from a loaded model file.
    pub fn from_spec(spec: &ModelSpec) -> Result<Self, EstimatorError> {
        Self::from_rows(
            spec.transition.clone(),
            spec.emission.clone(),
            spec.initial.clone(),
        )
    }

    /// Number of hidden states N.
    pub fn n_states(&self) -> usize {
        self.transition.rows()
    }

    /// Alphabet size M.
    pub fn n_symbols(&self) -> usize {
        self.emission.cols()
    }

    /// Transition matrix A.
    pub fn transition(&self) -> &Matrix {
        &self.transition
    }

    /// Emission matrix B.
    pub fn emission(&self) -> &Matrix {
        &self.emission
    }

    /// Initial distribution π.
    pub fn initial(&self) -> &[f64] {
        &self.initial
    }

    /// Reject empty sequences and symbols outside `[0, M)`.
    pub fn check_observations(&self, observations: &[usize]) -> Result<(), EstimatorError> {
        if observations.is_empty() {
            return Err(EstimatorError::EmptyObservation);
        }
        let m = self.n_symbols();
        match observations.iter().position(|&o| o >= m) {
            Some(index) => Err(EstimatorError::InvalidObservation {
                index,
                symbol: observations[index],
                n_symbols: m,
            }),
            None => Ok(()),
        }
    }

    /// Forward lattice α (T×N).
    pub fn forward(&self, observations: &[usize]) -> Result<Matrix, EstimatorError> {
        self.check_observations(observations)?;
        Ok(self.forward_lattice(observations))
    }

    /// Backward lattice β (T×N).
    pub fn backward(&self, observations: &[usize]) -> Result<Matrix, EstimatorError> {
        self.check_observations(observations)?;
        Ok(self.backward_lattice(observations))
    }

    /// P(O | λ) computed from the forward lattice.
    pub fn sequence_probability(&self, observations: &[usize]) -> Result<f64, EstimatorError> {
        let alpha = self.forward(observations)?;
        Ok(alpha.row(alpha.rows() - 1).iter().sum())
    }

    /// E-step posteriors γ and ξ under the current parameters.
    pub fn posteriors(&self, observations: &[usize]) -> Result<Posteriors, EstimatorError> {
        self.check_observations(observations)?;
        let alpha = self.forward_lattice(observations);
        let beta = self.backward_lattice(observations);
        Ok(self.posteriors_from(observations, &alpha, &beta))
    }

    /// Run exactly `iterations` rounds of Baum–Welch re-estimation.
    ///
    /// The parameters are updated in place; the returned outcome carries the
    /// final parameters, `ln(P(O|λ) + ε)` for each round (evaluated before
    /// that round's update) and a copy of A after each round.
    pub fn baum_welch(
        &mut self,
        observations: &[usize],
        iterations: usize,
    ) -> Result<TrainingOutcome, EstimatorError> {
        self.check_observations(observations)?;

        let mut log_likelihoods = Vec::with_capacity(iterations);
        let mut transition_history = Vec::with_capacity(iterations);

        for iteration in 0..iterations {
            let alpha = self.forward_lattice(observations);
            let beta = self.backward_lattice(observations);
            let posteriors = self.posteriors_from(observations, &alpha, &beta);

            let log_likelihood = (posteriors.probability + EPSILON).ln();
            log_likelihoods.push(log_likelihood);
            debug!(
                iteration,
                log_likelihood,
                probability = posteriors.probability,
                "baum-welch iteration"
            );

            self.maximize(observations, &posteriors);
            transition_history.push(self.transition.clone());
        }

        Ok(TrainingOutcome {
            transition: self.transition.clone(),
            emission: self.emission.clone(),
            initial: self.initial.clone(),
            log_likelihoods,
            transition_history,
        })
    }

    /// Alias for [`HmmEstimator::baum_welch`].
    pub fn train(
        &mut self,
        observations: &[usize],
        iterations: usize,
    ) -> Result<TrainingOutcome, EstimatorError> {
        self.baum_welch(observations, iterations)
    }

    fn forward_lattice(&self, obs: &[usize]) -> Matrix {
        let n = self.n_states();
        let mut alpha = Matrix::zeros(obs.len(), n);

        for j in 0..n {
            alpha[(0, j)] = self.initial[j] * self.emission[(j, obs[0])];
        }
        for t in 1..obs.len() {
            for j in 0..n {
                let mut sum = 0.0;
                for i in 0..n {
                    sum += alpha[(t - 1, i)] * self.transition[(i, j)];
                }
                alpha[(t, j)] = sum * self.emission[(j, obs[t])];
            }
        }
        alpha
    }

    fn backward_lattice(&self, obs: &[usize]) -> Matrix {
        let n = self.n_states();
        let t_len = obs.len();
        let mut beta = Matrix::zeros(t_len, n);

        beta.row_mut(t_len - 1).fill(1.0);
        for t in (0..t_len - 1).rev() {
            for i in 0..n {
                let mut sum = 0.0;
                for j in 0..n {
                    sum += self.transition[(i, j)]
                        * self.emission[(j, obs[t + 1])]
                        * beta[(t + 1, j)];
                }
                beta[(t, i)] = sum;
            }
        }
        beta
    }

    fn posteriors_from(&self, obs: &[usize], alpha: &Matrix, beta: &Matrix) -> Posteriors {
        let n = self.n_states();
        let t_len = obs.len();
        let probability: f64 = alpha.row(t_len - 1).iter().sum();
        trace!(probability, "e-step total");

        let mut gamma = Matrix::zeros(t_len, n);
        for t in 0..t_len {
            for i in 0..n {
                gamma[(t, i)] = alpha[(t, i)] * beta[(t, i)] / (probability + EPSILON);
            }
        }

        let mut xi = Vec::with_capacity(t_len.saturating_sub(1));
        for t in 0..t_len.saturating_sub(1) {
            let next = obs[t + 1];
            let mut joint = Matrix::zeros(n, n);
            let mut denom = 0.0;
            for i in 0..n {
                for j in 0..n {
                    let v = alpha[(t, i)]
                        * self.transition[(i, j)]
                        * self.emission[(j, next)]
                        * beta[(t + 1, j)];
                    joint[(i, j)] = v;
                    denom += v;
                }
            }
            for i in 0..n {
                for j in 0..n {
                    joint[(i, j)] /= denom + EPSILON;
                }
            }
            xi.push(joint);
        }

        Posteriors {
            probability,
            gamma,
            xi,
        }
    }

    /// M-step. π from γ\[0\], A from ξ over γ\[0..T-1\], B from γ.
    fn maximize(&mut self, obs: &[usize], posteriors: &Posteriors) {
        let n = self.n_states();
        let m = self.n_symbols();
        let t_len = obs.len();
        let gamma = &posteriors.gamma;

        self.initial.copy_from_slice(gamma.row(0));

        for i in 0..n {
            let occupancy: f64 = (0..t_len - 1).map(|t| gamma[(t, i)]).sum();
            for j in 0..n {
                let expected: f64 = posteriors.xi.iter().map(|x| x[(i, j)]).sum();
                self.transition[(i, j)] = expected / (occupancy + EPSILON);
            }
        }

        for i in 0..n {
            let occupancy: f64 = (0..t_len).map(|t| gamma[(t, i)]).sum();
            for k in 0..m {
                let emitted: f64 = (0..t_len)
                    .filter(|&t| obs[t] == k)
                    .map(|t| gamma[(t, i)])
                    .sum();
                self.emission[(i, k)] = emitted / (occupancy + EPSILON);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference() -> HmmEstimator {
        HmmEstimator::from_rows(
            vec![vec![0.7, 0.3], vec![0.4, 0.6]],
            vec![vec![0.1, 0.9], vec![0.6, 0.4]],
            vec![0.6, 0.4],
        )
        .unwrap()
    }

    fn approx_eq(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() <= tol
    }

    #[test]
    fn forward_first_row_is_initial_times_emission() {
        let alpha = reference().forward(&[0, 1]).unwrap();
        assert!(approx_eq(alpha[(0, 0)], 0.6 * 0.1, 1e-15));
        assert!(approx_eq(alpha[(0, 1)], 0.4 * 0.6, 1e-15));
        // α[1][0] = (0.06·0.7 + 0.24·0.4)·0.9
        assert!(approx_eq(alpha[(1, 0)], (0.06 * 0.7 + 0.24 * 0.4) * 0.9, 1e-15));
    }

    #[test]
    fn backward_last_row_is_ones() {
        let beta = reference().backward(&[0, 1, 1]).unwrap();
        assert_eq!(beta.row(2), &[1.0, 1.0]);
        // β[1][0] = 0.7·0.9 + 0.3·0.4
        assert!(approx_eq(beta[(1, 0)], 0.7 * 0.9 + 0.3 * 0.4, 1e-15));
    }

    #[test]
    fn single_observation_lattices() {
        let hmm = reference();
        let alpha = hmm.forward(&[0]).unwrap();
        assert_eq!(alpha.shape(), (1, 2));
        let beta = hmm.backward(&[0]).unwrap();
        assert_eq!(beta.to_rows(), vec![vec![1.0, 1.0]]);
        assert!(hmm.posteriors(&[0]).unwrap().xi.is_empty());
    }

    #[test]
    fn gamma_rows_sum_to_one() {
        let post = reference().posteriors(&[0, 1, 1, 0, 1]).unwrap();
        for row in post.gamma.iter_rows() {
            assert!(approx_eq(row.iter().sum(), 1.0, 1e-8));
        }
        assert_eq!(post.xi.len(), 4);
        for x in &post.xi {
            assert!(approx_eq(x.as_slice().iter().sum(), 1.0, 1e-8));
        }
    }

    #[test]
    fn empty_sequence_is_rejected() {
        let mut hmm = reference();
        assert_eq!(hmm.forward(&[]), Err(EstimatorError::EmptyObservation));
        assert_eq!(hmm.backward(&[]), Err(EstimatorError::EmptyObservation));
        assert_eq!(
            hmm.train(&[], 3).unwrap_err(),
            EstimatorError::EmptyObservation
        );
    }

    #[test]
    fn out_of_range_symbol_is_rejected() {
        let err = reference().forward(&[0, 1, 2]).unwrap_err();
        assert_eq!(
            err,
            EstimatorError::InvalidObservation {
                index: 2,
                symbol: 2,
                n_symbols: 2
            }
        );
        assert!(err.to_string().contains("outside [0, 2)"));
    }

    #[test]
    fn rejected_training_leaves_parameters_untouched() {
        let mut hmm = reference();
        let before = hmm.clone();
        assert!(hmm.train(&[0, 5], 10).is_err());
        assert_eq!(hmm, before);
    }

    #[test]
    fn construction_checks_shapes() {
        let err = HmmEstimator::from_rows(
            vec![vec![0.5, 0.5], vec![0.5, 0.5]],
            vec![vec![1.0]],
            vec![0.5, 0.5],
        )
        .unwrap_err();
        assert!(matches!(
            err,
            EstimatorError::DimensionMismatch { what: "emission matrix", .. }
        ));

        let err = HmmEstimator::from_rows(
            vec![vec![0.5, 0.5]],
            vec![vec![1.0]],
            vec![1.0],
        )
        .unwrap_err();
        assert!(matches!(err, EstimatorError::DimensionMismatch { .. }));

        let err = HmmEstimator::from_rows(vec![], vec![], vec![]).unwrap_err();
        assert!(matches!(err, EstimatorError::InvalidParameter(_)));

        let err = HmmEstimator::from_rows(
            vec![vec![1.0]],
            vec![vec![1.0]],
            vec![0.5, 0.5],
        )
        .unwrap_err();
        assert!(err.to_string().contains("initial distribution"));
    }

    #[test]
    fn ragged_rows_are_matrix_errors() {
        let err = HmmEstimator::from_rows(
            vec![vec![0.5, 0.5], vec![1.0]],
            vec![vec![1.0], vec![1.0]],
            vec![0.5, 0.5],
        )
        .unwrap_err();
        assert!(matches!(err, EstimatorError::Matrix(_)));
    }

    #[test]
    fn non_stochastic_input_is_tolerated() {
        let hmm = HmmEstimator::from_rows(
            vec![vec![2.0, 0.0], vec![0.0, 0.0]],
            vec![vec![0.0, 0.0], vec![0.0, 0.0]],
            vec![1.0, 1.0],
        )
        .unwrap();
        let mut trained = hmm.clone();
        let outcome = trained.train(&[0, 1], 2).unwrap();
        assert_eq!(outcome.log_likelihoods.len(), 2);
        assert!(outcome.log_likelihoods.iter().all(|ll| ll.is_finite()));
    }

    #[test]
    fn error_maps_to_common_codes() {
        let err: bw_common::Error = EstimatorError::EmptyObservation.into();
        assert_eq!(err.code(), 21);
        let err: bw_common::Error = EstimatorError::InvalidParameter("x".into()).into();
        assert_eq!(err.code(), 30);
    }

    #[test]
    fn from_spec_uses_model_tables() {
        let spec = bw_config::get_preset(bw_config::PresetName::Casino);
        let hmm = HmmEstimator::from_spec(&spec).unwrap();
        assert_eq!(hmm.n_states(), 2);
        assert_eq!(hmm.n_symbols(), 6);
        assert_eq!(hmm.initial(), &[0.5, 0.5]);
    }
}
