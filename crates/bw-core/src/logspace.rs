//! Log-domain forward/backward.
//!
//! The same recursions as [`HmmEstimator::forward`] and
//! [`HmmEstimator::backward`], carried out on `ln` probabilities with
//! log-sum-exp so that long sequences do not underflow. Training itself
//! stays in the raw domain; these are used to report the likelihood of a
//! trained model and to cross-check the raw lattices.

use bw_math::{ln_prob, log_normalize, log_sum_exp, Matrix};

use crate::estimator::{EstimatorError, HmmEstimator};

/// ln α (T×N). Zero probabilities map to `-inf`.
pub fn log_forward(hmm: &HmmEstimator, observations: &[usize]) -> Result<Matrix, EstimatorError> {
    hmm.check_observations(observations)?;
    let n = hmm.n_states();
    let a = hmm.transition();
    let b = hmm.emission();
    let mut alpha = Matrix::zeros(observations.len(), n);

    for j in 0..n {
        alpha[(0, j)] = ln_prob(hmm.initial()[j]) + ln_prob(b[(j, observations[0])]);
    }
    let mut terms = vec![0.0; n];
    for t in 1..observations.len() {
        for j in 0..n {
            for i in 0..n {
                terms[i] = alpha[(t - 1, i)] + ln_prob(a[(i, j)]);
            }
            alpha[(t, j)] = log_sum_exp(&terms) + ln_prob(b[(j, observations[t])]);
        }
    }
    Ok(alpha)
}

/// ln β (T×N).
pub fn log_backward(
    hmm: &HmmEstimator,
    observations: &[usize],
) -> Result<Matrix, EstimatorError> {
    hmm.check_observations(observations)?;
    let n = hmm.n_states();
    let a = hmm.transition();
    let b = hmm.emission();
    let t_len = observations.len();
    // ln 1 = 0, so the last row is already correct.
    let mut beta = Matrix::zeros(t_len, n);

    let mut terms = vec![0.0; n];
    for t in (0..t_len - 1).rev() {
        let next = observations[t + 1];
        for i in 0..n {
            for j in 0..n {
                terms[j] = ln_prob(a[(i, j)]) + ln_prob(b[(j, next)]) + beta[(t + 1, j)];
            }
            beta[(t, i)] = log_sum_exp(&terms);
        }
    }
    Ok(beta)
}

/// ln P(O | λ), without the ε floor. `-inf` when the sequence is impossible.
pub fn log_likelihood(hmm: &HmmEstimator, observations: &[usize]) -> Result<f64, EstimatorError> {
    let alpha = log_forward(hmm, observations)?;
    Ok(log_sum_exp(alpha.row(alpha.rows() - 1)))
}

/// State posteriors γ computed in the log domain and normalized per step.
///
/// Rows for an impossible sequence come out uniform.
pub fn log_state_posteriors(
    hmm: &HmmEstimator,
    observations: &[usize],
) -> Result<Matrix, EstimatorError> {
    let alpha = log_forward(hmm, observations)?;
    let beta = log_backward(hmm, observations)?;
    let n = hmm.n_states();
    let mut gamma = Matrix::zeros(observations.len(), n);
    let mut joint = vec![0.0; n];
    for t in 0..observations.len() {
        for i in 0..n {
            joint[i] = alpha[(t, i)] + beta[(t, i)];
        }
        gamma.row_mut(t).copy_from_slice(&log_normalize(&joint));
    }
    Ok(gamma)
}
