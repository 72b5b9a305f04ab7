//! Training outcome and the diagnostic series derived from it.

use bw_math::Matrix;
use serde::{Deserialize, Serialize};

/// Result of a Baum–Welch run.
///
/// Serializes as plain numeric arrays so the trace can be plotted or
/// tabulated without further transformation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingOutcome {
    /// Final transition matrix A.
    pub transition: Matrix,
    /// Final emission matrix B.
    pub emission: Matrix,
    /// Final initial distribution π.
    pub initial: Vec<f64>,
    /// `ln(P(O|λ) + ε)` per iteration, evaluated before that iteration's update.
    pub log_likelihoods: Vec<f64>,
    /// A after each iteration.
    pub transition_history: Vec<Matrix>,
}

impl TrainingOutcome {
    /// Number of completed iterations.
    pub fn iterations(&self) -> usize {
        self.log_likelihoods.len()
    }

    /// Negated log-likelihood per iteration.
    pub fn negative_log_likelihoods(&self) -> Vec<f64> {
        self.log_likelihoods.iter().map(|ll| -ll).collect()
    }

    /// `exp(ll)` per iteration, i.e. `P(O|λ) + ε`.
    pub fn probabilities(&self) -> Vec<f64> {
        self.log_likelihoods.iter().map(|ll| ll.exp()).collect()
    }

    /// `1 - P^(1/T)` per iteration: one minus the geometric-mean per-symbol
    /// probability for a sequence of length `sequence_len`.
    pub fn probability_complement(&self, sequence_len: usize) -> Vec<f64> {
        if sequence_len == 0 {
            return Vec::new();
        }
        let inv_t = 1.0 / sequence_len as f64;
        self.log_likelihoods
            .iter()
            .map(|ll| 1.0 - (ll * inv_t).exp())
            .collect()
    }

    /// Value of A\[i\]\[j\] after each iteration. Empty when out of bounds.
    pub fn transition_trajectory(&self, i: usize, j: usize) -> Vec<f64> {
        self.transition_history
            .iter()
            .filter_map(|a| a.get(i, j))
            .collect()
    }

    /// True when no iteration lowers the log-likelihood by more than `tol`.
    pub fn is_monotone(&self, tol: f64) -> bool {
        self.log_likelihoods.windows(2).all(|w| w[1] >= w[0] - tol)
    }

    /// Log-likelihood of the last iteration, if any ran.
    pub fn final_log_likelihood(&self) -> Option<f64> {
        self.log_likelihoods.last().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(lls: Vec<f64>) -> TrainingOutcome {
        let history = lls
            .iter()
            .enumerate()
            .map(|(k, _)| {
                let p = 0.1 * (k + 1) as f64;
                Matrix::from_rows(vec![vec![1.0 - p, p], vec![0.5, 0.5]]).unwrap()
            })
            .collect();
        TrainingOutcome {
            transition: Matrix::zeros(2, 2),
            emission: Matrix::zeros(2, 2),
            initial: vec![0.5, 0.5],
            log_likelihoods: lls,
            transition_history: history,
        }
    }

    #[test]
    fn derived_series() {
        let o = outcome(vec![-4.0, -3.0]);
        assert_eq!(o.iterations(), 2);
        assert_eq!(o.negative_log_likelihoods(), vec![4.0, 3.0]);
        assert!((o.probabilities()[1] - (-3.0f64).exp()).abs() < 1e-15);
        let c = o.probability_complement(2);
        assert!((c[0] - (1.0 - (-2.0f64).exp())).abs() < 1e-15);
        assert!(o.probability_complement(0).is_empty());
        assert_eq!(o.final_log_likelihood(), Some(-3.0));
    }

    #[test]
    fn trajectory_follows_history() {
        let o = outcome(vec![-2.0, -1.5, -1.0]);
        let traj = o.transition_trajectory(0, 1);
        assert_eq!(traj.len(), 3);
        assert!((traj[2] - 0.3).abs() < 1e-12);
        assert!(o.transition_trajectory(5, 0).is_empty());
    }

    #[test]
    fn monotonicity_with_tolerance() {
        assert!(outcome(vec![-3.0, -2.0, -2.0]).is_monotone(0.0));
        assert!(!outcome(vec![-3.0, -3.5]).is_monotone(1e-6));
        assert!(outcome(vec![-3.0, -3.0 - 1e-9]).is_monotone(1e-6));
        assert!(outcome(vec![]).is_monotone(0.0));
    }

    #[test]
    fn empty_outcome() {
        let o = outcome(vec![]);
        assert_eq!(o.final_log_likelihood(), None);
        assert!(o.negative_log_likelihoods().is_empty());
    }

    #[test]
    fn serializes_as_plain_arrays() {
        let o = outcome(vec![-1.0]);
        let json = serde_json::to_value(&o).unwrap();
        assert_eq!(json["initial"], serde_json::json!([0.5, 0.5]));
        assert_eq!(json["transition_history"][0][1], serde_json::json!([0.5, 0.5]));
    }
}
