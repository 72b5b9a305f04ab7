//! Synthetic sequences drawn from a model.

use rand::distr::weighted::WeightedIndex;
use rand::distr::Distribution;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;

use crate::estimator::{EstimatorError, HmmEstimator};

/// A hidden state path and the symbols it emitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SampledSequence {
    pub seed: u64,
    pub states: Vec<usize>,
    pub observations: Vec<usize>,
}

/// Draw `len` steps from the model with a seeded generator.
///
/// Rows need not sum to one; each is sampled in proportion to its weights.
/// A row with negative, NaN or all-zero weights is an
/// [`EstimatorError::InvalidParameter`].
pub fn sample_sequence(
    hmm: &HmmEstimator,
    len: usize,
    seed: u64,
) -> Result<SampledSequence, EstimatorError> {
    let initial = row_distribution(hmm.initial(), "initial", 0)?;
    let transition = (0..hmm.n_states())
        .map(|i| row_distribution(hmm.transition().row(i), "transition", i))
        .collect::<Result<Vec<_>, _>>()?;
    let emission = (0..hmm.n_states())
        .map(|i| row_distribution(hmm.emission().row(i), "emission", i))
        .collect::<Result<Vec<_>, _>>()?;

    let mut rng = StdRng::seed_from_u64(seed);
    let mut states = Vec::with_capacity(len);
    let mut observations = Vec::with_capacity(len);

    let mut state: Option<usize> = None;
    for _ in 0..len {
        let next = match state {
            None => initial.sample(&mut rng),
            Some(prev) => transition[prev].sample(&mut rng),
        };
        states.push(next);
        observations.push(emission[next].sample(&mut rng));
        state = Some(next);
    }

    Ok(SampledSequence {
        seed,
        states,
        observations,
    })
}

fn row_distribution(
    weights: &[f64],
    table: &str,
    row: usize,
) -> Result<WeightedIndex<f64>, EstimatorError> {
    WeightedIndex::new(weights).map_err(|err| {
        EstimatorError::InvalidParameter(format!(
            "cannot sample from {} row {}: {}",
            table, row, err
        ))
    })
}
