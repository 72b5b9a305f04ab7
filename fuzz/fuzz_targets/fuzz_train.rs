//! Fuzz target for training on arbitrary small models.
//!
//! Degenerate parameters may produce NaN, but training must never panic and
//! the traces must always hold one entry per iteration.

#![no_main]

use arbitrary::Arbitrary;
use bw_core::HmmEstimator;
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
struct Input {
    n: u8,
    m: u8,
    params: Vec<u16>,
    observations: Vec<u8>,
    iterations: u8,
}

fuzz_target!(|input: Input| {
    let n = (input.n % 4) as usize + 1;
    let m = (input.m % 4) as usize + 1;
    if input.params.len() < n * n + n * m + n {
        return;
    }
    let value = |k: usize| input.params[k] as f64 / u16::MAX as f64;

    let transition = (0..n)
        .map(|i| (0..n).map(|j| value(i * n + j)).collect())
        .collect();
    let emission = (0..n)
        .map(|i| (0..m).map(|k| value(n * n + i * m + k)).collect())
        .collect();
    let initial = (0..n).map(|i| value(n * n + n * m + i)).collect();

    let Ok(mut hmm) = HmmEstimator::from_rows(transition, emission, initial) else {
        return;
    };
    let observations: Vec<usize> = input
        .observations
        .iter()
        .take(64)
        .map(|&o| o as usize % m)
        .collect();
    let iterations = (input.iterations % 16) as usize;

    if let Ok(outcome) = hmm.train(&observations, iterations) {
        assert_eq!(outcome.log_likelihoods.len(), iterations);
        assert_eq!(outcome.transition_history.len(), iterations);
    }
});
