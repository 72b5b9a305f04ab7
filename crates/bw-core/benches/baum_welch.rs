//! Criterion benchmarks for the estimator hot path in `bw-core`.
//!
//! Sequences are drawn from the built-in presets with a fixed seed so runs
//! are comparable across machines.

use bw_config::{get_preset, PresetName};
use bw_core::{logspace, sample_sequence, HmmEstimator};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

fn preset_model(name: PresetName) -> HmmEstimator {
    HmmEstimator::from_spec(&get_preset(name)).expect("preset is valid")
}

fn bench_lattices(c: &mut Criterion) {
    let hmm = preset_model(PresetName::Casino);
    let mut group = c.benchmark_group("lattice");

    for len in [20usize, 200, 2000] {
        let obs = sample_sequence(&hmm, len, 7)
            .expect("sampling succeeds")
            .observations;
        group.bench_with_input(BenchmarkId::new("forward", len), &obs, |b, obs| {
            b.iter(|| {
                let alpha = hmm.forward(black_box(obs)).expect("forward");
                black_box(alpha);
            })
        });
        group.bench_with_input(BenchmarkId::new("backward", len), &obs, |b, obs| {
            b.iter(|| {
                let beta = hmm.backward(black_box(obs)).expect("backward");
                black_box(beta);
            })
        });
        group.bench_with_input(BenchmarkId::new("log_forward", len), &obs, |b, obs| {
            b.iter(|| {
                let alpha = logspace::log_forward(&hmm, black_box(obs)).expect("log_forward");
                black_box(alpha);
            })
        });
    }

    group.finish();
}

fn bench_training(c: &mut Criterion) {
    let mut group = c.benchmark_group("baum_welch");

    for (name, preset) in [
        ("weather", PresetName::Weather),
        ("casino", PresetName::Casino),
    ] {
        let hmm = preset_model(preset);
        let obs = sample_sequence(&hmm, 20, 11)
            .expect("sampling succeeds")
            .observations;
        group.bench_with_input(BenchmarkId::new("train_30", name), &obs, |b, obs| {
            b.iter(|| {
                let mut model = hmm.clone();
                let outcome = model.train(black_box(obs), 30).expect("train");
                black_box(outcome);
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_lattices, bench_training);
criterion_main!(benches);
