//! Criterion benchmarks for `bw-math`.
//!
//! Focus on the log-domain kernels that the forward/backward cross-check
//! calls once per lattice cell.

use bw_math::{log_add_exp, log_sum_exp, Matrix};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

fn bench_log_kernels(c: &mut Criterion) {
    let mut group = c.benchmark_group("log_domain");

    for width in [2usize, 8, 32] {
        let values: Vec<f64> = (0..width).map(|i| -(i as f64) * 3.5 - 200.0).collect();
        group.bench_with_input(BenchmarkId::new("log_sum_exp", width), &values, |b, v| {
            b.iter(|| black_box(log_sum_exp(black_box(v))));
        });
        group.bench_with_input(BenchmarkId::new("log_add_exp_fold", width), &values, |b, v| {
            b.iter(|| {
                black_box(
                    v.iter()
                        .fold(f64::NEG_INFINITY, |acc, x| log_add_exp(acc, *x)),
                )
            });
        });
    }

    group.finish();
}

fn bench_matrix_rows(c: &mut Criterion) {
    let m = Matrix::filled(64, 64, 1.0 / 64.0);
    c.bench_function("matrix/row_stochastic_64", |b| {
        b.iter(|| black_box(black_box(&m).is_row_stochastic(1e-9)));
    });
}

criterion_group!(benches, bench_log_kernels, bench_matrix_rows);
criterion_main!(benches);
