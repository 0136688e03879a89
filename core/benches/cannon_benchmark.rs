use cannon::config::{Fill, RunConfig};
use cannon::harness::run_threaded;
use cannon::matrix::Matrix;
use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;

fn benchmark_cannon(c: &mut Criterion) {
    let mut group = c.benchmark_group("cannon");
    group.sample_size(10);

    // Same N across grid sizes to see how the work splits.
    let dim = 240;
    for processes in [1, 4, 9, 16] {
        let config = RunConfig::new(dim).with_fill(Fill::Sequence);
        group.bench_function(format!("{}x{}_p{}", dim, dim, processes), |b| {
            b.iter(|| run_threaded::<i64>(black_box(processes), &config).unwrap())
        });
    }
    group.finish();
}

fn benchmark_oracle(c: &mut Criterion) {
    let mut group = c.benchmark_group("oracle");

    for dim in [64, 128, 240] {
        let a = Matrix::<i64>::sequence(dim, 0);
        let b = Matrix::<i64>::sequence(dim, 1);
        group.bench_function(format!("{}x{}", dim, dim), |bench| {
            bench.iter(|| black_box(&a).matmul(black_box(&b)).unwrap())
        });
    }
    group.finish();
}

criterion_group!(benches, benchmark_cannon, benchmark_oracle);
criterion_main!(benches);
