use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use maintenance_mdp::{solve, Configuration, ModelParameters, SolverOptions, SweepPolicy};

fn sweep_policies(c: &mut Criterion) {
    let model = ModelParameters::new(365, 10, 5.0, 100.0, 0.8);
    let mut group = c.benchmark_group("value_iteration");
    group.sample_size(10);

    let cases = [
        ("jacobi", SweepPolicy::Jacobi, false),
        ("jacobi_parallel", SweepPolicy::Jacobi, true),
        ("gauss_seidel", SweepPolicy::GaussSeidel, false),
        ("sor_1.01", SweepPolicy::Sor { omega: 1.01 }, false),
    ];
    for (name, sweep, parallel) in cases {
        let config = Configuration::new(
            model,
            SolverOptions::new(sweep, 1e-6, 10_000).with_parallel(parallel),
        );
        group.bench_with_input(BenchmarkId::from_parameter(name), &config, |b, config| {
            b.iter(|| solve(black_box(config)).expect("finite values"))
        });
    }
    group.finish();
}

criterion_group!(benches, sweep_policies);
criterion_main!(benches);
