use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use ndarray::{Array1, Array2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use fast_splits::weights::SolverMode;
use fast_splits::weights::active_set::{ActiveSetParams, ActiveSetSolver};

/// `M = AᵀA + δI`, `v` with mixed signs so that some variables end up masked.
fn make_problem(n: usize, seed: u64) -> (Array2<f64>, Array1<f64>) {
    let mut rng = StdRng::seed_from_u64(seed);
    let a = Array2::from_shape_fn((2 * n, n), |_| rng.gen_range(-1.0..1.0));
    let mut m = a.t().dot(&a);
    for i in 0..n {
        m[[i, i]] += 0.01;
    }
    let v = Array1::from_shape_fn(n, |_| rng.gen_range(-1.0..2.0));
    (m, v)
}

fn bench_active_set(c: &mut Criterion) {
    let mut group = c.benchmark_group("active_set");
    for &n in &[50usize, 100, 200] {
        let (m, v) = make_problem(n, 2024);
        for mode in [SolverMode::Constrained, SolverMode::Unconstrained] {
            let params = ActiveSetParams {
                mode,
                ..Default::default()
            };
            let id = BenchmarkId::new(mode.as_str(), n);
            group.bench_with_input(id, &(&m, &v), |b, (m, v)| {
                b.iter(|| {
                    let solver = ActiveSetSolver::new(black_box(m), black_box(v), &params).unwrap();
                    let _ = solver.solve(None).unwrap();
                });
            });
        }
    }
    group.finish();
}

criterion_group!(benches, bench_active_set);
criterion_main!(benches);
