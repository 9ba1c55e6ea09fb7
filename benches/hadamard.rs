use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use fast_splits::algorithms::hadamard::{compute_in_place, compute_inverse_in_place};

fn bench_hadamard(c: &mut Criterion) {
    let mut group = c.benchmark_group("hadamard");
    let mut rng = StdRng::seed_from_u64(2024);
    for &bits in &[10u32, 14, 18] {
        let x: Vec<f64> = (0..1usize << bits).map(|_| rng.gen_range(0.0..1.0)).collect();
        group.bench_with_input(BenchmarkId::new("round_trip", bits), &x, |b, x| {
            b.iter(|| {
                let mut y = x.clone();
                compute_in_place(black_box(&mut y)).unwrap();
                compute_inverse_in_place(black_box(&mut y)).unwrap();
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_hadamard);
criterion_main!(benches);
