use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

fn bench_generate(c: &mut Criterion) {
    let now = chrono::Utc::now();
    c.bench_function("generate farm", |b| {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        b.iter(|| black_box(farm_sim::farm::generate(&mut rng, None, now)))
    });

    let mut rng = ChaCha8Rng::seed_from_u64(42);
    let farm = farm_sim::farm::generate(&mut rng, None, now);
    c.bench_function("30d history, 6h step", |b| {
        b.iter(|| black_box(farm_sim::sensor::farm_history(&mut rng, &farm, now, 30, 6)))
    });
}

criterion_group!(benches, bench_generate);
criterion_main!(benches);
