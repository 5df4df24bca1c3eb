use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use latentrec::algorithms::{score_items, EngineParams, NormalEquations};
use latentrec::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;

fn synthetic_store(items: usize, k: usize) -> ModelStore {
    let mut rng = StdRng::seed_from_u64(2024);
    let factors = (0..items)
        .map(|_| (0..k).map(|_| rng.gen_range(-0.5..0.5)).collect())
        .collect();
    let biases = (0..items).map(|_| rng.gen_range(-1.0..1.0)).collect();
    let index = (0..items).map(|i| (ItemId::from(i as i64), i)).collect();
    ModelStore::new(factors, biases, index).unwrap()
}

fn synthetic_ratings(items: usize, count: usize) -> RatingInput {
    let mut rng = StdRng::seed_from_u64(7);
    (0..count)
        .map(|_| {
            (
                ItemId::from(rng.gen_range(0..items) as i64),
                rng.gen_range(1..=5) as f64,
            )
        })
        .collect()
}

fn benchmark_solve(c: &mut Criterion) {
    let store = synthetic_store(10_000, 64);
    let params = EngineParams::default();

    c.bench_function("normal_equations_solve_k64_r20", |b| {
        b.iter(|| {
            let mut equations = NormalEquations::new(64, params.lambda, params.tau);
            for index in 0..20 {
                equations.accumulate(store.factor_row(index), 4.0, store.bias(index));
            }
            black_box(equations.solve().unwrap());
        });
    });
}

fn benchmark_scoring(c: &mut Criterion) {
    let store = synthetic_store(50_000, 64);
    let user_vector = nalgebra::DVector::from_element(64, 0.1);

    c.bench_function("score_items_50k_k64", |b| {
        b.iter(|| black_box(score_items(&store, &user_vector, 0.005)));
    });
}

fn benchmark_recommend(c: &mut Criterion) {
    let mut group = c.benchmark_group("recommend");

    for &items in &[1_000usize, 10_000, 50_000] {
        let store = Arc::new(synthetic_store(items, 32));
        let engine = RecommendationEngine::new(store, EngineParams::default());
        let ratings = synthetic_ratings(items, 10);

        group.bench_with_input(BenchmarkId::from_parameter(items), &items, |b, _| {
            b.iter(|| black_box(engine.recommend(&ratings, 12).unwrap()));
        });
    }

    group.finish();
}

fn benchmark_batch(c: &mut Criterion) {
    let store = Arc::new(synthetic_store(10_000, 32));
    let engine = RecommendationEngine::new(store, EngineParams::default());
    let requests: Vec<(RatingInput, usize)> = (0..64)
        .map(|i| (synthetic_ratings(10_000, 5 + i % 10), 12))
        .collect();

    c.bench_function("recommend_batch_64", |b| {
        b.iter(|| black_box(engine.recommend_batch(&requests)));
    });
}

criterion_group!(
    benches,
    benchmark_solve,
    benchmark_scoring,
    benchmark_recommend,
    benchmark_batch
);
criterion_main!(benches);
