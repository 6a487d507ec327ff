//! Benchmarks for k-NN search across the indexes.

#![expect(missing_docs)]

use criterion::{BenchmarkGroup, BenchmarkId, Criterion, criterion_group, criterion_main, measurement::WallTime};
use metric_index::{
    BallCoverConfig, KdTree, LinearScan, OneShotBallCover, OneShotConfig, RandomBallCover, VectorCollection,
    distances::{Euclidean, Vector},
};
use rand::prelude::*;

fn tabular(car: usize, dim: usize, rng: &mut StdRng) -> Vec<Vector> {
    (0..car)
        .map(|_| Vector::from((0..dim).map(|_| rng.random_range(-1.0..1.0)).collect::<Vec<_>>()))
        .collect()
}

fn bench_one<C: VectorCollection>(group: &mut BenchmarkGroup<'_, WallTime>, index: &C, queries: &[Vector], k: usize) {
    group.bench_with_input(BenchmarkId::new(index.name(), k), &k, |b, &k| {
        b.iter(|| index.batch_search_knn(queries, k));
    });
}

fn knn(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(42);

    for (car, dim) in [(10_000, 4), (10_000, 16)] {
        let data = tabular(car, dim, &mut rng);
        let queries = tabular(100, dim, &mut rng);

        let linear = LinearScan::par_new(data.clone(), Euclidean).unwrap_or_else(|e| unreachable!("{e}"));
        let tree = KdTree::par_new_minimal(data.clone(), Euclidean).unwrap_or_else(|e| unreachable!("{e}"));
        let rbc = RandomBallCover::par_new_with(data.clone(), Euclidean, BallCoverConfig::default().with_seed(42))
            .unwrap_or_else(|e| unreachable!("{e}"));
        let osbc = OneShotBallCover::par_new(data, Euclidean, OneShotConfig::default().with_seed(42)).unwrap_or_else(|e| unreachable!("{e}"));

        let mut group = c.benchmark_group(format!("knn-{car}x{dim}"));
        group.sample_size(10);
        for k in [1, 10, 100] {
            bench_one(&mut group, &linear, &queries, k);
            bench_one(&mut group, &tree, &queries, k);
            bench_one(&mut group, &rbc, &queries, k);
            bench_one(&mut group, &osbc, &queries, k);
        }
        group.finish();
    }
}

criterion_group!(benches, knn);
criterion_main!(benches);
