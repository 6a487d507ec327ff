//! Data generation utilities for testing.

use metric_index::distances::{SparseVector, Vector};
use rand::prelude::*;

/// Uniformly random dense vectors with values in `[min, max)`.
pub fn tabular(car: usize, dim: usize, min: f64, max: f64, seed: u64) -> Vec<Vector> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..car)
        .map(|_| Vector::from((0..dim).map(|_| rng.random_range(min..max)).collect::<Vec<_>>()))
        .collect()
}

/// Random sparse vectors where roughly `density` of the values are non-zero.
pub fn sparse(car: usize, dim: usize, density: f64, seed: u64) -> Vec<Vector> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..car)
        .map(|_| {
            let pairs = (0..dim)
                .filter_map(|i| rng.random_bool(density).then(|| (i, rng.random_range(-1.0..1.0))))
                .collect::<Vec<_>>();
            Vector::from(SparseVector::new(dim, pairs).unwrap_or_else(|e| unreachable!("{e}")))
        })
        .collect()
}

/// Vectors on an integer grid, with many exact ties in distance.
pub fn grid(max: i32) -> Vec<Vector> {
    (-max..=max)
        .flat_map(|x| (-max..=max).map(move |y| Vector::from(vec![f64::from(x), f64::from(y)])))
        .collect()
}

/// Clusters of `per_cluster` vectors around `n_clusters` random centers, with a small spread.
pub fn clustered(n_clusters: usize, per_cluster: usize, dim: usize, seed: u64) -> Vec<Vector> {
    let mut rng = StdRng::seed_from_u64(seed);
    let centers = (0..n_clusters)
        .map(|_| (0..dim).map(|_| rng.random_range(-100.0..100.0)).collect::<Vec<f64>>())
        .collect::<Vec<_>>();
    centers
        .iter()
        .flat_map(|c| {
            (0..per_cluster)
                .map(|_| Vector::from(c.iter().map(|&x| x + rng.random_range(-1.0..1.0)).collect::<Vec<_>>()))
                .collect::<Vec<_>>()
        })
        .collect()
}

/// Converts dense vectors to sparse vectors that store every value.
pub fn to_sparse(vectors: &[Vector]) -> Vec<Vector> {
    vectors
        .iter()
        .map(|v| {
            let pairs = v.to_dense().into_iter().enumerate().collect();
            Vector::from(SparseVector::new(v.dim(), pairs).unwrap_or_else(|e| unreachable!("{e}")))
        })
        .collect()
}
