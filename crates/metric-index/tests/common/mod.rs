//! Shared utilities for the integration tests.
#![allow(dead_code)]

use float_cmp::approx_eq;
use metric_index::{
    VectorCollection,
    distances::{DistanceMetric, Vector},
};

pub mod data_gen;

/// Distances from `query` to every vector of the collection, computed pairwise without any cache and sorted nearest first.
pub fn brute_force<C: VectorCollection>(collection: &C, query: &Vector) -> Vec<(usize, f64)> {
    let metric = collection.metric();
    let mut hits = collection
        .items()
        .iter()
        .enumerate()
        .map(|(i, v)| (i, metric.distance(v, query)))
        .collect::<Vec<_>>();
    hits.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
    hits
}

/// Compares k-NN and range search against a brute-force scan for every query.
pub fn check_against_brute_force<C: VectorCollection>(collection: &C, queries: &[Vector], ks: &[usize]) -> Result<(), String> {
    let name = collection.name();
    for (qi, query) in queries.iter().enumerate() {
        let all = brute_force(collection, query);
        for &k in ks {
            let expected = &all[..k.min(all.len())];
            let actual = collection.search_knn(query, k).map_err(|e| e.to_string())?;
            check_knn(expected, &actual, &format!("{name} knn(q{qi}, k={k})"))?;
        }

        // Radii just past the distances to the 1st, 10th and 50th nearest neighbors.
        for &(_, d) in [all.first(), all.get(9), all.get(49).or(all.last())].into_iter().flatten() {
            let range = (d * (1.0 + 1e-9)).max(1e-6);
            let expected = all.iter().copied().take_while(|&(_, x)| x <= range).collect::<Vec<_>>();
            let actual = collection.search_range(query, range).map_err(|e| e.to_string())?;
            check_range(&expected, &actual, &format!("{name} range(q{qi}, r={range})"))?;
        }
    }
    Ok(())
}

/// Checks that k-NN hits have the same distances as the expected hits, in the same order.
///
/// Indices are not compared, because vectors at equal distances may be returned in any order.
pub fn check_knn(expected: &[(usize, f64)], actual: &[(usize, f64)], name: &str) -> Result<(), String> {
    if expected.len() != actual.len() {
        return Err(format!("{name}: hit count mismatch:\nexp {expected:?},\ngot {actual:?}"));
    }
    for (i, (&(_, e), &(_, a))) in expected.iter().zip(actual).enumerate() {
        if !approx_eq!(f64, e, a, epsilon = 1e-9) {
            return Err(format!("{name}: distance mismatch at position {i}:\nexp {expected:?},\ngot {actual:?}"));
        }
    }
    check_sorted(actual, name)
}

/// Checks that range hits are exactly the expected vectors, with the same distances, sorted by distance.
pub fn check_range(expected: &[(usize, f64)], actual: &[(usize, f64)], name: &str) -> Result<(), String> {
    let by_index = |hits: &[(usize, f64)]| {
        let mut hits = hits.to_vec();
        hits.sort_by_key(|&(i, _)| i);
        hits
    };
    let (exp, act) = (by_index(expected), by_index(actual));
    let same_indices = exp.len() == act.len() && exp.iter().zip(&act).all(|(e, a)| e.0 == a.0);
    if !same_indices {
        return Err(format!("{name}: hit mismatch:\nexp {expected:?},\ngot {actual:?}"));
    }
    if let Some((e, a)) = exp.iter().zip(&act).find(|(e, a)| !approx_eq!(f64, e.1, a.1, epsilon = 1e-9)) {
        return Err(format!("{name}: distance mismatch for vector {}: exp {}, got {}", e.0, e.1, a.1));
    }
    check_sorted(actual, name)
}

/// Checks that hits are sorted by non-decreasing distance.
pub fn check_sorted(hits: &[(usize, f64)], name: &str) -> Result<(), String> {
    match hits.windows(2).position(|w| w[0].1 > w[1].1) {
        Some(i) => Err(format!("{name}: hits are not sorted at position {i}: {hits:?}")),
        None => Ok(()),
    }
}
