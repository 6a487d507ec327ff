//! Brute-force search with a linear scan.

use std::sync::Arc;

use distances::{DistanceMetric, Vector};
use rayon::prelude::*;

use crate::{
    IndexError, VectorCollection,
    collection::shared_items,
    utils::{BoundedSortedList, sort_hits},
};

/// A collection that answers every query by computing the distance to every vector.
///
/// This is the exact baseline against which the other indexes are tested, and what a [`RandomBallCover`](crate::RandomBallCover)
/// does while it is too small to be worth indexing.
#[derive(Clone, Debug)]
pub struct LinearScan<M: DistanceMetric> {
    /// The vectors in the collection.
    items: Vec<Arc<Vector>>,
    /// The metric.
    metric: M,
    /// The acceleration cache of the metric for `items`.
    cache: Vec<f64>,
}

impl<M: DistanceMetric> LinearScan<M> {
    /// Creates a new `LinearScan`.
    ///
    /// # Errors
    ///
    /// If the vectors do not all have the same positive dimension.
    pub fn new<I, V>(vectors: I, metric: M) -> Result<Self, IndexError>
    where
        I: IntoIterator<Item = V>,
        V: Into<Arc<Vector>>,
    {
        let items = shared_items(vectors)?;
        let cache = metric.acceleration_cache(&items);
        Ok(Self { items, metric, cache })
    }

    /// Parallel version of [`LinearScan::new`].
    ///
    /// # Errors
    ///
    /// See [`LinearScan::new`].
    pub fn par_new<I, V>(vectors: I, metric: M) -> Result<Self, IndexError>
    where
        I: IntoIterator<Item = V>,
        V: Into<Arc<Vector>>,
    {
        let items = shared_items(vectors)?;
        let cache = par_acceleration_cache(&metric, &items);
        Ok(Self { items, metric, cache })
    }
}

impl<M: DistanceMetric> VectorCollection for LinearScan<M> {
    type Metric = M;

    fn name(&self) -> String {
        format!("LinearScan({})", self.metric.name())
    }

    fn items(&self) -> &[Arc<Vector>] {
        &self.items
    }

    fn metric(&self) -> &M {
        &self.metric
    }

    fn search_knn(&self, query: &Vector, k: usize) -> Result<Vec<(usize, f64)>, IndexError> {
        IndexError::check_k(k)?;
        self.check_query(query)?;
        let query_info = self.metric.query_info(query);
        Ok(knn_scan(&self.metric, &self.items, &self.cache, query, &query_info, k))
    }

    fn search_range(&self, query: &Vector, range: f64) -> Result<Vec<(usize, f64)>, IndexError> {
        IndexError::check_range(range)?;
        self.check_query(query)?;
        let query_info = self.metric.query_info(query);
        Ok(range_scan(&self.metric, &self.items, &self.cache, query, &query_info, range))
    }
}

/// Computes the acceleration cache with rayon.
///
/// The result is identical to [`DistanceMetric::acceleration_cache`].
pub(crate) fn par_acceleration_cache<M: DistanceMetric>(metric: &M, items: &[Arc<Vector>]) -> Vec<f64> {
    if metric.supports_acceleration() {
        items.par_iter().flat_map_iter(|v| metric.query_info(v)).collect()
    } else {
        Vec::new()
    }
}

/// The `k` nearest members of `items` to `query`, sorted by distance.
pub(crate) fn knn_scan<M: DistanceMetric>(
    metric: &M,
    items: &[Arc<Vector>],
    cache: &[f64],
    query: &Vector,
    query_info: &[f64],
    k: usize,
) -> Vec<(usize, f64)> {
    let mut list = BoundedSortedList::new(k);
    list.extend((0..items.len()).map(|i| (i, metric.cached_distance(i, query, query_info, items, cache))));
    list.into_vec()
}

/// All members of `items` within `range` of `query`, sorted by distance.
pub(crate) fn range_scan<M: DistanceMetric>(
    metric: &M,
    items: &[Arc<Vector>],
    cache: &[f64],
    query: &Vector,
    query_info: &[f64],
    range: f64,
) -> Vec<(usize, f64)> {
    let mut hits = (0..items.len())
        .map(|i| (i, metric.cached_distance(i, query, query_info, items, cache)))
        .filter(|&(_, d)| d <= range)
        .collect::<Vec<_>>();
    sort_hits(&mut hits);
    hits
}
