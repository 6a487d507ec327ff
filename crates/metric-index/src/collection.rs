//! The search contract shared by all indexes.

use std::sync::Arc;

use distances::{DistanceMetric, Vector};
use rayon::prelude::*;

use crate::IndexError;

/// A collection of vectors that answers nearest-neighbor queries.
///
/// Hits are `(index, distance)` pairs, where `index` points into [`VectorCollection::items`], sorted by non-decreasing distance. Ties
/// in distance may appear in any order.
///
/// Queries on an empty collection return no hits.
pub trait VectorCollection {
    /// The metric used to compare vectors.
    type Metric: DistanceMetric;

    /// Returns a name for the index, for diagnostic use.
    fn name(&self) -> String;

    /// Returns the vectors in the collection.
    fn items(&self) -> &[Arc<Vector>];

    /// Returns the metric used to compare vectors.
    fn metric(&self) -> &Self::Metric;

    /// Returns the number of vectors in the collection.
    fn len(&self) -> usize {
        self.items().len()
    }

    /// Returns whether the collection is empty.
    fn is_empty(&self) -> bool {
        self.items().is_empty()
    }

    /// Returns the dimension shared by all vectors, or `None` if the collection is empty.
    fn dimension(&self) -> Option<usize> {
        self.items().first().map(|v| v.dim())
    }

    /// Checks that `query` can be compared with the vectors in the collection.
    ///
    /// # Errors
    ///
    /// If the collection is not empty and `query` has a different dimension.
    fn check_query(&self, query: &Vector) -> Result<(), IndexError> {
        match self.dimension() {
            Some(expected) if expected != query.dim() => Err(IndexError::DimensionMismatch {
                expected,
                found: query.dim(),
            }),
            _ => Ok(()),
        }
    }

    /// Finds the `k` nearest neighbors of `query`.
    ///
    /// Returns `min(k, self.len())` hits.
    ///
    /// # Errors
    ///
    /// - If `k < 1`.
    /// - If `query` does not have the dimension of the collection.
    fn search_knn(&self, query: &Vector, k: usize) -> Result<Vec<(usize, f64)>, IndexError>;

    /// Finds all vectors within distance `range` of `query`.
    ///
    /// # Errors
    ///
    /// - If `range` is not positive.
    /// - If `query` does not have the dimension of the collection.
    fn search_range(&self, query: &Vector, range: f64) -> Result<Vec<(usize, f64)>, IndexError>;

    /// Batched version of [`VectorCollection::search_knn`].
    ///
    /// # Errors
    ///
    /// See [`VectorCollection::search_knn`].
    fn batch_search_knn(&self, queries: &[Vector], k: usize) -> Result<Vec<Vec<(usize, f64)>>, IndexError> {
        queries.iter().map(|query| self.search_knn(query, k)).collect()
    }

    /// Batched version of [`VectorCollection::search_range`].
    ///
    /// # Errors
    ///
    /// See [`VectorCollection::search_range`].
    fn batch_search_range(&self, queries: &[Vector], range: f64) -> Result<Vec<Vec<(usize, f64)>>, IndexError> {
        queries.iter().map(|query| self.search_range(query, range)).collect()
    }

    /// Parallel version of [`VectorCollection::batch_search_knn`].
    ///
    /// # Errors
    ///
    /// See [`VectorCollection::search_knn`].
    fn par_batch_search_knn(&self, queries: &[Vector], k: usize) -> Result<Vec<Vec<(usize, f64)>>, IndexError>
    where
        Self: Sync,
    {
        queries.par_iter().map(|query| self.search_knn(query, k)).collect()
    }

    /// Parallel version of [`VectorCollection::batch_search_range`].
    ///
    /// # Errors
    ///
    /// See [`VectorCollection::search_range`].
    fn par_batch_search_range(&self, queries: &[Vector], range: f64) -> Result<Vec<Vec<(usize, f64)>>, IndexError>
    where
        Self: Sync,
    {
        queries.par_iter().map(|query| self.search_range(query, range)).collect()
    }
}

/// Wraps the vectors for sharing and checks that they all have the same, positive, dimension.
pub(crate) fn shared_items<I, V>(vectors: I) -> Result<Vec<Arc<Vector>>, IndexError>
where
    I: IntoIterator<Item = V>,
    V: Into<Arc<Vector>>,
{
    let items = vectors.into_iter().map(Into::into).collect::<Vec<Arc<Vector>>>();
    if let Some(first) = items.first() {
        let expected = first.dim();
        if expected == 0 {
            return Err(IndexError::InvalidArgument("vectors must have a positive dimension".to_string()));
        }
        if let Some(v) = items.iter().find(|v| v.dim() != expected) {
            return Err(IndexError::DimensionMismatch { expected, found: v.dim() });
        }
    }
    Ok(items)
}
