//! An approximate ball cover that answers queries with a single probe.

use std::sync::Arc;

use distances::{DistanceMetric, Vector};
use rand::{SeedableRng, rngs::StdRng, seq::SliceRandom};
use rayon::prelude::*;

use crate::{
    IndexError, VectorCollection,
    collection::shared_items,
    linear::par_acceleration_cache,
    utils::{BoundedSortedList, num_representatives, sort_hits},
};

/// Configuration for a [`OneShotBallCover`].
#[must_use]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct OneShotConfig {
    /// The seed for choosing representatives. If `None`, the operating system provides one.
    seed: Option<u64>,
    /// The number of vectors owned by each representative. If `None`, this is the number of representatives.
    owned_size: Option<usize>,
}

impl OneShotConfig {
    /// Sets the seed for reproducible choices of representatives.
    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Sets the number of vectors owned by each representative.
    ///
    /// Larger lists improve recall at the cost of slower queries and construction.
    pub const fn with_owned_size(mut self, owned_size: usize) -> Self {
        self.owned_size = Some(owned_size);
        self
    }

    /// Returns the seed, if any.
    #[must_use]
    pub const fn seed(&self) -> Option<u64> {
        self.seed
    }

    /// Returns the configured number of vectors owned by each representative, if any.
    #[must_use]
    pub const fn owned_size(&self) -> Option<usize> {
        self.owned_size
    }
}

/// A one-shot Random Ball Cover.
///
/// As in a [`RandomBallCover`](crate::RandomBallCover), about `√n` vectors are chosen at random as representatives. Here, each
/// representative owns the `s` vectors nearest to it, so a vector may be owned by several representatives or by none. A query only
/// searches the representative nearest to it and the vectors that representative owns.
///
/// Queries cost `O(√n + s)` distance computations, but hits may be missed. Use [`search_quality_stats`](crate::search_quality_stats)
/// to measure recall against an exact index.
#[derive(Clone, Debug)]
pub struct OneShotBallCover<M: DistanceMetric> {
    /// The vectors in the collection.
    items: Vec<Arc<Vector>>,
    /// The metric.
    metric: M,
    /// The acceleration cache of the metric for `items`.
    cache: Vec<f64>,
    /// The configuration.
    config: OneShotConfig,
    /// The indices of the representatives.
    reps: Vec<usize>,
    /// The vectors owned by each representative, nearest first.
    owned: Vec<Vec<usize>>,
}

impl<M: DistanceMetric> OneShotBallCover<M> {
    /// Creates a new `OneShotBallCover`.
    ///
    /// # Errors
    ///
    /// If the vectors do not all have the same positive dimension.
    pub fn new<I, V>(vectors: I, metric: M, config: OneShotConfig) -> Result<Self, IndexError>
    where
        I: IntoIterator<Item = V>,
        V: Into<Arc<Vector>>,
    {
        let items = shared_items(vectors)?;
        let cache = metric.acceleration_cache(&items);
        let reps = choose_representatives(items.len(), config);
        let owned_size = config.owned_size.unwrap_or(reps.len());
        ftlog::info!("Creating OneShotBallCover over {} items with {} representatives owning {owned_size} each", items.len(), reps.len());

        let owned = reps
            .iter()
            .map(|&r| nearest_members(&metric, &items, &cache, r, owned_size))
            .collect();

        ftlog::info!("Finished creating OneShotBallCover over {} items", items.len());
        Ok(Self {
            items,
            metric,
            cache,
            config,
            reps,
            owned,
        })
    }

    /// Parallel version of [`Self::new`]. The owned lists of the representatives are computed concurrently.
    ///
    /// # Errors
    ///
    /// See [`Self::new`].
    pub fn par_new<I, V>(vectors: I, metric: M, config: OneShotConfig) -> Result<Self, IndexError>
    where
        I: IntoIterator<Item = V>,
        V: Into<Arc<Vector>>,
    {
        let items = shared_items(vectors)?;
        let cache = par_acceleration_cache(&metric, &items);
        let reps = choose_representatives(items.len(), config);
        let owned_size = config.owned_size.unwrap_or(reps.len());
        ftlog::info!(
            "Creating OneShotBallCover over {} items with {} representatives owning {owned_size} each in parallel",
            items.len(),
            reps.len()
        );

        let owned = reps
            .par_iter()
            .map(|&r| nearest_members(&metric, &items, &cache, r, owned_size))
            .collect();

        ftlog::info!("Finished creating OneShotBallCover over {} items", items.len());
        Ok(Self {
            items,
            metric,
            cache,
            config,
            reps,
            owned,
        })
    }

    /// Returns the configuration.
    pub const fn config(&self) -> &OneShotConfig {
        &self.config
    }

    /// Returns the indices of the representatives.
    #[must_use]
    pub fn representatives(&self) -> &[usize] {
        &self.reps
    }

    /// Returns the indices of the vectors owned by the `slot`-th representative, nearest first.
    ///
    /// # Panics
    ///
    /// If there is no representative in `slot`.
    #[must_use]
    pub fn owned(&self, slot: usize) -> &[usize] {
        &self.owned[slot]
    }

    /// Returns the distances from the query to the candidates of its nearest representative: the representative and its owned vectors.
    fn probe(&self, query: &Vector) -> Vec<(usize, f64)> {
        let query_info = self.metric.query_info(query);
        let distance_to = |i: usize| self.metric.cached_distance(i, query, &query_info, &self.items, &self.cache);

        let nearest = self
            .reps
            .iter()
            .map(|&r| distance_to(r))
            .enumerate()
            .min_by(|(_, a), (_, b)| a.total_cmp(b));
        let Some((slot, d_rep)) = nearest else {
            return Vec::new();
        };

        core::iter::once((self.reps[slot], d_rep))
            .chain(self.owned[slot].iter().map(|&x| (x, distance_to(x))))
            .collect()
    }
}

/// Chooses `max(1, round(√n))` distinct representatives, or none if `n` is zero.
fn choose_representatives(n: usize, config: OneShotConfig) -> Vec<usize> {
    if n == 0 {
        return Vec::new();
    }
    let mut rng = config.seed.map_or_else(StdRng::from_os_rng, StdRng::seed_from_u64);
    let mut indices = (0..n).collect::<Vec<_>>();
    indices.shuffle(&mut rng);
    indices.truncate(num_representatives(n));
    indices
}

/// The `s` members nearest to the `r`-th member, excluding itself, nearest first.
fn nearest_members<M: DistanceMetric>(metric: &M, items: &[Arc<Vector>], cache: &[f64], r: usize, s: usize) -> Vec<usize> {
    let mut nearest = BoundedSortedList::new(s);
    nearest.extend(
        (0..items.len())
            .filter(|&i| i != r)
            .map(|i| (i, metric.cached_pair_distance(i, r, items, cache))),
    );
    nearest.into_vec().into_iter().map(|(i, _)| i).collect()
}

impl<M: DistanceMetric> VectorCollection for OneShotBallCover<M> {
    type Metric = M;

    fn name(&self) -> String {
        format!("OneShotBallCover({})", self.metric.name())
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
        let mut hits = BoundedSortedList::new(k);
        hits.extend(self.probe(query));
        Ok(hits.into_vec())
    }

    fn search_range(&self, query: &Vector, range: f64) -> Result<Vec<(usize, f64)>, IndexError> {
        IndexError::check_range(range)?;
        self.check_query(query)?;
        let mut hits = self.probe(query).into_iter().filter(|&(_, d)| d <= range).collect::<Vec<_>>();
        sort_hits(&mut hits);
        Ok(hits)
    }
}
