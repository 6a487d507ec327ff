//! Ball covers: indexes that partition the vectors around randomly chosen representatives.

use std::sync::Arc;

use distances::{DistanceMetric, Vector};
use rand::{SeedableRng, rngs::StdRng};

use crate::{
    IndexError, VectorCollection,
    collection::shared_items,
    linear::{knn_scan, par_acceleration_cache, range_scan},
};

mod build;
mod insert;
mod one_shot;
mod search;

pub use one_shot::{OneShotBallCover, OneShotConfig};

/// The default number of vectors below which a [`RandomBallCover`] does not build representatives.
pub const DEFAULT_MIN_INDEXED_SIZE: usize = 10;

/// When a [`RandomBallCover`] adds representatives as vectors are inserted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum RepresentativeGrowth {
    /// Promote one vector to a representative whenever the size of the collection becomes a perfect square, keeping about `√n`
    /// representatives.
    #[default]
    PerfectSquare,
    /// Never add representatives after construction. Queries stay exact but slow down as owned lists grow.
    Disabled,
}

/// The lifecycle of a [`RandomBallCover`]. Transitions only go forward.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BallCoverState {
    /// No vectors.
    Empty,
    /// Too few vectors to be worth indexing. Queries scan every vector.
    BruteForce,
    /// Representatives have been chosen and every other vector is owned by one of them.
    Indexed,
}

/// Configuration for a [`RandomBallCover`].
#[must_use]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BallCoverConfig {
    /// The seed for choosing representatives. If `None`, the operating system provides one.
    pub(crate) seed: Option<u64>,
    /// The number of vectors at which representatives are first built.
    pub(crate) min_indexed_size: usize,
    /// See [`RepresentativeGrowth`].
    pub(crate) growth: RepresentativeGrowth,
}

impl Default for BallCoverConfig {
    fn default() -> Self {
        Self {
            seed: None,
            min_indexed_size: DEFAULT_MIN_INDEXED_SIZE,
            growth: RepresentativeGrowth::default(),
        }
    }
}

impl BallCoverConfig {
    /// Sets the seed for reproducible choices of representatives.
    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Sets the number of vectors at which representatives are first built.
    pub const fn with_min_indexed_size(mut self, min_indexed_size: usize) -> Self {
        self.min_indexed_size = min_indexed_size;
        self
    }

    /// Sets the policy for adding representatives on insertion.
    pub const fn with_growth(mut self, growth: RepresentativeGrowth) -> Self {
        self.growth = growth;
        self
    }

    /// Returns the seed, if any.
    #[must_use]
    pub const fn seed(&self) -> Option<u64> {
        self.seed
    }

    /// Returns the number of vectors at which representatives are first built.
    #[must_use]
    pub const fn min_indexed_size(&self) -> usize {
        self.min_indexed_size
    }

    /// Returns the policy for adding representatives on insertion.
    pub const fn growth(&self) -> RepresentativeGrowth {
        self.growth
    }

    /// Creates the random number generator described by this configuration.
    pub(crate) fn rng(&self) -> StdRng {
        self.seed.map_or_else(StdRng::from_os_rng, StdRng::seed_from_u64)
    }
}

/// An exact Random Ball Cover.
///
/// About `√n` vectors are chosen at random as representatives. Every other vector is owned by its nearest representative, and each
/// representative records the distances to the vectors it owns and its covering radius, the largest of those distances. Searches
/// compute the distance to every representative and use the triangle inequality to skip representatives, and then individual owned
/// vectors, that cannot hold a hit.
///
/// Vectors can be inserted one at a time. The collection starts by scanning every vector, builds representatives when it reaches
/// [`BallCoverConfig::min_indexed_size`] vectors, and then promotes a random vector to a representative whenever its size becomes a
/// perfect square (see [`RepresentativeGrowth`]).
///
/// The triangle inequality is required, so metrics that are not valid metrics are rejected at construction.
///
/// Representatives are addressed by their slot, their position in [`RandomBallCover::representatives`].
#[derive(Clone, Debug)]
pub struct RandomBallCover<M: DistanceMetric> {
    /// The vectors in the collection.
    items: Vec<Arc<Vector>>,
    /// The metric.
    metric: M,
    /// The acceleration cache of the metric for `items`.
    cache: Vec<f64>,
    /// The configuration.
    config: BallCoverConfig,
    /// Source of randomness for choosing representatives.
    rng: StdRng,
    /// The index of the representative in each slot. Empty until the collection is indexed.
    reps: Vec<usize>,
    /// The indices of the vectors owned by each representative.
    owned: Vec<Vec<usize>>,
    /// The distances from each representative to the vectors it owns, parallel to `owned`.
    owned_dists: Vec<Vec<f64>>,
    /// The covering radius of each representative.
    radii: Vec<f64>,
}

impl<M: DistanceMetric> RandomBallCover<M> {
    /// Creates a new `RandomBallCover` with the default configuration.
    ///
    /// # Errors
    ///
    /// See [`Self::new_with`].
    pub fn new<I, V>(vectors: I, metric: M) -> Result<Self, IndexError>
    where
        I: IntoIterator<Item = V>,
        V: Into<Arc<Vector>>,
    {
        Self::new_with(vectors, metric, BallCoverConfig::default())
    }

    /// Parallel version of [`Self::new`].
    ///
    /// # Errors
    ///
    /// See [`Self::new_with`].
    pub fn par_new<I, V>(vectors: I, metric: M) -> Result<Self, IndexError>
    where
        I: IntoIterator<Item = V>,
        V: Into<Arc<Vector>>,
    {
        Self::par_new_with(vectors, metric, BallCoverConfig::default())
    }

    /// Creates a new `RandomBallCover` from the given vectors, metric and configuration.
    ///
    /// # Errors
    ///
    /// - If the metric does not satisfy the triangle inequality.
    /// - If the vectors do not all have the same positive dimension.
    pub fn new_with<I, V>(vectors: I, metric: M, config: BallCoverConfig) -> Result<Self, IndexError>
    where
        I: IntoIterator<Item = V>,
        V: Into<Arc<Vector>>,
    {
        let items = shared_items(vectors)?;
        let cache = metric.acceleration_cache(&items);
        let mut rbc = Self::from_parts(items, metric, cache, config)?;
        rbc.rebuild(false);
        Ok(rbc)
    }

    /// Parallel version of [`Self::new_with`].
    ///
    /// The assignment of vectors to representatives runs on the current rayon thread pool. Given the same seed, the result is identical
    /// to that of [`Self::new_with`].
    ///
    /// # Errors
    ///
    /// See [`Self::new_with`].
    pub fn par_new_with<I, V>(vectors: I, metric: M, config: BallCoverConfig) -> Result<Self, IndexError>
    where
        I: IntoIterator<Item = V>,
        V: Into<Arc<Vector>>,
    {
        let items = shared_items(vectors)?;
        let cache = par_acceleration_cache(&metric, &items);
        let mut rbc = Self::from_parts(items, metric, cache, config)?;
        rbc.rebuild(true);
        Ok(rbc)
    }

    /// Creates an empty `RandomBallCover` to be filled with [`Self::insert`].
    ///
    /// # Errors
    ///
    /// If the metric does not satisfy the triangle inequality.
    pub fn empty(metric: M, config: BallCoverConfig) -> Result<Self, IndexError> {
        Self::from_parts(Vec::new(), metric, Vec::new(), config)
    }

    /// Creates a `RandomBallCover` without representatives.
    fn from_parts(items: Vec<Arc<Vector>>, metric: M, cache: Vec<f64>, config: BallCoverConfig) -> Result<Self, IndexError> {
        if !metric.is_valid_metric() {
            return Err(IndexError::UnsupportedMetric(format!(
                "RandomBallCover requires the triangle inequality, which {} does not satisfy",
                metric.name()
            )));
        }

        Ok(Self {
            items,
            metric,
            cache,
            config,
            rng: config.rng(),
            reps: Vec::new(),
            owned: Vec::new(),
            owned_dists: Vec::new(),
            radii: Vec::new(),
        })
    }
}

/// Introspection of the representative structure.
impl<M: DistanceMetric> RandomBallCover<M> {
    /// Returns the configuration.
    pub const fn config(&self) -> &BallCoverConfig {
        &self.config
    }

    /// Returns the current state.
    #[must_use]
    pub fn state(&self) -> BallCoverState {
        if self.items.is_empty() {
            BallCoverState::Empty
        } else if self.reps.is_empty() {
            BallCoverState::BruteForce
        } else {
            BallCoverState::Indexed
        }
    }

    /// Returns the indices of the representatives, by slot.
    #[must_use]
    pub fn representatives(&self) -> &[usize] {
        &self.reps
    }

    /// Returns the indices of the vectors owned by the representative in `slot`.
    ///
    /// # Panics
    ///
    /// If there is no representative in `slot`.
    #[must_use]
    pub fn owned(&self, slot: usize) -> &[usize] {
        &self.owned[slot]
    }

    /// Returns the distances from the representative in `slot` to the vectors it owns, in the order of [`Self::owned`].
    ///
    /// # Panics
    ///
    /// If there is no representative in `slot`.
    #[must_use]
    pub fn owned_distances(&self, slot: usize) -> &[f64] {
        &self.owned_dists[slot]
    }

    /// Returns the covering radius of the representative in `slot`.
    ///
    /// # Panics
    ///
    /// If there is no representative in `slot`.
    #[must_use]
    pub fn radius(&self, slot: usize) -> f64 {
        self.radii[slot]
    }

    /// Checks the bookkeeping of the representatives:
    ///
    /// - every vector is either a representative or owned by exactly one representative,
    /// - every recorded distance is the distance from the vector to its owner,
    /// - every owner is a nearest representative of the vectors it owns,
    /// - every covering radius is the largest distance recorded for its representative.
    ///
    /// Distances are compared with a relative tolerance of `1e-9`.
    ///
    /// # Errors
    ///
    /// If an invariant is violated.
    pub fn verify_invariants(&self) -> Result<(), IndexError> {
        let violation = |msg: String| Err(IndexError::InvariantViolation(msg));
        let close = |a: f64, b: f64| (a - b).abs() <= 1e-9 * a.abs().max(b.abs()).max(1.0);

        let slots = self.reps.len();
        if self.owned.len() != slots || self.owned_dists.len() != slots || self.radii.len() != slots {
            return violation(format!(
                "{} representatives but {} owned lists, {} distance lists and {} radii",
                slots,
                self.owned.len(),
                self.owned_dists.len(),
                self.radii.len()
            ));
        }
        if slots == 0 {
            return Ok(());
        }

        let mut seen = vec![false; self.items.len()];
        let members = self.reps.iter().chain(self.owned.iter().flatten());
        for &i in members {
            match seen.get_mut(i) {
                Some(s) if !*s => *s = true,
                _ => return violation(format!("vector {i} is out of bounds or appears more than once")),
            }
        }
        if let Some(i) = seen.iter().position(|&s| !s) {
            return violation(format!("vector {i} is neither a representative nor owned"));
        }

        for (slot, (&rep, (owned, dists))) in self.reps.iter().zip(self.owned.iter().zip(&self.owned_dists)).enumerate() {
            if owned.len() != dists.len() {
                return violation(format!("slot {slot} owns {} vectors but records {} distances", owned.len(), dists.len()));
            }

            for (&x, &d) in owned.iter().zip(dists) {
                let actual = self.pair_distance(x, rep);
                if !close(d, actual) {
                    return violation(format!("vector {x} records distance {d} to representative {rep}, actual {actual}"));
                }
                let nearer = self.reps.iter().enumerate().find(|&(_, &r)| {
                    let dr = self.pair_distance(x, r);
                    dr < d && !close(dr, d)
                });
                if let Some((other, &r)) = nearer {
                    return violation(format!("vector {x} is owned by slot {slot} but slot {other} (vector {r}) is closer"));
                }
            }

            let expected = dists.iter().copied().fold(0.0, f64::max);
            if !close(self.radii[slot], expected) {
                return violation(format!("slot {slot} has radius {} but its farthest vector is at {expected}", self.radii[slot]));
            }
        }

        Ok(())
    }

    /// Distance between two vectors of the collection.
    fn pair_distance(&self, i: usize, j: usize) -> f64 {
        self.metric.cached_pair_distance(i, j, &self.items, &self.cache)
    }
}

impl<M: DistanceMetric> VectorCollection for RandomBallCover<M> {
    type Metric = M;

    fn name(&self) -> String {
        format!("RandomBallCover({})", self.metric.name())
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
        Ok(if self.reps.is_empty() {
            knn_scan(&self.metric, &self.items, &self.cache, query, &query_info, k)
        } else {
            self.knn(query, &query_info, k)
        })
    }

    fn search_range(&self, query: &Vector, range: f64) -> Result<Vec<(usize, f64)>, IndexError> {
        IndexError::check_range(range)?;
        self.check_query(query)?;
        let query_info = self.metric.query_info(query);
        Ok(if self.reps.is_empty() {
            range_scan(&self.metric, &self.items, &self.cache, query, &query_info, range)
        } else {
            self.range(query, &query_info, range)
        })
    }
}
