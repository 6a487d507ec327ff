//! Choosing representatives and assigning vectors to them.

use std::sync::Arc;

use distances::{DistanceMetric, Vector};
use rand::seq::SliceRandom;
use rayon::prelude::*;

use crate::utils::num_representatives;

use super::RandomBallCover;

/// The owned vectors and their distances, for each representative.
type Ownership = Vec<(Vec<usize>, Vec<f64>)>;

/// Finds the nearest representative to the `x`-th vector, returning its slot and the distance to it.
///
/// Ties go to the lowest slot. Returns `None` if there are no representatives.
pub(super) fn nearest_representative<M: DistanceMetric>(
    metric: &M,
    items: &[Arc<Vector>],
    cache: &[f64],
    reps: &[usize],
    x: usize,
) -> Option<(usize, f64)> {
    reps.iter()
        .map(|&r| metric.cached_pair_distance(x, r, items, cache))
        .enumerate()
        .min_by(|(_, a), (_, b)| a.total_cmp(b))
}

/// Assigns each of `points` to its nearest representative, preserving the order of `points` within each owned list.
fn assign<M: DistanceMetric>(metric: &M, items: &[Arc<Vector>], cache: &[f64], reps: &[usize], points: &[usize]) -> Ownership {
    let mut ownership = vec![(Vec::new(), Vec::new()); reps.len()];
    for &x in points {
        if let Some((slot, d)) = nearest_representative(metric, items, cache, reps, x) {
            let (owned, dists) = &mut ownership[slot];
            owned.push(x);
            dists.push(d);
        }
    }
    ownership
}

/// Returns the covering radius of a representative from the distances to the vectors it owns.
pub(super) fn covering_radius(dists: &[f64]) -> f64 {
    dists.iter().copied().fold(0.0, f64::max)
}

impl<M: DistanceMetric> RandomBallCover<M> {
    /// Chooses fresh representatives and assigns every other vector to its nearest representative.
    ///
    /// Collections smaller than the configured minimum are left without representatives. In parallel, the vectors are split into one
    /// contiguous chunk per thread; each chunk is assigned into private lists, which are then concatenated in chunk order. The result
    /// is therefore the same as that of the serial assignment.
    pub(super) fn rebuild(&mut self, parallel: bool) {
        self.reps.clear();
        self.owned.clear();
        self.owned_dists.clear();
        self.radii.clear();

        let n = self.items.len();
        if n == 0 || n < self.config.min_indexed_size {
            ftlog::debug!("Not indexing {n} items, below the minimum of {}", self.config.min_indexed_size);
            return;
        }

        let r = num_representatives(n);
        ftlog::info!("Building RandomBallCover over {n} items with {r} representatives");

        let mut indices = (0..n).collect::<Vec<_>>();
        indices.shuffle(&mut self.rng);
        let points = indices.split_off(r);
        self.reps = indices;

        let (metric, items, cache, reps) = (&self.metric, &self.items, &self.cache, &self.reps);
        let ownership = if parallel {
            let chunk_size = points.len().div_ceil(rayon::current_num_threads()).max(1);
            points
                .par_chunks(chunk_size)
                .map(|chunk| assign(metric, items, cache, reps, chunk))
                .collect::<Vec<_>>()
                .into_iter()
                .reduce(|mut acc, part| {
                    for ((owned, dists), (more_owned, more_dists)) in acc.iter_mut().zip(part) {
                        owned.extend(more_owned);
                        dists.extend(more_dists);
                    }
                    acc
                })
                .unwrap_or_else(|| vec![(Vec::new(), Vec::new()); r])
        } else {
            assign(metric, items, cache, reps, &points)
        };

        let (owned, owned_dists): (Vec<_>, Vec<_>) = ownership.into_iter().unzip();
        self.owned = owned;
        self.owned_dists = owned_dists;
        self.radii = self.owned_dists.iter().map(|dists| covering_radius(dists)).collect();

        ftlog::info!("Finished building RandomBallCover over {n} items");
    }
}
