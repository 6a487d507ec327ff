//! Exact search in a `RandomBallCover`.

use distances::{DistanceMetric, Vector};

use crate::utils::{BoundedSortedList, IndexTable, sort_hits};

use super::RandomBallCover;

impl<M: DistanceMetric> RandomBallCover<M> {
    /// k-NN search through the representatives.
    ///
    /// Representatives are visited in increasing order of distance from the query, and each is offered as a candidate. With `worst` the
    /// current k-th distance, the owned vectors of the representative `r` are skipped if:
    ///
    /// 1. `d(q, r) > worst + radius(r)`, because the ball of `r` lies entirely beyond `worst`;
    /// 2. `d(q, r) > 3·γ`, where `γ` is the distance to the k-th nearest representative. The k nearest representatives bound the k-th
    ///    distance by `γ`, and a hit `x` is owned by a representative no farther from `x` than the query's nearest representative, so
    ///    `d(q, r) <= d(q, x) + d(x, r) <= γ + 2γ`.
    ///
    /// An owned vector `x` is skipped if `|d(q, r) - d(x, r)| > worst`, which bounds `d(q, x)` from below. Rules using `worst` only
    /// apply once `k` candidates are known.
    pub(super) fn knn(&self, query: &Vector, query_info: &[f64], k: usize) -> Vec<(usize, f64)> {
        let distance_to = |i: usize| self.metric.cached_distance(i, query, query_info, &self.items, &self.cache);
        let rep_dists = self.reps.iter().map(|&r| distance_to(r)).collect::<Vec<_>>();
        let order = IndexTable::new(&rep_dists);
        let far_cutoff = (self.reps.len() >= k).then(|| 3.0 * rep_dists[order.index(k - 1)]);

        let mut hits = BoundedSortedList::new(k);
        for slot in order.iter() {
            let d_rep = rep_dists[slot];
            hits.add((self.reps[slot], d_rep));

            if hits.bound().is_some_and(|worst| d_rep > worst + self.radii[slot]) || far_cutoff.is_some_and(|cutoff| d_rep > cutoff) {
                continue;
            }

            for (&x, &d_owner) in self.owned[slot].iter().zip(&self.owned_dists[slot]) {
                if hits.bound().is_some_and(|worst| (d_rep - d_owner).abs() > worst) {
                    continue;
                }
                hits.add((x, distance_to(x)));
            }
        }

        hits.into_vec()
    }

    /// Range search through the representatives, pruning with `range` in place of the k-th distance.
    pub(super) fn range(&self, query: &Vector, query_info: &[f64], range: f64) -> Vec<(usize, f64)> {
        let distance_to = |i: usize| self.metric.cached_distance(i, query, query_info, &self.items, &self.cache);
        let rep_dists = self.reps.iter().map(|&r| distance_to(r)).collect::<Vec<_>>();

        let mut hits = self
            .reps
            .iter()
            .zip(&rep_dists)
            .filter(|&(_, &d)| d <= range)
            .map(|(&r, &d)| (r, d))
            .collect::<Vec<_>>();
        hits.extend(
            self.owned_within(&rep_dists, distance_to, range)
                .into_iter()
                .map(|(slot, pos, d)| (self.owned[slot][pos], d)),
        );

        sort_hits(&mut hits);
        hits
    }

    /// Finds the owned vectors within `range` of some point, given the distances from that point to every representative and a way
    /// to compute its distance to any vector.
    ///
    /// Returns the slot of the owner, the position in the owned list and the distance of each vector found.
    pub(super) fn owned_within<F>(&self, rep_dists: &[f64], distance_to: F, range: f64) -> Vec<(usize, usize, f64)>
    where
        F: Fn(usize) -> f64,
    {
        let mut found = Vec::new();
        for (slot, &d_rep) in rep_dists.iter().enumerate() {
            if d_rep > range + self.radii[slot] {
                continue;
            }
            for (pos, (&x, &d_owner)) in self.owned[slot].iter().zip(&self.owned_dists[slot]).enumerate() {
                if (d_rep - d_owner).abs() > range {
                    continue;
                }
                let d = distance_to(x);
                if d <= range {
                    found.push((slot, pos, d));
                }
            }
        }
        found
    }
}
