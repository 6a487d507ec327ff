//! Online insertion into a `RandomBallCover`.

use std::sync::Arc;

use distances::{DistanceMetric, Vector};
use rand::Rng;

use crate::{IndexError, VectorCollection, utils::is_perfect_square};

use super::{
    RandomBallCover, RepresentativeGrowth,
    build::{covering_radius, nearest_representative},
};

impl<M: DistanceMetric> RandomBallCover<M> {
    /// Adds a vector to the collection and returns its index.
    ///
    /// - Until the collection reaches [`BallCoverConfig::min_indexed_size`](super::BallCoverConfig::min_indexed_size) vectors, the
    ///   vector is only appended.
    /// - When it reaches that size, representatives are built from scratch.
    /// - Afterwards, the vector is assigned to its nearest representative. Then, if the size of the collection is a perfect square,
    ///   a random vector is promoted to a representative (see [`RepresentativeGrowth`]).
    ///
    /// # Errors
    ///
    /// - If the vector does not have the dimension of the collection.
    /// - If the collection is empty and the vector has dimension zero.
    pub fn insert<V: Into<Arc<Vector>>>(&mut self, vector: V) -> Result<usize, IndexError> {
        let vector = vector.into();
        match self.dimension() {
            Some(expected) if expected != vector.dim() => {
                return Err(IndexError::DimensionMismatch {
                    expected,
                    found: vector.dim(),
                });
            }
            None if vector.dim() == 0 => {
                return Err(IndexError::InvalidArgument("vectors must have a positive dimension".to_string()));
            }
            _ => (),
        }

        let index = self.items.len();
        if self.metric.supports_acceleration() {
            self.cache.extend(self.metric.query_info(&vector));
        }
        self.items.push(vector);
        let n = self.items.len();

        if self.reps.is_empty() {
            if n >= self.config.min_indexed_size {
                ftlog::info!("RandomBallCover reached {n} items, building representatives");
                self.rebuild(false);
            }
            return Ok(index);
        }

        if let Some((slot, d)) = nearest_representative(&self.metric, &self.items, &self.cache, &self.reps, index) {
            self.owned[slot].push(index);
            self.owned_dists[slot].push(d);
            self.radii[slot] = self.radii[slot].max(d);
        }

        if self.config.growth == RepresentativeGrowth::PerfectSquare && is_perfect_square(n) {
            self.promote();
        }

        Ok(index)
    }

    /// Promotes a uniformly random owned vector to a new representative.
    ///
    /// The vector leaves its owner, whose radius is recomputed. Every owned vector that is strictly closer to the new representative
    /// than to its owner then moves to the new representative. Such a vector is within the largest covering radius of the new
    /// representative, so a range search with that radius finds all of them. Only the owners that lost vectors are recomputed.
    fn promote(&mut self) {
        let num_owned = self.owned.iter().map(Vec::len).sum::<usize>();
        if num_owned == 0 {
            return;
        }

        // Locate the chosen vector by walking the owned lists.
        let mut target = self.rng.random_range(0..num_owned);
        let Some(old_slot) = self.owned.iter().position(|owned| {
            if target < owned.len() {
                true
            } else {
                target -= owned.len();
                false
            }
        }) else {
            return;
        };

        let new_rep = self.owned[old_slot].swap_remove(target);
        self.owned_dists[old_slot].swap_remove(target);
        self.radii[old_slot] = covering_radius(&self.owned_dists[old_slot]);

        let search_radius = self.radii.iter().copied().fold(0.0, f64::max);
        let rep_dists = self.reps.iter().map(|&r| self.pair_distance(r, new_rep)).collect::<Vec<_>>();
        let moves = self
            .owned_within(&rep_dists, |x| self.pair_distance(x, new_rep), search_radius)
            .into_iter()
            .filter(|&(slot, pos, d)| d < self.owned_dists[slot][pos])
            .collect::<Vec<_>>();

        let new_slot = self.reps.len();
        ftlog::debug!(
            "Promoting vector {new_rep} to representative {new_slot}, taking {} vectors from other representatives",
            moves.len()
        );

        let mut removed = self.owned.iter().map(|owned| vec![false; owned.len()]).collect::<Vec<_>>();
        let mut dirty = vec![false; new_slot];
        let mut new_owned = Vec::with_capacity(moves.len());
        let mut new_dists = Vec::with_capacity(moves.len());
        for (slot, pos, d) in moves {
            removed[slot][pos] = true;
            dirty[slot] = true;
            new_owned.push(self.owned[slot][pos]);
            new_dists.push(d);
        }

        for slot in (0..new_slot).filter(|&s| dirty[s]) {
            let gone = &removed[slot];
            let owned = core::mem::take(&mut self.owned[slot]);
            let dists = core::mem::take(&mut self.owned_dists[slot]);
            self.owned[slot] = owned.into_iter().zip(gone).filter(|&(_, &g)| !g).map(|(x, _)| x).collect();
            self.owned_dists[slot] = dists.into_iter().zip(gone).filter(|&(_, &g)| !g).map(|(d, _)| d).collect();
            self.radii[slot] = covering_radius(&self.owned_dists[slot]);
        }

        self.reps.push(new_rep);
        self.radii.push(covering_radius(&new_dists));
        self.owned.push(new_owned);
        self.owned_dists.push(new_dists);
    }
}
