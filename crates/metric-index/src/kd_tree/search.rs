//! Branch-and-bound search in a `KdTree`.

use distances::{DistanceMetric, Vector};

use crate::utils::{BoundedSortedList, sort_hits};

use super::{KdNode, KdTree};

impl KdNode {
    /// Returns the signed offset of `query` from the splitting hyperplane, along with the children on the same side of the hyperplane
    /// as the query (near) and on the opposite side (far).
    fn sides<'a>(&'a self, query: &Vector, pivot: &Vector) -> (f64, Option<&'a Self>, Option<&'a Self>) {
        let offset = query.get(self.axis) - pivot.get(self.axis);
        if offset <= 0.0 {
            (offset, self.left.as_deref(), self.right.as_deref())
        } else {
            (offset, self.right.as_deref(), self.left.as_deref())
        }
    }
}

impl<M: DistanceMetric> KdTree<M> {
    /// Distance from `query` to the vector at `index`, through the acceleration cache.
    fn distance_to(&self, index: usize, query: &Vector, query_info: &[f64]) -> f64 {
        self.metric.cached_distance(index, query, query_info, &self.items, &self.cache)
    }

    /// Depth-first k-NN search with an explicit stack.
    ///
    /// Each stack entry carries a lower bound on the distance from the query to every vector in its subtree. For a far child this is
    /// the offset from the query to the splitting hyperplane: with a Minkowski metric, no vector across the hyperplane can be closer
    /// than that. A near child inherits its parent's bound. Entries whose bound exceeds the current k-th distance are discarded.
    pub(super) fn knn(&self, query: &Vector, k: usize) -> Vec<(usize, f64)> {
        let Some(root) = self.root.as_deref() else {
            return Vec::new();
        };
        let query_info = self.metric.query_info(query);
        let mut hits = BoundedSortedList::new(k);
        let beyond = |hits: &BoundedSortedList<usize, f64>, bound: f64| hits.bound().is_some_and(|worst| bound > worst);

        let mut stack = vec![(root, 0.0)];
        while let Some((node, bound)) = stack.pop() {
            if beyond(&hits, bound) {
                continue;
            }

            hits.add((node.index, self.distance_to(node.index, query, &query_info)));

            let (offset, near, far) = node.sides(query, &self.items[node.index]);
            // The far child is pushed first so that the near child is explored first.
            if let Some(far) = far {
                let far_bound = bound.max(offset.abs());
                if !beyond(&hits, far_bound) {
                    stack.push((far, far_bound));
                }
            }
            if let Some(near) = near {
                stack.push((near, bound));
            }
        }

        hits.into_vec()
    }

    /// Recursive range search.
    pub(super) fn range(&self, query: &Vector, range: f64) -> Vec<(usize, f64)> {
        let mut hits = Vec::new();
        if let Some(root) = self.root.as_deref() {
            let query_info = self.metric.query_info(query);
            self.range_node(root, query, &query_info, range, &mut hits);
        }
        sort_hits(&mut hits);
        hits
    }

    /// Collects the hits in the subtree rooted at `node`.
    fn range_node(&self, node: &KdNode, query: &Vector, query_info: &[f64], range: f64, hits: &mut Vec<(usize, f64)>) {
        let d = self.distance_to(node.index, query, query_info);
        if d <= range {
            hits.push((node.index, d));
        }

        let (offset, near, far) = node.sides(query, &self.items[node.index]);
        if let Some(near) = near {
            self.range_node(near, query, query_info, range, hits);
        }
        if let Some(far) = far
            && offset.abs() <= range
        {
            self.range_node(far, query, query_info, range, hits);
        }
    }
}
