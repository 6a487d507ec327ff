//! An exact k-d tree for metrics in the Minkowski family.

use std::sync::Arc;

use distances::{DistanceMetric, Vector};

use crate::{IndexError, VectorCollection, collection::shared_items, linear::par_acceleration_cache};

mod build;
mod search;

/// How a [`KdTree`] chooses the axis along which to split a node.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum PivotSelection {
    /// Cycle through the axes by depth.
    Incremental,
    /// Split along the axis with the largest variance among the vectors of the node.
    ///
    /// This costs `O(n·d)` per node but adapts to skewed data. If no axis has a positive, finite variance, the axis is chosen as
    /// for [`PivotSelection::Incremental`].
    #[default]
    Variance,
}

impl core::fmt::Display for PivotSelection {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Incremental => write!(f, "incremental"),
            Self::Variance => write!(f, "variance"),
        }
    }
}

/// A node of a [`KdTree`].
///
/// The subtrees are exclusively owned by the node.
#[derive(Clone, Debug, PartialEq, Eq)]
struct KdNode {
    /// The index of the pivot vector.
    index: usize,
    /// The axis along which the node splits.
    axis: usize,
    /// Vectors whose value along `axis` is no greater than that of the pivot.
    left: Option<Box<KdNode>>,
    /// Vectors whose value along `axis` is no less than that of the pivot.
    right: Option<Box<KdNode>>,
}

impl KdNode {
    /// Creates a node without children.
    const fn leaf(index: usize, axis: usize) -> Self {
        Self {
            index,
            axis,
            left: None,
            right: None,
        }
    }

    /// Returns the number of nodes on the longest path from this node to a leaf.
    fn depth(&self) -> usize {
        let left = self.left.as_ref().map_or(0, |c| c.depth());
        let right = self.right.as_ref().map_or(0, |c| c.depth());
        1 + left.max(right)
    }

    /// Appends the `(index, axis)` of every node in the subtree, in pre-order.
    fn preorder(&self, out: &mut Vec<(usize, usize)>) {
        out.push((self.index, self.axis));
        for child in [&self.left, &self.right].into_iter().flatten() {
            child.preorder(out);
        }
    }
}

/// An exact k-d tree.
///
/// The tree partitions the vectors by recursively splitting at the median along one axis. Searches prune subtrees on the far side of
/// a splitting hyperplane using the distance from the query to that hyperplane along the axis, which is a lower bound on the distance
/// to every vector in the subtree only for metrics in the Minkowski family. Other metrics are therefore rejected at construction.
///
/// Cloning a tree copies its topology and acceleration cache and shares the vectors.
///
/// # Type Parameters
///
/// - `M`: The metric used to compare vectors.
#[derive(Clone, Debug)]
pub struct KdTree<M: DistanceMetric> {
    /// The vectors in the tree.
    items: Vec<Arc<Vector>>,
    /// The metric.
    metric: M,
    /// The acceleration cache of the metric for `items`.
    cache: Vec<f64>,
    /// The root of the tree, or `None` if the tree is empty.
    root: Option<Box<KdNode>>,
    /// The strategy used to choose splitting axes.
    pivot_selection: PivotSelection,
}

/// Minimal constructors for `KdTree`, using the default [`PivotSelection`].
impl<M: DistanceMetric> KdTree<M> {
    /// Creates a new `KdTree` using variance-based pivots.
    ///
    /// # Errors
    ///
    /// See [`Self::new`].
    pub fn new_minimal<I, V>(vectors: I, metric: M) -> Result<Self, IndexError>
    where
        I: IntoIterator<Item = V>,
        V: Into<Arc<Vector>>,
    {
        Self::new(vectors, metric, PivotSelection::default())
    }

    /// Parallel version of [`Self::new_minimal`].
    ///
    /// # Errors
    ///
    /// See [`Self::new`].
    pub fn par_new_minimal<I, V>(vectors: I, metric: M) -> Result<Self, IndexError>
    where
        I: IntoIterator<Item = V>,
        V: Into<Arc<Vector>>,
    {
        Self::par_new(vectors, metric, PivotSelection::default())
    }
}

/// Constructors for `KdTree`.
impl<M: DistanceMetric> KdTree<M> {
    /// Creates a new `KdTree` from the given vectors and metric.
    ///
    /// An empty list of vectors yields an empty tree, whose searches return no hits.
    ///
    /// # Arguments
    ///
    /// * `vectors` - The vectors to index.
    /// * `metric` - A metric that supports axis-aligned bounding.
    /// * `pivot_selection` - How to choose splitting axes.
    ///
    /// # Errors
    ///
    /// - If the metric does not support axis-aligned bounding.
    /// - If the vectors do not all have the same positive dimension.
    pub fn new<I, V>(vectors: I, metric: M, pivot_selection: PivotSelection) -> Result<Self, IndexError>
    where
        I: IntoIterator<Item = V>,
        V: Into<Arc<Vector>>,
    {
        Self::check_metric(&metric)?;
        let items = shared_items(vectors)?;
        ftlog::info!("Creating KdTree with {} items and {pivot_selection} pivots", items.len());

        let cache = metric.acceleration_cache(&items);
        let root = build::build(&items, pivot_selection);

        ftlog::info!("Finished creating KdTree with {} items", items.len());
        Ok(Self {
            items,
            metric,
            cache,
            root,
            pivot_selection,
        })
    }

    /// Parallel version of [`Self::new`].
    ///
    /// Subtrees are built concurrently on the current rayon thread pool. Use [`rayon::ThreadPool::install`] to build on a specific
    /// pool. If a worker fails, the tree is rebuilt on the calling thread, so the result is always complete and identical to that of
    /// [`Self::new`].
    ///
    /// # Errors
    ///
    /// See [`Self::new`].
    pub fn par_new<I, V>(vectors: I, metric: M, pivot_selection: PivotSelection) -> Result<Self, IndexError>
    where
        I: IntoIterator<Item = V>,
        V: Into<Arc<Vector>>,
    {
        Self::check_metric(&metric)?;
        let items = shared_items(vectors)?;
        ftlog::info!("Creating KdTree with {} items and {pivot_selection} pivots in parallel", items.len());

        let cache = par_acceleration_cache(&metric, &items);
        let root = build::par_build(&items, pivot_selection);

        ftlog::info!("Finished creating KdTree with {} items", items.len());
        Ok(Self {
            items,
            metric,
            cache,
            root,
            pivot_selection,
        })
    }

    /// Checks that the metric can be used for pruning along axes.
    fn check_metric(metric: &M) -> Result<(), IndexError> {
        if metric.supports_axis_aligned_bounding() {
            Ok(())
        } else {
            Err(IndexError::UnsupportedMetric(format!(
                "KdTree requires a Minkowski-family metric, got {}",
                metric.name()
            )))
        }
    }
}

/// Introspection of the tree structure.
impl<M: DistanceMetric> KdTree<M> {
    /// Returns the strategy used to choose splitting axes.
    pub const fn pivot_selection(&self) -> PivotSelection {
        self.pivot_selection
    }

    /// Returns the number of nodes on the longest root-to-leaf path. This is zero for an empty tree.
    pub fn depth(&self) -> usize {
        self.root.as_ref().map_or(0, |root| root.depth())
    }

    /// Returns the `(vector index, split axis)` of every node, in pre-order.
    pub fn nodes(&self) -> Vec<(usize, usize)> {
        let mut out = Vec::with_capacity(self.items.len());
        if let Some(root) = &self.root {
            root.preorder(&mut out);
        }
        out
    }

    /// Checks the ordering invariant of every node: vectors in the left subtree are no greater than the pivot along the node's axis,
    /// and vectors in the right subtree are no less. Also checks that every vector appears in exactly one node.
    ///
    /// # Errors
    ///
    /// If an invariant is violated.
    pub fn verify_invariants(&self) -> Result<(), IndexError> {
        let members = self.root.as_deref().map(|root| self.check_node(root)).transpose()?.unwrap_or_default();

        let mut seen = vec![false; self.items.len()];
        for i in members {
            match seen.get_mut(i) {
                Some(s) if !*s => *s = true,
                _ => return Err(IndexError::InvariantViolation(format!("vector {i} appears in the tree more than once or is out of bounds"))),
            }
        }
        if let Some(missing) = seen.iter().position(|&s| !s) {
            return Err(IndexError::InvariantViolation(format!("vector {missing} is missing from the tree")));
        }
        Ok(())
    }

    /// Checks the ordering invariant for the subtree rooted at `node` and returns the indices of its vectors.
    fn check_node(&self, node: &KdNode) -> Result<Vec<usize>, IndexError> {
        let check_child = |child: &Option<Box<KdNode>>| child.as_deref().map(|c| self.check_node(c)).transpose().map(Option::unwrap_or_default);
        let left = check_child(&node.left)?;
        let right = check_child(&node.right)?;

        let value = |i: usize| self.items.get(i).map(|v| v.get(node.axis));
        let p = value(node.index).ok_or_else(|| IndexError::InvariantViolation(format!("pivot {} is out of bounds", node.index)))?;

        if let Some(&i) = left.iter().find(|&&i| value(i).is_none_or(|x| x.total_cmp(&p).is_gt())) {
            return Err(IndexError::InvariantViolation(format!(
                "vector {i} is left of pivot {} but greater along axis {}",
                node.index, node.axis
            )));
        }
        if let Some(&i) = right.iter().find(|&&i| value(i).is_none_or(|x| x.total_cmp(&p).is_lt())) {
            return Err(IndexError::InvariantViolation(format!(
                "vector {i} is right of pivot {} but smaller along axis {}",
                node.index, node.axis
            )));
        }

        let mut members = left;
        members.push(node.index);
        members.extend(right);
        Ok(members)
    }
}

impl<M: DistanceMetric> VectorCollection for KdTree<M> {
    type Metric = M;

    fn name(&self) -> String {
        format!("KdTree({}, {})", self.metric.name(), self.pivot_selection)
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
        Ok(self.knn(query, k))
    }

    fn search_range(&self, query: &Vector, range: f64) -> Result<Vec<(usize, f64)>, IndexError> {
        IndexError::check_range(range)?;
        self.check_query(query)?;
        Ok(self.range(query, range))
    }
}
