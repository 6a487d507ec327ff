//! Recursive construction of a `KdTree`.

use std::{
    panic::{AssertUnwindSafe, catch_unwind},
    sync::Arc,
};

use distances::Vector;

use super::{KdNode, PivotSelection};

/// Subtrees with fewer vectors than this are built on the current thread.
const PAR_THRESHOLD: usize = 1024;

/// Makes forked subtrees panic while building a tree over exactly this many vectors. Zero disables it.
#[cfg(test)]
static PANIC_ON_CARDINALITY: std::sync::atomic::AtomicUsize = std::sync::atomic::AtomicUsize::new(0);

/// The number of panics raised through [`PANIC_ON_CARDINALITY`].
#[cfg(test)]
static INJECTED_PANICS: std::sync::atomic::AtomicUsize = std::sync::atomic::AtomicUsize::new(0);

impl PivotSelection {
    /// Chooses the splitting axis for the vectors at `indices`, which sit at the given `depth` of the tree.
    fn select_axis(self, items: &[Arc<Vector>], indices: &[usize], depth: usize, dim: usize) -> usize {
        match self {
            Self::Incremental => depth % dim,
            Self::Variance => max_variance_axis(items, indices, dim).unwrap_or(depth % dim),
        }
    }
}

/// Returns the axis along which the vectors at `indices` have the largest variance.
///
/// Variances are accumulated in a single pass with Welford's algorithm. Returns `None` if no axis has a positive, finite variance.
#[expect(clippy::cast_precision_loss)]
fn max_variance_axis(items: &[Arc<Vector>], indices: &[usize], dim: usize) -> Option<usize> {
    let mut mean = vec![0.0; dim];
    let mut m2 = vec![0.0; dim];
    for (n, &i) in indices.iter().enumerate() {
        let count = (n + 1) as f64;
        let v = &items[i];
        for (a, (mu, s)) in mean.iter_mut().zip(m2.iter_mut()).enumerate() {
            let x = v.get(a);
            let delta = x - *mu;
            *mu += delta / count;
            *s += delta * (x - *mu);
        }
    }

    // Ties go to the lowest axis. The sum of squares is proportional to the variance, so there is no need to divide.
    m2.into_iter()
        .enumerate()
        .filter(|&(_, s)| s.is_finite() && s > 0.0)
        .fold(None, |best: Option<(usize, f64)>, (a, s)| match best {
            Some((_, b)) if b >= s => best,
            _ => Some((a, s)),
        })
        .map(|(a, _)| a)
}

/// Chooses the axis for a node and arranges `indices` so that the pivot sits at the median position.
///
/// Returns the axis and the median position. `indices` must hold at least two elements.
fn split(items: &[Arc<Vector>], indices: &mut [usize], depth: usize, dim: usize, pivot_selection: PivotSelection) -> (usize, usize) {
    let axis = pivot_selection.select_axis(items, indices, depth, dim);
    indices.sort_by(|&a, &b| items[a].get(axis).total_cmp(&items[b].get(axis)));
    let mid = indices.len() / 2;
    ftlog::debug!("Splitting {} items along axis {axis} at depth {depth}", indices.len());
    (axis, mid)
}

/// Builds the tree on the current thread.
pub(super) fn build(items: &[Arc<Vector>], pivot_selection: PivotSelection) -> Option<Box<KdNode>> {
    let dim = items.first()?.dim();
    let mut indices = (0..items.len()).collect::<Vec<_>>();
    build_node(items, &mut indices, 0, dim, pivot_selection)
}

/// Builds the subtree for the vectors at `indices`.
fn build_node(items: &[Arc<Vector>], indices: &mut [usize], depth: usize, dim: usize, pivot_selection: PivotSelection) -> Option<Box<KdNode>> {
    match indices {
        [] => None,
        [index] => Some(Box::new(KdNode::leaf(*index, depth % dim))),
        _ => {
            let (axis, mid) = split(items, indices, depth, dim, pivot_selection);
            let (left, rest) = indices.split_at_mut(mid);
            let (&mut index, right) = rest.split_first_mut()?;
            Some(Box::new(KdNode {
                index,
                axis,
                left: build_node(items, left, depth + 1, dim, pivot_selection),
                right: build_node(items, right, depth + 1, dim, pivot_selection),
            }))
        }
    }
}

/// Builds the tree with rayon, forking at every large enough node.
///
/// If a worker panics, the partial work is discarded and the tree is rebuilt with [`build`].
pub(super) fn par_build(items: &[Arc<Vector>], pivot_selection: PivotSelection) -> Option<Box<KdNode>> {
    let dim = items.first()?.dim();
    let mut indices = (0..items.len()).collect::<Vec<_>>();

    match catch_unwind(AssertUnwindSafe(|| par_build_node(items, &mut indices, 0, dim, pivot_selection))) {
        Ok(root) => root,
        Err(_) => {
            ftlog::warn!("Parallel KdTree construction failed, rebuilding {} items on one thread", items.len());
            build(items, pivot_selection)
        }
    }
}

/// Panics in forked subtrees when [`PANIC_ON_CARDINALITY`] matches the size of the tree.
#[cfg(test)]
#[allow(clippy::panic)]
fn inject_panic(car: usize, depth: usize) {
    use std::sync::atomic::Ordering;

    if depth > 0 && car == PANIC_ON_CARDINALITY.load(Ordering::SeqCst) {
        INJECTED_PANICS.fetch_add(1, Ordering::SeqCst);
        panic!("subtree at depth {depth} failed");
    }
}

/// Parallel version of [`build_node`].
fn par_build_node(items: &[Arc<Vector>], indices: &mut [usize], depth: usize, dim: usize, pivot_selection: PivotSelection) -> Option<Box<KdNode>> {
    if indices.len() < PAR_THRESHOLD {
        return build_node(items, indices, depth, dim, pivot_selection);
    }

    #[cfg(test)]
    inject_panic(items.len(), depth);

    let (axis, mid) = split(items, indices, depth, dim, pivot_selection);
    let (left, rest) = indices.split_at_mut(mid);
    let (&mut index, right) = rest.split_first_mut()?;
    let (left, right) = rayon::join(
        || par_build_node(items, left, depth + 1, dim, pivot_selection),
        || par_build_node(items, right, depth + 1, dim, pivot_selection),
    );
    Some(Box::new(KdNode { index, axis, left, right }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vectors(rows: &[[f64; 3]]) -> Vec<Arc<Vector>> {
        rows.iter().map(|r| Arc::new(Vector::from(r.to_vec()))).collect()
    }

    #[test]
    fn variance_axis() {
        let items = vectors(&[[0.0, 5.0, 1.0], [0.0, -5.0, 1.1], [0.0, 0.0, 0.9], [0.0, 2.0, 1.0]]);
        let indices = (0..items.len()).collect::<Vec<_>>();
        assert_eq!(max_variance_axis(&items, &indices, 3), Some(1));
        assert_eq!(PivotSelection::Variance.select_axis(&items, &indices, 7, 3), 1);
        assert_eq!(PivotSelection::Incremental.select_axis(&items, &indices, 7, 3), 1);
        assert_eq!(PivotSelection::Incremental.select_axis(&items, &indices, 8, 3), 2);
    }

    #[test]
    fn constant_data_falls_back() {
        let items = vectors(&[[1.0, 2.0, 3.0]; 5]);
        let indices = (0..items.len()).collect::<Vec<_>>();
        assert_eq!(max_variance_axis(&items, &indices, 3), None);
        assert_eq!(PivotSelection::Variance.select_axis(&items, &indices, 4, 3), 1);

        let with_nan = vectors(&[[f64::NAN, 0.0, 0.0], [1.0, 0.0, 0.0]]);
        assert_eq!(max_variance_axis(&with_nan, &[0, 1], 3), None);
    }

    #[test]
    fn parallel_matches_serial() {
        let items = (0..3000_u32)
            .map(|i| {
                let x = f64::from(i);
                Arc::new(Vector::from(vec![(x * 0.37).sin(), (x * 1.3).cos() * 4.0, x % 17.0]))
            })
            .collect::<Vec<_>>();

        for pivot_selection in [PivotSelection::Incremental, PivotSelection::Variance] {
            assert_eq!(build(&items, pivot_selection), par_build(&items, pivot_selection));
        }
        assert_eq!(build(&[], PivotSelection::Variance), None);
    }

    #[test]
    fn failed_worker_rebuilds_serially() {
        use std::sync::atomic::Ordering;

        // No other test builds a tree of this size.
        let car = 4_099_u32;
        let items = (0..car)
            .map(|i| {
                let x = f64::from(i);
                Arc::new(Vector::from(vec![(x * 0.11).cos(), x % 23.0, (x * 0.7).sin() * 2.0]))
            })
            .collect::<Vec<_>>();

        PANIC_ON_CARDINALITY.store(items.len(), Ordering::SeqCst);
        for pivot_selection in [PivotSelection::Incremental, PivotSelection::Variance] {
            let before = INJECTED_PANICS.load(Ordering::SeqCst);
            let tree = par_build(&items, pivot_selection);
            assert!(INJECTED_PANICS.load(Ordering::SeqCst) > before, "{pivot_selection:?}");
            assert!(tree.is_some());
            assert_eq!(tree, build(&items, pivot_selection));
        }
        PANIC_ON_CARDINALITY.store(0, Ordering::SeqCst);

        let before = INJECTED_PANICS.load(Ordering::SeqCst);
        assert_eq!(par_build(&items, PivotSelection::Variance), build(&items, PivotSelection::Variance));
        assert_eq!(INJECTED_PANICS.load(Ordering::SeqCst), before);
    }
}
