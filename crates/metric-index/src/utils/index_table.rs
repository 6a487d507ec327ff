//! A stable argsort.

use core::cmp::Ordering;

/// A permutation that sorts a list of values.
///
/// For values `v`, `v[table.index(i)]` is the `i`-th smallest value. Equal values keep their original relative order. The indexes use
/// this to visit children or representatives in nearest-first order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IndexTable {
    /// The sorting permutation.
    order: Vec<usize>,
}

impl IndexTable {
    /// Creates the table that sorts `values` in non-decreasing order.
    ///
    /// Values are compared with [`f64::total_cmp`], so `NaN`s sort last.
    #[must_use]
    pub fn new(values: &[f64]) -> Self {
        Self::from_cmp(values.len(), |&a, &b| values[a].total_cmp(&values[b]))
    }

    /// Creates the table that sorts `0..n` by the given comparator on indices.
    pub fn from_cmp<F: FnMut(&usize, &usize) -> Ordering>(n: usize, cmp: F) -> Self {
        let mut order = (0..n).collect::<Vec<_>>();
        order.sort_by(cmp);
        Self { order }
    }

    /// Returns the index of the `i`-th smallest value.
    ///
    /// # Panics
    ///
    /// If `i` is not less than [`IndexTable::len`].
    #[must_use]
    pub fn index(&self, i: usize) -> usize {
        self.order[i]
    }

    /// Returns the number of values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Returns whether the table is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Iterates over the indices in sorted order of their values.
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.order.iter().copied()
    }

    /// Returns a copy of `items` permuted into sorted order.
    ///
    /// # Panics
    ///
    /// If `items` is shorter than the table.
    #[must_use]
    pub fn apply<T: Clone>(&self, items: &[T]) -> Vec<T> {
        self.order.iter().map(|&i| items[i].clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn argsort() {
        let values = [3.0, -1.0, 2.0, -1.0, f64::NAN, 0.5];
        let table = IndexTable::new(&values);

        assert_eq!(table.len(), values.len());
        assert_eq!(table.iter().collect::<Vec<_>>(), vec![1, 3, 5, 2, 0, 4]);
        assert_eq!(table.index(0), 1);

        let names = ["a", "b", "c", "d", "e", "f"];
        assert_eq!(table.apply(&names), vec!["b", "d", "f", "c", "a", "e"]);
    }

    #[test]
    fn custom_order() {
        let words = ["pear", "fig", "banana", "kiwi"];
        let table = IndexTable::from_cmp(words.len(), |&a, &b| words[a].len().cmp(&words[b].len()));
        assert_eq!(table.apply(&words), vec!["fig", "pear", "kiwi", "banana"]);
        assert!(IndexTable::new(&[]).is_empty());
    }
}
