//! A sorted list that keeps only its `k` smallest items.

/// A sorted list of bounded capacity.
///
/// This is useful for maintaining the `k` nearest neighbors in a search algorithm: [`BoundedSortedList::last`] is the current worst
/// neighbor, whose distance bounds what is still worth looking at.
///
/// Items are kept in non-decreasing order of their key. Insertion finds its position by binary search and shifts the tail, which
/// costs `O(log k + k)` and is fast for the small `k` typical of nearest-neighbor queries. Items with equal keys keep their order of
/// insertion.
///
/// # Type Parameters
///
/// - `A`: The type of the data associated with each item. This is ignored when ordering the list.
/// - `T`: The type of the keys by which the list is ordered.
#[derive(Clone, Debug)]
pub struct BoundedSortedList<A, T: PartialOrd> {
    /// The items, sorted by key.
    items: Vec<(A, T)>,
    /// The maximum number of items to keep.
    k: usize,
}

impl<A, T: PartialOrd + Copy> BoundedSortedList<A, T> {
    /// Creates a new, empty list that keeps at most `k` items.
    ///
    /// A list with capacity 0 keeps nothing.
    #[must_use]
    pub fn new(k: usize) -> Self {
        Self {
            items: Vec::with_capacity(k.min(1024) + 1),
            k,
        }
    }

    /// Adds an item, evicting the largest item if the list would exceed its capacity.
    ///
    /// Returns whether the item was kept.
    pub fn add(&mut self, (a, key): (A, T)) -> bool {
        if self.k == 0 || (self.is_full() && self.last().is_some_and(|(_, &worst)| !(key < worst))) {
            return false;
        }

        let pos = self.items.partition_point(|(_, x)| !(key < *x));
        self.items.insert(pos, (a, key));
        if self.items.len() > self.k {
            self.items.pop();
        }
        true
    }

    /// Returns the item with the largest key.
    #[must_use]
    pub fn last(&self) -> Option<(&A, &T)> {
        self.items.last().map(|(a, x)| (a, x))
    }

    /// Returns the key of the largest item, if the list is full.
    ///
    /// This is the pruning bound of a k-NN search: nothing farther can enter the list.
    #[must_use]
    pub fn bound(&self) -> Option<T> {
        if self.is_full() { self.last().map(|(_, &x)| x) } else { None }
    }

    /// Returns the item with the smallest key.
    #[must_use]
    pub fn first(&self) -> Option<(&A, &T)> {
        self.items.first().map(|(a, x)| (a, x))
    }

    /// Returns the number of items in the list.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns whether the list is empty.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns whether the list holds `k` items.
    #[must_use]
    pub const fn is_full(&self) -> bool {
        self.items.len() >= self.k
    }

    /// Returns the maximum number of items kept.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.k
    }

    /// Iterates over the items in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = (&A, &T)> {
        self.items.iter().map(|(a, x)| (a, x))
    }

    /// Consumes the list and returns the items in sorted order.
    #[must_use]
    pub fn into_vec(self) -> Vec<(A, T)> {
        self.items
    }
}

impl<A, T: PartialOrd + Copy> Extend<(A, T)> for BoundedSortedList<A, T> {
    fn extend<I: IntoIterator<Item = (A, T)>>(&mut self, iter: I) {
        for item in iter {
            self.add(item);
        }
    }
}
