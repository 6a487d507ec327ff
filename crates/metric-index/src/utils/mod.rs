//! Utility structures and functions for the crate. Intended for private use, but made public for testing.

mod bounded_list;
mod index_table;

pub use bounded_list::BoundedSortedList;
pub use index_table::IndexTable;

/// Returns whether `n` is the square of an integer.
#[must_use]
pub const fn is_perfect_square(n: usize) -> bool {
    let r = n.isqrt();
    r * r == n
}

/// Returns the number of representatives for a collection of `n` vectors, i.e. `max(1, round(√n))`.
#[must_use]
#[expect(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn num_representatives(n: usize) -> usize {
    ((n as f64).sqrt().round() as usize).max(1)
}

/// Sorts `(index, distance)` hits by non-decreasing distance.
pub(crate) fn sort_hits(hits: &mut [(usize, f64)]) {
    hits.sort_by(|(_, a), (_, b)| a.total_cmp(b));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn perfect_squares() {
        let squares = (0..200).filter(|&n| is_perfect_square(n)).collect::<Vec<_>>();
        assert_eq!(squares, vec![0, 1, 4, 9, 16, 25, 36, 49, 64, 81, 100, 121, 144, 169, 196]);
    }

    #[test]
    fn representative_counts() {
        assert_eq!(num_representatives(0), 1);
        assert_eq!(num_representatives(10), 3);
        assert_eq!(num_representatives(13), 4);
        assert_eq!(num_representatives(500), 22);
    }
}
