//! Distance kernels over dense slices.
//!
//! These are the fast paths used by the metrics when both vectors are dense. All kernels assume, but do not check, that the slices
//! have the same length; extra elements in the longer slice are ignored.

use num_traits::Float;

/// The sum of squared differences between corresponding elements.
pub fn euclidean_sq<T: Float>(x: &[T], y: &[T]) -> T {
    x.iter().zip(y).map(|(&a, &b)| a - b).fold(T::zero(), |acc, d| acc + d * d)
}

/// The L2-norm of the difference between two slices.
pub fn euclidean<T: Float>(x: &[T], y: &[T]) -> T {
    euclidean_sq(x, y).sqrt()
}

/// The sum of absolute differences between corresponding elements.
pub fn manhattan<T: Float>(x: &[T], y: &[T]) -> T {
    x.iter().zip(y).fold(T::zero(), |acc, (&a, &b)| acc + (a - b).abs())
}

/// The largest absolute difference between corresponding elements, or zero for empty slices.
///
/// `NaN` differences are ignored.
pub fn chebyshev<T: Float>(x: &[T], y: &[T]) -> T {
    x.iter().zip(y).fold(T::zero(), |acc, (&a, &b)| acc.max((a - b).abs()))
}

/// The sum of absolute differences raised to the power `p`, without taking the `p`-th root.
pub fn minkowski_sum<T: Float>(x: &[T], y: &[T], p: T) -> T {
    x.iter().zip(y).fold(T::zero(), |acc, (&a, &b)| acc + (a - b).abs().powf(p))
}

/// The generic Minkowski distance, i.e. the `p`-th root of [`minkowski_sum`].
pub fn minkowski<T: Float>(x: &[T], y: &[T], p: T) -> T {
    minkowski_sum(x, y, p).powf(p.recip())
}

/// The dot product of two slices.
pub fn dot_product<T: Float>(x: &[T], y: &[T]) -> T {
    x.iter().zip(y).fold(T::zero(), |acc, (&a, &b)| acc + a * b)
}

/// The squared L2-norm of a slice.
pub fn norm_l2_sq<T: Float>(x: &[T]) -> T {
    x.iter().fold(T::zero(), |acc, &a| acc + a * a)
}
