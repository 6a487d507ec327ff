//! The Minkowski (p-norm) family of metrics.

use crate::{DistanceError, DistanceMetric, Vector, kernels};

/// The Euclidean (L2) distance.
///
/// The acceleration cache holds the squared norm of every vector, so that `|x - q|^2 = |x|^2 + |q|^2 - 2 x.q` only needs a dot product
/// per evaluation. This only pays off for sparse vectors, where the dot product visits shared non-zeros. Pairs of dense vectors use the
/// direct kernel.
///
/// The expansion loses precision when `x` and `q` are close relative to their norms. Such pairs are recomputed directly, so the cached
/// path agrees with [`DistanceMetric::distance`] to a relative error far below [`Euclidean::CANCELLATION_RATIO`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Euclidean;

impl Euclidean {
    /// Expanded squared distances below this fraction of `|x|^2 + |q|^2` are recomputed directly.
    pub const CANCELLATION_RATIO: f64 = 1e-4;
}

impl DistanceMetric for Euclidean {
    fn name(&self) -> String {
        "Euclidean".to_string()
    }

    fn distance(&self, a: &Vector, b: &Vector) -> f64 {
        match (a, b) {
            (Vector::Dense(a), Vector::Dense(b)) => kernels::euclidean(a, b),
            _ => {
                let mut sum = 0.0;
                a.for_each_abs_diff(b, |d| sum += d * d);
                sum.sqrt()
            }
        }
    }

    fn supports_axis_aligned_bounding(&self) -> bool {
        true
    }

    fn supports_acceleration(&self) -> bool {
        true
    }

    fn cache_width(&self) -> usize {
        1
    }

    fn query_info(&self, v: &Vector) -> Vec<f64> {
        vec![v.norm_sq()]
    }

    fn cached_distance<V: AsRef<Vector>>(&self, i: usize, query: &Vector, query_info: &[f64], vectors: &[V], cache: &[f64]) -> f64 {
        let x = vectors[i].as_ref();
        if let (Vector::Dense(a), Vector::Dense(b)) = (x, query) {
            return kernels::euclidean(a, b);
        }
        match (cache.get(i), query_info.first()) {
            (Some(&x_sq), Some(&q_sq)) => {
                let sq = x_sq + q_sq - 2.0 * x.dot(query);
                if sq > Self::CANCELLATION_RATIO * (x_sq + q_sq) {
                    sq.sqrt()
                } else {
                    self.distance(x, query)
                }
            }
            _ => self.distance(x, query),
        }
    }
}

/// The Manhattan (L1, taxicab) distance.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Manhattan;

impl DistanceMetric for Manhattan {
    fn name(&self) -> String {
        "Manhattan".to_string()
    }

    fn distance(&self, a: &Vector, b: &Vector) -> f64 {
        match (a, b) {
            (Vector::Dense(a), Vector::Dense(b)) => kernels::manhattan(a, b),
            _ => {
                let mut sum = 0.0;
                a.for_each_abs_diff(b, |d| sum += d);
                sum
            }
        }
    }

    fn supports_axis_aligned_bounding(&self) -> bool {
        true
    }
}

/// The Chebyshev (L-infinity) distance.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Chebyshev;

impl DistanceMetric for Chebyshev {
    fn name(&self) -> String {
        "Chebyshev".to_string()
    }

    fn distance(&self, a: &Vector, b: &Vector) -> f64 {
        match (a, b) {
            (Vector::Dense(a), Vector::Dense(b)) => kernels::chebyshev(a, b),
            _ => {
                let mut max = 0_f64;
                a.for_each_abs_diff(b, |d| max = max.max(d));
                max
            }
        }
    }

    fn supports_axis_aligned_bounding(&self) -> bool {
        true
    }
}

/// The Minkowski distance of order `p >= 1`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Minkowski {
    /// The order of the norm.
    p: f64,
}

impl Minkowski {
    /// Creates a Minkowski distance of order `p`.
    ///
    /// # Errors
    ///
    /// If `p < 1` or `p` is not finite. Orders below one violate the triangle inequality.
    pub fn new(p: f64) -> Result<Self, DistanceError> {
        if p.is_finite() && p >= 1.0 {
            Ok(Self { p })
        } else {
            Err(DistanceError::InvalidParameter(format!("Minkowski order must be finite and at least 1, got {p}")))
        }
    }

    /// Returns the order of the norm.
    #[must_use]
    pub const fn p(&self) -> f64 {
        self.p
    }
}

impl DistanceMetric for Minkowski {
    fn name(&self) -> String {
        format!("Minkowski(p={})", self.p)
    }

    fn distance(&self, a: &Vector, b: &Vector) -> f64 {
        match (a, b) {
            (Vector::Dense(a), Vector::Dense(b)) => kernels::minkowski(a, b, self.p),
            _ => {
                let mut sum = 0.0;
                a.for_each_abs_diff(b, |d| sum += d.powf(self.p));
                sum.powf(self.p.recip())
            }
        }
    }

    fn supports_axis_aligned_bounding(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use float_eq::assert_float_eq;

    use super::*;
    use crate::SparseVector;

    #[test]
    fn euclidean_cache_agrees() {
        let vectors = vec![
            Vector::from(vec![1.0, 2.0, 3.0]),
            Vector::from(vec![-1.0, 0.5, 2.0]),
            Vector::Sparse(SparseVector::new(3, vec![(1, 4.0)]).unwrap()),
        ];
        let query = Vector::from(vec![0.25, -3.0, 1.0]);

        let cache = Euclidean.acceleration_cache(&vectors);
        assert_eq!(cache.len(), vectors.len());

        let info = Euclidean.query_info(&query);
        for (i, v) in vectors.iter().enumerate() {
            let expected = Euclidean.distance(v, &query);
            let actual = Euclidean.cached_distance(i, &query, &info, &vectors, &cache);
            assert_float_eq!(expected, actual, abs <= 1e-12);
        }

        let expected = Euclidean.distance(&vectors[0], &vectors[2]);
        assert_float_eq!(Euclidean.cached_pair_distance(0, 2, &vectors, &cache), expected, abs <= 1e-12);
    }

    #[test]
    fn euclidean_cache_far_from_origin() {
        let offset = 1e6;
        let shift = |v: &[f64]| v.iter().map(|x| x + offset).collect::<Vec<_>>();
        let dense = [[0.1, 0.2, 0.3], [0.4, 0.1, 0.9], [0.35, 0.25, 0.3]].map(|v| Vector::from(shift(&v)));
        let sparse = dense
            .iter()
            .map(|v| Vector::Sparse(SparseVector::new(3, v.to_dense().into_iter().enumerate().collect()).unwrap()))
            .collect::<Vec<_>>();
        let query = Vector::from(shift(&[0.3, 0.2, 0.3]));
        let info = Euclidean.query_info(&query);

        for vectors in [dense.to_vec(), sparse] {
            let cache = Euclidean.acceleration_cache(&vectors);
            for (i, v) in vectors.iter().enumerate() {
                let expected = Euclidean.distance(v, &query);
                let actual = Euclidean.cached_distance(i, &query, &info, &vectors, &cache);
                assert_float_eq!(expected, actual, r2nd <= 1e-9);
                for j in 0..vectors.len() {
                    let expected = Euclidean.distance(v, &vectors[j]);
                    assert_float_eq!(Euclidean.cached_pair_distance(i, j, &vectors, &cache), expected, abs <= 1e-9);
                }
            }
        }
    }

    #[test]
    fn minkowski_orders() {
        let a = Vector::from(vec![0.0, 0.0]);
        let b = Vector::from(vec![3.0, 4.0]);

        assert_float_eq!(Minkowski::new(1.0).unwrap().distance(&a, &b), Manhattan.distance(&a, &b), abs <= 1e-12);
        assert_float_eq!(Minkowski::new(2.0).unwrap().distance(&a, &b), Euclidean.distance(&a, &b), abs <= 1e-12);
        assert!(Minkowski::new(40.0).unwrap().distance(&a, &b) - Chebyshev.distance(&a, &b) < 1e-3);

        assert!(Minkowski::new(0.5).is_err());
        assert!(Minkowski::new(f64::NAN).is_err());
        assert!(Minkowski::new(f64::INFINITY).is_err());
    }
}
