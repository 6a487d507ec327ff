//! The angular distance between vectors.

use crate::{DistanceMetric, Vector};

/// The angle between two vectors, divided by `π` so that it lies in `[0, 1]`.
///
/// Unlike `1 - cosine_similarity`, this satisfies the triangle inequality. It is not axis-aligned, so it cannot be used with a k-d tree.
/// A zero vector is treated as orthogonal to every non-zero vector and identical to another zero vector.
///
/// The acceleration cache holds the L2-norm of every vector.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Angular;

impl Angular {
    /// Converts a dot product and two norms into the scaled angle.
    fn from_parts(dot: f64, a_norm: f64, b_norm: f64) -> f64 {
        if a_norm == 0.0 || b_norm == 0.0 {
            return if a_norm == b_norm { 0.0 } else { 0.5 };
        }
        (dot / (a_norm * b_norm)).clamp(-1.0, 1.0).acos() / core::f64::consts::PI
    }
}

impl DistanceMetric for Angular {
    fn name(&self) -> String {
        "Angular".to_string()
    }

    fn distance(&self, a: &Vector, b: &Vector) -> f64 {
        Self::from_parts(a.dot(b), a.norm_sq().sqrt(), b.norm_sq().sqrt())
    }

    fn supports_acceleration(&self) -> bool {
        true
    }

    fn cache_width(&self) -> usize {
        1
    }

    fn query_info(&self, v: &Vector) -> Vec<f64> {
        vec![v.norm_sq().sqrt()]
    }

    fn cached_distance<V: AsRef<Vector>>(&self, i: usize, query: &Vector, query_info: &[f64], vectors: &[V], cache: &[f64]) -> f64 {
        let x = vectors[i].as_ref();
        match (cache.get(i), query_info.first()) {
            (Some(&x_norm), Some(&q_norm)) => Self::from_parts(x.dot(query), x_norm, q_norm),
            _ => self.distance(x, query),
        }
    }
}

#[cfg(test)]
mod tests {
    use float_eq::assert_float_eq;

    use super::*;

    #[test]
    fn right_angles() {
        let x = Vector::from(vec![1.0, 0.0]);
        let y = Vector::from(vec![0.0, 2.0]);
        let z = Vector::from(vec![-3.0, 0.0]);
        let zero = Vector::from(vec![0.0, 0.0]);

        assert_float_eq!(Angular.distance(&x, &y), 0.5, abs <= 1e-12);
        assert_float_eq!(Angular.distance(&x, &z), 1.0, abs <= 1e-12);
        assert_float_eq!(Angular.distance(&x, &x), 0.0, abs <= 1e-7);
        assert_float_eq!(Angular.distance(&x, &zero), 0.5, abs <= 0.0);
        assert_float_eq!(Angular.distance(&zero, &zero), 0.0, abs <= 0.0);

        let vectors = [x, y, z];
        let cache = Angular.acceleration_cache(&vectors);
        assert_float_eq!(Angular.cached_pair_distance(0, 1, &vectors, &cache), 0.5, abs <= 1e-12);
    }
}
