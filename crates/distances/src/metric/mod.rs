//! The `DistanceMetric` contract and its implementations.

use core::str::FromStr;

use crate::{DistanceError, Vector};

mod angular;
mod minkowski;

pub use angular::Angular;
pub use minkowski::{Chebyshev, Euclidean, Manhattan, Minkowski};

/// A distance function between vectors, with optional acceleration for repeated evaluations against a fixed collection.
///
/// Implementations must be symmetric and non-negative. Indexes that prune with the triangle inequality additionally require
/// [`DistanceMetric::is_valid_metric`], and k-d trees require [`DistanceMetric::supports_axis_aligned_bounding`].
///
/// # Acceleration
///
/// A metric that returns `true` from [`DistanceMetric::supports_acceleration`] stores [`DistanceMetric::cache_width`] scalars per
/// vector in a flat buffer built by [`DistanceMetric::acceleration_cache`]. The scalars of the `i`-th vector live in
/// `cache[i * width..(i + 1) * width]`, and are exactly what [`DistanceMetric::query_info`] returns for that vector, so a collection
/// can grow its cache one vector at a time.
///
/// The accelerated path ([`DistanceMetric::cached_distance`]) must agree with [`DistanceMetric::distance`] to within floating-point
/// tolerance. The default implementations ignore the caches.
pub trait DistanceMetric: Clone + core::fmt::Debug + Send + Sync {
    /// A name for the metric, including any parameters.
    fn name(&self) -> String;

    /// Computes the distance between two vectors.
    ///
    /// Callers must ensure that the vectors have the same dimension. Use [`DistanceMetric::checked_distance`] otherwise.
    fn distance(&self, a: &Vector, b: &Vector) -> f64;

    /// Computes the distance between two vectors after checking that their dimensions match.
    ///
    /// # Errors
    ///
    /// If the vectors have different dimensions.
    fn checked_distance(&self, a: &Vector, b: &Vector) -> Result<f64, DistanceError> {
        a.check_dim(b)?;
        Ok(self.distance(a, b))
    }

    /// Whether the metric satisfies the triangle inequality.
    fn is_valid_metric(&self) -> bool {
        true
    }

    /// Whether the distance between two vectors is at least the absolute difference along any single axis.
    ///
    /// This holds for every Minkowski (p-norm) distance with `p >= 1`, and is what makes the splitting-plane bounds of a k-d tree sound.
    fn supports_axis_aligned_bounding(&self) -> bool {
        false
    }

    /// Whether the metric makes use of an acceleration cache.
    fn supports_acceleration(&self) -> bool {
        false
    }

    /// The number of cached scalars per vector. Zero if the metric does not support acceleration.
    fn cache_width(&self) -> usize {
        0
    }

    /// Computes the cached scalars for a single (query) vector.
    fn query_info(&self, _v: &Vector) -> Vec<f64> {
        Vec::new()
    }

    /// Computes the flat acceleration cache for a collection of vectors.
    fn acceleration_cache<V: AsRef<Vector>>(&self, vectors: &[V]) -> Vec<f64> {
        if self.supports_acceleration() {
            vectors.iter().flat_map(|v| self.query_info(v.as_ref())).collect()
        } else {
            Vec::new()
        }
    }

    /// Computes the distance between the `i`-th vector of a collection and an external `query`.
    ///
    /// `query_info` must come from [`DistanceMetric::query_info`] for `query`, and `cache` from
    /// [`DistanceMetric::acceleration_cache`] for `vectors`.
    fn cached_distance<V: AsRef<Vector>>(&self, i: usize, query: &Vector, _query_info: &[f64], vectors: &[V], _cache: &[f64]) -> f64 {
        self.distance(vectors[i].as_ref(), query)
    }

    /// Computes the distance between the `i`-th and `j`-th vectors of a collection.
    fn cached_pair_distance<V: AsRef<Vector>>(&self, i: usize, j: usize, vectors: &[V], cache: &[f64]) -> f64 {
        let w = self.cache_width();
        let j_info = if cache.is_empty() { &[][..] } else { &cache[j * w..(j + 1) * w] };
        self.cached_distance(i, vectors[j].as_ref(), j_info, vectors, cache)
    }
}

/// Any of the metrics provided by this crate.
///
/// This is useful when the metric is chosen at runtime, e.g. from a command-line argument. Names are parsed with [`FromStr`]:
/// `euclidean`, `manhattan`, `chebyshev`, `angular`, or `minkowski:<p>`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Metric {
    /// See [`Euclidean`].
    Euclidean(Euclidean),
    /// See [`Manhattan`].
    Manhattan(Manhattan),
    /// See [`Chebyshev`].
    Chebyshev(Chebyshev),
    /// See [`Minkowski`].
    Minkowski(Minkowski),
    /// See [`Angular`].
    Angular(Angular),
}

impl Default for Metric {
    fn default() -> Self {
        Self::Euclidean(Euclidean)
    }
}

impl core::fmt::Display for Metric {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Metric {
    type Err = DistanceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_lowercase();
        match s.as_str() {
            "euclidean" | "l2" => Ok(Self::Euclidean(Euclidean)),
            "manhattan" | "l1" => Ok(Self::Manhattan(Manhattan)),
            "chebyshev" | "linf" => Ok(Self::Chebyshev(Chebyshev)),
            "angular" | "cosine" => Ok(Self::Angular(Angular)),
            _ => {
                let p = s
                    .strip_prefix("minkowski:")
                    .ok_or_else(|| DistanceError::InvalidParameter(format!("unknown metric: {s}")))?;
                let p = p
                    .parse::<f64>()
                    .map_err(|e| DistanceError::InvalidParameter(format!("invalid Minkowski order {p}: {e}")))?;
                Minkowski::new(p).map(Self::Minkowski)
            }
        }
    }
}

/// Forwards a method call to the wrapped metric.
macro_rules! dispatch {
    ($self:ident, $m:ident => $body:expr) => {
        match $self {
            Self::Euclidean($m) => $body,
            Self::Manhattan($m) => $body,
            Self::Chebyshev($m) => $body,
            Self::Minkowski($m) => $body,
            Self::Angular($m) => $body,
        }
    };
}

impl DistanceMetric for Metric {
    fn name(&self) -> String {
        dispatch!(self, m => m.name())
    }

    fn distance(&self, a: &Vector, b: &Vector) -> f64 {
        dispatch!(self, m => m.distance(a, b))
    }

    fn is_valid_metric(&self) -> bool {
        dispatch!(self, m => m.is_valid_metric())
    }

    fn supports_axis_aligned_bounding(&self) -> bool {
        dispatch!(self, m => m.supports_axis_aligned_bounding())
    }

    fn supports_acceleration(&self) -> bool {
        dispatch!(self, m => m.supports_acceleration())
    }

    fn cache_width(&self) -> usize {
        dispatch!(self, m => m.cache_width())
    }

    fn query_info(&self, v: &Vector) -> Vec<f64> {
        dispatch!(self, m => m.query_info(v))
    }

    fn cached_distance<V: AsRef<Vector>>(&self, i: usize, query: &Vector, query_info: &[f64], vectors: &[V], cache: &[f64]) -> f64 {
        dispatch!(self, m => m.cached_distance(i, query, query_info, vectors, cache))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_names() {
        assert_eq!("Euclidean".parse::<Metric>(), Ok(Metric::Euclidean(Euclidean)));
        assert_eq!("l1".parse::<Metric>(), Ok(Metric::Manhattan(Manhattan)));
        assert_eq!("cosine".parse::<Metric>(), Ok(Metric::Angular(Angular)));
        assert!(matches!("minkowski:3".parse::<Metric>(), Ok(Metric::Minkowski(m)) if (m.p() - 3.0).abs() < f64::EPSILON));
        assert!(matches!("minkowski:0.5".parse::<Metric>(), Err(DistanceError::InvalidParameter(_))));
        assert!(matches!("hamming".parse::<Metric>(), Err(DistanceError::InvalidParameter(_))));
    }

    #[test]
    fn capabilities() {
        let p_norms = ["euclidean", "manhattan", "chebyshev", "minkowski:3"];
        for name in p_norms {
            let metric = name.parse::<Metric>().unwrap();
            assert!(metric.supports_axis_aligned_bounding(), "{name}");
            assert!(metric.is_valid_metric(), "{name}");
        }

        let angular = Metric::Angular(Angular);
        assert!(!angular.supports_axis_aligned_bounding());
        assert!(angular.supports_acceleration());
        assert_eq!(angular.cache_width(), 1);
    }
}
