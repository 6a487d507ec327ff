//! Dense and sparse vectors with distance metrics for nearest-neighbor indexes.
//!
//! The [`DistanceMetric`] trait is the contract between a metric and the indexes that use it. Besides plain distance computation, a
//! metric may offer an *acceleration cache*: a few scalars precomputed once per vector of a fixed collection (e.g. squared norms for
//! [`Euclidean`]) that let it skip recomputing repeated sub-terms. The same scalars, computed for a single query vector, are the
//! *query info* that is reused across many distance evaluations against that collection.
//!
//! ## Metrics
//!
//! - [`Euclidean`], [`Manhattan`], [`Chebyshev`] and [`Minkowski`]: the p-norm family. These support axis-aligned bounding and can be
//!   used with k-d trees.
//! - [`Angular`]: the angle between two vectors, scaled to `[0, 1]`. A true metric, but not axis-aligned.
//! - [`Metric`]: an enum over all of the above, selectable by name.

mod error;
pub mod kernels;
mod metric;
mod vector;

pub use error::DistanceError;
pub use metric::{Angular, Chebyshev, DistanceMetric, Euclidean, Manhattan, Metric, Minkowski};
pub use vector::{SparseVector, Vector};
