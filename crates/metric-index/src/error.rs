//! Errors raised by the indexes.

use distances::DistanceError;
use thiserror::Error;

/// Errors raised when constructing, querying or mutating an index.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum IndexError {
    /// A query parameter was out of range, e.g. `k < 1` or a non-positive range.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    /// A vector does not have the dimension of the collection.
    #[error("Dimension mismatch: expected {expected}, found {found}")]
    DimensionMismatch {
        /// The dimension of the collection.
        expected: usize,
        /// The dimension of the offending vector.
        found: usize,
    },
    /// The metric lacks a capability that the index relies on for correct pruning.
    #[error("Unsupported metric: {0}")]
    UnsupportedMetric(String),
    /// Internal bookkeeping of an index is inconsistent. This indicates a bug.
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),
    /// An error raised by a vector or metric.
    #[error(transparent)]
    Distance(#[from] DistanceError),
}

impl IndexError {
    /// Checks that `k` is a valid number of neighbors.
    pub(crate) fn check_k(k: usize) -> Result<(), Self> {
        if k < 1 {
            Err(Self::InvalidArgument(format!("k must be at least 1, got {k}")))
        } else {
            Ok(())
        }
    }

    /// Checks that `range` is a valid search radius.
    pub(crate) fn check_range(range: f64) -> Result<(), Self> {
        if range > 0.0 {
            Ok(())
        } else {
            Err(Self::InvalidArgument(format!("range must be positive, got {range}")))
        }
    }
}
