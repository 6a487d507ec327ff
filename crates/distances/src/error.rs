//! Errors raised by vectors and metrics.

use thiserror::Error;

/// Errors raised when constructing vectors or metrics, or when comparing vectors of different lengths.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DistanceError {
    /// Two vectors that were compared do not have the same dimension.
    #[error("Dimension mismatch: expected {expected}, found {found}")]
    DimensionMismatch {
        /// The dimension of the first (or stored) vector.
        expected: usize,
        /// The dimension of the second (or query) vector.
        found: usize,
    },
    /// A metric was configured with an invalid parameter.
    #[error("Invalid metric parameter: {0}")]
    InvalidParameter(String),
    /// A sparse vector was given invalid indices.
    #[error("Invalid sparse vector: {0}")]
    InvalidSparseVector(String),
}
