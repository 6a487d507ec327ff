//! Exact and approximate nearest-neighbor indexes over an abstract distance metric.
//!
//! All indexes implement [`VectorCollection`], which answers k-nearest-neighbor (k-NN) and ranged (range) queries with
//! `(index, distance)` pairs sorted by increasing distance. The indices point into [`VectorCollection::items`].
//!
//! ## Indexes
//!
//! - [`LinearScan`]: exhaustive search. Exact, with no construction cost.
//! - [`KdTree`]: a k-d tree for the Minkowski family of metrics, with parallel construction.
//! - [`RandomBallCover`]: a two-level index of `√n` randomly chosen representatives that supports online insertion. Exact for any
//!   true metric.
//! - [`OneShotBallCover`]: an approximate, single-probe variant of the random ball cover.
//!
//! ## Concurrency
//!
//! Queries take `&self` and never mutate shared state, so any index can be queried from many threads at once. Construction with the
//! `par_*` constructors runs on the current [`rayon`] thread pool; use [`rayon::ThreadPool::install`] to pick a specific pool.
//! [`RandomBallCover::insert`] takes `&mut self`, so callers who interleave insertions with concurrent queries must wrap the index in
//! a lock.
//!
//! ## Logging
//!
//! Construction and insertion emit [`ftlog`] records. This crate never initializes a logger.

mod ball_cover;
mod collection;
mod error;
mod kd_tree;
mod linear;
mod quality;
pub mod utils;

pub use ball_cover::{
    BallCoverConfig, BallCoverState, DEFAULT_MIN_INDEXED_SIZE, OneShotBallCover, OneShotConfig, RandomBallCover, RepresentativeGrowth,
};
pub use collection::VectorCollection;
pub use error::IndexError;
pub use kd_tree::{KdTree, PivotSelection};
pub use linear::LinearScan;
pub use quality::search_quality_stats;

pub use distances;
