//! The commands under the `shell` CLI.

pub mod insert;
pub mod search;

use clap::Subcommand;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build an index over the vectors and compare its search results with a linear scan.
    Search {
        /// The index to build.
        #[arg(short('x'), long, default_value_t = search::IndexKind::KdTree)]
        index: search::IndexKind,

        /// The number of nearest neighbors to search for.
        #[arg(short('k'), long, default_value_t = 10)]
        k: usize,

        /// An optional search radius for ranged search.
        #[arg(short('r'), long)]
        radius: Option<f64>,

        /// Build the index and run the queries on a single thread.
        #[arg(long)]
        serial: bool,
    },
    /// Insert the vectors one at a time into a random ball cover, then compare its search results with a linear scan.
    Insert {
        /// The number of nearest neighbors to search for.
        #[arg(short('k'), long, default_value_t = 10)]
        k: usize,

        /// Whether to promote new representatives as the ball cover grows.
        #[arg(short('g'), long, default_value_t = true, action = clap::ArgAction::Set)]
        growth: bool,

        /// Verify the ball cover's invariants after every this many insertions.
        #[arg(short('c'), long)]
        check: Option<usize>,
    },
}
