//! Build an index and compare its search results with a linear scan.

use std::time::Instant;

use distances::{Metric, Vector};
use metric_index::{BallCoverConfig, KdTree, LinearScan, OneShotBallCover, OneShotConfig, RandomBallCover, VectorCollection};
use serde::Serialize;

/// The indexes that can be built from the command line.
#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexKind {
    /// Exhaustive search.
    Linear,
    /// A k-d tree with variance-based pivots.
    KdTree,
    /// An exact random ball cover.
    BallCover,
    /// An approximate, single-probe random ball cover.
    OneShot,
}

impl core::fmt::Display for IndexKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let name = match self {
            Self::Linear => "linear",
            Self::KdTree => "kd-tree",
            Self::BallCover => "ball-cover",
            Self::OneShot => "one-shot",
        };
        write!(f, "{name}")
    }
}

/// The quality and timing of one kind of search.
#[derive(Debug, Serialize)]
pub struct SearchReport {
    /// The kind of search, e.g. `knn-10` or `range-0.5`.
    pub search: String,
    /// Wall-clock seconds for all queries.
    pub seconds: f64,
    /// Queries per second.
    pub throughput: f64,
    /// The mean number of hits per query.
    pub mean_hits: f64,
    /// Recall and distance-error statistics against a linear scan.
    pub quality: Vec<(String, f64)>,
}

/// The report for one index.
#[derive(Debug, Serialize)]
pub struct IndexReport {
    /// The name of the index.
    pub index: String,
    /// The number of indexed vectors.
    pub cardinality: usize,
    /// The dimensionality of the vectors.
    pub dimensionality: Option<usize>,
    /// Wall-clock seconds to build the index.
    pub build_seconds: f64,
    /// One entry per kind of search.
    pub searches: Vec<SearchReport>,
}

/// Builds the requested index over `data` and measures its searches for `queries`.
///
/// # Errors
///
/// - If the index cannot be built over the data with the given metric.
/// - If any search fails.
#[expect(clippy::too_many_arguments)]
pub fn run(
    data: Vec<Vector>,
    queries: &[Vector],
    metric: Metric,
    index: IndexKind,
    k: usize,
    radius: Option<f64>,
    seed: Option<u64>,
    parallel: bool,
) -> Result<IndexReport, String> {
    let linear = LinearScan::par_new(data.clone(), metric).map_err(|e| e.to_string())?;

    let start = Instant::now();
    match index {
        IndexKind::Linear => {
            let build_seconds = start.elapsed().as_secs_f64();
            evaluate(&linear, &linear, queries, k, radius, parallel, build_seconds)
        }
        IndexKind::KdTree => {
            let tree = if parallel {
                KdTree::par_new_minimal(data, metric)
            } else {
                KdTree::new_minimal(data, metric)
            }
            .map_err(|e| e.to_string())?;
            let build_seconds = start.elapsed().as_secs_f64();
            ftlog::info!("Built {} with depth {} in {build_seconds:.3e} seconds.", tree.name(), tree.depth());
            evaluate(&tree, &linear, queries, k, radius, parallel, build_seconds)
        }
        IndexKind::BallCover => {
            let config = seed.map_or_else(BallCoverConfig::default, |s| BallCoverConfig::default().with_seed(s));
            let rbc = if parallel {
                RandomBallCover::par_new_with(data, metric, config)
            } else {
                RandomBallCover::new_with(data, metric, config)
            }
            .map_err(|e| e.to_string())?;
            let build_seconds = start.elapsed().as_secs_f64();
            ftlog::info!(
                "Built {} with {} representatives in {build_seconds:.3e} seconds.",
                rbc.name(),
                rbc.representatives().len()
            );
            evaluate(&rbc, &linear, queries, k, radius, parallel, build_seconds)
        }
        IndexKind::OneShot => {
            let config = seed.map_or_else(OneShotConfig::default, |s| OneShotConfig::default().with_seed(s));
            let osbc = if parallel {
                OneShotBallCover::par_new(data, metric, config)
            } else {
                OneShotBallCover::new(data, metric, config)
            }
            .map_err(|e| e.to_string())?;
            let build_seconds = start.elapsed().as_secs_f64();
            ftlog::info!(
                "Built {} with {} representatives in {build_seconds:.3e} seconds.",
                osbc.name(),
                osbc.representatives().len()
            );
            evaluate(&osbc, &linear, queries, k, radius, parallel, build_seconds)
        }
    }
}

/// Runs k-NN search, and ranged search if a radius is given, and compares the hits with those of a linear scan.
pub(crate) fn evaluate<C: VectorCollection + Sync>(
    index: &C,
    linear: &LinearScan<Metric>,
    queries: &[Vector],
    k: usize,
    radius: Option<f64>,
    parallel: bool,
    build_seconds: f64,
) -> Result<IndexReport, String> {
    let mut searches = Vec::new();

    let true_hits = linear.par_batch_search_knn(queries, k).map_err(|e| e.to_string())?;
    let knn = |q: &[Vector]| {
        if parallel {
            index.par_batch_search_knn(q, k)
        } else {
            index.batch_search_knn(q, k)
        }
    };
    searches.push(measure(format!("knn-{k}"), queries, &true_hits, knn)?);

    if let Some(radius) = radius {
        let true_hits = linear.par_batch_search_range(queries, radius).map_err(|e| e.to_string())?;
        let range = |q: &[Vector]| {
            if parallel {
                index.par_batch_search_range(q, radius)
            } else {
                index.batch_search_range(q, radius)
            }
        };
        searches.push(measure(format!("range-{radius}"), queries, &true_hits, range)?);
    }

    Ok(IndexReport {
        index: index.name(),
        cardinality: index.len(),
        dimensionality: index.dimension(),
        build_seconds,
        searches,
    })
}

/// Times one batch of searches and computes the quality of its hits.
#[expect(clippy::cast_precision_loss)]
fn measure<F>(search: String, queries: &[Vector], true_hits: &[Vec<(usize, f64)>], f: F) -> Result<SearchReport, String>
where
    F: Fn(&[Vector]) -> Result<Vec<Vec<(usize, f64)>>, metric_index::IndexError>,
{
    let start = Instant::now();
    let pred_hits = f(queries).map_err(|e| e.to_string())?;
    let seconds = start.elapsed().as_secs_f64();

    let quality = if queries.is_empty() {
        Vec::new()
    } else {
        metric_index::search_quality_stats(true_hits, &pred_hits).map_err(|e| e.to_string())?
    };
    let mean_hits = pred_hits.iter().map(Vec::len).sum::<usize>() as f64 / queries.len().max(1) as f64;
    let throughput = queries.len() as f64 / seconds.max(f64::MIN_POSITIVE);
    ftlog::info!("{search}: {throughput:.3e} queries per second, {mean_hits:.2} hits per query.");

    Ok(SearchReport {
        search,
        seconds,
        throughput,
        mean_hits,
        quality,
    })
}
