//! Grow a random ball cover one vector at a time.

use std::time::Instant;

use distances::{Metric, Vector};
use metric_index::{BallCoverConfig, LinearScan, RandomBallCover, RepresentativeGrowth};

use super::search::{IndexReport, evaluate};

/// Inserts `data` into an empty random ball cover and measures its searches for `queries`.
///
/// # Arguments
///
/// * `growth` - Whether new representatives are promoted as the cover grows.
/// * `check` - If given, the cover's invariants are verified after every `check` insertions and at the end.
///
/// # Errors
///
/// - If an insertion fails.
/// - If the invariants are violated.
/// - If any search fails.
pub fn run(
    data: Vec<Vector>,
    queries: &[Vector],
    metric: Metric,
    k: usize,
    growth: bool,
    seed: Option<u64>,
    check: Option<usize>,
) -> Result<IndexReport, String> {
    let growth = if growth {
        RepresentativeGrowth::PerfectSquare
    } else {
        RepresentativeGrowth::Disabled
    };
    let config = BallCoverConfig::default().with_growth(growth);
    let config = seed.map_or(config, |s| config.with_seed(s));
    let mut rbc = RandomBallCover::empty(metric, config).map_err(|e| e.to_string())?;

    let start = Instant::now();
    for (i, vector) in data.iter().enumerate() {
        rbc.insert(vector.clone()).map_err(|e| e.to_string())?;
        if check.is_some_and(|c| c > 0 && (i + 1) % c == 0) {
            rbc.verify_invariants().map_err(|e| format!("After {} insertions: {e}", i + 1))?;
            ftlog::info!(
                "Verified after {} insertions: {:?} with {} representatives.",
                i + 1,
                rbc.state(),
                rbc.representatives().len()
            );
        }
    }
    let build_seconds = start.elapsed().as_secs_f64();
    if check.is_some() {
        rbc.verify_invariants().map_err(|e| e.to_string())?;
    }
    ftlog::info!(
        "Inserted {} vectors in {build_seconds:.3e} seconds, ending with {} representatives.",
        data.len(),
        rbc.representatives().len()
    );

    let linear = LinearScan::par_new(data, metric).map_err(|e| e.to_string())?;
    evaluate(&rbc, &linear, queries, k, None, true, build_seconds)
}
