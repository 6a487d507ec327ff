//! Measuring the quality of approximate search results against exact ones.

use crate::{IndexError, utils::sort_hits};

/// Computes summary statistics about the quality of approximate nearest-neighbor search results.
///
/// For every query, the recall is the fraction of true hits matched by predicted hits that are no farther than the farthest true hit,
/// and the distance error is the mean of `d_pred / d_true - 1` over the paired hits in order of distance. The minimum, maximum, mean
/// and standard deviation of both are reported across queries.
///
/// # Arguments
///
/// * `true_hits` - The exact hits for each query, e.g. from a [`LinearScan`](crate::LinearScan).
/// * `pred_hits` - The hits predicted for the same queries.
///
/// # Returns
///
/// The name and value of each statistic, e.g. `("recall_mean", 0.98)`.
///
/// # Errors
///
/// - If there are no queries.
/// - If `true_hits` and `pred_hits` have different numbers of queries.
pub fn search_quality_stats(true_hits: &[Vec<(usize, f64)>], pred_hits: &[Vec<(usize, f64)>]) -> Result<Vec<(String, f64)>, IndexError> {
    if true_hits.is_empty() {
        return Err(IndexError::InvalidArgument("no queries to compare".to_string()));
    }
    if true_hits.len() != pred_hits.len() {
        return Err(IndexError::InvalidArgument(format!(
            "{} queries have true hits but {} have predicted hits",
            true_hits.len(),
            pred_hits.len()
        )));
    }

    let mut recall = Summary::default();
    let mut d_err = Summary::default();
    for (t, p) in true_hits.iter().zip(pred_hits) {
        let quality = QueryQuality::compare(t.clone(), p.clone());
        recall.push(quality.recall);
        d_err.push(quality.distance_error);
    }

    Ok(recall.named("recall").into_iter().chain(d_err.named("d_err")).collect())
}

/// How well the predicted hits of one query match its true hits.
struct QueryQuality {
    /// The fraction of true hits matched by predicted hits no farther than the farthest true hit.
    recall: f64,
    /// The mean of `d_pred / d_true - 1` over hits paired in order of distance, taken over all true hits.
    distance_error: f64,
}

impl QueryQuality {
    #[expect(clippy::cast_precision_loss)]
    fn compare(mut true_hits: Vec<(usize, f64)>, mut pred_hits: Vec<(usize, f64)>) -> Self {
        sort_hits(&mut true_hits);
        sort_hits(&mut pred_hits);

        let Some(&(_, farthest)) = true_hits.last() else {
            let missed = if pred_hits.is_empty() { 0.0 } else { 1.0 };
            return Self { recall: 1.0 - missed, distance_error: missed };
        };

        // Both lists are sorted, so the predicted hits within reach form a prefix.
        let within = pred_hits.partition_point(|&(_, d)| d <= farthest).min(true_hits.len());
        let relative_error = |(&(_, d_true), &(_, d_pred)): (&(usize, f64), &(usize, f64))| {
            if d_true == 0.0 || d_pred == 0.0 { 0.0 } else { d_pred / d_true - 1.0 }
        };
        let error = true_hits.iter().zip(&pred_hits).map(relative_error).sum::<f64>();

        let n = true_hits.len() as f64;
        Self { recall: within as f64 / n, distance_error: error / n }
    }
}

/// Running minimum, maximum, mean and variance of a stream of values, with Welford's algorithm.
struct Summary {
    count: usize,
    min: f64,
    max: f64,
    mean: f64,
    m2: f64,
}

impl Default for Summary {
    fn default() -> Self {
        Self { count: 0, min: f64::INFINITY, max: f64::NEG_INFINITY, mean: 0.0, m2: 0.0 }
    }
}

impl Summary {
    #[expect(clippy::cast_precision_loss)]
    fn push(&mut self, value: f64) {
        self.count += 1;
        self.min = self.min.min(value);
        self.max = self.max.max(value);
        let delta = value - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (value - self.mean);
    }

    /// The population standard deviation.
    #[expect(clippy::cast_precision_loss)]
    fn std_dev(&self) -> f64 {
        if self.count == 0 { 0.0 } else { (self.m2 / self.count as f64).sqrt() }
    }

    /// The statistics as `(prefix_stat, value)` pairs.
    fn named(&self, prefix: &str) -> [(String, f64); 4] {
        [
            (format!("{prefix}_min"), self.min),
            (format!("{prefix}_max"), self.max),
            (format!("{prefix}_mean"), self.mean),
            (format!("{prefix}_std_dev"), self.std_dev()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stat(stats: &[(String, f64)], name: &str) -> f64 {
        stats.iter().find(|(n, _)| n == name).map_or(f64::NAN, |&(_, v)| v)
    }

    #[test]
    fn perfect_and_partial_recall() {
        let truth = vec![vec![(0, 1.0), (1, 2.0)], vec![(2, 1.0), (3, 4.0)]];
        let exact = truth.clone();
        let stats = search_quality_stats(&truth, &exact).unwrap();
        assert!((stat(&stats, "recall_mean") - 1.0).abs() < 1e-12);
        assert!(stat(&stats, "d_err_max").abs() < 1e-12);

        // The second query misses its farthest hit and finds something twice as far instead.
        let approx = vec![vec![(1, 2.0), (0, 1.0)], vec![(2, 1.0), (5, 8.0)]];
        let stats = search_quality_stats(&truth, &approx).unwrap();
        assert!((stat(&stats, "recall_min") - 0.5).abs() < 1e-12);
        assert!((stat(&stats, "recall_mean") - 0.75).abs() < 1e-12);
        assert!((stat(&stats, "d_err_max") - 0.5).abs() < 1e-12);
    }

    #[test]
    fn empty_queries_and_spread() {
        // A query with no true hits has full recall only if nothing was predicted.
        let truth = vec![vec![], vec![], vec![(0, 1.0)], vec![(0, 1.0)]];
        let approx = vec![vec![], vec![(4, 3.0)], vec![(0, 1.0)], vec![(4, 3.0)]];
        let stats = search_quality_stats(&truth, &approx).unwrap();
        assert!((stat(&stats, "recall_mean") - 0.5).abs() < 1e-12);
        assert!((stat(&stats, "recall_std_dev") - 0.5).abs() < 1e-12);
        assert!((stat(&stats, "d_err_max") - 2.0).abs() < 1e-12);
        assert!((stat(&stats, "d_err_mean") - 0.75).abs() < 1e-12);
    }

    #[test]
    fn rejects_mismatched_queries() {
        assert!(search_quality_stats(&[], &[]).is_err());
        assert!(search_quality_stats(&[vec![(0, 1.0)]], &[]).is_err());
    }
}
