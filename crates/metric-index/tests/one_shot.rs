//! Tests for the one-shot ball cover.

use std::error::Error;

use metric_index::{
    IndexError, LinearScan, OneShotBallCover, OneShotConfig, VectorCollection,
    distances::{DistanceMetric, Euclidean, Manhattan, Vector},
    search_quality_stats,
};
use test_case::test_case;

mod common;

type TestResult = Result<(), Box<dyn Error>>;

fn stat(stats: &[(String, f64)], name: &str) -> f64 {
    stats.iter().find(|(n, _)| n == name).map_or(f64::NAN, |&(_, v)| v)
}

#[test_case(10, 50, 3; "10 clusters of 50 in 3-D")]
#[test_case(20, 100, 8; "20 clusters of 100 in 8-D")]
fn recall_on_clustered_data(n_clusters: usize, per_cluster: usize, dim: usize) -> TestResult {
    let data = common::data_gen::clustered(n_clusters, per_cluster, dim, 3);
    let car = data.len();
    let queries = data.iter().step_by(17).cloned().collect::<Vec<_>>();
    let linear = LinearScan::par_new(data.clone(), Euclidean)?;
    let k = 5;
    let true_hits = linear.par_batch_search_knn(&queries, k)?;

    // With the default owned lists, hits are real but some may be missed.
    let osbc = OneShotBallCover::par_new(data.clone(), Euclidean, OneShotConfig::default().with_seed(3))?;
    let pred_hits = osbc.par_batch_search_knn(&queries, k)?;
    for hits in &pred_hits {
        assert_eq!(hits.len(), k);
        common::check_sorted(hits, &osbc.name())?;
    }
    let stats = search_quality_stats(&true_hits, &pred_hits)?;
    let recall = stat(&stats, "recall_mean");
    assert!((0.0..=1.0).contains(&recall), "{stats:?}");
    assert!(stat(&stats, "d_err_min") >= -1e-9, "{stats:?}");

    // A representative that owns every other vector makes the search exact.
    let config = OneShotConfig::default().with_seed(3).with_owned_size(car - 1);
    let exhaustive = OneShotBallCover::par_new(data, Euclidean, config)?;
    assert_eq!(exhaustive.config().owned_size(), Some(car - 1));
    let pred_hits = exhaustive.par_batch_search_knn(&queries, k)?;
    let stats = search_quality_stats(&true_hits, &pred_hits)?;
    assert!((stat(&stats, "recall_min") - 1.0).abs() < 1e-12, "{stats:?}");

    // Representatives always find themselves.
    for &rep in osbc.representatives() {
        let hits = osbc.search_knn(&osbc.items()[rep], 1)?;
        assert!(hits[0].1 <= 1e-6);
    }
    Ok(())
}

#[test]
fn owned_lists() -> TestResult {
    let data = common::data_gen::tabular(400, 4, -1.0, 1.0, 12);
    let linear = LinearScan::new(data.clone(), Manhattan)?;
    let osbc = OneShotBallCover::new(data, Manhattan, OneShotConfig::default().with_seed(12))?;

    // 20 representatives, each owning its 20 nearest neighbors.
    assert_eq!(osbc.representatives().len(), 20);
    for (slot, &rep) in osbc.representatives().iter().enumerate() {
        let owned = osbc.owned(slot);
        assert_eq!(owned.len(), 20);
        assert!(!owned.contains(&rep));

        let query = &osbc.items()[rep];
        let expected = linear.search_knn(query, 21)?.into_iter().filter(|&(i, _)| i != rep).take(20).collect::<Vec<_>>();
        let actual = owned
            .iter()
            .map(|&i| (i, linear.metric().checked_distance(query, &osbc.items()[i])))
            .map(|(i, d)| d.map(|d| (i, d)))
            .collect::<Result<Vec<_>, _>>()?;
        common::check_knn(&expected, &actual, &format!("owned({slot})"))?;
    }
    Ok(())
}

#[test]
fn seeded_builds_are_reproducible() -> TestResult {
    let data = common::data_gen::tabular(300, 3, -1.0, 1.0, 4);
    let config = OneShotConfig::default().with_seed(99);
    assert_eq!(config.seed(), Some(99));
    let a = OneShotBallCover::new(data.clone(), Euclidean, config)?;
    let b = OneShotBallCover::par_new(data, Euclidean, config)?;
    assert_eq!(a.representatives(), b.representatives());
    for slot in 0..a.representatives().len() {
        assert_eq!(a.owned(slot), b.owned(slot));
    }
    Ok(())
}

#[test]
fn range_hits_are_true_hits() -> TestResult {
    let data = common::data_gen::tabular(500, 3, -1.0, 1.0, 21);
    let queries = common::data_gen::tabular(20, 3, -1.0, 1.0, 22);
    let osbc = OneShotBallCover::new(data, Euclidean, OneShotConfig::default().with_seed(1))?;

    for query in &queries {
        let hits = osbc.search_range(query, 0.3)?;
        common::check_sorted(&hits, "range")?;
        for &(i, d) in &hits {
            assert!(d <= 0.3);
            assert!((osbc.metric().checked_distance(query, &osbc.items()[i])? - d).abs() < 1e-9);
        }
    }
    Ok(())
}

#[test]
fn degenerate_sizes_and_errors() -> TestResult {
    let query = Vector::from(vec![1.0, 2.0]);

    let empty = OneShotBallCover::new(Vec::<Vector>::new(), Euclidean, OneShotConfig::default())?;
    assert!(empty.representatives().is_empty());
    assert!(empty.search_knn(&query, 2)?.is_empty());

    let single = OneShotBallCover::new(vec![Vector::from(vec![1.0, 1.0])], Euclidean, OneShotConfig::default())?;
    assert_eq!(single.representatives(), &[0]);
    assert_eq!(single.search_knn(&query, 3)?, vec![(0, 1.0)]);
    assert_eq!(single.search_range(&query, 1.0)?, vec![(0, 1.0)]);

    assert!(matches!(single.search_knn(&query, 0), Err(IndexError::InvalidArgument(_))));
    assert!(matches!(single.search_range(&query, -1.0), Err(IndexError::InvalidArgument(_))));
    assert!(matches!(
        single.search_knn(&Vector::from(vec![1.0]), 1),
        Err(IndexError::DimensionMismatch { expected: 2, found: 1 })
    ));
    Ok(())
}
