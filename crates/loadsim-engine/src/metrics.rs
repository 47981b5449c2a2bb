use loadsim_abstract::{LatencySeries, MetricsRecord};
use std::cmp::Ordering;

/// Reduce a latency series to summary statistics.
///
/// Returns `None` for an empty series. The input is never mutated; the
/// reduction sorts a private copy, so repeated calls yield identical
/// records.
pub fn reduce_series(series: &LatencySeries, duration_secs: u32) -> Option<MetricsRecord> {
    if series.is_empty() {
        return None;
    }

    let mut sorted = series.as_slice().to_vec();
    sorted.sort_unstable_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));

    let count = sorted.len();
    let sum: f64 = sorted.iter().sum();
    let duration = duration_secs.max(1) as f64;

    Some(MetricsRecord {
        count,
        avg_ms: sum / count as f64,
        p50_ms: percentile(&sorted, 0.5),
        p90_ms: Some(percentile(&sorted, 0.90)),
        p95_ms: percentile(&sorted, 0.95),
        p99_ms: Some(percentile(&sorted, 0.99)),
        throughput_rps: count as f64 / duration,
    })
}

/// Nearest-rank percentile over an ascending-sorted, non-empty slice:
/// the element at `floor((len - 1) * q)`.
pub fn percentile(sorted: &[f64], q: f64) -> f64 {
    let idx = ((sorted.len() - 1) as f64 * q).floor() as usize;
    sorted[idx.min(sorted.len() - 1)]
}

#[cfg(test)]
mod tests {
    use super::{percentile, reduce_series};
    use loadsim_abstract::LatencySeries;

    #[test]
    fn percentiles_use_nearest_rank() {
        let series = LatencySeries::from_samples(vec![10.0, 20.0, 30.0, 40.0, 50.0]);
        let metrics = reduce_series(&series, 5).unwrap();
        assert_eq!(metrics.count, 5);
        assert_eq!(metrics.avg_ms, 30.0);
        // floor(4 * q) indexes: 2, 3, 3, 3.
        assert_eq!(metrics.p50_ms, 30.0);
        assert_eq!(metrics.p90_ms, Some(40.0));
        assert_eq!(metrics.p95_ms, 40.0);
        assert_eq!(metrics.p99_ms, Some(40.0));
    }

    #[test]
    fn percentile_of_unordered_input_sorts_first() {
        let series = LatencySeries::from_samples(vec![50.0, 10.0, 40.0, 20.0, 30.0]);
        let metrics = reduce_series(&series, 1).unwrap();
        assert_eq!(metrics.p50_ms, 30.0);
    }

    #[test]
    fn single_sample_is_every_percentile() {
        let sorted = [7.5];
        assert_eq!(percentile(&sorted, 0.5), 7.5);
        assert_eq!(percentile(&sorted, 0.99), 7.5);
    }

    #[test]
    fn percentiles_are_monotone_on_skewed_data() {
        let mut samples = vec![20.0; 940];
        samples.extend(vec![400.0; 60]);
        let series = LatencySeries::from_samples(samples);
        let m = reduce_series(&series, 10).unwrap();
        assert!(m.p50_ms <= m.p90_ms.unwrap());
        assert!(m.p90_ms.unwrap() <= m.p95_ms);
        assert!(m.p95_ms <= m.p99_ms.unwrap());
    }

    #[test]
    fn throughput_is_count_over_duration() {
        let series = LatencySeries::from_samples(vec![1.0; 100]);
        let metrics = reduce_series(&series, 5).unwrap();
        assert_eq!(metrics.throughput_rps, 20.0);
    }

    #[test]
    fn zero_duration_substitutes_one_second() {
        let series = LatencySeries::from_samples(vec![1.0; 10]);
        let metrics = reduce_series(&series, 0).unwrap();
        assert_eq!(metrics.throughput_rps, 10.0);
    }

    #[test]
    fn empty_series_has_no_metrics() {
        let series = LatencySeries::from_samples(Vec::new());
        assert!(reduce_series(&series, 5).is_none());
    }

    #[test]
    fn reduction_leaves_the_series_untouched() {
        let series = LatencySeries::from_samples(vec![30.0, 10.0, 20.0]);
        let first = reduce_series(&series, 1).unwrap();
        let second = reduce_series(&series, 1).unwrap();
        assert_eq!(first, second);
        assert_eq!(series.as_slice(), &[30.0, 10.0, 20.0]);
    }
}
