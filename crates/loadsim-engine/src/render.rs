use loadsim_abstract::{LatencySeries, PlotSeries};

/// Number of points a downsampled series aims for by default.
pub const DEFAULT_TARGET_POINTS: usize = 1000;

/// Reduce a series to roughly `target_points` by systematic stride sampling.
///
/// The stride is `max(1, floor(len / target))`, starting at index 0, so
/// short series pass through unchanged. `min_ms`/`max_ms` describe the
/// sampled subset only.
pub fn downsample(series: &LatencySeries, target_points: usize) -> PlotSeries {
    let data = series.as_slice();
    if data.is_empty() {
        return PlotSeries {
            points: Vec::new(),
            min_ms: 0.0,
            max_ms: 0.0,
        };
    }

    let stride = (data.len() / target_points.max(1)).max(1);
    let points: Vec<f64> = data.iter().copied().step_by(stride).collect();

    let mut min_ms = f64::MAX;
    let mut max_ms = f64::MIN;
    for &point in &points {
        if point < min_ms {
            min_ms = point;
        }
        if point > max_ms {
            max_ms = point;
        }
    }

    PlotSeries {
        points,
        min_ms,
        max_ms,
    }
}

#[cfg(test)]
mod tests {
    use super::{DEFAULT_TARGET_POINTS, downsample};
    use loadsim_abstract::LatencySeries;

    #[test]
    fn large_series_lands_on_the_target() {
        let series = LatencySeries::from_samples((0..10_000).map(|i| i as f64).collect());
        let plot = downsample(&series, DEFAULT_TARGET_POINTS);
        assert_eq!(plot.points.len(), 1000);
        assert_eq!(plot.points[0], 0.0);
        assert_eq!(plot.points[1], 10.0);
    }

    #[test]
    fn short_series_passes_through() {
        let series = LatencySeries::from_samples(vec![1.0, 2.0, 3.0, 4.0, 5.0]);
        let plot = downsample(&series, DEFAULT_TARGET_POINTS);
        assert_eq!(plot.points, vec![1.0, 2.0, 3.0, 4.0, 5.0]);
        assert_eq!(plot.min_ms, 1.0);
        assert_eq!(plot.max_ms, 5.0);
    }

    #[test]
    fn single_sample_series_is_a_single_point() {
        let series = LatencySeries::from_samples(vec![42.0]);
        let plot = downsample(&series, DEFAULT_TARGET_POINTS);
        assert_eq!(plot.points, vec![42.0]);
        assert_eq!(plot.span(), 1.0);
    }

    #[test]
    fn empty_series_yields_an_empty_plot() {
        let series = LatencySeries::from_samples(Vec::new());
        let plot = downsample(&series, DEFAULT_TARGET_POINTS);
        assert!(plot.points.is_empty());
        assert_eq!(plot.span(), 1.0);
    }

    #[test]
    fn extrema_cover_the_sampled_subset_only() {
        // With stride 2 the spike at an odd index is never sampled.
        let mut samples = vec![10.0; 2000];
        samples[501] = 900.0;
        let series = LatencySeries::from_samples(samples);
        let plot = downsample(&series, 1000);
        assert_eq!(plot.points.len(), 1000);
        assert_eq!(plot.max_ms, 10.0);
    }
}
