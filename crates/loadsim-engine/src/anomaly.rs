use loadsim_abstract::LatencySeries;

/// Indices of samples strictly greater than `multiplier` times the series
/// mean. An empty series has no anomalies.
pub fn detect_anomalies(series: &LatencySeries, multiplier: f64) -> Vec<usize> {
    let data = series.as_slice();
    if data.is_empty() {
        return Vec::new();
    }

    let mean = data.iter().sum::<f64>() / data.len() as f64;
    let threshold = mean * multiplier;

    data.iter()
        .enumerate()
        .filter(|&(_, &sample)| sample > threshold)
        .map(|(idx, _)| idx)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::detect_anomalies;
    use loadsim_abstract::LatencySeries;

    #[test]
    fn flags_samples_above_the_mean_multiple() {
        let series = LatencySeries::from_samples(vec![10.0, 10.0, 10.0, 100.0]);
        // mean 32.5, threshold 65.
        assert_eq!(detect_anomalies(&series, 2.0), vec![3]);
    }

    #[test]
    fn indices_come_back_in_sample_order() {
        let series = LatencySeries::from_samples(vec![10.0, 200.0, 10.0, 10.0, 300.0, 10.0]);
        // mean 90, threshold 180.
        assert_eq!(detect_anomalies(&series, 2.0), vec![1, 4]);
    }

    #[test]
    fn uniform_series_has_no_anomalies() {
        let series = LatencySeries::from_samples(vec![25.0; 50]);
        assert!(detect_anomalies(&series, 2.0).is_empty());
    }

    #[test]
    fn threshold_is_strict() {
        let series = LatencySeries::from_samples(vec![10.0, 10.0, 10.0, 30.0]);
        // mean 15, threshold exactly 30: the sample sitting on it stays in.
        assert!(detect_anomalies(&series, 2.0).is_empty());
    }

    #[test]
    fn empty_series_yields_no_indices() {
        let series = LatencySeries::from_samples(Vec::new());
        assert!(detect_anomalies(&series, 2.0).is_empty());
    }
}
