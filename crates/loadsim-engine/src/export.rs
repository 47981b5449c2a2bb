use anyhow::{Context, Result};
use loadsim_abstract::LatencySeries;
use std::fs;
use std::path::Path;

/// File name used when the caller does not pick one.
pub const DEFAULT_EXPORT_FILENAME: &str = "stresstest_latencies.csv";

/// Render a latency series as CSV: a header row, then one row per sample
/// with a 1-based index and the latency at six decimal places.
pub fn latencies_to_csv(series: &LatencySeries) -> String {
    let mut out = String::with_capacity(series.len() * 12 + 18);
    out.push_str("index,latency_ms\n");
    for (idx, latency) in series.iter().enumerate() {
        out.push_str(&format!("{},{:.6}\n", idx + 1, latency));
    }
    out
}

/// Write the series to `path` in CSV form.
pub fn write_csv(path: &Path, series: &LatencySeries) -> Result<()> {
    fs::write(path, latencies_to_csv(series))
        .with_context(|| format!("Failed to write CSV file {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::latencies_to_csv;
    use loadsim_abstract::LatencySeries;

    #[test]
    fn csv_rows_are_indexed_from_one() {
        let series = LatencySeries::from_samples(vec![1.5, 2.25]);
        assert_eq!(
            latencies_to_csv(&series),
            "index,latency_ms\n1,1.500000\n2,2.250000\n"
        );
    }

    #[test]
    fn empty_series_exports_only_the_header() {
        let series = LatencySeries::from_samples(Vec::new());
        assert_eq!(latencies_to_csv(&series), "index,latency_ms\n");
    }
}
