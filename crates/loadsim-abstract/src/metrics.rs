use serde::Serialize;

/// Summary statistics reduced from one latency series.
///
/// Percentiles are nearest-rank (lower-biased), never interpolated. `p90_ms`
/// and `p99_ms` are optional because the accelerated backend's ABI only
/// carries avg/p50/p95/throughput; the reference backend always fills them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsRecord {
    pub count: usize,
    pub avg_ms: f64,
    pub p50_ms: f64,
    pub p90_ms: Option<f64>,
    pub p95_ms: f64,
    pub p99_ms: Option<f64>,
    /// Samples per second over the run duration.
    pub throughput_rps: f64,
}
