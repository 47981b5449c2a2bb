use serde::Serialize;

/// Downsampled view of a latency series, sized for plotting.
///
/// `min_ms` and `max_ms` describe the downsampled points, not the full
/// series they were taken from.
#[derive(Debug, Clone, Serialize)]
pub struct PlotSeries {
    pub points: Vec<f64>,
    pub min_ms: f64,
    pub max_ms: f64,
}

impl PlotSeries {
    /// Vertical extent of the series, substituting 1.0 when all points are
    /// equal so axis scaling never divides by zero.
    pub fn span(&self) -> f64 {
        let span = self.max_ms - self.min_ms;
        if span == 0.0 { 1.0 } else { span }
    }
}
