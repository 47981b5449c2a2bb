use serde::Serialize;

use loadsim_abstract::{LoadProfile, MetricsRecord, PlotSeries};

use crate::render;
use crate::session::RunResult;

/// Serializable snapshot of one finished run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub profile: LoadProfile,
    pub backend: String,
    pub sample_count: usize,
    pub metrics: Option<MetricsRecord>,
    /// Downsampled series, sized for plotting rather than archival.
    pub plot: PlotSeries,
}

impl RunReport {
    pub fn from_result(result: &RunResult, plot_points: usize) -> Self {
        Self {
            profile: result.profile.clone(),
            backend: result.backend.to_string(),
            sample_count: result.series.len(),
            metrics: result.metrics.clone(),
            plot: render::downsample(&result.series, plot_points),
        }
    }
}
