use thiserror::Error;

use crate::metrics::MetricsRecord;
use crate::profile::LoadProfile;
use crate::series::LatencySeries;

/// Error types surfaced by simulation backends.
///
/// Any of these aborts the current run on that backend; the caller decides
/// whether to rerun elsewhere. They never corrupt a previous result.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("run of {0} samples exceeds backend capacity {1}")]
    SeriesTooLarge(usize, usize),

    #[error("parameter {0} exceeds the backend's accepted range")]
    ParameterOutOfRange(&'static str),

    #[error("backend reported {0} samples, expected at most {1}")]
    SampleCountOutOfRange(i32, usize),

    #[error("backend produced a non-positive or non-finite sample at index {0}")]
    MalformedSample(usize),

    #[error("backend produced non-finite metrics")]
    MalformedMetrics,
}

/// A latency simulation backend.
///
/// One run is a `generate` call followed by a `reduce` call on the returned
/// series. Implementations take `&mut self` so a backend can own its RNG or
/// foreign library handle; they must not retain buffers across calls.
pub trait SimBackend {
    /// Short name reported in logs and run summaries.
    fn label(&self) -> &'static str;

    /// Produce one run's worth of latency samples for the profile.
    fn generate(&mut self, profile: &LoadProfile) -> Result<LatencySeries, BackendError>;

    /// Reduce a series to summary statistics. `Ok(None)` means the series
    /// was empty, which is a valid outcome rather than an error.
    fn reduce(
        &mut self,
        series: &LatencySeries,
        profile: &LoadProfile,
    ) -> Result<Option<MetricsRecord>, BackendError>;
}
