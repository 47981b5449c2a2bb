pub mod backend;
pub mod metrics;
pub mod plot;
pub mod profile;
pub mod scenario;
pub mod series;

pub use backend::{BackendError, SimBackend};
pub use metrics::MetricsRecord;
pub use plot::PlotSeries;
pub use profile::{LoadProfile, MAX_TARGET_SAMPLES};
pub use scenario::{LoadProfileOverride, LoadScenario, ScenarioAssertion};
pub use series::LatencySeries;
