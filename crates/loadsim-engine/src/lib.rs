pub mod generator;
pub mod metrics;
pub mod render;

#[cfg(feature = "tui")]
pub mod tui;

pub mod anomaly;
pub mod export;
pub mod reference;
pub mod report;
pub mod scenario_runner;
pub mod session;

pub use reference::ReferenceBackend;
pub use report::RunReport;
pub use session::{RunResult, Session};
