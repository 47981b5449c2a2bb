use anyhow::Result;
use loadsim_abstract::{BackendError, LatencySeries, LoadProfile, MetricsRecord, SimBackend};
use tracing::{info, warn};

use crate::reference::ReferenceBackend;

/// Everything produced by one finished run.
#[derive(Debug, Clone)]
pub struct RunResult {
    pub profile: LoadProfile,
    /// Label of the backend that actually produced the series.
    pub backend: &'static str,
    pub series: LatencySeries,
    /// `None` when the run produced no samples.
    pub metrics: Option<MetricsRecord>,
}

/// Run controller: owns the selected backend, a reference fallback, and the
/// most recent result.
///
/// `execute` takes `&mut self`, so a session can only drive one run at a
/// time. A failed run leaves the previous result in place.
pub struct Session {
    backend: Box<dyn SimBackend>,
    fallback: ReferenceBackend,
    last: Option<RunResult>,
}

impl Session {
    pub fn new(backend: Box<dyn SimBackend>) -> Self {
        Self {
            backend,
            fallback: ReferenceBackend::new(),
            last: None,
        }
    }

    /// Session whose fallback RNG is seeded, so even a degraded run stays
    /// reproducible.
    pub fn with_seeded_fallback(backend: Box<dyn SimBackend>, seed: u64) -> Self {
        Self {
            backend,
            fallback: ReferenceBackend::seeded(seed),
            last: None,
        }
    }

    pub fn backend_label(&self) -> &'static str {
        self.backend.label()
    }

    pub fn last_result(&self) -> Option<&RunResult> {
        self.last.as_ref()
    }

    /// Run one simulation and install its result.
    ///
    /// The profile is sanitized first. If the selected backend fails at
    /// either phase the whole run is repeated on the reference backend, so a
    /// result never mixes backends. Only a fully successful run replaces the
    /// previous one.
    pub fn execute(&mut self, profile: &LoadProfile) -> Result<&RunResult> {
        let profile = profile.sanitized();

        let result = match run_on(self.backend.as_mut(), &profile) {
            Ok(result) => result,
            Err(err) => {
                warn!(
                    "{} backend failed ({err}), rerunning on reference",
                    self.backend.label()
                );
                run_on(&mut self.fallback, &profile)?
            }
        };

        info!(
            "run complete: backend={} samples={}",
            result.backend,
            result.series.len()
        );
        Ok(self.last.insert(result))
    }
}

fn run_on(backend: &mut dyn SimBackend, profile: &LoadProfile) -> Result<RunResult, BackendError> {
    let series = backend.generate(profile)?;
    let metrics = backend.reduce(&series, profile)?;
    Ok(RunResult {
        profile: profile.clone(),
        backend: backend.label(),
        series,
        metrics,
    })
}

#[cfg(test)]
mod tests {
    use super::Session;
    use crate::reference::ReferenceBackend;
    use loadsim_abstract::{BackendError, LatencySeries, LoadProfile, MetricsRecord, SimBackend};

    struct BrokenBackend;

    impl SimBackend for BrokenBackend {
        fn label(&self) -> &'static str {
            "broken"
        }

        fn generate(&mut self, _profile: &LoadProfile) -> Result<LatencySeries, BackendError> {
            Err(BackendError::MalformedSample(0))
        }

        fn reduce(
            &mut self,
            _series: &LatencySeries,
            _profile: &LoadProfile,
        ) -> Result<Option<MetricsRecord>, BackendError> {
            Err(BackendError::MalformedMetrics)
        }
    }

    fn profile() -> LoadProfile {
        LoadProfile {
            clients: 2,
            requests_per_second: 2.0,
            duration_secs: 2,
            ..Default::default()
        }
    }

    #[test]
    fn execute_installs_the_result() {
        let mut session = Session::new(Box::new(ReferenceBackend::seeded(5)));
        assert!(session.last_result().is_none());

        session.execute(&profile()).unwrap();
        let result = session.last_result().unwrap();
        assert_eq!(result.backend, "reference");
        assert_eq!(result.series.len(), 8);
        assert_eq!(result.metrics.as_ref().unwrap().count, 8);
    }

    #[test]
    fn failing_backend_falls_back_to_reference() {
        let mut session = Session::with_seeded_fallback(Box::new(BrokenBackend), 7);
        let result = session.execute(&profile()).unwrap();
        assert_eq!(result.backend, "reference");
        assert_eq!(result.series.len(), 8);

        // The degraded run still carries the full reference-path record.
        let metrics = result.metrics.as_ref().unwrap();
        assert_eq!(metrics.count, 8);
        assert!(metrics.p90_ms.is_some());
        assert!(metrics.p99_ms.is_some());
    }

    #[test]
    fn profiles_are_sanitized_before_the_run() {
        let mut session = Session::new(Box::new(ReferenceBackend::seeded(1)));
        let raw = LoadProfile {
            clients: 0,
            duration_secs: 0,
            ..Default::default()
        };
        let result = session.execute(&raw).unwrap();
        assert_eq!(result.profile.clients, 1);
        assert_eq!(result.profile.duration_secs, 1);
    }

    #[test]
    fn a_new_run_replaces_the_previous_result() {
        let mut session = Session::new(Box::new(ReferenceBackend::seeded(2)));
        session.execute(&profile()).unwrap();

        let bigger = LoadProfile {
            clients: 4,
            requests_per_second: 2.0,
            duration_secs: 2,
            ..Default::default()
        };
        session.execute(&bigger).unwrap();
        assert_eq!(session.last_result().unwrap().series.len(), 16);
    }
}
