use loadsim_abstract::{BackendError, LatencySeries, LoadProfile, MetricsRecord, SimBackend};
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::generator;
use crate::metrics;

/// Pure-Rust backend: the generator and reducer from this crate, driven by
/// an owned RNG. Always available; used directly or as the fallback when an
/// accelerated library misbehaves.
pub struct ReferenceBackend {
    rng: StdRng,
}

impl ReferenceBackend {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_os_rng(),
        }
    }

    /// Fixed-seed backend for reproducible runs.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for ReferenceBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl SimBackend for ReferenceBackend {
    fn label(&self) -> &'static str {
        "reference"
    }

    fn generate(&mut self, profile: &LoadProfile) -> Result<LatencySeries, BackendError> {
        Ok(generator::generate_series(profile, &mut self.rng))
    }

    fn reduce(
        &mut self,
        series: &LatencySeries,
        profile: &LoadProfile,
    ) -> Result<Option<MetricsRecord>, BackendError> {
        Ok(metrics::reduce_series(series, profile.duration_secs))
    }
}

#[cfg(test)]
mod tests {
    use super::ReferenceBackend;
    use loadsim_abstract::{LoadProfile, SimBackend};

    #[test]
    fn seeded_backends_agree() {
        let profile = LoadProfile {
            clients: 4,
            requests_per_second: 5.0,
            duration_secs: 2,
            ..Default::default()
        };
        let mut a = ReferenceBackend::seeded(11);
        let mut b = ReferenceBackend::seeded(11);
        let first = a.generate(&profile).unwrap();
        let second = b.generate(&profile).unwrap();
        assert_eq!(first.as_slice(), second.as_slice());

        let metrics = a.reduce(&first, &profile).unwrap().unwrap();
        assert_eq!(metrics.count, 40);
        assert_eq!(metrics.throughput_rps, 20.0);
    }
}
