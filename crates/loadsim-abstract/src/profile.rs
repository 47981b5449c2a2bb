use serde::{Deserialize, Serialize};

/// Ceiling on the number of samples a single run may allocate.
pub const MAX_TARGET_SAMPLES: usize = 5_000_000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadProfile {
    pub clients: u32,
    /// Requests per second, per client.
    pub requests_per_second: f64,
    pub duration_secs: u32,
    pub base_latency_ms: f64,
    pub jitter_ms: f64,
    /// Probability of a latency spike per sample, in percent.
    pub spike_chance_pct: f64,
}

impl Default for LoadProfile {
    fn default() -> Self {
        Self {
            clients: 1,
            requests_per_second: 0.1,
            duration_secs: 5,
            base_latency_ms: 50.0,
            jitter_ms: 10.0,
            spike_chance_pct: 0.0,
        }
    }
}

impl LoadProfile {
    /// Coerce every field to a viable value. Out-of-range input is a user
    /// mistake, not an error: the run proceeds on the corrected profile.
    pub fn sanitized(&self) -> Self {
        let defaults = Self::default();

        let requests_per_second =
            if self.requests_per_second.is_finite() && self.requests_per_second > 0.0 {
                self.requests_per_second
            } else {
                defaults.requests_per_second
            };
        let base_latency_ms = if self.base_latency_ms.is_finite() {
            self.base_latency_ms.max(0.0)
        } else {
            defaults.base_latency_ms
        };
        let jitter_ms = if self.jitter_ms.is_finite() {
            self.jitter_ms.max(0.0)
        } else {
            defaults.jitter_ms
        };
        let spike_chance_pct = if self.spike_chance_pct.is_finite() {
            self.spike_chance_pct.clamp(0.0, 100.0)
        } else {
            defaults.spike_chance_pct
        };

        Self {
            clients: self.clients.max(1),
            requests_per_second,
            duration_secs: self.duration_secs.max(1),
            base_latency_ms,
            jitter_ms,
            spike_chance_pct,
        }
    }

    /// Total number of samples a run aims to produce, at least 1 and never
    /// above [`MAX_TARGET_SAMPLES`].
    pub fn target_samples(&self) -> usize {
        let raw =
            (self.clients as f64 * self.requests_per_second * self.duration_secs as f64).floor();
        if raw.is_nan() || raw < 1.0 {
            1
        } else if raw >= MAX_TARGET_SAMPLES as f64 {
            MAX_TARGET_SAMPLES
        } else {
            raw as usize
        }
    }
}
