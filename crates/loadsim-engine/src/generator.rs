use loadsim_abstract::{LatencySeries, LoadProfile};
use rand::Rng;
use tracing::debug;

/// Latency assigned when jitter drives a sample to zero or below.
const LATENCY_FLOOR_MS: f64 = 1.0;

/// Produce one run's worth of synthetic latency samples.
///
/// The run is divided into `duration_secs` one-second ticks; each tick emits
/// `round(clients * requests_per_second)` samples until the profile's target
/// capacity is reached. A rate that rounds to zero per tick yields an empty
/// series. The profile is expected to be sanitized already.
pub fn generate_series<R: Rng>(profile: &LoadProfile, rng: &mut R) -> LatencySeries {
    let capacity = profile.target_samples();
    let per_tick = (profile.clients as f64 * profile.requests_per_second)
        .round()
        .max(0.0) as usize;

    let planned = per_tick.saturating_mul(profile.duration_secs as usize);
    let mut samples = Vec::with_capacity(capacity.min(planned));
    'ticks: for _ in 0..profile.duration_secs {
        for _ in 0..per_tick {
            if samples.len() >= capacity {
                break 'ticks;
            }
            samples.push(next_sample(profile, rng));
        }
    }

    debug!(
        "generated {} latency samples (target {})",
        samples.len(),
        capacity
    );
    LatencySeries::from_samples(samples)
}

fn next_sample<R: Rng>(profile: &LoadProfile, rng: &mut R) -> f64 {
    let jitter = (rng.random::<f64>() * 2.0 - 1.0) * profile.jitter_ms;
    let mut latency = profile.base_latency_ms + jitter;

    if rng.random::<f64>() < profile.spike_chance_pct / 100.0 {
        latency += rng.random::<f64>() * profile.jitter_ms * 10.0 + profile.jitter_ms * 2.0;
    }

    if latency <= 0.0 {
        latency = LATENCY_FLOOR_MS;
    }
    latency
}
