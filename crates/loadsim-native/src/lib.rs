//! Accelerated simulation module, loadable as a shared library.
//!
//! Exports the C ABI consumed by the loader crate: `run_simulation` fills a
//! caller-owned buffer with latency samples, `compute_metrics_from_buffer`
//! reduces such a buffer to `[avg, p50, p95, throughput]`, and
//! `detect_anomalies` reports outlier indices. The module runs a tuned
//! profile of its own (Gaussian jitter around a fixed base) rather than the
//! caller's jitter settings; only clients, rate and duration cross the ABI.

use std::cmp::Ordering;
use std::slice;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, StandardNormal};
use tracing::error;

const BASE_LATENCY_MS: f64 = 50.0;
const JITTER_MS: f64 = 15.0;
const SPIKE_CHANCE: f64 = 0.05;

#[unsafe(no_mangle)]
pub extern "C" fn run_simulation(
    clients: i32,
    rps: f64,
    duration: i32,
    out_buf: *mut f64,
    max_samples: i32,
    out_written: *mut i32,
) {
    if out_buf.is_null() || max_samples <= 0 || out_written.is_null() {
        error!("run_simulation called with invalid buffer arguments");
        if !out_written.is_null() {
            unsafe { *out_written = 0 };
        }
        return;
    }

    let capacity = max_samples as usize;
    let out = unsafe { slice::from_raw_parts_mut(out_buf, capacity) };

    let mut rng = StdRng::from_os_rng();
    let mut idx = 0usize;

    'ticks: for _ in 0..duration.max(0) {
        // A rate that rounds below one still emits, matching the module's
        // historical behavior; the reference backend may emit nothing here.
        let mut per_second = (clients as f64 * rps).round() as i64;
        if per_second < 1 {
            per_second = 1;
        }
        for _ in 0..per_second {
            if idx >= capacity {
                break 'ticks;
            }
            out[idx] = next_sample(&mut rng);
            idx += 1;
        }
    }

    unsafe { *out_written = idx as i32 };
}

fn next_sample(rng: &mut StdRng) -> f64 {
    let noise: f64 = StandardNormal.sample(rng);
    let mut val = BASE_LATENCY_MS + noise * (JITTER_MS / 2.0);
    if rng.random::<f64>() < SPIKE_CHANCE {
        let spike: f64 = StandardNormal.sample(rng);
        val += spike.abs() * JITTER_MS * 8.0 + JITTER_MS * 2.0;
    }
    if val < 1.0 {
        val = 1.0;
    }
    val
}

#[unsafe(no_mangle)]
pub extern "C" fn compute_metrics_from_buffer(
    buf: *const f64,
    count: i32,
    out_metrics: *mut f64,
) {
    if buf.is_null() || count <= 0 || out_metrics.is_null() {
        error!("compute_metrics_from_buffer called with invalid buffer arguments");
        return;
    }

    let samples = unsafe { slice::from_raw_parts(buf, count as usize) };
    let out = unsafe { slice::from_raw_parts_mut(out_metrics, 4) };

    let avg = samples.iter().sum::<f64>() / samples.len() as f64;

    let mut sorted = samples.to_vec();
    sorted.sort_unstable_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));

    out[0] = avg;
    out[1] = nearest_rank(&sorted, 0.5);
    out[2] = nearest_rank(&sorted, 0.95);
    // Callers recompute true throughput from the run duration.
    out[3] = samples.len() as f64;
}

#[unsafe(no_mangle)]
pub extern "C" fn detect_anomalies(
    buf: *const f64,
    count: i32,
    multiplier: f64,
    out_indices: *mut i32,
    max_out: i32,
) -> i32 {
    if buf.is_null() || count <= 0 || out_indices.is_null() || max_out <= 0 {
        error!("detect_anomalies called with invalid buffer arguments");
        return 0;
    }

    let samples = unsafe { slice::from_raw_parts(buf, count as usize) };
    let out = unsafe { slice::from_raw_parts_mut(out_indices, max_out as usize) };

    let mean = samples.iter().sum::<f64>() / samples.len() as f64;
    let threshold = mean * multiplier;

    let mut written = 0usize;
    for (idx, sample) in samples.iter().enumerate() {
        if written >= out.len() {
            break;
        }
        if *sample > threshold {
            out[written] = idx as i32;
            written += 1;
        }
    }
    written as i32
}

fn nearest_rank(sorted: &[f64], q: f64) -> f64 {
    sorted[((sorted.len() - 1) as f64 * q).floor() as usize]
}

#[cfg(test)]
mod tests {
    use super::{compute_metrics_from_buffer, detect_anomalies, run_simulation};

    #[test]
    fn fills_the_buffer_tick_by_tick() {
        let mut buf = vec![0.0f64; 100];
        let mut written: i32 = -1;
        run_simulation(2, 3.0, 2, buf.as_mut_ptr(), buf.len() as i32, &mut written);

        assert_eq!(written, 12);
        for sample in &buf[..12] {
            assert!(sample.is_finite());
            assert!(*sample >= 1.0);
        }
    }

    #[test]
    fn rate_below_one_still_emits_each_tick() {
        let mut buf = vec![0.0f64; 16];
        let mut written: i32 = 0;
        run_simulation(1, 0.1, 4, buf.as_mut_ptr(), buf.len() as i32, &mut written);
        assert_eq!(written, 4);
    }

    #[test]
    fn buffer_capacity_caps_the_run() {
        let mut buf = vec![0.0f64; 5];
        let mut written: i32 = 0;
        run_simulation(10, 10.0, 10, buf.as_mut_ptr(), buf.len() as i32, &mut written);
        assert_eq!(written, 5);
    }

    #[test]
    fn invalid_arguments_write_zero_samples() {
        let mut written: i32 = 99;
        run_simulation(1, 1.0, 1, std::ptr::null_mut(), 10, &mut written);
        assert_eq!(written, 0);
    }

    #[test]
    fn metrics_slots_match_the_contract() {
        let buf = [10.0, 20.0, 30.0, 40.0, 50.0];
        let mut out = [0.0f64; 4];
        compute_metrics_from_buffer(buf.as_ptr(), buf.len() as i32, out.as_mut_ptr());

        assert_eq!(out[0], 30.0);
        assert_eq!(out[1], 30.0);
        assert_eq!(out[2], 40.0);
        // Slot 3 carries the raw count.
        assert_eq!(out[3], 5.0);
    }

    #[test]
    fn metrics_ignore_input_order() {
        let buf = [50.0, 10.0, 40.0, 20.0, 30.0];
        let mut out = [0.0f64; 4];
        compute_metrics_from_buffer(buf.as_ptr(), buf.len() as i32, out.as_mut_ptr());
        assert_eq!(out[1], 30.0);
    }

    #[test]
    fn anomaly_indices_respect_the_output_cap() {
        // mean 52, threshold 104.
        let buf = [10.0, 10.0, 10.0, 110.0, 120.0];
        let mut indices = [0i32; 8];
        let found = detect_anomalies(buf.as_ptr(), buf.len() as i32, 2.0, indices.as_mut_ptr(), 8);
        assert_eq!(found, 2);
        assert_eq!(&indices[..2], &[3, 4]);

        let found = detect_anomalies(buf.as_ptr(), buf.len() as i32, 2.0, indices.as_mut_ptr(), 1);
        assert_eq!(found, 1);
        assert_eq!(indices[0], 3);
    }

    #[test]
    fn sample_on_the_threshold_is_not_flagged() {
        // mean 50, threshold exactly 100: the sample sitting on it stays in.
        let buf = [10.0, 10.0, 10.0, 100.0, 120.0];
        let mut indices = [0i32; 8];
        let found = detect_anomalies(buf.as_ptr(), buf.len() as i32, 2.0, indices.as_mut_ptr(), 8);
        assert_eq!(found, 1);
        assert_eq!(indices[0], 4);
    }

    #[test]
    fn anomaly_scan_rejects_bad_arguments() {
        let buf = [10.0, 20.0];
        let mut indices = [0i32; 2];
        assert_eq!(
            detect_anomalies(std::ptr::null(), 2, 2.0, indices.as_mut_ptr(), 2),
            0
        );
        assert_eq!(
            detect_anomalies(buf.as_ptr(), 0, 2.0, indices.as_mut_ptr(), 2),
            0
        );
    }
}
