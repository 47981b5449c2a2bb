use std::path::Path;

use anyhow::Context;
use libloading::{Library, Symbol};
use loadsim_abstract::{BackendError, LatencySeries, LoadProfile, MetricsRecord, SimBackend};

/// C function types exported by an accelerated simulation library.
///
/// The expected C signatures are:
/// ```c
/// void run_simulation(int clients, double rps, int duration,
///                     double* out_buf, int max_samples, int* out_written);
/// void compute_metrics_from_buffer(const double* buf, int count,
///                                  double* out_metrics);
/// ```
/// `out_metrics` receives `[avg, p50, p95, throughput]`.

type RunSimulationFn = unsafe extern "C" fn(i32, f64, i32, *mut f64, i32, *mut i32);
type ComputeMetricsFn = unsafe extern "C" fn(*const f64, i32, *mut f64);

pub struct NativeBackend {
    _lib: Library,
    run_simulation: RunSimulationFn,
    compute_metrics: ComputeMetricsFn,
}

impl NativeBackend {
    fn new(lib: Library) -> anyhow::Result<Self> {
        unsafe {
            let run_sym: Symbol<RunSimulationFn> = lib
                .get(b"run_simulation\0")
                .context("missing run_simulation")?;
            let metrics_sym: Symbol<ComputeMetricsFn> = lib
                .get(b"compute_metrics_from_buffer\0")
                .context("missing compute_metrics_from_buffer")?;

            let run_simulation = *run_sym;
            let compute_metrics = *metrics_sym;

            Ok(Self {
                _lib: lib,
                run_simulation,
                compute_metrics,
            })
        }
    }
}

impl SimBackend for NativeBackend {
    fn label(&self) -> &'static str {
        "native"
    }

    fn generate(&mut self, profile: &LoadProfile) -> Result<LatencySeries, BackendError> {
        let capacity = profile.target_samples();
        let max_samples = i32::try_from(capacity)
            .map_err(|_| BackendError::SeriesTooLarge(capacity, i32::MAX as usize))?;
        let clients = i32::try_from(profile.clients)
            .map_err(|_| BackendError::ParameterOutOfRange("clients"))?;
        let duration = i32::try_from(profile.duration_secs)
            .map_err(|_| BackendError::ParameterOutOfRange("duration_secs"))?;

        // Scratch buffer lives only for this call, on every exit path.
        let mut buffer = vec![0.0f64; capacity];
        let mut written: i32 = 0;
        unsafe {
            (self.run_simulation)(
                clients,
                profile.requests_per_second,
                duration,
                buffer.as_mut_ptr(),
                max_samples,
                &mut written,
            );
        }

        if written < 0 || written as usize > capacity {
            return Err(BackendError::SampleCountOutOfRange(written, capacity));
        }
        buffer.truncate(written as usize);

        for (idx, sample) in buffer.iter().enumerate() {
            if !sample.is_finite() || *sample <= 0.0 {
                return Err(BackendError::MalformedSample(idx));
            }
        }

        Ok(LatencySeries::from_samples(buffer))
    }

    fn reduce(
        &mut self,
        series: &LatencySeries,
        profile: &LoadProfile,
    ) -> Result<Option<MetricsRecord>, BackendError> {
        if series.is_empty() {
            return Ok(None);
        }
        let count = i32::try_from(series.len())
            .map_err(|_| BackendError::SeriesTooLarge(series.len(), i32::MAX as usize))?;

        let mut out = [0.0f64; 4];
        unsafe {
            (self.compute_metrics)(series.as_slice().as_ptr(), count, out.as_mut_ptr());
        }

        if out.iter().any(|v| !v.is_finite()) {
            return Err(BackendError::MalformedMetrics);
        }

        // The library's fourth slot is a raw sample count; the advertised
        // throughput is recomputed against the run duration.
        let duration = profile.duration_secs.max(1) as f64;
        Ok(Some(MetricsRecord {
            count: series.len(),
            avg_ms: out[0],
            p50_ms: out[1],
            p90_ms: None,
            p95_ms: out[2],
            p99_ms: None,
            throughput_rps: series.len() as f64 / duration,
        }))
    }
}

/// Load an accelerated library and wrap it as a simulation backend.
pub fn load_backend<P: AsRef<Path>>(path: P) -> anyhow::Result<Box<dyn SimBackend>> {
    let lib = unsafe { Library::new(path.as_ref()) }
        .with_context(|| format!("failed to load accelerated library {:?}", path.as_ref()))?;
    let backend = NativeBackend::new(lib)?;
    Ok(Box::new(backend))
}
