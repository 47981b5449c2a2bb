use anyhow::{Context, Result};
use clap::Parser;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{info, warn};

use loadsim_abstract::{LoadProfile, LoadScenario};
use loadsim_engine::tui::{MemoryLogBuffer, TuiApp};
use loadsim_engine::{RunReport, RunResult, Session, anomaly, export, render, scenario_runner};
use loadsim_loader::{BackendSelector, backend_by_name};

#[derive(Parser, Debug)]
#[command(author, version, about = "Synthetic load generator with latency metrics")]
struct Args {
    /// Number of simulated clients.
    #[arg(long, default_value_t = 1)]
    clients: u32,

    /// Requests per second, per client.
    #[arg(long, default_value_t = 0.1)]
    rps: f64,

    /// Run duration in seconds.
    #[arg(long, default_value_t = 5)]
    duration: u32,

    /// Baseline latency in milliseconds.
    #[arg(long, default_value_t = 50.0)]
    base_latency: f64,

    /// Uniform jitter around the baseline, in milliseconds.
    #[arg(long, default_value_t = 10.0)]
    jitter: f64,

    /// Per-sample spike probability, in percent.
    #[arg(long, default_value_t = 0.0)]
    spike_chance: f64,

    /// Seed for reproducible runs on the reference backend.
    #[arg(long)]
    seed: Option<u64>,

    /// Backend to run on: auto, reference or native.
    #[arg(long, default_value = "auto")]
    backend: String,

    /// Explicit path to the accelerated simulation library.
    #[arg(long)]
    native_lib: Option<PathBuf>,

    /// Run a scenario file instead of the ad-hoc profile.
    #[arg(long)]
    scenario: Option<PathBuf>,

    /// Launch the terminal UI visualizer.
    #[arg(long, default_value_t = false)]
    tui: bool,

    /// Write the latency series as CSV (optional custom path).
    #[arg(long, num_args = 0..=1, default_missing_value = export::DEFAULT_EXPORT_FILENAME)]
    export: Option<PathBuf>,

    /// Write a JSON report of the finished run.
    #[arg(long)]
    json_out: Option<PathBuf>,

    /// List samples above mean * multiplier in the summary.
    #[arg(long)]
    anomaly_threshold: Option<f64>,

    /// Number of chart points kept when downsampling.
    #[arg(long, default_value_t = render::DEFAULT_TARGET_POINTS)]
    plot_points: usize,
}

fn main() -> Result<ExitCode> {
    let args = Args::parse();
    let logs = init_logging(args.tui);
    info!("loadsim starting…");

    let scenario = match &args.scenario {
        Some(path) => Some(scenario_runner::load_scenario(path)?),
        None => None,
    };
    let seed = args.seed.or_else(|| scenario.as_ref().and_then(|s| s.seed));

    let backend = args.build_selector(seed)?.select()?;
    let session = match seed {
        Some(seed) => Session::with_seeded_fallback(backend, seed),
        None => Session::new(backend),
    };

    let (session, violations) = if args.tui {
        run_tui(session, &args, scenario.as_ref(), logs)?
    } else {
        run_headless(session, &args, scenario.as_ref())?
    };

    write_outputs(&session, &args)?;

    if violations.is_empty() {
        return Ok(ExitCode::SUCCESS);
    }
    for violation in &violations {
        eprintln!("assertion failed: {violation}");
    }
    Ok(ExitCode::from(2))
}

impl Args {
    fn profile(&self) -> LoadProfile {
        LoadProfile {
            clients: self.clients,
            requests_per_second: self.rps,
            duration_secs: self.duration,
            base_latency_ms: self.base_latency,
            jitter_ms: self.jitter,
            spike_chance_pct: self.spike_chance,
        }
    }

    fn build_selector(&self, seed: Option<u64>) -> Result<BackendSelector> {
        let mut selector = BackendSelector::new().choice(backend_by_name(&self.backend)?);
        if let Some(path) = &self.native_lib {
            selector = selector.native_path(path.clone());
        }
        if let Some(seed) = seed {
            selector = selector.seed(seed);
        }
        Ok(selector)
    }
}

fn init_logging(use_tui: bool) -> Option<MemoryLogBuffer> {
    if use_tui {
        let buffer = MemoryLogBuffer::new();
        let writer = buffer.clone();
        tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .init();
        Some(buffer)
    } else {
        tracing_subscriber::fmt::init();
        None
    }
}

fn run_headless(
    mut session: Session,
    args: &Args,
    scenario: Option<&LoadScenario>,
) -> Result<(Session, Vec<String>)> {
    let violations = match scenario {
        Some(scenario) => scenario_runner::run_scenario(&mut session, scenario)?,
        None => {
            session.execute(&args.profile())?;
            Vec::new()
        }
    };

    if let Some(result) = session.last_result() {
        print_summary(result, args.anomaly_threshold);
    }
    Ok((session, violations))
}

fn run_tui(
    session: Session,
    args: &Args,
    scenario: Option<&LoadScenario>,
    logs: Option<MemoryLogBuffer>,
) -> Result<(Session, Vec<String>)> {
    let (profile, title) = match scenario {
        Some(scenario) => {
            let mut profile = LoadProfile::default();
            scenario.profile.apply_to(&mut profile);
            (profile, Some(scenario.name.clone()))
        }
        None => (args.profile(), None),
    };

    let mut app = TuiApp::new(session, profile, title, logs).plot_points(args.plot_points);
    app.run()?;
    let session = app.into_session();

    // Quitting before the first run finishes leaves nothing to gate on.
    let violations = match (scenario, session.last_result()) {
        (Some(scenario), Some(result)) => {
            scenario_runner::evaluate_assertions(&scenario.assertions, result)
        }
        _ => Vec::new(),
    };
    Ok((session, violations))
}

fn print_summary(result: &RunResult, anomaly_threshold: Option<f64>) {
    println!("Backend:    {}", result.backend);
    println!("Samples:    {}", result.series.len());
    match &result.metrics {
        Some(m) => {
            println!("Avg:        {:.2} ms", m.avg_ms);
            println!("p50:        {:.2} ms", m.p50_ms);
            println!("p90:        {}", fmt_opt_ms(m.p90_ms));
            println!("p95:        {:.2} ms", m.p95_ms);
            println!("p99:        {}", fmt_opt_ms(m.p99_ms));
            println!("Throughput: {:.2} req/s", m.throughput_rps);
        }
        None => println!("No samples were produced; metrics unavailable."),
    }
    if let Some(multiplier) = anomaly_threshold {
        let anomalies = anomaly::detect_anomalies(&result.series, multiplier);
        println!(
            "Anomalies:  {} samples above {multiplier}x mean",
            anomalies.len()
        );
    }
}

fn fmt_opt_ms(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{v:.2} ms"),
        None => "-".to_string(),
    }
}

fn write_outputs(session: &Session, args: &Args) -> Result<()> {
    let Some(result) = session.last_result() else {
        if args.export.is_some() || args.json_out.is_some() {
            warn!("No finished run; skipping export");
        }
        return Ok(());
    };

    if let Some(path) = &args.export {
        export::write_csv(path, &result.series)?;
        info!(
            "Wrote {} samples to {}",
            result.series.len(),
            path.display()
        );
    }

    if let Some(path) = &args.json_out {
        write_report(path, &RunReport::from_result(result, args.plot_points))?;
    }

    Ok(())
}

fn write_report(path: &Path, report: &RunReport) -> Result<()> {
    let data = serde_json::to_vec_pretty(report).context("Failed to serialize run report")?;
    fs::write(path, &data)
        .with_context(|| format!("Failed to write report file {}", path.display()))?;
    Ok(())
}
