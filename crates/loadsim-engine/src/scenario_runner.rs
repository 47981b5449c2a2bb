use anyhow::{Context, Result};
use loadsim_abstract::{LoadProfile, LoadScenario, ScenarioAssertion};
use std::fs;
use std::path::Path;
use tracing::info;

use crate::session::{RunResult, Session};

/// Load a scenario definition from a TOML file.
pub fn load_scenario(path: &Path) -> Result<LoadScenario> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read scenario file {}", path.display()))?;
    let scenario: LoadScenario =
        toml::from_str(&content).context("Failed to parse scenario file")?;
    Ok(scenario)
}

/// Run a scenario on the session and evaluate its assertions.
///
/// Returns the violated assertions as human-readable messages, empty when
/// everything passed. Violations are collected rather than failing fast so
/// one scenario run reports every broken bound at once.
pub fn run_scenario(session: &mut Session, scenario: &LoadScenario) -> Result<Vec<String>> {
    info!("Running scenario: {}", scenario.name);
    info!("Description: {}", scenario.description);

    let mut profile = LoadProfile::default();
    scenario.profile.apply_to(&mut profile);

    let result = session.execute(&profile)?;
    Ok(evaluate_assertions(&scenario.assertions, result))
}

pub fn evaluate_assertions(assertions: &[ScenarioAssertion], result: &RunResult) -> Vec<String> {
    let metrics = result.metrics.as_ref();
    let mut violations = Vec::new();

    for assertion in assertions {
        match assertion {
            ScenarioAssertion::MaxAvgMs { ms } => {
                check_upper(&mut violations, "avg", metrics.map(|m| m.avg_ms), *ms);
            }
            ScenarioAssertion::MaxP95Ms { ms } => {
                check_upper(&mut violations, "p95", metrics.map(|m| m.p95_ms), *ms);
            }
            ScenarioAssertion::MaxP99Ms { ms } => {
                check_upper(&mut violations, "p99", metrics.and_then(|m| m.p99_ms), *ms);
            }
            ScenarioAssertion::MinThroughputRps { rps } => {
                match metrics.map(|m| m.throughput_rps) {
                    Some(actual) if actual >= *rps => {}
                    Some(actual) => violations.push(format!(
                        "throughput {actual:.2} req/s below required {rps:.2} req/s"
                    )),
                    None => violations
                        .push("throughput unavailable: run produced no metrics".to_string()),
                }
            }
            ScenarioAssertion::MinSamples { count } => {
                if result.series.len() < *count {
                    violations.push(format!(
                        "run produced {} samples, expected at least {}",
                        result.series.len(),
                        count
                    ));
                }
            }
        }
    }

    violations
}

fn check_upper(violations: &mut Vec<String>, stat: &str, actual: Option<f64>, limit_ms: f64) {
    match actual {
        Some(value) if value <= limit_ms => {}
        Some(value) => violations.push(format!(
            "{stat} latency {value:.2} ms exceeds limit {limit_ms:.2} ms"
        )),
        None => violations.push(format!("{stat} latency unavailable in this run's metrics")),
    }
}
