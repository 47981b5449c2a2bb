#[cfg(feature = "native")]
pub mod native;

use anyhow::Result;
use loadsim_abstract::SimBackend;
use loadsim_engine::ReferenceBackend;
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// Environment variable naming an accelerated library to probe.
pub const NATIVE_LIB_ENV: &str = "LOADSIM_NATIVE_LIB";

/// Which backend the caller wants.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BackendChoice {
    /// Probe for an accelerated library, fall back to reference.
    Auto,
    /// Reference backend only, no probing.
    Reference,
    /// Accelerated library required; selection fails if it cannot be loaded.
    Native,
}

/// Map a user-visible backend name to the enum used by the selector.
pub fn backend_by_name(name: &str) -> Result<BackendChoice> {
    match name {
        "auto" => Ok(BackendChoice::Auto),
        "reference" => Ok(BackendChoice::Reference),
        "native" => Ok(BackendChoice::Native),
        other => anyhow::bail!("Unknown backend '{other}'. Try 'auto', 'reference' or 'native'."),
    }
}

/// Builder for backend selection. Selection happens once per process; the
/// chosen backend is then owned by a `Session` for its lifetime.
pub struct BackendSelector {
    choice: BackendChoice,
    native_path: Option<PathBuf>,
    seed: Option<u64>,
}

impl Default for BackendSelector {
    fn default() -> Self {
        Self::new()
    }
}

impl BackendSelector {
    pub fn new() -> Self {
        Self {
            choice: BackendChoice::Auto,
            native_path: None,
            seed: None,
        }
    }

    pub fn choice(mut self, choice: BackendChoice) -> Self {
        self.choice = choice;
        self
    }

    /// Explicit library path, probed before the env var and the directory
    /// next to the executable.
    pub fn native_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.native_path = Some(path.into());
        self
    }

    /// Seed for the reference backend's RNG. Has no effect on an
    /// accelerated library, which seeds itself.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Pick the backend. Probe failures are logged and downgrade to the
    /// reference backend unless the accelerated one was explicitly required.
    pub fn select(self) -> Result<Box<dyn SimBackend>> {
        match self.choice {
            BackendChoice::Reference => Ok(self.reference_backend()),
            BackendChoice::Native => load_native(self.candidate_paths()),
            BackendChoice::Auto => match load_native(self.candidate_paths()) {
                Ok(backend) => Ok(backend),
                Err(err) => {
                    warn!("accelerated backend unavailable ({err:#}), using reference");
                    Ok(self.reference_backend())
                }
            },
        }
    }

    fn reference_backend(&self) -> Box<dyn SimBackend> {
        match self.seed {
            Some(seed) => Box::new(ReferenceBackend::seeded(seed)),
            None => Box::new(ReferenceBackend::new()),
        }
    }

    fn candidate_paths(&self) -> Vec<PathBuf> {
        let mut candidates = Vec::new();
        if let Some(path) = &self.native_path {
            candidates.push(path.clone());
        }
        if let Ok(path) = std::env::var(NATIVE_LIB_ENV) {
            candidates.push(PathBuf::from(path));
        }
        if let Ok(exe) = std::env::current_exe()
            && let Some(dir) = exe.parent()
        {
            candidates.push(dir.join(platform_lib_name()));
        }
        candidates
    }
}

fn platform_lib_name() -> String {
    format!(
        "{}loadsim_native{}",
        std::env::consts::DLL_PREFIX,
        std::env::consts::DLL_SUFFIX
    )
}

#[cfg(feature = "native")]
fn load_native(candidates: Vec<PathBuf>) -> Result<Box<dyn SimBackend>> {
    if candidates.is_empty() {
        anyhow::bail!("no accelerated library path to probe");
    }

    let mut last_err = None;
    for path in candidates {
        match native::load_backend(&path) {
            Ok(backend) => {
                info!("accelerated backend loaded from {}", path.display());
                return Ok(backend);
            }
            Err(err) => {
                debug!("probe failed for {}: {err:#}", path.display());
                last_err = Some(err);
            }
        }
    }
    Err(last_err.unwrap_or_else(|| anyhow::anyhow!("no accelerated library found")))
}

#[cfg(not(feature = "native"))]
fn load_native(_candidates: Vec<PathBuf>) -> Result<Box<dyn SimBackend>> {
    anyhow::bail!("native backend support disabled at compile time");
}
