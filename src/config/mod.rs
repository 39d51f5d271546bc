//! Runner configuration
//!
//! Loaded from a JSON document (every field optional) or built in code.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Error, Result};
use crate::harness::HarnessOptions;

// ---------------------------------------------------------------------------
// RunnerConfig
// ---------------------------------------------------------------------------

/// Configuration for a [`Runner`](crate::runner::Runner).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct RunnerConfig {
    /// Skip every test declared after the first failure.
    pub fail_fast: bool,
    /// Packages whose `import` lines are commented out before the harness is
    /// spliced in (the harness provides those globals itself).
    pub globals_packages: Vec<String>,
    /// Upper bound on loop iterations per loop, guards against accidental
    /// infinite loops in learner code.
    pub loop_iteration_limit: u64,
    /// Maximum call depth.
    pub recursion_limit: usize,
    /// Console calls beyond this count are dropped.
    pub max_console_entries: usize,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            fail_fast: true,
            globals_packages: vec!["@jest/globals".to_string()],
            loop_iteration_limit: 10_000_000,
            recursion_limit: 512,
            max_console_entries: 1000,
        }
    }
}

impl RunnerConfig {
    /// Parse a JSON document; missing fields keep their defaults.
    pub fn load(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| Error::Config(format!("Failed to parse runner config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a JSON config file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        Self::load(&text)
    }

    fn validate(&self) -> Result<()> {
        if self.loop_iteration_limit == 0 {
            return Err(Error::Config("loopIterationLimit must be positive".into()));
        }
        if self.recursion_limit == 0 {
            return Err(Error::Config("recursionLimit must be positive".into()));
        }
        if let Some(name) = self.globals_packages.iter().find(|p| p.trim().is_empty()) {
            return Err(Error::Config(format!("invalid globals package {:?}", name)));
        }
        Ok(())
    }

    /// The subset of the config the injected harness sees.
    pub fn harness_options(&self) -> HarnessOptions {
        HarnessOptions {
            fail_fast: self.fail_fast,
            max_console_entries: self.max_console_entries,
        }
    }
}
