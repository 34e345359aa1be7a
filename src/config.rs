//! Dispatcher configuration.
//!
//! ```toml
//! [worker]
//! thread_name = "pgp-worker"
//! queue_depth = 16
//!
//! [environment]
//! worker_capable = true
//! native_keygen = false
//! ```
//!
//! Every table and key is optional. Without a `[worker]` table no worker is
//! started; environment keys left out fall back to detection.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::environment::Environment;
use crate::error::{Error, Result};
use crate::worker::WorkerConfig;

/// Overrides for the probed [`Environment`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentConfig {
    pub worker_capable: Option<bool>,
    pub native_keygen: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Start a worker with these settings
    pub worker: Option<WorkerConfig>,
    #[serde(default)]
    pub environment: EnvironmentConfig,
}

impl DispatchConfig {
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        toml::from_str(contents).map_err(|e| Error::Config(e.to_string()))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&contents)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::Config(e.to_string()))
    }

    /// The detected environment with configured overrides applied.
    pub fn environment(&self) -> Environment {
        let detected = Environment::detect();
        Environment::new(
            self.environment.worker_capable.unwrap_or(detected.worker_capable),
            self.environment.native_keygen.unwrap_or(detected.native_keygen),
        )
    }
}
