//! Session configuration loaded from TOML.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, ShellError};

/// Top-level configuration for one interactive session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShellConfig {
    /// Sandbox root. No filesystem command may act outside it.
    pub root: PathBuf,
    /// Directory receiving one audit file per executed line.
    pub temp_path: PathBuf,
    /// Timeout for `httpget` requests, in seconds.
    pub http_timeout_secs: u64,
    /// Timeout for a single `ping` echo, in milliseconds.
    pub ping_timeout_ms: u64,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("Files"),
            temp_path: PathBuf::from("Temps"),
            http_timeout_secs: 30,
            ping_timeout_ms: 2000,
        }
    }
}

impl ShellConfig {
    /// Parse a configuration from TOML text. Missing keys take their defaults.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let config: Self = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| ShellError::Config(format!("{}: {e}", path.display())))?;
        log::debug!("loaded config from {}", path.display());
        Self::from_toml(&text)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    pub fn ping_timeout(&self) -> Duration {
        Duration::from_millis(self.ping_timeout_ms)
    }

    fn validate(&self) -> Result<()> {
        if self.root.as_os_str().is_empty() {
            return Err(ShellError::Config("root must not be empty".into()));
        }
        if self.temp_path.as_os_str().is_empty() {
            return Err(ShellError::Config("temp_path must not be empty".into()));
        }
        if self.ping_timeout_ms == 0 {
            return Err(ShellError::Config("ping_timeout_ms must be positive".into()));
        }
        Ok(())
    }
}
