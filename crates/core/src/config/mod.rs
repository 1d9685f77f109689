// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Project configuration
//!
//! Values come from `.iosnapshotrc.json` in the project root, then
//! environment overrides. Command-line flags are applied last by the caller.

mod validate;

pub use validate::{parse_port, parse_timeout, validate_pattern};

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tracing::warn;

/// Default Collector port
pub const DEFAULT_PORT: u16 = 9444;

/// Default idle timeout, in minutes
pub const DEFAULT_TIMEOUT_MINUTES: u64 = 30;

/// Default file-set pattern for inject/test/clean
pub const DEFAULT_PATTERN: &str = "**/*.{ts,tsx,js,jsx}";

/// Environment variable overriding the Collector port
pub const PORT_ENV: &str = "IOSNAP_DAEMON_PORT";

/// Environment variable overriding the CORS origin
pub const CORS_ENV: &str = "SNAP_DAEMON_CORS";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid port '{0}': must be between 1 and 65535")]
    InvalidPort(String),
    #[error("invalid timeout '{0}': must be a whole number of minutes, at least 1")]
    InvalidTimeout(String),
    #[error("file pattern must not be empty")]
    EmptyPattern,
    #[error("failed to read {path}: {reason}")]
    Read { path: String, reason: String },
    #[error("malformed config {path}: {reason}")]
    Malformed { path: String, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    pub port: u16,
    /// Idle timeout in minutes
    pub timeout: u64,
    pub cors: CorsConfig,
    pub replay: ReplayConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CorsConfig {
    pub origin: String,
}

/// How captured calls are replayed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ReplayConfig {
    /// Node.js executable
    pub node: String,
    /// Extra arguments placed before the harness (e.g. a TypeScript loader)
    pub node_args: Vec<String>,
    /// Upper bound for one function's replay batch
    pub timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            timeout: DEFAULT_TIMEOUT_MINUTES,
            cors: CorsConfig::default(),
            replay: ReplayConfig::default(),
        }
    }
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            origin: "*".to_string(),
        }
    }
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            node: "node".to_string(),
            node_args: Vec::new(),
            timeout_secs: 30,
        }
    }
}

impl Config {
    /// Load the project config and apply environment overrides.
    ///
    /// A missing file yields defaults. An unreadable or malformed file is
    /// logged and ignored.
    pub fn load(project_root: &Path) -> Self {
        let path = project_root.join(crate::paths::CONFIG_FILE);
        let config = match Self::from_file(&path) {
            Ok(Some(config)) => config,
            Ok(None) => Self::default(),
            Err(e) => {
                warn!(error = %e, "ignoring config file, using defaults");
                Self::default()
            }
        };
        config.with_env(|name| std::env::var(name).ok())
    }

    /// Read a config file; `Ok(None)` when it does not exist
    pub fn from_file(path: &Path) -> Result<Option<Self>, ConfigError> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(ConfigError::Read {
                    path: path.display().to_string(),
                    reason: e.to_string(),
                })
            }
        };
        let config: Self = serde_json::from_str(&text).map_err(|e| ConfigError::Malformed {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        config.validate().map_err(|e| ConfigError::Malformed {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Ok(Some(config))
    }

    /// Apply environment overrides; invalid values are logged and skipped
    pub fn with_env(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(raw) = lookup(PORT_ENV) {
            match parse_port(&raw) {
                Ok(port) => self.port = port,
                Err(e) => warn!(var = PORT_ENV, error = %e, "ignoring environment override"),
            }
        }
        if let Some(origin) = lookup(CORS_ENV).filter(|o| !o.is_empty()) {
            self.cors.origin = origin;
        }
        self
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::InvalidPort(self.port.to_string()));
        }
        if self.timeout == 0 {
            return Err(ConfigError::InvalidTimeout(self.timeout.to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
