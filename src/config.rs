//! Dashboard configuration.
//!
//! Defaults, then an optional JSON file, then environment overrides for the
//! two source paths.

use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Config file read from the working directory when present.
pub const CONFIG_FILE: &str = "dashboard.json";
/// Explicit config file path; the file must exist.
pub const CONFIG_ENV: &str = "DASHBOARD_CONFIG";
pub const GLOBAL_SOURCE_ENV: &str = "DASHBOARD_GLOBAL_CSV";
pub const REGIONAL_SOURCE_ENV: &str = "DASHBOARD_REGIONAL_CSV";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid config {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Country-level wide CSV.
    pub global_source: PathBuf,
    /// Province/state wide CSV, also used for the map.
    pub regional_source: PathBuf,
    /// `tracing` filter used when `RUST_LOG` is unset.
    pub log_filter: String,
    /// Entities pre-selected on the chart pages when present.
    pub default_entities: Vec<String>,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            global_source: PathBuf::from("time_series_covid19_confirmed_global.csv"),
            regional_source: PathBuf::from("time_series_covid19_confirmed_UK.csv"),
            log_filter: "info".to_string(),
            default_entities: vec!["United Kingdom".to_string()],
        }
    }
}

impl DashboardConfig {
    /// Resolve configuration from the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match std::env::var_os(CONFIG_ENV) {
            Some(path) => Self::from_file(Path::new(&path))?,
            None if Path::new(CONFIG_FILE).is_file() => Self::from_file(Path::new(CONFIG_FILE))?,
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var_os(key));
        Ok(config)
    }

    /// Parse a JSON config file; absent keys keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Apply source-path overrides from `lookup` (normally the environment).
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<OsString>) {
        if let Some(path) = lookup(GLOBAL_SOURCE_ENV).filter(|p| !p.is_empty()) {
            self.global_source = PathBuf::from(path);
        }
        if let Some(path) = lookup(REGIONAL_SOURCE_ENV).filter(|p| !p.is_empty()) {
            self.regional_source = PathBuf::from(path);
        }
    }
}
