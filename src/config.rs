//! Configuration loading
//!
//! Settings come from `~/.hypermon/config.toml`, overridden by command line
//! flags and `HYPERMON_*` environment variables.

use directories::BaseDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::services::coordinator::SCAN_INTERVAL;
use crate::services::source::Credentials;
use crate::types::{HypermonError, Result};

/// Contents of the config file; every field is optional
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub email: Option<String>,
    pub password: Option<String>,
    pub snapshot_dir: Option<PathBuf>,
    pub scan_interval_secs: Option<u64>,
}

impl FileConfig {
    /// Load a config file; a missing file yields the defaults
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| HypermonError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Apply overrides; `Some` values win over the file
    pub fn merge(self, overrides: FileConfig) -> Self {
        Self {
            email: overrides.email.or(self.email),
            password: overrides.password.or(self.password),
            snapshot_dir: overrides.snapshot_dir.or(self.snapshot_dir),
            scan_interval_secs: overrides.scan_interval_secs.or(self.scan_interval_secs),
        }
    }
}

/// Fully resolved settings
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub email: String,
    pub password: String,
    pub snapshot_dir: PathBuf,
    pub scan_interval: Duration,
}

impl Config {
    /// Resolve settings, filling unset values from the home directory layout
    pub fn resolve(file: FileConfig) -> Result<Self> {
        let snapshot_dir = match file.snapshot_dir {
            Some(dir) => dir,
            None => app_dir()?.join("snapshot"),
        };

        let scan_interval = match file.scan_interval_secs {
            Some(0) => {
                return Err(HypermonError::Config(
                    "scan_interval_secs must be greater than zero".into(),
                ))
            }
            Some(secs) => Duration::from_secs(secs),
            None => SCAN_INTERVAL,
        };

        Ok(Self {
            email: file.email.unwrap_or_default(),
            password: file.password.unwrap_or_default(),
            snapshot_dir,
            scan_interval,
        })
    }

    pub fn credentials(&self) -> Credentials {
        Credentials {
            email: self.email.clone(),
            password: self.password.clone(),
        }
    }
}

/// Application directory (~/.hypermon)
pub fn app_dir() -> Result<PathBuf> {
    let base_dirs = BaseDirs::new()
        .ok_or_else(|| HypermonError::Config("Cannot determine home directory".into()))?;
    Ok(base_dirs.home_dir().join(".hypermon"))
}

/// Default config file location (~/.hypermon/config.toml)
pub fn default_config_path() -> Result<PathBuf> {
    Ok(app_dir()?.join("config.toml"))
}
