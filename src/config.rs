// src/config.rs

//! Deployment descriptor loading and validation
//!
//! The descriptor lives at `.qp/config.json` in the project directory and
//! describes one application: which files feed the build, which files land
//! in the install root (and from where), optional operator scripts, and an
//! optional managed systemd service.
//!
//! Validation runs once, eagerly, when the descriptor is loaded. No stage
//! executes against an invalid config.

use crate::error::{Error, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Default path for the deployment descriptor
pub const DEFAULT_CONFIG_PATH: &str = ".qp/config.json";

/// Conventional directory for operator scripts, relative to the project
pub const SCRIPTS_DIR: &str = ".qp";

/// Where an install file is taken from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum Provenance {
    /// Resolved against the project working tree
    #[serde(rename = "cwd")]
    Cwd,
    /// Resolved against the staging directory produced by the build stage
    #[serde(rename = "build")]
    Build,
}

/// One install-file entry: a path and where it comes from
#[derive(Debug, Clone, Deserialize)]
pub struct FileEntry {
    pub file: String,
    pub from: Provenance,
}

/// The deployment descriptor, immutable once loaded
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Application identifier; doubles as the service name and as the
    /// install-root and staging-dir name component
    pub app_name: String,

    /// Glob patterns feeding the build stage, resolved against the project
    #[serde(default)]
    pub build_files: Vec<String>,

    /// Files to place under the install root; must be non-empty
    #[serde(default)]
    pub install_files: Vec<FileEntry>,

    /// Optional script names, resolved against the `.qp/` scripts directory
    #[serde(default)]
    pub build_script: Option<String>,
    #[serde(default)]
    pub install_script: Option<String>,
    #[serde(default)]
    pub uninstall_script: Option<String>,

    /// Whether a systemd unit is managed for this application
    #[serde(default)]
    pub systemd: bool,

    /// Templated per-user unit (`app@`) instead of a singleton system unit
    #[serde(default, rename = "systemdRunAsUser")]
    pub systemd_run_as_user: bool,

    /// Service command line; required when `systemd` is set
    #[serde(default)]
    pub exec: String,

    /// Packaging metadata, used only by `qp package`
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub maintainer: Option<String>,
    #[serde(default)]
    pub dependencies: Vec<String>,
    #[serde(default)]
    pub service_user: Option<String>,
}

impl Config {
    /// Load and validate a descriptor from the given path
    pub fn load(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path).map_err(|e| {
            Error::ConfigError(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let config: Config = serde_json::from_str(&data)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the descriptor invariants
    ///
    /// Every violation is fatal before any stage runs:
    /// - `app_name` non-empty, no path separators or glob metacharacters
    /// - `install_files` non-empty
    /// - `systemd` implies a non-empty `exec`
    pub fn validate(&self) -> Result<()> {
        if self.app_name.is_empty() {
            return Err(Error::ConfigError("app_name must not be empty".to_string()));
        }
        if let Some(bad) = self
            .app_name
            .chars()
            .find(|c| matches!(c, '/' | '\\' | '*' | '?' | '[' | ']'))
        {
            return Err(Error::ConfigError(format!(
                "app_name must not contain '{}' (used as a directory and unit name)",
                bad
            )));
        }
        if self.install_files.is_empty() {
            return Err(Error::ConfigError(
                "install_files must not be empty".to_string(),
            ));
        }
        if self.systemd && self.exec.is_empty() {
            return Err(Error::ConfigError(
                "exec is required when systemd is enabled".to_string(),
            ));
        }
        Ok(())
    }

    /// Resolve a script name against the project's scripts directory
    pub fn script_path(&self, project_dir: &Path, name: &str) -> PathBuf {
        project_dir.join(SCRIPTS_DIR).join(name)
    }
}
