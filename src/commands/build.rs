// src/commands/build.rs

//! Build stage: resolve build patterns into a fresh staging directory and
//! optionally run the project's build script there.

use crate::config::Config;
use crate::error::{Error, Result};
use crate::paths::{self, Paths};
use crate::script;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Handle to a staging directory produced by the build stage.
///
/// The directory is kept on disk (not auto-deleted) so a standalone
/// `qp build` can hand off to a later `qp install`. Within one `qp install`
/// invocation the handle is passed to the install stage directly; the
/// install stage sweeps all staging directories for the app once it is done.
#[derive(Debug)]
pub struct StagingDir {
    path: PathBuf,
}

impl StagingDir {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Staging directory name prefix for one application
pub fn stage_prefix(app_name: &str) -> String {
    format!("qp-stage-{}-", app_name)
}

/// Find an existing staging directory for the app, if any.
///
/// Best-effort fallback for a standalone install: scans the temp directory
/// for the app's prefix and takes the first enumeration match. Stale
/// directories from failed runs can collide here, which is why an explicit
/// handle from [`build`] is the primary linkage.
pub fn discover_staging(app_name: &str, temp_dir: &Path) -> Option<StagingDir> {
    let prefix = stage_prefix(app_name);
    let entries = fs::read_dir(temp_dir).ok()?;
    for entry in entries.flatten() {
        let name = entry.file_name();
        if name.to_string_lossy().starts_with(&prefix) && entry.path().is_dir() {
            debug!("Discovered staging directory {}", entry.path().display());
            return Some(StagingDir { path: entry.path() });
        }
    }
    None
}

/// Remove every staging directory carrying the app's prefix, best-effort.
pub fn sweep_staging(app_name: &str, temp_dir: &Path) {
    let prefix = stage_prefix(app_name);
    let entries = match fs::read_dir(temp_dir) {
        Ok(entries) => entries,
        Err(e) => {
            warn!("Could not scan {} for cleanup: {}", temp_dir.display(), e);
            return;
        }
    };
    for entry in entries.flatten() {
        if !entry.file_name().to_string_lossy().starts_with(&prefix) {
            continue;
        }
        match fs::remove_dir_all(entry.path()) {
            Ok(()) => debug!("Removed staging directory {}", entry.path().display()),
            Err(e) => warn!(
                "Failed to remove staging directory {}: {}",
                entry.path().display(),
                e
            ),
        }
    }
}

/// Run the build stage: stage build files and execute the build script.
pub fn build(config: &Config, paths: &Paths) -> Result<StagingDir> {
    let staging = tempfile::Builder::new()
        .prefix(&stage_prefix(&config.app_name))
        .tempdir_in(&paths.temp_dir)
        .map_err(Error::IoError)?
        .into_path();
    info!("Building {} in {}", config.app_name, staging.display());

    for pattern in &config.build_files {
        let pairs = paths::resolve(pattern, &paths.project_dir, &staging)?;
        if pairs.is_empty() {
            warn!("Build pattern '{}' matched no files", pattern);
            continue;
        }
        for (src, dst) in pairs {
            paths::copy_entry(&src, &dst)?;
        }
    }

    if let Some(name) = &config.build_script {
        let source = paths.scripts_dir().join(name);
        let staged = script::stage(&source, &staging)?;
        script::run(&staged, &staging)?;
    }

    Ok(StagingDir { path: staging })
}
