// src/paths.rs

//! Path resolution and file placement
//!
//! Two concerns live here:
//!
//! - [`Paths`], the set of root directories every stage operates against.
//!   These are threaded explicitly through stage calls instead of a
//!   process-wide constant, so tests can inject throwaway roots.
//! - [`resolve`] / [`copy_entry`], the glob expansion and structure-preserving
//!   copy shared by the build and install stages.

use crate::config::{Config, SCRIPTS_DIR};
use crate::error::{Error, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// Default parent of all install roots
pub const DEFAULT_INSTALL_BASE: &str = "/opt";

/// Canonical system unit directory
pub const DEFAULT_UNIT_DIR: &str = "/usr/lib/systemd/system";

/// Root directories for one invocation
#[derive(Debug, Clone)]
pub struct Paths {
    /// Project working tree (contains `.qp/` and the source files)
    pub project_dir: PathBuf,
    /// Parent of install roots; the app installs to `install_base/app_name`
    pub install_base: PathBuf,
    /// Where managed unit files are written
    pub unit_dir: PathBuf,
    /// Where staging directories are created and discovered
    pub temp_dir: PathBuf,
}

impl Paths {
    /// Paths for a live invocation from the current directory
    pub fn from_cwd(install_base: &Path) -> Result<Self> {
        Ok(Self {
            project_dir: std::env::current_dir()?,
            install_base: install_base.to_path_buf(),
            unit_dir: PathBuf::from(DEFAULT_UNIT_DIR),
            temp_dir: std::env::temp_dir(),
        })
    }

    /// The application's install root: `install_base/app_name`
    pub fn install_root(&self, config: &Config) -> PathBuf {
        self.install_base.join(&config.app_name)
    }

    /// The project's conventional scripts directory
    pub fn scripts_dir(&self) -> PathBuf {
        self.project_dir.join(SCRIPTS_DIR)
    }
}

/// Expand `pattern` against `base_dir` and re-root each match under
/// `dest_root`, preserving the match's path relative to `base_dir`.
///
/// A pattern matching a single plain file with no directory component maps
/// to `dest_root/<basename>`. Zero matches yield an empty list; the caller
/// decides whether that is a warning (build patterns) or fatal (a required
/// install source).
pub fn resolve(pattern: &str, base_dir: &Path, dest_root: &Path) -> Result<Vec<(PathBuf, PathBuf)>> {
    let full_pattern = if Path::new(pattern).is_absolute() {
        pattern.to_string()
    } else {
        base_dir.join(pattern).to_string_lossy().into_owned()
    };

    let matches = glob::glob(&full_pattern).map_err(|e| Error::GlobError {
        pattern: pattern.to_string(),
        reason: e.to_string(),
    })?;

    let mut pairs = Vec::new();
    for entry in matches {
        let src = entry.map_err(|e| Error::CopyError(format!("{}", e)))?;
        let rel = src.strip_prefix(base_dir).map_err(|_| {
            Error::RelativePath(
                src.to_string_lossy().into_owned(),
                base_dir.to_string_lossy().into_owned(),
            )
        })?;
        let dst = dest_root.join(rel);
        pairs.push((src, dst));
    }
    Ok(pairs)
}

/// Copy one resolved (src, dst) pair, creating intermediate directories.
///
/// Plain files are copied with their permissions; a directory match is
/// copied recursively.
pub fn copy_entry(src: &Path, dst: &Path) -> Result<()> {
    if src.is_dir() {
        for entry in WalkDir::new(src) {
            let entry = entry.map_err(|e| Error::CopyError(e.to_string()))?;
            let rel = entry.path().strip_prefix(src).map_err(|_| {
                Error::RelativePath(
                    entry.path().to_string_lossy().into_owned(),
                    src.to_string_lossy().into_owned(),
                )
            })?;
            let target = dst.join(rel);
            if entry.file_type().is_dir() {
                fs::create_dir_all(&target)?;
            } else {
                copy_file(entry.path(), &target)?;
            }
        }
        return Ok(());
    }
    copy_file(src, dst)
}

fn copy_file(src: &Path, dst: &Path) -> Result<()> {
    if let Some(parent) = dst.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::copy(src, dst).map_err(|e| {
        Error::CopyError(format!(
            "{} -> {}: {}",
            src.display(),
            dst.display(),
            e
        ))
    })?;
    debug!("Copied {} -> {}", src.display(), dst.display());
    Ok(())
}
