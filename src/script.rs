// src/script.rs

//! Operator script staging and execution
//!
//! Scripts are arbitrary shell scripts shipped in the project's `.qp/`
//! directory. Before running, a script is staged into its working directory
//! (staging dir for builds, install root for install/uninstall): copied
//! once and skipped if already present, so a re-run does not clobber a
//! script the operator has patched in place.
//!
//! Execution runs `sh <script>` with the target directory as working
//! directory and inherited stdout/stderr, so output streams straight to the
//! operator. stdin is nullified to prevent hangs on scripts that read it.
//! A non-zero exit is fatal for the enclosing stage.

use crate::error::{Error, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::Duration;
use tracing::{debug, info};
use wait_timeout::ChildExt;

/// Guard against an operator script that never exits (1 hour)
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(3600);

/// Stage a script into `dir`, skipping the copy if it is already there.
///
/// Returns the staged path. Fails if the source script is missing.
pub fn stage(source: &Path, dir: &Path) -> Result<PathBuf> {
    let name = source
        .file_name()
        .ok_or_else(|| Error::ScriptError(format!("Invalid script path: {}", source.display())))?;
    let staged = dir.join(name);

    if staged.exists() {
        debug!("Script already staged at {}", staged.display());
        return Ok(staged);
    }
    if !source.exists() {
        return Err(Error::ScriptError(format!(
            "Script not found: {}",
            source.display()
        )));
    }
    fs::copy(source, &staged).map_err(|e| {
        Error::ScriptError(format!(
            "Failed to stage {} into {}: {}",
            source.display(),
            dir.display(),
            e
        ))
    })?;
    debug!("Staged script {} -> {}", source.display(), staged.display());
    Ok(staged)
}

/// Run a staged script with `workdir` as its working directory.
pub fn run(script: &Path, workdir: &Path) -> Result<()> {
    run_with_timeout(script, workdir, DEFAULT_TIMEOUT)
}

/// Run a staged script with an explicit timeout.
pub fn run_with_timeout(script: &Path, workdir: &Path, timeout: Duration) -> Result<()> {
    info!("Running script {} in {}", script.display(), workdir.display());

    let mut child = Command::new("sh")
        .arg(script)
        .current_dir(workdir)
        .stdin(Stdio::null()) // prevent stdin hangs
        .spawn()
        .map_err(|e| Error::ScriptError(format!("Failed to spawn {}: {}", script.display(), e)))?;

    match child.wait_timeout(timeout)? {
        Some(status) if status.success() => {
            info!("Script {} completed successfully", script.display());
            Ok(())
        }
        Some(status) => Err(Error::ScriptError(format!(
            "{} failed with exit code {}",
            script.display(),
            status.code().unwrap_or(-1)
        ))),
        None => {
            let _ = child.kill();
            Err(Error::Timeout {
                what: format!("Script {}", script.display()),
                secs: timeout.as_secs(),
            })
        }
    }
}
