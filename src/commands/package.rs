// src/commands/package.rs

//! `qp package`: generate debian artifacts and run dpkg-buildpackage.

use crate::config::Config;
use crate::debpkg;
use crate::error::{Error, Result};
use crate::paths::Paths;
use std::fs;
use std::path::Path;
use std::process::{Command, Stdio};
use tracing::{info, warn};

/// Build a `.deb` for the application.
///
/// Renders the `debian/` directory and the package payload into a fresh
/// work directory under temp, then runs `dpkg-buildpackage -us -uc` there
/// with streams inherited. dpkg-buildpackage writes the `.deb` and its
/// companion files to the work directory's parent, so the work directory
/// itself is removed after a successful run; on failure it is left in
/// place for inspection.
pub fn package(config: &Config, paths: &Paths) -> Result<()> {
    run_package(config, paths, Path::new("dpkg-buildpackage"))
}

fn run_package(config: &Config, paths: &Paths, builder: &Path) -> Result<()> {
    let workdir = tempfile::Builder::new()
        .prefix(&format!("qp-deb-{}-", config.app_name))
        .tempdir_in(&paths.temp_dir)
        .map_err(Error::IoError)?
        .into_path();
    info!("Packaging {} in {}", config.app_name, workdir.display());

    debpkg::write_artifacts(config, paths, &workdir)?;
    debpkg::stage_payload(config, paths, &workdir)?;

    info!("Running dpkg-buildpackage...");
    let status = Command::new(builder)
        .args(["-us", "-uc"])
        .current_dir(&workdir)
        .stdin(Stdio::null())
        .status()
        .map_err(|e| Error::ScriptError(format!("Failed to run dpkg-buildpackage: {}", e)))?;

    if !status.success() {
        return Err(Error::ScriptError(format!(
            "dpkg-buildpackage failed with exit code {} (work dir kept at {})",
            status.code().unwrap_or(-1),
            workdir.display()
        )));
    }

    // The built artifacts live in the parent; the payload copy is spent
    if let Err(e) = fs::remove_dir_all(&workdir) {
        warn!(
            "Failed to remove work directory {}: {}",
            workdir.display(),
            e
        );
    }

    info!(
        "Package built successfully, artifacts in {}",
        paths.temp_dir.display()
    );
    Ok(())
}
