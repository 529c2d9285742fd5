// src/commands/install.rs

//! Install stage: place files into the install root, run the install
//! script, and cycle the managed service around the replacement.

use super::build::{discover_staging, sweep_staging, StagingDir};
use crate::config::{Config, Provenance};
use crate::error::{Error, Result};
use crate::paths::{self, Paths};
use crate::script;
use crate::systemd::{SystemdManager, SystemdUnit};
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

/// Run the install stage.
///
/// `staging` is the handle returned by the build stage when this install is
/// part of a combined `qp install` run; a standalone install falls back to
/// scanning the temp directory for a staging dir left by an earlier
/// `qp build`. Ordering: the service is stopped before the install root is
/// mutated and only (re)started once files and the install script are fully
/// in place.
pub fn install(config: &Config, paths: &Paths, staging: Option<&StagingDir>) -> Result<()> {
    let install_root = paths.install_root(config);
    info!(
        "Installing {} to {}",
        config.app_name,
        install_root.display()
    );

    let manager = SystemdManager::new(&paths.unit_dir);
    let unit = SystemdUnit::from_config(config);

    // Stop any running instance before replacing files under it. Lenient:
    // a failed or timed-out stop is logged and the install proceeds.
    if config.systemd {
        if let Err(e) = manager.stop_if_active(&unit) {
            warn!("Pre-install stop of '{}' failed: {}", unit.wildcard(), e);
        }
    }

    fs::create_dir_all(&install_root)?;

    let discovered;
    let build_dir: Option<&Path> = match staging {
        Some(dir) => Some(dir.path()),
        None => {
            discovered = discover_staging(&config.app_name, &paths.temp_dir);
            discovered.as_ref().map(|d| d.path())
        }
    };
    match build_dir {
        Some(dir) => debug!("Using staging directory {}", dir.display()),
        None => debug!("No staging directory found; only cwd sources available"),
    }

    for entry in &config.install_files {
        let base = match entry.from {
            Provenance::Cwd => paths.project_dir.as_path(),
            Provenance::Build => build_dir.ok_or_else(|| {
                Error::CopyError(format!(
                    "'{}' requires a build staging directory, but none was found; run 'qp build' first",
                    entry.file
                ))
            })?,
        };
        let pairs = paths::resolve(&entry.file, base, &install_root)?;
        if pairs.is_empty() {
            return Err(Error::CopyError(format!(
                "Install file '{}' not found under {}",
                entry.file,
                base.display()
            )));
        }
        for (src, dst) in pairs {
            paths::copy_entry(&src, &dst)?;
        }
    }

    if let Some(name) = &config.install_script {
        let source = paths.scripts_dir().join(name);
        let staged = script::stage(&source, &install_root)?;
        script::run(&staged, &install_root)?;
    }

    // Strict: the new version is fully in place, so a failure to bring the
    // service up is fatal.
    if config.systemd {
        manager.install(&unit, &install_root)?;
    }

    sweep_staging(&config.app_name, &paths.temp_dir);
    info!("Installed {}", config.app_name);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::super::build::build;
    use super::*;
    use tempfile::TempDir;

    fn scaffolding() -> (TempDir, TempDir, Paths) {
        let project = TempDir::new().unwrap();
        let temp = TempDir::new().unwrap();
        let paths = Paths {
            project_dir: project.path().to_path_buf(),
            install_base: temp.path().join("opt"),
            unit_dir: temp.path().join("units"),
            temp_dir: temp.path().join("tmp"),
        };
        fs::create_dir_all(&paths.temp_dir).unwrap();
        (project, temp, paths)
    }

    #[test]
    fn test_install_from_cwd_round_trip() {
        let (project, _temp, paths) = scaffolding();
        fs::create_dir_all(project.path().join("bin")).unwrap();
        fs::write(project.path().join("bin/demo"), b"payload").unwrap();

        let config: Config = serde_json::from_str(
            r#"{"app_name": "demo",
                "install_files": [{"file": "bin/demo", "from": "cwd"}]}"#,
        )
        .unwrap();

        install(&config, &paths, None).unwrap();
        let installed = paths.install_root(&config).join("bin/demo");
        assert_eq!(fs::read(installed).unwrap(), b"payload");
        // No unit file was written
        assert!(!paths.unit_dir.exists() || fs::read_dir(&paths.unit_dir).unwrap().next().is_none());
    }

    #[test]
    fn test_install_from_build_uses_explicit_handle() {
        let (project, _temp, paths) = scaffolding();
        fs::create_dir_all(project.path().join(".qp")).unwrap();
        fs::write(
            project.path().join(".qp/build.sh"),
            "mkdir -p out && echo built > out/app\n",
        )
        .unwrap();

        let config: Config = serde_json::from_str(
            r#"{"app_name": "demo", "build_script": "build.sh",
                "install_files": [{"file": "out/app", "from": "build"}]}"#,
        )
        .unwrap();

        let staging = build(&config, &paths).unwrap();
        install(&config, &paths, Some(&staging)).unwrap();

        let installed = paths.install_root(&config).join("out/app");
        assert_eq!(fs::read_to_string(installed).unwrap(), "built\n");
        // Successful install sweeps the staging directory
        assert!(!staging.path().exists());
    }

    #[test]
    fn test_install_discovers_staging_from_earlier_build() {
        let (project, _temp, paths) = scaffolding();
        fs::create_dir_all(project.path().join("src")).unwrap();
        fs::write(project.path().join("src/app.py"), b"print()").unwrap();

        let config: Config = serde_json::from_str(
            r#"{"app_name": "demo", "build_files": ["src/*"],
                "install_files": [{"file": "src/app.py", "from": "build"}]}"#,
        )
        .unwrap();

        // Standalone build, then install without the handle
        build(&config, &paths).unwrap();
        install(&config, &paths, None).unwrap();
        assert!(paths.install_root(&config).join("src/app.py").exists());
    }

    #[test]
    fn test_install_fatal_when_build_source_required_but_missing() {
        let (_project, _temp, paths) = scaffolding();
        let config: Config = serde_json::from_str(
            r#"{"app_name": "demo",
                "install_files": [{"file": "out/app", "from": "build"}]}"#,
        )
        .unwrap();
        assert!(matches!(
            install(&config, &paths, None),
            Err(Error::CopyError(_))
        ));
    }

    #[test]
    fn test_install_fatal_when_cwd_source_missing() {
        let (_project, _temp, paths) = scaffolding();
        let config: Config = serde_json::from_str(
            r#"{"app_name": "demo",
                "install_files": [{"file": "bin/demo", "from": "cwd"}]}"#,
        )
        .unwrap();
        assert!(matches!(
            install(&config, &paths, None),
            Err(Error::CopyError(_))
        ));
    }

    #[test]
    fn test_install_script_runs_in_install_root_once_staged() {
        let (project, _temp, paths) = scaffolding();
        fs::create_dir_all(project.path().join(".qp")).unwrap();
        fs::write(project.path().join("app.conf"), b"k=v").unwrap();
        fs::write(
            project.path().join(".qp/setup.sh"),
            "echo configured > setup.done\n",
        )
        .unwrap();

        let config: Config = serde_json::from_str(
            r#"{"app_name": "demo", "install_script": "setup.sh",
                "install_files": [{"file": "app.conf", "from": "cwd"}]}"#,
        )
        .unwrap();

        install(&config, &paths, None).unwrap();
        let root = paths.install_root(&config);
        assert!(root.join("setup.done").exists());
        assert!(root.join("setup.sh").exists());
    }

    #[test]
    fn test_install_twice_is_idempotent() {
        let (project, _temp, paths) = scaffolding();
        fs::create_dir_all(project.path().join("bin")).unwrap();
        fs::write(project.path().join("bin/demo"), b"v1").unwrap();

        let config: Config = serde_json::from_str(
            r#"{"app_name": "demo",
                "install_files": [{"file": "bin/*", "from": "cwd"}]}"#,
        )
        .unwrap();

        install(&config, &paths, None).unwrap();
        install(&config, &paths, None).unwrap();
        let root = paths.install_root(&config);
        assert_eq!(fs::read(root.join("bin/demo")).unwrap(), b"v1");
        assert_eq!(fs::read_dir(root.join("bin")).unwrap().count(), 1);
    }
}
