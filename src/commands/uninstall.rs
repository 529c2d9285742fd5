// src/commands/uninstall.rs

//! Uninstall stage: tear down the managed service, run the uninstall
//! script, and delete the install root.

use crate::config::Config;
use crate::error::{Error, Result};
use crate::paths::Paths;
use crate::script;
use crate::systemd::{SystemdManager, SystemdUnit};
use std::fs;
use tracing::{debug, info};

/// Run the uninstall stage.
///
/// Service teardown is best-effort; removing the install root is
/// unconditional and runs after the uninstall script, so a script cannot
/// depend on its artifacts surviving this stage.
pub fn uninstall(config: &Config, paths: &Paths) -> Result<()> {
    let install_root = paths.install_root(config);
    info!(
        "Uninstalling {} from {}",
        config.app_name,
        install_root.display()
    );

    if config.systemd {
        let manager = SystemdManager::new(&paths.unit_dir);
        let unit = SystemdUnit::from_config(config);
        manager.teardown(&unit);
    }

    if let Some(name) = &config.uninstall_script {
        if !install_root.exists() {
            return Err(Error::ScriptError(format!(
                "Cannot run uninstall script: install root {} is missing",
                install_root.display()
            )));
        }
        let source = paths.scripts_dir().join(name);
        let staged = script::stage(&source, &install_root)?;
        script::run(&staged, &install_root)?;
    }

    match fs::remove_dir_all(&install_root) {
        Ok(()) => info!("Removed install root {}", install_root.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!("Install root {} already absent", install_root.display());
        }
        Err(e) => return Err(Error::IoError(e)),
    }
    Ok(())
}
