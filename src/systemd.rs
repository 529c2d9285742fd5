// src/systemd.rs

//! Managed service units
//!
//! Unit identity, file content, and path are pure functions of the
//! deployment descriptor; nothing about the unit is stored. A unit is
//! either a singleton system unit (`app.service`, runs as root) or a
//! templated per-user unit (`app@.service`, instantiated as `app@<user>`
//! and running as `%i`). Operations against a templated unit target the
//! wildcard `app@*`, matching every instantiated instance.
//!
//! `SystemdManager` drives the live service manager by invoking `systemctl`
//! as an external process. Setup paths (enable/start during install) are
//! strict: any failure is fatal. Teardown paths (stop/disable/removal) are
//! best-effort: failures are logged and tolerated so that removing the
//! install root always remains reachable.

use crate::config::Config;
use crate::error::{Error, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// How long a stop is allowed to drain before giving up
const DEFAULT_STOP_TIMEOUT: Duration = Duration::from_secs(60);

/// Liveness re-check interval while waiting for a stop
const POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Naming and targeting strategy for a managed unit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitScope {
    /// Singleton system unit, runs as root
    System,
    /// Templated unit instantiated per invoking user, runs as `%i`
    UserInstance,
}

/// A managed service unit, derived from the descriptor
#[derive(Debug, Clone)]
pub struct SystemdUnit {
    name: String,
    exec: String,
    scope: UnitScope,
}

impl SystemdUnit {
    pub fn from_config(config: &Config) -> Self {
        Self {
            name: config.app_name.clone(),
            exec: config.exec.clone(),
            scope: if config.systemd_run_as_user {
                UnitScope::UserInstance
            } else {
                UnitScope::System
            },
        }
    }

    pub fn scope(&self) -> UnitScope {
        self.scope
    }

    /// Unit name without the `.service` suffix: `app` or `app@`
    pub fn unit_name(&self) -> String {
        match self.scope {
            UnitScope::System => self.name.clone(),
            UnitScope::UserInstance => format!("{}@", self.name),
        }
    }

    /// Identity used for stop/disable/status: the unit itself, or a
    /// wildcard matching every instantiated instance of a templated unit
    pub fn wildcard(&self) -> String {
        match self.scope {
            UnitScope::System => self.name.clone(),
            UnitScope::UserInstance => format!("{}@*", self.name),
        }
    }

    /// Unit file name: `app.service` or `app@.service`
    pub fn file_name(&self) -> String {
        format!("{}.service", self.unit_name())
    }

    /// Full path of the unit file under the given unit directory
    pub fn unit_path(&self, unit_dir: &Path) -> PathBuf {
        unit_dir.join(self.file_name())
    }

    fn description(&self) -> String {
        match self.scope {
            UnitScope::System => format!("{} service", self.name),
            UnitScope::UserInstance => format!("{} service running as user %i", self.name),
        }
    }

    fn user(&self) -> &'static str {
        match self.scope {
            UnitScope::System => "root",
            UnitScope::UserInstance => "%i",
        }
    }

    /// Render the unit file text for the given install root
    pub fn render(&self, install_root: &Path) -> String {
        format!(
            "[Unit]\n\
             Description={}\n\
             After=network.target\n\
             \n\
             [Service]\n\
             Type=simple\n\
             ExecStart={}\n\
             WorkingDirectory={}\n\
             Restart=always\n\
             User={}\n\
             \n\
             [Install]\n\
             WantedBy=multi-user.target\n",
            self.description(),
            self.exec,
            install_root.display(),
            self.user()
        )
    }
}

/// Driver for the live service manager
pub struct SystemdManager {
    unit_dir: PathBuf,
    stop_timeout: Duration,
}

impl SystemdManager {
    pub fn new(unit_dir: &Path) -> Self {
        Self {
            unit_dir: unit_dir.to_path_buf(),
            stop_timeout: DEFAULT_STOP_TIMEOUT,
        }
    }

    /// Override the stop-drain budget
    pub fn with_stop_timeout(mut self, timeout: Duration) -> Self {
        self.stop_timeout = timeout;
        self
    }

    /// Check if systemctl is available on this host
    pub fn has_systemctl(&self) -> bool {
        Command::new("systemctl")
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|s| s.success())
            .unwrap_or(false)
    }

    /// Is any instance of the unit active?
    pub fn is_active(&self, unit: &SystemdUnit) -> Result<bool> {
        match unit.scope() {
            UnitScope::System => {
                let status = Command::new("systemctl")
                    .args(["is-active", "--quiet", &unit.unit_name()])
                    .status()
                    .map_err(|e| Error::ServiceError(format!("Failed to run systemctl: {}", e)))?;
                Ok(status.success())
            }
            UnitScope::UserInstance => {
                // is-active does not expand globs; list active instances instead
                let output = Command::new("systemctl")
                    .args([
                        "list-units",
                        "--state=active",
                        "--plain",
                        "--no-legend",
                        &unit.wildcard(),
                    ])
                    .output()
                    .map_err(|e| Error::ServiceError(format!("Failed to run systemctl: {}", e)))?;
                Ok(!String::from_utf8_lossy(&output.stdout).trim().is_empty())
            }
        }
    }

    /// Stop the unit if active and wait, bounded, until it has drained.
    ///
    /// A no-op when the unit is inactive. Returns `Error::Timeout` if the
    /// unit is still active once the stop budget expires.
    pub fn stop_if_active(&self, unit: &SystemdUnit) -> Result<()> {
        if !self.is_active(unit)? {
            debug!("Unit '{}' not active, nothing to stop", unit.wildcard());
            return Ok(());
        }

        info!("Stopping unit '{}'", unit.wildcard());
        self.systemctl(&["stop", &unit.wildcard()])?;

        let deadline = Instant::now() + self.stop_timeout;
        while self.is_active(unit)? {
            if Instant::now() >= deadline {
                return Err(Error::Timeout {
                    what: format!("Stop of unit '{}'", unit.wildcard()),
                    secs: self.stop_timeout.as_secs(),
                });
            }
            std::thread::sleep(POLL_INTERVAL);
        }
        info!("Unit '{}' stopped", unit.wildcard());
        Ok(())
    }

    /// Write the unit file, reload the daemon, and bring the service up.
    ///
    /// Strict: every failure on this path is fatal. For a templated unit
    /// the enable/start step is skipped: the wildcard names no concrete
    /// instance, so activation is deferred until someone starts
    /// `app@<user>`.
    pub fn install(&self, unit: &SystemdUnit, install_root: &Path) -> Result<()> {
        if !self.has_systemctl() {
            return Err(Error::ServiceError(
                "systemctl not available on this host".to_string(),
            ));
        }

        let path = unit.unit_path(&self.unit_dir);
        fs::write(&path, unit.render(install_root)).map_err(|e| {
            Error::ServiceError(format!("Failed to write unit file {}: {}", path.display(), e))
        })?;
        info!("Wrote unit file {}", path.display());

        self.systemctl(&["daemon-reload"])?;

        match unit.scope() {
            UnitScope::System => {
                self.systemctl(&["enable", &unit.unit_name()])?;
                self.systemctl(&["start", &unit.unit_name()])?;
                info!("Enabled and started '{}'", unit.unit_name());
            }
            UnitScope::UserInstance => {
                info!(
                    "Unit '{}' is templated; activation deferred to instance start ({}<user>)",
                    unit.unit_name(),
                    unit.unit_name()
                );
            }
        }
        Ok(())
    }

    /// Stop, disable, and remove the unit, best-effort.
    ///
    /// Each step's failure is logged and tolerated so the caller can still
    /// remove the install root.
    pub fn teardown(&self, unit: &SystemdUnit) {
        if !self.has_systemctl() {
            warn!("systemctl not available, skipping service teardown");
        } else {
            if let Err(e) = self.stop_if_active(unit) {
                warn!("Failed to stop '{}': {}", unit.wildcard(), e);
            }
            if let Err(e) = self.systemctl(&["disable", &unit.wildcard()]) {
                warn!("Failed to disable '{}': {}", unit.wildcard(), e);
            }
        }

        let path = unit.unit_path(&self.unit_dir);
        match fs::remove_file(&path) {
            Ok(()) => info!("Removed unit file {}", path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("Unit file {} already absent", path.display());
            }
            Err(e) => warn!("Failed to remove unit file {}: {}", path.display(), e),
        }

        if self.has_systemctl() {
            if let Err(e) = self.systemctl(&["daemon-reload"]) {
                warn!("daemon-reload failed: {}", e);
            }
        }
    }

    fn systemctl(&self, args: &[&str]) -> Result<()> {
        debug!("Running systemctl {:?}", args);
        let status = Command::new("systemctl")
            .args(args)
            .status()
            .map_err(|e| Error::ServiceError(format!("Failed to run systemctl: {}", e)))?;
        if status.success() {
            Ok(())
        } else {
            Err(Error::ServiceError(format!(
                "systemctl {} failed",
                args.join(" ")
            )))
        }
    }
}
