// src/lib.rs

//! quickpack
//!
//! Declarative build/install/uninstall orchestrator for single-application
//! deployments on a Linux host. A JSON descriptor at `.qp/config.json`
//! names the application, its build and install files, optional operator
//! scripts, and an optional managed systemd service; the three lifecycle
//! stages sequence build-artifact staging, provenance-aware file placement,
//! and service stop/replace/start transitions around the on-disk install
//! root.
//!
//! # Architecture
//!
//! - Synchronous and single-threaded: every external command is waited on
//!   before the next step
//! - Strict setup, lenient teardown: failures are fatal while installing,
//!   logged and tolerated while tearing down
//! - Explicit roots: install base, unit directory, and temp directory are
//!   threaded through every stage call, never process-wide state

pub mod cli;
pub mod commands;
pub mod config;
pub mod debpkg;
mod error;
pub mod paths;
pub mod script;
pub mod systemd;

pub use commands::{build, install, package, uninstall, StagingDir};
pub use config::{Config, FileEntry, Provenance, DEFAULT_CONFIG_PATH};
pub use error::{Error, Result};
pub use paths::Paths;
pub use systemd::{SystemdManager, SystemdUnit, UnitScope};
