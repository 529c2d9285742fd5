// src/commands/mod.rs
//! Lifecycle stages behind the quickpack CLI

mod build;
mod install;
mod package;
mod uninstall;

pub use build::{build, discover_staging, stage_prefix, sweep_staging, StagingDir};
pub use install::install;
pub use package::package;
pub use uninstall::uninstall;
