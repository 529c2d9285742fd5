// src/cli.rs
//! CLI definitions for quickpack
//!
//! Command implementations live in the `commands` module; this file only
//! defines the clap surface.

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "qp")]
#[command(author, version, about = "Declarative build, install, and service deployment for single applications", long_about = None)]
pub struct Cli {
    /// Path to the deployment descriptor
    #[arg(short, long, default_value = crate::config::DEFAULT_CONFIG_PATH, global = true)]
    pub config: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Stage build files and run the build script
    Build,

    /// Build, then copy files into the install root and (re)start the service
    Install {
        /// Parent directory of install roots
        #[arg(long, default_value = crate::paths::DEFAULT_INSTALL_BASE)]
        prefix: String,
    },

    /// Stop the service, run the uninstall script, and delete the install root
    Uninstall {
        /// Parent directory of install roots
        #[arg(long, default_value = crate::paths::DEFAULT_INSTALL_BASE)]
        prefix: String,
    },

    /// Generate debian artifacts and build a .deb with dpkg-buildpackage
    Package {
        /// Parent directory of install roots baked into the package
        #[arg(long, default_value = crate::paths::DEFAULT_INSTALL_BASE)]
        prefix: String,
    },
}
