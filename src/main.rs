// src/main.rs

use anyhow::{Context, Result};
use clap::Parser;
use quickpack::cli::{Cli, Commands};
use quickpack::{commands, Config, Paths};
use std::path::Path;
use tracing::info;

fn main() -> Result<()> {
    // Initialize tracing subscriber for logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let config = Config::load(Path::new(&cli.config))
        .with_context(|| format!("Failed to load config from {}", cli.config))?;

    match cli.command {
        Commands::Build => {
            let paths = Paths::from_cwd(Path::new(quickpack::paths::DEFAULT_INSTALL_BASE))?;
            let staging = commands::build(&config, &paths)?;
            info!("Build staged in {}", staging.path().display());
            println!("Built {} in {}", config.app_name, staging.path().display());
            Ok(())
        }
        Commands::Install { prefix } => {
            let paths = Paths::from_cwd(Path::new(&prefix))?;
            let staging = commands::build(&config, &paths)?;
            commands::install(&config, &paths, Some(&staging))?;
            println!(
                "Installed {} to {}",
                config.app_name,
                paths.install_root(&config).display()
            );
            Ok(())
        }
        Commands::Uninstall { prefix } => {
            let paths = Paths::from_cwd(Path::new(&prefix))?;
            commands::uninstall(&config, &paths)?;
            println!("Uninstalled {}", config.app_name);
            Ok(())
        }
        Commands::Package { prefix } => {
            let paths = Paths::from_cwd(Path::new(&prefix))?;
            commands::package(&config, &paths)?;
            println!("Packaged {}", config.app_name);
            Ok(())
        }
    }
}
