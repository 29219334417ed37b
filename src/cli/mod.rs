//! CLI module: command parsing and dispatch
//!
//! All CLI logic lives here. `main.rs` calls `cli::run()`.

pub mod config;
pub mod run;
pub mod status;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};

use claire::config::Config;

#[derive(Parser)]
#[command(name = "claire")]
#[command(version)]
#[command(about = "Liveness beacon that reports this process to a Karl collector", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Register with the collector and send keepalives until Ctrl-C
    Run {
        /// Config file (default: ~/.claire/config.json)
        #[arg(long)]
        config: Option<PathBuf>,
        /// Override the service name
        #[arg(long)]
        service: Option<String>,
        /// Override the collector URL
        #[arg(long)]
        karl_url: Option<String>,
        /// Override the keepalive interval in milliseconds
        #[arg(long)]
        interval_ms: Option<u64>,
    },
    /// Print one status document without contacting the collector
    Status {
        /// Config file (default: ~/.claire/config.json)
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Print the effective configuration
    Config {
        /// Config file (default: ~/.claire/config.json)
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

/// Overrides for `claire run` given on the command line.
#[derive(Debug, Default)]
pub(crate) struct RunOverrides {
    pub service: Option<String>,
    pub karl_url: Option<String>,
    pub interval_ms: Option<u64>,
}

impl RunOverrides {
    pub(crate) fn apply(self, config: &mut Config) {
        if let Some(service) = self.service {
            config.beacon.service = service;
        }
        if let Some(karl_url) = self.karl_url {
            config.beacon.karl_url = karl_url;
        }
        if let Some(interval_ms) = self.interval_ms {
            config.beacon.keepalive_interval_ms = interval_ms;
        }
    }
}

/// Load the config from `path`, or the default location when `None`.
pub(crate) fn load_config(path: Option<&Path>) -> Result<Config> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(Config::path);
    Config::load_from_path(&path)
        .with_context(|| format!("Failed to load configuration from {}", path.display()))
}

/// Entry point called from `main.rs`.
pub async fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        None => {
            let mut cmd = Cli::command();
            cmd.print_help()?;
            println!();
        }
        Some(Commands::Run {
            config,
            service,
            karl_url,
            interval_ms,
        }) => {
            let overrides = RunOverrides {
                service,
                karl_url,
                interval_ms,
            };
            run::cmd_run(config.as_deref(), overrides).await?;
        }
        Some(Commands::Status { config }) => {
            status::cmd_status(config.as_deref()).await?;
        }
        Some(Commands::Config { config }) => {
            config::cmd_config(config.as_deref())?;
        }
    }

    Ok(())
}
