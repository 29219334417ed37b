//! Config command handler.

use std::path::Path;

use anyhow::{Context, Result};

use claire::config::Config;

/// Print the effective configuration (file plus environment overrides).
pub(crate) fn cmd_config(path: Option<&Path>) -> Result<()> {
    let config_path = path.map(Path::to_path_buf).unwrap_or_else(Config::path);
    println!("Config file: {}", config_path.display());
    if !config_path.exists() {
        println!("[OK] No config file found (using defaults)");
    }

    let config = super::load_config(Some(&config_path))?;
    let rendered =
        serde_json::to_string_pretty(&config).context("Failed to render configuration")?;
    println!("{}", rendered);

    match config.beacon.validate() {
        Ok(()) => println!("\nConfiguration looks good!"),
        Err(e) => println!("\n[ERROR] {}", e),
    }
    Ok(())
}
