//! Status command handler.

use std::path::Path;

use anyhow::{Context, Result};

use claire::Claire;

/// Build one status document from the config and print it.
///
/// Nothing is sent to the collector.
pub(crate) async fn cmd_status(path: Option<&Path>) -> Result<()> {
    let config = super::load_config(path)?;
    let claire = Claire::new(&config.beacon)
        .await
        .context("Failed to create Claire client")?;

    let document = claire.current_status();
    let rendered =
        serde_json::to_string_pretty(&document).context("Failed to render status document")?;
    println!("{}", rendered);
    Ok(())
}
