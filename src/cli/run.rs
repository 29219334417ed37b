//! `claire run`: register, keep reporting until Ctrl-C, deregister.

use std::path::Path;

use anyhow::{Context, Result};
use serde_json::json;

use claire::log_component;
use claire::status_page::start_status_page;
use claire::utils::logging::init_logging;
use claire::{status_callback, Claire};

use super::RunOverrides;

pub(crate) async fn cmd_run(path: Option<&Path>, overrides: RunOverrides) -> Result<()> {
    let mut config = super::load_config(path)?;
    overrides.apply(&mut config);
    init_logging(&config.logging).context("Failed to initialize logging")?;

    let claire = Claire::new(&config.beacon)
        .await
        .context("Failed to create Claire client")?;

    let status_page = if config.status_page.enabled {
        let page = start_status_page(
            &config.status_page.host,
            config.status_page.port,
            claire.clone(),
        )
        .await
        .with_context(|| {
            format!(
                "Failed to start status page on {}:{}",
                config.status_page.host, config.status_page.port
            )
        })?;
        Some(page)
    } else {
        None
    };

    let pid = std::process::id();
    claire
        .register(Some(status_callback(move || json!({ "pid": pid }))))
        .await;
    log_component!(
        info,
        "cli",
        "Reporting to collector, press Ctrl-C to stop",
        codename = claire.codename()
    );

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl-C")?;
    log_component!(info, "cli", "Received shutdown signal");

    if let Some(page) = status_page {
        page.shutdown();
    }
    if let Some(outcome) = claire.deregister().await {
        log_component!(
            info,
            "cli",
            "Deregistered",
            outcome = tracing::field::display(outcome)
        );
    }
    Ok(())
}
