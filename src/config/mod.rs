//! Configuration management for Claire
//!
//! This module provides configuration loading, saving and validation.
//! Configuration is loaded from `~/.claire/config.json` with environment variable overrides.

mod types;

pub use types::*;

use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::Url;

use crate::error::{ClaireError, Result};

impl Config {
    /// Returns the Claire configuration directory path (~/.claire)
    pub fn dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".claire")
    }

    /// Returns the path to the config file (~/.claire/config.json)
    pub fn path() -> PathBuf {
        Self::dir().join("config.json")
    }

    /// Load configuration from the default path with environment overrides.
    ///
    /// If the config file doesn't exist, returns default configuration.
    /// Environment variables can override config values using the pattern:
    /// `CLAIRE_SECTION_KEY`
    pub fn load() -> Result<Self> {
        Self::load_from_path(&Self::path())
    }

    /// Load configuration from a specific path with environment overrides.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)?;
            serde_json::from_str(&content)?
        } else {
            Config::default()
        };

        config.apply_env_overrides();

        Ok(config)
    }

    /// Save configuration to a specific path, creating parent directories.
    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Apply environment variable overrides to the configuration.
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("CLAIRE_BEACON_SERVICE") {
            self.beacon.service = val;
        }
        if let Ok(val) = std::env::var("CLAIRE_BEACON_LOCAL_PORT") {
            if let Ok(v) = val.parse() {
                self.beacon.local_port = v;
            }
        }
        if let Ok(val) = std::env::var("CLAIRE_BEACON_KARL_URL") {
            self.beacon.karl_url = val;
        }
        if let Ok(val) = std::env::var("CLAIRE_BEACON_KEEPALIVE_INTERVAL_MS") {
            if let Ok(v) = val.parse() {
                self.beacon.keepalive_interval_ms = v;
            }
        }
        if let Ok(val) = std::env::var("CLAIRE_BEACON_CLOUD_INSTANCE_NAME") {
            self.beacon.cloud_instance_name = Some(val);
        }
        if let Ok(val) = std::env::var("CLAIRE_BEACON_CLOUD_AVAILABILITY_GROUP") {
            self.beacon.cloud_availability_group = Some(val);
        }

        if let Ok(val) = std::env::var("CLAIRE_STATUS_PAGE_ENABLED") {
            if let Ok(enabled) = val.parse() {
                self.status_page.enabled = enabled;
            }
        }
        if let Ok(val) = std::env::var("CLAIRE_STATUS_PAGE_PORT") {
            if let Ok(v) = val.parse() {
                self.status_page.port = v;
            }
        }
    }
}

impl BeaconConfig {
    /// Check the options a client cannot run without.
    pub fn validate(&self) -> Result<()> {
        if self.service.trim().is_empty() {
            return Err(ClaireError::Config("service name is empty".into()));
        }
        if self.keepalive_interval_ms == 0 {
            return Err(ClaireError::Config(
                "keepalive interval must be positive".into(),
            ));
        }
        self.karl_endpoint()?;
        Ok(())
    }

    /// The collector endpoint as a parsed URL.
    pub fn karl_endpoint(&self) -> Result<Url> {
        let url = Url::parse(&self.karl_url)
            .map_err(|e| ClaireError::Config(format!("invalid karl_url '{}': {e}", self.karl_url)))?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(ClaireError::Config(format!(
                "karl_url scheme must be http or https, got '{other}'"
            ))),
        }
    }

    /// The keepalive interval as a `Duration`.
    pub fn keepalive_interval(&self) -> Duration {
        Duration::from_millis(self.keepalive_interval_ms)
    }

    /// The per-request timeout as a `Duration`.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }
}
