//! Configuration types for Claire.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Default keepalive interval in milliseconds.
pub const DEFAULT_KEEPALIVE_INTERVAL_MS: u64 = 20_000;

/// Default collector keepalive endpoint.
pub const DEFAULT_KARL_URL: &str = "http://localhost:7576/";

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Beacon identity and reporting options
    pub beacon: BeaconConfig,
    /// Local `/.current` status page
    pub status_page: StatusPageConfig,
    /// Logging output
    pub logging: LoggingConfig,
}

// ============================================================================
// Beacon Configuration
// ============================================================================

/// Options consumed when constructing a [`crate::Claire`] client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BeaconConfig {
    /// Name of the monitored service.
    pub service: String,
    /// Port the monitored service listens on locally.
    #[serde(alias = "localPort")]
    pub local_port: u16,
    /// Name of the cloud instance the service runs on.
    #[serde(alias = "cloudInstanceName", skip_serializing_if = "Option::is_none")]
    pub cloud_instance_name: Option<String>,
    /// Availability group of the cloud instance.
    #[serde(
        alias = "cloudAvailabilityGroup",
        skip_serializing_if = "Option::is_none"
    )]
    pub cloud_availability_group: Option<String>,
    /// Collector keepalive endpoint.
    #[serde(alias = "karlUrl", alias = "endpoint")]
    pub karl_url: String,
    /// Interval between keepalive cycles in milliseconds.
    #[serde(alias = "keepaliveInterval")]
    pub keepalive_interval_ms: u64,
    /// Dependency URLs resolved when the client is constructed.
    pub dependencies: Vec<String>,
    /// Opaque build information copied into every status document.
    #[serde(alias = "buildInfo", skip_serializing_if = "Option::is_none")]
    pub build_info: Option<Value>,
    /// Timeout applied to each collector request, in seconds.
    pub request_timeout_secs: u64,
}

impl Default for BeaconConfig {
    fn default() -> Self {
        Self {
            service: String::new(),
            local_port: 0,
            cloud_instance_name: None,
            cloud_availability_group: None,
            karl_url: DEFAULT_KARL_URL.to_string(),
            keepalive_interval_ms: DEFAULT_KEEPALIVE_INTERVAL_MS,
            dependencies: Vec::new(),
            build_info: None,
            request_timeout_secs: 10,
        }
    }
}

impl BeaconConfig {
    /// Minimal config for `service` reporting to `karl_url`.
    pub fn new(service: &str, local_port: u16, karl_url: &str) -> Self {
        Self {
            service: service.to_string(),
            local_port,
            karl_url: karl_url.to_string(),
            ..Default::default()
        }
    }
}

// ============================================================================
// Status Page Configuration
// ============================================================================

/// Local HTTP status page serving `/.current`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StatusPageConfig {
    /// Enable or disable the status page.
    pub enabled: bool,
    /// Bind address.
    pub host: String,
    /// Bind port.
    pub port: u16,
}

impl Default for StatusPageConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            host: "127.0.0.1".to_string(),
            port: 7577,
        }
    }
}

// ============================================================================
// Logging Configuration
// ============================================================================

/// Log output format.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Multi-line human-readable output
    Pretty,
    /// Compact single-line output with targets
    #[default]
    Component,
    /// JSON lines
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Output format
    pub format: LogFormat,
    /// Optional log file (JSON format only)
    pub file: Option<String>,
    /// Default level filter when `RUST_LOG` is unset
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Component,
            file: None,
            level: "info".to_string(),
        }
    }
}
