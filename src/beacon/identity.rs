//! Immutable per-process identity of a beacon client.

use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::Url;
use serde_json::Value;
use uuid::Uuid;

use crate::config::BeaconConfig;
use crate::error::Result;

/// Number of letters in a codename.
pub const CODENAME_LEN: usize = 6;

/// Facts about this process that never change after construction.
#[derive(Debug, Clone)]
pub struct ClientIdentity {
    /// Name of the monitored service.
    pub service: String,
    /// Random six-letter instance name, fresh on every start.
    pub codename: String,
    /// When this client was constructed.
    pub start_time: DateTime<Utc>,
    /// Time between keepalive cycles.
    pub keepalive_interval: Duration,
    /// Port the monitored service listens on.
    pub local_port: u16,
    /// Cloud instance name, if known.
    pub cloud_instance_name: Option<String>,
    /// Cloud availability group, if known.
    pub cloud_availability_group: Option<String>,
    /// Collector keepalive endpoint.
    pub collector_endpoint: Url,
    /// Opaque build information.
    pub build_info: Option<Value>,
}

impl ClientIdentity {
    /// Build an identity from a validated config, generating a new codename.
    pub fn from_config(config: &BeaconConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            service: config.service.clone(),
            codename: generate_codename(),
            start_time: Utc::now(),
            keepalive_interval: config.keepalive_interval(),
            local_port: config.local_port,
            cloud_instance_name: config.cloud_instance_name.clone(),
            cloud_availability_group: config.cloud_availability_group.clone(),
            collector_endpoint: config.karl_endpoint()?,
            build_info: config.build_info.clone(),
        })
    }

    /// `POST` target: `{endpoint}?codename={codename}&port={local_port}`.
    pub fn keepalive_url(&self) -> Url {
        let mut url = self.collector_endpoint.clone();
        url.query_pairs_mut()
            .append_pair("codename", &self.codename)
            .append_pair("port", &self.local_port.to_string());
        url
    }

    /// Keepalive URL with the `confirm` flag used by confirmed registration.
    pub fn confirm_url(&self) -> Url {
        let mut url = self.keepalive_url();
        url.query_pairs_mut().append_key_only("confirm");
        url
    }

    /// `DELETE` target: `{endpoint}?codename={codename}`.
    pub fn deregistration_url(&self) -> Url {
        let mut url = self.collector_endpoint.clone();
        url.query_pairs_mut().append_pair("codename", &self.codename);
        url
    }
}

/// Six uppercase ASCII letters drawn from the OS random source.
pub fn generate_codename() -> String {
    Uuid::new_v4()
        .as_bytes()
        .iter()
        .take(CODENAME_LEN)
        .map(|b| char::from(b'A' + b % 26))
        .collect()
}
