//! Network transport to the collector.
//!
//! The transport only moves bytes and reports the HTTP status code; turning
//! that into a [`super::KeepaliveStatus`] is the caller's job.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};

use crate::error::Result;

use super::StatusDocument;

const USER_AGENT: &str = concat!("claire/", env!("CARGO_PKG_VERSION"));

/// Requests the beacon makes to the collector.
///
/// `Err` means no HTTP response was obtained; any response, whatever its
/// status, is `Ok(code)`.
#[async_trait]
pub trait CollectorTransport: Send + Sync {
    /// `POST url` with `document` as the JSON body.
    async fn post_keepalive(&self, url: &Url, document: &StatusDocument) -> Result<u16>;

    /// `DELETE url`.
    async fn delete(&self, url: &Url) -> Result<u16>;
}

/// reqwest-backed transport.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Create a transport whose requests time out after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl CollectorTransport for HttpTransport {
    async fn post_keepalive(&self, url: &Url, document: &StatusDocument) -> Result<u16> {
        let response = self
            .client
            .post(url.clone())
            .json(document)
            .send()
            .await?;
        Ok(response.status().as_u16())
    }

    async fn delete(&self, url: &Url) -> Result<u16> {
        let response = self.client.delete(url.clone()).send().await?;
        Ok(response.status().as_u16())
    }
}
