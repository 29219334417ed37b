//! Parsing and DNS resolution of declared dependency URLs.

use std::net::{IpAddr, Ipv4Addr};

use reqwest::Url;
use tokio::net::lookup_host;
use tracing::debug;

use crate::error::{ClaireError, Result};

use super::DependencyKey;

/// A dependency URL that passed validation but has not been resolved yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyUrl {
    /// Host as written in the URL (name or IPv4 literal).
    pub host: String,
    /// Explicit port from the URL.
    pub port: u16,
    /// Path component, `/` when the URL had none.
    pub prefix: String,
}

/// Validate a dependency URL: scheme `http`, non-empty host, explicit port,
/// non-empty path.
pub fn parse_dependency_url(raw: &str) -> Result<DependencyUrl> {
    let raw = raw.trim();
    let invalid = |reason: &str| ClaireError::InvalidDependencyUrl(format!("'{raw}': {reason}"));

    let url = Url::parse(raw).map_err(|e| invalid(&e.to_string()))?;
    if url.scheme() != "http" {
        return Err(invalid("scheme must be http"));
    }

    let host = url.host_str().unwrap_or_default();
    if host.is_empty() {
        return Err(invalid("host is empty"));
    }

    // `Url` drops a port equal to the scheme default, so `:80` is only
    // visible in the raw authority.
    let port = match url.port() {
        Some(port) => port,
        None if authority_port(raw).is_some() => 80,
        None => return Err(invalid("port must be explicit")),
    };

    let prefix = url.path();
    if prefix.is_empty() {
        return Err(invalid("path is empty"));
    }

    Ok(DependencyUrl {
        host: host.to_string(),
        port,
        prefix: prefix.to_string(),
    })
}

/// Parse `raw` and resolve its host to an IPv4 address.
pub async fn resolve_dependency(raw: &str) -> Result<DependencyKey> {
    let parsed = parse_dependency_url(raw)?;
    let ip = resolve_ipv4(&parsed.host, parsed.port).await?;
    debug!(url = raw, ip = %ip, "Resolved dependency");
    Ok(DependencyKey::new(ip, parsed.port, parsed.prefix))
}

async fn resolve_ipv4(host: &str, port: u16) -> Result<Ipv4Addr> {
    // IP literals skip the DNS lookup.
    if let Ok(ip) = host.parse::<Ipv4Addr>() {
        return Ok(ip);
    }
    if host.starts_with('[') {
        return Err(ClaireError::DnsResolutionFailed(format!(
            "'{host}' is an IPv6 literal, an IPv4 address is required"
        )));
    }

    let addrs = lookup_host((host, port))
        .await
        .map_err(|e| ClaireError::DnsResolutionFailed(format!("'{host}': {e}")))?;

    addrs
        .filter_map(|addr| match addr.ip() {
            IpAddr::V4(ip) => Some(ip),
            IpAddr::V6(_) => None,
        })
        .next()
        .ok_or_else(|| ClaireError::DnsResolutionFailed(format!("'{host}': no IPv4 address")))
}

/// The port digits written in the authority of `raw`, if any.
fn authority_port(raw: &str) -> Option<&str> {
    let rest = raw.split_once("://").map(|(_, rest)| rest)?;
    let authority = rest
        .split(['/', '?', '#'])
        .next()
        .unwrap_or_default();
    let host_port = authority.rsplit_once('@').map_or(authority, |(_, hp)| hp);
    let port = match host_port.rfind(']') {
        Some(end) => host_port[end + 1..].strip_prefix(':')?,
        None => host_port.rsplit_once(':')?.1,
    };
    (!port.is_empty() && port.bytes().all(|b| b.is_ascii_digit())).then_some(port)
}
