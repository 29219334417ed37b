//! Dependency key type.

use std::fmt;
use std::net::Ipv4Addr;

use serde::{Deserialize, Serialize};

/// Resolved, canonical form of a declared dependency URL.
///
/// Two keys are equal iff `ip`, `port` and `prefix` are all equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DependencyKey {
    /// IPv4 address the host resolved to when the dependency was added.
    pub ip: Ipv4Addr,
    /// Port the dependency listens on.
    pub port: u16,
    /// URL path prefix of the dependency, at least `/`.
    pub prefix: String,
}

impl DependencyKey {
    /// Create a key from already-resolved parts.
    pub fn new(ip: Ipv4Addr, port: u16, prefix: impl Into<String>) -> Self {
        Self {
            ip,
            port,
            prefix: prefix.into(),
        }
    }

    /// URL of the dependency's own `.current` status page.
    pub fn status_page_url(&self) -> String {
        format!("http://{}:{}{}.current", self.ip, self.port, self.prefix)
    }
}

impl fmt::Display for DependencyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}{}", self.ip, self.port, self.prefix)
    }
}
