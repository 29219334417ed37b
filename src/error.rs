//! Error types for Claire
//!
//! This module defines all error types returned by the Claire beacon client.
//! Uses `thiserror` for ergonomic error handling with automatic `Display` and
//! `Error` trait implementations.
//!
//! Failed keepalives are deliberately absent here: they are recorded as
//! [`crate::beacon::KeepaliveStatus`] values and surface only through the next
//! status document, never as errors to the embedding application.

use thiserror::Error;

use crate::deps::DependencyKey;

/// The primary error type for Claire operations.
#[derive(Error, Debug)]
pub enum ClaireError {
    /// A dependency URL is not of the form `http://host:port/path`.
    #[error("Invalid dependency URL: {0}")]
    InvalidDependencyUrl(String),

    /// The host of a dependency URL could not be resolved to an IPv4 address.
    #[error("DNS resolution failed: {0}")]
    DnsResolutionFailed(String),

    /// The resolved dependency is already present in the registry.
    #[error("Duplicate dependency: {0}")]
    DuplicateDependency(DependencyKey),

    /// The resolved dependency is not present in the registry.
    #[error("Dependency not found: {0}")]
    DependencyNotFound(DependencyKey),

    /// Configuration-related errors (invalid collector URL, empty service name, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// A confirmed registration could not reach the collector or was rejected.
    #[error("Registration failed: {0}")]
    RegistrationFailed(String),

    /// Standard I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP client construction errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// A specialized `Result` type for Claire operations.
pub type Result<T> = std::result::Result<T, ClaireError>;
