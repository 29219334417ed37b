//! Claire - liveness beacon client for the Karl fleet collector
//!
//! Embedded in a service process, a [`Claire`] client periodically reports the
//! service's identity, uptime, keepalive health, declared upstream
//! dependencies and an optional caller-supplied runtime status to a Karl
//! collector, and deregisters itself on request.

pub mod beacon;
pub mod config;
pub mod deps;
pub mod error;
pub mod status_page;
pub mod utils;

pub use beacon::{
    status_callback, Claire, ClientIdentity, CollectorTransport, HttpTransport, KeepaliveStatus,
    RegistrationState, StatusCallback, StatusDocument,
};
pub use config::{BeaconConfig, Config};
pub use deps::{DependencyKey, DependencyRegistry};
pub use error::{ClaireError, Result};
