//! Beacon module - keepalive reporting to the Karl fleet collector
//!
//! A [`Claire`] client periodically POSTs a [`StatusDocument`] describing this
//! process to the collector while registered, and sends a one-shot DELETE on
//! deregistration. Failed sends never stop the loop; they show up in the next
//! document's `last_keepalive_status`.

pub mod identity;
pub mod service;
pub mod status;
pub mod tracker;
pub mod transport;

pub use identity::{generate_codename, ClientIdentity};
pub use service::{status_callback, Claire, RegistrationState, StatusCallback};
pub use status::{build_status, StatusDocument};
pub use tracker::{
    KeepaliveAttemptResult, KeepaliveStatus, KeepaliveTracker, SuccessfulKeepaliveRecord,
};
pub use transport::{CollectorTransport, HttpTransport};
