//! Keepalive outcome classification and bookkeeping.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Consecutive failures at which a client stops reporting itself healthy.
pub const FAILURE_ALERT_THRESHOLD: u32 = 3;

/// Outcome of one request to the collector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeepaliveStatus {
    /// No HTTP response was obtained.
    ConnectionFailed,
    /// A response arrived with a status outside `200..=299`.
    HttpError(u16),
    /// A 2xx response arrived.
    Success,
}

impl KeepaliveStatus {
    /// Classify a transport result: an error means no response was obtained,
    /// otherwise the status code decides.
    pub fn classify(outcome: &Result<u16>) -> Self {
        match outcome {
            Err(_) => KeepaliveStatus::ConnectionFailed,
            Ok(code) if (200..=299).contains(code) => KeepaliveStatus::Success,
            Ok(code) => KeepaliveStatus::HttpError(*code),
        }
    }

    /// Whether this is [`KeepaliveStatus::Success`].
    pub fn is_success(&self) -> bool {
        matches!(self, KeepaliveStatus::Success)
    }
}

impl fmt::Display for KeepaliveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeepaliveStatus::ConnectionFailed => write!(f, "HTTP connection attempt failed"),
            KeepaliveStatus::HttpError(code) => write!(f, "HTTP response code {}", code),
            KeepaliveStatus::Success => write!(f, "Success"),
        }
    }
}

/// The most recent keepalive attempt, whatever its outcome.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeepaliveAttemptResult {
    /// When the attempt completed.
    pub at: Option<DateTime<Utc>>,
    /// How it went.
    pub outcome: Option<KeepaliveStatus>,
}

/// The most recent successful keepalive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuccessfulKeepaliveRecord {
    /// When the response arrived.
    pub at: DateTime<Utc>,
    /// Time from dispatch to response.
    pub round_trip: Duration,
}

/// Mutable keepalive state written by the transport step and read by the
/// status builder.
#[derive(Debug, Clone, Default)]
pub struct KeepaliveTracker {
    last_attempt: KeepaliveAttemptResult,
    last_success: Option<SuccessfulKeepaliveRecord>,
    consecutive_failures: u32,
}

impl KeepaliveTracker {
    /// Create a tracker with no attempts recorded.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an attempt that completed at `at` after `round_trip`.
    ///
    /// Returns the number of consecutive failures after this attempt.
    pub fn record(&mut self, at: DateTime<Utc>, round_trip: Duration, status: KeepaliveStatus) -> u32 {
        self.last_attempt = KeepaliveAttemptResult {
            at: Some(at),
            outcome: Some(status),
        };
        if status.is_success() {
            self.last_success = Some(SuccessfulKeepaliveRecord { at, round_trip });
            self.consecutive_failures = 0;
        } else {
            self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        }
        self.consecutive_failures
    }

    /// The most recent attempt.
    pub fn last_attempt(&self) -> &KeepaliveAttemptResult {
        &self.last_attempt
    }

    /// The most recent success, if any.
    pub fn last_success(&self) -> Option<&SuccessfulKeepaliveRecord> {
        self.last_success.as_ref()
    }

    /// Failed attempts since the last success.
    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    /// Fewer than [`FAILURE_ALERT_THRESHOLD`] failures in a row.
    pub fn is_healthy(&self) -> bool {
        self.consecutive_failures < FAILURE_ALERT_THRESHOLD
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ClaireError;

    #[test]
    fn test_classify() {
        let refused: Result<u16> = Err(ClaireError::Io(std::io::Error::new(
            std::io::ErrorKind::ConnectionRefused,
            "refused",
        )));
        assert_eq!(
            KeepaliveStatus::classify(&refused),
            KeepaliveStatus::ConnectionFailed
        );
        assert_eq!(KeepaliveStatus::classify(&Ok(200)), KeepaliveStatus::Success);
        assert_eq!(KeepaliveStatus::classify(&Ok(204)), KeepaliveStatus::Success);
        assert_eq!(KeepaliveStatus::classify(&Ok(299)), KeepaliveStatus::Success);
        assert_eq!(
            KeepaliveStatus::classify(&Ok(199)),
            KeepaliveStatus::HttpError(199)
        );
        assert_eq!(
            KeepaliveStatus::classify(&Ok(300)),
            KeepaliveStatus::HttpError(300)
        );
        assert_eq!(
            KeepaliveStatus::classify(&Ok(503)),
            KeepaliveStatus::HttpError(503)
        );
    }

    #[test]
    fn test_status_display() {
        assert_eq!(
            KeepaliveStatus::ConnectionFailed.to_string(),
            "HTTP connection attempt failed"
        );
        assert_eq!(
            KeepaliveStatus::HttpError(404).to_string(),
            "HTTP response code 404"
        );
        assert_eq!(KeepaliveStatus::Success.to_string(), "Success");
    }

    #[test]
    fn test_tracker_starts_empty() {
        let tracker = KeepaliveTracker::new();
        assert_eq!(tracker.last_attempt(), &KeepaliveAttemptResult::default());
        assert!(tracker.last_success().is_none());
        assert!(tracker.is_healthy());
    }

    #[test]
    fn test_failure_keeps_previous_success() {
        let mut tracker = KeepaliveTracker::new();
        let t1 = Utc::now();
        tracker.record(t1, Duration::from_millis(12), KeepaliveStatus::Success);

        let t2 = t1 + chrono::Duration::seconds(20);
        let failures = tracker.record(t2, Duration::from_secs(1), KeepaliveStatus::ConnectionFailed);
        assert_eq!(failures, 1);
        assert_eq!(tracker.last_attempt().at, Some(t2));
        assert_eq!(
            tracker.last_attempt().outcome,
            Some(KeepaliveStatus::ConnectionFailed)
        );

        let success = tracker.last_success().unwrap();
        assert_eq!(success.at, t1);
        assert_eq!(success.round_trip, Duration::from_millis(12));
    }

    #[test]
    fn test_health_threshold() {
        let mut tracker = KeepaliveTracker::new();
        let now = Utc::now();
        for _ in 0..FAILURE_ALERT_THRESHOLD - 1 {
            tracker.record(now, Duration::ZERO, KeepaliveStatus::HttpError(500));
        }
        assert!(tracker.is_healthy());
        tracker.record(now, Duration::ZERO, KeepaliveStatus::HttpError(500));
        assert!(!tracker.is_healthy());

        tracker.record(now, Duration::ZERO, KeepaliveStatus::Success);
        assert_eq!(tracker.consecutive_failures(), 0);
        assert!(tracker.is_healthy());
    }
}
