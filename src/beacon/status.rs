//! Status document sent to the collector on every keepalive.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::deps::DependencyKey;
use crate::utils::duration::format_interval;

use super::{ClientIdentity, KeepaliveTracker};

/// Outbound keepalive payload. Rebuilt from scratch every cycle.
///
/// Optional fields are omitted from the JSON when absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusDocument {
    pub service: String,
    pub codename: String,
    pub local_port: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cloud_instance_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cloud_availability_group: Option<String>,
    /// Registered dependencies in insertion order.
    pub dependencies: Vec<DependencyKey>,
    /// Collector endpoint this document is sent to.
    pub reporting_to: String,
    /// Epoch microseconds when the document was built.
    pub now: i64,
    pub start_time_epoch_microseconds: i64,
    pub uptime: String,
    /// `"<interval> ago"`, empty before the first attempt.
    pub last_keepalive_sent: String,
    /// Rendered [`super::KeepaliveStatus`], empty before the first attempt.
    pub last_keepalive_status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_successful_keepalive: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_successful_keepalive_ping: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_successful_keepalive_ping_us: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build: Option<Value>,
    /// Value returned by the caller's status callback, merged verbatim.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runtime: Option<Value>,
}

/// Assemble a status document as of `now`.
pub fn build_status(
    identity: &ClientIdentity,
    dependencies: Vec<DependencyKey>,
    tracker: &KeepaliveTracker,
    runtime: Option<Value>,
    now: DateTime<Utc>,
) -> StatusDocument {
    let attempt = tracker.last_attempt();
    let last_keepalive_sent = attempt
        .at
        .map(|at| format!("{} ago", format_interval(at, now)))
        .unwrap_or_default();
    let last_keepalive_status = attempt
        .outcome
        .map(|status| status.to_string())
        .unwrap_or_default();

    let success = tracker.last_success();
    let ping_us = success.map(|s| i64::try_from(s.round_trip.as_micros()).unwrap_or(i64::MAX));

    StatusDocument {
        service: identity.service.clone(),
        codename: identity.codename.clone(),
        local_port: identity.local_port,
        cloud_instance_name: identity.cloud_instance_name.clone(),
        cloud_availability_group: identity.cloud_availability_group.clone(),
        dependencies,
        reporting_to: identity.collector_endpoint.to_string(),
        now: now.timestamp_micros(),
        start_time_epoch_microseconds: identity.start_time.timestamp_micros(),
        uptime: format_interval(identity.start_time, now),
        last_keepalive_sent,
        last_keepalive_status,
        last_successful_keepalive: success.map(|s| format!("{} ago", format_interval(s.at, now))),
        last_successful_keepalive_ping: ping_us.map(|us| format!("{:.2}ms", us as f64 / 1000.0)),
        last_successful_keepalive_ping_us: ping_us,
        build: identity.build_info.clone(),
        runtime,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::beacon::KeepaliveStatus;
    use crate::config::BeaconConfig;
    use chrono::Duration as ChronoDuration;
    use serde_json::json;
    use std::net::Ipv4Addr;
    use std::time::Duration;

    fn identity() -> ClientIdentity {
        let mut config = BeaconConfig::new("search", 9090, "http://karl:7576/");
        config.cloud_instance_name = Some("i-abc".into());
        config.build_info = Some(json!({"git_commit": "deadbeef"}));
        ClientIdentity::from_config(&config).unwrap()
    }

    #[test]
    fn test_fresh_document() {
        let id = identity();
        let now = id.start_time + ChronoDuration::seconds(3661);
        let doc = build_status(&id, vec![], &KeepaliveTracker::new(), None, now);

        assert_eq!(doc.service, "search");
        assert_eq!(doc.codename, id.codename);
        assert_eq!(doc.local_port, 9090);
        assert_eq!(doc.reporting_to, "http://karl:7576/");
        assert_eq!(doc.uptime, "1h 1m 1s");
        assert_eq!(doc.now - doc.start_time_epoch_microseconds, 3_661_000_000);
        assert_eq!(doc.last_keepalive_sent, "");
        assert_eq!(doc.last_keepalive_status, "");
        assert!(doc.last_successful_keepalive.is_none());
        assert!(doc.last_successful_keepalive_ping.is_none());
        assert!(doc.last_successful_keepalive_ping_us.is_none());
        assert!(doc.runtime.is_none());
    }

    #[test]
    fn test_absent_fields_are_omitted_from_json() {
        let id = identity();
        let doc = build_status(&id, vec![], &KeepaliveTracker::new(), None, id.start_time);
        let json = serde_json::to_value(&doc).unwrap();
        let obj = json.as_object().unwrap();

        assert!(!obj.contains_key("runtime"));
        assert!(!obj.contains_key("last_successful_keepalive"));
        assert!(!obj.contains_key("last_successful_keepalive_ping_us"));
        assert!(!obj.contains_key("cloud_availability_group"));
        assert_eq!(obj["cloud_instance_name"], "i-abc");
        assert_eq!(obj["build"], json!({"git_commit": "deadbeef"}));
        assert_eq!(obj["last_keepalive_status"], "");
    }

    #[test]
    fn test_document_after_failed_attempt() {
        let id = identity();
        let mut tracker = KeepaliveTracker::new();
        let success_at = id.start_time + ChronoDuration::seconds(1);
        tracker.record(success_at, Duration::from_micros(1500), KeepaliveStatus::Success);
        let failed_at = id.start_time + ChronoDuration::seconds(21);
        tracker.record(failed_at, Duration::from_secs(2), KeepaliveStatus::HttpError(502));

        let now = id.start_time + ChronoDuration::seconds(100);
        let doc = build_status(&id, vec![], &tracker, None, now);

        assert_eq!(doc.last_keepalive_sent, "1m 19s ago");
        assert_eq!(doc.last_keepalive_status, "HTTP response code 502");
        assert_eq!(doc.last_successful_keepalive.as_deref(), Some("1m 39s ago"));
        assert_eq!(doc.last_successful_keepalive_ping.as_deref(), Some("1.50ms"));
        assert_eq!(doc.last_successful_keepalive_ping_us, Some(1500));
    }

    #[test]
    fn test_dependencies_and_runtime_are_passed_through() {
        let id = identity();
        let deps = vec![
            DependencyKey::new(Ipv4Addr::new(10, 0, 0, 2), 80, "/"),
            DependencyKey::new(Ipv4Addr::new(10, 0, 0, 1), 80, "/"),
        ];
        let runtime = json!({"custom_status": {"custom_field": "7"}});
        let doc = build_status(
            &id,
            deps.clone(),
            &KeepaliveTracker::new(),
            Some(runtime.clone()),
            id.start_time,
        );
        assert_eq!(doc.dependencies, deps);
        assert_eq!(doc.runtime, Some(runtime));

        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(json["dependencies"][0]["ip"], "10.0.0.2");
        assert_eq!(json["runtime"]["custom_status"]["custom_field"], "7");
    }
}
