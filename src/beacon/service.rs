//! Claire client: registration lifecycle and the keepalive loop.
//!
//! Each cycle builds a [`StatusDocument`], spawns the POST as its own task and
//! re-arms the timer without waiting for the response, so a slow collector
//! can see overlapping sends. Cancelling the timer never cancels a send that
//! is already in flight.

use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::{Duration, Instant};

use chrono::Utc;
use reqwest::Url;
use serde_json::Value;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::BeaconConfig;
use crate::deps::{DependencyKey, DependencyRegistry};
use crate::error::{ClaireError, Result};

use super::tracker::FAILURE_ALERT_THRESHOLD;
use super::{
    build_status, ClientIdentity, CollectorTransport, HttpTransport, KeepaliveAttemptResult,
    KeepaliveStatus, KeepaliveTracker, StatusDocument, SuccessfulKeepaliveRecord,
};

/// Caller-supplied producer of the `runtime` section, invoked once per cycle.
pub type StatusCallback = Arc<dyn Fn() -> Value + Send + Sync>;

/// Wrap a closure as a [`StatusCallback`].
pub fn status_callback<F>(f: F) -> StatusCallback
where
    F: Fn() -> Value + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Whether the keepalive loop is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationState {
    Unregistered,
    Registered,
}

struct Scheduler {
    state: RegistrationState,
    callback: Option<StatusCallback>,
    timer: Option<JoinHandle<()>>,
    /// Bumped whenever the timer is cancelled; a timer task whose generation
    /// no longer matches exits without running a cycle.
    generation: u64,
}

impl Scheduler {
    fn cancel_timer(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
        self.generation = self.generation.wrapping_add(1);
    }
}

struct Inner {
    identity: ClientIdentity,
    dependencies: DependencyRegistry,
    tracker: Mutex<KeepaliveTracker>,
    scheduler: Mutex<Scheduler>,
    last_sent: Mutex<Option<StatusDocument>>,
    transport: Arc<dyn CollectorTransport>,
}

/// Liveness beacon reporting this process to a Karl collector.
///
/// Cheap to clone; clones share the same registration and dependency state.
#[derive(Clone)]
pub struct Claire {
    inner: Arc<Inner>,
}

impl Claire {
    /// Create a client that talks to the collector over HTTP.
    ///
    /// Resolves the config's initial dependencies; any bad URL fails
    /// construction.
    pub async fn new(config: &BeaconConfig) -> Result<Self> {
        let transport = HttpTransport::new(config.request_timeout())?;
        Self::with_transport(config, Arc::new(transport)).await
    }

    /// Create a client using a custom transport.
    pub async fn with_transport(
        config: &BeaconConfig,
        transport: Arc<dyn CollectorTransport>,
    ) -> Result<Self> {
        let identity = ClientIdentity::from_config(config)?;
        let dependencies = DependencyRegistry::new();
        if !config.dependencies.is_empty() {
            dependencies.set_dependencies(&config.dependencies).await?;
        }

        info!(
            service = %identity.service,
            codename = %identity.codename,
            karl = %identity.collector_endpoint,
            interval_ms = identity.keepalive_interval.as_millis() as u64,
            "Claire client created"
        );

        Ok(Self {
            inner: Arc::new(Inner {
                identity,
                dependencies,
                tracker: Mutex::new(KeepaliveTracker::new()),
                scheduler: Mutex::new(Scheduler {
                    state: RegistrationState::Unregistered,
                    callback: None,
                    timer: None,
                    generation: 0,
                }),
                last_sent: Mutex::new(None),
                transport,
            }),
        })
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Start reporting. Runs one cycle immediately, then one per interval.
    ///
    /// No-op if already registered.
    pub async fn register(&self, status: Option<StatusCallback>) {
        let generation = {
            let mut scheduler = lock(&self.inner.scheduler);
            if scheduler.state == RegistrationState::Registered {
                debug!(codename = %self.codename(), "Already registered");
                return;
            }
            scheduler.state = RegistrationState::Registered;
            scheduler.callback = status.clone();
            scheduler.cancel_timer();
            scheduler.generation
        };

        info!(codename = %self.codename(), "Registered, keepalive loop started");
        self.inner.run_cycle(status.as_ref());
        self.inner.arm_timer(generation);
    }

    /// Like [`Claire::register`], but the first keepalive is awaited and must
    /// succeed.
    ///
    /// On failure the attempt is still recorded, the client stays
    /// unregistered and [`ClaireError::RegistrationFailed`] is returned.
    pub async fn register_confirmed(&self, status: Option<StatusCallback>) -> Result<()> {
        if self.is_registered() {
            return Ok(());
        }

        let document = self.inner.build_status(status.as_ref().map(|cb| cb()));
        *lock(&self.inner.last_sent) = Some(document.clone());
        let outcome = self
            .inner
            .send_keepalive(&self.inner.identity.confirm_url(), &document)
            .await;
        if !outcome.is_success() {
            return Err(ClaireError::RegistrationFailed(format!(
                "{} from {}",
                outcome, self.inner.identity.collector_endpoint
            )));
        }

        let generation = {
            let mut scheduler = lock(&self.inner.scheduler);
            if scheduler.state == RegistrationState::Registered {
                return Ok(());
            }
            scheduler.state = RegistrationState::Registered;
            scheduler.callback = status;
            scheduler.cancel_timer();
            scheduler.generation
        };

        info!(codename = %self.codename(), "Registration confirmed by collector");
        self.inner.arm_timer(generation);
        Ok(())
    }

    /// Stop reporting and ask the collector to forget this instance.
    ///
    /// Returns `None` without contacting the collector if not registered,
    /// otherwise the outcome of the `DELETE`.
    pub async fn deregister(&self) -> Option<KeepaliveStatus> {
        {
            let mut scheduler = lock(&self.inner.scheduler);
            if scheduler.state == RegistrationState::Unregistered {
                return None;
            }
            scheduler.cancel_timer();
            scheduler.state = RegistrationState::Unregistered;
        }

        let url = self.inner.identity.deregistration_url();
        let outcome = self.inner.transport.delete(&url).await;
        let status = KeepaliveStatus::classify(&outcome);
        if let Err(e) = &outcome {
            warn!(codename = %self.codename(), error = %e, "Deregistration request failed");
        }
        info!(codename = %self.codename(), status = %status, "Deregistered");
        Some(status)
    }

    /// Run one cycle now and restart the interval from this moment.
    ///
    /// Returns `false` (and does nothing) when not registered.
    pub async fn force_send_keepalive(&self) -> bool {
        let (callback, generation) = {
            let mut scheduler = lock(&self.inner.scheduler);
            if scheduler.state == RegistrationState::Unregistered {
                return false;
            }
            scheduler.cancel_timer();
            (scheduler.callback.clone(), scheduler.generation)
        };

        debug!(codename = %self.codename(), "Forced keepalive");
        self.inner.run_cycle(callback.as_ref());
        self.inner.arm_timer(generation);
        true
    }

    // ------------------------------------------------------------------
    // Dependencies
    // ------------------------------------------------------------------

    /// Resolve `url` and add it to the reported dependencies.
    pub async fn add_dependency(&self, url: &str) -> Result<DependencyKey> {
        self.inner.dependencies.add_dependency(url).await
    }

    /// Resolve `url` and remove it from the reported dependencies.
    pub async fn remove_dependency(&self, url: &str) -> Result<()> {
        self.inner.dependencies.remove_dependency(url).await
    }

    /// Replace all reported dependencies.
    pub async fn set_dependencies<S: AsRef<str>>(&self, urls: &[S]) -> Result<Vec<DependencyKey>> {
        self.inner.dependencies.set_dependencies(urls).await
    }

    /// Currently reported dependencies, in insertion order.
    pub fn dependencies(&self) -> Vec<DependencyKey> {
        self.inner.dependencies.snapshot()
    }

    // ------------------------------------------------------------------
    // Introspection
    // ------------------------------------------------------------------

    pub fn codename(&self) -> &str {
        &self.inner.identity.codename
    }

    pub fn identity(&self) -> &ClientIdentity {
        &self.inner.identity
    }

    pub fn registration_state(&self) -> RegistrationState {
        lock(&self.inner.scheduler).state
    }

    pub fn is_registered(&self) -> bool {
        self.registration_state() == RegistrationState::Registered
    }

    /// Build a status document now without sending it.
    pub fn current_status(&self) -> StatusDocument {
        let callback = self.callback();
        self.inner.build_status(callback.as_ref().map(|cb| cb()))
    }

    /// Output of the registered status callback, if one was supplied.
    pub fn runtime_status(&self) -> Option<Value> {
        self.callback().map(|cb| cb())
    }

    /// The document most recently handed to the transport.
    pub fn last_sent_status(&self) -> Option<StatusDocument> {
        lock(&self.inner.last_sent).clone()
    }

    pub fn last_attempt(&self) -> KeepaliveAttemptResult {
        lock(&self.inner.tracker).last_attempt().clone()
    }

    pub fn last_success(&self) -> Option<SuccessfulKeepaliveRecord> {
        lock(&self.inner.tracker).last_success().cloned()
    }

    /// Failed keepalives since the last success.
    pub fn consecutive_failures(&self) -> u32 {
        lock(&self.inner.tracker).consecutive_failures()
    }

    /// Fewer than three keepalives in a row have failed.
    pub fn is_healthy(&self) -> bool {
        lock(&self.inner.tracker).is_healthy()
    }

    fn callback(&self) -> Option<StatusCallback> {
        lock(&self.inner.scheduler).callback.clone()
    }
}

impl Inner {
    fn build_status(&self, runtime: Option<Value>) -> StatusDocument {
        let tracker = lock(&self.tracker).clone();
        build_status(
            &self.identity,
            self.dependencies.snapshot(),
            &tracker,
            runtime,
            Utc::now(),
        )
    }

    /// Build a document and dispatch it without waiting for the response.
    fn run_cycle(self: &Arc<Self>, callback: Option<&StatusCallback>) {
        let document = self.build_status(callback.map(|cb| cb()));
        *lock(&self.last_sent) = Some(document.clone());

        let inner = Arc::clone(self);
        let url = self.identity.keepalive_url();
        tokio::spawn(async move {
            inner.send_keepalive(&url, &document).await;
        });
    }

    async fn send_keepalive(&self, url: &Url, document: &StatusDocument) -> KeepaliveStatus {
        let started = Instant::now();
        let outcome = self.transport.post_keepalive(url, document).await;
        let completed_at = Utc::now();
        let round_trip = started.elapsed();

        let status = KeepaliveStatus::classify(&outcome);
        let failures = lock(&self.tracker).record(completed_at, round_trip, status);

        if status.is_success() {
            debug!(
                codename = %self.identity.codename,
                rtt_us = round_trip.as_micros() as u64,
                "Keepalive sent"
            );
        } else {
            let error = outcome.err().map(|e| e.to_string()).unwrap_or_default();
            if failures >= FAILURE_ALERT_THRESHOLD {
                warn!(
                    codename = %self.identity.codename,
                    consecutive_failures = failures,
                    status = %status,
                    error = %error,
                    "Keepalive failed {} times in a row, collector may be unreachable", failures
                );
            } else {
                debug!(codename = %self.identity.codename, status = %status, error = %error, "Keepalive failed");
            }
        }
        status
    }

    /// Spawn the repeating timer unless the scheduler moved on since
    /// `generation` was taken.
    fn arm_timer(self: &Arc<Self>, generation: u64) {
        let mut scheduler = lock(&self.scheduler);
        if scheduler.generation != generation
            || scheduler.state != RegistrationState::Registered
        {
            return;
        }
        let interval = self.identity.keepalive_interval;
        scheduler.timer = Some(spawn_timer(Arc::downgrade(self), generation, interval));
    }
}

fn spawn_timer(weak: Weak<Inner>, generation: u64, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut next = tokio::time::Instant::now() + interval;
        loop {
            tokio::time::sleep_until(next).await;

            // The client was dropped.
            let Some(inner) = weak.upgrade() else {
                break;
            };
            let callback = {
                let scheduler = lock(&inner.scheduler);
                if scheduler.state != RegistrationState::Registered
                    || scheduler.generation != generation
                {
                    break;
                }
                scheduler.callback.clone()
            };

            next = tokio::time::Instant::now() + interval;
            inner.run_cycle(callback.as_ref());
        }
    })
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}
