//! Backend connectivity monitor.
//!
//! A single [`ConnectivityMonitor`] per application pings the backend health endpoint and
//! publishes the result on a `watch` channel consumed by the shell.
//!
//! # State Machine
//!
//! ```text
//!            ping ok             ping ok
//! Unknown ───────────> Connected <─────────┐
//!    │                    │                │
//!    │ ping failed        │ ping failed    │
//!    ▼                    ▼                │
//! Disconnected <──────────┘                │
//!    └─────────────────────────────────────┘
//! ```
//!
//! Pings may overlap. Each one takes a sequence number before its request goes out, and an
//! outcome is dropped if a later ping already applied. There is no terminal state and no
//! retry inside the monitor. Periodic re-checks come from a [`Poller`](crate::poller::Poller) calling
//! [`ConnectivityMonitor::ping`].

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use serde_json::Value;
use tokio::sync::watch;
use tokio::time::Instant;

use crate::error::FetchError;
use crate::fetch::{routes, Fetcher, Method};

/// Connectivity as last observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectivityState {
    /// No ping has completed yet
    #[default]
    Unknown,
    /// Last ping succeeded
    Connected,
    /// Last ping failed
    Disconnected,
}

impl ConnectivityState {
    #[must_use]
    pub fn is_connected(self) -> bool {
        matches!(self, Self::Connected)
    }

    /// Short status label for display.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Unknown => "Checking...",
            Self::Connected => "Connected",
            Self::Disconnected => "Not connected",
        }
    }
}

impl fmt::Display for ConnectivityState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Diagnostics of the health checks. Never used to decide the state.
#[derive(Debug, Clone, Default)]
pub struct HealthStatus {
    /// When the last ping completed.
    pub last_check: Option<Instant>,
    /// When the last successful ping completed.
    pub last_success: Option<Instant>,
    /// Number of consecutive failed pings.
    pub consecutive_failures: u32,
    /// Total number of failed pings.
    pub total_failures: u32,
    /// Round-trip time of the last successful ping in milliseconds.
    pub last_rtt_ms: Option<f64>,
    /// The last error message for diagnostics.
    pub last_error_message: Option<String>,
}

/// Shared connectivity value plus the ping that updates it.
///
/// Cloning yields another handle to the same state.
#[derive(Clone)]
pub struct ConnectivityMonitor {
    fetcher: Arc<dyn Fetcher>,
    state: Arc<watch::Sender<ConnectivityState>>,
    health: Arc<Mutex<HealthStatus>>,
    next_ping: Arc<AtomicU64>,
    /// Sequence number of the last applied ping; held while applying an outcome.
    applied: Arc<Mutex<u64>>,
}

impl fmt::Debug for ConnectivityMonitor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectivityMonitor")
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl ConnectivityMonitor {
    /// Monitor starting in `initial` (normally [`ConnectivityState::Unknown`]).
    pub fn new(fetcher: Arc<dyn Fetcher>, initial: ConnectivityState) -> Self {
        let (tx, _) = watch::channel(initial);
        Self {
            fetcher,
            state: Arc::new(tx),
            health: Arc::new(Mutex::new(HealthStatus::default())),
            next_ping: Arc::new(AtomicU64::new(1)),
            applied: Arc::new(Mutex::new(0)),
        }
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> ConnectivityState {
        *self.state.borrow()
    }

    /// Receiver notified when the state changes. Repeated identical outcomes do not notify.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<ConnectivityState> {
        self.state.subscribe()
    }

    /// Snapshot of the health diagnostics.
    #[must_use]
    pub fn health(&self) -> HealthStatus {
        self.health
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Ping the backend once and apply the outcome.
    ///
    /// Any failure (transport, timeout, non-success status) means disconnected. Never
    /// fails; returns the current state afterwards. The outcome of a ping that finishes after
    /// a later-issued one is discarded.
    pub async fn ping(&self) -> ConnectivityState {
        let seq = self.next_ping.fetch_add(1, Ordering::SeqCst);
        let started = Instant::now();
        let result = self
            .fetcher
            .request(Method::Get, routes::PING, Value::Null)
            .await;

        let mut applied = self.applied.lock().unwrap_or_else(PoisonError::into_inner);
        if *applied > seq {
            tracing::trace!(
                "Dropping outdated ping #{} (#{} already applied)",
                seq,
                *applied
            );
            return self.state();
        }
        *applied = seq;

        let next = match result {
            Ok(_) => {
                self.record_success(started.elapsed().as_secs_f64() * 1000.0);
                ConnectivityState::Connected
            }
            Err(e) => {
                self.record_failure(&e);
                ConnectivityState::Disconnected
            }
        };

        self.apply(next);
        next
    }

    fn apply(&self, next: ConnectivityState) {
        let mut previous = next;
        let changed = self.state.send_if_modified(|state| {
            previous = *state;
            *state = next;
            previous != next
        });
        if !changed {
            return;
        }

        match next {
            ConnectivityState::Connected => {
                tracing::info!("Backend reachable ({} -> {})", previous, next);
            }
            ConnectivityState::Disconnected => {
                let reason = self.health().last_error_message.unwrap_or_default();
                tracing::warn!("Backend unreachable ({} -> {}): {}", previous, next, reason);
            }
            ConnectivityState::Unknown => {}
        }
    }

    fn record_success(&self, rtt_ms: f64) {
        let now = Instant::now();
        let mut health = self.health.lock().unwrap_or_else(PoisonError::into_inner);
        health.last_check = Some(now);
        health.last_success = Some(now);
        health.consecutive_failures = 0;
        health.last_rtt_ms = Some(rtt_ms);
        tracing::trace!("Ping ok (RTT: {:.1}ms)", rtt_ms);
    }

    fn record_failure(&self, error: &FetchError) {
        let mut health = self.health.lock().unwrap_or_else(PoisonError::into_inner);
        health.last_check = Some(Instant::now());
        health.consecutive_failures += 1;
        health.total_failures += 1;
        health.last_error_message = Some(error.to_string());
        tracing::debug!(
            "Ping failed ({} consecutive, {} total): {}",
            health.consecutive_failures,
            health.total_failures,
            error
        );
    }
}

/// Convert a fetch failure into a user-facing explanation for the "not connected" page.
#[must_use]
pub fn friendly_error_message(error: &str) -> String {
    let error_lower = error.to_lowercase();

    if error_lower.contains("connection refused") {
        return "The nzyme backend is not running or refuses connections.".into();
    }

    if error_lower.contains("dns")
        || error_lower.contains("resolve")
        || error_lower.contains("no such host")
    {
        return "Cannot resolve the backend hostname. Check the configured address.".into();
    }

    if error_lower.contains("timed out") || error_lower.contains("timeout") {
        return "The backend did not answer in time. It may be overloaded or unreachable.".into();
    }

    if error_lower.contains("status 401") || error_lower.contains("status 403") {
        return "The backend rejected the request. Check the REST interface access rules.".into();
    }

    if error_lower.contains("certificate") || error_lower.contains("tls") {
        return "TLS/certificate error while contacting the backend.".into();
    }

    format!("Could not reach the backend: {error}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::mock::{GatedFetcher, MockBackend};
    use serde_json::json;

    fn monitor(backend: &MockBackend) -> ConnectivityMonitor {
        ConnectivityMonitor::new(Arc::new(backend.clone()), ConnectivityState::Unknown)
    }

    #[tokio::test]
    async fn test_ping_flips_state() {
        let backend = MockBackend::new();
        backend.respond(Method::Get, routes::PING, Ok(json!({})));
        let monitor = monitor(&backend);
        assert_eq!(monitor.state(), ConnectivityState::Unknown);

        assert_eq!(monitor.ping().await, ConnectivityState::Connected);

        backend.set_offline(true);
        assert_eq!(monitor.ping().await, ConnectivityState::Disconnected);
        assert_eq!(monitor.state(), ConnectivityState::Disconnected);

        backend.set_offline(false);
        assert_eq!(monitor.ping().await, ConnectivityState::Connected);
    }

    #[tokio::test]
    async fn test_non_success_status_is_disconnected() {
        let backend = MockBackend::new();
        backend.respond(
            Method::Get,
            routes::PING,
            Err(FetchError::Status {
                status: 503,
                path: routes::PING.into(),
            }),
        );
        let monitor = monitor(&backend);
        assert_eq!(monitor.ping().await, ConnectivityState::Disconnected);
    }

    #[tokio::test]
    async fn test_subscribers_see_changes_only() {
        let backend = MockBackend::new();
        backend.respond(Method::Get, routes::PING, Ok(json!({})));
        let monitor = monitor(&backend);
        let mut rx = monitor.subscribe();

        monitor.ping().await;
        assert!(rx.has_changed().unwrap());
        assert_eq!(*rx.borrow_and_update(), ConnectivityState::Connected);

        monitor.ping().await;
        assert!(!rx.has_changed().unwrap());
    }

    #[tokio::test]
    async fn test_repeated_failures_notify_once() {
        let backend = MockBackend::new();
        backend.respond(Method::Get, routes::PING, Ok(json!({})));
        let monitor = monitor(&backend);
        let mut rx = monitor.subscribe();

        backend.set_offline(true);
        monitor.ping().await;
        monitor.ping().await;
        monitor.ping().await;
        assert_eq!(*rx.borrow_and_update(), ConnectivityState::Disconnected);

        backend.set_offline(false);
        monitor.ping().await;
        assert!(rx.has_changed().unwrap());
        assert_eq!(*rx.borrow_and_update(), ConnectivityState::Connected);
    }

    #[tokio::test]
    async fn test_outdated_ping_is_dropped() {
        let (fetcher, mut gate) = GatedFetcher::new();
        let monitor = ConnectivityMonitor::new(Arc::new(fetcher), ConnectivityState::Connected);

        let older = tokio::spawn({
            let monitor = monitor.clone();
            async move { monitor.ping().await }
        });
        let a = gate.recv().await.unwrap();
        let newer = tokio::spawn({
            let monitor = monitor.clone();
            async move { monitor.ping().await }
        });
        let b = gate.recv().await.unwrap();

        // The later ping sees the backend gone and answers first
        b.respond(Err(FetchError::Transport("connection refused".into())));
        assert_eq!(newer.await.unwrap(), ConnectivityState::Disconnected);

        a.respond(Ok(json!({})));
        assert_eq!(older.await.unwrap(), ConnectivityState::Disconnected);
        assert_eq!(monitor.state(), ConnectivityState::Disconnected);
        assert_eq!(monitor.health().consecutive_failures, 1);
        assert!(monitor.health().last_success.is_none());
    }

    #[tokio::test]
    async fn test_in_order_pings_both_apply() {
        let (fetcher, mut gate) = GatedFetcher::new();
        let monitor = ConnectivityMonitor::new(Arc::new(fetcher), ConnectivityState::Unknown);

        let first = tokio::spawn({
            let monitor = monitor.clone();
            async move { monitor.ping().await }
        });
        let a = gate.recv().await.unwrap();
        let second = tokio::spawn({
            let monitor = monitor.clone();
            async move { monitor.ping().await }
        });
        let b = gate.recv().await.unwrap();

        a.respond(Ok(json!({})));
        assert_eq!(first.await.unwrap(), ConnectivityState::Connected);
        b.respond(Err(FetchError::Transport("connection refused".into())));
        assert_eq!(second.await.unwrap(), ConnectivityState::Disconnected);
    }

    #[tokio::test]
    async fn test_health_tracking() {
        let backend = MockBackend::new();
        backend.set_offline(true);
        let monitor = monitor(&backend);

        monitor.ping().await;
        monitor.ping().await;
        let health = monitor.health();
        assert_eq!(health.consecutive_failures, 2);
        assert_eq!(health.total_failures, 2);
        assert!(health.last_success.is_none());
        assert!(health
            .last_error_message
            .as_deref()
            .unwrap()
            .contains("connection refused"));

        backend.set_offline(false);
        backend.respond(Method::Get, routes::PING, Ok(Value::Null));
        monitor.ping().await;
        let health = monitor.health();
        assert_eq!(health.consecutive_failures, 0);
        assert_eq!(health.total_failures, 2);
        assert!(health.last_rtt_ms.is_some());
    }

    #[tokio::test]
    #[tracing_test::traced_test]
    async fn test_transitions_are_logged() {
        let backend = MockBackend::new();
        backend.respond(Method::Get, routes::PING, Ok(json!({})));
        let monitor = monitor(&backend);

        monitor.ping().await;
        assert!(logs_contain("Backend reachable"));

        backend.set_offline(true);
        monitor.ping().await;
        assert!(logs_contain("Backend unreachable"));
    }

    #[test]
    fn test_friendly_error_message() {
        assert!(friendly_error_message("Transport error: connection refused")
            .contains("not running"));
        assert!(friendly_error_message("Request timed out: 10s").contains("in time"));
        assert!(friendly_error_message("weird").starts_with("Could not reach"));
    }

    #[test]
    fn test_state_label() {
        assert_eq!(ConnectivityState::default(), ConnectivityState::Unknown);
        assert_eq!(ConnectivityState::Disconnected.to_string(), "Not connected");
    }
}
