//! Fixed-cadence invocation of actions while a view is mounted.
//!
//! [`Poller::start`] invokes the action right away and then once per interval. Ticks are
//! fire-and-forget: every invocation runs on its own task and the next tick never waits for
//! the previous fetch, so overlapping fetches are possible and resolved by the stores' issue
//! ordering. A failing action has no effect on the schedule.
//!
//! The returned [`PollHandle`] is owned by the view that started it. Stopping is idempotent
//! and dropping the handle stops it. Fetches already in flight are not cancelled; their
//! results still go through the usual store checks.

use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

/// Scheduler for periodic actions.
///
/// Must be used from within a tokio runtime.
#[derive(Debug, Clone, Copy, Default)]
pub struct Poller;

impl Poller {
    /// Invoke `action` now and then every `period` until the handle is stopped or dropped.
    ///
    /// `label` only appears in logs.
    pub fn start<F, Fut>(label: &str, period: Duration, action: F) -> PollHandle
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future + Send + 'static,
        Fut::Output: Send + 'static,
    {
        let stopped = Arc::new(AtomicBool::new(false));
        let invocations = Arc::new(AtomicU64::new(0));
        let period = period.max(Duration::from_millis(1));

        invocations.fetch_add(1, Ordering::SeqCst);
        tokio::spawn(action());

        let task = tokio::spawn({
            let stopped = Arc::clone(&stopped);
            let invocations = Arc::clone(&invocations);
            let label = label.to_string();
            async move {
                let mut ticker = interval_at(Instant::now() + period, period);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
                loop {
                    ticker.tick().await;
                    if stopped.load(Ordering::SeqCst) {
                        break;
                    }
                    let n = invocations.fetch_add(1, Ordering::SeqCst) + 1;
                    tracing::trace!(poller = %label, invocation = n, "Tick");
                    tokio::spawn(action());
                }
            }
        });

        tracing::debug!("Started poller '{}' every {:?}", label, period);
        PollHandle {
            label: label.to_string(),
            stopped,
            invocations,
            task,
        }
    }

    /// Stop a handle. Same as [`PollHandle::stop`].
    pub fn stop(handle: &PollHandle) {
        handle.stop();
    }
}

/// Cancellation handle of one poller.
#[must_use = "dropping a PollHandle stops the poller"]
pub struct PollHandle {
    label: String,
    stopped: Arc<AtomicBool>,
    invocations: Arc<AtomicU64>,
    task: JoinHandle<()>,
}

impl PollHandle {
    /// Cancel further invocations. Safe to call any number of times.
    pub fn stop(&self) {
        if !self.stopped.swap(true, Ordering::SeqCst) {
            self.task.abort();
            tracing::debug!(
                "Stopped poller '{}' after {} invocations",
                self.label,
                self.invocations()
            );
        }
    }

    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    /// Number of times the action has been invoked.
    #[must_use]
    pub fn invocations(&self) -> u64 {
        self.invocations.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }
}

impl fmt::Debug for PollHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PollHandle")
            .field("label", &self.label)
            .field("stopped", &self.is_stopped())
            .field("invocations", &self.invocations())
            .finish()
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.stop();
    }
}
