//! Pages and the view state they expose.
//!
//! A page subscribes to one store entry, starts its pollers and exposes the entry as a
//! [`ViewState`]: `Loading` until the first value arrives, then `Ready` with the latest
//! snapshot. Dropping a page drops its poll handles and subscriptions, so nothing it started
//! outlives it.
//!
//! Rendering is plain text. Tables and charts belong to the presentational layer; the
//! helpers in each page module only shape data for it.

pub mod network_details;
pub mod reports;
pub mod static_pages;
pub mod system_status;
pub mod tracker_details;
pub mod trackers;

use std::fmt;
use std::hash::Hash;
use std::sync::Arc;
use tokio::sync::{watch, Notify};

use crate::poller::PollHandle;
use crate::store::{Store, Subscription};

pub use network_details::NetworkDetailsPage;
pub use reports::ReportsPage;
pub use static_pages::{AlertDetailsPage, DashboardPage, NotFoundPage};
pub use system_status::SystemStatusPage;
pub use tracker_details::TrackerDetailsPage;
pub use trackers::TrackersPage;

/// Placeholder shown until a page has data.
pub const LOADING_TEXT: &str = "Loading...";

/// What a view currently shows.
#[derive(Debug)]
pub enum ViewState<V> {
    /// No value fetched yet
    Loading,
    /// Latest snapshot
    Ready(Arc<V>),
}

impl<V> Clone for ViewState<V> {
    fn clone(&self) -> Self {
        match self {
            Self::Loading => Self::Loading,
            Self::Ready(v) => Self::Ready(Arc::clone(v)),
        }
    }
}

impl<V> ViewState<V> {
    #[must_use]
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    /// The snapshot, if loaded.
    #[must_use]
    pub fn ready(&self) -> Option<&Arc<V>> {
        match self {
            Self::Loading => None,
            Self::Ready(v) => Some(v),
        }
    }
}

/// A mounted page.
pub trait Page: Send + Sync {
    /// Page title.
    fn title(&self) -> String;

    /// Current content as text.
    fn render(&self) -> String;

    /// Pollers owned by the page.
    fn poll_handles(&self) -> &[PollHandle] {
        &[]
    }
}

/// Binding of one store entry to a view.
///
/// Pollers are stopped before the subscription is released when the view drops.
pub struct StoreView<K, V> {
    polls: Vec<PollHandle>,
    state: Arc<watch::Sender<ViewState<V>>>,
    subscription: Subscription,
    key: K,
}

impl<K, V> StoreView<K, V>
where
    K: Eq + Hash + Clone + fmt::Debug + Send + Sync + 'static,
    V: Send + Sync + 'static,
{
    /// Subscribe to `key` in `store`. An entry already in the store is shown right away.
    ///
    /// The subscription is registered before the current entry is read, so a commit racing
    /// with the bind is never missed. Bind before starting the pollers that feed the view.
    pub fn bind(store: &Store<K, V>, key: K, redraw: Arc<Notify>) -> Self {
        let (tx, _) = watch::channel(ViewState::Loading);
        let tx = Arc::new(tx);
        let sender = Arc::clone(&tx);

        let wanted = key.clone();
        let subscription = store.subscribe(move |k, v| {
            if *k == wanted {
                sender.send_replace(ViewState::Ready(Arc::clone(v)));
                redraw.notify_one();
            }
        });

        // A listener delivery wins over the snapshot read here; it is at least as new
        if let Some(current) = store.get(&key) {
            tx.send_if_modified(|state| {
                if state.is_loading() {
                    *state = ViewState::Ready(current);
                    true
                } else {
                    false
                }
            });
        }

        Self {
            polls: Vec::new(),
            state: tx,
            subscription,
            key,
        }
    }

    /// Attach a poller; it stops with the view.
    pub fn with_poll(mut self, handle: PollHandle) -> Self {
        self.polls.push(handle);
        self
    }

    #[must_use]
    pub fn state(&self) -> ViewState<V> {
        self.state.borrow().clone()
    }

    /// Receiver updated on every delivered snapshot.
    #[must_use]
    pub fn changes(&self) -> watch::Receiver<ViewState<V>> {
        self.state.subscribe()
    }

    pub fn key(&self) -> &K {
        &self.key
    }

    pub fn poll_handles(&self) -> &[PollHandle] {
        &self.polls
    }

    /// Release pollers and subscription now.
    pub fn unmount(self) {
        let Self {
            polls,
            subscription,
            ..
        } = self;
        drop(polls);
        subscription.unsubscribe();
    }
}
