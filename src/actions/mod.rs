//! Domain actions: the only way to refresh or mutate a store.
//!
//! Each action performs exactly one backend request. Actions are fail-soft:
//!
//! - read actions commit the decoded response into their store on success; on failure they
//!   log, post a notice and leave the store untouched
//! - write actions invoke the caller's success or error callback
//!
//! Nothing here ever returns an error to the caller. Read actions report an
//! [`ActionOutcome`] so callers (and tests) can tell what happened.
//!
//! Actions hold only weak store handles. A response that arrives after the stores were torn
//! down is discarded as [`ActionOutcome::Detached`].

pub mod networks;
pub mod reports;
pub mod system;
pub mod trackers;

use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

use crate::error::FetchError;
use crate::fetch::{Fetcher, Method};
use crate::notifications::Notifications;
use crate::store::{SetOutcome, WeakStore};

pub use networks::NetworksActions;
pub use reports::ReportsActions;
pub use system::SystemActions;
pub use trackers::TrackersActions;

/// What a read action did with its response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    /// Response committed and subscribers notified
    Applied,
    /// Response discarded because a later-issued fetch already committed
    Stale,
    /// Request or decoding failed; store untouched
    Failed(FetchError),
    /// Store no longer exists; nothing was committed
    Detached,
}

impl ActionOutcome {
    /// Whether the store received the response.
    #[must_use]
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied)
    }
}

/// Collaborators shared by every action.
#[derive(Clone)]
pub struct ActionContext {
    fetcher: Arc<dyn Fetcher>,
    notifications: Notifications,
}

impl fmt::Debug for ActionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionContext").finish_non_exhaustive()
    }
}

impl ActionContext {
    pub fn new(fetcher: Arc<dyn Fetcher>, notifications: Notifications) -> Self {
        Self {
            fetcher,
            notifications,
        }
    }

    pub fn notifications(&self) -> &Notifications {
        &self.notifications
    }

    /// Fetch `path` and commit the decoded body under `key`.
    ///
    /// The ticket is taken before the request goes out so issue order decides which
    /// response survives.
    pub(crate) async fn fetch_into<K, V>(
        &self,
        store: &WeakStore<K, V>,
        key: K,
        path: Result<String, FetchError>,
        params: Value,
        what: &str,
    ) -> ActionOutcome
    where
        K: Eq + Hash + Clone + fmt::Debug + Send + Sync + 'static,
        V: DeserializeOwned + Send + Sync + 'static,
    {
        let ticket = match store.upgrade() {
            Some(store) => store.issue(key),
            None => return ActionOutcome::Detached,
        };

        let result = match path {
            Ok(path) => self.fetch_json::<V>(Method::Get, &path, params).await,
            Err(e) => Err(e),
        };

        let value = match result {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!("Could not load {}: {}", what, e);
                self.notifications
                    .error(format!("Could not load {what}: {e}"));
                return ActionOutcome::Failed(e);
            }
        };

        let Some(store) = store.upgrade() else {
            tracing::debug!("Store gone, dropping {} response", what);
            return ActionOutcome::Detached;
        };

        match store.set(ticket, value) {
            SetOutcome::Applied => ActionOutcome::Applied,
            SetOutcome::Stale => ActionOutcome::Stale,
        }
    }

    /// Issue a write and route the result to exactly one of the callbacks.
    pub(crate) async fn command(
        &self,
        path: Result<String, FetchError>,
        body: Value,
        what: &str,
        on_success: impl FnOnce() + Send,
        on_error: impl FnOnce(FetchError) + Send,
    ) {
        let result = match path {
            Ok(path) => self.fetcher.request(Method::Post, &path, body).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(_) => {
                tracing::info!("{} succeeded", what);
                on_success();
            }
            Err(e) => {
                tracing::warn!("{} failed: {}", what, e);
                on_error(e);
            }
        }
    }

    async fn fetch_json<V: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        params: Value,
    ) -> Result<V, FetchError> {
        let body = self.fetcher.request(method, path, params).await?;
        Ok(serde_json::from_value(body)?)
    }
}
