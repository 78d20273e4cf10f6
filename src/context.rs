//! Application wiring: stores, actions and the shared collaborators.
//!
//! Everything is constructed explicitly and handed to pages through [`AppContext`]; there
//! are no process-wide singletons besides the connectivity value owned by the monitor.

use std::fmt;
use std::sync::Arc;
use tokio::sync::Notify;

use crate::actions::{
    ActionContext, ActionOutcome, NetworksActions, ReportsActions, SystemActions, TrackersActions,
};
use crate::config::{DashboardConfig, PollingConfig};
use crate::connectivity::{ConnectivityMonitor, ConnectivityState};
use crate::fetch::Fetcher;
use crate::models::{NetworkKey, ReportsList, SsidDetails, SystemStatus, Tracker, TrackersList};
use crate::notifications::Notifications;
use crate::poller::{PollHandle, Poller};
use crate::store::{Collection, Store};

/// SSID details keyed by `{bssid, ssid}`.
pub type NetworksStore = Store<NetworkKey, SsidDetails>;
/// Tracker records keyed by tracker name.
pub type TrackersStore = Store<String, Tracker>;
/// The tracker list.
pub type TrackerListStore = Store<Collection, TrackersList>;
/// The scheduled reports list.
pub type ReportsStore = Store<Collection, ReportsList>;
/// System status flags.
pub type SystemStatusStore = Store<Collection, SystemStatus>;

/// One store per data domain.
#[derive(Debug, Clone)]
pub struct Stores {
    pub networks: NetworksStore,
    pub trackers: TrackersStore,
    pub tracker_list: TrackerListStore,
    pub reports: ReportsStore,
    pub system_status: SystemStatusStore,
}

impl Default for Stores {
    fn default() -> Self {
        Self::new()
    }
}

impl Stores {
    #[must_use]
    pub fn new() -> Self {
        Self {
            networks: Store::new("networks"),
            trackers: Store::new("trackers"),
            tracker_list: Store::new("tracker_list"),
            reports: Store::new("reports"),
            system_status: Store::new("system_status"),
        }
    }
}

/// Outcomes of [`AppContext::refresh_collections`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionsRefresh {
    pub trackers: ActionOutcome,
    pub reports: ActionOutcome,
    pub system_status: ActionOutcome,
}

/// Everything a page needs to subscribe, poll and act.
///
/// Cheap to clone; all clones share the same stores and collaborators.
#[derive(Clone)]
pub struct AppContext {
    stores: Stores,
    actions: ActionContext,
    notifications: Notifications,
    connectivity: ConnectivityMonitor,
    polling: PollingConfig,
    redraw: Arc<Notify>,
}

impl fmt::Debug for AppContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppContext")
            .field("connectivity", &self.connectivity.state())
            .field("polling", &self.polling)
            .finish_non_exhaustive()
    }
}

impl AppContext {
    /// Context for a loaded configuration.
    pub fn from_config(fetcher: Arc<dyn Fetcher>, config: &DashboardConfig) -> Self {
        let initial = if config.application.assume_connected_on_start {
            ConnectivityState::Connected
        } else {
            ConnectivityState::Unknown
        };
        Self::new(fetcher, config.polling.clone(), initial)
    }

    pub fn new(
        fetcher: Arc<dyn Fetcher>,
        polling: PollingConfig,
        initial: ConnectivityState,
    ) -> Self {
        let notifications = Notifications::new();
        Self {
            stores: Stores::new(),
            actions: ActionContext::new(Arc::clone(&fetcher), notifications.clone()),
            connectivity: ConnectivityMonitor::new(fetcher, initial),
            notifications,
            polling,
            redraw: Arc::new(Notify::new()),
        }
    }

    pub fn stores(&self) -> &Stores {
        &self.stores
    }

    pub fn notifications(&self) -> &Notifications {
        &self.notifications
    }

    pub fn connectivity(&self) -> &ConnectivityMonitor {
        &self.connectivity
    }

    pub fn polling(&self) -> &PollingConfig {
        &self.polling
    }

    /// Signalled whenever a mounted view received new data.
    pub fn redraw(&self) -> &Arc<Notify> {
        &self.redraw
    }

    pub fn networks(&self) -> NetworksActions {
        NetworksActions::new(self.actions.clone(), self.stores.networks.downgrade())
    }

    pub fn trackers(&self) -> TrackersActions {
        TrackersActions::new(
            self.actions.clone(),
            self.stores.trackers.downgrade(),
            self.stores.tracker_list.downgrade(),
        )
    }

    pub fn reports(&self) -> ReportsActions {
        ReportsActions::new(self.actions.clone(), self.stores.reports.downgrade())
    }

    pub fn system(&self) -> SystemActions {
        SystemActions::new(self.actions.clone(), self.stores.system_status.downgrade())
    }

    /// Load the tracker list, the reports and the system status once, concurrently.
    pub async fn refresh_collections(&self) -> CollectionsRefresh {
        let (trackers, reports, system) = (self.trackers(), self.reports(), self.system());
        let (trackers, reports, system_status) =
            futures::join!(trackers.find_all(), reports.find_all(), system.find_status());
        CollectionsRefresh {
            trackers,
            reports,
            system_status,
        }
    }

    /// Ping now and then every `polling.ping_interval`.
    pub fn start_connectivity_poller(&self) -> PollHandle {
        let monitor = self.connectivity.clone();
        Poller::start("connectivity", self.polling.ping_interval(), move || {
            let monitor = monitor.clone();
            async move { monitor.ping().await }
        })
    }
}
