//! Application shell: connectivity gating and routing.
//!
//! The shell is the root of the render tree. It follows the connectivity state:
//!
//! - `Unknown`: neutral loading frame, no page mounted
//! - `Connected`: exactly one page mounted for the current route
//! - `Disconnected`: navigation, notices, footer and a "not connected" placeholder; the
//!   routed page is dropped together with every poller it owned
//!
//! The requested route survives disconnects and is remounted when the backend comes back.

use std::fmt;
use std::sync::Arc;

use crate::connectivity::{friendly_error_message, ConnectivityMonitor, ConnectivityState};
use crate::context::AppContext;
use crate::notifications::Notifications;
use crate::views::{
    AlertDetailsPage, DashboardPage, NetworkDetailsPage, NotFoundPage, Page, ReportsPage,
    SystemStatusPage, TrackerDetailsPage, TrackersPage,
};

/// Text of the placeholder shown while the backend is unreachable.
pub const NOT_CONNECTED_TEXT: &str = "Not connected to the nzyme backend.";

/// Navigation bar entries as `(label, path)`.
pub const NAVIGATION: &[(&str, &str)] = &[
    ("Dashboard", "/"),
    ("Trackers", "/bandits/trackers"),
    ("Reports", "/system/reports"),
    ("System", "/system"),
];

/// Route slots of the dashboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Dashboard,
    SystemStatus,
    AlertDetails { id: String },
    NetworkDetails { bssid: String, ssid: String, channel: u16 },
    TrackerDetails { name: String },
    Trackers,
    Reports,
    /// `/notfound` or any unmatched path
    NotFound { path: String },
}

impl Route {
    /// Map a path to its route. Segments are percent-decoded; unmatched paths and
    /// non-numeric channels map to [`Route::NotFound`].
    #[must_use]
    pub fn parse(path: &str) -> Self {
        let path_only = path.split(['?', '#']).next().unwrap_or_default();
        let segments: Vec<String> = path_only
            .split('/')
            .filter(|s| !s.is_empty())
            .map(|s| urlencoding::decode(s).map_or_else(|_| s.to_string(), |d| d.into_owned()))
            .collect();
        let parts: Vec<&str> = segments.iter().map(String::as_str).collect();

        match parts.as_slice() {
            [] => Self::Dashboard,
            ["system"] => Self::SystemStatus,
            ["system", "reports"] => Self::Reports,
            ["alerts", "show", id] => Self::AlertDetails { id: (*id).to_string() },
            ["networks", "show", bssid, ssid, channel] => match channel.parse() {
                Ok(channel) => Self::NetworkDetails {
                    bssid: (*bssid).to_string(),
                    ssid: (*ssid).to_string(),
                    channel,
                },
                Err(_) => Self::not_found(path),
            },
            ["bandits", "trackers"] => Self::Trackers,
            ["bandits", "trackers", "show", name] => Self::TrackerDetails {
                name: (*name).to_string(),
            },
            _ => Self::not_found(path),
        }
    }

    fn not_found(path: &str) -> Self {
        Self::NotFound {
            path: path.to_string(),
        }
    }

    /// Canonical path of the route.
    #[must_use]
    pub fn path(&self) -> String {
        let enc = |s: &str| urlencoding::encode(s).into_owned();
        match self {
            Self::Dashboard => "/".to_string(),
            Self::SystemStatus => "/system".to_string(),
            Self::Reports => "/system/reports".to_string(),
            Self::AlertDetails { id } => format!("/alerts/show/{}", enc(id)),
            Self::NetworkDetails {
                bssid,
                ssid,
                channel,
            } => format!("/networks/show/{}/{}/{}", enc(bssid), enc(ssid), channel),
            Self::TrackerDetails { name } => format!("/bandits/trackers/show/{}", enc(name)),
            Self::Trackers => "/bandits/trackers".to_string(),
            Self::NotFound { .. } => "/notfound".to_string(),
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

/// Builds the page for a route.
pub trait PageFactory: Send + Sync {
    fn mount(&self, route: &Route) -> Box<dyn Page>;
}

/// The dashboard's pages, backed by an [`AppContext`].
#[derive(Debug, Clone)]
pub struct DashboardPages {
    ctx: AppContext,
}

impl DashboardPages {
    pub fn new(ctx: AppContext) -> Self {
        Self { ctx }
    }
}

impl PageFactory for DashboardPages {
    fn mount(&self, route: &Route) -> Box<dyn Page> {
        let ctx = &self.ctx;
        match route {
            Route::Dashboard => Box::new(DashboardPage),
            Route::SystemStatus => Box::new(SystemStatusPage::mount(ctx)),
            Route::AlertDetails { id } => Box::new(AlertDetailsPage::new(id.clone())),
            Route::NetworkDetails {
                bssid,
                ssid,
                channel,
            } => Box::new(NetworkDetailsPage::mount(ctx, bssid, ssid, *channel)),
            Route::TrackerDetails { name } => Box::new(TrackerDetailsPage::mount(ctx, name)),
            Route::Trackers => Box::new(TrackersPage::mount(ctx)),
            Route::Reports => Box::new(ReportsPage::mount(ctx)),
            Route::NotFound { path } => Box::new(NotFoundPage::new(path.clone())),
        }
    }
}

/// Main content of a frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Body {
    /// Connectivity not determined yet
    Loading,
    /// The routed page
    Page {
        route: Route,
        title: String,
        content: String,
    },
    /// Backend unreachable
    NotConnected { reason: Option<String> },
}

/// Everything the shell shows at one point in time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellFrame {
    pub connectivity: ConnectivityState,
    /// Navigation bar, shown in every state but `Unknown`
    pub navigation: Vec<(&'static str, &'static str)>,
    /// Active notices, oldest first
    pub notices: Vec<String>,
    pub footer: Option<String>,
    pub body: Body,
}

impl fmt::Display for ShellFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.navigation.is_empty() {
            let labels: Vec<&str> = self.navigation.iter().map(|(label, _)| *label).collect();
            writeln!(f, "[{}]", labels.join(" | "))?;
        }
        for notice in &self.notices {
            writeln!(f, "! {notice}")?;
        }
        match &self.body {
            Body::Loading => writeln!(f, "{}", crate::views::LOADING_TEXT)?,
            Body::Page { title, content, .. } => writeln!(f, "== {title} ==\n{content}")?,
            Body::NotConnected { reason } => {
                writeln!(f, "{NOT_CONNECTED_TEXT}")?;
                if let Some(reason) = reason {
                    writeln!(f, "{reason}")?;
                }
            }
        }
        if let Some(footer) = &self.footer {
            write!(f, "-- {footer} --")?;
        }
        Ok(())
    }
}

/// Root state machine.
pub struct Shell {
    factory: Arc<dyn PageFactory>,
    notifications: Notifications,
    monitor: Option<ConnectivityMonitor>,
    state: ConnectivityState,
    route: Route,
    page: Option<Box<dyn Page>>,
}

impl fmt::Debug for Shell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Shell")
            .field("state", &self.state)
            .field("route", &self.route)
            .field("mounted", &self.page.is_some())
            .finish_non_exhaustive()
    }
}

impl Shell {
    /// Shell in `initial` state at `path`. A `Connected` start mounts the page immediately.
    pub fn new(
        factory: Arc<dyn PageFactory>,
        notifications: Notifications,
        initial: ConnectivityState,
        path: &str,
    ) -> Self {
        let mut shell = Self {
            factory,
            notifications,
            monitor: None,
            state: ConnectivityState::Unknown,
            route: Route::parse(path),
            page: None,
        };
        shell.apply(initial);
        shell
    }

    /// Shell over the dashboard pages, starting from the monitor's current state.
    pub fn for_context(ctx: &AppContext, path: &str) -> Self {
        let mut shell = Self::new(
            Arc::new(DashboardPages::new(ctx.clone())),
            ctx.notifications().clone(),
            ctx.connectivity().state(),
            path,
        );
        shell.monitor = Some(ctx.connectivity().clone());
        shell
    }

    #[must_use]
    pub fn state(&self) -> ConnectivityState {
        self.state
    }

    #[must_use]
    pub fn route(&self) -> &Route {
        &self.route
    }

    /// The mounted page, only while connected.
    #[must_use]
    pub fn page(&self) -> Option<&dyn Page> {
        self.page.as_deref()
    }

    /// Follow a connectivity change. Returns `true` if the state changed.
    pub fn apply(&mut self, next: ConnectivityState) -> bool {
        if next == self.state {
            return false;
        }

        tracing::info!("Shell {} -> {} at {}", self.state, next, self.route);
        self.state = next;
        match next {
            ConnectivityState::Connected => self.mount(),
            ConnectivityState::Disconnected | ConnectivityState::Unknown => {
                self.page = None;
            }
        }
        true
    }

    /// Switch to `path`. The page is only mounted while connected.
    pub fn navigate(&mut self, path: &str) {
        let route = Route::parse(path);
        if route == self.route && self.page.is_some() {
            return;
        }

        self.route = route;
        if self.state.is_connected() {
            self.mount();
        }
    }

    fn mount(&mut self) {
        // Old page (and its pollers) goes first
        self.page = None;
        tracing::debug!("Mounting {}", self.route);
        self.page = Some(self.factory.mount(&self.route));
    }

    /// Current frame.
    #[must_use]
    pub fn frame(&self) -> ShellFrame {
        if self.state == ConnectivityState::Unknown {
            return ShellFrame {
                connectivity: self.state,
                navigation: Vec::new(),
                notices: Vec::new(),
                footer: None,
                body: Body::Loading,
            };
        }

        let body = match &self.page {
            Some(page) if self.state.is_connected() => Body::Page {
                route: self.route.clone(),
                title: page.title(),
                content: page.render(),
            },
            _ => Body::NotConnected {
                reason: self
                    .monitor
                    .as_ref()
                    .and_then(|m| m.health().last_error_message)
                    .map(|e| friendly_error_message(&e)),
            },
        };

        ShellFrame {
            connectivity: self.state,
            navigation: NAVIGATION.to_vec(),
            notices: self
                .notifications
                .active()
                .into_iter()
                .map(|n| n.message)
                .collect(),
            footer: Some(format!("nzyme dashboard v{}", env!("CARGO_PKG_VERSION"))),
            body,
        }
    }
}
