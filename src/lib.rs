//! # nzyme Dashboard Core Library
//!
//! Headless core of the nzyme wireless-monitoring dashboard. It polls the nzyme REST backend
//! for live telemetry (connectivity, networks, trackers, reports, system status) and exposes
//! it as navigable pages. There is no server push: every value on screen comes from a poll.
//!
//! ## Data Flow
//!
//! ```text
//! Page mounts ──> Poller ──> Action ──> Fetcher ──> backend
//!      ▲                        │
//!      └──── Subscription <── Store (issue-ordered set)
//!
//! ConnectivityMonitor ──> Shell (Unknown / Connected / Disconnected)
//! ```
//!
//! ## Crate Structure
//!
//! - **`fetch`**: the [`fetch::Fetcher`] request capability, the reqwest implementation and
//!   test doubles.
//! - **`store`**: per-domain snapshot stores with subscriptions and stale-response
//!   suppression.
//! - **`actions`**: the only writers of the stores; fail-soft.
//! - **`poller`**: immediate plus fixed-cadence invocation with RAII handles.
//! - **`connectivity`**: backend ping and the shared connectivity value.
//! - **`views`**: pages binding a store entry to a `ViewState`.
//! - **`shell`**: routing and connectivity gating of the whole page tree.
//! - **`context`**: explicit wiring of stores, actions and collaborators.
//! - **`config`**, **`logging`**, **`error`**, **`backend`**: ambient setup.

pub mod actions;
pub mod backend;
pub mod config;
pub mod connectivity;
pub mod context;
pub mod error;
pub mod fetch;
pub mod logging;
pub mod models;
pub mod notifications;
pub mod poller;
pub mod shell;
pub mod store;
pub mod views;

pub use actions::ActionOutcome;
pub use connectivity::{ConnectivityMonitor, ConnectivityState};
pub use context::{AppContext, Stores};
pub use error::{DashboardError, DashboardResult, FetchError};
pub use poller::{PollHandle, Poller};
pub use shell::{Route, Shell, ShellFrame};
pub use store::{Collection, Store, Subscription};
pub use views::{Page, ViewState};
