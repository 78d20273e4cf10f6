//! Tracker list page.

use std::fmt::Write;

use super::{Page, StoreView, ViewState, LOADING_TEXT};
use crate::context::AppContext;
use crate::models::TrackersList;
use crate::poller::{PollHandle, Poller};
use crate::store::Collection;

/// Shown when the ground station is disabled in the backend configuration.
pub const GROUND_STATION_DISABLED_TEXT: &str =
    "The tracker ground station is disabled. Please consult the documentation.";

/// Shown when no tracker has reported in yet.
pub const NO_TRACKERS_TEXT: &str = "No trackers.";

pub struct TrackersPage {
    view: StoreView<Collection, TrackersList>,
}

impl TrackersPage {
    pub fn mount(ctx: &AppContext) -> Self {
        let view = StoreView::bind(&ctx.stores().tracker_list, Collection, ctx.redraw().clone());

        let actions = ctx.trackers();
        let poll = Poller::start("trackers", ctx.polling().refresh_interval(), move || {
            let actions = actions.clone();
            async move { actions.find_all().await }
        });
        Self {
            view: view.with_poll(poll),
        }
    }

    #[must_use]
    pub fn state(&self) -> ViewState<TrackersList> {
        self.view.state()
    }
}

impl Page for TrackersPage {
    fn title(&self) -> String {
        "Trackers".to_string()
    }

    fn render(&self) -> String {
        let state = self.state();
        let Some(list) = state.ready() else {
            return LOADING_TEXT.to_string();
        };

        if !list.ground_station_enabled {
            return GROUND_STATION_DISABLED_TEXT.to_string();
        }
        if list.trackers.is_empty() {
            return NO_TRACKERS_TEXT.to_string();
        }

        let mut out = format!("{} trackers", list.total);
        for tracker in &list.trackers {
            let _ = write!(
                out,
                "\n  {} | {} | {}% | v{}",
                tracker.name,
                tracker.state,
                tracker.signal_strength_percent(),
                tracker.version
            );
        }
        out
    }

    fn poll_handles(&self) -> &[PollHandle] {
        self.view.poll_handles()
    }
}
