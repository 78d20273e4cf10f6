//! Tracker detail page.

use chrono::{DateTime, Utc};
use std::fmt::Write;

use super::{Page, StoreView, ViewState, LOADING_TEXT};
use crate::context::AppContext;
use crate::models::{Contact, Tracker};
use crate::poller::{PollHandle, Poller};

/// Number of contacts shown on the page.
pub const CONTACTS_SHOWN: usize = 50;

/// Relative age of a timestamp, e.g. `3 minutes ago`.
#[must_use]
pub fn time_ago(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let secs = (now - then).num_seconds();
    if secs < 0 {
        return "in the future".to_string();
    }

    let (value, unit) = match secs {
        0..=44 => return "a few seconds ago".to_string(),
        45..=3_599 => ((secs + 30) / 60, "minute"),
        3_600..=86_399 => ((secs + 1_800) / 3_600, "hour"),
        _ => ((secs + 43_200) / 86_400, "day"),
    };

    if value <= 1 {
        format!("a {unit} ago")
    } else {
        format!("{value} {unit}s ago")
    }
}

/// One row of the contacts table.
#[must_use]
pub fn contact_row(contact: &Contact) -> String {
    format!(
        "{} | {} | frames: {} | {}",
        contact.bandit_name,
        if contact.is_active { "active" } else { "inactive" },
        contact.frame_count,
        contact
            .last_signal
            .map_or_else(|| "n/a".to_string(), |s| format!("{s} dBm")),
    )
}

/// Tracker detail page. Refreshes the tracker on the configured cadence.
pub struct TrackerDetailsPage {
    view: StoreView<String, Tracker>,
}

impl TrackerDetailsPage {
    pub fn mount(ctx: &AppContext, tracker_name: &str) -> Self {
        let view = StoreView::bind(
            &ctx.stores().trackers,
            tracker_name.to_string(),
            ctx.redraw().clone(),
        );

        let actions = ctx.trackers();
        let name = tracker_name.to_string();
        let poll = Poller::start(
            &format!("tracker {tracker_name}"),
            ctx.polling().refresh_interval(),
            move || {
                let actions = actions.clone();
                let name = name.clone();
                async move { actions.find_one(&name).await }
            },
        );
        Self {
            view: view.with_poll(poll),
        }
    }

    #[must_use]
    pub fn state(&self) -> ViewState<Tracker> {
        self.view.state()
    }
}

impl Page for TrackerDetailsPage {
    fn title(&self) -> String {
        format!("Tracker {}", self.view.key())
    }

    fn render(&self) -> String {
        let state = self.state();
        let Some(tracker) = state.ready() else {
            return LOADING_TEXT.to_string();
        };

        let mut out = String::new();
        let last_ping = tracker
            .last_seen
            .map_or_else(|| "never".to_string(), |t| time_ago(t, Utc::now()));
        let _ = writeln!(out, "Last Ping: {last_ping}");
        let _ = writeln!(out, "Signal Strength: {}%", tracker.signal_strength_percent());
        let _ = writeln!(out, "Version: {}", tracker.version);
        let _ = writeln!(
            out,
            "Status: {} ({} bandits)",
            tracker.state, tracker.bandit_count
        );
        let _ = writeln!(
            out,
            "Tracking: {}{}",
            tracker.tracking_mode.as_deref().unwrap_or("none"),
            if tracker.has_pending_tracking_requests {
                " (requests pending)"
            } else {
                ""
            }
        );

        let _ = write!(out, "Contacts (last {CONTACTS_SHOWN}):");
        for contact in tracker.contacts.iter().take(CONTACTS_SHOWN) {
            let _ = write!(out, "\n  {}", contact_row(contact));
        }
        out
    }

    fn poll_handles(&self) -> &[PollHandle] {
        self.view.poll_handles()
    }
}
