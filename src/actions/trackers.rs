//! Tracker (bandit tracking ground station) actions.

use serde_json::{json, Value};

use super::{ActionContext, ActionOutcome};
use crate::error::FetchError;
use crate::fetch::routes;
use crate::models::{TrackRequest, Tracker, TrackersList};
use crate::store::{Collection, WeakStore};

const START_TRACK_REQUEST: &str = "start_track_request";
const CANCEL_TRACK_REQUEST: &str = "cancel_track_request";

/// Actions feeding the tracker and tracker list stores.
#[derive(Clone)]
pub struct TrackersActions {
    ctx: ActionContext,
    trackers: WeakStore<String, Tracker>,
    list: WeakStore<Collection, TrackersList>,
}

impl TrackersActions {
    pub fn new(
        ctx: ActionContext,
        trackers: WeakStore<String, Tracker>,
        list: WeakStore<Collection, TrackersList>,
    ) -> Self {
        Self {
            ctx,
            trackers,
            list,
        }
    }

    /// Load one tracker by name. The record fully replaces the previous one.
    pub async fn find_one(&self, tracker_name: &str) -> ActionOutcome {
        self.ctx
            .fetch_into(
                &self.trackers,
                tracker_name.to_string(),
                routes::tracker(tracker_name),
                Value::Null,
                "tracker",
            )
            .await
    }

    /// Load all trackers known to the ground station.
    pub async fn find_all(&self) -> ActionOutcome {
        self.ctx
            .fetch_into(
                &self.list,
                Collection,
                Ok(routes::TRACKERS.to_string()),
                Value::Null,
                "trackers",
            )
            .await
    }

    /// Ask a tracker to start tracking a bandit.
    pub async fn start_track_request(
        &self,
        tracker_name: &str,
        bandit_uuid: &str,
        on_success: impl FnOnce() + Send,
        on_error: impl FnOnce(FetchError) + Send,
    ) {
        let body = match serde_json::to_value(TrackRequest {
            bandit_uuid: bandit_uuid.to_string(),
        }) {
            Ok(body) => body,
            Err(e) => return on_error(e.into()),
        };

        self.ctx
            .command(
                routes::tracker_command(tracker_name, START_TRACK_REQUEST),
                body,
                "Start track request",
                on_success,
                on_error,
            )
            .await;
    }

    /// Ask a tracker to stop tracking.
    pub async fn cancel_track_request(
        &self,
        tracker_name: &str,
        on_success: impl FnOnce() + Send,
        on_error: impl FnOnce(FetchError) + Send,
    ) {
        self.ctx
            .command(
                routes::tracker_command(tracker_name, CANCEL_TRACK_REQUEST),
                json!({}),
                "Cancel track request",
                on_success,
                on_error,
            )
            .await;
    }
}
