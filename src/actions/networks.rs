//! Network (SSID on BSSID) actions.

use serde_json::json;

use super::{ActionContext, ActionOutcome};
use crate::fetch::routes;
use crate::models::{NetworkKey, SsidDetails};
use crate::store::WeakStore;

/// Actions feeding the networks store.
#[derive(Clone)]
pub struct NetworksActions {
    ctx: ActionContext,
    store: WeakStore<NetworkKey, SsidDetails>,
}

impl NetworksActions {
    pub fn new(ctx: ActionContext, store: WeakStore<NetworkKey, SsidDetails>) -> Self {
        Self { ctx, store }
    }

    /// Load one SSID on one BSSID, optionally with `history_seconds` of beacon rate history.
    ///
    /// The result lands under [`NetworkKey`] `{bssid, ssid}`.
    pub async fn find_ssid_on_bssid(
        &self,
        bssid: &str,
        ssid: &str,
        include_history: bool,
        history_seconds: u64,
    ) -> ActionOutcome {
        tracing::debug!("Loading network {}/{}", bssid, ssid);
        self.ctx
            .fetch_into(
                &self.store,
                NetworkKey::new(bssid, ssid),
                routes::network(bssid, ssid),
                json!({
                    "include_history": include_history,
                    "history_seconds": history_seconds,
                }),
                "network details",
            )
            .await
    }
}
