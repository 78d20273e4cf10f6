//! System status actions.

use serde_json::Value;

use super::{ActionContext, ActionOutcome};
use crate::fetch::routes;
use crate::models::SystemStatus;
use crate::store::{Collection, WeakStore};

/// Actions feeding the system status store.
#[derive(Clone)]
pub struct SystemActions {
    ctx: ActionContext,
    store: WeakStore<Collection, SystemStatus>,
}

impl SystemActions {
    pub fn new(ctx: ActionContext, store: WeakStore<Collection, SystemStatus>) -> Self {
        Self { ctx, store }
    }

    /// Load the current system state flags.
    pub async fn find_status(&self) -> ActionOutcome {
        self.ctx
            .fetch_into(
                &self.store,
                Collection,
                Ok(routes::SYSTEM_STATUS.to_string()),
                Value::Null,
                "system status",
            )
            .await
    }
}
