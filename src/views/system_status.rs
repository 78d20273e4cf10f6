//! System status flags.

use super::{Page, StoreView, ViewState, LOADING_TEXT};
use crate::context::AppContext;
use crate::models::{SystemState, SystemStatus};
use crate::poller::{PollHandle, Poller};
use crate::store::Collection;

/// One list item; inactive states are marked.
#[must_use]
pub fn state_item(state: &SystemState) -> String {
    if state.active {
        format!("[x] {}", state.name)
    } else {
        format!("[ ] {}", state.name)
    }
}

pub struct SystemStatusPage {
    view: StoreView<Collection, SystemStatus>,
}

impl SystemStatusPage {
    pub fn mount(ctx: &AppContext) -> Self {
        let view = StoreView::bind(&ctx.stores().system_status, Collection, ctx.redraw().clone());

        let actions = ctx.system();
        let poll = Poller::start("system status", ctx.polling().refresh_interval(), move || {
            let actions = actions.clone();
            async move { actions.find_status().await }
        });
        Self {
            view: view.with_poll(poll),
        }
    }

    #[must_use]
    pub fn state(&self) -> ViewState<SystemStatus> {
        self.view.state()
    }
}

impl Page for SystemStatusPage {
    fn title(&self) -> String {
        "System Status".to_string()
    }

    fn render(&self) -> String {
        match self.state().ready() {
            None => LOADING_TEXT.to_string(),
            Some(status) => status
                .status
                .iter()
                .map(state_item)
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }

    fn poll_handles(&self) -> &[PollHandle] {
        self.view.poll_handles()
    }
}
