//! Scheduled report actions.

use serde_json::Value;

use super::{ActionContext, ActionOutcome};
use crate::error::FetchError;
use crate::fetch::routes;
use crate::models::{ReportType, ReportsList, ScheduleReportRequest};
use crate::store::{Collection, WeakStore};

/// Actions feeding the reports store.
#[derive(Clone)]
pub struct ReportsActions {
    ctx: ActionContext,
    store: WeakStore<Collection, ReportsList>,
}

impl ReportsActions {
    pub fn new(ctx: ActionContext, store: WeakStore<Collection, ReportsList>) -> Self {
        Self { ctx, store }
    }

    /// Load all scheduled reports.
    pub async fn find_all(&self) -> ActionOutcome {
        self.ctx
            .fetch_into(
                &self.store,
                Collection,
                Ok(routes::REPORTS.to_string()),
                Value::Null,
                "reports",
            )
            .await
    }

    /// Schedule a daily report at `hour:minute`, mailed to `receivers`.
    ///
    /// An invalid time of day, a blank receiver or a repeated receiver fails through
    /// `on_error` without contacting the backend.
    pub async fn schedule(
        &self,
        report_type: ReportType,
        hour: u8,
        minute: u8,
        receivers: Vec<String>,
        on_success: impl FnOnce() + Send,
        on_error: impl FnOnce(FetchError) + Send,
    ) {
        let request = ScheduleReportRequest {
            report_type,
            hour,
            minute,
            email_receivers: receivers,
        };

        let body = request
            .validate()
            .map_err(FetchError::InvalidRequest)
            .and_then(|()| serde_json::to_value(&request).map_err(FetchError::from));
        let body = match body {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!("Refusing to schedule {}: {}", report_type.label(), e);
                return on_error(e);
            }
        };

        self.ctx
            .command(
                Ok(routes::SCHEDULE_REPORT.to_string()),
                body,
                "Schedule report",
                on_success,
                on_error,
            )
            .await;
    }
}
