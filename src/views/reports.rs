//! Scheduled reports table.

use chrono::{DateTime, Utc};
use std::fmt::Write;

use super::{Page, StoreView, ViewState, LOADING_TEXT};
use crate::context::AppContext;
use crate::models::{ReportsList, ScheduledReport};
use crate::poller::{PollHandle, Poller};
use crate::store::Collection;

/// Shown when the backend has no scheduled reports.
pub const NO_REPORTS_TEXT: &str = "No reports scheduled yet.";

fn timestamp(t: Option<DateTime<Utc>>) -> String {
    t.map_or_else(|| "-".to_string(), |t| t.format("%Y-%m-%d %H:%M").to_string())
}

/// One row: type, created, next fire, previous fire, schedule.
#[must_use]
pub fn report_row(report: &ScheduledReport) -> String {
    format!(
        "{} | {} | {} | {} | {}",
        report.report_type.as_deref().unwrap_or(&report.name),
        timestamp(report.created_at),
        timestamp(report.next_fire_time),
        timestamp(report.previous_fire_time),
        report.cron_expression
    )
}

pub struct ReportsPage {
    view: StoreView<Collection, ReportsList>,
}

impl ReportsPage {
    pub fn mount(ctx: &AppContext) -> Self {
        let view = StoreView::bind(&ctx.stores().reports, Collection, ctx.redraw().clone());

        let actions = ctx.reports();
        let poll = Poller::start("reports", ctx.polling().refresh_interval(), move || {
            let actions = actions.clone();
            async move { actions.find_all().await }
        });
        Self {
            view: view.with_poll(poll),
        }
    }

    #[must_use]
    pub fn state(&self) -> ViewState<ReportsList> {
        self.view.state()
    }
}

impl Page for ReportsPage {
    fn title(&self) -> String {
        "Reports".to_string()
    }

    fn render(&self) -> String {
        let state = self.state();
        let Some(list) = state.ready() else {
            return LOADING_TEXT.to_string();
        };

        if list.reports.is_empty() {
            return NO_REPORTS_TEXT.to_string();
        }

        let mut out =
            "Report Type | Created At | Next Fire Time | Previous Fire Time | Schedule".to_string();
        for report in &list.reports {
            let _ = write!(out, "\n{}", report_row(report));
        }
        out
    }

    fn poll_handles(&self) -> &[PollHandle] {
        self.view.poll_handles()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_report_row() {
        let report = ScheduledReport {
            name: "TacticalSummary-1".into(),
            report_type: Some("Tactical Summary".into()),
            created_at: Some(Utc.with_ymd_and_hms(2020, 9, 1, 8, 0, 0).unwrap()),
            cron_expression: "0 0 20 ? * * *".into(),
            ..Default::default()
        };
        assert_eq!(
            report_row(&report),
            "Tactical Summary | 2020-09-01 08:00 | - | - | 0 0 20 ? * * *"
        );
    }
}
