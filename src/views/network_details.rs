//! Details of one SSID on one BSSID, seen on one channel.

use chrono::{DateTime, Utc};
use std::fmt::Write;

use super::{Page, StoreView, ViewState, LOADING_TEXT};
use crate::context::AppContext;
use crate::models::{BeaconRatePoint, NetworkKey, SsidDetails};
use crate::poller::{PollHandle, Poller};

/// Chart series of averaged beacon rates.
#[derive(Debug, Clone, PartialEq)]
pub struct BeaconRateSeries {
    pub name: &'static str,
    pub x: Vec<DateTime<Utc>>,
    pub y: Vec<f64>,
}

/// Turn beacon rate history into one chart series, keeping sample order.
#[must_use]
pub fn beacon_rate_series(history: &[BeaconRatePoint]) -> BeaconRateSeries {
    let (x, y) = history.iter().map(|p| (p.created_at, p.rate)).unzip();
    BeaconRateSeries {
        name: "Beacon Rate",
        x,
        y,
    }
}

/// Network details page. Refreshes the SSID, including beacon rate history, on the
/// configured cadence.
pub struct NetworkDetailsPage {
    channel: u16,
    view: StoreView<NetworkKey, SsidDetails>,
}

impl NetworkDetailsPage {
    pub fn mount(ctx: &AppContext, bssid: &str, ssid: &str, channel: u16) -> Self {
        let key = NetworkKey::new(bssid, ssid);
        let label = format!("network {key}");
        let view = StoreView::bind(&ctx.stores().networks, key, ctx.redraw().clone());

        let history_seconds = ctx.polling().network_history_seconds;
        let actions = ctx.networks();
        let (b, s) = (bssid.to_string(), ssid.to_string());
        let poll = Poller::start(&label, ctx.polling().refresh_interval(), move || {
            let actions = actions.clone();
            let (b, s) = (b.clone(), s.clone());
            async move {
                actions
                    .find_ssid_on_bssid(&b, &s, true, history_seconds)
                    .await
            }
        });
        Self {
            channel,
            view: view.with_poll(poll),
        }
    }

    #[must_use]
    pub fn state(&self) -> ViewState<SsidDetails> {
        self.view.state()
    }

    #[must_use]
    pub fn key(&self) -> &NetworkKey {
        self.view.key()
    }

    #[must_use]
    pub fn channel(&self) -> u16 {
        self.channel
    }
}

impl Page for NetworkDetailsPage {
    fn title(&self) -> String {
        format!("Network {}", self.key().ssid)
    }

    fn render(&self) -> String {
        let state = self.state();
        let Some(ssid) = state.ready() else {
            return LOADING_TEXT.to_string();
        };

        let mut out = String::new();
        let _ = writeln!(out, "BSSID: {}", ssid.bssid);
        let _ = writeln!(out, "SSID: {}", ssid.name);
        let _ = writeln!(out, "Current Beacon Rate: {}", ssid.beacon_rate);

        let series = beacon_rate_series(&ssid.beacon_rate_history);
        if let (Some(first), Some(last)) = (series.x.first(), series.x.last()) {
            let _ = writeln!(
                out,
                "{}: {} samples ({} to {})",
                series.name,
                series.y.len(),
                first.format("%H:%M"),
                last.format("%H:%M")
            );
        }

        let _ = writeln!(out, "Network-wide Fingerprints:");
        for fingerprint in &ssid.fingerprints {
            let _ = writeln!(out, "  - {fingerprint}");
        }

        let _ = write!(out, "Channel {}: ", self.channel);
        match ssid.channels.get(&self.channel.to_string()) {
            Some(details) => {
                let _ = write!(out, "{details}");
            }
            None => out.push_str("no data"),
        }
        out
    }

    fn poll_handles(&self) -> &[PollHandle] {
        self.view.poll_handles()
    }
}
