//! Domain records as delivered by the backend.
//!
//! These are plain snapshot values: once a store publishes one it is never mutated, every
//! refresh produces a new value. Fields the backend may omit carry serde defaults so a
//! sparse response still decodes (and then fully replaces the previous record).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

// =============================================================================
// Networks
// =============================================================================

/// Identity of one SSID advertised by one BSSID.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NetworkKey {
    /// Access point MAC address
    pub bssid: String,
    /// Network name
    pub ssid: String,
}

impl NetworkKey {
    /// Build a key from its parts.
    pub fn new(bssid: impl Into<String>, ssid: impl Into<String>) -> Self {
        Self {
            bssid: bssid.into(),
            ssid: ssid.into(),
        }
    }
}

impl fmt::Display for NetworkKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.bssid, self.ssid)
    }
}

/// One averaged beacon rate sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BeaconRatePoint {
    /// Sample time
    pub created_at: DateTime<Utc>,
    /// Beacons per second
    pub rate: f64,
}

/// Details of one SSID on one BSSID.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SsidDetails {
    /// Access point MAC address
    pub bssid: String,
    /// Network name
    pub name: String,
    /// Current beacon rate
    pub beacon_rate: f64,
    /// Beacon rate history, oldest first
    pub beacon_rate_history: Vec<BeaconRatePoint>,
    /// Network-wide fingerprints
    #[serde(deserialize_with = "fingerprint_list")]
    pub fingerprints: Vec<String>,
    /// Per-channel details keyed by channel number
    pub channels: BTreeMap<String, serde_json::Value>,
}

/// The backend has shipped fingerprints both as a list and as an object of strings.
fn fingerprint_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        List(Vec<String>),
        Map(BTreeMap<String, String>),
    }

    Ok(match Repr::deserialize(deserializer)? {
        Repr::List(list) => list,
        Repr::Map(map) => map.into_values().collect(),
    })
}

// =============================================================================
// Trackers
// =============================================================================

/// A contact between a tracker and a bandit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Contact {
    pub uuid: String,
    pub frame_count: u64,
    pub first_seen: Option<DateTime<Utc>>,
    pub last_seen: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub last_signal: Option<i32>,
    pub bandit_uuid: String,
    pub bandit_name: String,
    pub source_role: String,
    pub source_name: String,
}

/// Latest known state of one tracker.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tracker {
    pub name: String,
    pub version: String,
    pub last_seen: Option<DateTime<Utc>>,
    /// Raw signal strength, 0..=255
    pub rssi: i32,
    pub state: String,
    pub tracking_mode: Option<String>,
    pub bandit_count: u32,
    pub has_pending_tracking_requests: bool,
    pub contacts: Vec<Contact>,
}

impl Tracker {
    /// Signal strength as a rounded percentage of the 0..=255 range.
    #[must_use]
    pub fn signal_strength_percent(&self) -> i64 {
        (f64::from(self.rssi) / 255.0 * 100.0).round() as i64
    }
}

/// All trackers known to the ground station.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackersList {
    pub ground_station_enabled: bool,
    pub total: u32,
    pub trackers: Vec<Tracker>,
}

/// Body of a start-track command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrackRequest {
    /// Bandit to track
    pub bandit_uuid: String,
}

// =============================================================================
// Reports
// =============================================================================

/// Report kinds the backend can generate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReportType {
    /// Monitored networks, new networks, alerts and health of the day
    TacticalSummary,
    /// Observed networks and which of them appeared in the last 24 hours
    WirelessSurvey,
    /// Networks configured for monitoring and all enabled alerts
    WirelessInventory,
}

impl ReportType {
    /// All report types in display order.
    pub const ALL: [ReportType; 3] = [
        Self::TacticalSummary,
        Self::WirelessSurvey,
        Self::WirelessInventory,
    ];

    /// Human readable name.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::TacticalSummary => "Tactical Summary",
            Self::WirelessSurvey => "Wireless Survey",
            Self::WirelessInventory => "Wireless Inventory",
        }
    }

    /// Wire name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::TacticalSummary => "TacticalSummary",
            Self::WirelessSurvey => "WirelessSurvey",
            Self::WirelessInventory => "WirelessInventory",
        }
    }
}

impl FromStr for ReportType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("Unknown report type '{s}'"))
    }
}

/// One scheduled report.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduledReport {
    pub name: String,
    pub report_type: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub next_fire_time: Option<DateTime<Utc>>,
    pub previous_fire_time: Option<DateTime<Utc>>,
    pub cron_expression: String,
    pub email_receivers: Vec<String>,
}

/// All scheduled reports.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportsList {
    pub reports: Vec<ScheduledReport>,
}

/// Body of a report scheduling request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScheduleReportRequest {
    pub report_type: ReportType,
    pub hour: u8,
    pub minute: u8,
    pub email_receivers: Vec<String>,
}

impl ScheduleReportRequest {
    /// Check the time of day and receivers before anything is sent.
    pub fn validate(&self) -> Result<(), String> {
        if self.hour > 23 || self.minute > 59 {
            return Err(format!(
                "Invalid time of day {:02}:{:02}",
                self.hour, self.minute
            ));
        }
        let mut seen = std::collections::HashSet::new();
        for receiver in &self.email_receivers {
            let receiver = receiver.trim();
            if receiver.is_empty() {
                return Err(format!("Invalid email receiver '{receiver}'"));
            }
            if !seen.insert(receiver.to_lowercase()) {
                return Err(format!("Email receiver '{receiver}' already exists"));
            }
        }
        Ok(())
    }
}

// =============================================================================
// System status
// =============================================================================

/// One system state flag (e.g. `RUNNING`, `HIGH_LOAD`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemState {
    pub name: String,
    pub active: bool,
}

/// Current system status flags.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemStatus {
    pub status: Vec<SystemState>,
}

impl SystemStatus {
    /// Names of the active states.
    #[must_use]
    pub fn active(&self) -> Vec<&str> {
        self.status
            .iter()
            .filter(|s| s.active)
            .map(|s| s.name.as_str())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_network_key_display() {
        assert_eq!(NetworkKey::new("aa:bb", "home").to_string(), "aa:bb_home");
    }

    #[test]
    fn test_ssid_details_decodes_both_fingerprint_shapes() {
        let listed: SsidDetails = serde_json::from_value(json!({
            "bssid": "aa:bb",
            "name": "home",
            "beacon_rate": 10.5,
            "beacon_rate_history": [{"created_at": "2020-05-01T10:00:00Z", "rate": 9.0}],
            "fingerprints": ["ec398735", "dfbd0a31"],
            "channels": {"6": {"total_frames": 100}}
        }))
        .unwrap();
        assert_eq!(listed.fingerprints, vec!["ec398735", "dfbd0a31"]);
        assert_eq!(listed.beacon_rate_history.len(), 1);
        assert!(listed.channels.contains_key("6"));

        let mapped: SsidDetails = serde_json::from_value(json!({
            "fingerprints": {"a": "ec398735"}
        }))
        .unwrap();
        assert_eq!(mapped.fingerprints, vec!["ec398735"]);
        assert!(mapped.bssid.is_empty());
    }

    #[test]
    fn test_tracker_signal_strength() {
        let tracker = Tracker {
            rssi: 200,
            ..Default::default()
        };
        assert_eq!(tracker.signal_strength_percent(), 78);
    }

    #[test]
    fn test_tracker_sparse_record() {
        let tracker: Tracker = serde_json::from_value(json!({"rssi": 180})).unwrap();
        assert_eq!(tracker.rssi, 180);
        assert!(tracker.name.is_empty());
        assert!(tracker.contacts.is_empty());
    }

    #[test]
    fn test_report_type_parse() {
        assert_eq!(
            "wirelesssurvey".parse::<ReportType>().unwrap(),
            ReportType::WirelessSurvey
        );
        assert!("Weekly".parse::<ReportType>().is_err());
        assert_eq!(
            serde_json::to_value(ReportType::TacticalSummary).unwrap(),
            json!("TacticalSummary")
        );
    }

    #[test]
    fn test_schedule_request_validation() {
        let mut request = ScheduleReportRequest {
            report_type: ReportType::WirelessInventory,
            hour: 20,
            minute: 0,
            email_receivers: vec!["ops@example.org".into()],
        };
        assert!(request.validate().is_ok());

        request.hour = 24;
        assert!(request.validate().is_err());

        request.hour = 7;
        request.email_receivers.push("  ".into());
        assert!(request.validate().is_err());

        request.email_receivers = vec!["ops@example.org".into(), " OPS@example.org".into()];
        let err = request.validate().unwrap_err();
        assert!(err.contains("already exists"), "{err}");

        request.email_receivers = vec!["ops@example.org".into(), "noc@example.org".into()];
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_system_status_active() {
        let status: SystemStatus = serde_json::from_value(json!({
            "status": [{"name": "RUNNING", "active": true}, {"name": "HIGH_LOAD", "active": false}]
        }))
        .unwrap();
        assert_eq!(status.active(), vec!["RUNNING"]);
    }
}
