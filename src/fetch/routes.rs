//! REST paths of the nzyme backend.
//!
//! Entity names travel as path segments and are percent-encoded here so a tracker named
//! `tracker 1/b` cannot escape its segment.

use url::Url;

use crate::error::FetchError;

/// Health endpoint used by the connectivity monitor.
pub const PING: &str = "/api/ping";

/// Tracker list.
pub const TRACKERS: &str = "/api/trackers";

/// Scheduled reports list.
pub const REPORTS: &str = "/api/reports";

/// Report scheduling endpoint.
pub const SCHEDULE_REPORT: &str = "/api/reports/schedule";

/// System status states.
pub const SYSTEM_STATUS: &str = "/api/system/status";

/// `/api/networks/bssids/{bssid}/ssids/{ssid}`
pub fn network(bssid: &str, ssid: &str) -> Result<String, FetchError> {
    build(&["api", "networks", "bssids", bssid, "ssids", ssid])
}

/// `/api/trackers/show/{name}`
pub fn tracker(name: &str) -> Result<String, FetchError> {
    build(&["api", "trackers", "show", name])
}

/// `/api/trackers/show/{name}/command/{command}`
pub fn tracker_command(name: &str, command: &str) -> Result<String, FetchError> {
    build(&["api", "trackers", "show", name, "command", command])
}

fn build(segments: &[&str]) -> Result<String, FetchError> {
    if let Some(empty) = segments.iter().position(|s| s.trim().is_empty()) {
        return Err(FetchError::InvalidRequest(format!(
            "path segment {empty} is empty"
        )));
    }

    let mut url = Url::parse("http://backend.invalid/")
        .map_err(|e| FetchError::InvalidRequest(e.to_string()))?;
    url.path_segments_mut()
        .map_err(|()| FetchError::InvalidRequest("cannot build path".to_string()))?
        .clear()
        .extend(segments);
    Ok(url.path().to_string())
}
