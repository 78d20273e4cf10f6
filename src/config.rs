//! Dashboard configuration using Figment
//!
//! Configuration is loaded from:
//! 1. `config/dashboard.toml` (base configuration, optional)
//! 2. Environment variables prefixed with `NZYME_DASHBOARD_`, nested keys separated by `__`
//!
//! # Example
//! ```no_run
//! use nzyme_dashboard::config::DashboardConfig;
//!
//! let config = DashboardConfig::load()?;
//! config.validate()?;
//! println!("Backend: {}", config.backend.url);
//! # Ok::<(), nzyme_dashboard::error::DashboardError>(())
//! ```
//!
//! `NZYME_DASHBOARD_POLLING__REFRESH_INTERVAL_MS=5000` overrides `polling.refresh_interval_ms`.

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::backend::{AddressSource, BackendAddress, DEFAULT_BACKEND_URL};
use crate::error::{DashboardError, DashboardResult};
use crate::logging::{parse_log_level, LogFormat};

/// Default configuration file location.
pub const DEFAULT_CONFIG_PATH: &str = "config/dashboard.toml";

/// Environment variable prefix.
pub const ENV_PREFIX: &str = "NZYME_DASHBOARD_";

/// Top-level dashboard configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardConfig {
    /// Application settings
    #[serde(default)]
    pub application: ApplicationConfig,
    /// Backend connection settings
    #[serde(default)]
    pub backend: BackendConfig,
    /// Refresh cadence settings
    #[serde(default)]
    pub polling: PollingConfig,
}

/// Application-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// Application name
    #[serde(default = "default_name")]
    pub name: String,
    /// Logging level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Log line layout (compact, pretty, json)
    #[serde(default)]
    pub log_format: LogFormat,
    /// Start in the connected state before the first ping settles
    #[serde(default)]
    pub assume_connected_on_start: bool,
}

/// Backend REST configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Base URL of the nzyme REST interface
    #[serde(default = "default_backend_url")]
    pub url: String,
    /// Per-request timeout in milliseconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_ms: u64,
}

/// Refresh cadence configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PollingConfig {
    /// How often mounted pages refresh their data
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval_ms: u64,
    /// How often the backend is pinged
    #[serde(default = "default_ping_interval")]
    pub ping_interval_ms: u64,
    /// Beacon rate history window requested for network details
    #[serde(default = "default_network_history")]
    pub network_history_seconds: u64,
}

fn default_name() -> String {
    "nzyme dashboard".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_backend_url() -> String {
    DEFAULT_BACKEND_URL.to_string()
}

fn default_request_timeout() -> u64 {
    10_000
}

fn default_refresh_interval() -> u64 {
    15_000
}

fn default_ping_interval() -> u64 {
    5_000
}

fn default_network_history() -> u64 {
    60 * 60
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            log_level: default_log_level(),
            log_format: LogFormat::default(),
            assume_connected_on_start: false,
        }
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: default_backend_url(),
            request_timeout_ms: default_request_timeout(),
        }
    }
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            refresh_interval_ms: default_refresh_interval(),
            ping_interval_ms: default_ping_interval(),
            network_history_seconds: default_network_history(),
        }
    }
}

impl PollingConfig {
    /// Page refresh interval
    #[must_use]
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_interval_ms)
    }

    /// Connectivity ping interval
    #[must_use]
    pub fn ping_interval(&self) -> Duration {
        Duration::from_millis(self.ping_interval_ms)
    }
}

impl DashboardConfig {
    /// Load configuration from `config/dashboard.toml` and environment variables
    pub fn load() -> DashboardResult<Self> {
        Self::load_from(DEFAULT_CONFIG_PATH)
    }

    /// Load configuration from a specific file path
    ///
    /// A missing file is not an error; defaults and environment still apply.
    pub fn load_from<P: AsRef<Path>>(path: P) -> DashboardResult<Self> {
        Ok(Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()?)
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> DashboardResult<()> {
        parse_log_level(&self.application.log_level)?;
        BackendAddress::parse(&self.backend.url, AddressSource::Config)?;

        for (name, value) in [
            ("backend.request_timeout_ms", self.backend.request_timeout_ms),
            ("polling.refresh_interval_ms", self.polling.refresh_interval_ms),
            ("polling.ping_interval_ms", self.polling.ping_interval_ms),
        ] {
            if value == 0 {
                return Err(DashboardError::Configuration(format!(
                    "{name} must be greater than zero"
                )));
            }
        }

        Ok(())
    }

    /// Page refresh interval
    #[must_use]
    pub fn refresh_interval(&self) -> Duration {
        self.polling.refresh_interval()
    }

    /// Connectivity ping interval
    #[must_use]
    pub fn ping_interval(&self) -> Duration {
        self.polling.ping_interval()
    }

    /// Per-request timeout
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.backend.request_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = DashboardConfig::default();
        assert_eq!(config.refresh_interval(), Duration::from_secs(15));
        assert_eq!(config.polling.network_history_seconds, 3600);
        assert!(!config.application.assume_connected_on_start);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_partial_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
            [application]
            log_format = "json"

            [backend]
            url = "10.0.0.5:22900"

            [polling]
            refresh_interval_ms = 5000
            "#
        )
        .unwrap();

        let config = DashboardConfig::load_from(file.path()).unwrap();
        assert_eq!(config.backend.url, "10.0.0.5:22900");
        assert_eq!(config.backend.request_timeout_ms, 10_000);
        assert_eq!(config.refresh_interval(), Duration::from_secs(5));
        assert_eq!(config.polling.ping_interval_ms, 5_000);
        assert_eq!(config.application.log_level, "info");
        assert_eq!(config.application.log_format, LogFormat::Json);
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = DashboardConfig::load_from(dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.backend, BackendConfig::default());
    }

    #[test]
    fn test_invalid_log_level() {
        let mut config = DashboardConfig::default();
        config.application.log_level = "loud".to_string();
        assert!(matches!(
            config.validate(),
            Err(DashboardError::Configuration(_))
        ));
    }

    #[test]
    fn test_zero_interval_rejected() {
        let mut config = DashboardConfig::default();
        config.polling.ping_interval_ms = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("ping_interval_ms"));
    }

    #[test]
    fn test_bad_backend_url_rejected() {
        let mut config = DashboardConfig::default();
        config.backend.url = "ftp://nzyme".to_string();
        assert!(matches!(config.validate(), Err(DashboardError::Address(_))));
    }
}
