//! Tracing setup for the dashboard process.
//!
//! Logs go to stderr; stdout carries the rendered frames of `watch`. `RUST_LOG` overrides the
//! configured `application.log_level`.
//!
//! # Example
//! ```no_run
//! use nzyme_dashboard::{config::DashboardConfig, logging};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = DashboardConfig::load()?;
//! logging::init_from_config(&config)?;
//! tracing::info!("Dashboard started");
//! # Ok(())
//! # }
//! ```

use serde::{Deserialize, Serialize};
use std::io::IsTerminal;
use tracing::Level;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::config::DashboardConfig;
use crate::error::{DashboardError, DashboardResult};

/// Log line layout, set with `application.log_format`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// One line per event
    #[default]
    Compact,
    /// Multi-line with source locations, for debugging a session
    Pretty,
    /// One JSON object per event
    Json,
}

/// Install the global subscriber described by `config.application`.
///
/// Returns `Ok(())` if a subscriber is already installed.
pub fn init_from_config(config: &DashboardConfig) -> DashboardResult<()> {
    let level = parse_log_level(&config.application.log_level)?;
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_str().to_lowercase()));
    let ansi = std::io::stderr().is_terminal();

    let layer = match config.application.log_format {
        LogFormat::Compact => fmt::layer()
            .compact()
            .with_target(false)
            .with_ansi(ansi)
            .with_writer(std::io::stderr)
            .boxed(),
        LogFormat::Pretty => fmt::layer()
            .pretty()
            .with_file(true)
            .with_line_number(true)
            .with_ansi(ansi)
            .with_writer(std::io::stderr)
            .boxed(),
        LogFormat::Json => fmt::layer().json().with_writer(std::io::stderr).boxed(),
    };

    match tracing_subscriber::registry()
        .with(layer.with_filter(filter))
        .try_init()
    {
        Ok(()) => Ok(()),
        Err(e) if e.to_string().contains("already been set") => Ok(()),
        Err(e) => Err(DashboardError::Tracing(e.to_string())),
    }
}

/// Parse a configured log level, case-insensitively.
pub fn parse_log_level(level: &str) -> DashboardResult<Level> {
    level.trim().parse::<Level>().map_err(|_| {
        DashboardError::Configuration(format!(
            "Invalid log_level '{level}'. Must be one of: trace, debug, info, warn, error"
        ))
    })
}
