//! Backend address configuration and URL normalization.
//!
//! - [`BackendAddress`]: validated REST base URL with source tracking
//! - [`AddressSource`]: where the address came from
//! - [`AddressError`]: why an address was rejected
//!
//! # Address Resolution Precedence
//!
//! 1. Command line (`--backend`)
//! 2. Configuration file / `NZYME_DASHBOARD_BACKEND__URL`
//! 3. Default: `http://127.0.0.1:22900`
//!
//! # URL Normalization
//!
//! - Bare host:port (e.g., `10.0.0.5:22900` → `http://10.0.0.5:22900/`)
//! - Missing port (e.g., `http://nzyme.local` → `http://nzyme.local:22900/`)
//! - Trailing path segments are kept so a reverse-proxy prefix still works
//! - Query and fragment are dropped
//!
//! # Example
//!
//! ```
//! use nzyme_dashboard::backend::{AddressSource, BackendAddress};
//!
//! let addr = BackendAddress::parse("10.0.0.5:22900", AddressSource::CommandLine)?;
//! assert_eq!(addr.as_str(), "http://10.0.0.5:22900/");
//! assert_eq!(addr.join("/api/ping").as_str(), "http://10.0.0.5:22900/api/ping");
//! # Ok::<(), nzyme_dashboard::backend::AddressError>(())
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use url::Url;

/// Default port of the nzyme REST interface.
pub const DEFAULT_REST_PORT: u16 = 22900;

/// Default backend address when no configuration is provided.
pub const DEFAULT_BACKEND_URL: &str = "http://127.0.0.1:22900";

/// Source of the backend address configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AddressSource {
    /// Hardcoded default
    Default,
    /// Configuration file or environment override
    Config,
    /// `--backend` command line flag
    CommandLine,
}

impl AddressSource {
    /// Returns a short label for log output.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Config => "config",
            Self::CommandLine => "cli",
        }
    }
}

/// Why a backend address was rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    #[error("Backend address is empty")]
    Empty,

    #[error("Backend address '{input}' is not a URL: {reason}")]
    Malformed { input: String, reason: String },

    #[error("Backend address '{0}' has no host")]
    NoHost(String),

    #[error("Backend scheme '{0}' is not supported, use http or https")]
    Scheme(String),

    #[error("Cannot use port {DEFAULT_REST_PORT} with '{0}'")]
    Port(String),
}

/// Validated backend base URL.
///
/// Always has a scheme, a host and a port. Query and fragment are removed; the path is kept
/// as the prefix for every API route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendAddress {
    url: Url,
    source: AddressSource,
}

impl BackendAddress {
    /// Parse and normalize a backend URL.
    pub fn parse(input: &str, source: AddressSource) -> Result<Self, AddressError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(AddressError::Empty);
        }

        let candidate = if input.contains("://") {
            input.to_string()
        } else {
            format!("http://{input}")
        };
        let mut url = Url::parse(&candidate).map_err(|e| AddressError::Malformed {
            input: input.to_string(),
            reason: e.to_string(),
        })?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(AddressError::Scheme(url.scheme().to_string()));
        }
        if url.host_str().map_or(true, str::is_empty) {
            return Err(AddressError::NoHost(input.to_string()));
        }
        if url.port().is_none() {
            url.set_port(Some(DEFAULT_REST_PORT))
                .map_err(|()| AddressError::Port(input.to_string()))?;
        }
        url.set_query(None);
        url.set_fragment(None);

        Ok(Self { url, source })
    }

    fn fallback() -> Self {
        Self {
            url: Url::parse(DEFAULT_BACKEND_URL)
                .unwrap_or_else(|_| unreachable!("default backend URL is valid")),
            source: AddressSource::Default,
        }
    }

    /// Returns the normalized URL string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.url.as_str()
    }

    /// Returns where this address came from.
    #[must_use]
    pub fn source(&self) -> AddressSource {
        self.source
    }

    /// Resolve an API path (always absolute, e.g. `/api/ping`) against the base URL.
    ///
    /// A path prefix on the base URL is preserved.
    #[must_use]
    pub fn join(&self, path: &str) -> Url {
        let mut url = self.url.clone();
        let base = url.path().trim_end_matches('/').to_string();
        url.set_path(&format!("{base}/{}", path.trim_start_matches('/')));
        url
    }
}

impl fmt::Display for BackendAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.url, self.source.label())
    }
}

/// Pick the backend address: command line first, then configuration, then the default.
///
/// Invalid inputs fall through to the next source.
#[must_use]
pub fn resolve_address(cli: Option<&str>, configured: Option<&str>) -> BackendAddress {
    if let Some(input) = cli {
        match BackendAddress::parse(input, AddressSource::CommandLine) {
            Ok(addr) => return addr,
            Err(e) => tracing::warn!("Ignoring --backend '{}': {}", input, e),
        }
    }

    if let Some(input) = configured {
        match BackendAddress::parse(input, AddressSource::Config) {
            Ok(addr) => return addr,
            Err(e) => tracing::warn!("Ignoring configured backend '{}': {}", input, e),
        }
    }

    BackendAddress::fallback()
}
