//! Error types for the dashboard core.
//!
//! Two layers of errors exist:
//!
//! - **`FetchError`**: produced by a [`Fetcher`](crate::fetch::Fetcher) when a single backend
//!   request fails. Actions and the connectivity monitor never propagate it past their own
//!   boundary; it is converted into a callback invocation, a notification or a state value.
//! - **`DashboardError`**: crate-level error for the fallible setup paths (configuration loading,
//!   backend address parsing, tracing initialization, HTTP client construction).
//!
//! By using `#[from]`, `DashboardError` can be created from the underlying error types,
//! simplifying error handling in setup code with the `?` operator.

use thiserror::Error;

use crate::backend::AddressError;

/// Convenience alias for results using the crate error type.
pub type DashboardResult<T> = std::result::Result<T, DashboardError>;

/// Failure of a single backend request.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// The request never produced a response (connection refused, DNS, reset).
    #[error("Transport error: {0}")]
    Transport(String),

    /// The transport gave up waiting for a response.
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// The backend answered with a non-success status code.
    #[error("Backend returned status {status} for {path}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Request path
        path: String,
    },

    /// The response body did not match the expected shape.
    #[error("Could not decode response: {0}")]
    Decode(String),

    /// The request could not be built (bad path segment, bad parameters).
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl From<serde_json::Error> for FetchError {
    fn from(value: serde_json::Error) -> Self {
        Self::Decode(value.to_string())
    }
}

/// Crate-level error for setup and configuration paths.
#[derive(Error, Debug)]
pub enum DashboardError {
    #[error("Configuration error: {0}")]
    Config(#[from] Box<figment::Error>),

    #[error("Configuration validation error: {0}")]
    Configuration(String),

    #[error("Invalid backend address: {0}")]
    Address(#[from] AddressError),

    #[error("Failed to initialize tracing: {0}")]
    Tracing(String),

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(String),

    #[error("Fetch failed: {0}")]
    Fetch(#[from] FetchError),
}

impl From<figment::Error> for DashboardError {
    fn from(value: figment::Error) -> Self {
        Self::Config(Box::new(value))
    }
}
