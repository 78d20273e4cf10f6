//! Backend fetch capability.
//!
//! Every action and the connectivity monitor reach the backend through the [`Fetcher`] trait,
//! an abstract `request(method, path, params)` returning a JSON body or a [`FetchError`].
//! The core never depends on a particular transport:
//!
//! - [`HttpFetcher`]: reqwest-based implementation used by the binary
//! - [`mock::MockBackend`]: canned responses with an offline switch, for tests and demos
//! - [`mock::GatedFetcher`]: hands every request to the caller, who decides when and how it
//!   resolves (used to reproduce out-of-order completions)
//!
//! Parameters are a JSON object. For `GET` they become the query string, for `POST` the body.

pub mod http;
pub mod mock;
pub mod routes;

use async_trait::async_trait;
use serde_json::Value;
use std::fmt;

use crate::error::FetchError;

pub use http::HttpFetcher;

/// Request method understood by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    /// Read
    Get,
    /// Create or command
    Post,
    /// Remove
    Delete,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Get => write!(f, "GET"),
            Self::Post => write!(f, "POST"),
            Self::Delete => write!(f, "DELETE"),
        }
    }
}

/// Abstract backend request capability.
///
/// Implementations must be cheap to share (`Arc<dyn Fetcher>`) and must convert every
/// failure (transport, timeout, non-success status, undecodable body) into a [`FetchError`].
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Issue one request and return the decoded JSON body (`Value::Null` for empty bodies).
    async fn request(&self, method: Method, path: &str, params: Value) -> Result<Value, FetchError>;
}

/// Flatten a JSON parameter object into query pairs.
///
/// Strings are used verbatim, other scalars use their JSON representation; `null` values
/// are skipped. Anything but an object (or `null`) is rejected.
pub fn query_pairs(params: &Value) -> Result<Vec<(String, String)>, FetchError> {
    match params {
        Value::Null => Ok(Vec::new()),
        Value::Object(map) => map
            .iter()
            .filter(|(_, v)| !v.is_null())
            .map(|(k, v)| match v {
                Value::String(s) => Ok((k.clone(), s.clone())),
                Value::Bool(_) | Value::Number(_) => Ok((k.clone(), v.to_string())),
                _ => Err(FetchError::InvalidRequest(format!(
                    "query parameter '{k}' must be a scalar"
                ))),
            })
            .collect(),
        other => Err(FetchError::InvalidRequest(format!(
            "parameters must be an object, got {other}"
        ))),
    }
}
