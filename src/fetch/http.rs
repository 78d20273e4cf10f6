//! reqwest-based fetcher for the nzyme REST interface.

use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

use super::{query_pairs, Fetcher, Method};
use crate::backend::BackendAddress;
use crate::error::{DashboardError, DashboardResult, FetchError};

/// HTTP fetcher bound to one backend base URL.
///
/// The per-request timeout is enforced by the reqwest client; a timed out request
/// surfaces as [`FetchError::Timeout`].
#[derive(Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    base: BackendAddress,
}

impl HttpFetcher {
    /// Build a fetcher for `base` with the given request timeout.
    pub fn new(base: BackendAddress, timeout: Duration) -> DashboardResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DashboardError::HttpClient(e.to_string()))?;
        Ok(Self { client, base })
    }

    /// Base URL requests are resolved against.
    #[must_use]
    pub fn base(&self) -> &BackendAddress {
        &self.base
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn request(&self, method: Method, path: &str, params: Value) -> Result<Value, FetchError> {
        let url = self.base.join(path);
        tracing::debug!("{} {}", method, url);

        let builder = match method {
            Method::Get => self.client.get(url).query(&query_pairs(&params)?),
            Method::Delete => self.client.delete(url).query(&query_pairs(&params)?),
            Method::Post if params.is_null() => self.client.post(url),
            Method::Post => self.client.post(url).json(&params),
        };

        let response = builder.send().await.map_err(classify)?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                path: path.to_string(),
            });
        }

        let body = response.bytes().await.map_err(classify)?;
        if body.is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_slice(&body)?)
    }
}

fn classify(error: reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::Timeout(error.to_string())
    } else if error.is_decode() {
        FetchError::Decode(error.to_string())
    } else {
        FetchError::Transport(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::AddressSource;

    #[tokio::test]
    async fn test_unreachable_backend_is_transport_error() {
        // Port 9 (discard) on localhost is closed on any sane test host
        let base = BackendAddress::parse("127.0.0.1:9", AddressSource::Config).unwrap();
        let fetcher = HttpFetcher::new(base, Duration::from_secs(2)).unwrap();

        let err = fetcher
            .request(Method::Get, "/api/ping", Value::Null)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            FetchError::Transport(_) | FetchError::Timeout(_)
        ));
    }

    #[tokio::test]
    async fn test_rejects_non_object_query() {
        let base = BackendAddress::parse("127.0.0.1:9", AddressSource::Config).unwrap();
        let fetcher = HttpFetcher::new(base, Duration::from_secs(1)).unwrap();

        let err = fetcher
            .request(Method::Get, "/api/ping", serde_json::json!([1, 2]))
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::InvalidRequest(_)));
    }
}
