//! In-memory fetchers for tests and offline demos.
//!
//! # Available Mocks
//!
//! - `MockBackend` - canned responses per `(method, path)`, optional latency, offline switch,
//!   and a request log
//! - `GatedFetcher` - every request is parked until the caller resolves it, which makes
//!   completion order fully controllable

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};

use super::{Fetcher, Method};
use crate::error::FetchError;

/// One request as seen by a mock fetcher.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    /// Request method
    pub method: Method,
    /// Request path
    pub path: String,
    /// Request parameters
    pub params: Value,
}

#[derive(Default)]
struct BackendState {
    routes: HashMap<(Method, String), Result<Value, FetchError>>,
    latency: HashMap<(Method, String), Duration>,
    offline: bool,
    log: Vec<RecordedRequest>,
}

/// Backend double with canned responses.
///
/// Unknown routes answer `404`. While offline every request fails with a transport error.
/// Latency uses `tokio::time::sleep`, so it cooperates with paused test time.
///
/// # Example
///
/// ```rust,ignore
/// let backend = MockBackend::new();
/// backend.respond(Method::Get, "/api/ping", Ok(json!({})));
/// backend.set_offline(true);
/// ```
#[derive(Clone, Default)]
pub struct MockBackend {
    state: Arc<Mutex<BackendState>>,
}

impl MockBackend {
    /// Create an online backend without routes.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut BackendState) -> R) -> R {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut state)
    }

    /// Set the response for a route, replacing any previous one.
    pub fn respond(&self, method: Method, path: &str, response: Result<Value, FetchError>) {
        self.with_state(|s| {
            s.routes.insert((method, path.to_string()), response);
        });
    }

    /// Delay every response on a route.
    pub fn set_latency(&self, method: Method, path: &str, latency: Duration) {
        self.with_state(|s| {
            s.latency.insert((method, path.to_string()), latency);
        });
    }

    /// Simulate the backend becoming unreachable (or reachable again).
    pub fn set_offline(&self, offline: bool) {
        self.with_state(|s| s.offline = offline);
    }

    /// All requests received so far, in arrival order.
    #[must_use]
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.with_state(|s| s.log.clone())
    }

    /// Number of requests received for a path (any method).
    #[must_use]
    pub fn request_count(&self, path: &str) -> usize {
        self.with_state(|s| s.log.iter().filter(|r| r.path == path).count())
    }

    /// Total number of requests received.
    #[must_use]
    pub fn total_requests(&self) -> usize {
        self.with_state(|s| s.log.len())
    }
}

#[async_trait]
impl Fetcher for MockBackend {
    async fn request(&self, method: Method, path: &str, params: Value) -> Result<Value, FetchError> {
        let key = (method, path.to_string());
        let latency = self.with_state(|s| {
            s.log.push(RecordedRequest {
                method,
                path: path.to_string(),
                params,
            });
            s.latency.get(&key).copied()
        });

        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }

        self.with_state(|s| {
            if s.offline {
                return Err(FetchError::Transport("connection refused".to_string()));
            }
            s.routes.get(&key).cloned().unwrap_or_else(|| {
                Err(FetchError::Status {
                    status: 404,
                    path: path.to_string(),
                })
            })
        })
    }
}

/// A request parked by a [`GatedFetcher`], waiting for the test to resolve it.
#[derive(Debug)]
pub struct PendingRequest {
    /// The request as issued
    pub request: RecordedRequest,
    reply: oneshot::Sender<Result<Value, FetchError>>,
}

impl PendingRequest {
    /// Complete the request. Returns `false` if the issuer is gone.
    pub fn respond(self, result: Result<Value, FetchError>) -> bool {
        self.reply.send(result).is_ok()
    }
}

/// Fetcher that parks each request until it is explicitly resolved.
///
/// Dropping a [`PendingRequest`] without responding fails the request with a transport error.
#[derive(Clone)]
pub struct GatedFetcher {
    tx: mpsc::UnboundedSender<PendingRequest>,
}

impl GatedFetcher {
    /// Create the fetcher and the receiving end that yields parked requests in issue order.
    #[must_use]
    pub fn new() -> (Self, mpsc::UnboundedReceiver<PendingRequest>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

#[async_trait]
impl Fetcher for GatedFetcher {
    async fn request(&self, method: Method, path: &str, params: Value) -> Result<Value, FetchError> {
        let (reply, rx) = oneshot::channel();
        let pending = PendingRequest {
            request: RecordedRequest {
                method,
                path: path.to_string(),
                params,
            },
            reply,
        };

        if self.tx.send(pending).is_err() {
            return Err(FetchError::Transport("gate closed".to_string()));
        }

        rx.await
            .unwrap_or_else(|_| Err(FetchError::Transport("request abandoned".to_string())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_mock_backend_routes_and_offline() {
        let backend = MockBackend::new();
        backend.respond(Method::Get, "/api/ping", Ok(json!({"ok": true})));

        let body = backend
            .request(Method::Get, "/api/ping", Value::Null)
            .await
            .unwrap();
        assert_eq!(body, json!({"ok": true}));

        let missing = backend
            .request(Method::Get, "/api/nothing", Value::Null)
            .await
            .unwrap_err();
        assert!(matches!(missing, FetchError::Status { status: 404, .. }));

        backend.set_offline(true);
        let offline = backend
            .request(Method::Get, "/api/ping", Value::Null)
            .await
            .unwrap_err();
        assert!(matches!(offline, FetchError::Transport(_)));

        assert_eq!(backend.request_count("/api/ping"), 2);
        assert_eq!(backend.total_requests(), 3);
    }

    #[tokio::test]
    async fn test_gated_fetcher_resolves_out_of_order() {
        let (fetcher, mut gate) = GatedFetcher::new();

        let first = tokio::spawn({
            let fetcher = fetcher.clone();
            async move { fetcher.request(Method::Get, "/a", Value::Null).await }
        });
        let second = tokio::spawn({
            let fetcher = fetcher.clone();
            async move { fetcher.request(Method::Get, "/b", Value::Null).await }
        });

        let a = gate.recv().await.unwrap();
        let b = gate.recv().await.unwrap();
        assert_eq!(a.request.path, "/a");
        assert_eq!(b.request.path, "/b");

        assert!(b.respond(Ok(json!(2))));
        assert_eq!(second.await.unwrap().unwrap(), json!(2));

        drop(a);
        assert!(matches!(
            first.await.unwrap(),
            Err(FetchError::Transport(_))
        ));
    }
}
