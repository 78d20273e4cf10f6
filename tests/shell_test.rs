//! Integration tests for connectivity gating of the shell.

use nzyme_dashboard::config::PollingConfig;
use nzyme_dashboard::connectivity::ConnectivityState;
use nzyme_dashboard::context::AppContext;
use nzyme_dashboard::fetch::mock::MockBackend;
use nzyme_dashboard::fetch::{routes, Method};
use nzyme_dashboard::shell::{Body, Route, Shell, NOT_CONNECTED_TEXT};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

const TRACKER_PATH: &str = "/api/trackers/show/t1";

fn backend() -> MockBackend {
    let backend = MockBackend::new();
    backend.respond(Method::Get, routes::PING, Ok(json!({})));
    backend.respond(
        Method::Get,
        TRACKER_PATH,
        Ok(json!({"name": "t1", "rssi": 255, "state": "ONLINE", "version": "1.2.0"})),
    );
    backend.respond(
        Method::Get,
        routes::SYSTEM_STATUS,
        Ok(json!({"status": [{"name": "RUNNING", "active": true}]})),
    );
    backend
}

fn context(backend: &MockBackend, initial: ConnectivityState) -> AppContext {
    AppContext::new(Arc::new(backend.clone()), PollingConfig::default(), initial)
}

async fn settle() {
    tokio::time::sleep(Duration::from_millis(10)).await;
}

#[tokio::test(start_paused = true)]
async fn test_disconnected_shell_stops_all_page_traffic() {
    let backend = backend();
    let ctx = context(&backend, ConnectivityState::Connected);
    let mut shell = Shell::for_context(&ctx, "/bandits/trackers/show/t1");

    settle().await;
    assert_eq!(backend.request_count(TRACKER_PATH), 1);
    match shell.frame().body {
        Body::Page { route, content, .. } => {
            assert_eq!(route, Route::TrackerDetails { name: "t1".into() });
            assert!(content.contains("Signal Strength: 100%"));
        }
        other => panic!("expected page, got {other:?}"),
    }

    shell.apply(ConnectivityState::Disconnected);
    assert!(shell.page().is_none());
    assert_eq!(ctx.stores().trackers.subscriber_count(), 0);

    let frame = shell.frame();
    assert!(matches!(frame.body, Body::NotConnected { .. }));
    assert!(frame.to_string().contains(NOT_CONNECTED_TEXT));

    tokio::time::sleep(Duration::from_secs(120)).await;
    assert_eq!(backend.request_count(TRACKER_PATH), 1);

    // Reconnect remounts the remembered route
    shell.apply(ConnectivityState::Connected);
    settle().await;
    assert_eq!(backend.request_count(TRACKER_PATH), 2);
    assert!(matches!(shell.frame().body, Body::Page { .. }));
}

#[tokio::test(start_paused = true)]
async fn test_shell_follows_connectivity_poller() {
    let backend = backend();
    let ctx = context(&backend, ConnectivityState::Unknown);
    let mut rx = ctx.connectivity().subscribe();
    let mut shell = Shell::for_context(&ctx, "/system");
    assert_eq!(shell.frame().body, Body::Loading);

    let _ping = ctx.start_connectivity_poller();
    rx.changed().await.unwrap();
    shell.apply(*rx.borrow_and_update());
    assert_eq!(shell.state(), ConnectivityState::Connected);

    settle().await;
    assert!(shell.frame().to_string().contains("[x] RUNNING"));

    backend.set_offline(true);
    rx.changed().await.unwrap();
    shell.apply(*rx.borrow_and_update());
    assert_eq!(shell.state(), ConnectivityState::Disconnected);

    match shell.frame().body {
        Body::NotConnected { reason } => {
            assert!(reason.unwrap().contains("not running"));
        }
        other => panic!("expected placeholder, got {other:?}"),
    }

    let status_requests = backend.request_count(routes::SYSTEM_STATUS);
    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(backend.request_count(routes::SYSTEM_STATUS), status_requests);
    // Pings keep going while disconnected, without repeating the same state
    assert!(backend.request_count(routes::PING) > 2);
    assert!(!rx.has_changed().unwrap());

    backend.set_offline(false);
    rx.changed().await.unwrap();
    let recovered = *rx.borrow_and_update();
    assert_eq!(recovered, ConnectivityState::Connected);
    shell.apply(recovered);
    assert_eq!(shell.state(), ConnectivityState::Connected);
    assert!(shell.page().is_some());

    settle().await;
    assert!(backend.request_count(routes::SYSTEM_STATUS) > status_requests);
}

#[tokio::test]
async fn test_unknown_route_renders_not_found() {
    let backend = backend();
    let ctx = context(&backend, ConnectivityState::Connected);
    let shell = Shell::for_context(&ctx, "/bssids/nowhere");

    match shell.frame().body {
        Body::Page { title, content, .. } => {
            assert_eq!(title, "Not Found");
            assert!(content.contains("/bssids/nowhere"));
        }
        other => panic!("expected page, got {other:?}"),
    }
    assert_eq!(backend.total_requests(), 0);
}
