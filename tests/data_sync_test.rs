//! Integration tests for the store / action / poller data flow.

use nzyme_dashboard::actions::ActionOutcome;
use nzyme_dashboard::config::PollingConfig;
use nzyme_dashboard::connectivity::ConnectivityState;
use nzyme_dashboard::context::AppContext;
use nzyme_dashboard::error::FetchError;
use nzyme_dashboard::fetch::mock::{GatedFetcher, MockBackend};
use nzyme_dashboard::fetch::Method;
use nzyme_dashboard::models::Tracker;
use nzyme_dashboard::poller::Poller;
use nzyme_dashboard::views::{Page, StoreView, TrackerDetailsPage};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use std::time::Duration;

const TRACKER_PATH: &str = "/api/trackers/show/t1";

fn context(backend: &MockBackend) -> AppContext {
    AppContext::new(
        Arc::new(backend.clone()),
        PollingConfig::default(),
        ConnectivityState::Connected,
    )
}

fn tracker_json(rssi: i32) -> Value {
    json!({
        "name": "t1",
        "version": "1.0.0",
        "rssi": rssi,
        "state": "ONLINE",
        "bandit_count": 2,
        "has_pending_tracking_requests": false,
        "contacts": []
    })
}

/// Let spawned fetch tasks run to completion.
async fn settle() {
    tokio::time::sleep(Duration::from_millis(10)).await;
}

#[tokio::test]
async fn test_issue_order_wins_over_completion_order() {
    let (fetcher, mut gate) = GatedFetcher::new();
    let ctx = AppContext::new(
        Arc::new(fetcher),
        PollingConfig::default(),
        ConnectivityState::Connected,
    );

    let first = tokio::spawn({
        let actions = ctx.trackers();
        async move { actions.find_one("t1").await }
    });
    let a = gate.recv().await.unwrap();

    let second = tokio::spawn({
        let actions = ctx.trackers();
        async move { actions.find_one("t1").await }
    });
    let b = gate.recv().await.unwrap();
    assert_eq!(a.request.path, TRACKER_PATH);
    assert_eq!(b.request.path, TRACKER_PATH);

    // Newer request resolves first
    b.respond(Ok(tracker_json(180)));
    assert_eq!(second.await.unwrap(), ActionOutcome::Applied);

    a.respond(Ok(tracker_json(150)));
    assert_eq!(first.await.unwrap(), ActionOutcome::Stale);

    let tracker = ctx.stores().trackers.get(&"t1".to_string()).unwrap();
    assert_eq!(tracker.rssi, 180);
}

#[tokio::test]
async fn test_in_order_responses_both_apply() {
    let (fetcher, mut gate) = GatedFetcher::new();
    let ctx = AppContext::new(
        Arc::new(fetcher),
        PollingConfig::default(),
        ConnectivityState::Connected,
    );

    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let _sub = ctx
        .stores()
        .trackers
        .subscribe(move |_, t| sink.lock().unwrap().push(t.rssi));

    let first = tokio::spawn({
        let actions = ctx.trackers();
        async move { actions.find_one("t1").await }
    });
    let a = gate.recv().await.unwrap();
    let second = tokio::spawn({
        let actions = ctx.trackers();
        async move { actions.find_one("t1").await }
    });
    let b = gate.recv().await.unwrap();

    a.respond(Ok(tracker_json(100)));
    assert!(first.await.unwrap().is_applied());
    b.respond(Ok(tracker_json(110)));
    assert!(second.await.unwrap().is_applied());

    assert_eq!(*seen.lock().unwrap(), vec![100, 110]);
}

#[tokio::test]
async fn test_get_is_none_until_success_and_survives_failures() {
    let backend = MockBackend::new();
    let ctx = context(&backend);
    let trackers = ctx.trackers();
    let key = "t1".to_string();

    backend.set_offline(true);
    assert!(matches!(
        trackers.find_one("t1").await,
        ActionOutcome::Failed(FetchError::Transport(_))
    ));
    assert!(ctx.stores().trackers.get(&key).is_none());

    backend.set_offline(false);
    backend.respond(Method::Get, TRACKER_PATH, Ok(tracker_json(200)));
    assert!(trackers.find_one("t1").await.is_applied());

    backend.respond(
        Method::Get,
        TRACKER_PATH,
        Err(FetchError::Status {
            status: 500,
            path: TRACKER_PATH.into(),
        }),
    );
    assert!(matches!(trackers.find_one("t1").await, ActionOutcome::Failed(_)));

    assert_eq!(ctx.stores().trackers.get(&key).unwrap().rssi, 200);
    // Failed reads surface as transient notices
    assert_eq!(ctx.notifications().active().len(), 2);
}

#[tokio::test]
async fn test_subscriber_receives_full_replacement() {
    let backend = MockBackend::new();
    let ctx = context(&backend);

    let seen: Arc<Mutex<Vec<Tracker>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let _sub = ctx
        .stores()
        .trackers
        .subscribe(move |_, t| sink.lock().unwrap().push(Tracker::clone(t)));

    backend.respond(Method::Get, TRACKER_PATH, Ok(tracker_json(200)));
    ctx.trackers().find_one("t1").await;

    backend.respond(Method::Get, TRACKER_PATH, Ok(json!({"rssi": 180})));
    ctx.trackers().find_one("t1").await;

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 2);
    assert_eq!(seen[0].bandit_count, 2);
    assert_eq!(
        seen[1],
        Tracker {
            rssi: 180,
            ..Default::default()
        }
    );
}

#[tokio::test(start_paused = true)]
async fn test_stopped_page_poller_issues_no_more_requests() {
    let backend = MockBackend::new();
    backend.respond(Method::Get, TRACKER_PATH, Ok(tracker_json(200)));
    let ctx = context(&backend);

    let page = TrackerDetailsPage::mount(&ctx, "t1");
    settle().await;
    assert_eq!(backend.request_count(TRACKER_PATH), 1);
    assert!(page.render().contains("Signal Strength: 78%"));

    let refresh = ctx.polling().refresh_interval();
    tokio::time::sleep(refresh).await;
    settle().await;
    assert_eq!(backend.request_count(TRACKER_PATH), 2);

    for handle in page.poll_handles() {
        Poller::stop(handle);
    }
    tokio::time::sleep(refresh * 10).await;
    assert_eq!(backend.request_count(TRACKER_PATH), 2);

    drop(page);
    assert_eq!(ctx.stores().trackers.subscriber_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_two_views_with_different_cadences_share_a_store() {
    let backend = MockBackend::new();
    backend.respond(Method::Get, TRACKER_PATH, Ok(tracker_json(100)));
    let ctx = context(&backend);

    let poll = |label: &str, every: Duration| {
        let actions = ctx.trackers();
        Poller::start(label, every, move || {
            let actions = actions.clone();
            async move { actions.find_one("t1").await }
        })
    };

    let store = &ctx.stores().trackers;
    let fast = StoreView::bind(store, "t1".to_string(), Arc::clone(ctx.redraw()))
        .with_poll(poll("fast", Duration::from_secs(5)));
    let slow = StoreView::bind(store, "t1".to_string(), Arc::clone(ctx.redraw()))
        .with_poll(poll("slow", Duration::from_secs(15)));

    let rssi = |view: &StoreView<String, Tracker>| view.state().ready().map(|t| t.rssi);

    settle().await;
    assert_eq!(rssi(&fast), Some(100));
    assert_eq!(rssi(&slow), Some(100));

    // Only the fast poller fires at 5s, the slow view still sees the result
    backend.respond(Method::Get, TRACKER_PATH, Ok(tracker_json(120)));
    tokio::time::sleep(Duration::from_secs(5)).await;
    settle().await;
    assert_eq!(rssi(&fast), Some(120));
    assert_eq!(rssi(&slow), Some(120));

    backend.respond(Method::Get, TRACKER_PATH, Ok(tracker_json(140)));
    tokio::time::sleep(Duration::from_secs(10)).await;
    settle().await;
    assert_eq!(rssi(&fast), Some(140));
    assert_eq!(rssi(&slow), Some(140));

    // 0s: 2, 5s: 1, 10s: 1, 15s: 2
    assert_eq!(backend.request_count(TRACKER_PATH), 6);
}

#[tokio::test]
async fn test_results_after_teardown_are_dropped() {
    let (fetcher, mut gate) = GatedFetcher::new();
    let ctx = AppContext::new(
        Arc::new(fetcher),
        PollingConfig::default(),
        ConnectivityState::Connected,
    );
    let actions = ctx.trackers();

    let pending = tokio::spawn({
        let actions = actions.clone();
        async move { actions.find_one("t1").await }
    });
    let request = gate.recv().await.unwrap();

    drop(ctx);
    request.respond(Ok(tracker_json(50)));
    assert_eq!(pending.await.unwrap(), ActionOutcome::Detached);
}
