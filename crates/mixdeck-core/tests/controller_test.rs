#![allow(clippy::unwrap_used)]
// Integration tests for `Controller` against a wiremock backend.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::{json, Value};
use url::Url;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use mixdeck_core::{
    ConnectivityState, ControlChanges, ControlValue, ControlView, Controller, ControllerConfig,
    FailureHook, RangePolicy, UpdateFailure, UpdateOutcome, UpdateSink, WidgetView,
};

// ── Helpers ─────────────────────────────────────────────────────────

fn live_controls() -> Value {
    json!([
        { "id": "master", "name": "Master", "type": "INT", "value": 60,
          "min": 0, "max": 100, "isMuted": false, "icon": "speaker" },
        { "id": "mic", "name": "Input Source", "type": "ENUM", "value": "Line In",
          "options": ["Line In", "Mic In"], "isMuted": false, "icon": "mic" },
        { "id": "loopback", "name": "Loopback", "type": "BOOL", "value": 0 }
    ])
}

fn config_for(server: &MockServer) -> ControllerConfig {
    ControllerConfig::new(Url::parse(&format!("{}/api", server.uri())).unwrap())
}

async fn serve_controls(server: &MockServer, body: &Value) {
    Mock::given(method("GET"))
        .and(path("/api/controls"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

async fn connected(server: &MockServer) -> Controller {
    serve_controls(server, &live_controls()).await;
    let ctrl = Controller::new(config_for(server)).unwrap();
    assert_eq!(ctrl.load().await, ConnectivityState::Connected);
    ctrl
}

fn value_of(ctrl: &Controller, id: &str) -> ControlValue {
    ctrl.control(id).unwrap().kind.value()
}

fn recording_hook() -> (FailureHook, Arc<Mutex<Vec<(String, Option<u16>)>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let hook: FailureHook = Arc::new(move |f: &UpdateFailure| {
        sink.lock().unwrap().push((f.control_id.clone(), f.error.status()));
    });
    (hook, seen)
}

// ── Initial load ────────────────────────────────────────────────────

#[tokio::test]
async fn test_offline_load_enters_simulation_mode() {
    let config = ControllerConfig::new(Url::parse("http://127.0.0.1:9/api").unwrap());
    let ctrl = Controller::new(config).unwrap();
    assert_eq!(ctrl.connectivity_state(), ConnectivityState::Loading);

    let state = ctrl.load().await;

    assert_eq!(state, ConnectivityState::Simulated);
    let ids: Vec<_> = ctrl.controls_snapshot().iter().map(|c| c.id.clone()).collect();
    assert_eq!(ids, vec!["master", "headphone", "pcm", "mic"]);
    assert_eq!(value_of(&ctrl, "master"), ControlValue::Int(75));
    assert!(ctrl.store().last_load().is_some());
}

#[tokio::test]
async fn test_server_error_enters_simulation_mode() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/controls"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let ctrl = Controller::new(config_for(&server)).unwrap();
    assert_eq!(ctrl.load().await, ConnectivityState::Simulated);
    assert_eq!(ctrl.controls_snapshot().len(), 4);
}

#[tokio::test]
async fn test_malformed_body_enters_simulation_mode() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/controls"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{\"controls\": []}"))
        .mount(&server)
        .await;

    let ctrl = Controller::new(config_for(&server)).unwrap();
    assert_eq!(ctrl.load().await, ConnectivityState::Simulated);
}

#[tokio::test]
async fn test_live_load_shows_enum_selection() {
    let server = MockServer::start().await;
    let ctrl = connected(&server).await;

    assert_eq!(ctrl.controls_snapshot().len(), 3);
    let view = ControlView::of(&ctrl.control("mic").unwrap());
    match view.widget {
        WidgetView::Selector { options, selected, value } => {
            assert_eq!(options, vec!["Line In", "Mic In"]);
            assert_eq!(selected, Some(0));
            assert_eq!(value, "Line In");
        }
        other => panic!("expected selector, got {other:?}"),
    }
}

#[tokio::test]
async fn test_empty_list_is_connected() {
    let server = MockServer::start().await;
    serve_controls(&server, &json!([])).await;

    let ctrl = Controller::new(config_for(&server)).unwrap();
    assert_eq!(ctrl.load().await, ConnectivityState::Connected);
    assert!(ctrl.controls_snapshot().is_empty());
}

#[tokio::test]
async fn test_range_policy_applies_to_backend_records() {
    let server = MockServer::start().await;
    serve_controls(
        &server,
        &json!([{ "id": "boost", "type": "INT", "value": 20, "min": 0, "max": 3 }]),
    )
    .await;

    let mut config = config_for(&server);
    config.range_policy = RangePolicy::Clamp;
    let ctrl = Controller::new(config).unwrap();
    ctrl.load().await;
    assert_eq!(value_of(&ctrl, "boost"), ControlValue::Int(3));

    let mut config = config_for(&server);
    config.range_policy = RangePolicy::Reject;
    let ctrl = Controller::new(config).unwrap();
    assert_eq!(ctrl.load().await, ConnectivityState::Connected);
    assert!(ctrl.control("boost").is_none());
}

// ── Updates ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_simulated_update_is_local_only() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/controls"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let ctrl = Controller::new(config_for(&server)).unwrap();
    assert_eq!(ctrl.load().await, ConnectivityState::Simulated);

    let outcome = ctrl.apply_update("pcm", ControlChanges::level(50));

    assert_eq!(outcome, UpdateOutcome::Local);
    assert_eq!(value_of(&ctrl, "pcm"), ControlValue::Int(50));
    assert_eq!(ctrl.pending_updates(), 0);
}

#[tokio::test]
async fn test_unknown_id_is_a_silent_no_op() {
    let server = MockServer::start().await;
    let ctrl = connected(&server).await;
    let mut stream = ctrl.controls();
    let before = ctrl.controls_snapshot();

    let outcome = ctrl.apply_update("nonexistent", ControlChanges::level(10));

    assert_eq!(outcome, UpdateOutcome::Unknown);
    assert!(Arc::ptr_eq(&before, &ctrl.controls_snapshot()));
    let changed = tokio::time::timeout(Duration::from_millis(50), stream.changed()).await;
    assert!(changed.is_err(), "unknown id must not notify subscribers");
}

#[tokio::test]
async fn test_connected_update_is_optimistic_and_propagated() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/controls/master"))
        .and(body_json(json!({ "value": 30 })))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(100)))
        .expect(1)
        .mount(&server)
        .await;
    let ctrl = connected(&server).await;

    let outcome = ctrl.apply_update("master", ControlChanges::level(30));

    assert_eq!(outcome, UpdateOutcome::Propagating);
    // Visible before the backend has answered.
    assert_eq!(value_of(&ctrl, "master"), ControlValue::Int(30));

    ctrl.wait_idle().await;
    assert_eq!(ctrl.pending_updates(), 0);
}

#[tokio::test]
async fn test_update_is_clamped_before_propagation() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/controls/master"))
        .and(body_json(json!({ "value": 100 })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    let ctrl = connected(&server).await;

    ctrl.apply_update("master", ControlChanges::level(150));
    ctrl.wait_idle().await;

    assert_eq!(value_of(&ctrl, "master"), ControlValue::Int(100));
}

#[tokio::test]
async fn test_switch_mute_is_never_sent() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    let ctrl = connected(&server).await;

    let outcome = ctrl.apply_update("loopback", ControlChanges::muted(true));

    assert_eq!(outcome, UpdateOutcome::Local);
    assert!(!ctrl.control("loopback").unwrap().is_muted);
}

#[tokio::test]
async fn test_failed_update_keeps_local_state_and_reports() {
    let server = MockServer::start().await;
    serve_controls(&server, &live_controls()).await;
    Mock::given(method("POST"))
        .and(path("/api/controls/mic"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let (hook, seen) = recording_hook();
    let ctrl = Controller::with_failure_hook(config_for(&server), hook).unwrap();
    ctrl.load().await;

    let outcome = ctrl.apply_update("mic", ControlChanges::text("Mic In"));
    assert_eq!(outcome, UpdateOutcome::Propagating);
    ctrl.wait_idle().await;

    assert_eq!(value_of(&ctrl, "mic"), ControlValue::Text("Mic In".into()));
    assert_eq!(ctrl.connectivity_state(), ConnectivityState::Connected);
    assert_eq!(*seen.lock().unwrap(), vec![("mic".to_string(), Some(500))]);
}

#[tokio::test]
async fn test_queued_updates_coalesce_and_last_value_wins() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/controls/master"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(50)))
        .mount(&server)
        .await;
    let ctrl = connected(&server).await;

    ctrl.apply_update("master", ControlChanges::level(10));
    ctrl.apply_update("master", ControlChanges::level(20));
    ctrl.apply_update("master", ControlChanges::muted(true));
    ctrl.apply_update("master", ControlChanges::level(30));
    ctrl.wait_idle().await;

    let posts: Vec<Value> = server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|r| r.method.as_str() == "POST")
        .map(|r| serde_json::from_slice(&r.body).unwrap())
        .collect();

    assert!(!posts.is_empty() && posts.len() <= 4);
    assert_eq!(posts.last().unwrap()["value"], json!(30));
    assert!(posts.iter().any(|p| p["isMuted"] == json!(true)));
}

#[tokio::test]
async fn test_update_sink_routes_to_controller() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    let ctrl = connected(&server).await;
    let sink: &dyn UpdateSink = &ctrl;

    assert_eq!(
        sink.apply_update("loopback", ControlChanges::level(1)),
        UpdateOutcome::Propagating
    );
    ctrl.wait_idle().await;
    assert_eq!(value_of(&ctrl, "loopback"), ControlValue::Int(1));
}

// ── Retry & lifecycle ───────────────────────────────────────────────

#[tokio::test]
async fn test_retry_passes_through_loading() {
    let server = MockServer::start().await;
    serve_controls(&server, &live_controls()).await;
    let ctrl = Controller::new(config_for(&server)).unwrap();

    ctrl.start().await;
    assert_eq!(ctrl.wait_settled().await, ConnectivityState::Connected);

    ctrl.retry();
    assert_eq!(ctrl.connectivity_state(), ConnectivityState::Loading);
    assert_eq!(ctrl.wait_settled().await, ConnectivityState::Connected);

    ctrl.shutdown().await;
}

#[tokio::test]
async fn test_retry_recovers_from_simulation() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/controls"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    serve_controls(&server, &live_controls()).await;

    let ctrl = Controller::new(config_for(&server)).unwrap();
    ctrl.start().await;
    assert_eq!(ctrl.wait_settled().await, ConnectivityState::Simulated);
    assert!(ctrl.control("pcm").is_some());

    ctrl.retry();
    assert_eq!(ctrl.wait_settled().await, ConnectivityState::Connected);
    assert!(ctrl.control("pcm").is_none());
    assert_eq!(value_of(&ctrl, "master"), ControlValue::Int(60));

    ctrl.shutdown().await;
}

#[tokio::test]
async fn test_retry_during_load_discards_stale_result() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/controls"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(live_controls())
                .set_delay(Duration::from_millis(200)),
        )
        .mount(&server)
        .await;

    let ctrl = Controller::new(config_for(&server)).unwrap();
    let mut states = ctrl.connectivity();
    ctrl.start().await;
    tokio::time::sleep(Duration::from_millis(50)).await;

    ctrl.retry();
    assert_eq!(ctrl.wait_settled().await, ConnectivityState::Connected);

    // The first load settled while the retry was pending and published nothing.
    let gets = server.received_requests().await.unwrap().len();
    assert_eq!(gets, 2);
    assert!(states.has_changed().unwrap());
    assert_eq!(*states.borrow_and_update(), ConnectivityState::Connected);

    ctrl.shutdown().await;
}

#[tokio::test]
async fn test_retry_without_driver_is_ignored() {
    let server = MockServer::start().await;
    let ctrl = connected(&server).await;

    ctrl.retry();

    assert_eq!(ctrl.connectivity_state(), ConnectivityState::Connected);
}

#[tokio::test]
async fn test_shutdown_stops_driver() {
    let server = MockServer::start().await;
    serve_controls(&server, &live_controls()).await;
    let ctrl = Controller::new(config_for(&server)).unwrap();
    ctrl.start().await;
    ctrl.wait_settled().await;

    ctrl.shutdown().await;
    ctrl.retry();

    assert_eq!(ctrl.connectivity_state(), ConnectivityState::Connected);
}

#[tokio::test]
async fn test_control_stream_sees_updates() {
    let server = MockServer::start().await;
    let ctrl = connected(&server).await;
    let mut stream = ctrl.controls();
    assert_eq!(stream.current().len(), 3);

    ctrl.apply_update("master", ControlChanges::muted(true));

    let snap = stream.changed().await.unwrap();
    let master = snap.iter().find(|c| c.id == "master").unwrap();
    assert!(master.is_muted);
}
