//! HTTP client tests against a local fake clock

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Query, RawQuery};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use ledclock::errors::ClockError;
use ledclock::events::EventBus;
use ledclock::http::client::{HttpClient, ResourceFetcher};
use ledclock::sync::orchestrator::{CycleOutcome, PollingOrchestrator, SyncOptions};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio_test::{assert_err, assert_ok};

fn fake_clock() -> Router {
    Router::new()
        .route("/api/v1/status", get(|| async { Json(json!({ "uptime": 42 })) }))
        .route(
            "/api/v1/config",
            get(|| async {
                Json(json!({
                    "brightness": { "type": "int", "value": 40 },
                    "mode24h": true
                }))
            }),
        )
        .route("/api/v1/leds", get(|| async { Json(json!({ "count": 32 })) }))
        .route("/api/v1/tasks", get(|| async { Json(json!([])) }))
        .route(
            "/api/v1/ota",
            get(|| async { Json(json!({ "success": true, "percentage": 0, "isInProgress": false })) }),
        )
        .route(
            "/api/v1/set",
            get(|Query(params): Query<HashMap<String, String>>| async move {
                Json(json!({ "success": true, "params": params }))
            })
            .post(|Json(body): Json<Value>| async move { Json(json!({ "success": true, "body": body })) }),
        )
        .route(
            "/api/v1/broken",
            get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
        )
        .route("/api/v1/garbled", get(|| async { "{not json" }))
        .route(
            "/api/v1/slow",
            get(|| async {
                tokio::time::sleep(Duration::from_millis(500)).await;
                Json(json!({ "late": true }))
            }),
        )
        .route(
            "/api/v1/raw",
            get(|RawQuery(query): RawQuery| async move { Json(json!({ "query": query })) }),
        )
        .route("/api/v1/echo", post(|Json(body): Json<Value>| async move { Json(body) }))
}

async fn spawn_fake_clock() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, fake_clock()).await.unwrap();
    });
    addr
}

fn base_url(addr: SocketAddr) -> String {
    format!("http://{}/api/v1", addr)
}

#[tokio::test]
async fn test_get_json() {
    let addr = spawn_fake_clock().await;
    let client = HttpClient::new(&base_url(addr)).unwrap();

    let body = assert_ok!(client.get("/status", &[]).await);
    assert_eq!(body, json!({ "uptime": 42 }));
}

#[tokio::test]
async fn test_concurrent_requests() {
    let addr = spawn_fake_clock().await;
    let client = HttpClient::new(&base_url(addr)).unwrap();

    let (leds, tasks) = futures::future::join(client.get("/leds", &[]), client.get("/tasks", &[])).await;
    assert_eq!(assert_ok!(leds), json!({ "count": 32 }));
    assert_eq!(assert_ok!(tasks), json!([]));
}

#[tokio::test]
async fn test_error_status_is_network_error() {
    let addr = spawn_fake_clock().await;
    let client = HttpClient::new(&base_url(addr)).unwrap();

    let err = assert_err!(client.get("/broken", &[]).await);
    match err {
        ClockError::NetworkError(msg) => {
            assert!(msg.contains("500"));
            assert!(msg.contains("boom"));
        }
        other => panic!("unexpected error: {other:?}"),
    }

    let err = assert_err!(client.get("/missing", &[]).await);
    assert!(matches!(err, ClockError::NetworkError(_)));
}

#[tokio::test]
async fn test_invalid_json_is_parse_error() {
    let addr = spawn_fake_clock().await;
    let client = HttpClient::new(&base_url(addr)).unwrap();

    let err = assert_err!(client.get("/garbled", &[]).await);
    assert!(matches!(err, ClockError::ParseError(_)));
}

#[tokio::test]
async fn test_timeout_aborts_request() {
    let addr = spawn_fake_clock().await;
    let client = HttpClient::with_timeout(&base_url(addr), Duration::from_millis(100)).unwrap();

    let err = assert_err!(client.get("/slow", &[]).await);
    assert!(matches!(err, ClockError::Timeout(100)));

    // the client stays usable after an aborted request
    assert_ok!(client.get("/status", &[]).await);
}

#[tokio::test]
async fn test_connection_refused() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = HttpClient::new(&base_url(addr)).unwrap();
    let err = assert_err!(client.get("/status", &[]).await);
    assert!(matches!(err, ClockError::NetworkError(_)));
    assert!(err.is_transport());
}

#[tokio::test]
async fn test_query_reaches_device_decoded() {
    let addr = spawn_fake_clock().await;
    let client = HttpClient::new(&base_url(addr)).unwrap();

    let query = vec![
        ("hostname".to_string(), "my clock & co".to_string()),
        ("brightness".to_string(), "80".to_string()),
    ];
    let body = assert_ok!(client.get("/set", &query).await);
    assert_eq!(body["params"]["hostname"], "my clock & co");
    assert_eq!(body["params"]["brightness"], "80");
}

#[tokio::test]
async fn test_space_sent_as_percent_20() {
    let addr = spawn_fake_clock().await;
    let client = HttpClient::new(&base_url(addr)).unwrap();

    let query = vec![("hostname".to_string(), "clock one".to_string())];
    let body = assert_ok!(client.get("/raw", &query).await);
    assert_eq!(body["query"], "hostname=clock%20one");
}

#[tokio::test]
async fn test_post_json_body() {
    let addr = spawn_fake_clock().await;
    let client = HttpClient::new(&base_url(addr)).unwrap();

    let payload = json!({ "brightness": 80, "animation": "Rainbow" });
    let body = assert_ok!(client.post("/echo", &payload).await);
    assert_eq!(body, payload);
}

#[tokio::test]
async fn test_cycle_against_fake_clock() {
    let addr = spawn_fake_clock().await;
    let client = Arc::new(HttpClient::new(&base_url(addr)).unwrap());
    let options = SyncOptions {
        pacing_delay: Duration::from_millis(10),
        ..SyncOptions::default()
    };
    let orchestrator = PollingOrchestrator::new(client, Arc::new(EventBus::new()), options);

    assert_eq!(orchestrator.run_cycle().await, CycleOutcome::Completed);
    assert!(orchestrator.is_online());

    let snapshot = orchestrator.snapshot();
    assert_eq!(snapshot.status.unwrap().0["uptime"], 42);
    let config = snapshot.config.unwrap();
    assert_eq!(config["brightness"].kind, "int");
    assert_eq!(config["mode24h"].kind, "bool");

    let mut partial = std::collections::BTreeMap::new();
    partial.insert("brightness".to_string(), json!(80));
    let result = assert_ok!(orchestrator.set_config_json(&partial).await);
    assert!(result.success);
}
