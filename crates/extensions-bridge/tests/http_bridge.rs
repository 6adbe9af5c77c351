use std::collections::HashMap;
use std::net::SocketAddr;

use axum::extract::Query;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use extensions_bridge::{
    BridgeError, BridgeRequest, HttpFetchBridge, MessageHandler, RequestPrimitive,
};
use omnitime_core_types::{DebugLog, ReportPayload, TimeEntry};
use serde_json::json;

async fn report(headers: HeaderMap, Query(params): Query<HashMap<String, String>>) -> Response {
    if headers.get("api-key").and_then(|v| v.to_str().ok()) != Some("secret") {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    if headers.get("accept").and_then(|v| v.to_str().ok()) != Some("application/json") {
        return StatusCode::NOT_ACCEPTABLE.into_response();
    }
    Json(json!({
        "tracked_time": [{"user": "alice", "time_spent": 125}],
        "total_sum": 125,
        "source": params.get("source"),
    }))
    .into_response()
}

async fn spawn_api() -> SocketAddr {
    let app = Router::new()
        .route("/report", get(report))
        .route("/broken", get(|| async { "<html>not json</html>" }))
        .route(
            "/down",
            get(|| async { StatusCode::SERVICE_UNAVAILABLE.into_response() }),
        );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

#[tokio::test]
async fn fetch_sends_key_and_parses_payload() {
    let addr = spawn_api().await;
    let bridge = HttpFetchBridge::new().unwrap();

    let url = format!("http://{addr}/report?source=https%3A%2F%2Fgitlab.example.com");
    let response = bridge
        .send(BridgeRequest::fetch_time_data(url, "secret"))
        .await
        .unwrap();
    assert!(response.success);
    assert_eq!(
        response.data.as_ref().unwrap()["source"],
        "https://gitlab.example.com"
    );
    assert_eq!(
        response.into_result().unwrap(),
        ReportPayload::new(vec![TimeEntry::new("alice", 125)], 125)
    );
}

#[tokio::test]
async fn wrong_key_surfaces_status() {
    let addr = spawn_api().await;
    let bridge = HttpFetchBridge::new()
        .unwrap()
        .with_log(DebugLog::new(true));

    let err = bridge
        .fetch(&format!("http://{addr}/report"), "wrong")
        .await
        .unwrap_err();
    assert_eq!(err, BridgeError::Status(401));
    assert_eq!(err.to_string(), "HTTP error! status: 401");
}

#[tokio::test]
async fn non_success_status_becomes_failure_response() {
    let addr = spawn_api().await;
    let bridge = HttpFetchBridge::new().unwrap();

    let response = bridge
        .handle(BridgeRequest::fetch_time_data(
            format!("http://{addr}/down"),
            "secret",
        ))
        .await;
    assert!(!response.success);
    assert_eq!(response.error.as_deref(), Some("HTTP error! status: 503"));
}

#[tokio::test]
async fn unparseable_body_is_decode_error() {
    let addr = spawn_api().await;
    let bridge = HttpFetchBridge::new().unwrap();

    let err = bridge
        .fetch(&format!("http://{addr}/broken"), "secret")
        .await
        .unwrap_err();
    assert!(matches!(err, BridgeError::Decode(_)));
}

#[tokio::test]
async fn unreachable_host_is_http_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let bridge = HttpFetchBridge::new().unwrap();

    let err = bridge
        .fetch(&format!("http://{addr}/report"), "secret")
        .await
        .unwrap_err();
    assert!(matches!(err, BridgeError::Http(_)));
}

#[tokio::test]
async fn other_actions_are_refused() {
    let bridge = HttpFetchBridge::new().unwrap();
    let mut request = BridgeRequest::fetch_time_data("http://127.0.0.1:9/", "secret");
    request.action = "DELETE_EVERYTHING".to_string();

    let response = bridge.handle(request).await;
    assert!(!response.success);
    assert_eq!(
        response.error.as_deref(),
        Some("unsupported action: DELETE_EVERYTHING")
    );
}
