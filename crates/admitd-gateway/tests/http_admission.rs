//! End-to-end admission over the HTTP router.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

mod common;

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use admitd_core::protocol::Decision;
use admitd_gateway::router::build_router;
use admitd_gateway::store::CounterStore;
use common::{memory_state, state_with, DownStore};

async fn call(app: &Router, method: &str, uri: &str, body: Body) -> (StatusCode, Vec<u8>) {
    let req = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(body)
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    (status, bytes.to_vec())
}

async fn admit(app: &Router, body: Value) -> (StatusCode, Decision) {
    let (status, bytes) = call(app, "POST", "/validate", Body::from(body.to_string())).await;
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn scenario(method: &str) -> Value {
    json!({
        "method": method,
        "path": "/api/posts",
        "headers": { "X-Client-ID": "abc" },
        "query": {},
        "client_ip": "172.16.0.5",
        "config": {
            "max_requests_per_minute": 2,
            "required_headers": ["X-Client-ID"],
            "allowed_methods": ["GET", "POST"],
            "enable_diagnostics": true
        }
    })
}

#[tokio::test]
async fn third_call_in_window_is_rate_limited() {
    let (state, _) = memory_state();
    let app = build_router(state);

    for i in 1..=2 {
        let (status, d) = admit(&app, scenario("GET")).await;
        assert_eq!(status, StatusCode::OK);
        assert!(d.admit, "call {i}");
        assert_eq!(d.details["current_count"], json!(i));
    }

    let (status, d) = admit(&app, scenario("GET")).await;
    assert_eq!(status, StatusCode::OK, "verdicts travel in the body");
    assert!(!d.admit);
    assert_eq!(d.classification.unwrap().as_str(), "rate_limit_exceeded");
    assert_eq!(d.status_code, Some(429));
    assert_eq!(d.details["max_requests"], json!(2));
    assert!(d.details.contains_key("reset_in"));
}

#[tokio::test]
async fn policy_rejection_does_not_consume_budget() {
    let (state, store) = memory_state();
    let app = build_router(state);

    let (status, d) = admit(&app, scenario("DELETE")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(!d.admit);
    assert_eq!(d.classification.unwrap().as_str(), "method_not_allowed");
    assert_eq!(d.status_code, Some(405));
    assert_eq!(store.get("rate_limit:172.16.0.5").await.unwrap(), 0);

    let (_, d) = admit(&app, scenario("GET")).await;
    assert!(d.admit);
    assert_eq!(d.details["current_count"], json!(1));
}

#[tokio::test]
async fn missing_header_is_reported() {
    let (state, _) = memory_state();
    let app = build_router(state);

    let mut body = scenario("POST");
    body["headers"] = json!({ "x-client-id": "" });

    let (_, d) = admit(&app, body).await;
    assert!(!d.admit);
    assert_eq!(d.classification.unwrap().as_str(), "missing_header");
    assert_eq!(d.status_code, Some(400));
    assert_eq!(d.details["missing_header"], json!("X-Client-ID"));
}

#[tokio::test]
async fn admitted_decision_carries_diagnostic_info() {
    let (state, _) = memory_state();
    let app = build_router(state);

    let (_, d) = admit(&app, scenario("post")).await;
    assert!(d.admit);
    let info = d.diagnostic_info.expect("diagnostics enabled");
    assert_eq!(info["validated_method"], json!("post"));
    assert_eq!(info["client_key"], json!("rate_limit:172.16.0.5"));
    assert_eq!(info["path"], json!("/api/posts"));
    assert!(info["timestamp"].as_u64().unwrap() > 0);

    let mut quiet = scenario("GET");
    quiet["client_ip"] = json!("172.16.0.6");
    quiet["config"]["enable_diagnostics"] = json!(false);
    let (_, d) = admit(&app, quiet).await;
    assert!(d.admit);
    assert!(d.diagnostic_info.is_none());
}

#[tokio::test]
async fn default_policy_applies_without_config() {
    let (state, _) = memory_state();
    let app = build_router(state);

    // fixture default policy requires X-Client-ID and allows GET/POST
    let (_, d) = admit(&app, json!({ "method": "PUT", "client_ip": "10.9.9.9" })).await;
    assert_eq!(d.classification.unwrap().as_str(), "method_not_allowed");

    let (_, d) = admit(
        &app,
        json!({ "method": "GET", "client_ip": "10.9.9.9", "headers": { "X-Client-ID": "z" } }),
    )
    .await;
    assert!(d.admit);
}

#[tokio::test]
async fn malformed_body_is_bad_request() {
    let (state, _) = memory_state();
    let app = build_router(state.clone());

    let (status, bytes) = call(&app, "POST", "/validate", Body::from("{not json")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let d: Decision = serde_json::from_slice(&bytes).unwrap();
    assert!(!d.admit);
    assert_eq!(d.classification.unwrap().as_str(), "bad_request");
    assert_eq!(d.status_code, Some(400));
    assert!(!d.details.is_empty(), "denials always carry details");
    assert!(d.details["error"].as_str().unwrap().contains("invalid request format"));

    let (status, bytes) = call(&app, "POST", "/validate", Body::from(r#"{"method":"GET"}"#)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let d: Decision = serde_json::from_slice(&bytes).unwrap();
    assert!(d.details["error"].as_str().unwrap().contains("client_ip"));

    let (status, _) = call(
        &app,
        "POST",
        "/validate",
        Body::from(r#"["GET","/x",{"X-Client-ID":"abc"},{},"1.2.3.4"]"#),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    assert_eq!(
        state.metrics().decisions.get(&[("outcome", "bad_request")]),
        3
    );
}

#[tokio::test]
async fn non_post_is_method_not_allowed() {
    let (state, _) = memory_state();
    let app = build_router(state);

    for m in ["GET", "PUT", "DELETE"] {
        let (status, bytes) = call(&app, m, "/validate", Body::empty()).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED, "method={m}");
        let d: Decision = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(d.classification.unwrap().as_str(), "method_not_allowed");
        assert_eq!(d.details["method"], json!(m));
    }
}

#[tokio::test]
async fn store_outage_fails_open_end_to_end() {
    let state = state_with(Arc::new(DownStore));
    let app = build_router(state.clone());

    for _ in 0..5 {
        let (status, d) = admit(&app, scenario("GET")).await;
        assert_eq!(status, StatusCode::OK);
        assert!(d.admit);
        assert!(d.details.contains_key("store_error"));
    }
    assert_eq!(state.metrics().store_failures.total(), 5);

    let (_, bytes) = call(&app, "GET", "/metrics", Body::empty()).await;
    let text = String::from_utf8(bytes).unwrap();
    assert!(text.contains("admitd_store_failures_total{kind=\"unavailable\",op=\"get\"} 5"));
}

#[tokio::test]
async fn health_reflects_store_and_is_idempotent() {
    let (state, store) = memory_state();
    let app = build_router(state);

    let (s1, b1) = call(&app, "GET", "/health", Body::empty()).await;
    let (s2, b2) = call(&app, "GET", "/health", Body::empty()).await;
    assert_eq!(s1, StatusCode::OK);
    assert_eq!((s1, b1.clone()), (s2, b2));
    let v: Value = serde_json::from_slice(&b1).unwrap();
    assert_eq!(v["status"], json!("healthy"));
    assert!(store.is_empty(), "health check must not write");

    let down = build_router(state_with(Arc::new(DownStore)));
    let (s, b) = call(&down, "GET", "/health", Body::empty()).await;
    assert_eq!(s, StatusCode::SERVICE_UNAVAILABLE);
    let v: Value = serde_json::from_slice(&b).unwrap();
    assert_eq!(v["status"], json!("unhealthy"));
}

#[tokio::test]
async fn status_reports_identity_without_store() {
    // status must answer even when the store is down
    let app = build_router(state_with(Arc::new(DownStore)));

    let (s, b) = call(&app, "GET", "/status", Body::empty()).await;
    assert_eq!(s, StatusCode::OK);
    let v: Value = serde_json::from_slice(&b).unwrap();
    assert_eq!(v["service"], json!("admitd"));
    assert_eq!(v["version"], json!(env!("CARGO_PKG_VERSION")));
    assert_eq!(v["store"], json!("down"));
}

#[tokio::test]
async fn readyz_flips_when_draining() {
    let (state, _) = memory_state();
    let app = build_router(state.clone());

    let (s, _) = call(&app, "GET", "/readyz", Body::empty()).await;
    assert_eq!(s, StatusCode::OK);

    state.set_draining();
    let (s, _) = call(&app, "GET", "/readyz", Body::empty()).await;
    assert_eq!(s, StatusCode::SERVICE_UNAVAILABLE);

    state.metrics().reset();
    assert!(!state.is_draining());
}
