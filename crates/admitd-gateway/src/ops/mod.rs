//! Operational HTTP endpoints.
//!
//! - `/health`  : store connectivity (503 when the store is unreachable)
//! - `/status`  : service identity, never touches the store
//! - `/readyz`  : readiness (503 when draining)
//! - `/metrics` : Prometheus text format

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::admission::decision::VALIDATOR_NAME;
use crate::app_state::AppState;
use crate::store::bounded;

pub async fn health(State(app): State<AppState>) -> Response {
    let backend = app.store().backend();
    match bounded(app.store_timeout(), app.store().ping()).await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({ "status": "healthy", "store": backend })),
        )
            .into_response(),
        Err(e) => {
            tracing::warn!(error = %e, backend, "health check: counter store unreachable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "unhealthy", "store": backend, "error": e.to_string() })),
            )
                .into_response()
        }
    }
}

pub async fn status(State(app): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "service": VALIDATOR_NAME,
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running",
        "store": app.store().backend(),
        "uptime_secs": app.uptime().as_secs(),
    }))
}

pub async fn readyz(State(app): State<AppState>) -> impl IntoResponse {
    if app.is_draining() {
        (StatusCode::SERVICE_UNAVAILABLE, "draining")
    } else {
        (StatusCode::OK, "ready")
    }
}

pub async fn metrics(State(app): State<AppState>) -> Response {
    let extra = app.metrics_extra();
    let body = app.metrics().render(&extra);

    (
        StatusCode::OK,
        [(axum::http::header::CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
        body,
    )
        .into_response()
}
