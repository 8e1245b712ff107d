//! Axum router wiring.

use axum::{
    routing::{any, get},
    Router,
};

use crate::{app_state::AppState, ops, transport};

pub fn build_router(state: AppState) -> Router {
    Router::new()
        // any(): non-POST gets a 405 decision body instead of axum's empty one
        .route("/validate", any(transport::http::validate))
        .route("/health", get(ops::health))
        .route("/status", get(ops::status))
        .route("/readyz", get(ops::readyz))
        .route("/metrics", get(ops::metrics))
        .with_state(state)
}
