//! Admission endpoint (`/validate`).
//!
//! Responsibilities:
//! - Accept POST only (405 otherwise)
//! - Decode the descriptor, rejecting malformed input with 400 `bad_request`
//! - Pick the policy: the descriptor's own, or the deployment default
//! - Run the pipeline and return the decision with 200, even on denial;
//!   the gateway reads the verdict from the body

use axum::{
    extract::State,
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use bytes::Bytes;
use serde_json::json;

use admitd_core::error::AdmitError;
use admitd_core::protocol::{Decision, Details, RequestDescriptor};

use crate::app_state::AppState;

pub async fn validate(State(app): State<AppState>, method: Method, body: Bytes) -> Response {
    if method != Method::POST {
        let err = AdmitError::MethodNotAllowed(method.to_string());
        let mut details = Details::new();
        details.insert("method".into(), json!(method.as_str()));
        details.insert("allowed".into(), json!(["POST"]));
        return reject(&app, StatusCode::METHOD_NOT_ALLOWED, &err, details);
    }

    let req = match RequestDescriptor::from_json(&body) {
        Ok(req) => req,
        Err(err) => {
            tracing::warn!(error = %err, "failed to decode admission request");
            let mut details = Details::new();
            details.insert("error".into(), json!(err.to_string()));
            return reject(&app, StatusCode::BAD_REQUEST, &err, details);
        }
    };

    let policy = req.config.as_ref().unwrap_or_else(|| app.default_policy());
    let decision = app.pipeline().evaluate(&req, policy).await;

    (StatusCode::OK, Json(decision)).into_response()
}

fn reject(app: &AppState, status: StatusCode, err: &AdmitError, details: Details) -> Response {
    let decision = Decision::denied(err, details);
    app.metrics()
        .decisions
        .inc(&[("outcome", decision.outcome_label())]);
    (status, Json(decision)).into_response()
}
