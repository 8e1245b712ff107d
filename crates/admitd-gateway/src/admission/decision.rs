//! Combine validator and limiter outcomes into one `Decision`.

use std::time::{SystemTime, UNIX_EPOCH};

use serde_json::json;

use admitd_core::error::AdmitError;
use admitd_core::protocol::{Decision, Details, PolicyConfig, RequestDescriptor};

use crate::policy::{RateLimitOutcome, ValidationOutcome};

/// Name reported in `diagnostic_info.validator`.
pub const VALIDATOR_NAME: &str = "admitd";

/// `limit` is `None` when the limiter was not consulted (validation failed).
pub fn assemble(
    req: &RequestDescriptor,
    policy: &PolicyConfig,
    client_key: &str,
    validation: ValidationOutcome,
    limit: Option<RateLimitOutcome>,
) -> Decision {
    if let Err(v) = validation {
        return Decision::denied(&v.error, v.details);
    }

    let limit = limit.unwrap_or_default();
    if !limit.allowed {
        let err = AdmitError::RateLimited(format!("too many requests from {}", req.client_ip));
        return Decision::denied(&err, limit.diagnostics);
    }

    let diagnostic_info = policy
        .enable_diagnostics
        .then(|| diagnostic_info(req, client_key, unix_now()));

    Decision::admitted(limit.diagnostics, diagnostic_info)
}

fn diagnostic_info(req: &RequestDescriptor, client_key: &str, timestamp: u64) -> Details {
    let mut info = Details::new();
    info.insert("validated_method".into(), json!(req.method));
    info.insert("client_key".into(), json!(client_key));
    info.insert("path".into(), json!(req.path));
    info.insert("timestamp".into(), json!(timestamp));
    info.insert("validator".into(), json!(VALIDATOR_NAME));
    info
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
