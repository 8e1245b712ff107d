//! Static request rules: allowed methods, then required headers.
//!
//! First failure wins. No side effects, so rejected requests never touch the
//! counter store.

use serde_json::json;

use admitd_core::error::AdmitError;
use admitd_core::protocol::{Details, PolicyConfig, RequestDescriptor};

/// A policy violation plus the details reported to the gateway.
#[derive(Debug)]
pub struct Violation {
    pub error: AdmitError,
    pub details: Details,
}

pub type ValidationOutcome = std::result::Result<(), Violation>;

pub fn validate(req: &RequestDescriptor, policy: &PolicyConfig) -> ValidationOutcome {
    check_method(req, policy)?;
    check_headers(req, policy)?;
    Ok(())
}

fn check_method(req: &RequestDescriptor, policy: &PolicyConfig) -> ValidationOutcome {
    if policy.allows_method(&req.method) {
        return Ok(());
    }

    let mut details = Details::new();
    details.insert("method".into(), json!(req.method));
    details.insert("allowed".into(), json!(policy.allowed_methods));

    Err(Violation {
        error: AdmitError::MethodNotAllowed(req.method.clone()),
        details,
    })
}

fn check_headers(req: &RequestDescriptor, policy: &PolicyConfig) -> ValidationOutcome {
    let Some(missing) = policy
        .required_headers
        .iter()
        .find(|name| !req.has_header(name))
    else {
        return Ok(());
    };

    let mut details = Details::new();
    details.insert("missing_header".into(), json!(missing));
    details.insert("required_headers".into(), json!(policy.required_headers));

    Err(Violation {
        error: AdmitError::MissingHeader(missing.clone()),
        details,
    })
}
