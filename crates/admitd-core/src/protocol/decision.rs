//! Admission verdict returned to the gateway.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{AdmitError, Classification};

/// Free-form diagnostic map carried by a decision.
pub type Details = Map<String, Value>;

/// Outcome of one admission evaluation. Built fresh per call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub admit: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classification: Option<Classification>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Status the gateway should answer with when it rejects.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    #[serde(default)]
    pub details: Details,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diagnostic_info: Option<Details>,
}

impl Decision {
    pub fn admitted(details: Details, diagnostic_info: Option<Details>) -> Self {
        Self {
            admit: true,
            classification: None,
            reason: None,
            status_code: None,
            details,
            diagnostic_info,
        }
    }

    /// Deny with the classification and status hint derived from `err`.
    pub fn denied(err: &AdmitError, details: Details) -> Self {
        let class = err.classification();
        Self {
            admit: false,
            classification: Some(class),
            reason: Some(err.to_string()),
            status_code: Some(class.status_hint()),
            details,
            diagnostic_info: None,
        }
    }

    /// Label used for metrics and logs.
    pub fn outcome_label(&self) -> &'static str {
        match self.classification {
            Some(c) => c.as_str(),
            None => "admitted",
        }
    }
}
