//! Request descriptor and policy configuration.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{AdmitError, Result};

/// Per-deployment admission rules. Read-only once built; share via `Arc`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyConfig {
    /// Budget per client per fixed one-minute window. `0` disables limiting.
    #[serde(default = "default_max_requests_per_minute")]
    pub max_requests_per_minute: u32,
    /// Header names that must be present with a non-empty value.
    #[serde(default)]
    pub required_headers: Vec<String>,
    /// Methods accepted (compared case-insensitively).
    #[serde(default = "default_allowed_methods")]
    pub allowed_methods: Vec<String>,
    /// Attach `diagnostic_info` to admitted decisions.
    #[serde(default = "default_enable_diagnostics", alias = "enable_debug_headers")]
    pub enable_diagnostics: bool,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            max_requests_per_minute: default_max_requests_per_minute(),
            required_headers: Vec::new(),
            allowed_methods: default_allowed_methods(),
            enable_diagnostics: default_enable_diagnostics(),
        }
    }
}

impl PolicyConfig {
    /// Rate limiting is off for a zero budget.
    pub fn rate_limit_enabled(&self) -> bool {
        self.max_requests_per_minute > 0
    }

    pub fn allows_method(&self, method: &str) -> bool {
        self.allowed_methods
            .iter()
            .any(|m| m.eq_ignore_ascii_case(method))
    }
}

fn default_max_requests_per_minute() -> u32 {
    60
}
fn default_allowed_methods() -> Vec<String> {
    ["GET", "POST", "PUT", "DELETE"]
        .iter()
        .map(|m| m.to_string())
        .collect()
}
fn default_enable_diagnostics() -> bool {
    true
}

/// One inbound HTTP request as seen by the calling gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestDescriptor {
    pub method: String,
    #[serde(default)]
    pub path: String,
    /// Raw header map. Non-string values are kept but never satisfy a
    /// required-header check.
    #[serde(default)]
    pub headers: BTreeMap<String, Value>,
    #[serde(default)]
    pub query: BTreeMap<String, Value>,
    /// Client address; the rate limit key is derived from it verbatim.
    #[serde(alias = "client_address")]
    pub client_ip: String,
    #[serde(default)]
    pub body: Option<String>,
    /// Policy supplied by the caller. `None` means the deployment default.
    #[serde(default)]
    pub config: Option<PolicyConfig>,
}

impl RequestDescriptor {
    /// Decode and sanity-check a descriptor from a JSON body.
    ///
    /// Only JSON objects are accepted: serde would otherwise fill the struct
    /// positionally from an array.
    pub fn from_json(raw: &[u8]) -> Result<Self> {
        let value: Value = serde_json::from_slice(raw)
            .map_err(|e| AdmitError::BadRequest(format!("invalid request format: {e}")))?;
        let obj = value
            .as_object()
            .ok_or_else(|| AdmitError::BadRequest("request must be a JSON object".into()))?;
        match obj.get("config") {
            None | Some(Value::Null) | Some(Value::Object(_)) => {}
            Some(_) => {
                return Err(AdmitError::BadRequest("config must be a JSON object".into()));
            }
        }

        let desc: RequestDescriptor = serde_json::from_value(value)
            .map_err(|e| AdmitError::BadRequest(format!("invalid request format: {e}")))?;
        desc.check()?;
        Ok(desc)
    }

    fn check(&self) -> Result<()> {
        if self.method.trim().is_empty() {
            return Err(AdmitError::BadRequest("method must not be empty".into()));
        }
        if self.client_ip.trim().is_empty() {
            return Err(AdmitError::BadRequest("client_ip must not be empty".into()));
        }
        Ok(())
    }

    /// Case-insensitive header lookup. Only non-empty string values count.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.iter().find_map(|(k, v)| {
            if !k.eq_ignore_ascii_case(name) {
                return None;
            }
            match v.as_str() {
                Some(s) if !s.is_empty() => Some(s),
                _ => None,
            }
        })
    }

    pub fn has_header(&self, name: &str) -> bool {
        self.header(name).is_some()
    }
}
