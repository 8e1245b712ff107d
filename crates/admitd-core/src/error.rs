//! Shared error type across admitd crates.

use thiserror::Error;

/// Machine-readable denial codes (stable API).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Classification {
    /// Malformed admission input.
    BadRequest,
    /// Request method is not in the allowed set.
    MethodNotAllowed,
    /// A required header is absent or empty.
    MissingHeader,
    /// Client exhausted its budget for the current window.
    RateLimitExceeded,
    /// Unsupported config version.
    UnsupportedVersion,
    /// Internal server error.
    Internal,
}

impl Classification {
    /// String representation used in JSON decisions and metric labels.
    pub fn as_str(self) -> &'static str {
        match self {
            Classification::BadRequest => "bad_request",
            Classification::MethodNotAllowed => "method_not_allowed",
            Classification::MissingHeader => "missing_header",
            Classification::RateLimitExceeded => "rate_limit_exceeded",
            Classification::UnsupportedVersion => "unsupported_version",
            Classification::Internal => "internal",
        }
    }

    /// Suggested HTTP status the calling gateway should answer with.
    pub fn status_hint(self) -> u16 {
        match self {
            Classification::BadRequest => 400,
            Classification::MethodNotAllowed => 405,
            Classification::MissingHeader => 400,
            Classification::RateLimitExceeded => 429,
            Classification::UnsupportedVersion => 400,
            Classification::Internal => 500,
        }
    }

    /// Parse the wire representation back into a code.
    pub fn parse(s: &str) -> Option<Self> {
        Some(match s {
            "bad_request" => Classification::BadRequest,
            "method_not_allowed" => Classification::MethodNotAllowed,
            "missing_header" => Classification::MissingHeader,
            "rate_limit_exceeded" => Classification::RateLimitExceeded,
            "unsupported_version" => Classification::UnsupportedVersion,
            "internal" => Classification::Internal,
            _ => return None,
        })
    }

    /// Only rate-limit denials clear up on their own.
    pub fn is_retryable(self) -> bool {
        matches!(self, Classification::RateLimitExceeded)
    }
}

impl serde::Serialize for Classification {
    fn serialize<S: serde::Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        s.serialize_str(self.as_str())
    }
}

impl<'de> serde::Deserialize<'de> for Classification {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(d)?;
        Classification::parse(&s)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown classification: {s}")))
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, AdmitError>;

/// Unified error type used by core and gateway.
#[derive(Debug, Error)]
pub enum AdmitError {
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("method not allowed: {0}")]
    MethodNotAllowed(String),
    #[error("missing header: {0}")]
    MissingHeader(String),
    #[error("rate limit exceeded: {0}")]
    RateLimited(String),
    #[error("unsupported config version")]
    UnsupportedVersion,
    #[error("internal: {0}")]
    Internal(String),
}

impl AdmitError {
    /// Map internal error to a stable client-facing code.
    pub fn classification(&self) -> Classification {
        match self {
            AdmitError::BadRequest(_) => Classification::BadRequest,
            AdmitError::MethodNotAllowed(_) => Classification::MethodNotAllowed,
            AdmitError::MissingHeader(_) => Classification::MissingHeader,
            AdmitError::RateLimited(_) => Classification::RateLimitExceeded,
            AdmitError::UnsupportedVersion => Classification::UnsupportedVersion,
            AdmitError::Internal(_) => Classification::Internal,
        }
    }
}
