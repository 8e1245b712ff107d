//! Admission wire formats (JSON).
//!
//! - `request`: the descriptor a gateway sends for one inbound HTTP request,
//!   plus the policy configuration it is evaluated against.
//! - `decision`: the verdict returned to the gateway.
//!
//! Decoding is panic-free: malformed input is reported as
//! `AdmitError::BadRequest` so the endpoint can answer 400 without ever
//! reaching the pipeline.

pub mod decision;
pub mod request;

pub use decision::{Decision, Details};
pub use request::{PolicyConfig, RequestDescriptor};
