//! Policy layer (method/header rules, distributed rate limiting).
//!
//! The validator is a pure function of the descriptor and policy; the rate
//! limiter is the only component that talks to the shared counter store.

pub mod limiter;
pub mod validator;

pub use limiter::{rate_limit_key, RateLimitOutcome, RateLimiter};
pub use validator::{validate, ValidationOutcome, Violation};
