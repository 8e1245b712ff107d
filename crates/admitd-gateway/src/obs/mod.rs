//! In-process observability.
//!
//! Counters for decisions and fail-open store recoveries live here, owned by
//! `AppState` and rendered by the `/metrics` handler.

pub mod metrics;

pub use metrics::AdmitMetrics;
