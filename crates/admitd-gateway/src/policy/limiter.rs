//! Fixed-window, per-client rate limiter over the shared counter store.
//!
//! Windows are one minute long and start on the first increment of a key.
//! A client can therefore get up to twice its budget across a window
//! boundary; this is accepted.
//!
//! Store failures fail open: the request is allowed, the error is reported
//! in the diagnostics, logged, and counted in `admitd_store_failures_total`.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;

use admitd_core::protocol::Details;

use crate::obs::metrics::AdmitMetrics;
use crate::store::{bounded, CounterStore, StoreError};

pub const WINDOW: Duration = Duration::from_secs(60);
pub const WINDOW_LABEL: &str = "1 minute";
const KEY_PREFIX: &str = "rate_limit:";

/// Counter key for a client address. The address is used verbatim.
pub fn rate_limit_key(client_addr: &str) -> String {
    format!("{KEY_PREFIX}{client_addr}")
}

#[derive(Debug, Clone)]
pub struct RateLimitOutcome {
    pub allowed: bool,
    pub diagnostics: Details,
    /// Set when the outcome is a fail-open recovery.
    pub store_error: Option<StoreError>,
}

impl RateLimitOutcome {
    fn disabled() -> Self {
        Self {
            allowed: true,
            diagnostics: Details::new(),
            store_error: None,
        }
    }

    pub fn failed_open(&self) -> bool {
        self.store_error.is_some()
    }
}

impl Default for RateLimitOutcome {
    fn default() -> Self {
        Self::disabled()
    }
}

pub struct RateLimiter {
    store: Arc<dyn CounterStore>,
    timeout: Duration,
    metrics: Arc<AdmitMetrics>,
}

impl RateLimiter {
    pub fn new(store: Arc<dyn CounterStore>, timeout: Duration, metrics: Arc<AdmitMetrics>) -> Self {
        Self {
            store,
            timeout,
            metrics,
        }
    }

    /// Check the budget for `key` and consume one unit when allowed.
    ///
    /// The read is only a fast path for clients already over budget. The
    /// decision for everyone else is taken on the post-increment count, so
    /// with M concurrent callers and budget N exactly N are admitted.
    pub async fn check_and_consume(&self, key: &str, limit: u32) -> RateLimitOutcome {
        if limit == 0 {
            return RateLimitOutcome::disabled();
        }
        let limit = u64::from(limit);

        let current = match bounded(self.timeout, self.store.get(key)).await {
            Ok(n) => n,
            Err(e) => return self.fail_open("get", key, limit, e),
        };
        if current >= limit {
            return self.deny(key, current, limit).await;
        }

        let count = match bounded(self.timeout, self.store.incr_with_expiry(key, WINDOW)).await {
            Ok(n) => n,
            Err(e) => return self.fail_open("incr", key, limit, e),
        };
        if count > limit {
            // Lost the race against concurrent callers for the last slot.
            return self.deny(key, count, limit).await;
        }

        let mut diagnostics = Details::new();
        diagnostics.insert("current_count".into(), json!(count));
        diagnostics.insert("max_requests".into(), json!(limit));
        diagnostics.insert("window".into(), json!(WINDOW_LABEL));

        RateLimitOutcome {
            allowed: true,
            diagnostics,
            store_error: None,
        }
    }

    async fn deny(&self, key: &str, count: u64, limit: u64) -> RateLimitOutcome {
        let mut diagnostics = Details::new();
        diagnostics.insert("current_count".into(), json!(count));
        diagnostics.insert("max_requests".into(), json!(limit));
        diagnostics.insert("window".into(), json!(WINDOW_LABEL));

        // The verdict stands even if the TTL can't be read.
        match bounded(self.timeout, self.store.ttl(key)).await {
            Ok(Some(ttl)) => {
                diagnostics.insert("reset_in".into(), json!(ttl.as_secs_f64()));
            }
            Ok(None) => {}
            Err(e) => {
                self.record_failure("ttl", &e);
                tracing::warn!(%key, op = "ttl", error = %e, "rate limit reset time unavailable");
            }
        }

        RateLimitOutcome {
            allowed: false,
            diagnostics,
            store_error: None,
        }
    }

    fn fail_open(&self, op: &'static str, key: &str, limit: u64, e: StoreError) -> RateLimitOutcome {
        self.record_failure(op, &e);
        tracing::warn!(%key, op, error = %e, "counter store failure; failing open");

        let mut diagnostics = Details::new();
        diagnostics.insert("store_error".into(), json!(e.to_string()));
        diagnostics.insert("max_requests".into(), json!(limit));
        diagnostics.insert("window".into(), json!(WINDOW_LABEL));

        RateLimitOutcome {
            allowed: true,
            diagnostics,
            store_error: Some(e),
        }
    }

    fn record_failure(&self, op: &str, e: &StoreError) {
        self.metrics
            .store_failures
            .inc(&[("op", op), ("kind", e.kind())]);
    }
}
