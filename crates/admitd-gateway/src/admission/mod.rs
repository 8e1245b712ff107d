//! Admission pipeline: validator → rate limiter → decision assembler.
//!
//! Policy violations short-circuit before the limiter, so rejected requests
//! never consume rate budget. Note this lets policy-violating traffic through
//! unmetered; revisit if that becomes an abuse vector.

pub mod decision;

use std::sync::Arc;
use std::time::Instant;

use admitd_core::protocol::{Decision, PolicyConfig, RequestDescriptor};

use crate::obs::metrics::{AdmitMetrics, GaugeVec};
use crate::policy::{self, rate_limit_key, RateLimiter};

/// Holds one unit of the in-flight gauge; released on drop, including when
/// the caller abandons the request mid store call.
struct InFlight<'a>(&'a GaugeVec);

impl<'a> InFlight<'a> {
    fn enter(gauge: &'a GaugeVec) -> Self {
        gauge.inc(&[]);
        Self(gauge)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.dec(&[]);
    }
}

pub struct AdmissionPipeline {
    limiter: RateLimiter,
    metrics: Arc<AdmitMetrics>,
}

impl AdmissionPipeline {
    pub fn new(limiter: RateLimiter, metrics: Arc<AdmitMetrics>) -> Self {
        Self { limiter, metrics }
    }

    /// Evaluate one admission request. Never fails: store problems fail open
    /// and every policy outcome is a decision.
    pub async fn evaluate(&self, req: &RequestDescriptor, policy: &PolicyConfig) -> Decision {
        let started = Instant::now();
        let in_flight = InFlight::enter(&self.metrics.in_flight);

        let key = rate_limit_key(&req.client_ip);
        let validation = policy::validate(req, policy);
        let limit = match &validation {
            Ok(()) => Some(
                self.limiter
                    .check_and_consume(&key, policy.max_requests_per_minute)
                    .await,
            ),
            Err(_) => None,
        };
        let failed_open = limit.as_ref().is_some_and(|l| l.failed_open());

        let decision = decision::assemble(req, policy, &key, validation, limit);

        let outcome = decision.outcome_label();
        drop(in_flight);
        self.metrics.decisions.inc(&[("outcome", outcome)]);
        self.metrics
            .admission_duration
            .observe(&[], started.elapsed());

        if decision.admit {
            tracing::trace!(%key, method = %req.method, path = %req.path, failed_open, "admitted");
        } else {
            tracing::debug!(%key, method = %req.method, path = %req.path, outcome, "denied");
        }

        decision
    }
}
