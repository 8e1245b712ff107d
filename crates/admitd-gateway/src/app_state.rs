//! Shared application state for the admission service.
//!
//! Everything here is either read-only after construction (config, default
//! policy) or internally synchronized (store handle, metrics), so the state
//! is cloned into every request handler without locking.

use std::sync::Arc;
use std::time::{Duration, Instant};

use admitd_core::error::Result;
use admitd_core::protocol::PolicyConfig;

use crate::admission::AdmissionPipeline;
use crate::config::GatewayConfig;
use crate::obs::metrics::AdmitMetrics;
use crate::policy::RateLimiter;
use crate::store::{self, CounterStore};

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    cfg: GatewayConfig,
    default_policy: Arc<PolicyConfig>,
    store: Arc<dyn CounterStore>,
    pipeline: AdmissionPipeline,
    metrics: Arc<AdmitMetrics>,
    started: Instant,
}

impl AppState {
    /// Build application state with the store named in the config.
    /// Returns Result so main can handle errors gracefully (no panic).
    pub fn new(cfg: GatewayConfig) -> Result<Self> {
        let store = store::from_config(&cfg.store)?;
        Ok(Self::with_store(cfg, store))
    }

    /// Build application state around an existing store handle.
    pub fn with_store(cfg: GatewayConfig, store: Arc<dyn CounterStore>) -> Self {
        let metrics = Arc::new(AdmitMetrics::new());
        let default_policy = Arc::new(cfg.policy.to_policy());

        let limiter = RateLimiter::new(Arc::clone(&store), cfg.store.timeout(), Arc::clone(&metrics));
        let pipeline = AdmissionPipeline::new(limiter, Arc::clone(&metrics));

        tracing::info!(
            backend = store.backend(),
            default_limit = default_policy.max_requests_per_minute,
            "admission state ready"
        );

        Self {
            inner: Arc::new(AppStateInner {
                cfg,
                default_policy,
                store,
                pipeline,
                metrics,
                started: Instant::now(),
            }),
        }
    }

    /// Policy applied when a descriptor carries none.
    pub fn default_policy(&self) -> &PolicyConfig {
        &self.inner.default_policy
    }

    pub fn store(&self) -> &dyn CounterStore {
        self.inner.store.as_ref()
    }

    pub fn store_timeout(&self) -> Duration {
        self.inner.cfg.store.timeout()
    }

    pub fn pipeline(&self) -> &AdmissionPipeline {
        &self.inner.pipeline
    }

    pub fn metrics(&self) -> &AdmitMetrics {
        &self.inner.metrics
    }

    pub fn uptime(&self) -> Duration {
        self.inner.started.elapsed()
    }

    pub fn set_draining(&self) {
        self.inner.metrics.set_draining();
    }

    pub fn is_draining(&self) -> bool {
        self.inner.metrics.is_draining()
    }

    /// Extra gauges appended to the metrics output.
    pub fn metrics_extra(&self) -> Vec<(&'static str, u64)> {
        vec![("admitd_uptime_seconds", self.uptime().as_secs())]
    }
}
