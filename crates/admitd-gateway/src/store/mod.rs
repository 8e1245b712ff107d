//! Shared counter store clients.
//!
//! The rate limiter only needs three primitives from the store: an atomic
//! increment that creates the window expiry on first use, a plain read
//! (absent key reads as zero), and the remaining time-to-live. Every call is
//! bounded by `bounded`, so a partitioned store surfaces as
//! `StoreError::Timeout` instead of stalling the caller.

pub mod memory;
pub mod redis;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use admitd_core::error::Result;

use crate::config::{StoreBackend, StoreSection};

pub use memory::MemoryCounterStore;
pub use self::redis::RedisCounterStore;

/// Store-side failure. Recovered locally by the limiter (fail-open).
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("store timed out after {0:?}")]
    Timeout(Duration),
    #[error("unexpected store reply: {0}")]
    Protocol(String),
}

impl StoreError {
    /// Metric label.
    pub fn kind(&self) -> &'static str {
        match self {
            StoreError::Unavailable(_) => "unavailable",
            StoreError::Timeout(_) => "timeout",
            StoreError::Protocol(_) => "protocol",
        }
    }
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Atomic counters with expiry, shared by every gateway instance.
#[async_trait]
pub trait CounterStore: Send + Sync {
    /// Backend name for status output.
    fn backend(&self) -> &'static str;

    /// Current value, `0` when the key does not exist.
    async fn get(&self, key: &str) -> StoreResult<u64>;

    /// Increment and return the new value. When the key has no expiry yet
    /// (first increment of a window) `window` is applied in the same atomic
    /// step; later increments leave the expiry untouched.
    async fn incr_with_expiry(&self, key: &str, window: Duration) -> StoreResult<u64>;

    /// Remaining lifetime of the key, `None` when absent or without expiry.
    async fn ttl(&self, key: &str) -> StoreResult<Option<Duration>>;

    /// Connectivity check. Must not mutate state.
    async fn ping(&self) -> StoreResult<()>;
}

/// Run a store call under `timeout`. Elapsed timeouts map to `StoreError::Timeout`.
pub async fn bounded<T, F>(timeout: Duration, fut: F) -> StoreResult<T>
where
    F: Future<Output = StoreResult<T>>,
{
    match tokio::time::timeout(timeout, fut).await {
        Ok(res) => res,
        Err(_) => Err(StoreError::Timeout(timeout)),
    }
}

/// Build the configured backend.
pub fn from_config(cfg: &StoreSection) -> Result<Arc<dyn CounterStore>> {
    tracing::info!(
        backend = cfg.backend.as_str(),
        timeout_ms = cfg.timeout_ms,
        "configuring counter store"
    );
    Ok(match cfg.backend {
        StoreBackend::Redis => Arc::new(RedisCounterStore::new(&cfg.url, cfg.timeout())?),
        StoreBackend::Memory => {
            tracing::warn!("memory counter store selected; limits are not shared across instances");
            Arc::new(MemoryCounterStore::new())
        }
    })
}
