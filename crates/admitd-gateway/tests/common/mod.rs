//! Shared fixtures: configs, descriptors, and fault-injecting stores.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]
#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use admitd_core::protocol::{PolicyConfig, RequestDescriptor};
use admitd_gateway::app_state::AppState;
use admitd_gateway::config::{self, GatewayConfig};
use admitd_gateway::store::{CounterStore, MemoryCounterStore, StoreError, StoreResult};

pub fn memory_config() -> GatewayConfig {
    config::load_from_str(
        r#"
version: 1
store:
  backend: memory
  timeout_ms: 250
policy:
  max_requests_per_minute: 2
  required_headers: ["X-Client-ID"]
  allowed_methods: [GET, POST]
  enable_diagnostics: true
"#,
    )
    .expect("fixture config must parse")
}

/// App state over a fresh in-memory store; the store handle is returned for inspection.
pub fn memory_state() -> (AppState, Arc<MemoryCounterStore>) {
    let store = Arc::new(MemoryCounterStore::new());
    let state = AppState::with_store(memory_config(), store.clone());
    (state, store)
}

pub fn state_with(store: Arc<dyn CounterStore>) -> AppState {
    AppState::with_store(memory_config(), store)
}

/// `{methods: [GET, POST], required_headers: [X-Client-ID], limit: 2}`
pub fn scenario_policy() -> PolicyConfig {
    PolicyConfig {
        max_requests_per_minute: 2,
        required_headers: vec!["X-Client-ID".into()],
        allowed_methods: vec!["GET".into(), "POST".into()],
        enable_diagnostics: true,
    }
}

pub fn descriptor(method: &str, client: &str, headers: &[(&str, &str)]) -> RequestDescriptor {
    let headers: Map<String, Value> = headers
        .iter()
        .map(|(k, v)| (k.to_string(), json!(v)))
        .collect();
    serde_json::from_value(json!({
        "method": method,
        "path": "/api/posts",
        "headers": headers,
        "client_ip": client,
    }))
    .unwrap()
}

/// Always unreachable.
pub struct DownStore;

#[async_trait]
impl CounterStore for DownStore {
    fn backend(&self) -> &'static str {
        "down"
    }
    async fn get(&self, _key: &str) -> StoreResult<u64> {
        Err(StoreError::Unavailable("connection refused".into()))
    }
    async fn incr_with_expiry(&self, _key: &str, _window: Duration) -> StoreResult<u64> {
        Err(StoreError::Unavailable("connection refused".into()))
    }
    async fn ttl(&self, _key: &str) -> StoreResult<Option<Duration>> {
        Err(StoreError::Unavailable("connection refused".into()))
    }
    async fn ping(&self) -> StoreResult<()> {
        Err(StoreError::Unavailable("connection refused".into()))
    }
}

/// Never answers within any sane timeout.
pub struct SlowStore;

#[async_trait]
impl CounterStore for SlowStore {
    fn backend(&self) -> &'static str {
        "slow"
    }
    async fn get(&self, _key: &str) -> StoreResult<u64> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok(0)
    }
    async fn incr_with_expiry(&self, _key: &str, _window: Duration) -> StoreResult<u64> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok(1)
    }
    async fn ttl(&self, _key: &str) -> StoreResult<Option<Duration>> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok(None)
    }
    async fn ping(&self) -> StoreResult<()> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok(())
    }
}
