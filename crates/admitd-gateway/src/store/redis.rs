//! Redis-backed counter store for limits shared across gateway instances.
//!
//! The increment runs as a Lua script so that `INCR` and the first-window
//! `PEXPIRE` are applied as one indivisible step; Redis serializes scripts,
//! which gives linearizable increments per key without external locking.

use std::time::Duration;

use async_trait::async_trait;
use redis::aio::{ConnectionManager, ConnectionManagerConfig};
use redis::{AsyncCommands, RedisError, Script};
use tokio::sync::OnceCell;

use admitd_core::error::{AdmitError, Result};

use super::{CounterStore, StoreError, StoreResult};

/// Returns the post-increment count. Expiry is set only while the key has none.
const INCR_WITH_EXPIRY: &str = r#"
local n = redis.call('INCR', KEYS[1])
if redis.call('PTTL', KEYS[1]) < 0 then
  redis.call('PEXPIRE', KEYS[1], ARGV[1])
end
return n
"#;

/// Redis counter store. Cheap to share; the connection manager is
/// multiplexed and reconnects on its own.
pub struct RedisCounterStore {
    client: redis::Client,
    conn: OnceCell<ConnectionManager>,
    connect_timeout: Duration,
    incr: Script,
}

/// Reconnect attempts before a connect error is reported.
const CONNECT_RETRIES: usize = 1;
/// Backoff base in milliseconds (`factor * 2^attempt`).
const RETRY_FACTOR_MS: u64 = 10;

impl RedisCounterStore {
    /// Parse the URL. The connection itself is opened on first use so the
    /// service can boot (and fail open) while Redis is still down.
    ///
    /// `connect_timeout` caps a single connect attempt; it should not exceed
    /// the per-call store timeout, or a down Redis surfaces as a timeout
    /// instead of a refused connection.
    pub fn new(redis_url: &str, connect_timeout: Duration) -> Result<Self> {
        let client = redis::Client::open(redis_url)
            .map_err(|e| AdmitError::BadRequest(format!("invalid redis url: {e}")))?;

        Ok(Self {
            client,
            conn: OnceCell::new(),
            connect_timeout,
            incr: Script::new(INCR_WITH_EXPIRY),
        })
    }

    async fn conn(&self) -> StoreResult<ConnectionManager> {
        let conn = self
            .conn
            .get_or_try_init(|| async {
                tracing::debug!("opening redis connection manager");
                let cfg = ConnectionManagerConfig::new()
                    .set_number_of_retries(CONNECT_RETRIES)
                    .set_factor(RETRY_FACTOR_MS)
                    .set_connection_timeout(self.connect_timeout)
                    .set_response_timeout(self.connect_timeout);
                ConnectionManager::new_with_config(self.client.clone(), cfg)
                    .await
                    .map_err(map_redis_err)
            })
            .await?;
        Ok(conn.clone())
    }
}

fn map_redis_err(e: RedisError) -> StoreError {
    if e.is_io_error() || e.is_connection_refusal() || e.is_connection_dropped() || e.is_timeout() {
        StoreError::Unavailable(e.to_string())
    } else {
        StoreError::Protocol(e.to_string())
    }
}

#[async_trait]
impl CounterStore for RedisCounterStore {
    fn backend(&self) -> &'static str {
        "redis"
    }

    async fn get(&self, key: &str) -> StoreResult<u64> {
        let mut conn = self.conn().await?;
        let v: Option<u64> = conn.get(key).await.map_err(map_redis_err)?;
        Ok(v.unwrap_or(0))
    }

    async fn incr_with_expiry(&self, key: &str, window: Duration) -> StoreResult<u64> {
        let mut conn = self.conn().await?;
        let window_ms = window.as_millis().max(1) as u64;
        let n: u64 = self
            .incr
            .key(key)
            .arg(window_ms)
            .invoke_async(&mut conn)
            .await
            .map_err(map_redis_err)?;
        Ok(n)
    }

    async fn ttl(&self, key: &str) -> StoreResult<Option<Duration>> {
        let mut conn = self.conn().await?;
        // -2: no key, -1: no expiry
        let ms: i64 = conn.pttl(key).await.map_err(map_redis_err)?;
        Ok((ms >= 0).then(|| Duration::from_millis(ms as u64)))
    }

    async fn ping(&self) -> StoreResult<()> {
        let mut conn = self.conn().await?;
        let pong: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(map_redis_err)?;
        if pong != "PONG" {
            return Err(StoreError::Protocol(format!("unexpected PING reply: {pong}")));
        }
        Ok(())
    }
}
