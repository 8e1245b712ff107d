//! In-process counter store.
//!
//! Mirrors the Redis semantics (lazy expiry, create-with-TTL on first
//! increment) for single-instance deployments and tests. Expiry uses the
//! tokio clock, so paused-time tests can step through window boundaries.
//!
//! Expired slots of clients that never come back are swept from the write
//! path at most once per `PURGE_INTERVAL`.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::time::Instant;

use super::{CounterStore, StoreResult};

#[derive(Debug, Clone, Copy)]
struct Slot {
    count: u64,
    expires_at: Option<Instant>,
}

impl Slot {
    fn live(&self, now: Instant) -> bool {
        self.expires_at.map_or(true, |at| at > now)
    }
}

const PURGE_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Debug)]
pub struct MemoryCounterStore {
    slots: DashMap<String, Slot>,
    next_purge: Mutex<Instant>,
}

impl Default for MemoryCounterStore {
    fn default() -> Self {
        Self {
            slots: DashMap::new(),
            next_purge: Mutex::new(Instant::now() + PURGE_INTERVAL),
        }
    }
}

impl MemoryCounterStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys currently held, expired ones included until swept.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Sweep if the interval elapsed. A concurrent sweeper wins; others skip.
    fn maybe_purge(&self, now: Instant) {
        let Ok(mut next) = self.next_purge.try_lock() else {
            return;
        };
        if now < *next {
            return;
        }
        *next = now + PURGE_INTERVAL;
        drop(next);

        let before = self.slots.len();
        self.slots.retain(|_, slot| slot.live(now));
        tracing::debug!(before, after = self.slots.len(), "purged expired rate limit slots");
    }

    fn live_slot(&self, key: &str) -> Option<Slot> {
        let now = Instant::now();
        let slot = *self.slots.get(key)?;
        if slot.live(now) {
            Some(slot)
        } else {
            // Only remove if nobody restarted the window in between.
            self.slots.remove_if(key, |_, s| !s.live(now));
            None
        }
    }
}

#[async_trait]
impl CounterStore for MemoryCounterStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn get(&self, key: &str) -> StoreResult<u64> {
        Ok(self.live_slot(key).map_or(0, |s| s.count))
    }

    async fn incr_with_expiry(&self, key: &str, window: Duration) -> StoreResult<u64> {
        let now = Instant::now();
        // Must run before taking the entry guard: retain locks every shard.
        self.maybe_purge(now);
        // The entry guard holds the shard lock: read-modify-write is atomic per key.
        let mut slot = self.slots.entry(key.to_string()).or_insert(Slot {
            count: 0,
            expires_at: None,
        });
        if !slot.live(now) {
            *slot = Slot { count: 0, expires_at: None };
        }
        slot.count += 1;
        if slot.expires_at.is_none() {
            slot.expires_at = Some(now + window);
        }
        Ok(slot.count)
    }

    async fn ttl(&self, key: &str) -> StoreResult<Option<Duration>> {
        let now = Instant::now();
        Ok(self
            .live_slot(key)
            .and_then(|s| s.expires_at)
            .map(|at| at.saturating_duration_since(now)))
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}
