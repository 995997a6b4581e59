use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use crate::error::StoreError;
use crate::rate_limit::{Hit, RateCounter};

/// Map size after which a new insert sweeps out expired entries.
const DEFAULT_SWEEP_AT: usize = 10_000;

/// TTL-capable key-value store holding the per-client counters.
pub trait CounterStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<RateCounter>, StoreError>;

    fn set(&self, key: &str, value: RateCounter, ttl: Duration) -> Result<(), StoreError>;

    /// Counts one request for `key` and returns the decision.
    ///
    /// The default is a plain read-then-write and can undercount concurrent
    /// bursts. Stores that can update a key atomically should override it.
    fn hit(
        &self,
        key: &str,
        limit: u32,
        lockout: Duration,
        now: DateTime<Utc>,
    ) -> Result<Hit, StoreError> {
        let hit = Hit::decide(self.get(key)?, limit, lockout, now);
        if let Hit::Allowed(counter) = hit {
            self.set(key, counter, counter.expires_at - now)?;
        }
        Ok(hit)
    }
}

// In-memory store, expiry is checked lazily on access
pub struct MemoryStore {
    counters: DashMap<String, RateCounter>,
    sweep_at: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_sweep_threshold(DEFAULT_SWEEP_AT)
    }

    pub fn with_sweep_threshold(sweep_at: usize) -> Self {
        Self {
            counters: DashMap::new(),
            sweep_at,
        }
    }

    pub fn len(&self) -> usize {
        self.counters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counters.is_empty()
    }

    /// Drops every entry whose window has closed.
    pub fn purge_expired(&self, now: DateTime<Utc>) {
        self.counters.retain(|_, counter| !counter.is_expired(now));
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CounterStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<RateCounter>, StoreError> {
        Ok(self.counters.get(key).map(|entry| *entry.value()))
    }

    fn set(&self, key: &str, value: RateCounter, _ttl: Duration) -> Result<(), StoreError> {
        // expires_at already carries the ttl
        self.counters.insert(key.to_string(), value);
        Ok(())
    }

    // Decision and write happen under the shard lock for `key`
    fn hit(
        &self,
        key: &str,
        limit: u32,
        lockout: Duration,
        now: DateTime<Utc>,
    ) -> Result<Hit, StoreError> {
        let (hit, inserted) = match self.counters.entry(key.to_string()) {
            Entry::Occupied(mut occupied) => {
                let hit = Hit::decide(Some(*occupied.get()), limit, lockout, now);
                *occupied.get_mut() = hit.counter();
                (hit, false)
            }
            Entry::Vacant(vacant) => {
                let hit = Hit::decide(None, limit, lockout, now);
                vacant.insert(hit.counter());
                (hit, true)
            }
        };

        if inserted && self.counters.len() > self.sweep_at {
            self.purge_expired(now);
        }
        Ok(hit)
    }
}
