use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use super::CacheEntry;
use crate::clock::{Clock, SystemClock};
use crate::section::{ResourceKey, VOLATILE_TTL};

/// Per-key freshness windows, fixed when the cache is built.
#[derive(Debug, Clone)]
pub struct TtlPolicy {
    ttls: HashMap<ResourceKey, Duration>,
    fallback: Duration,
}

impl TtlPolicy {
    /// The same TTL for every key.
    pub fn uniform(ttl: Duration) -> Self {
        Self {
            ttls: HashMap::new(),
            fallback: ttl,
        }
    }

    /// Volatile keys get 30s, catalog and profile get 60s.
    pub fn standard() -> Self {
        let ttls = ResourceKey::ALL
            .iter()
            .map(|k| (*k, k.default_ttl()))
            .collect();
        Self {
            ttls,
            fallback: VOLATILE_TTL,
        }
    }

    pub fn with_ttl(mut self, key: ResourceKey, ttl: Duration) -> Self {
        self.ttls.insert(key, ttl);
        self
    }

    pub fn ttl_for(&self, key: ResourceKey) -> Duration {
        self.ttls.get(&key).copied().unwrap_or(self.fallback)
    }
}

impl Default for TtlPolicy {
    fn default() -> Self {
        Self::standard()
    }
}

/// Freshness cache keyed by resource.
///
/// `get` hands back whatever was stored last regardless of freshness; callers
/// that care about staleness check `is_fresh` first. `put` always overwrites,
/// so ordering between competing writers is the caller's job.
pub struct ResourceCache<T> {
    entries: HashMap<ResourceKey, CacheEntry<T>>,
    policy: TtlPolicy,
    clock: Arc<dyn Clock>,
}

impl<T> ResourceCache<T> {
    pub fn new(policy: TtlPolicy) -> Self {
        Self::with_clock(policy, Arc::new(SystemClock))
    }

    pub fn with_clock(policy: TtlPolicy, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: HashMap::new(),
            policy,
            clock,
        }
    }

    /// True iff an entry exists, was not invalidated, and is younger than its TTL.
    pub fn is_fresh(&self, key: ResourceKey) -> bool {
        let now = self.clock.now();
        self.entries
            .get(&key)
            .map(|e| e.is_fresh(now))
            .unwrap_or(false) // No entry = stale
    }

    /// Last stored payload, fresh or not.
    pub fn get(&self, key: ResourceKey) -> Option<&T> {
        self.entries.get(&key).map(|e| &e.data)
    }

    /// Store `data` as fetched now. Last writer wins.
    pub fn put(&mut self, key: ResourceKey, data: T) {
        let ttl = self.policy.ttl_for(key);
        let entry = CacheEntry::new(data, self.clock.now(), ttl);
        debug!(key = %key, ttl_secs = ttl.as_secs(), "Cache entry stored");
        self.entries.insert(key, entry);
    }

    /// Mark one key, or every key when `None`, as stale. Data is kept.
    pub fn invalidate(&mut self, key: Option<ResourceKey>) {
        match key {
            Some(key) => {
                if let Some(entry) = self.entries.get_mut(&key) {
                    entry.invalidated = true;
                    debug!(key = %key, "Cache entry invalidated");
                }
            }
            None => {
                for entry in self.entries.values_mut() {
                    entry.invalidated = true;
                }
                debug!(count = self.entries.len(), "All cache entries invalidated");
            }
        }
    }

    /// Discard every entry.
    pub fn clear(&mut self) {
        debug!(count = self.entries.len(), "Cache cleared");
        self.entries.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn ttl_for(&self, key: ResourceKey) -> Duration {
        self.policy.ttl_for(key)
    }

    /// Human-readable age of the entry for `key`, or "never".
    pub fn age_display(&self, key: ResourceKey) -> String {
        match self.entries.get(&key) {
            Some(entry) => entry.age_display(self.clock.now()),
            None => "never".to_string(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
