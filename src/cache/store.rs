//! Cache Store Module
//!
//! Main cache engine combining HashMap storage with LRU tracking and lazy TTL expiration.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::cache::{CacheEntry, CacheStats, Clock, LruTracker, NodeId, SystemClock};

/// Entry plus the handle of its node in the recency list.
///
/// Keeping both under one map key means the entry map and the node index can
/// never disagree on which keys are live.
#[derive(Debug)]
struct Slot<T> {
    entry: CacheEntry<T>,
    node: NodeId,
}

// == Cache Store ==
/// Bounded key-value store with per-entry TTL and O(1) LRU eviction.
///
/// Stale entries are never swept in the background. They are dropped when a
/// `get` finds them, or when LRU pressure pushes them out.
#[derive(Debug)]
pub struct BoundedCacheStore<T> {
    entries: HashMap<String, Slot<T>>,
    lru: LruTracker,
    stats: CacheStats,
    max_entries: usize,
    clock: Arc<dyn Clock>,
}

impl<T> BoundedCacheStore<T> {
    // == Constructor ==
    /// Creates a store holding at most `max_entries` keys.
    pub fn new(max_entries: usize) -> Self {
        Self::with_clock(max_entries, Arc::new(SystemClock))
    }

    /// Creates a store that reads time from `clock`.
    ///
    /// A capacity of zero could never hold an entry, so it is raised to one.
    pub fn with_clock(max_entries: usize, clock: Arc<dyn Clock>) -> Self {
        let max_entries = if max_entries == 0 {
            warn!("Cache capacity of 0 requested, using 1 instead");
            1
        } else {
            max_entries
        };

        Self {
            entries: HashMap::with_capacity(max_entries),
            lru: LruTracker::with_capacity(max_entries),
            stats: CacheStats::new(),
            max_entries,
            clock,
        }
    }

    // == Set ==
    /// Stores `data` under `key` for `ttl`.
    ///
    /// An existing key gets a brand new entry and becomes most recently used
    /// without evicting anything. A new key on a full store first evicts the
    /// least recently used key.
    pub fn set(&mut self, key: impl Into<String>, data: T, ttl: Duration) {
        let key = key.into();
        let entry = CacheEntry::new(data, self.clock.now(), ttl);

        if let Some(slot) = self.entries.get_mut(&key) {
            slot.entry = entry;
            self.lru.touch(slot.node);
            return;
        }

        if self.entries.len() >= self.max_entries {
            self.evict_oldest();
        }

        let node = self.lru.push_front(key.clone());
        self.entries.insert(key, Slot { entry, node });
    }

    // == Get ==
    /// Returns a clone of the value under `key` if present and fresh.
    ///
    /// A stale entry is removed on the spot and reported as absent. A fresh
    /// hit promotes the key to most recently used.
    pub fn get(&mut self, key: &str) -> Option<T>
    where
        T: Clone,
    {
        let now = self.clock.now();
        let (expired, node) = match self.entries.get(key) {
            Some(slot) => (slot.entry.is_expired_at(now), slot.node),
            None => {
                self.stats.record_miss();
                return None;
            }
        };

        if expired {
            self.remove_slot(key);
            self.stats.record_expiration();
            self.stats.record_miss();
            debug!("Dropped stale entry for key '{}'", key);
            return None;
        }

        self.lru.touch(node);
        self.stats.record_hit();
        self.entries.get(key).map(|slot| slot.entry.data().clone())
    }

    // == Has ==
    /// Reports raw membership without looking at staleness.
    ///
    /// `true` does not mean a following `get` will return a value.
    pub fn has(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    // == Is Stale ==
    /// Returns `true` if `key` is absent or expired, `false` only when present and fresh.
    ///
    /// Does not remove anything or change recency.
    pub fn is_stale(&self, key: &str) -> bool {
        match self.entries.get(key) {
            Some(slot) => slot.entry.is_expired_at(self.clock.now()),
            None => true,
        }
    }

    // == Remove ==
    /// Deletes `key` regardless of freshness and returns its value.
    pub fn remove(&mut self, key: &str) -> Option<T> {
        self.remove_slot(key).map(|slot| slot.entry.into_data())
    }

    // == Clear ==
    /// Drops every entry and the whole recency list.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.lru.clear();
    }

    // == Length ==
    /// Returns the current number of entries, stale ones included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.max_entries
    }

    /// Keys ordered from most to least recently used.
    pub fn keys_by_recency(&self) -> Vec<String> {
        self.lru.iter().map(str::to_owned).collect()
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_total_entries(self.entries.len());
        stats
    }

    fn evict_oldest(&mut self) {
        if let Some(evicted) = self.lru.evict_oldest() {
            self.entries.remove(&evicted);
            self.stats.record_eviction();
            debug!("Evicted least recently used key '{}'", evicted);
        }
    }

    fn remove_slot(&mut self, key: &str) -> Option<Slot<T>> {
        let slot = self.entries.remove(key)?;
        self.lru.remove(slot.node);
        Some(slot)
    }

    #[cfg(test)]
    pub(crate) fn assert_consistent(&self) {
        assert!(self.entries.len() <= self.max_entries);
        assert_eq!(self.entries.len(), self.lru.len());
        for key in self.lru.iter() {
            assert!(self.entries.contains_key(key), "orphan node for '{}'", key);
        }
    }
}
