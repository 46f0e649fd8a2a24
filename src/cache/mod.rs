//! Cache Module
//!
//! Provides a bounded in-memory store with lazy TTL expiration and O(1) LRU eviction.

mod clock;
mod entry;
mod lru;
mod stats;
mod store;


use std::sync::Arc;

use parking_lot::Mutex;

// Re-export public types
pub use clock::{Clock, ManualClock, SystemClock};
pub use entry::CacheEntry;
pub use lru::{LruTracker, NodeId};
pub use stats::CacheStats;
pub use store::BoundedCacheStore;

/// Store handle shared between the coordinator and fetch closures.
///
/// Store operations never suspend, so the lock is only ever held for the
/// duration of a single synchronous call.
pub type SharedStore<T> = Arc<Mutex<BoundedCacheStore<T>>>;

/// Wraps a store for sharing across tasks.
pub fn shared_store<T>(store: BoundedCacheStore<T>) -> SharedStore<T> {
    Arc::new(Mutex::new(store))
}
