//! Read-Through Cache Module
//!
//! Pairs a store with a coordinator and populates the store on successful fetches.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use super::{CoordinatorStats, FetchCoordinator};
use crate::cache::{shared_store, BoundedCacheStore, CacheStats, Clock, SharedStore};

/// Combined statistics of the store and the coordinator.
#[derive(Debug, Clone, Serialize)]
pub struct ReadThroughStats {
    pub store: CacheStats,
    pub coordinator: CoordinatorStats,
}

// == Read-Through Cache ==
/// A store and its coordinator, constructed once and handed to whoever needs them.
///
/// Cloning yields another handle to the same store and registry.
pub struct ReadThroughCache<T, E> {
    store: SharedStore<T>,
    coordinator: FetchCoordinator<T, E>,
}

impl<T, E> Clone for ReadThroughCache<T, E> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            coordinator: self.coordinator.clone(),
        }
    }
}

impl<T, E> ReadThroughCache<T, E>
where
    T: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    pub fn new(max_entries: usize) -> Self {
        Self::from_store(BoundedCacheStore::new(max_entries))
    }

    pub fn with_clock(max_entries: usize, clock: Arc<dyn Clock>) -> Self {
        Self::from_store(BoundedCacheStore::with_clock(max_entries, clock))
    }

    pub fn from_store(store: BoundedCacheStore<T>) -> Self {
        Self {
            store: shared_store(store),
            coordinator: FetchCoordinator::new(),
        }
    }

    // == Get Or Fetch ==
    /// Returns the cached value for `key`, or fetches and caches it for `ttl`.
    ///
    /// The value is written to the store before the shared fetch settles, so
    /// by the time the key leaves the pending registry it is already cached.
    /// Errors are returned to every waiting caller and nothing is stored.
    pub async fn get_or_fetch<F, Fut>(&self, key: &str, ttl: Duration, fetch: F) -> Result<T, E>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        let store = Arc::clone(&self.store);
        let owned_key = key.to_owned();

        self.coordinator
            .resolve(key, &self.store, move || async move {
                let value = fetch().await?;
                store.lock().set(owned_key, value.clone(), ttl);
                Ok::<T, E>(value)
            })
            .await
    }

    pub fn store(&self) -> &SharedStore<T> {
        &self.store
    }

    pub fn coordinator(&self) -> &FetchCoordinator<T, E> {
        &self.coordinator
    }

    /// Empties the store and returns how many entries were dropped.
    /// Fetches already in flight are unaffected.
    pub fn clear(&self) -> usize {
        let mut store = self.store.lock();
        let cleared = store.len();
        store.clear();
        cleared
    }

    pub fn stats(&self) -> ReadThroughStats {
        ReadThroughStats {
            store: self.store.lock().stats(),
            coordinator: self.coordinator.stats(),
        }
    }
}
