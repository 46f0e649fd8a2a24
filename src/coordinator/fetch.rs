//! Fetch Coordinator Module
//!
//! Guarantees at most one upstream fetch in flight per cache key.
//!
//! Concurrent callers that miss the store on the same key share a single
//! [`Shared`] future. The first caller registers it and every later caller
//! clones it out of the registry, so all of them observe the same value or
//! the same error.

use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use futures::future::{BoxFuture, FutureExt, Shared};
use tracing::{debug, warn};

use super::stats::{CoordinatorCounters, CoordinatorStats};
use crate::cache::SharedStore;

type SharedFetch<T, E> = Shared<BoxFuture<'static, Result<T, E>>>;

struct PendingFetch<T, E> {
    /// Distinguishes this fetch from any later one registered under the same key
    id: u64,
    future: SharedFetch<T, E>,
}

struct Registry<T, E> {
    pending: DashMap<String, PendingFetch<T, E>>,
    next_id: AtomicU64,
    counters: CoordinatorCounters,
}

// == Fetch Coordinator ==
/// Stampede protection in front of a [`SharedStore`].
///
/// Cloning is cheap and clones share the same pending-fetch registry.
pub struct FetchCoordinator<T, E> {
    registry: Arc<Registry<T, E>>,
}

impl<T, E> Clone for FetchCoordinator<T, E> {
    fn clone(&self) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
        }
    }
}

impl<T, E> Default for FetchCoordinator<T, E> {
    fn default() -> Self {
        Self {
            registry: Arc::new(Registry {
                pending: DashMap::new(),
                next_id: AtomicU64::new(0),
                counters: CoordinatorCounters::default(),
            }),
        }
    }
}

impl<T, E> std::fmt::Debug for FetchCoordinator<T, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetchCoordinator")
            .field("in_flight", &self.registry.pending.len())
            .finish()
    }
}

impl<T, E> FetchCoordinator<T, E>
where
    T: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self::default()
    }

    // == Resolve ==
    /// Returns the value for `key`, fetching it at most once across concurrent callers.
    ///
    /// 1. A fresh value in `store` is returned immediately.
    /// 2. If a fetch for `key` is already in flight, the caller waits on it.
    /// 3. Otherwise `fetch` is registered and run, and its outcome is shared.
    ///
    /// The fetch runs on its own tokio task, so it keeps going when callers are
    /// dropped. The registry entry is removed as soon as the fetch settles,
    /// whether it succeeded, failed or panicked. Populating `store` is left to
    /// `fetch`, and failures are never cached.
    ///
    /// Must be called from within a tokio runtime.
    pub async fn resolve<F, Fut>(&self, key: &str, store: &SharedStore<T>, fetch: F) -> Result<T, E>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        let cached = store.lock().get(key);
        if let Some(value) = cached {
            self.registry.counters.record_hit();
            debug!("Cache hit for key '{}'", key);
            return Ok(value);
        }

        let future = match self.registry.pending.entry(key.to_owned()) {
            Entry::Occupied(occupied) => {
                self.registry.counters.record_coalesced();
                debug!("Joining in-flight fetch for key '{}'", key);
                occupied.get().future.clone()
            }
            Entry::Vacant(vacant) => {
                // A fetch may have filled the store and deregistered after the check above.
                let cached = store.lock().get(key);
                if let Some(value) = cached {
                    self.registry.counters.record_hit();
                    debug!("Cache hit for key '{}' after concurrent fetch", key);
                    return Ok(value);
                }

                let id = self.registry.next_id.fetch_add(1, Ordering::Relaxed);
                let future = launch(Arc::downgrade(&self.registry), vacant.key().clone(), id, fetch);
                vacant.insert(PendingFetch {
                    id,
                    future: future.clone(),
                });
                self.registry.counters.record_fetch();
                debug!("Cache miss for key '{}', fetching", key);
                future
            }
        };

        future.await
    }

    /// Number of fetches currently in flight.
    pub fn in_flight(&self) -> usize {
        self.registry.pending.len()
    }

    /// Whether a fetch for `key` is currently in flight.
    pub fn is_pending(&self, key: &str) -> bool {
        self.registry.pending.contains_key(key)
    }

    pub fn stats(&self) -> CoordinatorStats {
        self.registry.counters.snapshot(self.in_flight())
    }
}

/// Spawns `fetch` onto the runtime so it settles even if every waiter is dropped.
///
/// The task deregisters the fetch when it settles, whether it succeeded,
/// failed or panicked. `fetch` is only called once the task first runs, inside
/// `catch_unwind`, so a panic while building its future is handled like one
/// raised while awaiting it. Panics are re-raised in every waiting caller.
fn launch<T, E, F, Fut>(
    registry: Weak<Registry<T, E>>,
    key: String,
    id: u64,
    fetch: F,
) -> SharedFetch<T, E>
where
    T: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
    F: FnOnce() -> Fut + Send + 'static,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
{
    let task_key = key.clone();
    let handle = tokio::spawn(async move {
        let key = task_key;
        let outcome = AssertUnwindSafe(async move { fetch().await })
            .catch_unwind()
            .await;

        if let Some(registry) = registry.upgrade() {
            registry
                .pending
                .remove_if(&key, |_, pending| pending.id == id);
            if !matches!(outcome, Ok(Ok(_))) {
                registry.counters.record_failure();
            }
        }

        match outcome {
            Ok(result) => {
                if result.is_err() {
                    debug!("Fetch for key '{}' failed", key);
                }
                result
            }
            Err(payload) => {
                warn!("Fetch for key '{}' panicked", key);
                panic::resume_unwind(payload)
            }
        }
    });

    async move {
        match handle.await {
            Ok(result) => result,
            Err(err) => match err.try_into_panic() {
                Ok(payload) => panic::resume_unwind(payload),
                Err(err) => {
                    warn!("Fetch for key '{}' did not complete: {}", key, err);
                    panic::resume_unwind(Box::new(err.to_string()))
                }
            },
        }
    }
    .boxed()
    .shared()
}
