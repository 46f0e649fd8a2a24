//! Coordinator Statistics Module
//!
//! Lock-free counters describing how callers were served.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

#[derive(Debug, Default)]
pub(crate) struct CoordinatorCounters {
    hits: AtomicU64,
    fetches: AtomicU64,
    coalesced: AtomicU64,
    failures: AtomicU64,
}

impl CoordinatorCounters {
    pub(crate) fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_fetch(&self) {
        self.fetches.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_coalesced(&self) {
        self.coalesced.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_failure(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self, in_flight: usize) -> CoordinatorStats {
        CoordinatorStats {
            hits: self.hits.load(Ordering::Relaxed),
            fetches: self.fetches.load(Ordering::Relaxed),
            coalesced: self.coalesced.load(Ordering::Relaxed),
            failed_fetches: self.failures.load(Ordering::Relaxed),
            in_flight,
        }
    }
}

// == Coordinator Stats ==
/// Point-in-time view of the coordinator's counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CoordinatorStats {
    /// Calls answered straight from the store
    pub hits: u64,
    /// Upstream fetches started
    pub fetches: u64,
    /// Calls that joined a fetch already in flight
    pub coalesced: u64,
    /// Fetches that settled with an error or panic
    pub failed_fetches: u64,
    /// Fetches currently registered as pending
    pub in_flight: usize,
}
