//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with TTL support.

use std::time::{Duration, Instant};

// == Cache Entry ==
/// A single cached value with the instant it was stored and its TTL.
///
/// The payload is never mutated after construction. Re-setting a key builds
/// a fresh entry with a new timestamp and TTL.
#[derive(Debug, Clone)]
pub struct CacheEntry<T> {
    data: T,
    stored_at: Instant,
    ttl: Duration,
}

impl<T> CacheEntry<T> {
    // == Constructor ==
    /// Creates a new entry stored at `stored_at` that lives for `ttl`.
    pub fn new(data: T, stored_at: Instant, ttl: Duration) -> Self {
        Self {
            data,
            stored_at,
            ttl,
        }
    }

    /// Returns a reference to the stored payload.
    pub fn data(&self) -> &T {
        &self.data
    }

    /// Consumes the entry and returns the payload.
    pub fn into_data(self) -> T {
        self.data
    }

    pub fn stored_at(&self) -> Instant {
        self.stored_at
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    // == Is Expired ==
    /// Checks whether the entry is stale at `now`.
    ///
    /// Boundary condition: an entry is expired once the elapsed time is
    /// strictly greater than its TTL, so it is still served at exactly
    /// `elapsed == ttl`. A zero TTL marks the entry stale from the start.
    pub fn is_expired_at(&self, now: Instant) -> bool {
        self.ttl.is_zero() || now.saturating_duration_since(self.stored_at) > self.ttl
    }

    // == Time To Live ==
    /// Returns the remaining lifetime at `now`, or zero once expired.
    pub fn ttl_remaining_at(&self, now: Instant) -> Duration {
        self.ttl
            .saturating_sub(now.saturating_duration_since(self.stored_at))
    }
}
