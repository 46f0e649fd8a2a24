//! Response DTOs for the cache service API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;

use crate::cache::CacheStats;
use crate::coordinator::{CoordinatorStats, ReadThroughStats};

/// Response body for GET /cache/status
#[derive(Debug, Clone, Serialize)]
pub struct KeyStatusResponse {
    pub key: String,
    /// Whether the store holds an entry, fresh or not
    pub present: bool,
    /// Whether the entry is absent or expired
    pub stale: bool,
    /// Whether a fetch for the key is currently in flight
    pub fetching: bool,
}

/// Response body for DELETE /cache
#[derive(Debug, Clone, Serialize)]
pub struct ClearResponse {
    pub message: String,
    /// Number of entries dropped
    pub cleared: usize,
}

impl ClearResponse {
    pub fn new(cleared: usize) -> Self {
        Self {
            message: format!("Cleared {} entries", cleared),
            cleared,
        }
    }
}

/// Response body for the stats endpoint (GET /stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    pub store: CacheStats,
    pub coordinator: CoordinatorStats,
    /// Hit rate of store lookups (hits / (hits + misses))
    pub hit_rate: f64,
}

impl From<ReadThroughStats> for StatsResponse {
    fn from(stats: ReadThroughStats) -> Self {
        Self {
            hit_rate: stats.store.hit_rate(),
            store: stats.store,
            coordinator: stats.coordinator,
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}
