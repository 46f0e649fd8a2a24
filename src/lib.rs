//! Read-through cache - a caching layer in front of a third-party HTTP API
//!
//! Provides a bounded store with lazy TTL expiration and O(1) LRU eviction,
//! plus a coordinator that keeps at most one upstream fetch in flight per key.

pub mod api;
pub mod cache;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod models;
pub mod upstream;

pub use api::AppState;
pub use cache::{BoundedCacheStore, SharedStore};
pub use config::Config;
pub use coordinator::{FetchCoordinator, ReadThroughCache};
