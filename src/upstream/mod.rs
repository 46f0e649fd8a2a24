//! Upstream Module
//!
//! The HTTP API sitting behind the cache, and how its requests map to cache keys.

mod client;
mod key;

pub use client::UpstreamClient;
pub use key::cache_key;
