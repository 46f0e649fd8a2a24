//! Coordinator Module
//!
//! Stampede protection and the read-through facade built on the cache store.

mod fetch;
mod read_through;
mod stats;

pub use fetch::FetchCoordinator;
pub use read_through::{ReadThroughCache, ReadThroughStats};
pub use stats::CoordinatorStats;
