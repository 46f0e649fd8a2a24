//! API Module
//!
//! HTTP handlers and routing for the caching service.
//!
//! # Endpoints
//! - `GET /proxy/*path` - Read-through fetch from the upstream API
//! - `GET /cache/status?key=...` - Presence and staleness of a key
//! - `DELETE /cache` - Drop all cached entries
//! - `GET /stats` - Store and coordinator statistics
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
