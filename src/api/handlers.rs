//! API Handlers
//!
//! HTTP request handlers for each endpoint of the caching service.

use std::time::Duration;

use axum::{
    extract::{Path, Query, RawQuery, State},
    Json,
};
use serde_json::Value;

use crate::config::Config;
use crate::coordinator::ReadThroughCache;
use crate::error::{CacheError, Result, UpstreamError};
use crate::models::{ClearResponse, HealthResponse, KeyQuery, KeyStatusResponse, StatsResponse};
use crate::upstream::{cache_key, UpstreamClient};

/// Cache of decoded upstream JSON responses.
pub type ProxyCache = ReadThroughCache<Value, UpstreamError>;

/// Application state shared across all handlers.
///
/// The cache is built once at startup and cloned into each handler; clones
/// share the same store and pending-fetch registry.
#[derive(Clone)]
pub struct AppState {
    pub cache: ProxyCache,
    pub upstream: UpstreamClient,
    /// TTL applied to every proxied response
    pub default_ttl: Duration,
}

impl AppState {
    /// Creates a new AppState from its parts.
    pub fn new(cache: ProxyCache, upstream: UpstreamClient, default_ttl: Duration) -> Self {
        Self {
            cache,
            upstream,
            default_ttl,
        }
    }

    /// Creates a new AppState from configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        let upstream = UpstreamClient::from_config(config)?;
        Ok(Self::new(
            ReadThroughCache::new(config.max_entries),
            upstream,
            config.default_ttl(),
        ))
    }
}

/// Handler for GET /proxy/*path
///
/// Serves the upstream response for `path` and its query from the cache,
/// fetching it on a miss. Concurrent misses on the same key share one fetch.
/// The normalized key is only used for lookup; the upstream receives the query
/// exactly as the client sent it.
pub async fn proxy_handler(
    State(state): State<AppState>,
    Path(path): Path<String>,
    RawQuery(query): RawQuery,
) -> Result<Json<Value>> {
    let key = cache_key(&path, query.as_deref());
    let upstream = state.upstream.clone();
    let target = match query.as_deref() {
        Some(query) if !query.is_empty() => format!("{}?{}", path, query),
        _ => path,
    };

    let value = state
        .cache
        .get_or_fetch(&key, state.default_ttl, move || async move {
            upstream.fetch_json(&target).await
        })
        .await?;

    Ok(Json(value))
}

/// Handler for GET /cache/status?key=...
///
/// Reports membership and staleness of a key without touching its recency.
pub async fn key_status_handler(
    State(state): State<AppState>,
    Query(req): Query<KeyQuery>,
) -> Result<Json<KeyStatusResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let (present, stale) = {
        let store = state.cache.store().lock();
        (store.has(&req.key), store.is_stale(&req.key))
    };
    let fetching = state.cache.coordinator().is_pending(&req.key);

    Ok(Json(KeyStatusResponse {
        key: req.key,
        present,
        stale,
        fetching,
    }))
}

/// Handler for DELETE /cache
///
/// Drops every cached entry.
pub async fn clear_handler(State(state): State<AppState>) -> Json<ClearResponse> {
    Json(ClearResponse::new(state.cache.clear()))
}

/// Handler for GET /stats
///
/// Returns store and coordinator statistics.
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse::from(state.cache.stats()))
}

/// Handler for GET /health
///
/// Returns health status of the server.
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
