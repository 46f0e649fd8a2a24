//! Cache Key Derivation
//!
//! Builds deterministic cache keys from an upstream path and query string.

/// Returns `path` plus its query parameters in sorted order.
///
/// Two requests that differ only in parameter order map to the same key.
/// Empty parameters are dropped and a missing query yields the bare path.
pub fn cache_key(path: &str, query: Option<&str>) -> String {
    let path = path.trim_matches('/');
    let mut params: Vec<&str> = query
        .unwrap_or_default()
        .split('&')
        .filter(|p| !p.is_empty())
        .collect();

    if params.is_empty() {
        return path.to_string();
    }

    params.sort_unstable();
    format!("{}?{}", path, params.join("&"))
}
