//! Error types for the caching service
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// == Upstream Error Enum ==
/// Failure of a single upstream fetch.
///
/// Cloneable so that every caller coalesced onto the same fetch receives
/// the same error.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UpstreamError {
    /// The request did not complete within the configured timeout
    #[error("Upstream request timed out")]
    Timeout,

    /// Connection or protocol failure
    #[error("Upstream request failed: {0}")]
    Request(String),

    /// Upstream answered with a non-success status
    #[error("Upstream returned status {0}")]
    Status(u16),

    /// Body was not valid JSON
    #[error("Upstream response could not be decoded: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for UpstreamError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            UpstreamError::Timeout
        } else if err.is_decode() {
            UpstreamError::Decode(err.to_string())
        } else {
            UpstreamError::Request(err.to_string())
        }
    }
}

// == Cache Error Enum ==
/// Unified error type for the caching service.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Rejected configuration value
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Upstream fetch failed
    #[error(transparent)]
    Upstream(#[from] UpstreamError),
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let status = match &self {
            CacheError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            CacheError::InvalidConfig(_) => StatusCode::INTERNAL_SERVER_ERROR,
            CacheError::Upstream(UpstreamError::Timeout) => StatusCode::GATEWAY_TIMEOUT,
            CacheError::Upstream(UpstreamError::Status(404)) => StatusCode::NOT_FOUND,
            CacheError::Upstream(_) => StatusCode::BAD_GATEWAY,
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the caching service.
pub type Result<T> = std::result::Result<T, CacheError>;

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[test]
    fn test_error_status_codes() {
        let test_cases = vec![
            (
                CacheError::InvalidRequest("bad".to_string()),
                StatusCode::BAD_REQUEST,
            ),
            (
                CacheError::InvalidConfig("zero".to_string()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                CacheError::Upstream(UpstreamError::Timeout),
                StatusCode::GATEWAY_TIMEOUT,
            ),
            (
                CacheError::Upstream(UpstreamError::Status(404)),
                StatusCode::NOT_FOUND,
            ),
            (
                CacheError::Upstream(UpstreamError::Status(500)),
                StatusCode::BAD_GATEWAY,
            ),
            (
                CacheError::Upstream(UpstreamError::Decode("eof".to_string())),
                StatusCode::BAD_GATEWAY,
            ),
        ];

        for (error, expected_status) in test_cases {
            let response = error.into_response();
            assert_eq!(
                response.status(),
                expected_status,
                "Error should map to correct HTTP status"
            );
        }
    }

    #[tokio::test]
    async fn test_error_body_is_json() {
        let response = CacheError::Upstream(UpstreamError::Status(503)).into_response();

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

        assert_eq!(json["error"], "Upstream returned status 503");
    }
}
