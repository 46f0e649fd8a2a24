//! Request DTOs for the cache service API
//!
//! Defines the structure of incoming query parameters.

use serde::Deserialize;

/// Query for the key status endpoint (GET /cache/status?key=...)
#[derive(Debug, Clone, Deserialize)]
pub struct KeyQuery {
    /// The cache key to inspect
    pub key: String,
}

impl KeyQuery {
    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if self.key.is_empty() {
            return Some("Key cannot be empty".to_string());
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_query_deserialize() {
        let json = r#"{"key": "markets?limit=10"}"#;
        let req: KeyQuery = serde_json::from_str(json).unwrap();
        assert_eq!(req.key, "markets?limit=10");
        assert!(req.validate().is_none());
    }

    #[test]
    fn test_validate_empty_key() {
        let req = KeyQuery { key: String::new() };
        assert!(req.validate().is_some());
    }
}
