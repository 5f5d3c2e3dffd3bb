//! Request keys for cache entries.
//!
//! Entries are addressed by method and URL only; request bodies and
//! headers never participate in the key.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Lookup key for a cached request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestKey {
    pub method: String,
    pub url: String,
}

impl RequestKey {
    /// Build a key, upper-casing the method.
    pub fn new(method: &str, url: impl Into<String>) -> Self {
        Self { method: method.to_ascii_uppercase(), url: url.into() }
    }

    /// Shorthand for a GET key, the only method the shell caches.
    pub fn get(url: impl Into<String>) -> Self {
        Self::new("GET", url)
    }

    /// Content-addressed digest used as the entry's storage key.
    pub fn digest(&self) -> String {
        compute_request_key(&self.method, &self.url)
    }
}

impl std::fmt::Display for RequestKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.method, self.url)
    }
}

/// Compute the SHA-256 storage key for a method and URL.
pub fn compute_request_key(method: &str, url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(method.as_bytes());
    hasher.update(b"\n");
    hasher.update(url.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_stability() {
        let hash1 = compute_request_key("GET", "https://example.com/");
        let hash2 = compute_request_key("GET", "https://example.com/");
        assert_eq!(hash1, hash2);
    }

    #[test]
    fn test_hash_different_method() {
        let get = compute_request_key("GET", "https://example.com/");
        let head = compute_request_key("HEAD", "https://example.com/");
        assert_ne!(get, head);
    }

    #[test]
    fn test_hash_format() {
        let hash = compute_request_key("GET", "https://example.com/");
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_method_is_normalized() {
        let key = RequestKey::new("get", "https://example.com/app.js");
        assert_eq!(key.method, "GET");
        assert_eq!(key, RequestKey::get("https://example.com/app.js"));
        assert_eq!(key.digest(), RequestKey::get("https://example.com/app.js").digest());
    }

    #[test]
    fn test_display() {
        let key = RequestKey::get("https://example.com/");
        assert_eq!(key.to_string(), "GET https://example.com/");
    }
}
