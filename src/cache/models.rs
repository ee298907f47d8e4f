use axum::body::Bytes;
use axum::http::HeaderValue;
use serde::Serialize;
use tokio::time::Instant;

/// Stored value plus its expiry instant.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    pub value: V,
    pub expires_at: Instant,
}

impl<V> CacheEntry<V> {
    /// An entry is dead from its expiry instant onwards, so a live entry
    /// always has `expires_at > now`.
    pub fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CacheStats {
    pub size: usize,
    pub keys: Vec<String>,
}

/// A successful response body captured by the response cache.
#[derive(Debug, Clone)]
pub struct CachedResponse {
    pub body: Bytes,
    pub content_type: Option<HeaderValue>,
}
