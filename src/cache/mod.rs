// In-process TTL cache and the types the response cache stores in it.

pub mod keys;
pub mod models;
pub mod operations;

pub use keys::{KeyPattern, request_key};
pub use models::{CacheEntry, CacheStats, CachedResponse};
pub use operations::TtlCache;

/// The cache instance behind the response-caching middleware.
pub type ResponseCache = TtlCache<CachedResponse>;
