mod auth;
mod cors;
mod error_handler;
mod rate_limit;
mod response_cache;

pub use auth::require_admin;
pub use cors::{cors_layer, is_origin_allowed};
pub use error_handler::{X_REQUEST_ID, log_errors};
pub use rate_limit::{
    RateLimitGuard, X_RATELIMIT_LIMIT, X_RATELIMIT_REMAINING, X_RATELIMIT_RESET,
    apply_rate_limit_headers, rate_limit,
};
pub use response_cache::{ResponseCacheState, X_CACHE, X_CACHE_TTL, cache_response};
