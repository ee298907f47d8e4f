use std::time::Duration;

use axum::http::{HeaderName, HeaderValue, Method, header};
use tower_http::cors::{AllowOrigin, CorsLayer};

use super::{
    X_CACHE, X_CACHE_TTL, X_RATELIMIT_LIMIT, X_RATELIMIT_REMAINING, X_RATELIMIT_RESET,
    X_REQUEST_ID,
};

const PREFLIGHT_MAX_AGE: Duration = Duration::from_secs(86_400);

/// CORS for the browser client: the configured origins plus local
/// development servers on any port.
pub fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let allowed = allowed_origins.to_vec();
    let exposed: [HeaderName; 7] = [
        X_RATELIMIT_LIMIT,
        X_RATELIMIT_REMAINING,
        X_RATELIMIT_RESET,
        header::RETRY_AFTER,
        X_CACHE,
        X_CACHE_TTL,
        X_REQUEST_ID,
    ];

    CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(move |origin: &HeaderValue, _| {
            origin
                .to_str()
                .is_ok_and(|o| is_origin_allowed(&allowed, o))
        }))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .expose_headers(exposed)
        .allow_credentials(true)
        .max_age(PREFLIGHT_MAX_AGE)
}

pub fn is_origin_allowed(allowed: &[String], origin: &str) -> bool {
    allowed.iter().any(|a| a == origin) || is_local_origin(origin)
}

fn is_local_origin(origin: &str) -> bool {
    let Some(authority) = origin
        .strip_prefix("http://")
        .or_else(|| origin.strip_prefix("https://"))
    else {
        return false;
    };
    match authority.split_once(':') {
        Some((host, port)) => {
            matches!(host, "localhost" | "127.0.0.1")
                && !port.is_empty()
                && port.chars().all(|c| c.is_ascii_digit())
        }
        None => false,
    }
}
