use std::sync::Arc;

use axum::{
    Router,
    middleware::{from_fn, from_fn_with_state},
    routing::{delete, get},
};

use crate::{
    AppState,
    middleware::{
        RateLimitGuard, ResponseCacheState, cache_response, cors_layer, log_errors, rate_limit,
        require_admin,
    },
    routes::{meta, ops},
};

// Public API routes, nested under the configured base URI
fn api_routes(state: &AppState) -> Router<AppState> {
    let cached = ResponseCacheState::new(Arc::clone(&state.cache), state.config.cache_ttl());

    Router::new().route(
        "/version",
        get(meta::version).layer(from_fn_with_state(cached, cache_response)),
    )
}

// Operational routes, admin token required
fn ops_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/cache", get(ops::cache_stats).delete(ops::invalidate_cache))
        .route(
            "/rate-limit",
            get(ops::rate_limit_stats).delete(ops::clear_rate_limits),
        )
        .route("/rate-limit/{client}", delete(ops::reset_client))
        .route_layer(from_fn_with_state(state.clone(), require_admin))
}

/// Assembles the full application: routes, rate limiting on every request,
/// error logging and CORS.
pub fn create_router(state: AppState) -> Router {
    let guard = Arc::new(RateLimitGuard::new(
        Arc::clone(&state.limiter),
        state.config.rate_limit_default,
        state.config.rate_limit_endpoints.clone(),
    ));

    let router = Router::new()
        .route("/health", get(meta::health))
        .nest(&state.config.api_base_uri, api_routes(&state))
        .nest("/ops", ops_routes(&state));

    router
        .layer(from_fn(log_errors))
        .layer(from_fn_with_state(guard, rate_limit))
        .layer(cors_layer(&state.config.allowed_origins))
        .with_state(state)
}
