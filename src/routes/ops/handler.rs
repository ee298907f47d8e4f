use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::{
    AppState,
    cache::KeyPattern,
    utils::{error_codes, error_to_api_response, success_to_api_response},
};

use super::model::{InvalidateCacheQuery, RemovedResponse};

pub async fn cache_stats(State(state): State<AppState>) -> impl IntoResponse {
    success_to_api_response(state.cache.stats())
}

pub async fn invalidate_cache(
    State(state): State<AppState>,
    Query(query): Query<InvalidateCacheQuery>,
) -> impl IntoResponse {
    let removed = match (query.key, query.prefix) {
        (Some(_), Some(_)) => {
            return (
                StatusCode::BAD_REQUEST,
                error_to_api_response(
                    error_codes::VALIDATION_ERROR,
                    "Pass either key or prefix, not both".to_string(),
                ),
            );
        }
        (Some(key), None) => state.cache.invalidate(&KeyPattern::Exact(key)),
        (None, Some(prefix)) => state.cache.invalidate(&KeyPattern::Prefix(prefix)),
        (None, None) => state.cache.clear(),
    };
    tracing::info!("Invalidated {} cached responses", removed);

    (
        StatusCode::OK,
        success_to_api_response(RemovedResponse { removed }),
    )
}

pub async fn rate_limit_stats(State(state): State<AppState>) -> impl IntoResponse {
    success_to_api_response(state.limiter.stats())
}

pub async fn clear_rate_limits(State(state): State<AppState>) -> impl IntoResponse {
    let removed = state.limiter.clear();
    tracing::info!("Cleared {} rate limit records", removed);
    success_to_api_response(RemovedResponse { removed })
}

pub async fn reset_client(
    State(state): State<AppState>,
    Path(client): Path<String>,
) -> impl IntoResponse {
    let removed = state.limiter.reset_client(&client);
    tracing::info!("Reset {} rate limit records for {}", removed, client);
    success_to_api_response(RemovedResponse { removed })
}
