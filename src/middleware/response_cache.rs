use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::{Body, HttpBody, to_bytes},
    extract::{OriginalUri, State},
    http::{HeaderMap, HeaderName, HeaderValue, Method, Request, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::{debug, error};

use crate::{
    cache::{CachedResponse, ResponseCache, request_key},
    error::AppError,
};

pub const X_CACHE: HeaderName = HeaderName::from_static("x-cache");
pub const X_CACHE_TTL: HeaderName = HeaderName::from_static("x-cache-ttl");

/// Responses larger than this are served but never cached.
const MAX_CACHEABLE_BODY: usize = 1024 * 1024;

/// Cache and TTL for one group of cached routes.
#[derive(Clone)]
pub struct ResponseCacheState {
    cache: Arc<ResponseCache>,
    ttl: Duration,
}

impl ResponseCacheState {
    pub fn new(cache: Arc<ResponseCache>, ttl: Duration) -> Self {
        Self { cache, ttl }
    }
}

/// Serves GET requests from the response cache, keyed by path and query.
/// Only 2xx results are stored.
pub async fn cache_response(
    State(state): State<ResponseCacheState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    if req.method() != Method::GET {
        return next.run(req).await;
    }

    let key = match req.extensions().get::<OriginalUri>() {
        Some(uri) => request_key(&uri.0),
        None => request_key(req.uri()),
    };

    if let Some(cached) = state.cache.get(&key) {
        debug!("cache hit: {}", key);
        let mut response = (StatusCode::OK, Body::from(cached.body)).into_response();
        if let Some(content_type) = cached.content_type {
            response
                .headers_mut()
                .insert(header::CONTENT_TYPE, content_type);
        }
        mark(response.headers_mut(), "HIT", state.ttl);
        return response;
    }

    let response = next.run(req).await;
    if !response.status().is_success() {
        return response;
    }

    let (mut parts, body) = response.into_parts();
    // streamed or oversized bodies pass through uncached
    if body
        .size_hint()
        .upper()
        .is_none_or(|len| len > MAX_CACHEABLE_BODY as u64)
    {
        return Response::from_parts(parts, body);
    }
    let bytes = match to_bytes(body, MAX_CACHEABLE_BODY).await {
        Ok(b) => b,
        Err(e) => {
            error!("Failed to buffer response for {}: {}", key, e);
            return AppError::Internal("Failed to read response body".into()).into_response();
        }
    };

    state.cache.set(
        key,
        CachedResponse {
            body: bytes.clone(),
            content_type: parts.headers.get(header::CONTENT_TYPE).cloned(),
        },
        state.ttl,
    );
    mark(&mut parts.headers, "MISS", state.ttl);
    Response::from_parts(parts, Body::from(bytes))
}

fn mark(headers: &mut HeaderMap, outcome: &'static str, ttl: Duration) {
    headers.insert(X_CACHE, HeaderValue::from_static(outcome));
    headers.insert(X_CACHE_TTL, HeaderValue::from(ttl.as_secs()));
}
