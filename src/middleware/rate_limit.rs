use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::{ConnectInfo, OriginalUri, State},
    http::{HeaderMap, HeaderName, HeaderValue, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tokio::time::Instant;

use crate::{
    config::{EndpointRules, RateLimitRule},
    error::AppError,
    rate_limit::{RateLimitDecision, RateLimiter, client_identifier, route_identifier},
};

pub const X_RATELIMIT_LIMIT: HeaderName = HeaderName::from_static("x-ratelimit-limit");
pub const X_RATELIMIT_REMAINING: HeaderName = HeaderName::from_static("x-ratelimit-remaining");
pub const X_RATELIMIT_RESET: HeaderName = HeaderName::from_static("x-ratelimit-reset");

/// Route label for requests that fall back to the default rule.
const DEFAULT_ROUTE: &str = "*";

/// Applies the limiter to incoming requests and surfaces its decision as
/// `X-RateLimit-*` headers, rejecting with 429 once the quota is spent.
#[derive(Clone)]
pub struct RateLimitGuard {
    limiter: Arc<RateLimiter>,
    default_rule: RateLimitRule,
    endpoints: Arc<EndpointRules>,
}

impl RateLimitGuard {
    pub fn new(
        limiter: Arc<RateLimiter>,
        default_rule: RateLimitRule,
        endpoints: EndpointRules,
    ) -> Self {
        Self {
            limiter,
            default_rule,
            endpoints: Arc::new(endpoints),
        }
    }

    pub async fn check_rate_limit(self: Arc<Self>, req: Request<Body>, next: Next) -> Response {
        let remote_ip = req
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ci| ci.0.ip());
        let client = client_identifier(req.headers(), remote_ip);

        let path = req
            .extensions()
            .get::<OriginalUri>()
            .map(|uri| uri.path().to_string())
            .unwrap_or_else(|| req.uri().path().to_string());
        let (route, rule) = match self.endpoints.resolve(&path) {
            Some((route, rule)) => (route.to_string(), *rule),
            None => (DEFAULT_ROUTE.to_string(), self.default_rule),
        };

        let decision = self
            .limiter
            .check(&route_identifier(&client, &route), &rule);
        let now = Instant::now();

        let mut response = if decision.allowed {
            next.run(req).await
        } else {
            let retry_after_secs = decision.retry_after_secs(now);
            tracing::warn!(
                "rate limit exceeded for {} on {} ({}), retry in {}s",
                client,
                route,
                path,
                retry_after_secs
            );
            AppError::TooManyRequests { retry_after_secs }.into_response()
        };
        apply_rate_limit_headers(response.headers_mut(), &decision, now);
        response
    }
}

pub fn apply_rate_limit_headers(headers: &mut HeaderMap, decision: &RateLimitDecision, now: Instant) {
    headers.insert(X_RATELIMIT_LIMIT, HeaderValue::from(decision.limit));
    headers.insert(X_RATELIMIT_REMAINING, HeaderValue::from(decision.remaining));
    headers.insert(
        X_RATELIMIT_RESET,
        HeaderValue::from(decision.reset_epoch_secs(now)),
    );
}

pub async fn rate_limit(
    State(guard): State<Arc<RateLimitGuard>>,
    req: Request<Body>,
    next: Next,
) -> Response {
    guard.check_rate_limit(req, next).await
}
