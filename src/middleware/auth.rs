use axum::{
    body::Body,
    extract::State,
    http::{Request, header},
    middleware::Next,
    response::Response,
};

use crate::{AppState, error::AppError, utils::secrets_match};

/// Guards the operational routes with the configured admin token.
///
/// Without a configured token the routes do not exist as far as clients
/// can tell.
pub async fn require_admin(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let Some(expected) = state.config.admin_token.as_deref() else {
        return Err(AppError::NotFound);
    };

    let authorized = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .is_some_and(|token| secrets_match(token.trim(), expected));

    if authorized {
        Ok(next.run(req).await)
    } else {
        tracing::warn!("Rejected operational request to {}", req.uri().path());
        Err(AppError::Unauthorized)
    }
}
