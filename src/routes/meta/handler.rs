use axum::response::IntoResponse;

use crate::utils::success_to_api_response;

use super::model::{HealthResponse, VersionResponse};

pub async fn health() -> impl IntoResponse {
    success_to_api_response(HealthResponse {
        status: "ok".into(),
    })
}

/// Build identity of the running service. Served through the response cache.
pub async fn version() -> impl IntoResponse {
    success_to_api_response(VersionResponse {
        name: env!("CARGO_PKG_NAME").into(),
        version: env!("CARGO_PKG_VERSION").into(),
    })
}
