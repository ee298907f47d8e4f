use axum::Json;
use axum::{
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::utils::{error_codes, error_to_api_response};

/// Startup-time configuration failures. The service refuses to start
/// rather than run with nonsensical limits.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be greater than zero")]
    NotPositive(&'static str),
    #[error("invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
    #[error("invalid endpoint rate limit entry: {0:?}")]
    EndpointEntry(String),
}

#[derive(Debug)]
pub enum AppError {
    Unauthorized,
    NotFound,
    TooManyRequests { retry_after_secs: u64 },
    Internal(String),
}

/// Body of a 429 response. Field names are part of the client contract.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitBody {
    pub error: String,
    pub message: String,
    pub retry_after: u64,
}

impl RateLimitBody {
    pub fn new(retry_after_secs: u64) -> Self {
        Self {
            error: "Too many requests".into(),
            message: format!(
                "Rate limit exceeded. Try again in {} seconds.",
                retry_after_secs
            ),
            retry_after: retry_after_secs,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                error_to_api_response::<()>(error_codes::AUTH_FAILED, "Unauthorized".into()),
            )
                .into_response(),
            AppError::NotFound => (
                StatusCode::NOT_FOUND,
                error_to_api_response::<()>(error_codes::NOT_FOUND, "Not found".into()),
            )
                .into_response(),
            AppError::TooManyRequests { retry_after_secs } => {
                let mut response = (
                    StatusCode::TOO_MANY_REQUESTS,
                    Json(RateLimitBody::new(retry_after_secs)),
                )
                    .into_response();
                response
                    .headers_mut()
                    .insert(header::RETRY_AFTER, HeaderValue::from(retry_after_secs));
                response
            }
            AppError::Internal(message) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_to_api_response::<()>(error_codes::INTERNAL_ERROR, message),
            )
                .into_response(),
        }
    }
}
