use axum::Json;
use axum::http::StatusCode;
use axum::response::{ IntoResponse, Response };
use log::error;
use serde_json::json;
use thiserror::Error;

/// Failures surfaced by the HTTP handlers. Anything that happens after a
/// response stream has opened can no longer change the status code and is
/// signaled through the stream itself instead.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("no authenticated user")]
    Unauthenticated,

    #[error("{0}")]
    InvalidInput(String),

    #[error("provider request failed: {0}")]
    Provider(String),

    #[error("store request failed: {0}")]
    Persistence(String),

    #[error("GitHub token not configured")]
    GitHubNotConfigured,

    #[error("too many requests")]
    RateLimited,

    #[error("internal error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::Unauthenticated => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()),
            ApiError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::GitHubNotConfigured => {
                (StatusCode::INTERNAL_SERVER_ERROR, "GitHub token not configured".to_string())
            }
            ApiError::RateLimited => {
                (StatusCode::TOO_MANY_REQUESTS, "Too many requests".to_string())
            }
            ApiError::Provider(detail) => {
                error!("Provider failure: {}", detail);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
            ApiError::Persistence(detail) => {
                error!("Store failure: {}", detail);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
            ApiError::Internal(detail) => {
                error!("Unexpected failure: {}", detail);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
