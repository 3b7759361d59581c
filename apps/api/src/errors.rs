use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::generation::orchestrator::GenerationError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Rate limit exceeded")]
    RateLimited { retry_after_seconds: i64 },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Generation error: {0}")]
    Generation(#[from] GenerationError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg.clone()),
            AppError::Validation(msg) => {
                (StatusCode::BAD_REQUEST, "validation_error", msg.clone())
            }
            AppError::RateLimited {
                retry_after_seconds,
            } => {
                let body = Json(json!({
                    "error": "rate_limit_exceeded",
                    "message": format!(
                        "Free tier limit reached. Try again in {retry_after_seconds} seconds."
                    ),
                    "retry_after_seconds": retry_after_seconds,
                }));
                return (StatusCode::TOO_MANY_REQUESTS, body).into_response();
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "A database error occurred".to_string(),
                )
            }
            AppError::Redis(e) => {
                tracing::error!("Redis error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "A rate limiter error occurred".to_string(),
                )
            }
            AppError::Generation(e) => {
                tracing::error!("Generation error: {e}");
                match e {
                    GenerationError::UnparseableResponse => (
                        StatusCode::BAD_GATEWAY,
                        "ai_malformed_output",
                        "The AI provider could not produce structured output. Please retry."
                            .to_string(),
                    ),
                    GenerationError::ExhaustedRetries { .. }
                    | GenerationError::TransportPermanentFailure(_) => (
                        StatusCode::SERVICE_UNAVAILABLE,
                        "ai_service_error",
                        "Copy generation service is temporarily unavailable.".to_string(),
                    ),
                }
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An unexpected error occurred. Please try again later.".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": code,
            "message": message
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_maps_to_400() {
        let response = AppError::Validation("product_name: too short".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_rate_limited_maps_to_429() {
        let response = AppError::RateLimited {
            retry_after_seconds: 3600,
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    }

    #[test]
    fn test_exhausted_retries_maps_to_503() {
        let response =
            AppError::Generation(GenerationError::ExhaustedRetries { attempts: 3 }).into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_unparseable_response_maps_to_502() {
        let response =
            AppError::Generation(GenerationError::UnparseableResponse).into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }
}
