//! Typed errors and HTTP mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;

/// Startup configuration failures. Fatal: the process must not bind a
/// listener when any of these occur.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("MONGODB_URI must be set in the environment (see .env.example)")]
    MissingUri,
    #[error("invalid {name}: '{value}'")]
    Invalid { name: &'static str, value: String },
}

#[derive(Error, Debug)]
pub enum AppError {
    /// Connection establishment failed. The cache has already reset its
    /// pending marker, so the next call retries from scratch.
    #[error("database connection: {0}")]
    Establish(#[from] Arc<mongodb::error::Error>),
    /// A write failed after a connection was obtained. Does not invalidate
    /// the cached handle.
    #[error("database: {0}")]
    Db(#[from] mongodb::error::Error),
    #[error("validation: {0}")]
    Validation(String),
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("serialization: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Server-side failures are logged in full; the body carries only a
        // generic message and a short diagnostic.
        let (status, code, message, details) = match &self {
            AppError::Establish(e) => {
                tracing::error!(error = %e, "database connection failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "database_unavailable",
                    "event creation failed".to_string(),
                    Some(serde_json::json!("connection establishment failed")),
                )
            }
            AppError::Db(e) => {
                tracing::error!(error = %e, "event persistence failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "database_error",
                    "event creation failed".to_string(),
                    Some(serde_json::json!("write failed")),
                )
            }
            AppError::Serialize(e) => {
                tracing::error!(error = %e, "response serialization failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "event creation failed".to_string(),
                    None,
                )
            }
            AppError::Validation(_) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "validation_error",
                self.to_string(),
                None,
            ),
            AppError::BadRequest(_) => (
                StatusCode::BAD_REQUEST,
                "bad_request",
                self.to_string(),
                None,
            ),
        };
        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message,
                details,
            },
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_maps_to_unprocessable_entity() {
        let resp = AppError::Validation("title is required".into()).into_response();
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn bad_request_maps_to_400() {
        let resp = AppError::BadRequest("invalid form body".into()).into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn establishment_failure_maps_to_500() {
        let err: mongodb::error::Error =
            std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused").into();
        let resp = AppError::Establish(Arc::new(err)).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
