// crates/server/src/error.rs
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use trial_view_db::DbError;
use ts_rs::TS;

/// Structured JSON error response for API errors
#[derive(Debug, Serialize, TS)]
#[cfg_attr(feature = "codegen", ts(export, export_to = "../../../web/src/types/generated/"))]
#[cfg_attr(test, derive(serde::Deserialize))]
pub struct ErrorResponse {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: None,
        }
    }

    pub fn with_details(error: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: Some(details.into()),
        }
    }
}

/// API error types that map to HTTP status codes.
///
/// Chart endpoints never produce `Database`: their failures are flattened to
/// empty payloads by [`crate::fallback`]. It is reserved for endpoints where
/// an empty answer would be misleading.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Subject not found: {0}")]
    SubjectNotFound(String),

    #[error("No cached context for session: {0}")]
    ContextNotFound(String),

    #[error("Database error: {0}")]
    Database(#[from] DbError),

    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_response) = match &self {
            ApiError::SubjectNotFound(id) => {
                tracing::info!(subject_id = %id, "Subject not found");
                (
                    StatusCode::NOT_FOUND,
                    ErrorResponse::with_details("Subject not found", format!("Subject ID: {}", id)),
                )
            }
            ApiError::ContextNotFound(id) => {
                tracing::debug!(session_id = %id, "Context not cached");
                (
                    StatusCode::NOT_FOUND,
                    ErrorResponse::with_details("Context not found", format!("Session ID: {}", id)),
                )
            }
            ApiError::Database(db_err) => {
                tracing::error!(error = %db_err, "Database error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::with_details("Database error", db_err.to_string()),
                )
            }
            ApiError::BadRequest(msg) => {
                tracing::warn!(message = %msg, "Bad request");
                (
                    StatusCode::BAD_REQUEST,
                    ErrorResponse::with_details("Bad request", msg.clone()),
                )
            }
        };

        (status, Json(error_response)).into_response()
    }
}

/// Result type alias for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
