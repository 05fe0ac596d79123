//! App-wide error type. Every fallible operation returns `Result<T, AppError>`.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// No authenticated user for an operation that requires one.
    #[error("not authenticated: {0}")]
    Auth(&'static str),

    #[error("not found: {0}")]
    NotFound(String),

    /// Rejected locally, before any network call.
    #[error("validation error: {0}")]
    Validation(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The generation backend returned a non-success response or was unreachable.
    #[error("generation backend error: {0}")]
    Backend(String),

    #[error("storage error: {0}")]
    Storage(String),

    /// The conversation provider (REST or realtime link) failed.
    #[error("conversation provider error: {0}")]
    Provider(String),
}

impl AppError {
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Auth(_) => "auth",
            AppError::NotFound(_) => "not_found",
            AppError::Validation(_) => "validation",
            AppError::Database(_) => "database",
            AppError::Backend(_) => "backend",
            AppError::Storage(_) => "storage",
            AppError::Provider(_) => "provider",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            AppError::Auth(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Backend(_) | AppError::Storage(_) | AppError::Provider(_) => {
                StatusCode::BAD_GATEWAY
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(json!({
            "error": self.to_string(),
            "kind": self.kind(),
        }));
        (status, body).into_response()
    }
}
