use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::fmt;

use crate::store::StoreError;
use crate::validator::ValidationError;

/// Application error types
#[derive(Debug)]
pub enum AppError {
    /// The posted line failed a grammar check
    Validation(ValidationError),
    /// No record under the requested id
    NotFound,
    /// Store read failed
    Storage(StoreError),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "Invalid log: {}", err),
            Self::NotFound => write!(f, "Log not found"),
            Self::Storage(err) => write!(f, "Storage error: {}", err),
        }
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            Self::Validation(err) => (StatusCode::UNPROCESSABLE_ENTITY, err.to_string()),
            Self::NotFound => (StatusCode::NOT_FOUND, self.to_string()),
            Self::Storage(err) => {
                tracing::error!(error = %err, "Store read failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal storage error".to_string())
            }
        };

        let body = Json(json!({
            "error": {
                "message": error_message,
                "type": error_type_name(&self),
            }
        }));

        (status, body).into_response()
    }
}

fn error_type_name(error: &AppError) -> &'static str {
    match error {
        AppError::Validation(err) => err.kind(),
        AppError::NotFound => "not_found",
        AppError::Storage(_) => "storage_error",
    }
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        Self::Validation(err)
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        Self::Storage(err)
    }
}
