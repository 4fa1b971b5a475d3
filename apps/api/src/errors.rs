use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::export::ExportError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
///
/// Handlers log failures with caller context before returning them; the
/// response body only ever carries a short, generic message.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Storage error: {0}")]
    Storage(#[from] sqlx::Error),

    #[error("Generation error: {0}")]
    Generation(String),

    #[error("Stream error: {0}")]
    Stream(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<ExportError> for AppError {
    fn from(err: ExportError) -> Self {
        if err.is_stream_failure() {
            AppError::Stream(err.to_string())
        } else {
            AppError::Generation(err.to_string())
        }
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Storage(_)
            | AppError::Generation(_)
            | AppError::Stream(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (code, message) = match &self {
            AppError::NotFound(msg) => ("NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => ("VALIDATION_ERROR", msg.clone()),
            AppError::Unauthorized(_) => ("UNAUTHORIZED", "Authentication required".to_string()),
            AppError::Storage(_) => ("STORAGE_ERROR", "A storage error occurred".to_string()),
            AppError::Generation(_) => (
                "GENERATION_ERROR",
                "The document could not be generated".to_string(),
            ),
            AppError::Stream(_) => (
                "STREAM_ERROR",
                "The document could not be written".to_string(),
            ),
            AppError::Internal(_) => (
                "INTERNAL_ERROR",
                "An internal server error occurred".to_string(),
            ),
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes_follow_taxonomy() {
        assert_eq!(
            AppError::NotFound("x".into()).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::Unauthorized("x".into()).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::Generation("x".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AppError::Stream("x".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AppError::Storage(sqlx::Error::RowNotFound).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_export_io_failure_maps_to_stream_error() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk full");
        let err: AppError = ExportError::Io(io).into();
        assert!(matches!(err, AppError::Stream(_)));
    }

    #[test]
    fn test_export_encoding_failure_maps_to_generation_error() {
        let err: AppError = ExportError::Xml(quick_xml::Error::UnexpectedEof("w:body".into())).into();
        assert!(matches!(err, AppError::Generation(_)));
    }
}
