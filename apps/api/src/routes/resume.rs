//! Axum route handlers for the Resume API.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use bytes::Bytes;
use serde::Serialize;
use tracing::{error, info, warn};

use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::export::{self, ExportFormat, ExportedDocument};
use crate::models::resume::{ResumeRecord, ResumeUpdate, StoredResume};
use crate::state::AppState;
use crate::store::SaveOutcome;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct SaveResponse {
    pub message: String,
    pub resume: StoredResume,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/resume/get, GET /api/v1/resume
///
/// Returns the caller's record, or the canonical empty record if they have
/// never saved one.
pub async fn handle_get_resume(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Response, AppError> {
    let stored = state
        .store
        .find(&user.id)
        .await
        .map_err(|e| log_failure(&user, "get_resume", e))?;

    Ok(match stored {
        Some(stored) => Json(stored).into_response(),
        None => Json(ResumeRecord::empty()).into_response(),
    })
}

/// POST /api/resume/save, POST /api/v1/resume
///
/// Creates the caller's record (201) or assigns the sent fields onto the
/// existing one (200).
pub async fn handle_save_resume(
    State(state): State<AppState>,
    user: AuthUser,
    payload: Result<Json<ResumeUpdate>, JsonRejection>,
) -> Result<(StatusCode, Json<SaveResponse>), AppError> {
    let Json(update) = payload
        .map_err(|e| log_failure(&user, "save_resume", AppError::Validation(e.body_text())))?;

    let (resume, outcome) = state
        .store
        .save(&user.id, update)
        .await
        .map_err(|e| log_failure(&user, "save_resume", e))?;

    let (status, message) = match outcome {
        SaveOutcome::Created => (StatusCode::CREATED, "Resume created successfully"),
        SaveOutcome::Updated => (StatusCode::OK, "Resume updated successfully"),
    };
    info!(user_id = %user.id, resume_id = %resume.id, "{message}");

    Ok((
        status,
        Json(SaveResponse {
            message: message.to_string(),
            resume,
        }),
    ))
}

/// GET /api/resume/pdf, GET /api/v1/resume/pdf
pub async fn handle_export_pdf(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Response, AppError> {
    export_attachment(&state, user, ExportFormat::Pdf).await
}

/// GET /api/resume/docx, GET /api/v1/resume/docx
pub async fn handle_export_docx(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Response, AppError> {
    export_attachment(&state, user, ExportFormat::Docx).await
}

async fn export_attachment(
    state: &AppState,
    user: AuthUser,
    format: ExportFormat,
) -> Result<Response, AppError> {
    let operation = match format {
        ExportFormat::Pdf => "export_pdf",
        ExportFormat::Docx => "export_docx",
    };

    let stored = state
        .store
        .find(&user.id)
        .await
        .and_then(|found| found.ok_or_else(|| AppError::NotFound("No resume found".to_string())))
        .map_err(|e| log_failure(&user, operation, e))?;

    let options = state.export_options;
    let document = tokio::task::spawn_blocking(move || {
        export::render(&stored.record, format, &options)
    })
    .await
    .map_err(|e| AppError::Internal(anyhow::anyhow!("export task failed: {e}")))
    .and_then(|rendered| rendered.map_err(AppError::from))
    .map_err(|e| log_failure(&user, operation, e))?;

    info!(
        user_id = %user.id,
        operation,
        bytes = document.bytes.len(),
        "Generated {}",
        document.filename
    );

    attachment_response(document).map_err(|e| log_failure(&user, operation, e))
}

fn attachment_response(document: ExportedDocument) -> Result<Response, AppError> {
    let disposition =
        HeaderValue::from_str(&export::content_disposition(&document.filename))
            .map_err(|e| AppError::Stream(format!("invalid Content-Disposition: {e}")))?;

    Ok((
        [
            (
                header::CONTENT_TYPE,
                HeaderValue::from_static(document.format.content_type()),
            ),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        Bytes::from(document.bytes),
    )
        .into_response())
}

/// Logs a failed request with the caller and operation, then hands the error back.
fn log_failure(user: &AuthUser, operation: &'static str, err: AppError) -> AppError {
    if err.status().is_server_error() {
        error!(user_id = %user.id, operation, "Request failed: {err}");
    } else {
        warn!(user_id = %user.id, operation, "Request rejected: {err}");
    }
    err
}
