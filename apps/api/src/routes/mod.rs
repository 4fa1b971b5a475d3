pub mod health;
pub mod resume;

use axum::{
    routing::{get, post},
    Router,
};

use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Paths the web wizard calls.
        .route("/api/resume/get", get(resume::handle_get_resume))
        .route("/api/resume/save", post(resume::handle_save_resume))
        .route("/api/resume/pdf", get(resume::handle_export_pdf))
        .route("/api/resume/docx", get(resume::handle_export_docx))
        .route(
            "/api/v1/resume",
            get(resume::handle_get_resume).post(resume::handle_save_resume),
        )
        .route("/api/v1/resume/pdf", get(resume::handle_export_pdf))
        .route("/api/v1/resume/docx", get(resume::handle_export_docx))
        .with_state(state)
}
