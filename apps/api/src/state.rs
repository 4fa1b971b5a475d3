use std::sync::Arc;

use crate::auth::JwtValidator;
use crate::export::ExportOptions;
use crate::store::ResumeStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Pluggable record store. Postgres in production, in-memory without `DATABASE_URL`.
    pub store: Arc<dyn ResumeStore>,
    pub jwt: Arc<JwtValidator>,
    pub export_options: ExportOptions,
}
