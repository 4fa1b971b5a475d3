//! Record lookup and save, keyed by the caller's user id.
//!
//! `AppState` holds an `Arc<dyn ResumeStore>`: Postgres when `DATABASE_URL`
//! is set, the in-memory backend otherwise (and in tests).

pub mod memory;
pub mod postgres;

use async_trait::async_trait;

use crate::errors::AppError;
use crate::models::resume::{ResumeUpdate, StoredResume};

pub use memory::MemoryResumeStore;
pub use postgres::PgResumeStore;

/// Whether a save created the user's record or updated the existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    Created,
    Updated,
}

#[async_trait]
pub trait ResumeStore: Send + Sync {
    /// Returns the user's record, or `None` if they have never saved one.
    async fn find(&self, user_id: &str) -> Result<Option<StoredResume>, AppError>;

    /// Creates the user's record from `update`, or applies `update` to the
    /// existing one. At most one record exists per user.
    async fn save(
        &self,
        user_id: &str,
        update: ResumeUpdate,
    ) -> Result<(StoredResume, SaveOutcome), AppError>;

    /// Short backend name for startup logs.
    fn backend(&self) -> &'static str;
}
