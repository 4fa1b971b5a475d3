use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::resume::{ResumeUpdate, StoredResume};
use crate::store::{ResumeStore, SaveOutcome};

/// Process-local store. Records are lost on restart.
#[derive(Default)]
pub struct MemoryResumeStore {
    records: RwLock<HashMap<String, StoredResume>>,
}

impl MemoryResumeStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ResumeStore for MemoryResumeStore {
    async fn find(&self, user_id: &str) -> Result<Option<StoredResume>, AppError> {
        Ok(self.records.read().await.get(user_id).cloned())
    }

    async fn save(
        &self,
        user_id: &str,
        update: ResumeUpdate,
    ) -> Result<(StoredResume, SaveOutcome), AppError> {
        let mut records = self.records.write().await;
        let now = Utc::now();

        if let Some(existing) = records.get_mut(user_id) {
            existing.record.apply(update);
            existing.updated_at = now;
            return Ok((existing.clone(), SaveOutcome::Updated));
        }

        let stored = StoredResume {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            record: update.into_record(),
            created_at: now,
            updated_at: now,
        };
        records.insert(user_id.to_string(), stored.clone());
        Ok((stored, SaveOutcome::Created))
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}
