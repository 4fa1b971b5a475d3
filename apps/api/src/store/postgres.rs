use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::{debug, info};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::resume::{ResumeRow, ResumeUpdate, StoredResume};
use crate::store::{ResumeStore, SaveOutcome};

const SELECT_FOR_UPDATE: &str = "SELECT * FROM resumes WHERE user_id = $1 FOR UPDATE";

// Waits on a concurrent uncommitted insert for the same user, then yields no row.
const INSERT_IF_ABSENT: &str = r#"
    INSERT INTO resumes (id, user_id, record)
    VALUES ($1, $2, $3)
    ON CONFLICT (user_id) DO NOTHING
    RETURNING *
"#;

const UPDATE_RECORD: &str = r#"
    UPDATE resumes
    SET record = $1, updated_at = NOW()
    WHERE id = $2
    RETURNING *
"#;

/// Postgres-backed store. One row per user in `resumes`; the record lives in a JSONB column.
pub struct PgResumeStore {
    pool: PgPool,
}

impl PgResumeStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ResumeStore for PgResumeStore {
    async fn find(&self, user_id: &str) -> Result<Option<StoredResume>, AppError> {
        let row = sqlx::query_as::<_, ResumeRow>("SELECT * FROM resumes WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(StoredResume::from))
    }

    async fn save(
        &self,
        user_id: &str,
        update: ResumeUpdate,
    ) -> Result<(StoredResume, SaveOutcome), AppError> {
        let mut tx = self.pool.begin().await?;

        // Row lock serializes concurrent saves once the user's row exists.
        let (row, outcome) = match lock_row(&mut tx, user_id).await? {
            Some(row) => (update_row(&mut tx, row, update).await?, SaveOutcome::Updated),
            None => {
                let record = update.clone().into_record();
                let inserted = sqlx::query_as::<_, ResumeRow>(INSERT_IF_ABSENT)
                    .bind(Uuid::new_v4())
                    .bind(user_id)
                    .bind(sqlx::types::Json(&record))
                    .fetch_optional(&mut *tx)
                    .await?;

                match inserted {
                    Some(row) => (row, SaveOutcome::Created),
                    None => {
                        debug!("Concurrent first save for user {user_id}; applying as update");
                        let row = lock_row(&mut tx, user_id)
                            .await?
                            .ok_or(sqlx::Error::RowNotFound)?;
                        (update_row(&mut tx, row, update).await?, SaveOutcome::Updated)
                    }
                }
            }
        };

        tx.commit().await?;
        info!("Saved resume {} for user {user_id} ({outcome:?})", row.id);
        Ok((row.into(), outcome))
    }

    fn backend(&self) -> &'static str {
        "postgres"
    }
}

async fn lock_row(
    tx: &mut Transaction<'_, Postgres>,
    user_id: &str,
) -> Result<Option<ResumeRow>, sqlx::Error> {
    sqlx::query_as::<_, ResumeRow>(SELECT_FOR_UPDATE)
        .bind(user_id)
        .fetch_optional(&mut **tx)
        .await
}

async fn update_row(
    tx: &mut Transaction<'_, Postgres>,
    row: ResumeRow,
    update: ResumeUpdate,
) -> Result<ResumeRow, sqlx::Error> {
    let mut record = row.record.0;
    record.apply(update);
    sqlx::query_as::<_, ResumeRow>(UPDATE_RECORD)
        .bind(sqlx::types::Json(&record))
        .bind(row.id)
        .fetch_one(&mut **tx)
        .await
}
