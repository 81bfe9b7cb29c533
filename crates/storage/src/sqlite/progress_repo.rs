use async_trait::async_trait;
use quiz_core::model::{ProgressEntry, ProgressMap, QuestionId};

use crate::repository::{ProgressCache, StorageError};

use super::SqliteRepository;
use super::mapping::map_progress_row;

const UPSERT_ENTRY: &str = r"
    INSERT INTO progress_cache (question_id, correct, wrong, last_attempt_ms)
    VALUES (?1, ?2, ?3, ?4)
    ON CONFLICT(question_id) DO UPDATE SET
        correct = excluded.correct,
        wrong = excluded.wrong,
        last_attempt_ms = excluded.last_attempt_ms
";

#[async_trait]
impl ProgressCache for SqliteRepository {
    async fn load_progress(&self) -> Result<ProgressMap, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT question_id, correct, wrong, last_attempt_ms
            FROM progress_cache
            ORDER BY question_id ASC
            ",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|err| StorageError::Connection(err.to_string()))?;

        rows.iter().map(map_progress_row).collect()
    }

    async fn save_entry(&self, id: &QuestionId, entry: &ProgressEntry) -> Result<(), StorageError> {
        sqlx::query(UPSERT_ENTRY)
            .bind(id.as_str())
            .bind(i64::from(entry.correct))
            .bind(i64::from(entry.wrong))
            .bind(entry.last_attempt_at.timestamp_millis())
            .execute(&self.pool)
            .await
            .map_err(|err| StorageError::Connection(err.to_string()))?;
        Ok(())
    }

    async fn replace_progress(&self, progress: &ProgressMap) -> Result<(), StorageError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|err| StorageError::Connection(err.to_string()))?;

        sqlx::query("DELETE FROM progress_cache")
            .execute(&mut *tx)
            .await
            .map_err(|err| StorageError::Connection(err.to_string()))?;

        for (id, entry) in progress.iter() {
            sqlx::query(UPSERT_ENTRY)
                .bind(id.as_str())
                .bind(i64::from(entry.correct))
                .bind(i64::from(entry.wrong))
                .bind(entry.last_attempt_at.timestamp_millis())
                .execute(&mut *tx)
                .await
                .map_err(|err| StorageError::Connection(err.to_string()))?;
        }

        tx.commit()
            .await
            .map_err(|err| StorageError::Connection(err.to_string()))?;
        Ok(())
    }
}
