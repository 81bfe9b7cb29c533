use async_trait::async_trait;
use quiz_core::model::PracticePreferences;
use sqlx::Row;

use crate::repository::{PreferencesRepository, StorageError};

use super::SqliteRepository;
use super::mapping::{difficulty_from_i64, parse_mode};

#[async_trait]
impl PreferencesRepository for SqliteRepository {
    async fn get_preferences(&self) -> Result<Option<PracticePreferences>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT topic, difficulty, mode
            FROM practice_preferences
            WHERE id = 1
            ",
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(|err| StorageError::Connection(err.to_string()))?;

        let Some(row) = row else {
            return Ok(None);
        };

        let topic: String = row
            .try_get("topic")
            .map_err(|err| StorageError::Serialization(err.to_string()))?;
        let difficulty: Option<i64> = row
            .try_get("difficulty")
            .map_err(|err| StorageError::Serialization(err.to_string()))?;
        let mode: String = row
            .try_get("mode")
            .map_err(|err| StorageError::Serialization(err.to_string()))?;

        Ok(Some(PracticePreferences {
            topic,
            difficulty: difficulty_from_i64(difficulty)?,
            mode: parse_mode(&mode)?,
        }))
    }

    async fn save_preferences(&self, prefs: &PracticePreferences) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO practice_preferences (id, topic, difficulty, mode)
            VALUES (1, ?1, ?2, ?3)
            ON CONFLICT(id) DO UPDATE SET
                topic = excluded.topic,
                difficulty = excluded.difficulty,
                mode = excluded.mode
            ",
        )
        .bind(&prefs.topic)
        .bind(prefs.difficulty.map(|d| i64::from(d.value())))
        .bind(prefs.mode.as_str())
        .execute(&self.pool)
        .await
        .map_err(|err| StorageError::Connection(err.to_string()))?;
        Ok(())
    }
}
