use chrono::{DateTime, Utc};
use quiz_core::SelectionMode;
use quiz_core::model::{Difficulty, ProgressEntry, QuestionId};
use sqlx::Row;

use crate::repository::StorageError;

fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

fn i64_to_u32(field: &'static str, v: i64) -> Result<u32, StorageError> {
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} out of range: {v}")))
}

pub(crate) fn datetime_from_ms(v: i64) -> Result<DateTime<Utc>, StorageError> {
    DateTime::<Utc>::from_timestamp_millis(v)
        .ok_or_else(|| StorageError::Serialization(format!("invalid timestamp: {v}")))
}

pub(crate) fn map_progress_row(
    row: &sqlx::sqlite::SqliteRow,
) -> Result<(QuestionId, ProgressEntry), StorageError> {
    let id = QuestionId::new(row.try_get::<String, _>("question_id").map_err(ser)?).map_err(ser)?;
    let correct = i64_to_u32("correct", row.try_get("correct").map_err(ser)?)?;
    let wrong = i64_to_u32("wrong", row.try_get("wrong").map_err(ser)?)?;
    let last_attempt_at = datetime_from_ms(row.try_get("last_attempt_ms").map_err(ser)?)?;
    Ok((id, ProgressEntry::new(correct, wrong, last_attempt_at)))
}

pub(crate) fn parse_mode(s: &str) -> Result<SelectionMode, StorageError> {
    s.parse::<SelectionMode>().map_err(ser)
}

pub(crate) fn difficulty_from_i64(v: Option<i64>) -> Result<Option<Difficulty>, StorageError> {
    v.map(|raw| {
        let raw = u8::try_from(raw).map_err(|_| ser(format!("difficulty out of range: {raw}")))?;
        Difficulty::new(raw).map_err(ser)
    })
    .transpose()
}
