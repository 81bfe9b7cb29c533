use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use quiz_core::model::{ProgressEntry, ProgressMap, QuestionId, UserId};
use reqwest::{Client, RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};
use url::Url;

use super::{BackendConfig, ProgressBackend};
use crate::error::BackendError;

const TABLE_PATH: &str = "rest/v1/user_progress";
const SELECT_COLUMNS: &str = "question_id,correct_count,wrong_count,last_attempt_at,last_correct";
const ON_CONFLICT: &str = "user_id,question_id";
const DEFAULT_TIMEOUT_SECS: u64 = 15;

/// Progress backend on a Supabase project's `user_progress` table.
///
/// Talks plain PostgREST: `GET` filtered by `user_id`, and `POST` with
/// `resolution=merge-duplicates` for upserts keyed on
/// `(user_id, question_id)`.
#[derive(Clone)]
pub struct SupabaseBackend {
    client: Client,
    table_url: Url,
    anon_key: String,
    access_token: Option<String>,
}

/// One row of `user_progress` as PostgREST returns and accepts it.
#[derive(Debug, Serialize, Deserialize)]
struct ProgressRow {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    user_id: Option<String>,
    question_id: String,
    correct_count: i64,
    wrong_count: i64,
    last_attempt_at: Option<DateTime<Utc>>,
    // Not tracked locally; omitted on upsert so the stored value survives.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    last_correct: Option<bool>,
}

impl ProgressRow {
    fn from_entry(user: &UserId, id: &QuestionId, entry: &ProgressEntry) -> Self {
        let last_attempt_at =
            (entry.last_attempt_at != DateTime::<Utc>::UNIX_EPOCH).then_some(entry.last_attempt_at);
        Self {
            user_id: Some(user.to_string()),
            question_id: id.as_str().to_owned(),
            correct_count: i64::from(entry.correct),
            wrong_count: i64::from(entry.wrong),
            last_attempt_at,
            last_correct: None,
        }
    }

    fn into_entry(self) -> Result<(QuestionId, ProgressEntry), BackendError> {
        let id = QuestionId::new(self.question_id)
            .map_err(|e| BackendError::InvalidResponse(e.to_string()))?;
        let count = |field: &str, v: i64| {
            u32::try_from(v).map_err(|_| {
                BackendError::InvalidResponse(format!("{field} out of range for {id}: {v}"))
            })
        };
        let entry = ProgressEntry::new(
            count("correct_count", self.correct_count)?,
            count("wrong_count", self.wrong_count)?,
            self.last_attempt_at.unwrap_or(DateTime::<Utc>::UNIX_EPOCH),
        );
        Ok((id, entry))
    }
}

impl SupabaseBackend {
    /// Build a client for `config`.
    ///
    /// # Errors
    ///
    /// Returns `BackendError` if the HTTP client cannot be created or the
    /// table URL cannot be derived from the base URL.
    pub fn new(config: &BackendConfig) -> Result<Self, BackendError> {
        Self::with_timeout(config, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// # Errors
    ///
    /// Same as [`SupabaseBackend::new`].
    pub fn with_timeout(config: &BackendConfig, timeout: Duration) -> Result<Self, BackendError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BackendError::Config(e.to_string()))?;
        let table_url = config
            .base_url
            .join(TABLE_PATH)
            .map_err(|e| BackendError::Config(e.to_string()))?;
        Ok(Self {
            client,
            table_url,
            anon_key: config.anon_key.clone(),
            access_token: config.access_token.clone(),
        })
    }

    #[must_use]
    pub fn table_url(&self) -> &Url {
        &self.table_url
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        let bearer = self.access_token.as_deref().unwrap_or(&self.anon_key);
        request.header("apikey", &self.anon_key).bearer_auth(bearer)
    }

    async fn post_rows(&self, rows: &[ProgressRow]) -> Result<(), BackendError> {
        let request = self
            .client
            .post(self.table_url.clone())
            .query(&[("on_conflict", ON_CONFLICT)])
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .json(rows);
        let response = self.authorize(request).send().await.map_err(transport)?;
        check_status(response).await?;
        Ok(())
    }
}

fn transport(err: reqwest::Error) -> BackendError {
    if err.is_timeout() {
        BackendError::Timeout(DEFAULT_TIMEOUT_SECS)
    } else {
        BackendError::Network(err.to_string())
    }
}

async fn check_status(response: Response) -> Result<Response, BackendError> {
    let status = response.status().as_u16();
    if status == 401 || status == 403 {
        let body = response.text().await.unwrap_or_default();
        return Err(BackendError::Unauthorized(body));
    }
    if status >= 400 {
        let body = response.text().await.unwrap_or_default();
        return Err(BackendError::Api {
            status,
            message: body,
        });
    }
    Ok(response)
}

#[async_trait]
impl ProgressBackend for SupabaseBackend {
    #[instrument(skip(self), fields(user = %user))]
    async fn fetch_progress(&self, user: &UserId) -> Result<ProgressMap, BackendError> {
        let user_filter = format!("eq.{user}");
        let request = self
            .client
            .get(self.table_url.clone())
            .query(&[("select", SELECT_COLUMNS), ("user_id", user_filter.as_str())]);
        let response = self.authorize(request).send().await.map_err(transport)?;
        let rows: Vec<ProgressRow> = check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| BackendError::InvalidResponse(e.to_string()))?;

        let mut progress = ProgressMap::new();
        for row in rows {
            match row.into_entry() {
                Ok((id, entry)) => {
                    progress.insert(id, entry);
                }
                Err(err) => warn!(error = %err, "skipping unreadable progress row"),
            }
        }
        debug!(entries = progress.len(), "fetched remote progress");
        Ok(progress)
    }

    #[instrument(skip(self, entry), fields(user = %user, question = %id))]
    async fn upsert_progress(
        &self,
        user: &UserId,
        id: &QuestionId,
        entry: &ProgressEntry,
    ) -> Result<(), BackendError> {
        self.post_rows(&[ProgressRow::from_entry(user, id, entry)])
            .await
    }

    #[instrument(skip(self, progress), fields(user = %user, entries = progress.len()))]
    async fn upsert_many(&self, user: &UserId, progress: &ProgressMap) -> Result<(), BackendError> {
        if progress.is_empty() {
            return Ok(());
        }
        let rows: Vec<ProgressRow> = progress
            .iter()
            .map(|(id, entry)| ProgressRow::from_entry(user, id, entry))
            .collect();
        self.post_rows(&rows).await
    }
}
