//! Hosted copy of the user's progress.
//!
//! The store talks to the backend only through [`ProgressBackend`]; the
//! Supabase client is one implementation and [`InMemoryBackend`] another.

use async_trait::async_trait;
use quiz_core::model::{ProgressEntry, ProgressMap, QuestionId, UserId};

use crate::error::BackendError;

mod config;
mod memory;
mod supabase;

pub use config::BackendConfig;
pub use memory::InMemoryBackend;
pub use supabase::SupabaseBackend;

#[async_trait]
pub trait ProgressBackend: Send + Sync {
    /// Every entry stored for `user`.
    ///
    /// # Errors
    ///
    /// Returns `BackendError` if the request fails or the response cannot be
    /// decoded.
    async fn fetch_progress(&self, user: &UserId) -> Result<ProgressMap, BackendError>;

    /// Insert or overwrite one entry.
    ///
    /// # Errors
    ///
    /// Returns `BackendError` if the backend rejects or never receives the write.
    async fn upsert_progress(
        &self,
        user: &UserId,
        id: &QuestionId,
        entry: &ProgressEntry,
    ) -> Result<(), BackendError>;

    /// Insert or overwrite every entry of `progress` in one request.
    ///
    /// # Errors
    ///
    /// Returns `BackendError` if the backend rejects or never receives the write.
    async fn upsert_many(&self, user: &UserId, progress: &ProgressMap) -> Result<(), BackendError>;
}
