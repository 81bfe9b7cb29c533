//! Shared error types for the services crate.

use thiserror::Error;

use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Errors emitted by hosted progress backends.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BackendError {
    /// 401/403 from the backend: missing, expired or rejected credentials.
    #[error("authentication failed: {0}")]
    Unauthorized(String),
    #[error("backend error (HTTP {status}): {message}")]
    Api { status: u16, message: String },
    #[error("backend request timed out after {0}s")]
    Timeout(u64),
    #[error("network error: {0}")]
    Network(String),
    #[error("invalid backend response: {0}")]
    InvalidResponse(String),
    #[error("invalid backend configuration: {0}")]
    Config(String),
}

/// Errors emitted by `ProgressStore`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProgressError {
    #[error("no backend attached; progress is kept on this device only")]
    Offline,
    #[error("progress state is unavailable: {0}")]
    Poisoned(String),
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by practice sessions.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PracticeError {
    #[error("no questions match the selected filters")]
    EmptyPool,
    #[error("practice session already completed")]
    Completed,
    #[error("time is up for this practice session")]
    TimeUp,
    #[error("no question is currently shown")]
    NoCurrentQuestion,
    #[error("choice {index} is out of range ({len} choices)")]
    ChoiceOutOfRange { index: usize, len: usize },
    #[error(transparent)]
    Progress(#[from] ProgressError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error(transparent)]
    Progress(#[from] ProgressError),
}
