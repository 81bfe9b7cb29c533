use async_trait::async_trait;
use quiz_core::model::{Bank, PracticePreferences, ProgressEntry, ProgressMap, Question, QuestionId};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("io error on {path}: {message}")]
    Io { path: String, message: String },
}

/// Durable, device-local copy of the user's progress.
///
/// This is the cache that survives restarts when the backend is unreachable
/// or the user is signed out.
#[async_trait]
pub trait ProgressCache: Send + Sync {
    /// Load every cached entry.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the cache cannot be read.
    async fn load_progress(&self) -> Result<ProgressMap, StorageError>;

    /// Insert or overwrite one entry.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the entry cannot be stored.
    async fn save_entry(&self, id: &QuestionId, entry: &ProgressEntry) -> Result<(), StorageError>;

    /// Replace the whole cache with `progress`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the cache cannot be rewritten. Implementations
    /// must leave the previous contents in place on failure.
    async fn replace_progress(&self, progress: &ProgressMap) -> Result<(), StorageError>;
}

/// Last practice filter and mode chosen on this device.
#[async_trait]
pub trait PreferencesRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError` if the preferences cannot be read.
    async fn get_preferences(&self) -> Result<Option<PracticePreferences>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` if the preferences cannot be stored.
    async fn save_preferences(&self, prefs: &PracticePreferences) -> Result<(), StorageError>;
}

/// Read-only supplier of question banks.
#[async_trait]
pub trait QuestionSource: Send + Sync {
    /// Load and validate every question of one bank.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` when the bank is missing, or other
    /// storage errors when it cannot be read or parsed.
    async fn load_bank(&self, bank: &Bank) -> Result<Vec<Question>, StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    progress: Arc<Mutex<ProgressMap>>,
    preferences: Arc<Mutex<Option<PracticePreferences>>>,
    banks: Arc<Mutex<HashMap<String, Vec<Question>>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register questions under a bank key so `load_bank` can serve them.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the lock is poisoned.
    pub fn put_bank(&self, key: &str, questions: Vec<Question>) -> Result<(), StorageError> {
        let mut guard = self
            .banks
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(key.to_owned(), questions);
        Ok(())
    }
}

#[async_trait]
impl ProgressCache for InMemoryRepository {
    async fn load_progress(&self) -> Result<ProgressMap, StorageError> {
        let guard = self
            .progress
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.clone())
    }

    async fn save_entry(&self, id: &QuestionId, entry: &ProgressEntry) -> Result<(), StorageError> {
        let mut guard = self
            .progress
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(id.clone(), *entry);
        Ok(())
    }

    async fn replace_progress(&self, progress: &ProgressMap) -> Result<(), StorageError> {
        let mut guard = self
            .progress
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        *guard = progress.clone();
        Ok(())
    }
}

#[async_trait]
impl PreferencesRepository for InMemoryRepository {
    async fn get_preferences(&self) -> Result<Option<PracticePreferences>, StorageError> {
        let guard = self
            .preferences
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.clone())
    }

    async fn save_preferences(&self, prefs: &PracticePreferences) -> Result<(), StorageError> {
        let mut guard = self
            .preferences
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        *guard = Some(prefs.clone());
        Ok(())
    }
}

#[async_trait]
impl QuestionSource for InMemoryRepository {
    async fn load_bank(&self, bank: &Bank) -> Result<Vec<Question>, StorageError> {
        let guard = self
            .banks
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.get(bank.key).cloned().ok_or(StorageError::NotFound)
    }
}

/// Aggregates the device-local repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub progress: Arc<dyn ProgressCache>,
    pub preferences: Arc<dyn PreferencesRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        let progress: Arc<dyn ProgressCache> = Arc::new(repo.clone());
        let preferences: Arc<dyn PreferencesRepository> = Arc::new(repo);
        Self {
            progress,
            preferences,
        }
    }
}
