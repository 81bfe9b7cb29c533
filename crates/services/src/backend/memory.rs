use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use quiz_core::model::{ProgressEntry, ProgressMap, QuestionId, UserId};

use super::ProgressBackend;
use crate::error::BackendError;

/// Backend kept in process memory, for tests and offline demos.
///
/// `set_failing(true)` makes every call fail with a network error, which is
/// how an unreachable server looks to the store.
#[derive(Clone, Default)]
pub struct InMemoryBackend {
    users: Arc<Mutex<HashMap<UserId, ProgressMap>>>,
    failing: Arc<AtomicBool>,
    writes: Arc<AtomicUsize>,
}

impl InMemoryBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Number of successful upsert calls so far.
    #[must_use]
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Current server-side copy for `user`.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::Network` if the lock is poisoned.
    pub fn snapshot(&self, user: &UserId) -> Result<ProgressMap, BackendError> {
        let guard = self
            .users
            .lock()
            .map_err(|e| BackendError::Network(e.to_string()))?;
        Ok(guard.get(user).cloned().unwrap_or_default())
    }

    /// Overwrite the server-side copy for `user`.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::Network` if the lock is poisoned.
    pub fn seed(&self, user: &UserId, progress: ProgressMap) -> Result<(), BackendError> {
        let mut guard = self
            .users
            .lock()
            .map_err(|e| BackendError::Network(e.to_string()))?;
        guard.insert(*user, progress);
        Ok(())
    }

    fn check(&self) -> Result<(), BackendError> {
        if self.failing.load(Ordering::SeqCst) {
            Err(BackendError::Network("backend unreachable".into()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl ProgressBackend for InMemoryBackend {
    async fn fetch_progress(&self, user: &UserId) -> Result<ProgressMap, BackendError> {
        self.check()?;
        self.snapshot(user)
    }

    async fn upsert_progress(
        &self,
        user: &UserId,
        id: &QuestionId,
        entry: &ProgressEntry,
    ) -> Result<(), BackendError> {
        self.check()?;
        let mut guard = self
            .users
            .lock()
            .map_err(|e| BackendError::Network(e.to_string()))?;
        guard.entry(*user).or_default().insert(id.clone(), *entry);
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn upsert_many(&self, user: &UserId, progress: &ProgressMap) -> Result<(), BackendError> {
        self.check()?;
        let mut guard = self
            .users
            .lock()
            .map_err(|e| BackendError::Network(e.to_string()))?;
        guard.entry(*user).or_default().absorb(progress);
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
