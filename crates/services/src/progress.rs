//! Optimistic, cache-backed progress with background reconciliation.
//!
//! Answers land in memory first, then in the device cache, then on the
//! hosted backend. A failed remote write never loses the answer: the entry is
//! marked pending and pushed again on the next full sync.

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use quiz_core::Clock;
use quiz_core::model::progress::merge;
use quiz_core::model::{ProgressEntry, ProgressMap, QuestionId, UserId};
use storage::repository::ProgressCache;
use tokio::sync::{Mutex as AsyncMutex, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, instrument, warn};

use crate::backend::ProgressBackend;
use crate::error::ProgressError;

/// Default interval between automatic full syncs.
pub const DEFAULT_SYNC_PERIOD: Duration = Duration::from_secs(30);

#[derive(Clone)]
struct Remote {
    backend: Arc<dyn ProgressBackend>,
    user: UserId,
}

#[derive(Debug, Default)]
struct StoreState {
    progress: ProgressMap,
    /// Ids whose latest local value has not reached the backend.
    pending: BTreeSet<QuestionId>,
}

/// Outcome of one [`ProgressStore::full_sync`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Entries returned by the backend.
    pub fetched: usize,
    /// Entries written to the backend (pending retries plus local-only).
    pub pushed: usize,
    /// Entries in the store after merging.
    pub total: usize,
}

/// The user's progress for one running app.
///
/// Shared behind an `Arc`; the state lock is never held across an
/// `.await`.
pub struct ProgressStore {
    clock: Clock,
    cache: Arc<dyn ProgressCache>,
    /// Serialises single-entry cache writes against whole-cache rewrites.
    cache_writes: AsyncMutex<()>,
    remote: Option<Remote>,
    state: Mutex<StoreState>,
}

impl ProgressStore {
    /// Start from whatever the device cache holds.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::Storage` if the cache cannot be read.
    pub async fn load(clock: Clock, cache: Arc<dyn ProgressCache>) -> Result<Self, ProgressError> {
        let progress = cache.load_progress().await?;
        debug!(entries = progress.len(), "loaded cached progress");
        Ok(Self {
            clock,
            cache,
            cache_writes: AsyncMutex::new(()),
            remote: None,
            state: Mutex::new(StoreState {
                progress,
                pending: BTreeSet::new(),
            }),
        })
    }

    /// Attach the hosted backend for `user` (signed-in mode).
    #[must_use]
    pub fn with_backend(mut self, backend: Arc<dyn ProgressBackend>, user: UserId) -> Self {
        self.remote = Some(Remote { backend, user });
        self
    }

    #[must_use]
    pub fn is_online(&self) -> bool {
        self.remote.is_some()
    }

    #[must_use]
    pub fn user(&self) -> Option<UserId> {
        self.remote.as_ref().map(|r| r.user)
    }

    fn lock(&self) -> Result<MutexGuard<'_, StoreState>, ProgressError> {
        self.state
            .lock()
            .map_err(|e| ProgressError::Poisoned(e.to_string()))
    }

    /// Copy of the current progress map.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::Poisoned` if a previous holder of the state
    /// lock panicked.
    pub fn snapshot(&self) -> Result<ProgressMap, ProgressError> {
        Ok(self.lock()?.progress.clone())
    }

    /// # Errors
    ///
    /// Returns `ProgressError::Poisoned` if the state lock is poisoned.
    pub fn entry(&self, id: &QuestionId) -> Result<Option<ProgressEntry>, ProgressError> {
        Ok(self.lock()?.progress.get(id).copied())
    }

    /// Ids waiting to be pushed to the backend.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::Poisoned` if the state lock is poisoned.
    pub fn pending(&self) -> Result<Vec<QuestionId>, ProgressError> {
        Ok(self.lock()?.pending.iter().cloned().collect())
    }

    /// Record one answer.
    ///
    /// The in-memory map is updated before the first `.await`, so callers
    /// see the new counts immediately. Cache and backend failures are logged
    /// and do not undo the local update.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::Poisoned` if the state lock is poisoned.
    #[instrument(skip(self), fields(question = %id))]
    pub async fn record_answer(
        &self,
        id: &QuestionId,
        correct: bool,
    ) -> Result<ProgressEntry, ProgressError> {
        let now = self.clock.now();
        let entry = self.lock()?.progress.record(id, correct, now);

        {
            let _writes = self.cache_writes.lock().await;
            // Write whatever is newest for this id; a later answer may have
            // overtaken this one while we waited.
            let latest = self.lock()?.progress.get(id).copied().unwrap_or(entry);
            if let Err(err) = self.cache.save_entry(id, &latest).await {
                warn!(error = %err, "failed to cache progress entry");
            }
        }

        let Some(remote) = &self.remote else {
            return Ok(entry);
        };

        match remote.backend.upsert_progress(&remote.user, id, &entry).await {
            Ok(()) => {
                let mut state = self.lock()?;
                // A newer answer may have landed while we were waiting.
                if state.progress.get(id) == Some(&entry) {
                    state.pending.remove(id);
                }
            }
            Err(err) => {
                warn!(error = %err, "remote progress update failed; keeping local copy");
                self.lock()?.pending.insert(id.clone());
            }
        }
        Ok(entry)
    }

    /// Reconcile with the backend.
    ///
    /// Pushes pending entries, fetches the remote copy, merges it in (remote
    /// wins for every id it knows, except entries still waiting to be
    /// pushed), pushes entries only this device has, and rewrites the device
    /// cache. If the fetch fails nothing local changes.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::Offline` without a backend, and the backend
    /// error if the fetch fails.
    #[instrument(skip(self))]
    pub async fn full_sync(&self) -> Result<SyncReport, ProgressError> {
        let remote = self.remote.as_ref().ok_or(ProgressError::Offline)?;
        let mut report = SyncReport::default();

        let retry = {
            let state = self.lock()?;
            state.progress.subset(state.pending.iter())
        };
        if !retry.is_empty() {
            match remote.backend.upsert_many(&remote.user, &retry).await {
                Ok(()) => {
                    report.pushed += retry.len();
                    let mut state = self.lock()?;
                    for (id, sent) in retry.iter() {
                        if state.progress.get(id) == Some(sent) {
                            state.pending.remove(id);
                        }
                    }
                }
                Err(err) => {
                    warn!(error = %err, pending = retry.len(), "retrying pending progress failed");
                }
            }
        }

        let fetched = remote.backend.fetch_progress(&remote.user).await?;
        report.fetched = fetched.len();

        let local_only = {
            let mut state = self.lock()?;
            // Entries still pending are newer than anything the backend has.
            let unsent = state.progress.subset(state.pending.iter());
            let local_only = state.progress.local_only(&fetched);
            state.progress = merge(&state.progress, &fetched);
            state.progress.absorb(&unsent);
            report.total = state.progress.len();
            local_only
        };

        if !local_only.is_empty() {
            match remote.backend.upsert_many(&remote.user, &local_only).await {
                Ok(()) => report.pushed += local_only.len(),
                Err(err) => {
                    warn!(
                        error = %err,
                        entries = local_only.len(),
                        "pushing local-only progress failed"
                    );
                    let mut state = self.lock()?;
                    state
                        .pending
                        .extend(local_only.iter().map(|(id, _)| id.clone()));
                }
            }
        }

        {
            // Snapshot under the write lock so an answer cached meanwhile is
            // either in the snapshot or written after the rewrite.
            let _writes = self.cache_writes.lock().await;
            let merged = self.snapshot()?;
            if let Err(err) = self.cache.replace_progress(&merged).await {
                warn!(error = %err, "failed to rewrite progress cache after sync");
            }
        }

        info!(
            fetched = report.fetched,
            pushed = report.pushed,
            total = report.total,
            "progress synced"
        );
        Ok(report)
    }
}

/// Run [`ProgressStore::full_sync`] every `period` until `shutdown` flips to
/// `true` or its sender is dropped.
///
/// The first sync happens one full period after spawning; callers sync
/// explicitly at startup. Failures are logged and retried on the next tick.
pub fn spawn_periodic_sync(
    store: Arc<ProgressStore>,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match store.full_sync().await {
                        Ok(_) => {}
                        Err(ProgressError::Offline) => {
                            debug!("periodic sync stopped: no backend attached");
                            break;
                        }
                        Err(err) => warn!(error = %err, "periodic progress sync failed"),
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        debug!("periodic sync shutting down");
                        break;
                    }
                }
            }
        }
    })
}
