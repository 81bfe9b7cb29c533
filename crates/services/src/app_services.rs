use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use quiz_core::model::{Question, UserId};
use storage::content::JsonQuestionSource;
use storage::repository::{PreferencesRepository, QuestionSource, Storage};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::Clock;
use crate::backend::{BackendConfig, ProgressBackend, SupabaseBackend};
use crate::dashboard_service::DashboardService;
use crate::error::{AppServicesError, ProgressError};
use crate::practice::PracticeLoopService;
use crate::progress::{ProgressStore, SyncReport, spawn_periodic_sync};
use crate::question_bank_service::{BankFailure, QuestionBankService};

/// Assembles app-facing services over one set of loaded questions.
#[derive(Clone)]
pub struct AppServices {
    questions: Arc<[Question]>,
    bank_failures: Arc<[BankFailure]>,
    progress: Arc<ProgressStore>,
    practice: Arc<PracticeLoopService>,
    dashboard: Arc<DashboardService>,
    preferences: Arc<dyn PreferencesRepository>,
}

impl AppServices {
    /// Build services backed by `SQLite` and JSON banks under `content_root`.
    ///
    /// With a backend config the store is attached to the hosted copy and an
    /// initial full sync runs; its failure is logged, not returned.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization or the backend
    /// client setup fails.
    pub async fn new_sqlite(
        db_url: &str,
        content_root: &Path,
        clock: Clock,
        backend: Option<&BackendConfig>,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        let source: Arc<dyn QuestionSource> = Arc::new(JsonQuestionSource::new(content_root));
        let remote = match backend {
            Some(config) => {
                let client: Arc<dyn ProgressBackend> = Arc::new(SupabaseBackend::new(config)?);
                Some((client, config.user_id))
            }
            None => None,
        };
        Self::assemble(storage, source, remote, clock).await
    }

    /// Build services from already constructed parts.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if the progress cache cannot be read.
    pub async fn assemble(
        storage: Storage,
        source: Arc<dyn QuestionSource>,
        remote: Option<(Arc<dyn ProgressBackend>, UserId)>,
        clock: Clock,
    ) -> Result<Self, AppServicesError> {
        let loaded = QuestionBankService::new(source).load_all().await;
        let questions: Arc<[Question]> = loaded.questions.into();

        let mut store = ProgressStore::load(clock, Arc::clone(&storage.progress)).await?;
        if let Some((backend, user)) = remote {
            store = store.with_backend(backend, user);
        }
        let progress = Arc::new(store);

        if progress.is_online() {
            match progress.full_sync().await {
                Ok(report) => info!(fetched = report.fetched, "initial progress sync done"),
                Err(err) => {
                    warn!(error = %err, "initial progress sync failed; using cached progress");
                }
            }
        }

        let practice = Arc::new(PracticeLoopService::new(
            clock,
            Arc::clone(&questions),
            Arc::clone(&progress),
            Arc::clone(&storage.preferences),
        ));
        let dashboard = Arc::new(DashboardService::new(
            Arc::clone(&questions),
            Arc::clone(&progress),
        ));

        Ok(Self {
            questions,
            bank_failures: loaded.failures.into(),
            progress,
            practice,
            dashboard,
            preferences: storage.preferences,
        })
    }

    #[must_use]
    pub fn questions(&self) -> Arc<[Question]> {
        Arc::clone(&self.questions)
    }

    #[must_use]
    pub fn bank_failures(&self) -> &[BankFailure] {
        &self.bank_failures
    }

    #[must_use]
    pub fn progress(&self) -> Arc<ProgressStore> {
        Arc::clone(&self.progress)
    }

    #[must_use]
    pub fn practice(&self) -> Arc<PracticeLoopService> {
        Arc::clone(&self.practice)
    }

    #[must_use]
    pub fn dashboard(&self) -> Arc<DashboardService> {
        Arc::clone(&self.dashboard)
    }

    #[must_use]
    pub fn preferences(&self) -> Arc<dyn PreferencesRepository> {
        Arc::clone(&self.preferences)
    }

    /// Run one full sync now.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::Offline` when signed out, or the sync error.
    pub async fn sync_now(&self) -> Result<SyncReport, ProgressError> {
        self.progress.full_sync().await
    }

    /// Start background sync when a backend is attached.
    #[must_use]
    pub fn spawn_sync(
        &self,
        period: Duration,
        shutdown: watch::Receiver<bool>,
    ) -> Option<JoinHandle<()>> {
        self.progress
            .is_online()
            .then(|| spawn_periodic_sync(Arc::clone(&self.progress), period, shutdown))
    }
}
