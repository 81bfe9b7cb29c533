use std::sync::Arc;

use chrono::Duration;
use quiz_core::Clock;
use quiz_core::model::{PracticePreferences, Question};
use storage::repository::PreferencesRepository;
use tracing::{debug, warn};

use super::session::{AnswerFeedback, PracticeSession, PresentedQuestion, SessionLimits};
use super::summary::PracticeSummary;
use crate::error::PracticeError;
use crate::progress::ProgressStore;

/// Orchestrates practice sessions against the loaded questions and records
/// every answer in the progress store.
#[derive(Clone)]
pub struct PracticeLoopService {
    clock: Clock,
    questions: Arc<[Question]>,
    progress: Arc<ProgressStore>,
    preferences: Arc<dyn PreferencesRepository>,
    limits: SessionLimits,
}

impl PracticeLoopService {
    #[must_use]
    pub fn new(
        clock: Clock,
        questions: Arc<[Question]>,
        progress: Arc<ProgressStore>,
        preferences: Arc<dyn PreferencesRepository>,
    ) -> Self {
        Self {
            clock,
            questions,
            progress,
            preferences,
            limits: SessionLimits::default(),
        }
    }

    #[must_use]
    pub fn with_limits(mut self, limits: SessionLimits) -> Self {
        self.limits = limits;
        self
    }

    #[must_use]
    pub fn limits(&self) -> SessionLimits {
        self.limits
    }

    /// Clock that sessions started here are timed against.
    #[must_use]
    pub fn clock(&self) -> Clock {
        self.clock
    }

    /// Time left in `session`, `None` when untimed.
    #[must_use]
    pub fn remaining_time(&self, session: &PracticeSession) -> Option<Duration> {
        session.remaining_time(self.clock.now())
    }

    /// End `session` now and report on it.
    pub fn finish(&self, session: &mut PracticeSession) -> PracticeSummary {
        let now = self.clock.now();
        session.finish(now);
        session.summary(now)
    }

    /// Last saved preferences, or the defaults on a fresh device.
    ///
    /// # Errors
    ///
    /// Returns `PracticeError::Storage` if the preferences cannot be read.
    pub async fn preferences(&self) -> Result<PracticePreferences, PracticeError> {
        Ok(self
            .preferences
            .get_preferences()
            .await?
            .unwrap_or_default())
    }

    /// Number of questions `prefs` would practice from.
    #[must_use]
    pub fn pool_size(&self, prefs: &PracticePreferences) -> usize {
        let filter = prefs.filter();
        self.questions.iter().filter(|q| filter.matches(q)).count()
    }

    /// Start a session with the given filters and remember them.
    ///
    /// # Errors
    ///
    /// Returns `PracticeError::EmptyPool` when no question matches.
    pub async fn start_session(
        &self,
        prefs: &PracticePreferences,
    ) -> Result<PracticeSession, PracticeError> {
        let pool = prefs.filter().apply(&self.questions);
        debug!(
            topic = %prefs.topic,
            mode = %prefs.mode,
            pool = pool.len(),
            "starting practice session"
        );
        let session = PracticeSession::new(pool, prefs.mode, self.limits, self.clock.now())?;

        if let Err(err) = self.preferences.save_preferences(prefs).await {
            warn!(error = %err, "failed to save practice preferences");
        }
        Ok(session)
    }

    /// Show the next question, `None` once the session has ended.
    ///
    /// # Errors
    ///
    /// Propagates `PracticeSession::present_next` errors.
    pub fn present_next<'a>(
        &self,
        session: &'a mut PracticeSession,
    ) -> Result<Option<&'a PresentedQuestion>, PracticeError> {
        session.present_next(self.clock.now())
    }

    /// Answer the shown question and record the result.
    ///
    /// Backend trouble is absorbed by the progress store; only local
    /// failures surface here.
    ///
    /// # Errors
    ///
    /// Returns session errors (`Completed`, `TimeUp`, `ChoiceOutOfRange`,
    /// `NoCurrentQuestion`) or `PracticeError::Progress`.
    pub async fn answer_current(
        &self,
        session: &mut PracticeSession,
        display_index: usize,
    ) -> Result<AnswerFeedback, PracticeError> {
        let feedback = session.answer(display_index, self.clock.now())?;
        self.progress
            .record_answer(&feedback.record.question_id, feedback.record.correct)
            .await?;
        Ok(feedback)
    }
}
