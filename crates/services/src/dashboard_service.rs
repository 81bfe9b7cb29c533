use std::sync::Arc;

use quiz_core::model::{DashboardStats, Question, QuestionFilter, TopicStats};

use crate::error::ProgressError;
use crate::progress::ProgressStore;

/// Progress overview over the loaded questions.
#[derive(Clone)]
pub struct DashboardService {
    questions: Arc<[Question]>,
    progress: Arc<ProgressStore>,
}

impl DashboardService {
    #[must_use]
    pub fn new(questions: Arc<[Question]>, progress: Arc<ProgressStore>) -> Self {
        Self {
            questions,
            progress,
        }
    }

    /// Stats for every loaded question.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::Poisoned` if the progress state is unavailable.
    pub fn stats(&self) -> Result<DashboardStats, ProgressError> {
        Ok(DashboardStats::compute(
            &self.questions,
            &self.progress.snapshot()?,
        ))
    }

    /// Stats restricted to questions matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::Poisoned` if the progress state is unavailable.
    pub fn stats_for(&self, filter: &QuestionFilter) -> Result<DashboardStats, ProgressError> {
        let subset = filter.apply(&self.questions);
        Ok(DashboardStats::compute(&subset, &self.progress.snapshot()?))
    }

    /// Attempted topic with the lowest accuracy, a hint for what to practice.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::Poisoned` if the progress state is unavailable.
    pub fn weakest_topic(&self) -> Result<Option<TopicStats>, ProgressError> {
        let stats = self.stats()?;
        Ok(stats
            .by_topic
            .into_iter()
            .filter(|t| t.stats.correct + t.stats.wrong > 0)
            .min_by_key(|t| t.stats.accuracy))
    }
}
