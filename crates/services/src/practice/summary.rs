use chrono::Duration;
use quiz_core::model::progress::accuracy_percent;

use super::session::AnswerRecord;

/// End-of-session report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PracticeSummary {
    pub answered: usize,
    pub correct: usize,
    pub wrong: usize,
    /// Rounded percent, 0 when nothing was answered.
    pub accuracy: u32,
    pub elapsed: Duration,
    pub completed: bool,
}

impl PracticeSummary {
    #[must_use]
    pub fn from_answers(answers: &[AnswerRecord], elapsed: Duration, completed: bool) -> Self {
        let correct = answers.iter().filter(|a| a.correct).count();
        let wrong = answers.len() - correct;
        Self {
            answered: answers.len(),
            correct,
            wrong,
            accuracy: accuracy_percent(
                u64::try_from(correct).unwrap_or(u64::MAX),
                u64::try_from(wrong).unwrap_or(u64::MAX),
            ),
            elapsed: elapsed.max(Duration::zero()),
            completed,
        }
    }
}
