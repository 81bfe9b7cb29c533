use chrono::{DateTime, Duration, Utc};
use quiz_core::model::{Choice, Question, QuestionId};
use quiz_core::{SelectionMode, SelectionState, ShuffleResult, shuffle};
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::error::PracticeError;
use super::summary::PracticeSummary;

/// Questions per session unless configured otherwise.
pub const DEFAULT_SESSION_LEN: usize = 10;
/// Session timer unless configured otherwise.
pub const DEFAULT_TIME_LIMIT_MINUTES: i64 = 12;

//
// ─── LIMITS ────────────────────────────────────────────────────────────────────
//

/// When a practice session ends on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionLimits {
    max_questions: Option<usize>,
    time_limit: Option<Duration>,
}

impl Default for SessionLimits {
    fn default() -> Self {
        Self {
            max_questions: Some(DEFAULT_SESSION_LEN),
            time_limit: Some(Duration::minutes(DEFAULT_TIME_LIMIT_MINUTES)),
        }
    }
}

impl SessionLimits {
    /// No question cap and no timer; the session runs until finished.
    #[must_use]
    pub fn unlimited() -> Self {
        Self {
            max_questions: None,
            time_limit: None,
        }
    }

    #[must_use]
    pub fn with_max_questions(mut self, max: Option<usize>) -> Self {
        self.max_questions = max.filter(|n| *n > 0);
        self
    }

    #[must_use]
    pub fn with_time_limit(mut self, limit: Option<Duration>) -> Self {
        self.time_limit = limit.filter(|d| *d > Duration::zero());
        self
    }

    #[must_use]
    pub fn max_questions(&self) -> Option<usize> {
        self.max_questions
    }

    #[must_use]
    pub fn time_limit(&self) -> Option<Duration> {
        self.time_limit
    }
}

//
// ─── PRESENTED / ANSWERED ──────────────────────────────────────────────────────
//

/// The question currently on screen with its shuffled choices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresentedQuestion {
    question: Question,
    shuffle: ShuffleResult,
    shown_at: DateTime<Utc>,
}

impl PresentedQuestion {
    #[must_use]
    pub fn question(&self) -> &Question {
        &self.question
    }

    /// Choices in display order.
    #[must_use]
    pub fn choices(&self) -> &[Choice] {
        self.shuffle.choices()
    }

    #[must_use]
    pub fn shuffle(&self) -> &ShuffleResult {
        &self.shuffle
    }

    #[must_use]
    pub fn shown_at(&self) -> DateTime<Utc> {
        self.shown_at
    }
}

/// One answered question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerRecord {
    pub question_id: QuestionId,
    /// Display index the learner picked.
    pub chosen: usize,
    /// Display index of the correct choice.
    pub correct_index: usize,
    pub correct: bool,
    pub answered_at: DateTime<Utc>,
}

/// What the UI needs to give feedback after an answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerFeedback {
    pub record: AnswerRecord,
    /// The picked choice, with its rationale.
    pub chosen: Choice,
    pub correct_choice: Choice,
    pub solution_steps: Vec<String>,
    pub session_complete: bool,
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// One bounded run over a filtered pool.
///
/// Owns its selection cursor and RNG; nothing here is shared between
/// sessions. Time is passed in by the caller so the services layer clock
/// stays the single source of "now".
pub struct PracticeSession {
    pool: Vec<Question>,
    selection: SelectionState,
    rng: StdRng,
    limits: SessionLimits,
    started_at: DateTime<Utc>,
    current: Option<PresentedQuestion>,
    answers: Vec<AnswerRecord>,
    completed_at: Option<DateTime<Utc>>,
}

impl PracticeSession {
    /// Create a session seeded from the thread RNG.
    ///
    /// # Errors
    ///
    /// Returns `PracticeError::EmptyPool` if `pool` is empty.
    pub fn new(
        pool: Vec<Question>,
        mode: SelectionMode,
        limits: SessionLimits,
        started_at: DateTime<Utc>,
    ) -> Result<Self, PracticeError> {
        let rng = StdRng::from_rng(&mut rand::rng());
        Self::with_rng(pool, mode, limits, started_at, rng)
    }

    /// Create a session with an explicit RNG (deterministic in tests).
    ///
    /// # Errors
    ///
    /// Returns `PracticeError::EmptyPool` if `pool` is empty.
    pub fn with_rng(
        pool: Vec<Question>,
        mode: SelectionMode,
        limits: SessionLimits,
        started_at: DateTime<Utc>,
        rng: StdRng,
    ) -> Result<Self, PracticeError> {
        if pool.is_empty() {
            return Err(PracticeError::EmptyPool);
        }
        Ok(Self {
            pool,
            selection: SelectionState::new(mode),
            rng,
            limits,
            started_at,
            current: None,
            answers: Vec::new(),
            completed_at: None,
        })
    }

    #[must_use]
    pub fn mode(&self) -> SelectionMode {
        self.selection.mode()
    }

    #[must_use]
    pub fn limits(&self) -> SessionLimits {
        self.limits
    }

    #[must_use]
    pub fn pool_size(&self) -> usize {
        self.pool.len()
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.completed_at.is_some()
    }

    #[must_use]
    pub fn answers(&self) -> &[AnswerRecord] {
        &self.answers
    }

    #[must_use]
    pub fn current(&self) -> Option<&PresentedQuestion> {
        self.current.as_ref()
    }

    /// Time left on the timer, `None` when untimed.
    #[must_use]
    pub fn remaining_time(&self, now: DateTime<Utc>) -> Option<Duration> {
        self.limits
            .time_limit
            .map(|limit| (limit - (now - self.started_at)).max(Duration::zero()))
    }

    fn time_is_up(&self, now: DateTime<Utc>) -> bool {
        self.remaining_time(now).is_some_and(|left| left <= Duration::zero())
    }

    fn count_reached(&self) -> bool {
        self.limits
            .max_questions
            .is_some_and(|max| self.answers.len() >= max)
    }

    /// Show the next question.
    ///
    /// Returns `Ok(None)` once the session has ended (question cap or timer).
    /// Calling this while a question is unanswered skips it.
    ///
    /// # Errors
    ///
    /// Returns `PracticeError::EmptyPool` if the selector yields nothing.
    pub fn present_next(
        &mut self,
        now: DateTime<Utc>,
    ) -> Result<Option<&PresentedQuestion>, PracticeError> {
        if self.is_complete() {
            return Ok(None);
        }
        if self.count_reached() || self.time_is_up(now) {
            self.finish(now);
            return Ok(None);
        }

        let question = self
            .selection
            .next(&self.pool, &mut self.rng)
            .cloned()
            .ok_or(PracticeError::EmptyPool)?;
        let shuffle = shuffle(&question, &mut self.rng);
        self.current = Some(PresentedQuestion {
            question,
            shuffle,
            shown_at: now,
        });
        Ok(self.current.as_ref())
    }

    /// Answer the shown question with the choice at `display_index`.
    ///
    /// # Errors
    ///
    /// Returns `Completed` after the session ended, `TimeUp` when the timer
    /// ran out before the answer (the session is closed), `NoCurrentQuestion`
    /// if nothing is shown, and `ChoiceOutOfRange` for a bad index.
    pub fn answer(
        &mut self,
        display_index: usize,
        now: DateTime<Utc>,
    ) -> Result<AnswerFeedback, PracticeError> {
        if self.is_complete() {
            return Err(PracticeError::Completed);
        }
        if self.time_is_up(now) {
            self.finish(now);
            return Err(PracticeError::TimeUp);
        }
        let presented = self
            .current
            .take()
            .ok_or(PracticeError::NoCurrentQuestion)?;

        let len = presented.choices().len();
        let Some(chosen) = presented.choices().get(display_index).cloned() else {
            self.current = Some(presented);
            return Err(PracticeError::ChoiceOutOfRange {
                index: display_index,
                len,
            });
        };

        let correct_index = presented.shuffle.correct_index();
        let record = AnswerRecord {
            question_id: presented.question.id().clone(),
            chosen: display_index,
            correct_index,
            correct: presented.shuffle.is_correct(display_index),
            answered_at: now,
        };
        self.answers.push(record.clone());
        if self.count_reached() {
            self.finish(now);
        }

        Ok(AnswerFeedback {
            record,
            chosen,
            correct_choice: presented.question.correct_choice().clone(),
            solution_steps: presented.question.solution_steps().to_vec(),
            session_complete: self.is_complete(),
        })
    }

    /// End the session now. No effect if it already ended.
    pub fn finish(&mut self, now: DateTime<Utc>) {
        if self.completed_at.is_none() {
            self.completed_at = Some(now);
            self.current = None;
        }
    }

    /// Begin again over the same pool: answers cleared, fresh order.
    pub fn restart(&mut self, now: DateTime<Utc>) {
        self.selection.restart();
        self.answers.clear();
        self.current = None;
        self.completed_at = None;
        self.started_at = now;
    }

    #[must_use]
    pub fn summary(&self, now: DateTime<Utc>) -> PracticeSummary {
        let end = self.completed_at.unwrap_or(now);
        PracticeSummary::from_answers(&self.answers, end - self.started_at, self.is_complete())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::QuestionRecord;
    use quiz_core::time::fixed_now;
    use std::collections::HashSet;

    fn pool(n: usize) -> Vec<Question> {
        (0..n)
            .map(|i| {
                QuestionRecord {
                    id: format!("Q{i}"),
                    topic: "Algebra".into(),
                    subtopic: "Linear Equations".into(),
                    diff: 1,
                    stem: format!("Question {i}"),
                    choices: vec![
                        Choice::new("right", "Correct."),
                        Choice::new("wrong", "Sign error."),
                        Choice::new("other", "Off by one."),
                    ],
                    answer_index: 0,
                    solution_steps: vec!["Solve it.".into()],
                }
                .validate()
                .unwrap()
            })
            .collect()
    }

    fn session(n: usize, mode: SelectionMode, limits: SessionLimits) -> PracticeSession {
        PracticeSession::with_rng(pool(n), mode, limits, fixed_now(), StdRng::seed_from_u64(42))
            .unwrap()
    }

    fn correct_index(s: &PracticeSession) -> usize {
        s.current().unwrap().shuffle().correct_index()
    }

    #[test]
    fn empty_pool_is_rejected() {
        let err = PracticeSession::new(
            Vec::new(),
            SelectionMode::Random,
            SessionLimits::default(),
            fixed_now(),
        );
        assert!(matches!(err, Err(PracticeError::EmptyPool)));
    }

    #[test]
    fn stops_at_question_limit() {
        let mut s = session(20, SelectionMode::Shuffled, SessionLimits::default());
        let now = fixed_now();
        for i in 0..DEFAULT_SESSION_LEN {
            assert!(s.present_next(now).unwrap().is_some());
            let pick = correct_index(&s);
            let feedback = s.answer(pick, now).unwrap();
            assert!(feedback.record.correct);
            assert_eq!(feedback.session_complete, i + 1 == DEFAULT_SESSION_LEN);
        }
        assert!(s.is_complete());
        assert!(s.present_next(now).unwrap().is_none());
        assert!(matches!(s.answer(0, now), Err(PracticeError::Completed)));

        let unique: HashSet<_> = s.answers().iter().map(|a| a.question_id.clone()).collect();
        assert_eq!(unique.len(), DEFAULT_SESSION_LEN);
    }

    #[test]
    fn stops_when_timer_runs_out() {
        let mut s = session(5, SelectionMode::Sequential, SessionLimits::default());
        let start = fixed_now();
        s.present_next(start).unwrap();
        assert_eq!(s.remaining_time(start), Some(Duration::minutes(12)));

        let late = start + Duration::minutes(12);
        assert!(matches!(s.answer(0, late), Err(PracticeError::TimeUp)));
        assert!(s.is_complete());
        assert_eq!(s.remaining_time(late), Some(Duration::zero()));
        assert_eq!(s.summary(late).answered, 0);
    }

    #[test]
    fn wrong_answer_reports_correct_choice_and_rationale() {
        let mut s = session(3, SelectionMode::Sequential, SessionLimits::unlimited());
        let now = fixed_now();
        s.present_next(now).unwrap();
        let right = correct_index(&s);
        let wrong = (right + 1) % 3;
        let chosen_text = s.current().unwrap().choices()[wrong].text.clone();

        let feedback = s.answer(wrong, now).unwrap();
        assert!(!feedback.record.correct);
        assert_eq!(feedback.record.correct_index, right);
        assert_eq!(feedback.chosen.text, chosen_text);
        assert_eq!(feedback.correct_choice.text, "right");
        assert_eq!(feedback.solution_steps, vec!["Solve it.".to_owned()]);
        assert!(!s.is_complete());
        assert!(s.remaining_time(now).is_none());
    }

    #[test]
    fn out_of_range_choice_keeps_question_shown() {
        let mut s = session(2, SelectionMode::Sequential, SessionLimits::default());
        let now = fixed_now();
        s.present_next(now).unwrap();
        assert!(matches!(
            s.answer(7, now),
            Err(PracticeError::ChoiceOutOfRange { index: 7, len: 3 })
        ));
        assert!(s.current().is_some());
        assert!(s.answer(0, now).is_ok());
        assert!(matches!(s.answer(0, now), Err(PracticeError::NoCurrentQuestion)));
    }

    #[test]
    fn summary_counts_and_restart() {
        let limits = SessionLimits::default().with_max_questions(Some(4));
        let mut s = session(4, SelectionMode::Sequential, limits);
        let mut now = fixed_now();
        for i in 0..4 {
            s.present_next(now).unwrap();
            let right = correct_index(&s);
            let pick = if i % 2 == 0 { right } else { (right + 1) % 3 };
            s.answer(pick, now).unwrap();
            now += Duration::seconds(30);
        }

        let summary = s.summary(now);
        assert_eq!(summary.answered, 4);
        assert_eq!(summary.correct, 2);
        assert_eq!(summary.accuracy, 50);
        assert_eq!(summary.elapsed, Duration::seconds(90));
        assert!(summary.completed);

        s.restart(now);
        assert!(!s.is_complete());
        assert!(s.answers().is_empty());
        assert_eq!(
            s.present_next(now).unwrap().unwrap().question().id().as_str(),
            "Q0"
        );
    }

    #[test]
    fn limits_ignore_zero_values() {
        let limits = SessionLimits::default()
            .with_max_questions(Some(0))
            .with_time_limit(Some(Duration::zero()));
        assert_eq!(limits, SessionLimits::unlimited());
    }
}
