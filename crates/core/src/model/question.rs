use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::model::ids::{ParseIdError, QuestionId};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

/// Content-integrity problems found while loading a question record.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question id is missing or blank")]
    MissingId,

    #[error("question {id}: stem cannot be empty")]
    EmptyStem { id: String },

    #[error("question {id}: needs at least 2 choices, found {len}")]
    TooFewChoices { id: String, len: usize },

    #[error("question {id}: answer index {index} is out of range (0-{last})")]
    AnswerOutOfRange { id: String, index: usize, last: usize },

    #[error("difficulty should be between 1 and 5, got {0}")]
    InvalidDifficulty(u8),
}

impl From<ParseIdError> for QuestionError {
    fn from(_: ParseIdError) -> Self {
        Self::MissingId
    }
}

//
// ─── DIFFICULTY ────────────────────────────────────────────────────────────────
//

/// Star rating of a question, 1 (easiest) to 5 (hardest).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Difficulty(u8);

impl Difficulty {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    /// # Errors
    ///
    /// Returns `QuestionError::InvalidDifficulty` outside `1..=5`.
    pub fn new(value: u8) -> Result<Self, QuestionError> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Ok(Self(value))
        } else {
            Err(QuestionError::InvalidDifficulty(value))
        }
    }

    #[must_use]
    pub fn value(self) -> u8 {
        self.0
    }

    /// All difficulty levels in ascending order.
    pub fn all() -> impl Iterator<Item = Difficulty> {
        (Self::MIN..=Self::MAX).map(Difficulty)
    }
}

impl TryFrom<u8> for Difficulty {
    type Error = QuestionError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Difficulty> for u8 {
    fn from(d: Difficulty) -> Self {
        d.0
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for _ in 0..self.0 {
            f.write_str("★")?;
        }
        Ok(())
    }
}

//
// ─── CHOICE ────────────────────────────────────────────────────────────────────
//

/// One answer option. Identified only by its position inside a question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choice {
    pub text: String,
    #[serde(default)]
    pub rationale: String,
}

impl Choice {
    #[must_use]
    pub fn new(text: impl Into<String>, rationale: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            rationale: rationale.into(),
        }
    }
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// On-disk shape of a question as stored in the JSON banks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionRecord {
    pub id: String,
    pub topic: String,
    pub subtopic: String,
    pub diff: u8,
    pub stem: String,
    pub choices: Vec<Choice>,
    pub answer_index: usize,
    #[serde(default)]
    pub solution_steps: Vec<String>,
}

impl QuestionRecord {
    /// Check the record and turn it into a `Question`.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` when the id or stem is blank, fewer than two
    /// choices are present, the answer index is out of range, or the
    /// difficulty is outside `1..=5`.
    pub fn validate(self) -> Result<Question, QuestionError> {
        let id = QuestionId::new(self.id)?;
        if self.stem.trim().is_empty() {
            return Err(QuestionError::EmptyStem {
                id: id.to_string(),
            });
        }
        if self.choices.len() < 2 {
            return Err(QuestionError::TooFewChoices {
                id: id.to_string(),
                len: self.choices.len(),
            });
        }
        if self.answer_index >= self.choices.len() {
            return Err(QuestionError::AnswerOutOfRange {
                id: id.to_string(),
                index: self.answer_index,
                last: self.choices.len() - 1,
            });
        }
        let difficulty = Difficulty::new(self.diff)?;

        Ok(Question {
            id,
            topic: self.topic,
            subtopic: self.subtopic,
            difficulty,
            stem: self.stem,
            choices: self.choices,
            answer_index: self.answer_index,
            solution_steps: self.solution_steps,
        })
    }
}

/// A validated multiple-choice question. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "QuestionRecord", into = "QuestionRecord")]
pub struct Question {
    id: QuestionId,
    topic: String,
    subtopic: String,
    difficulty: Difficulty,
    stem: String,
    choices: Vec<Choice>,
    answer_index: usize,
    solution_steps: Vec<String>,
}

impl TryFrom<QuestionRecord> for Question {
    type Error = QuestionError;

    fn try_from(record: QuestionRecord) -> Result<Self, Self::Error> {
        record.validate()
    }
}

impl From<Question> for QuestionRecord {
    fn from(q: Question) -> Self {
        Self {
            id: q.id.into(),
            topic: q.topic,
            subtopic: q.subtopic,
            diff: q.difficulty.value(),
            stem: q.stem,
            choices: q.choices,
            answer_index: q.answer_index,
            solution_steps: q.solution_steps,
        }
    }
}

impl Question {
    #[must_use]
    pub fn id(&self) -> &QuestionId {
        &self.id
    }

    #[must_use]
    pub fn topic(&self) -> &str {
        &self.topic
    }

    #[must_use]
    pub fn subtopic(&self) -> &str {
        &self.subtopic
    }

    #[must_use]
    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    #[must_use]
    pub fn stem(&self) -> &str {
        &self.stem
    }

    #[must_use]
    pub fn choices(&self) -> &[Choice] {
        &self.choices
    }

    /// Index of the correct choice in the original (unshuffled) order.
    #[must_use]
    pub fn answer_index(&self) -> usize {
        self.answer_index
    }

    #[must_use]
    pub fn correct_choice(&self) -> &Choice {
        &self.choices[self.answer_index]
    }

    #[must_use]
    pub fn solution_steps(&self) -> &[String] {
        &self.solution_steps
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> QuestionRecord {
        QuestionRecord {
            id: "ALG-LIN-001".into(),
            topic: "Algebra".into(),
            subtopic: "Linear Equations".into(),
            diff: 2,
            stem: "Solve $2x + 3 = 7$.".into(),
            choices: vec![
                Choice::new("1", "Subtracted wrong"),
                Choice::new("2", "Correct"),
                Choice::new("5", "Added instead"),
            ],
            answer_index: 1,
            solution_steps: vec!["2x = 4".into(), "x = 2".into()],
        }
    }

    #[test]
    fn valid_record_becomes_question() {
        let q = record().validate().unwrap();
        assert_eq!(q.id().as_str(), "ALG-LIN-001");
        assert_eq!(q.difficulty().value(), 2);
        assert_eq!(q.correct_choice().text, "2");
        assert_eq!(q.solution_steps().len(), 2);
    }

    #[test]
    fn answer_index_out_of_range_is_rejected() {
        let mut r = record();
        r.answer_index = 3;
        let err = r.validate().unwrap_err();
        assert!(matches!(
            err,
            QuestionError::AnswerOutOfRange { index: 3, last: 2, .. }
        ));
    }

    #[test]
    fn single_choice_is_rejected() {
        let mut r = record();
        r.choices.truncate(1);
        r.answer_index = 0;
        assert!(matches!(
            r.validate().unwrap_err(),
            QuestionError::TooFewChoices { len: 1, .. }
        ));
    }

    #[test]
    fn difficulty_outside_range_is_rejected() {
        let mut r = record();
        r.diff = 6;
        assert_eq!(r.validate().unwrap_err(), QuestionError::InvalidDifficulty(6));
        assert!(Difficulty::new(0).is_err());
    }

    #[test]
    fn blank_id_and_stem_are_rejected() {
        let mut r = record();
        r.id = " ".into();
        assert_eq!(r.validate().unwrap_err(), QuestionError::MissingId);

        let mut r = record();
        r.stem = String::new();
        assert!(matches!(r.validate().unwrap_err(), QuestionError::EmptyStem { .. }));
    }

    #[test]
    fn deserializes_bank_json() {
        let json = r#"[{
            "id": "GEO-TRI-004",
            "topic": "Geometry",
            "subtopic": "Triangles",
            "diff": 3,
            "stem": "Find the hypotenuse.",
            "choices": [
                {"text": "5", "rationale": "3-4-5 triangle"},
                {"text": "7"}
            ],
            "answerIndex": 0
        }]"#;
        let questions: Vec<Question> = serde_json::from_str(json).unwrap();
        assert_eq!(questions.len(), 1);
        assert_eq!(questions[0].choices()[1].rationale, "");
        assert!(questions[0].solution_steps().is_empty());
    }

    #[test]
    fn difficulty_display_uses_stars() {
        assert_eq!(Difficulty::new(3).unwrap().to_string(), "★★★");
    }
}
