use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::model::question::{Difficulty, Question};

/// Label used for "no topic restriction" in filters and saved preferences.
pub const ALL_TOPICS: &str = "All";

/// Predicate deciding which questions make it into a pool.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionFilter {
    /// `None` means every topic.
    pub topic: Option<String>,
    pub subtopic: Option<String>,
    pub difficulty: Option<Difficulty>,
    /// Case-insensitive match against id, stem and subtopic.
    pub search: Option<String>,
}

impl QuestionFilter {
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Accepts `"All"` (or blank) as "every topic".
    #[must_use]
    pub fn with_topic(mut self, topic: impl Into<String>) -> Self {
        let topic = topic.into();
        self.topic = if topic.trim().is_empty() || topic == ALL_TOPICS {
            None
        } else {
            Some(topic)
        };
        self
    }

    #[must_use]
    pub fn with_subtopic(mut self, subtopic: impl Into<String>) -> Self {
        let subtopic = subtopic.into();
        self.subtopic = if subtopic.trim().is_empty() || subtopic == ALL_TOPICS {
            None
        } else {
            Some(subtopic)
        };
        self
    }

    #[must_use]
    pub fn with_difficulty(mut self, difficulty: Option<Difficulty>) -> Self {
        self.difficulty = difficulty;
        self
    }

    #[must_use]
    pub fn with_search(mut self, term: impl Into<String>) -> Self {
        let term = term.into();
        self.search = if term.trim().is_empty() {
            None
        } else {
            Some(term.to_lowercase())
        };
        self
    }

    #[must_use]
    pub fn matches(&self, q: &Question) -> bool {
        if self.topic.as_deref().is_some_and(|t| t != q.topic()) {
            return false;
        }
        if self.subtopic.as_deref().is_some_and(|s| s != q.subtopic()) {
            return false;
        }
        if self.difficulty.is_some_and(|d| d != q.difficulty()) {
            return false;
        }
        match self.search.as_deref() {
            None => true,
            Some(term) => {
                let term = term.to_lowercase();
                q.id().as_str().to_lowercase().contains(&term)
                    || q.stem().to_lowercase().contains(&term)
                    || q.subtopic().to_lowercase().contains(&term)
            }
        }
    }

    /// Build a pool from `questions`, keeping their original order.
    #[must_use]
    pub fn apply(&self, questions: &[Question]) -> Vec<Question> {
        questions
            .iter()
            .filter(|q| self.matches(q))
            .cloned()
            .collect()
    }
}

/// Distinct topics, sorted.
#[must_use]
pub fn topics(questions: &[Question]) -> Vec<String> {
    questions
        .iter()
        .map(|q| q.topic().to_owned())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Distinct subtopics, sorted, optionally restricted to one topic.
#[must_use]
pub fn subtopics(questions: &[Question], topic: Option<&str>) -> Vec<String> {
    questions
        .iter()
        .filter(|q| topic.is_none_or(|t| t == q.topic()))
        .map(|q| q.subtopic().to_owned())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
