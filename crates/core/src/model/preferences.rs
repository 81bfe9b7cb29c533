use serde::{Deserialize, Serialize};

use crate::model::filter::{ALL_TOPICS, QuestionFilter};
use crate::model::question::Difficulty;
use crate::selector::SelectionMode;

/// Practice choices remembered on this device between runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PracticePreferences {
    pub topic: String,
    pub difficulty: Option<Difficulty>,
    pub mode: SelectionMode,
}

impl Default for PracticePreferences {
    fn default() -> Self {
        Self {
            topic: ALL_TOPICS.to_owned(),
            difficulty: None,
            mode: SelectionMode::Sequential,
        }
    }
}

impl PracticePreferences {
    #[must_use]
    pub fn filter(&self) -> QuestionFilter {
        QuestionFilter::all()
            .with_topic(self.topic.clone())
            .with_difficulty(self.difficulty)
    }
}
