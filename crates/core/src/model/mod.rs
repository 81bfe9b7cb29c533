mod bank;
mod filter;
pub mod ids;
mod preferences;
pub mod progress;
mod question;
mod stats;

pub use bank::{BANKS, Bank, find_bank};
pub use filter::{ALL_TOPICS, QuestionFilter, subtopics, topics};
pub use ids::{ParseIdError, QuestionId, UserId};
pub use preferences::PracticePreferences;
pub use progress::{ProgressEntry, ProgressMap};
pub use question::{Choice, Difficulty, Question, QuestionError, QuestionRecord};
pub use stats::{DashboardStats, DifficultyStats, GroupStats, TopicStats};
