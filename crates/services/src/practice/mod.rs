mod session;
mod summary;
mod workflow;

// Public API of the practice subsystem.
pub use crate::error::PracticeError;
pub use session::{
    AnswerFeedback, AnswerRecord, DEFAULT_SESSION_LEN, DEFAULT_TIME_LIMIT_MINUTES,
    PracticeSession, PresentedQuestion, SessionLimits,
};
pub use summary::PracticeSummary;
pub use workflow::PracticeLoopService;
