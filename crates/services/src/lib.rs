#![forbid(unsafe_code)]

pub mod app_services;
pub mod backend;
pub mod dashboard_service;
pub mod error;
pub mod practice;
pub mod progress;
pub mod question_bank_service;
pub mod worksheet;

pub use quiz_core::Clock;

pub use app_services::AppServices;
pub use backend::{BackendConfig, InMemoryBackend, ProgressBackend, SupabaseBackend};
pub use dashboard_service::DashboardService;
pub use error::{AppServicesError, BackendError, PracticeError, ProgressError};
pub use practice::{
    AnswerFeedback, PracticeLoopService, PracticeSession, PracticeSummary, PresentedQuestion,
    SessionLimits,
};
pub use progress::{DEFAULT_SYNC_PERIOD, ProgressStore, SyncReport, spawn_periodic_sync};
pub use question_bank_service::{BankFailure, LoadedQuestions, QuestionBankService};
pub use worksheet::{AnswerKeyFormat, Worksheet, WorksheetSection};
