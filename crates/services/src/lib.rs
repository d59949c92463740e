#![forbid(unsafe_code)]

pub mod app_services;
pub mod config;
pub mod error;
pub mod onboarding;
pub mod progress_service;
pub mod rewards;
pub mod sessions;
pub mod timer;

pub use practice_core::Clock;

pub use app_services::AppServices;
pub use config::PracticeConfig;
pub use error::{AppServicesError, OnboardingError, PracticeError, ProgressStoreError};
pub use onboarding::{Navigation, OnboardingFlow, StageHandler, StageView, default_handler};
pub use progress_service::{ActivityCredit, ProgressStore};
pub use sessions::{
    FlashcardReward, PracticeService, QuizProgress, QuizReport, QuizReward, QuizRun, StartedQuiz,
};
pub use timer::SessionTimer;
