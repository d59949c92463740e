pub mod content;
mod ids;
mod onboarding;
mod stats;
mod user;

pub use content::{Difficulty, Flashcard, Question, QuestionError, Subject, Topic};
pub use ids::{FlashcardId, QuestionId, TopicId, UserId};
pub use onboarding::{OnboardingStage, OnboardingStep, StageOutOfRange};
pub use stats::{GameStats, StatsPatch, XP_PER_LEVEL, level_for_xp};
pub use user::{LearningStyle, ProfilePatch, User, UserError};
