mod progress;
mod quiz_run;
mod workflow;

pub use progress::QuizProgress;
pub use quiz_run::{QuizReport, QuizRun};
pub use workflow::{FlashcardReward, PracticeService, QuizReward, StartedQuiz};
