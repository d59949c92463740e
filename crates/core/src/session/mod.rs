//! Assessment engine: countdown, answer capture, scoring and the session state machines.

mod answers;
mod countdown;
mod quiz;
mod review;
mod scoring;

use thiserror::Error;

pub use answers::{AnswerSheet, Selection};
pub use countdown::{Countdown, DEFAULT_TIME_BUDGET, Tick};
pub use quiz::{CompletionReason, PASS_MARK, QuizOutcome, QuizSession, SessionStatus};
pub use review::{FlashcardReview, Recall, ReviewCompletion};
pub use scoring::{Mistake, Score, extract_mistakes, score};

/// Errors raised by the in-memory session engines.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionError {
    #[error("no items available for session")]
    Empty,

    #[error("session already completed")]
    Completed,

    #[error("position {position} is outside a session of {len} items")]
    PositionOutOfRange { position: usize, len: usize },

    #[error("option {option} is outside 0..{options}")]
    OptionOutOfRange { option: usize, options: usize },
}
