mod flashcard;
mod question;
mod topic;

pub use flashcard::Flashcard;
pub use question::{Question, QuestionError};
pub use topic::{Difficulty, Subject, Topic};
