use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::{QuestionId, TopicId};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question prompt cannot be empty")]
    EmptyPrompt,

    #[error("a question needs at least two options, got {0}")]
    TooFewOptions(usize),

    #[error("option {index} is empty")]
    EmptyOption { index: usize },

    #[error("correct option {correct} is outside 0..{options}")]
    CorrectOutOfRange { correct: usize, options: usize },
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// A multiple-choice question. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "QuestionRecord", into = "QuestionRecord")]
pub struct Question {
    id: QuestionId,
    topic_id: TopicId,
    prompt: String,
    options: Vec<String>,
    correct: usize,
    explanation: String,
}

impl Question {
    /// Creates a validated question.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` if the prompt or an option is blank, fewer than two
    /// options are given, or `correct` does not index into `options`.
    pub fn new(
        id: QuestionId,
        topic_id: TopicId,
        prompt: impl Into<String>,
        options: Vec<String>,
        correct: usize,
        explanation: impl Into<String>,
    ) -> Result<Self, QuestionError> {
        let prompt = prompt.into();
        if prompt.trim().is_empty() {
            return Err(QuestionError::EmptyPrompt);
        }
        if options.len() < 2 {
            return Err(QuestionError::TooFewOptions(options.len()));
        }
        if let Some(index) = options.iter().position(|opt| opt.trim().is_empty()) {
            return Err(QuestionError::EmptyOption { index });
        }
        if correct >= options.len() {
            return Err(QuestionError::CorrectOutOfRange {
                correct,
                options: options.len(),
            });
        }

        Ok(Self {
            id,
            topic_id,
            prompt,
            options,
            correct,
            explanation: explanation.into(),
        })
    }

    #[must_use]
    pub fn id(&self) -> &QuestionId {
        &self.id
    }

    #[must_use]
    pub fn topic_id(&self) -> &TopicId {
        &self.topic_id
    }

    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    #[must_use]
    pub fn options(&self) -> &[String] {
        &self.options
    }

    #[must_use]
    pub fn option(&self, index: usize) -> Option<&str> {
        self.options.get(index).map(String::as_str)
    }

    /// Index of the correct option.
    #[must_use]
    pub fn correct(&self) -> usize {
        self.correct
    }

    #[must_use]
    pub fn explanation(&self) -> &str {
        &self.explanation
    }

    #[must_use]
    pub fn is_correct(&self, option: usize) -> bool {
        option == self.correct
    }
}

/// Catalog shape of a question (`{ id, topicId, question, options, answer, explanation }`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuestionRecord {
    id: QuestionId,
    topic_id: TopicId,
    question: String,
    options: Vec<String>,
    answer: usize,
    #[serde(default)]
    explanation: String,
}

impl TryFrom<QuestionRecord> for Question {
    type Error = QuestionError;

    fn try_from(record: QuestionRecord) -> Result<Self, Self::Error> {
        Question::new(
            record.id,
            record.topic_id,
            record.question,
            record.options,
            record.answer,
            record.explanation,
        )
    }
}

impl From<Question> for QuestionRecord {
    fn from(q: Question) -> Self {
        Self {
            id: q.id,
            topic_id: q.topic_id,
            question: q.prompt,
            options: q.options,
            answer: q.correct,
            explanation: q.explanation,
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    fn options(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("option {i}")).collect()
    }

    #[test]
    fn rejects_out_of_range_correct_index() {
        let err = Question::new(
            QuestionId::new("q1"),
            TopicId::new("t"),
            "What?",
            options(3),
            3,
            "",
        )
        .unwrap_err();
        assert_eq!(
            err,
            QuestionError::CorrectOutOfRange {
                correct: 3,
                options: 3
            }
        );
    }

    #[test]
    fn rejects_blank_prompt_and_single_option() {
        let blank = Question::new(QuestionId::new("q"), TopicId::new("t"), "  ", options(2), 0, "");
        assert!(matches!(blank, Err(QuestionError::EmptyPrompt)));

        let single = Question::new(QuestionId::new("q"), TopicId::new("t"), "Q", options(1), 0, "");
        assert!(matches!(single, Err(QuestionError::TooFewOptions(1))));
    }

    #[test]
    fn parses_catalog_json_shape() {
        let json = r#"{
            "id": "q1",
            "topicId": "physics-mechanics",
            "question": "SI unit of force?",
            "options": ["Newton", "Joule", "Watt", "Pascal"],
            "answer": 0,
            "explanation": "F = ma"
        }"#;
        let q: Question = serde_json::from_str(json).unwrap();
        assert_eq!(q.topic_id().as_str(), "physics-mechanics");
        assert!(q.is_correct(0));
        assert_eq!(q.option(1), Some("Joule"));
    }

    #[test]
    fn invalid_catalog_json_is_rejected() {
        let json = r#"{"id":"q","topicId":"t","question":"Q","options":["a","b"],"answer":7}"#;
        assert!(serde_json::from_str::<Question>(json).is_err());
    }
}
