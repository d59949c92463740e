use serde::{Deserialize, Serialize};

use crate::model::{Question, QuestionId, TopicId};

use super::answers::{AnswerSheet, Selection};

/// Percentage score for a set of answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Score {
    pub correct: usize,
    pub total: usize,
    pub percent: u8,
}

/// A question answered wrongly or left unanswered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Mistake {
    pub question_id: QuestionId,
    pub selected: Selection,
    pub correct: usize,
    /// Topic the question belongs to, for weak-area review.
    pub concept: TopicId,
}

/// Computes `round(100 * correct / total)`.
///
/// Unanswered positions never count as correct. `questions` must not be empty;
/// sessions refuse to start without questions.
#[must_use]
pub fn score(questions: &[Question], answers: &AnswerSheet) -> Score {
    debug_assert!(!questions.is_empty(), "score requires at least one question");
    let total = questions.len();
    let correct = questions
        .iter()
        .enumerate()
        .filter(|(pos, q)| answers.get(*pos).option() == Some(q.correct()))
        .count();

    let percent = if total == 0 {
        0
    } else {
        // Round half up, matching the usual percentage display.
        let p = (200 * correct + total) / (2 * total);
        u8::try_from(p).unwrap_or(100)
    };

    Score {
        correct,
        total,
        percent,
    }
}

/// Lists every question whose selection differs from the correct option, in question order.
#[must_use]
pub fn extract_mistakes(questions: &[Question], answers: &AnswerSheet) -> Vec<Mistake> {
    questions
        .iter()
        .enumerate()
        .filter_map(|(pos, q)| {
            let selected = answers.get(pos);
            if selected.option() == Some(q.correct()) {
                return None;
            }
            Some(Mistake {
                question_id: q.id().clone(),
                selected,
                correct: q.correct(),
                concept: q.topic_id().clone(),
            })
        })
        .collect()
}
