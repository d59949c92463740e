use serde::{Deserialize, Serialize};

use crate::model::Question;

use super::SessionError;
use super::answers::{AnswerSheet, Selection};
use super::countdown::{Countdown, Tick};
use super::scoring::{Mistake, extract_mistakes, score};

/// Minimum score reported as a pass.
pub const PASS_MARK: u8 = 70;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionStatus {
    InProgress,
    Completed,
}

/// Why a session completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompletionReason {
    /// The learner advanced past the last question or finished early.
    Finished,
    /// The countdown ran out.
    TimeExpired,
}

/// Score, answers and mistakes captured at the moment a session completes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizOutcome {
    pub score: u8,
    pub correct: usize,
    pub total: usize,
    pub answers: Vec<Selection>,
    pub mistakes: Vec<Mistake>,
    pub reason: CompletionReason,
    /// Time units consumed before completion.
    pub elapsed: u32,
}

impl QuizOutcome {
    #[must_use]
    pub fn passed(&self) -> bool {
        self.score >= PASS_MARK
    }
}

/// One timed attempt at an ordered question set.
///
/// `InProgress -> Completed` happens once, through [`advance`](Self::advance) past
/// the last question, [`finish`](Self::finish), or countdown expiry. Every method
/// that can complete the session returns the outcome only on that first transition.
#[derive(Debug, Clone)]
pub struct QuizSession {
    questions: Vec<Question>,
    answers: AnswerSheet,
    countdown: Countdown,
    current: usize,
    status: SessionStatus,
    outcome: Option<QuizOutcome>,
}

impl QuizSession {
    /// Starts a session over `questions` with `budget` time units.
    ///
    /// A zero or negative budget yields a session whose countdown is already
    /// expired; call [`expire_if_due`](Self::expire_if_due) to complete it.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Empty` if `questions` is empty.
    pub fn start(questions: Vec<Question>, budget: i64) -> Result<Self, SessionError> {
        if questions.is_empty() {
            return Err(SessionError::Empty);
        }
        let answers = AnswerSheet::new(questions.len());
        Ok(Self {
            questions,
            answers,
            countdown: Countdown::start(budget),
            current: 0,
            status: SessionStatus::InProgress,
            outcome: None,
        })
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn total_questions(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current
    }

    #[must_use]
    pub fn current_question(&self) -> &Question {
        &self.questions[self.current]
    }

    #[must_use]
    pub fn is_last_question(&self) -> bool {
        self.current + 1 == self.questions.len()
    }

    #[must_use]
    pub fn answers(&self) -> &AnswerSheet {
        &self.answers
    }

    #[must_use]
    pub fn remaining_time(&self) -> u32 {
        self.countdown.remaining()
    }

    #[must_use]
    pub fn status(&self) -> SessionStatus {
        self.status
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.status == SessionStatus::Completed
    }

    /// Outcome of a completed session.
    #[must_use]
    pub fn outcome(&self) -> Option<&QuizOutcome> {
        self.outcome.as_ref()
    }

    /// Records `option` for the current question.
    ///
    /// # Errors
    ///
    /// See [`select_at`](Self::select_at).
    pub fn select(&mut self, option: usize) -> Result<(), SessionError> {
        self.select_at(self.current, option)
    }

    /// Records `option` for the question at `position`, replacing any earlier choice.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Completed` once the session has completed,
    /// `PositionOutOfRange` for a position past the last question, and
    /// `OptionOutOfRange` for an option the question does not have.
    pub fn select_at(&mut self, position: usize, option: usize) -> Result<(), SessionError> {
        if self.is_complete() {
            return Err(SessionError::Completed);
        }
        let question = self
            .questions
            .get(position)
            .ok_or(SessionError::PositionOutOfRange {
                position,
                len: self.questions.len(),
            })?;
        let options = question.options().len();
        if option >= options {
            return Err(SessionError::OptionOutOfRange { option, options });
        }
        self.answers.select(position, option)
    }

    /// Moves back one question. No effect on the first question or after completion.
    pub fn previous(&mut self) {
        if !self.is_complete() && self.current > 0 {
            self.current -= 1;
        }
    }

    /// Moves to the next question, completing the session after the last one.
    pub fn advance(&mut self) -> Option<QuizOutcome> {
        if self.is_complete() {
            return None;
        }
        if self.is_last_question() {
            return self.complete(CompletionReason::Finished);
        }
        self.current += 1;
        None
    }

    /// Completes the session now, regardless of position.
    pub fn finish(&mut self) -> Option<QuizOutcome> {
        self.complete(CompletionReason::Finished)
    }

    /// Advances the countdown by one unit, completing the session on expiry.
    pub fn tick(&mut self) -> Option<QuizOutcome> {
        if self.is_complete() {
            return None;
        }
        match self.countdown.tick() {
            Tick::Expired => self.complete(CompletionReason::TimeExpired),
            Tick::Running { .. } | Tick::Stopped => None,
        }
    }

    /// Completes a session whose countdown expired without ticking (zero budget).
    pub fn expire_if_due(&mut self) -> Option<QuizOutcome> {
        if self.is_complete() {
            return None;
        }
        if self.countdown.take_expiry() {
            return self.complete(CompletionReason::TimeExpired);
        }
        None
    }

    fn complete(&mut self, reason: CompletionReason) -> Option<QuizOutcome> {
        if self.is_complete() {
            return None;
        }
        let s = score(&self.questions, &self.answers);
        let outcome = QuizOutcome {
            score: s.percent,
            correct: s.correct,
            total: s.total,
            answers: self.answers.selections().to_vec(),
            mistakes: extract_mistakes(&self.questions, &self.answers),
            reason,
            elapsed: self.countdown.elapsed(),
        };
        self.status = SessionStatus::Completed;
        self.outcome = Some(outcome.clone());
        Some(outcome)
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{QuestionId, TopicId};

    fn build_questions(n: usize) -> Vec<Question> {
        (0..n)
            .map(|i| {
                Question::new(
                    QuestionId::new(format!("q{i}")),
                    TopicId::new("physics-mechanics"),
                    format!("Q{i}"),
                    vec!["a".into(), "b".into(), "c".into()],
                    1,
                    "because",
                )
                .unwrap()
            })
            .collect()
    }

    #[test]
    fn empty_question_set_is_refused() {
        let err = QuizSession::start(Vec::new(), 300).unwrap_err();
        assert_eq!(err, SessionError::Empty);
    }

    #[test]
    fn reaching_the_end_scores_the_session() {
        let mut session = QuizSession::start(build_questions(5), 300).unwrap();
        for pos in 0..5 {
            if pos % 2 == 0 {
                session.select(1).unwrap();
            } else if pos == 1 {
                session.select(2).unwrap();
            }
            let outcome = session.advance();
            if pos < 4 {
                assert!(outcome.is_none());
            } else {
                let outcome = outcome.expect("completes after last question");
                assert_eq!(outcome.score, 60);
                assert_eq!(outcome.reason, CompletionReason::Finished);
                let ids: Vec<_> = outcome.mistakes.iter().map(|m| m.question_id.as_str()).collect();
                assert_eq!(ids, vec!["q1", "q3"]);
            }
        }
        assert!(session.is_complete());
    }

    #[test]
    fn reselecting_keeps_only_latest_answer() {
        let mut session = QuizSession::start(build_questions(1), 300).unwrap();
        session.select(0).unwrap();
        session.select(1).unwrap();
        let outcome = session.finish().unwrap();
        assert_eq!(outcome.score, 100);
        assert_eq!(outcome.answers, vec![Selection::Chosen(1)]);
    }

    #[test]
    fn expiry_completes_once_with_partial_answers() {
        let mut session = QuizSession::start(build_questions(3), 2).unwrap();
        session.select(1).unwrap();
        assert!(session.tick().is_none());
        let outcome = session.tick().expect("expires on second tick");
        assert_eq!(outcome.reason, CompletionReason::TimeExpired);
        assert_eq!(outcome.score, 33);
        assert_eq!(outcome.mistakes.len(), 2);
        assert_eq!(outcome.elapsed, 2);

        assert!(session.tick().is_none());
        assert!(session.advance().is_none());
        assert!(session.finish().is_none());
        assert_eq!(session.remaining_time(), 0);
    }

    #[test]
    fn zero_budget_completes_immediately() {
        let mut session = QuizSession::start(build_questions(2), 0).unwrap();
        assert!(!session.is_complete());
        let outcome = session.expire_if_due().expect("immediate expiry");
        assert_eq!(outcome.reason, CompletionReason::TimeExpired);
        assert!(outcome.answers.iter().all(|a| *a == Selection::Unanswered));
        assert!(session.expire_if_due().is_none());
    }

    #[test]
    fn positive_budget_is_not_due_at_start() {
        let mut session = QuizSession::start(build_questions(2), 10).unwrap();
        assert!(session.expire_if_due().is_none());
        assert_eq!(session.status(), SessionStatus::InProgress);
    }

    #[test]
    fn completed_session_rejects_selection() {
        let mut session = QuizSession::start(build_questions(1), 10).unwrap();
        session.finish().unwrap();
        assert_eq!(session.select(0), Err(SessionError::Completed));
        assert_eq!(session.outcome().unwrap().score, 0);
    }

    #[test]
    fn invalid_positions_and_options_are_rejected() {
        let mut session = QuizSession::start(build_questions(2), 10).unwrap();
        assert_eq!(
            session.select_at(2, 0),
            Err(SessionError::PositionOutOfRange { position: 2, len: 2 })
        );
        assert_eq!(
            session.select(3),
            Err(SessionError::OptionOutOfRange { option: 3, options: 3 })
        );
    }

    #[test]
    fn previous_stops_at_first_question() {
        let mut session = QuizSession::start(build_questions(3), 10).unwrap();
        session.previous();
        assert_eq!(session.current_index(), 0);
        session.advance();
        session.advance();
        assert!(session.is_last_question());
        session.previous();
        assert_eq!(session.current_index(), 1);
    }

    #[test]
    fn outcome_pass_mark() {
        let mut session = QuizSession::start(build_questions(10), 10).unwrap();
        for pos in 0..7 {
            session.select_at(pos, 1).unwrap();
        }
        assert!(session.finish().unwrap().passed());
    }
}
