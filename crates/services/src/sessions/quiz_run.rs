use std::ops::ControlFlow;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use chrono::{DateTime, Utc};
use practice_core::Clock;
use practice_core::model::{Question, TopicId};
use practice_core::session::{QuizOutcome, QuizSession, SessionError};
use serde::{Deserialize, Serialize};

use super::progress::QuizProgress;
use crate::error::PracticeError;
use crate::timer::SessionTimer;

/// Completed quiz, stamped with wall-clock start and end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizReport {
    pub topic_id: TopicId,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub outcome: QuizOutcome,
}

type CompletionCallback = Box<dyn FnOnce(QuizReport) + Send>;

struct RunState {
    session: QuizSession,
    on_complete: Option<CompletionCallback>,
    report: Option<QuizReport>,
    cancelled: bool,
}

struct Shared {
    state: Mutex<RunState>,
    clock: Clock,
    topic_id: TopicId,
    started_at: DateTime<Utc>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, RunState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Records the outcome and hands the callback back so it runs outside the lock.
    fn settle(
        &self,
        state: &mut RunState,
        outcome: QuizOutcome,
    ) -> (QuizReport, Option<CompletionCallback>) {
        let report = QuizReport {
            topic_id: self.topic_id.clone(),
            started_at: self.started_at,
            completed_at: self.clock.now(),
            outcome,
        };
        tracing::info!(
            topic = %self.topic_id,
            score = report.outcome.score,
            reason = ?report.outcome.reason,
            elapsed = report.outcome.elapsed,
            "quiz completed"
        );
        state.report = Some(report.clone());
        (report, state.on_complete.take())
    }

    fn tick(&self) -> ControlFlow<()> {
        let mut state = self.lock();
        if state.cancelled || state.session.is_complete() {
            return ControlFlow::Break(());
        }
        let Some(outcome) = state.session.tick() else {
            return ControlFlow::Continue(());
        };
        let (report, callback) = self.settle(&mut state, outcome);
        drop(state);
        if let Some(callback) = callback {
            callback(report);
        }
        ControlFlow::Break(())
    }
}

/// A quiz session driven by a background countdown.
///
/// The completion callback runs exactly once: on the learner finishing, or on
/// the countdown reaching zero, whichever comes first. [`cancel`](Self::cancel)
/// and dropping the run tear the countdown down without completing.
pub struct QuizRun {
    shared: Arc<Shared>,
    timer: Option<SessionTimer>,
}

impl QuizRun {
    /// Starts a run over `questions` with `budget` units of `tick_period` each.
    ///
    /// A non-positive budget completes the run with `TimeExpired` before this
    /// returns, without needing a runtime.
    ///
    /// # Errors
    ///
    /// Returns `Session(Empty)` if `questions` is empty and `NoRuntime` if the
    /// countdown has to run but no tokio runtime is current.
    pub fn start<F>(
        topic_id: TopicId,
        questions: Vec<Question>,
        budget: i64,
        tick_period: Duration,
        clock: Clock,
        on_complete: F,
    ) -> Result<Self, PracticeError>
    where
        F: FnOnce(QuizReport) + Send + 'static,
    {
        let session = QuizSession::start(questions, budget)?;
        let shared = Arc::new(Shared {
            state: Mutex::new(RunState {
                session,
                on_complete: Some(Box::new(on_complete)),
                report: None,
                cancelled: false,
            }),
            clock,
            topic_id,
            started_at: clock.now(),
        });
        tracing::debug!(topic = %shared.topic_id, budget, "quiz started");

        let mut run = Self {
            shared,
            timer: None,
        };
        if run.complete_with(QuizSession::expire_if_due).is_some() {
            return Ok(run);
        }

        let weak: Weak<Shared> = Arc::downgrade(&run.shared);
        run.timer = Some(SessionTimer::spawn(tick_period, move || {
            weak.upgrade()
                .map_or(ControlFlow::Break(()), |shared| shared.tick())
        })?);
        Ok(run)
    }

    #[must_use]
    pub fn topic_id(&self) -> &TopicId {
        &self.shared.topic_id
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.shared.started_at
    }

    #[must_use]
    pub fn questions(&self) -> Vec<Question> {
        self.shared.lock().session.questions().to_vec()
    }

    #[must_use]
    pub fn current_question(&self) -> Question {
        self.shared.lock().session.current_question().clone()
    }

    #[must_use]
    pub fn remaining_time(&self) -> u32 {
        self.shared.lock().session.remaining_time()
    }

    #[must_use]
    pub fn is_last_question(&self) -> bool {
        self.shared.lock().session.is_last_question()
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.shared.lock().session.is_complete()
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.shared.lock().cancelled
    }

    #[must_use]
    pub fn report(&self) -> Option<QuizReport> {
        self.shared.lock().report.clone()
    }

    #[must_use]
    pub fn progress(&self) -> QuizProgress {
        let state = self.shared.lock();
        let session = &state.session;
        let answered = session.answers().answered_count();
        QuizProgress {
            total: session.total_questions(),
            answered,
            unanswered: session.total_questions() - answered,
            current: session.current_index(),
            remaining_time: session.remaining_time(),
            is_complete: session.is_complete(),
        }
    }

    /// Records `option` for the current question.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Completed` once the run is over, or
    /// `OptionOutOfRange` for an option the question does not have.
    pub fn select(&self, option: usize) -> Result<(), SessionError> {
        let mut state = self.shared.lock();
        if state.cancelled {
            return Err(SessionError::Completed);
        }
        state.session.select(option)
    }

    /// Records `option` for the question at `position`.
    ///
    /// # Errors
    ///
    /// Same as [`select`](Self::select), plus `PositionOutOfRange`.
    pub fn select_at(&self, position: usize, option: usize) -> Result<(), SessionError> {
        let mut state = self.shared.lock();
        if state.cancelled {
            return Err(SessionError::Completed);
        }
        state.session.select_at(position, option)
    }

    pub fn previous(&self) {
        let mut state = self.shared.lock();
        if !state.cancelled {
            state.session.previous();
        }
    }

    /// Moves to the next question; past the last one this completes the run.
    pub fn advance(&mut self) -> Option<QuizReport> {
        self.complete_with(QuizSession::advance)
    }

    /// Completes the run early with whatever has been answered.
    pub fn finish(&mut self) -> Option<QuizReport> {
        self.complete_with(QuizSession::finish)
    }

    /// Stops the countdown and discards the run without reporting a result.
    pub fn cancel(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.cancel();
        }
        let mut state = self.shared.lock();
        if !state.session.is_complete() && !state.cancelled {
            tracing::debug!(topic = %self.shared.topic_id, "quiz cancelled");
        }
        state.cancelled = true;
        state.on_complete = None;
    }

    fn complete_with(
        &mut self,
        step: impl FnOnce(&mut QuizSession) -> Option<QuizOutcome>,
    ) -> Option<QuizReport> {
        let mut state = self.shared.lock();
        if state.cancelled {
            return None;
        }
        let outcome = step(&mut state.session)?;
        let (report, callback) = self.shared.settle(&mut state, outcome);
        drop(state);
        if let Some(timer) = self.timer.take() {
            timer.cancel();
        }
        if let Some(callback) = callback {
            callback(report.clone());
        }
        Some(report)
    }
}

impl Drop for QuizRun {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl std::fmt::Debug for QuizRun {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuizRun")
            .field("topic_id", &self.shared.topic_id)
            .field("progress", &self.progress())
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
