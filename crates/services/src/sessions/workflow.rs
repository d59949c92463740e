use std::sync::Arc;
use std::time::Duration;

use practice_core::Clock;
use practice_core::model::{GameStats, Question, Topic, TopicId};
use practice_core::session::{FlashcardReview, ReviewCompletion};
use rand::rng;
use rand::seq::SliceRandom;
use storage::repository::ContentCatalog;
use tokio::sync::oneshot;

use super::quiz_run::{QuizReport, QuizRun};
use crate::config::PracticeConfig;
use crate::error::PracticeError;
use crate::progress_service::ProgressStore;
use crate::rewards::{flashcard_xp, quiz_xp};

/// A running quiz plus the channel its single completion is delivered on.
#[derive(Debug)]
pub struct StartedQuiz {
    pub run: QuizRun,
    pub completion: oneshot::Receiver<QuizReport>,
}

impl StartedQuiz {
    /// Waits for the run to complete, by learner action or by countdown expiry.
    ///
    /// # Errors
    ///
    /// Returns `PracticeError::Abandoned` if the run was cancelled first.
    pub async fn completed(self) -> Result<(QuizRun, QuizReport), PracticeError> {
        let StartedQuiz { run, completion } = self;
        let report = completion.await.map_err(|_| PracticeError::Abandoned)?;
        Ok((run, report))
    }
}

/// Experience and stats after a quiz was credited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizReward {
    pub xp_awarded: u64,
    pub study_minutes: u32,
    pub passed: bool,
    pub leveled_up: bool,
    pub stats: GameStats,
}

/// Experience and stats after a flashcard review was credited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlashcardReward {
    pub xp_awarded: u64,
    pub study_minutes: u32,
    pub leveled_up: bool,
    pub stats: GameStats,
}

/// Starts quizzes and flashcard reviews from the catalog and credits their results.
#[derive(Clone)]
pub struct PracticeService {
    clock: Clock,
    config: PracticeConfig,
    catalog: Arc<dyn ContentCatalog>,
    progress: Arc<ProgressStore>,
}

impl PracticeService {
    #[must_use]
    pub fn new(
        clock: Clock,
        catalog: Arc<dyn ContentCatalog>,
        progress: Arc<ProgressStore>,
    ) -> Self {
        Self {
            clock,
            config: PracticeConfig::default(),
            catalog,
            progress,
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: PracticeConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn config(&self) -> &PracticeConfig {
        &self.config
    }

    /// # Errors
    ///
    /// Returns `PracticeError::Storage` if the catalog cannot be read.
    pub async fn topics(&self) -> Result<Vec<Topic>, PracticeError> {
        Ok(self.catalog.topics().await?)
    }

    /// # Errors
    ///
    /// Returns `PracticeError::TopicNotFound` for an unknown topic.
    pub async fn topic(&self, id: &TopicId) -> Result<Topic, PracticeError> {
        self.catalog
            .topic(id)
            .await?
            .ok_or_else(|| PracticeError::TopicNotFound(id.clone()))
    }

    /// Start a timed quiz over the topic's questions.
    ///
    /// # Errors
    ///
    /// Returns `TopicNotFound` for an unknown topic and `Session(Empty)` when
    /// the topic has no questions.
    pub async fn start_quiz(&self, topic_id: &TopicId) -> Result<StartedQuiz, PracticeError> {
        let topic = self.topic(topic_id).await?;
        let mut questions = self.catalog.questions_for(&topic.id).await?;
        if self.config.shuffle_questions() {
            let mut rng = rng();
            questions.as_mut_slice().shuffle(&mut rng);
        }
        let budget = self.config.budget_for(questions.len());
        self.launch(topic.id, questions, budget)
    }

    /// Start a timed quiz over an explicit question set using the default budget.
    ///
    /// # Errors
    ///
    /// Returns `Session(Empty)` when `questions` is empty.
    pub fn start_custom_quiz(
        &self,
        topic_id: TopicId,
        questions: Vec<Question>,
    ) -> Result<StartedQuiz, PracticeError> {
        let budget = i64::from(self.config.default_budget());
        self.launch(topic_id, questions, budget)
    }

    fn launch(
        &self,
        topic_id: TopicId,
        questions: Vec<Question>,
        budget: i64,
    ) -> Result<StartedQuiz, PracticeError> {
        let (tx, completion) = oneshot::channel();
        let run = QuizRun::start(
            topic_id,
            questions,
            budget,
            self.config.tick_period(),
            self.clock,
            move |report| {
                // Receiver may already be gone if the caller stopped listening.
                let _ = tx.send(report);
            },
        )?;
        Ok(StartedQuiz { run, completion })
    }

    /// Credit a completed quiz: experience, quiz totals and study time, stored
    /// as one change.
    ///
    /// # Errors
    ///
    /// Returns `PracticeError::Progress` if the progress record cannot be
    /// updated. Nothing is credited in that case.
    pub async fn complete_quiz(&self, report: &QuizReport) -> Result<QuizReward, PracticeError> {
        let outcome = &report.outcome;
        let xp = quiz_xp(outcome.score);
        let study_minutes = minutes(self.config.tick_period() * outcome.elapsed);
        let credit = self
            .progress
            .credit_activity(xp, Some(outcome.score), study_minutes)
            .await?;
        tracing::info!(
            topic = %report.topic_id,
            score = outcome.score,
            xp,
            level = credit.stats.level(),
            "quiz credited"
        );
        Ok(QuizReward {
            xp_awarded: xp,
            study_minutes,
            passed: outcome.passed(),
            leveled_up: credit.leveled_up(),
            stats: credit.stats,
        })
    }

    /// Start a flashcard review over the topic's deck.
    ///
    /// # Errors
    ///
    /// Returns `TopicNotFound` for an unknown topic and `Session(Empty)` when
    /// the topic has no flashcards.
    pub async fn start_flashcards(
        &self,
        topic_id: &TopicId,
    ) -> Result<FlashcardReview, PracticeError> {
        let topic = self.topic(topic_id).await?;
        let cards = self.catalog.flashcards_for(&topic.id).await?;
        let review = FlashcardReview::start(cards)?;
        tracing::debug!(topic = %topic.id, cards = review.total_cards(), "flashcards started");
        Ok(review)
    }

    /// Credit a finished flashcard review that took `studied` wall-clock time.
    ///
    /// # Errors
    ///
    /// Returns `PracticeError::Progress` if the progress record cannot be updated.
    pub async fn complete_flashcards(
        &self,
        completion: &ReviewCompletion,
        studied: Duration,
    ) -> Result<FlashcardReward, PracticeError> {
        let xp = flashcard_xp(completion.reviewed_count);
        let study_minutes = minutes(studied);
        let credit = self
            .progress
            .credit_activity(xp, None, study_minutes)
            .await?;
        tracing::info!(
            reviewed = completion.reviewed_count,
            easy = completion.easy,
            hard = completion.hard,
            xp,
            "flashcards credited"
        );
        Ok(FlashcardReward {
            xp_awarded: xp,
            study_minutes,
            leveled_up: credit.leveled_up(),
            stats: credit.stats,
        })
    }
}

/// Whole minutes, rounded up.
fn minutes(studied: Duration) -> u32 {
    u32::try_from(studied.as_secs().div_ceil(60)).unwrap_or(u32::MAX)
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use practice_core::session::{Recall, SessionError};
    use practice_core::time::fixed_now;
    use storage::catalog::InMemoryCatalog;
    use storage::repository::InMemoryRepository;

    const CATALOG: &str = r#"{
        "topics": [
            {"id": "phy-motion", "name": "Motion", "subject": "Physics", "difficulty": "easy"},
            {"id": "chem-empty", "name": "Empty", "subject": "Chemistry", "difficulty": "hard"}
        ],
        "questions": [
            {"id": "m1", "topicId": "phy-motion", "question": "Unit of force?", "options": ["N", "J", "W"], "answer": 0, "explanation": ""},
            {"id": "m2", "topicId": "phy-motion", "question": "Unit of work?", "options": ["N", "J", "W"], "answer": 1, "explanation": ""}
        ],
        "flashcards": [
            {"id": "f1", "topicId": "phy-motion", "front": "v = ?", "back": "d / t"},
            {"id": "f2", "topicId": "phy-motion", "front": "a = ?", "back": "dv / dt"}
        ]
    }"#;

    async fn service() -> PracticeService {
        let catalog = InMemoryCatalog::from_json(CATALOG).unwrap();
        let progress = ProgressStore::load(Arc::new(InMemoryRepository::new())).await;
        PracticeService::new(Clock::fixed(fixed_now()), Arc::new(catalog), Arc::new(progress))
    }

    #[tokio::test]
    async fn unknown_and_empty_topics_are_rejected() {
        let svc = service().await;
        let err = svc.start_quiz(&TopicId::new("nope")).await.unwrap_err();
        assert!(matches!(err, PracticeError::TopicNotFound(_)));

        let err = svc.start_quiz(&TopicId::new("chem-empty")).await.unwrap_err();
        assert!(matches!(err, PracticeError::Session(SessionError::Empty)));

        let err = svc
            .start_flashcards(&TopicId::new("chem-empty"))
            .await
            .unwrap_err();
        assert!(matches!(err, PracticeError::Session(SessionError::Empty)));
    }

    #[tokio::test(start_paused = true)]
    async fn finished_quiz_is_credited() {
        let svc = service().await;
        let mut started = svc.start_quiz(&TopicId::new("phy-motion")).await.unwrap();
        started.run.select(0).unwrap();
        started.run.advance();
        started.run.select(2).unwrap();
        started.run.advance().unwrap();

        let (_run, report) = started.completed().await.unwrap();
        assert_eq!(report.outcome.score, 50);

        let reward = svc.complete_quiz(&report).await.unwrap();
        assert_eq!(reward.xp_awarded, 100);
        assert!(!reward.passed);
        assert_eq!(reward.stats.total_quizzes(), 1);
        assert_eq!(reward.stats.accuracy(), 50);
        assert_eq!(reward.study_minutes, 0);
    }

    #[test]
    fn custom_quiz_outside_a_runtime_is_an_error() {
        let svc = tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap()
            .block_on(service());
        let question = Question::new(
            practice_core::model::QuestionId::new("x1"),
            TopicId::new("adhoc"),
            "1 + 1?",
            vec!["2".into(), "3".into()],
            0,
            "",
        )
        .unwrap();

        let err = svc
            .start_custom_quiz(TopicId::new("adhoc"), vec![question])
            .unwrap_err();
        assert!(matches!(err, PracticeError::NoRuntime(_)));
    }

    #[tokio::test]
    async fn flashcard_review_awards_per_card() {
        let svc = service().await;
        let mut review = svc
            .start_flashcards(&TopicId::new("phy-motion"))
            .await
            .unwrap();
        assert!(review.rate(Recall::Easy).is_none());
        let completion = review.rate(Recall::Hard).unwrap();

        let reward = svc
            .complete_flashcards(&completion, Duration::from_secs(70))
            .await
            .unwrap();
        assert_eq!(reward.xp_awarded, 10);
        assert_eq!(reward.study_minutes, 2);
        assert_eq!(reward.stats.xp(), 10);
        assert_eq!(reward.stats.total_study_time(), 2);
        assert!(!reward.leveled_up);
    }
}
