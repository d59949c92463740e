//! Guided setup: one registered handler per onboarding stage.

use std::sync::Arc;

use practice_core::model::{OnboardingStage, User};

use crate::error::OnboardingError;
use crate::progress_service::ProgressStore;

/// Decides whether a profile satisfies one onboarding stage.
pub trait StageHandler: Send + Sync {
    fn stage(&self) -> OnboardingStage;

    /// Short instruction shown while the stage is open.
    fn prompt(&self) -> &'static str {
        self.stage().description()
    }

    /// # Errors
    ///
    /// Returns a human-readable reason when the profile is missing something
    /// this stage collects.
    fn check(&self, user: &User) -> Result<(), String>;
}

/// Welcome & Exam: a name and a target exam.
#[derive(Debug, Clone, Copy, Default)]
pub struct WelcomeHandler;

impl StageHandler for WelcomeHandler {
    fn stage(&self) -> OnboardingStage {
        OnboardingStage::Welcome
    }

    fn check(&self, user: &User) -> Result<(), String> {
        if user.name.trim().is_empty() {
            return Err("enter your name".into());
        }
        if user.target_exam.trim().is_empty() {
            return Err("choose a target exam".into());
        }
        Ok(())
    }
}

/// Subjects & Syllabus: at least one subject.
#[derive(Debug, Clone, Copy, Default)]
pub struct SubjectsHandler;

impl StageHandler for SubjectsHandler {
    fn stage(&self) -> OnboardingStage {
        OnboardingStage::Subjects
    }

    fn check(&self, user: &User) -> Result<(), String> {
        if user.subjects.iter().all(|s| s.trim().is_empty()) {
            return Err("select at least one subject".into());
        }
        Ok(())
    }
}

/// Stages whose inputs all have usable defaults.
#[derive(Debug, Clone, Copy)]
pub struct AcknowledgeHandler(pub OnboardingStage);

impl StageHandler for AcknowledgeHandler {
    fn stage(&self) -> OnboardingStage {
        self.0
    }

    fn check(&self, _user: &User) -> Result<(), String> {
        Ok(())
    }
}

/// The built-in handler for each stage.
#[must_use]
pub fn default_handler(stage: OnboardingStage) -> Box<dyn StageHandler> {
    match stage {
        OnboardingStage::Welcome => Box::new(WelcomeHandler),
        OnboardingStage::Subjects => Box::new(SubjectsHandler),
        OnboardingStage::BaselineQuiz
        | OnboardingStage::LearningStyle
        | OnboardingStage::Goals
        | OnboardingStage::Schedule
        | OnboardingStage::Review
        | OnboardingStage::Finish => Box::new(AcknowledgeHandler(stage)),
    }
}

/// Where the caller should go after a flow action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    GoToStep(OnboardingStage),
    Dashboard,
    SignIn,
    Stay,
}

/// The open stage, as shown to the learner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageView {
    pub stage: OnboardingStage,
    pub number: u8,
    pub total: usize,
    pub title: &'static str,
    pub prompt: &'static str,
    pub completed: bool,
}

pub struct OnboardingFlow {
    progress: Arc<ProgressStore>,
    handlers: [Box<dyn StageHandler>; OnboardingStage::COUNT],
}

impl OnboardingFlow {
    /// Builds a flow with one handler per stage from `handler_for`.
    #[must_use]
    pub fn new(
        progress: Arc<ProgressStore>,
        handler_for: impl Fn(OnboardingStage) -> Box<dyn StageHandler>,
    ) -> Self {
        Self {
            progress,
            handlers: OnboardingStage::ALL.map(handler_for),
        }
    }

    #[must_use]
    pub fn with_default_handlers(progress: Arc<ProgressStore>) -> Self {
        Self::new(progress, default_handler)
    }

    fn handler(&self, stage: OnboardingStage) -> &dyn StageHandler {
        self.handlers[stage.index()].as_ref()
    }

    #[must_use]
    pub fn current(&self) -> StageView {
        let state = self.progress.snapshot();
        let stage = state.current_stage();
        StageView {
            stage,
            number: stage.number(),
            total: OnboardingStage::COUNT,
            title: stage.title(),
            prompt: self.handler(stage).prompt(),
            completed: state.is_step_completed(stage),
        }
    }

    /// Completes the open stage if the profile satisfies it, then moves on.
    ///
    /// # Errors
    ///
    /// Returns `OnboardingError::Incomplete` when the stage's handler rejects
    /// the profile, or `Progress` if the change cannot be stored.
    pub async fn next(&self) -> Result<Navigation, OnboardingError> {
        let state = self.progress.snapshot();
        let Some(user) = state.user().filter(|_| state.is_authenticated()) else {
            return Ok(Navigation::SignIn);
        };
        let stage = state.current_stage();
        self.handler(stage)
            .check(user)
            .map_err(|reason| OnboardingError::Incomplete { stage, reason })?;

        self.progress
            .advance_onboarding(i64::from(stage.number()))
            .await?;
        let Some(next) = stage.next() else {
            tracing::info!("onboarding finished");
            return Ok(Navigation::Dashboard);
        };
        self.progress
            .set_onboarding_step(i64::from(next.number()))
            .await?;
        Ok(Navigation::GoToStep(next))
    }

    /// Moves back one stage. A no-op on the first stage.
    ///
    /// # Errors
    ///
    /// Returns `OnboardingError::Progress` if the change cannot be stored.
    pub async fn back(&self) -> Result<Navigation, OnboardingError> {
        let state = self.progress.snapshot();
        if !state.is_authenticated() {
            return Ok(Navigation::SignIn);
        }
        let Some(previous) = state.current_stage().previous() else {
            return Ok(Navigation::Stay);
        };
        self.progress
            .set_onboarding_step(i64::from(previous.number()))
            .await?;
        Ok(Navigation::GoToStep(previous))
    }
}

impl std::fmt::Debug for OnboardingFlow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnboardingFlow")
            .field("current", &self.current())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_stage_gets_its_own_handler() {
        for stage in OnboardingStage::ALL {
            assert_eq!(default_handler(stage).stage(), stage);
        }
    }

    #[test]
    fn welcome_requires_name_and_exam() {
        let mut user = User::new(
            practice_core::model::UserId::generate(),
            "Asha",
            "asha@example.com",
        )
        .unwrap();
        assert!(WelcomeHandler.check(&user).is_err());
        user.target_exam = "NEET".into();
        assert!(WelcomeHandler.check(&user).is_ok());
        assert!(SubjectsHandler.check(&user).is_err());
        user.subjects = vec!["Biology".into()];
        assert!(SubjectsHandler.check(&user).is_ok());
    }
}
