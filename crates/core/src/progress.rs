//! Persisted learner progress and its pure state transitions.
//!
//! Every transition takes the current state by reference and returns the next
//! state, or a `ProgressError` with the current state left as it was.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{
    GameStats, OnboardingStage, OnboardingStep, ProfilePatch, StageOutOfRange, StatsPatch, User,
    UserError,
};

/// Name of the single persisted progress record.
pub const PROGRESS_RECORD: &str = "practice-progress";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ProgressError {
    #[error("experience award must be >= 0, got {0}")]
    NegativeExperience(i64),

    #[error(transparent)]
    StageOutOfRange(#[from] StageOutOfRange),

    #[error("onboarding step {step} has not been reached (furthest reachable is {reachable})")]
    StepNotReached { step: u8, reachable: u8 },

    #[error("no profile is stored")]
    NoProfile,

    #[error(transparent)]
    InvalidProfile(#[from] UserError),
}

/// Where a learner should land given their stored progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    SignIn,
    Onboarding(OnboardingStage),
    Dashboard,
}

/// The persisted record: `{ user, onboardingStep, onboardingSteps, gameStats, isAuthenticated }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressState {
    user: Option<User>,
    onboarding_step: u8,
    onboarding_steps: Vec<OnboardingStep>,
    game_stats: GameStats,
    is_authenticated: bool,
}

impl Default for ProgressState {
    fn default() -> Self {
        Self {
            user: None,
            onboarding_step: OnboardingStage::FIRST.number(),
            onboarding_steps: OnboardingStep::initial(),
            game_stats: GameStats::default(),
            is_authenticated: false,
        }
    }
}

impl ProgressState {
    #[must_use]
    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.is_authenticated
    }

    #[must_use]
    pub fn game_stats(&self) -> &GameStats {
        &self.game_stats
    }

    #[must_use]
    pub fn onboarding_steps(&self) -> &[OnboardingStep] {
        &self.onboarding_steps
    }

    /// 1-based pointer to the onboarding step currently shown.
    #[must_use]
    pub fn onboarding_step(&self) -> u8 {
        self.onboarding_step
    }

    #[must_use]
    pub fn current_stage(&self) -> OnboardingStage {
        OnboardingStage::from_number(i64::from(self.onboarding_step))
            .unwrap_or(OnboardingStage::FIRST)
    }

    #[must_use]
    pub fn is_step_completed(&self, stage: OnboardingStage) -> bool {
        self.onboarding_steps
            .get(stage.index())
            .is_some_and(|s| s.completed)
    }

    /// Furthest step the learner may stand on or complete: one past the
    /// completed prefix, or the current pointer if that is further.
    #[must_use]
    pub fn reachable_step(&self) -> u8 {
        let prefix = self
            .onboarding_steps
            .iter()
            .take_while(|s| s.completed)
            .count();
        let limit = u8::try_from((prefix + 1).min(OnboardingStage::COUNT)).unwrap_or(u8::MAX);
        limit.max(self.onboarding_step)
    }

    #[must_use]
    pub fn landing_route(&self) -> Route {
        match &self.user {
            _ if !self.is_authenticated => Route::SignIn,
            Some(user) if user.completed_onboarding => Route::Dashboard,
            _ => Route::Onboarding(self.current_stage()),
        }
    }

    /// Stores `user` and marks the learner as authenticated.
    #[must_use]
    pub fn sign_in(&self, user: User) -> Self {
        Self {
            user: Some(user),
            is_authenticated: true,
            ..self.clone()
        }
    }

    /// Merges `patch` into the stored profile.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::NoProfile` when no profile exists, or
    /// `InvalidProfile` when a provided field fails validation.
    pub fn update_profile(&self, patch: ProfilePatch) -> Result<Self, ProgressError> {
        let user = self.user.as_ref().ok_or(ProgressError::NoProfile)?;
        let merged = user.merged(patch)?;
        Ok(Self {
            user: Some(merged),
            ..self.clone()
        })
    }

    /// Adds experience and recomputes the level.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::NegativeExperience` if `amount < 0`.
    pub fn award_experience(&self, amount: i64) -> Result<Self, ProgressError> {
        let amount = u64::try_from(amount).map_err(|_| ProgressError::NegativeExperience(amount))?;
        let mut next = self.clone();
        next.game_stats.add_xp(amount);
        Ok(next)
    }

    /// Credits one finished activity in a single step: experience, the quiz
    /// score when there is one, and study minutes.
    #[must_use]
    pub fn credit_activity(&self, xp: u64, quiz_score: Option<u8>, study_minutes: u32) -> Self {
        let mut next = self.clone();
        next.game_stats.add_xp(xp);
        if let Some(score) = quiz_score {
            next.game_stats.record_quiz(score);
        }
        next.game_stats.add_study_time(study_minutes);
        next
    }

    #[must_use]
    pub fn update_stats(&self, patch: StatsPatch) -> Self {
        let mut next = self.clone();
        next.game_stats.apply(patch);
        next
    }

    /// Marks `step` complete. Completing the last step also flags the profile
    /// as onboarded.
    ///
    /// # Errors
    ///
    /// Returns `StageOutOfRange` for steps outside `1..=8` and `StepNotReached`
    /// for steps past [`reachable_step`](Self::reachable_step).
    pub fn complete_onboarding_step(&self, step: i64) -> Result<Self, ProgressError> {
        let stage = self.reachable_stage(step)?;
        let mut next = self.clone();
        if let Some(entry) = next.onboarding_steps.get_mut(stage.index()) {
            entry.completed = true;
        }
        if stage.is_last() {
            if let Some(user) = next.user.as_mut() {
                user.completed_onboarding = true;
            }
        }
        Ok(next)
    }

    /// Moves the pointer to `step` without completing anything.
    ///
    /// Backward moves are always allowed; forward moves only up to the reachable step.
    ///
    /// # Errors
    ///
    /// Same as [`complete_onboarding_step`](Self::complete_onboarding_step).
    pub fn set_onboarding_step(&self, step: i64) -> Result<Self, ProgressError> {
        let stage = self.reachable_stage(step)?;
        Ok(Self {
            onboarding_step: stage.number(),
            ..self.clone()
        })
    }

    /// Logged-out, zero-progress defaults.
    #[must_use]
    pub fn reset(&self) -> Self {
        Self::default()
    }

    /// Repairs a record read from storage: level is recomputed from experience,
    /// the step list is rebuilt to the fixed stage set, and the pointer is
    /// clamped into range.
    #[must_use]
    pub fn normalized(self) -> Self {
        let steps = OnboardingStage::ALL
            .iter()
            .map(|stage| {
                let completed = self
                    .onboarding_steps
                    .iter()
                    .any(|s| s.id == stage.number() && s.completed);
                OnboardingStep {
                    completed,
                    ..OnboardingStep::pending(*stage)
                }
            })
            .collect();
        let max = OnboardingStage::LAST.number();
        Self {
            onboarding_step: self.onboarding_step.clamp(1, max),
            onboarding_steps: steps,
            game_stats: self.game_stats.normalized(),
            ..self
        }
    }

    fn reachable_stage(&self, step: i64) -> Result<OnboardingStage, ProgressError> {
        let stage = OnboardingStage::from_number(step)?;
        let reachable = self.reachable_step();
        if stage.number() > reachable {
            return Err(ProgressError::StepNotReached {
                step: stage.number(),
                reachable,
            });
        }
        Ok(stage)
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::UserId;

    fn signed_in() -> ProgressState {
        let user = User::new(UserId::generate(), "Asha", "asha@example.com").unwrap();
        ProgressState::default().sign_in(user)
    }

    #[test]
    fn experience_awards_recompute_level() {
        let state = ProgressState::default();
        let state = state.award_experience(850).unwrap();
        assert_eq!(state.game_stats().xp(), 850);
        assert_eq!(state.game_stats().level(), 1);
        let state = state.award_experience(200).unwrap();
        assert_eq!(state.game_stats().xp(), 1050);
        assert_eq!(state.game_stats().level(), 2);
        let state = state.award_experience(950).unwrap();
        assert_eq!(state.game_stats().xp(), 2000);
        assert_eq!(state.game_stats().level(), 3);
    }

    #[test]
    fn activity_credit_updates_every_counter_together() {
        let state = ProgressState::default().award_experience(900).unwrap();
        let state = state.credit_activity(120, Some(60), 3);
        let stats = state.game_stats();
        assert_eq!(stats.xp(), 1020);
        assert_eq!(stats.level(), 2);
        assert_eq!(stats.total_quizzes(), 1);
        assert_eq!(stats.accuracy(), 60);
        assert_eq!(stats.total_study_time(), 3);

        let state = state.credit_activity(10, None, 0);
        assert_eq!(state.game_stats().xp(), 1030);
        assert_eq!(state.game_stats().total_quizzes(), 1);
    }

    #[test]
    fn negative_experience_is_rejected() {
        let state = ProgressState::default().award_experience(10).unwrap();
        assert_eq!(
            state.award_experience(-1).unwrap_err(),
            ProgressError::NegativeExperience(-1)
        );
        assert_eq!(state.game_stats().xp(), 10);
    }

    #[test]
    fn zero_award_is_a_no_op() {
        let state = ProgressState::default().award_experience(0).unwrap();
        assert_eq!(state, ProgressState::default());
    }

    #[test]
    fn steps_cannot_be_completed_before_reached() {
        let state = signed_in();
        assert_eq!(state.reachable_step(), 1);
        let err = state.complete_onboarding_step(3).unwrap_err();
        assert_eq!(err, ProgressError::StepNotReached { step: 3, reachable: 1 });

        let state = state.complete_onboarding_step(1).unwrap();
        assert_eq!(state.reachable_step(), 2);
        let state = state.set_onboarding_step(2).unwrap();
        assert_eq!(state.current_stage(), OnboardingStage::Subjects);
        assert!(state.set_onboarding_step(3).is_err());
    }

    #[test]
    fn out_of_range_steps_are_rejected() {
        let state = signed_in();
        assert!(matches!(
            state.set_onboarding_step(0),
            Err(ProgressError::StageOutOfRange(StageOutOfRange(0)))
        ));
        assert!(matches!(
            state.complete_onboarding_step(9),
            Err(ProgressError::StageOutOfRange(_))
        ));
    }

    #[test]
    fn back_navigation_keeps_reach() {
        let mut state = signed_in();
        for step in 1..=3 {
            state = state.complete_onboarding_step(step).unwrap();
            state = state.set_onboarding_step(step + 1).unwrap();
        }
        let back = state.set_onboarding_step(1).unwrap();
        assert_eq!(back.onboarding_step(), 1);
        assert_eq!(back.reachable_step(), 4);
        assert!(back.set_onboarding_step(4).is_ok());
    }

    #[test]
    fn completing_last_step_marks_profile_onboarded() {
        let mut state = signed_in();
        assert_eq!(state.landing_route(), Route::Onboarding(OnboardingStage::Welcome));
        for step in 1..=8 {
            state = state.complete_onboarding_step(step).unwrap();
            if step < 8 {
                state = state.set_onboarding_step(step + 1).unwrap();
            }
        }
        assert!(state.user().unwrap().completed_onboarding);
        assert_eq!(state.landing_route(), Route::Dashboard);
    }

    #[test]
    fn profile_update_requires_profile() {
        let err = ProgressState::default()
            .update_profile(ProfilePatch::new())
            .unwrap_err();
        assert_eq!(err, ProgressError::NoProfile);

        let patch = ProfilePatch {
            target_exam: Some("NEET".into()),
            ..ProfilePatch::default()
        };
        let state = signed_in().update_profile(patch).unwrap();
        assert_eq!(state.user().unwrap().target_exam, "NEET");
        assert_eq!(state.user().unwrap().name, "Asha");
    }

    #[test]
    fn reset_restores_defaults() {
        let state = signed_in()
            .award_experience(4321)
            .unwrap()
            .update_stats(StatsPatch {
                streak: Some(7),
                ..StatsPatch::default()
            })
            .complete_onboarding_step(1)
            .unwrap()
            .credit_activity(0, Some(80), 5);

        let reset = state.reset();
        assert!(!reset.is_authenticated());
        assert!(reset.user().is_none());
        assert_eq!(reset.game_stats().xp(), 0);
        assert_eq!(reset.game_stats().level(), 1);
        assert_eq!(reset.game_stats().streak(), 0);
        assert_eq!(reset.onboarding_step(), 1);
        assert!(reset.onboarding_steps().iter().all(|s| !s.completed));
        assert_eq!(reset.landing_route(), Route::SignIn);
    }

    #[test]
    fn persisted_layout_uses_camel_case_keys() {
        let json = serde_json::to_value(signed_in()).unwrap();
        for key in ["user", "onboardingStep", "onboardingSteps", "gameStats", "isAuthenticated"] {
            assert!(json.get(key).is_some(), "missing {key}");
        }
    }

    #[test]
    fn normalized_repairs_untrusted_records() {
        let json = r#"{
            "user": null,
            "onboardingStep": 42,
            "onboardingSteps": [{"id": 1, "title": "x", "description": "y", "completed": true}],
            "gameStats": {"xp": 1500, "level": 9, "streak": 1, "badges": [], "totalQuizzes": 2, "totalStudyTime": 0, "accuracy": 50},
            "isAuthenticated": false
        }"#;
        let state: ProgressState = serde_json::from_str(json).unwrap();
        let state = state.normalized();
        assert_eq!(state.onboarding_step(), 8);
        assert_eq!(state.onboarding_steps().len(), 8);
        assert!(state.is_step_completed(OnboardingStage::Welcome));
        assert_eq!(state.onboarding_steps()[0].title, "Welcome & Exam");
        assert_eq!(state.game_stats().level(), 2);
    }
}
