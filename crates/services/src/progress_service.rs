use std::sync::{Arc, PoisonError, RwLock};

use practice_core::model::{GameStats, ProfilePatch, StatsPatch, User};
use practice_core::progress::{PROGRESS_RECORD, ProgressError, ProgressState, Route};
use storage::repository::ProgressRepository;
use tokio::sync::Mutex;

use crate::error::ProgressStoreError;

/// Stats before and after one credited activity, read under the same write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityCredit {
    pub level_before: u32,
    pub stats: GameStats,
}

impl ActivityCredit {
    #[must_use]
    pub fn leveled_up(&self) -> bool {
        self.stats.level() > self.level_before
    }
}

/// Owner of the learner's persisted progress.
///
/// Reads return a consistent snapshot. Each mutation computes the next state,
/// persists it, and only then publishes it, so readers never observe a change
/// that was not stored. Mutations are serialized.
pub struct ProgressStore {
    record: String,
    repo: Arc<dyn ProgressRepository>,
    state: RwLock<ProgressState>,
    writer: Mutex<()>,
}

impl ProgressStore {
    /// Load the default record, falling back to logged-out defaults if it is
    /// missing or unreadable.
    pub async fn load(repo: Arc<dyn ProgressRepository>) -> Self {
        Self::load_named(repo, PROGRESS_RECORD).await
    }

    pub async fn load_named(repo: Arc<dyn ProgressRepository>, record: &str) -> Self {
        let state = match repo.load_progress(record).await {
            Ok(Some(state)) => state.normalized(),
            Ok(None) => {
                tracing::debug!(record, "no stored progress, starting fresh");
                ProgressState::default()
            }
            Err(err) => {
                tracing::warn!(record, error = %err, "failed to read progress, starting fresh");
                ProgressState::default()
            }
        };
        Self {
            record: record.to_string(),
            repo,
            state: RwLock::new(state),
            writer: Mutex::new(()),
        }
    }

    /// Current state.
    #[must_use]
    pub fn snapshot(&self) -> ProgressState {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    #[must_use]
    pub fn game_stats(&self) -> GameStats {
        self.snapshot().game_stats().clone()
    }

    #[must_use]
    pub fn landing_route(&self) -> Route {
        self.snapshot().landing_route()
    }

    /// Store `user` and mark the learner authenticated.
    ///
    /// # Errors
    ///
    /// Returns `ProgressStoreError::Storage` if the state cannot be persisted.
    pub async fn sign_in(&self, user: User) -> Result<ProgressState, ProgressStoreError> {
        self.apply("sign_in", |s| Ok(s.sign_in(user))).await
    }

    /// Merge `patch` into the stored profile.
    ///
    /// # Errors
    ///
    /// Returns `ProgressStoreError::Rejected` if there is no profile or a field is invalid.
    pub async fn update_profile(
        &self,
        patch: ProfilePatch,
    ) -> Result<ProgressState, ProgressStoreError> {
        self.apply("update_profile", |s| s.update_profile(patch)).await
    }

    /// Add experience and recompute the level.
    ///
    /// # Errors
    ///
    /// Returns `ProgressStoreError::Rejected` for a negative amount.
    pub async fn award_experience(&self, amount: i64) -> Result<GameStats, ProgressStoreError> {
        let state = self
            .apply("award_experience", |s| s.award_experience(amount))
            .await?;
        Ok(state.game_stats().clone())
    }

    /// Credit a finished activity as one stored change: experience, the quiz
    /// score if any, and study minutes. Nothing is kept if the save fails.
    ///
    /// # Errors
    ///
    /// Returns `ProgressStoreError::Storage` if the state cannot be persisted.
    pub async fn credit_activity(
        &self,
        xp: u64,
        quiz_score: Option<u8>,
        study_minutes: u32,
    ) -> Result<ActivityCredit, ProgressStoreError> {
        let (previous, next) = self
            .transition("credit_activity", |s| {
                Ok(s.credit_activity(xp, quiz_score, study_minutes))
            })
            .await?;
        Ok(ActivityCredit {
            level_before: previous.game_stats().level(),
            stats: next.game_stats().clone(),
        })
    }

    /// # Errors
    ///
    /// Returns `ProgressStoreError::Storage` if the state cannot be persisted.
    pub async fn update_stats(&self, patch: StatsPatch) -> Result<GameStats, ProgressStoreError> {
        let state = self.apply("update_stats", |s| Ok(s.update_stats(patch))).await?;
        Ok(state.game_stats().clone())
    }

    /// Mark onboarding `step` complete.
    ///
    /// # Errors
    ///
    /// Returns `ProgressStoreError::Rejected` if `step` is out of range or not reached yet.
    pub async fn advance_onboarding(&self, step: i64) -> Result<ProgressState, ProgressStoreError> {
        self.apply("advance_onboarding", |s| s.complete_onboarding_step(step))
            .await
    }

    /// Move the onboarding pointer to `step`.
    ///
    /// # Errors
    ///
    /// Returns `ProgressStoreError::Rejected` if `step` is out of range or not reached yet.
    pub async fn set_onboarding_step(
        &self,
        step: i64,
    ) -> Result<ProgressState, ProgressStoreError> {
        self.apply("set_onboarding_step", |s| s.set_onboarding_step(step))
            .await
    }

    /// Log out: restore every field to its default.
    ///
    /// # Errors
    ///
    /// Returns `ProgressStoreError::Storage` if the state cannot be persisted.
    pub async fn reset_session(&self) -> Result<ProgressState, ProgressStoreError> {
        self.apply("reset_session", |s| Ok(s.reset())).await
    }

    async fn apply<F>(&self, op: &'static str, f: F) -> Result<ProgressState, ProgressStoreError>
    where
        F: FnOnce(&ProgressState) -> Result<ProgressState, ProgressError>,
    {
        Ok(self.transition(op, f).await?.1)
    }

    /// Returns the state the change was computed from and the published result.
    async fn transition<F>(
        &self,
        op: &'static str,
        f: F,
    ) -> Result<(ProgressState, ProgressState), ProgressStoreError>
    where
        F: FnOnce(&ProgressState) -> Result<ProgressState, ProgressError>,
    {
        let _write = self.writer.lock().await;
        let current = self.snapshot();
        let next = f(&current).inspect_err(|err| {
            tracing::debug!(op, error = %err, "progress update rejected");
        })?;
        if next == current {
            return Ok((current, next));
        }

        self.repo.save_progress(&self.record, &next).await?;
        *self.state.write().unwrap_or_else(PoisonError::into_inner) = next.clone();
        tracing::info!(
            op,
            xp = next.game_stats().xp(),
            level = next.game_stats().level(),
            step = next.onboarding_step(),
            "progress updated"
        );
        Ok((current, next))
    }
}

impl std::fmt::Debug for ProgressStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressStore")
            .field("record", &self.record)
            .field("state", &self.snapshot())
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
