//! Shared error types for the services crate.

use thiserror::Error;

use practice_core::model::{OnboardingStage, TopicId};
use practice_core::progress::ProgressError;
use practice_core::session::SessionError;
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Errors emitted by `ProgressStore` mutations. The stored state is unchanged
/// whenever one of these is returned.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProgressStoreError {
    #[error(transparent)]
    Rejected(#[from] ProgressError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by the practice workflow.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PracticeError {
    #[error("topic not found: {0}")]
    TopicNotFound(TopicId),
    #[error("quiz ended without reporting a result")]
    Abandoned,
    #[error("no async runtime is available to drive the countdown")]
    NoRuntime(#[from] tokio::runtime::TryCurrentError),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Progress(#[from] ProgressStoreError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by the onboarding flow.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum OnboardingError {
    #[error("{stage:?} is not finished: {reason}")]
    Incomplete {
        stage: OnboardingStage,
        reason: String,
    },
    #[error(transparent)]
    Progress(#[from] ProgressStoreError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}
