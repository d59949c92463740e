use async_trait::async_trait;
use practice_core::model::{Flashcard, Question, Topic, TopicId};
use practice_core::progress::ProgressState;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

use crate::catalog::InMemoryCatalog;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::Serialization(err.to_string())
    }
}

/// Repository contract for the named progress record.
#[async_trait]
pub trait ProgressRepository: Send + Sync {
    /// Fetch the record stored under `name`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read or the payload is malformed.
    async fn load_progress(&self, name: &str) -> Result<Option<ProgressState>, StorageError>;

    /// Overwrite the record stored under `name`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the state cannot be stored.
    async fn save_progress(&self, name: &str, state: &ProgressState) -> Result<(), StorageError>;
}

/// Read-only content source keyed by topic.
///
/// Unknown topics are not errors: they read as `None` or an empty list.
#[async_trait]
pub trait ContentCatalog: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError` if the backend fails.
    async fn topics(&self) -> Result<Vec<Topic>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` if the backend fails.
    async fn topic(&self, id: &TopicId) -> Result<Option<Topic>, StorageError>;

    /// Questions for `topic`, in catalog order.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend fails.
    async fn questions_for(&self, topic: &TopicId) -> Result<Vec<Question>, StorageError>;

    /// Flashcards for `topic`, in catalog order.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend fails.
    async fn flashcards_for(&self, topic: &TopicId) -> Result<Vec<Flashcard>, StorageError>;
}

/// In-memory progress repository for testing and prototyping.
///
/// Records are kept as JSON text so they go through the same serialization as
/// the persistent backends.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    records: Arc<Mutex<HashMap<String, String>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a raw payload, bypassing serialization. Useful for corrupt-record tests.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the lock is poisoned.
    pub fn put_raw(&self, name: &str, payload: impl Into<String>) -> Result<(), StorageError> {
        let mut guard = self
            .records
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(name.to_string(), payload.into());
        Ok(())
    }
}

#[async_trait]
impl ProgressRepository for InMemoryRepository {
    async fn load_progress(&self, name: &str) -> Result<Option<ProgressState>, StorageError> {
        let guard = self
            .records
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard
            .get(name)
            .map(|payload| serde_json::from_str(payload).map_err(StorageError::from))
            .transpose()
    }

    async fn save_progress(&self, name: &str, state: &ProgressState) -> Result<(), StorageError> {
        let payload = serde_json::to_string(state)?;
        let mut guard = self
            .records
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(name.to_string(), payload);
        Ok(())
    }
}

/// Aggregates repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub progress: Arc<dyn ProgressRepository>,
    pub catalog: Arc<dyn ContentCatalog>,
}

impl Storage {
    #[must_use]
    pub fn in_memory(catalog: InMemoryCatalog) -> Self {
        Self {
            progress: Arc::new(InMemoryRepository::new()),
            catalog: Arc::new(catalog),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use practice_core::model::{User, UserId};
    use practice_core::progress::PROGRESS_RECORD;

    #[tokio::test]
    async fn round_trips_progress_record() {
        let repo = InMemoryRepository::new();
        assert!(repo.load_progress(PROGRESS_RECORD).await.unwrap().is_none());

        let user = User::new(UserId::generate(), "Asha", "asha@example.com").unwrap();
        let state = ProgressState::default()
            .sign_in(user)
            .award_experience(1250)
            .unwrap();
        repo.save_progress(PROGRESS_RECORD, &state).await.unwrap();

        let loaded = repo.load_progress(PROGRESS_RECORD).await.unwrap().unwrap();
        assert_eq!(loaded, state);
        assert_eq!(loaded.game_stats().level(), 2);
    }

    #[tokio::test]
    async fn corrupt_payload_is_a_serialization_error() {
        let repo = InMemoryRepository::new();
        repo.put_raw(PROGRESS_RECORD, "{not json").unwrap();
        let err = repo.load_progress(PROGRESS_RECORD).await.unwrap_err();
        assert!(matches!(err, StorageError::Serialization(_)));
    }
}
