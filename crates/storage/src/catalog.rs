use async_trait::async_trait;
use practice_core::model::{Flashcard, Question, Topic, TopicId};
use serde::{Deserialize, Serialize};

use crate::repository::{ContentCatalog, StorageError};

/// Serialized catalog: `{ topics: [...], questions: [...], flashcards: [...] }`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogDocument {
    #[serde(default)]
    pub topics: Vec<Topic>,
    #[serde(default)]
    pub questions: Vec<Question>,
    #[serde(default)]
    pub flashcards: Vec<Flashcard>,
}

/// Catalog held entirely in memory, preserving document order.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    doc: CatalogDocument,
}

impl InMemoryCatalog {
    #[must_use]
    pub fn new(doc: CatalogDocument) -> Self {
        Self { doc }
    }

    /// Parse a JSON catalog document. Questions are validated while parsing.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Serialization` if the document is malformed.
    pub fn from_json(json: &str) -> Result<Self, StorageError> {
        let doc: CatalogDocument = serde_json::from_str(json)?;
        Ok(Self::new(doc))
    }

    #[must_use]
    pub fn document(&self) -> &CatalogDocument {
        &self.doc
    }
}

#[async_trait]
impl ContentCatalog for InMemoryCatalog {
    async fn topics(&self) -> Result<Vec<Topic>, StorageError> {
        Ok(self.doc.topics.clone())
    }

    async fn topic(&self, id: &TopicId) -> Result<Option<Topic>, StorageError> {
        Ok(self.doc.topics.iter().find(|t| &t.id == id).cloned())
    }

    async fn questions_for(&self, topic: &TopicId) -> Result<Vec<Question>, StorageError> {
        Ok(self
            .doc
            .questions
            .iter()
            .filter(|q| q.topic_id() == topic)
            .cloned()
            .collect())
    }

    async fn flashcards_for(&self, topic: &TopicId) -> Result<Vec<Flashcard>, StorageError> {
        Ok(self
            .doc
            .flashcards
            .iter()
            .filter(|f| &f.topic_id == topic)
            .cloned()
            .collect())
    }
}
