use serde::{Deserialize, Serialize};

use crate::model::ids::{FlashcardId, TopicId};

/// Front/back recall card belonging to a topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Flashcard {
    pub id: FlashcardId,
    pub topic_id: TopicId,
    pub front: String,
    pub back: String,
}

impl Flashcard {
    #[must_use]
    pub fn new(
        id: FlashcardId,
        topic_id: TopicId,
        front: impl Into<String>,
        back: impl Into<String>,
    ) -> Self {
        Self {
            id,
            topic_id,
            front: front.into(),
            back: back.into(),
        }
    }
}
