use serde::{Deserialize, Serialize};

use crate::model::ids::TopicId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Subject {
    Physics,
    Chemistry,
    Biology,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

/// A unit of study that owns a question set and a flashcard deck.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Topic {
    pub id: TopicId,
    pub name: String,
    pub subject: Subject,
    pub difficulty: Difficulty,
    #[serde(default)]
    pub units: Vec<String>,
    #[serde(default)]
    pub video_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn topic_parses_lowercase_difficulty() {
        let json = r#"{"id":"bio-cell","name":"Cell","subject":"Biology","difficulty":"medium","units":["Organelles"]}"#;
        let topic: Topic = serde_json::from_str(json).unwrap();
        assert_eq!(topic.subject, Subject::Biology);
        assert_eq!(topic.difficulty, Difficulty::Medium);
        assert!(topic.video_id.is_none());
    }
}
