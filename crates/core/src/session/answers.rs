use serde::{Deserialize, Serialize};

use super::SessionError;

/// The learner's choice for one question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(tag = "kind", content = "option", rename_all = "camelCase")]
pub enum Selection {
    #[default]
    Unanswered,
    Chosen(usize),
}

impl Selection {
    #[must_use]
    pub fn option(self) -> Option<usize> {
        match self {
            Selection::Unanswered => None,
            Selection::Chosen(option) => Some(option),
        }
    }

    #[must_use]
    pub fn is_answered(self) -> bool {
        matches!(self, Selection::Chosen(_))
    }
}

/// Sparse record of the latest selection per question position.
///
/// Re-selecting overwrites; no history is kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerSheet {
    slots: Vec<Selection>,
}

impl AnswerSheet {
    #[must_use]
    pub fn new(len: usize) -> Self {
        Self {
            slots: vec![Selection::Unanswered; len],
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Stores `option` at `position`, replacing any earlier choice.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::PositionOutOfRange` if `position` is past the end.
    pub fn select(&mut self, position: usize, option: usize) -> Result<(), SessionError> {
        let len = self.slots.len();
        let slot = self
            .slots
            .get_mut(position)
            .ok_or(SessionError::PositionOutOfRange { position, len })?;
        *slot = Selection::Chosen(option);
        Ok(())
    }

    /// Returns the selection at `position`; positions past the end read as unanswered.
    #[must_use]
    pub fn get(&self, position: usize) -> Selection {
        self.slots.get(position).copied().unwrap_or_default()
    }

    #[must_use]
    pub fn answered_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_answered()).count()
    }

    #[must_use]
    pub fn selections(&self) -> &[Selection] {
        &self.slots
    }
}
