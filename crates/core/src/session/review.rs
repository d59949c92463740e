use serde::{Deserialize, Serialize};

use crate::model::Flashcard;

use super::SessionError;

/// Self-assessed recall for a flashcard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Recall {
    Easy,
    Hard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewCompletion {
    pub reviewed_count: usize,
    pub easy: usize,
    pub hard: usize,
}

/// Untimed pass through a flashcard deck.
///
/// Rating a card marks it reviewed and moves on; rating the last card completes
/// the review once.
#[derive(Debug, Clone)]
pub struct FlashcardReview {
    cards: Vec<Flashcard>,
    current: usize,
    flipped: bool,
    ratings: Vec<Option<Recall>>,
    completed: bool,
}

impl FlashcardReview {
    /// # Errors
    ///
    /// Returns `SessionError::Empty` if the deck has no cards.
    pub fn start(cards: Vec<Flashcard>) -> Result<Self, SessionError> {
        if cards.is_empty() {
            return Err(SessionError::Empty);
        }
        let ratings = vec![None; cards.len()];
        Ok(Self {
            cards,
            current: 0,
            flipped: false,
            ratings,
            completed: false,
        })
    }

    #[must_use]
    pub fn current_card(&self) -> &Flashcard {
        &self.cards[self.current]
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current
    }

    #[must_use]
    pub fn total_cards(&self) -> usize {
        self.cards.len()
    }

    #[must_use]
    pub fn is_flipped(&self) -> bool {
        self.flipped
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.completed
    }

    #[must_use]
    pub fn reviewed_count(&self) -> usize {
        self.ratings.iter().filter(|r| r.is_some()).count()
    }

    pub fn flip(&mut self) {
        self.flipped = !self.flipped;
    }

    pub fn previous(&mut self) {
        if self.current > 0 {
            self.current -= 1;
            self.flipped = false;
        }
    }

    /// Skips ahead without rating. Stops at the last card.
    pub fn next(&mut self) {
        if self.current + 1 < self.cards.len() {
            self.current += 1;
            self.flipped = false;
        }
    }

    /// Rates the current card and advances, completing after the last card.
    pub fn rate(&mut self, recall: Recall) -> Option<ReviewCompletion> {
        if self.completed {
            return None;
        }
        self.ratings[self.current] = Some(recall);
        if self.current + 1 < self.cards.len() {
            self.current += 1;
            self.flipped = false;
            return None;
        }

        self.completed = true;
        let count = |wanted: Recall| self.ratings.iter().filter(|r| **r == Some(wanted)).count();
        Some(ReviewCompletion {
            reviewed_count: self.reviewed_count(),
            easy: count(Recall::Easy),
            hard: count(Recall::Hard),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FlashcardId, TopicId};

    fn deck(n: usize) -> Vec<Flashcard> {
        (0..n)
            .map(|i| {
                Flashcard::new(
                    FlashcardId::new(format!("f{i}")),
                    TopicId::new("chem-bonding"),
                    format!("front {i}"),
                    format!("back {i}"),
                )
            })
            .collect()
    }

    #[test]
    fn empty_deck_is_refused() {
        assert_eq!(FlashcardReview::start(Vec::new()).unwrap_err(), SessionError::Empty);
    }

    #[test]
    fn rating_every_card_completes_once() {
        let mut review = FlashcardReview::start(deck(3)).unwrap();
        review.flip();
        assert!(review.is_flipped());
        assert!(review.rate(Recall::Easy).is_none());
        assert!(!review.is_flipped());
        assert!(review.rate(Recall::Hard).is_none());
        let done = review.rate(Recall::Easy).unwrap();
        assert_eq!(done.reviewed_count, 3);
        assert_eq!((done.easy, done.hard), (2, 1));
        assert!(review.rate(Recall::Easy).is_none());
    }

    #[test]
    fn skipped_cards_are_not_counted() {
        let mut review = FlashcardReview::start(deck(3)).unwrap();
        review.next();
        review.next();
        review.next();
        assert_eq!(review.current_index(), 2);
        let done = review.rate(Recall::Hard).unwrap();
        assert_eq!(done.reviewed_count, 1);
    }

    #[test]
    fn navigation_resets_flip() {
        let mut review = FlashcardReview::start(deck(2)).unwrap();
        review.next();
        review.flip();
        review.previous();
        assert_eq!(review.current_index(), 0);
        assert!(!review.is_flipped());
    }
}
