//! Experience awarded for finished activities.

/// Experience per quiz percentage point.
pub const QUIZ_XP_PER_PERCENT: u64 = 2;

/// Experience per reviewed flashcard.
pub const FLASHCARD_XP: u64 = 5;

#[must_use]
pub fn quiz_xp(score: u8) -> u64 {
    u64::from(score) * QUIZ_XP_PER_PERCENT
}

#[must_use]
pub fn flashcard_xp(reviewed: usize) -> u64 {
    u64::try_from(reviewed)
        .unwrap_or(u64::MAX)
        .saturating_mul(FLASHCARD_XP)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reward_constants() {
        assert_eq!(quiz_xp(60), 120);
        assert_eq!(quiz_xp(100), 200);
        assert_eq!(flashcard_xp(12), 60);
        assert_eq!(flashcard_xp(0), 0);
    }
}
