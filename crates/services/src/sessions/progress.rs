/// Aggregated view of a running quiz, useful for UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizProgress {
    pub total: usize,
    pub answered: usize,
    pub unanswered: usize,
    /// Zero-based index of the question on screen.
    pub current: usize,
    pub remaining_time: u32,
    pub is_complete: bool,
}
