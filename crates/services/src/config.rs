use std::time::Duration;

use practice_core::session::DEFAULT_TIME_BUDGET;

/// Timing and ordering knobs for practice sessions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PracticeConfig {
    default_budget: u32,
    seconds_per_question: u32,
    tick_period: Duration,
    shuffle_questions: bool,
}

impl Default for PracticeConfig {
    fn default() -> Self {
        Self {
            default_budget: DEFAULT_TIME_BUDGET,
            seconds_per_question: 90,
            tick_period: Duration::from_secs(1),
            shuffle_questions: false,
        }
    }
}

impl PracticeConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Budget used for ad-hoc question sets.
    #[must_use]
    pub fn with_default_budget(mut self, units: u32) -> Self {
        self.default_budget = units;
        self
    }

    /// Per-question allowance for topic quizzes. Zero disables the per-question
    /// budget and falls back to the default budget.
    #[must_use]
    pub fn with_seconds_per_question(mut self, units: u32) -> Self {
        self.seconds_per_question = units;
        self
    }

    /// Wall-clock length of one time unit. Clamped to at least one millisecond.
    #[must_use]
    pub fn with_tick_period(mut self, period: Duration) -> Self {
        self.tick_period = period.max(Duration::from_millis(1));
        self
    }

    #[must_use]
    pub fn with_shuffle_questions(mut self, shuffle: bool) -> Self {
        self.shuffle_questions = shuffle;
        self
    }

    #[must_use]
    pub fn default_budget(&self) -> u32 {
        self.default_budget
    }

    #[must_use]
    pub fn tick_period(&self) -> Duration {
        self.tick_period
    }

    #[must_use]
    pub fn shuffle_questions(&self) -> bool {
        self.shuffle_questions
    }

    /// Time budget for a topic quiz of `questions` items.
    #[must_use]
    pub fn budget_for(&self, questions: usize) -> i64 {
        if self.seconds_per_question == 0 {
            return i64::from(self.default_budget);
        }
        i64::try_from(questions)
            .unwrap_or(i64::MAX)
            .saturating_mul(i64::from(self.seconds_per_question))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn topic_budget_scales_with_question_count() {
        let config = PracticeConfig::default();
        assert_eq!(config.budget_for(5), 450);
        let fixed = config.with_seconds_per_question(0).with_default_budget(120);
        assert_eq!(fixed.budget_for(5), 120);
    }

    #[test]
    fn tick_period_is_never_zero() {
        let config = PracticeConfig::default().with_tick_period(Duration::ZERO);
        assert_eq!(config.tick_period(), Duration::from_millis(1));
    }
}
