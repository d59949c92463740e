use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Experience needed per level.
pub const XP_PER_LEVEL: u64 = 1000;

/// Level reached at `xp` experience: `floor(xp / 1000) + 1`.
#[must_use]
pub fn level_for_xp(xp: u64) -> u32 {
    u32::try_from(xp / XP_PER_LEVEL)
        .unwrap_or(u32::MAX - 1)
        .saturating_add(1)
}

/// Gamification counters for a learner.
///
/// `level` is derived from `xp` and is only ever recomputed, never set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameStats {
    xp: u64,
    level: u32,
    streak: u32,
    badges: BTreeSet<String>,
    total_quizzes: u32,
    /// Minutes spent in study sessions.
    total_study_time: u32,
    /// Running mean of quiz scores, in percent.
    accuracy: u8,
}

impl Default for GameStats {
    fn default() -> Self {
        Self {
            xp: 0,
            level: 1,
            streak: 0,
            badges: BTreeSet::new(),
            total_quizzes: 0,
            total_study_time: 0,
            accuracy: 0,
        }
    }
}

impl GameStats {
    #[must_use]
    pub fn xp(&self) -> u64 {
        self.xp
    }

    #[must_use]
    pub fn level(&self) -> u32 {
        self.level
    }

    #[must_use]
    pub fn streak(&self) -> u32 {
        self.streak
    }

    #[must_use]
    pub fn badges(&self) -> &BTreeSet<String> {
        &self.badges
    }

    #[must_use]
    pub fn total_quizzes(&self) -> u32 {
        self.total_quizzes
    }

    #[must_use]
    pub fn total_study_time(&self) -> u32 {
        self.total_study_time
    }

    #[must_use]
    pub fn accuracy(&self) -> u8 {
        self.accuracy
    }

    /// Experience still missing before the next level.
    #[must_use]
    pub fn xp_to_next_level(&self) -> u64 {
        XP_PER_LEVEL - self.xp % XP_PER_LEVEL
    }

    /// Adds experience and recomputes the level.
    pub fn add_xp(&mut self, amount: u64) {
        self.xp = self.xp.saturating_add(amount);
        self.level = level_for_xp(self.xp);
    }

    /// Counts one finished quiz and folds `score` into the running accuracy.
    pub fn record_quiz(&mut self, score: u8) {
        let previous = u64::from(self.total_quizzes);
        self.total_quizzes = self.total_quizzes.saturating_add(1);
        let count = u64::from(self.total_quizzes);
        let sum = u64::from(self.accuracy) * previous + u64::from(score.min(100));
        // Round half up.
        let mean = (2 * sum + count) / (2 * count);
        self.accuracy = u8::try_from(mean.min(100)).unwrap_or(100);
    }

    pub fn add_study_time(&mut self, minutes: u32) {
        self.total_study_time = self.total_study_time.saturating_add(minutes);
    }

    /// Applies a partial update. Experience and level are not part of the patch.
    pub fn apply(&mut self, patch: StatsPatch) {
        if let Some(streak) = patch.streak {
            self.streak = streak;
        }
        self.badges.extend(patch.add_badges);
        if let Some(minutes) = patch.total_study_time {
            self.total_study_time = minutes;
        }
    }

    /// Restores the derived level after loading from an untrusted record.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        self.level = level_for_xp(self.xp);
        self.accuracy = self.accuracy.min(100);
        self
    }
}

/// Partial stats update; absent fields are untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatsPatch {
    pub streak: Option<u32>,
    pub add_badges: Vec<String>,
    pub total_study_time: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_boundaries() {
        assert_eq!(level_for_xp(0), 1);
        assert_eq!(level_for_xp(999), 1);
        assert_eq!(level_for_xp(1000), 2);
        assert_eq!(level_for_xp(2000), 3);
        assert_eq!(level_for_xp(2999), 3);
    }

    #[test]
    fn add_xp_keeps_level_in_sync() {
        let mut stats = GameStats::default();
        stats.add_xp(850);
        assert_eq!((stats.xp(), stats.level()), (850, 1));
        assert_eq!(stats.xp_to_next_level(), 150);
        stats.add_xp(200);
        assert_eq!((stats.xp(), stats.level()), (1050, 2));
    }

    #[test]
    fn accuracy_is_running_mean() {
        let mut stats = GameStats::default();
        stats.record_quiz(60);
        assert_eq!(stats.accuracy(), 60);
        stats.record_quiz(100);
        assert_eq!(stats.accuracy(), 80);
        stats.record_quiz(75);
        // (80 * 2 + 75) / 3 = 78.33
        assert_eq!(stats.accuracy(), 78);
        assert_eq!(stats.total_quizzes(), 3);
    }

    #[test]
    fn patch_does_not_touch_xp() {
        let mut stats = GameStats::default();
        stats.add_xp(1200);
        stats.apply(StatsPatch {
            streak: Some(4),
            add_badges: vec!["first-quiz".into()],
            total_study_time: None,
        });
        assert_eq!(stats.xp(), 1200);
        assert_eq!(stats.level(), 2);
        assert_eq!(stats.streak(), 4);
        assert!(stats.badges().contains("first-quiz"));
    }

    #[test]
    fn normalized_recomputes_level() {
        let json = r#"{"xp":3500,"level":1,"streak":0,"badges":[],"totalQuizzes":0,"totalStudyTime":0,"accuracy":0}"#;
        let stats: GameStats = serde_json::from_str(json).unwrap();
        assert_eq!(stats.normalized().level(), 4);
    }
}
