use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("onboarding step {0} is outside 1..={max}", max = OnboardingStage::COUNT)]
pub struct StageOutOfRange(pub i64);

/// The fixed onboarding sequence, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OnboardingStage {
    Welcome,
    Subjects,
    BaselineQuiz,
    LearningStyle,
    Goals,
    Schedule,
    Review,
    Finish,
}

impl OnboardingStage {
    pub const COUNT: usize = 8;

    pub const ALL: [OnboardingStage; Self::COUNT] = [
        Self::Welcome,
        Self::Subjects,
        Self::BaselineQuiz,
        Self::LearningStyle,
        Self::Goals,
        Self::Schedule,
        Self::Review,
        Self::Finish,
    ];

    pub const FIRST: OnboardingStage = Self::Welcome;
    pub const LAST: OnboardingStage = Self::Finish;

    /// Converts a 1-based step number into a stage.
    ///
    /// # Errors
    ///
    /// Returns `StageOutOfRange` if `step` is not in `1..=8`.
    pub fn from_number(step: i64) -> Result<Self, StageOutOfRange> {
        usize::try_from(step)
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|idx| Self::ALL.get(idx).copied())
            .ok_or(StageOutOfRange(step))
    }

    /// 1-based step number.
    #[must_use]
    pub fn number(self) -> u8 {
        self as u8 + 1
    }

    #[must_use]
    pub fn index(self) -> usize {
        self as usize
    }

    #[must_use]
    pub fn next(self) -> Option<Self> {
        Self::ALL.get(self.index() + 1).copied()
    }

    #[must_use]
    pub fn previous(self) -> Option<Self> {
        self.index().checked_sub(1).map(|idx| Self::ALL[idx])
    }

    #[must_use]
    pub fn is_last(self) -> bool {
        self == Self::LAST
    }

    #[must_use]
    pub fn title(self) -> &'static str {
        match self {
            Self::Welcome => "Welcome & Exam",
            Self::Subjects => "Subjects & Syllabus",
            Self::BaselineQuiz => "Baseline Quiz",
            Self::LearningStyle => "Learning Style",
            Self::Goals => "Goals & Confidence",
            Self::Schedule => "Schedule Generator",
            Self::Review => "Review & Confirm",
            Self::Finish => "Finish",
        }
    }

    #[must_use]
    pub fn description(self) -> &'static str {
        match self {
            Self::Welcome => "Basic info and target exam",
            Self::Subjects => "Choose subjects and units",
            Self::BaselineQuiz => "Quick assessment",
            Self::LearningStyle => "Preferences and constraints",
            Self::Goals => "Target score and weak areas",
            Self::Schedule => "Create study plan",
            Self::Review => "Final review",
            Self::Finish => "Welcome to your journey!",
        }
    }
}

/// Persisted completion flag for one stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OnboardingStep {
    pub id: u8,
    pub title: String,
    pub description: String,
    pub completed: bool,
}

impl OnboardingStep {
    #[must_use]
    pub fn pending(stage: OnboardingStage) -> Self {
        Self {
            id: stage.number(),
            title: stage.title().to_string(),
            description: stage.description().to_string(),
            completed: false,
        }
    }

    /// All stages, none completed.
    #[must_use]
    pub fn initial() -> Vec<Self> {
        OnboardingStage::ALL.iter().copied().map(Self::pending).collect()
    }
}
