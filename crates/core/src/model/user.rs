use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::{TopicId, UserId};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum UserError {
    #[error("name cannot be empty")]
    EmptyName,

    #[error("invalid email address: {0}")]
    InvalidEmail(String),

    #[error("daily minutes must be > 0")]
    InvalidDailyMinutes,

    #[error("target score must be between 0 and 720, got {0}")]
    InvalidTargetScore(u32),

    #[error("confidence must be between 1 and 5, got {0}")]
    InvalidConfidence(u8),
}

/// Highest achievable exam score accepted as a target.
pub const MAX_TARGET_SCORE: u32 = 720;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LearningStyle {
    Video,
    Text,
    #[default]
    Mixed,
}

/// Learner profile collected across onboarding and the profile page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[allow(clippy::struct_excessive_bools)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub target_exam: String,
    #[serde(default)]
    pub exam_date: Option<NaiveDate>,
    #[serde(default)]
    pub subjects: Vec<String>,
    #[serde(default)]
    pub syllabus: Vec<String>,
    #[serde(default)]
    pub learning_style: LearningStyle,
    #[serde(default = "default_daily_minutes")]
    pub daily_minutes: u32,
    #[serde(default)]
    pub peak_time: String,
    #[serde(default, rename = "hasVR")]
    pub has_vr: bool,
    #[serde(default)]
    pub target_score: u32,
    #[serde(default)]
    pub weak_topics: Vec<TopicId>,
    #[serde(default)]
    pub confidence: BTreeMap<String, u8>,
    #[serde(default)]
    pub vr_enabled: bool,
    #[serde(default)]
    pub completed_onboarding: bool,
}

fn default_daily_minutes() -> u32 {
    60
}

impl User {
    /// Creates a fresh profile with onboarding defaults.
    ///
    /// # Errors
    ///
    /// Returns `UserError` if the name is blank or the email is malformed.
    pub fn new(id: UserId, name: impl Into<String>, email: impl Into<String>) -> Result<Self, UserError> {
        let name = normalize_name(name.into())?;
        let email = normalize_email(email.into())?;
        Ok(Self {
            id,
            name,
            email,
            target_exam: String::new(),
            exam_date: None,
            subjects: Vec::new(),
            syllabus: Vec::new(),
            learning_style: LearningStyle::default(),
            daily_minutes: default_daily_minutes(),
            peak_time: String::new(),
            has_vr: false,
            target_score: 0,
            weak_topics: Vec::new(),
            confidence: BTreeMap::new(),
            vr_enabled: false,
            completed_onboarding: false,
        })
    }

    /// Returns a copy of this profile with the provided fields replaced.
    ///
    /// Fields absent from the patch are untouched.
    ///
    /// # Errors
    ///
    /// Returns `UserError` if any provided field is invalid; nothing is applied then.
    pub fn merged(&self, patch: ProfilePatch) -> Result<Self, UserError> {
        let mut next = self.clone();
        if let Some(name) = patch.name {
            next.name = normalize_name(name)?;
        }
        if let Some(email) = patch.email {
            next.email = normalize_email(email)?;
        }
        if let Some(target_exam) = patch.target_exam {
            next.target_exam = target_exam.trim().to_string();
        }
        if let Some(exam_date) = patch.exam_date {
            next.exam_date = exam_date;
        }
        if let Some(subjects) = patch.subjects {
            next.subjects = subjects;
        }
        if let Some(syllabus) = patch.syllabus {
            next.syllabus = syllabus;
        }
        if let Some(style) = patch.learning_style {
            next.learning_style = style;
        }
        if let Some(minutes) = patch.daily_minutes {
            if minutes == 0 {
                return Err(UserError::InvalidDailyMinutes);
            }
            next.daily_minutes = minutes;
        }
        if let Some(peak_time) = patch.peak_time {
            next.peak_time = peak_time;
        }
        if let Some(has_vr) = patch.has_vr {
            next.has_vr = has_vr;
        }
        if let Some(score) = patch.target_score {
            if score > MAX_TARGET_SCORE {
                return Err(UserError::InvalidTargetScore(score));
            }
            next.target_score = score;
        }
        if let Some(weak_topics) = patch.weak_topics {
            next.weak_topics = weak_topics;
        }
        if let Some(confidence) = patch.confidence {
            if let Some(bad) = confidence.values().copied().find(|v| !(1..=5).contains(v)) {
                return Err(UserError::InvalidConfidence(bad));
            }
            next.confidence = confidence;
        }
        if let Some(vr_enabled) = patch.vr_enabled {
            next.vr_enabled = vr_enabled;
        }
        if let Some(done) = patch.completed_onboarding {
            next.completed_onboarding = done;
        }
        Ok(next)
    }
}

/// Partial profile update; `None` leaves the stored field as is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfilePatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub target_exam: Option<String>,
    pub exam_date: Option<Option<NaiveDate>>,
    pub subjects: Option<Vec<String>>,
    pub syllabus: Option<Vec<String>>,
    pub learning_style: Option<LearningStyle>,
    pub daily_minutes: Option<u32>,
    pub peak_time: Option<String>,
    pub has_vr: Option<bool>,
    pub target_score: Option<u32>,
    pub weak_topics: Option<Vec<TopicId>>,
    pub confidence: Option<BTreeMap<String, u8>>,
    pub vr_enabled: Option<bool>,
    pub completed_onboarding: Option<bool>,
}

impl ProfilePatch {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

fn normalize_name(raw: String) -> Result<String, UserError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(UserError::EmptyName);
    }
    Ok(name.to_string())
}

fn normalize_email(raw: String) -> Result<String, UserError> {
    let email = raw.trim();
    let valid = email
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));
    if !valid {
        return Err(UserError::InvalidEmail(raw));
    }
    Ok(email.to_string())
}
