//! Per-skill learner progress

use serde::{Deserialize, Serialize};

use super::{require_text, ValidationError};

/// Skills every learner starts with, all at 0%
pub const DEFAULT_SKILLS: [&str; 4] = ["Parking", "Highway Driving", "Night Driving", "Traffic Rules"];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SkillProgress {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub learner_id: Option<String>,
    pub skill: String,
    pub percentage: u8,
}

pub fn defaults() -> Vec<SkillProgress> {
    DEFAULT_SKILLS
        .iter()
        .map(|skill| SkillProgress {
            id: None,
            learner_id: None,
            skill: skill.to_string(),
            percentage: 0,
        })
        .collect()
}

/// Body of `POST /api/progress`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressUpdate {
    pub learner_id: String,
    pub skill: String,
    pub percentage: i64,
}

impl ProgressUpdate {
    pub fn validate(&self) -> Result<u8, ValidationError> {
        require_text("learner_id", &self.learner_id)?;
        require_text("skill", &self.skill)?;
        u8::try_from(self.percentage)
            .ok()
            .filter(|p| *p <= 100)
            .ok_or_else(|| ValidationError::new("percentage must be between 0 and 100"))
    }
}
