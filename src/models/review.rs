//! Lesson reviews

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{require_text, ValidationError};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Review {
    pub id: String,
    pub booking_id: Option<String>,
    pub instructor_id: String,
    pub learner_id: String,
    pub rating: u8,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A review with the learner's name, as listed on an instructor profile
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewView {
    #[serde(flatten)]
    pub review: Review,
    pub author_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewReview {
    #[serde(default)]
    pub booking_id: Option<String>,
    pub instructor_id: String,
    pub learner_id: String,
    pub rating: i64,
    #[serde(default)]
    pub comment: Option<String>,
}

impl NewReview {
    pub fn validate(&self) -> Result<u8, ValidationError> {
        require_text("instructor_id", &self.instructor_id)?;
        require_text("learner_id", &self.learner_id)?;
        match self.rating {
            1..=5 => Ok(self.rating as u8),
            _ => Err(ValidationError::new("rating must be between 1 and 5")),
        }
    }
}
