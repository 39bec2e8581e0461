//! Logged chat-assistant exchanges

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{require_text, ValidationError};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PromptLog {
    pub id: String,
    pub user_id: Option<String>,
    pub command: String,
    pub response: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPrompt {
    #[serde(default)]
    pub user_id: Option<String>,
    pub command: String,
    pub response: String,
}

impl NewPrompt {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("command", &self.command)?;
        require_text("response", &self.response)
    }
}
