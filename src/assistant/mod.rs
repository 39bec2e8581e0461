//! Driving-lesson chat assistant
//!
//! Each turn sends the fixed system prompt, the client's history and the new
//! message to the chat backend. Callers always get a reply: a missing key or
//! an upstream failure produce a fixed apology.

pub mod llm;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::warn;

use crate::config::AssistantConfig;
use llm::{ChatMessage, LlmClient};

pub const SYSTEM_PROMPT: &str = "You are 'EzBot', a helpful assistant for the EzLicence Explorer web \
application. Your goal is to help users find driving instructors, understand booking packages, and \
answer general questions about road rules (specifically Australian/general road safety). Be concise, \
friendly, and encourage safety. If asked about specific instructor availability, simulate a helpful \
response but clarify you don't have real-time live access.";

pub const NO_KEY_REPLY: &str =
    "I'm sorry, I can't connect to the AI service right now. Please check the API key configuration.";

pub const FAILURE_REPLY: &str = "I'm having trouble thinking right now. Please try again later.";

/// Who said a line of chat history
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    User,
    Model,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HistoryTurn {
    pub role: Speaker,
    pub text: String,
}

/// Something that can complete a chat conversation
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn complete(&self, messages: Vec<ChatMessage>) -> Result<String>;
}

#[derive(Clone)]
pub struct Assistant {
    backend: Option<Arc<dyn ChatBackend>>,
}

impl Assistant {
    /// Build from config; the assistant is disabled without an API key
    pub fn from_config(config: &AssistantConfig) -> Self {
        let Some(api_key) = config.api_key.clone() else {
            warn!("Assistant API key is missing, chat replies are disabled");
            return Self::disabled();
        };
        match LlmClient::new(config, api_key) {
            Ok(client) => Self::with_backend(Arc::new(client)),
            Err(e) => {
                warn!("Assistant disabled: {:#}", e);
                Self::disabled()
            }
        }
    }

    pub fn with_backend(backend: Arc<dyn ChatBackend>) -> Self {
        Self { backend: Some(backend) }
    }

    pub fn disabled() -> Self {
        Self { backend: None }
    }

    pub fn is_configured(&self) -> bool {
        self.backend.is_some()
    }

    /// Conversation as sent upstream: system prompt, history, new message
    pub fn build_messages(history: &[HistoryTurn], message: &str) -> Vec<ChatMessage> {
        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(ChatMessage::system(SYSTEM_PROMPT));
        messages.extend(history.iter().map(|turn| match turn.role {
            Speaker::User => ChatMessage::user(&turn.text),
            Speaker::Model => ChatMessage::assistant(&turn.text),
        }));
        messages.push(ChatMessage::user(message));
        messages
    }

    pub async fn reply(&self, history: &[HistoryTurn], message: &str) -> String {
        let Some(backend) = &self.backend else {
            return NO_KEY_REPLY.to_string();
        };

        match backend.complete(Self::build_messages(history, message)).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!("Chat backend error: {:#}", e);
                FAILURE_REPLY.to_string()
            }
        }
    }
}
