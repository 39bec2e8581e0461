//! OpenAI-compatible chat completion client
//!
//! Gemini exposes the same `/chat/completions` shape under its `openai`
//! compatibility path, so one client covers both.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

use super::ChatBackend;
use crate::config::AssistantConfig;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: "system".into(), content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: "user".into(), content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: "assistant".into(), content: content.into() }
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    max_tokens: u32,
}

/// Chat client bound to one endpoint, key and model
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    endpoint: Url,
    api_key: String,
    model: String,
    max_tokens: u32,
}

impl LlmClient {
    pub fn new(config: &AssistantConfig, api_key: String) -> Result<Self> {
        Ok(Self {
            client: Client::new(),
            endpoint: chat_endpoint(&config.base_url)?,
            api_key,
            model: config.model.clone(),
            max_tokens: config.max_tokens,
        })
    }
}

/// `{base_url}/chat/completions`, keeping any path already in the base
pub(crate) fn chat_endpoint(base_url: &str) -> Result<Url> {
    let mut base = Url::parse(base_url)
        .with_context(|| format!("Invalid assistant base URL: {}", base_url))?;
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base.join("chat/completions").context("Failed to build chat endpoint")
}

/// Text of the first choice. Content may be a string or a list of parts.
pub(crate) fn extract_content(raw: &Value) -> Result<String> {
    let content = raw
        .get("choices")
        .and_then(|c| c.as_array())
        .and_then(|arr| arr.first())
        .and_then(|choice| choice.get("message"))
        .and_then(|msg| msg.get("content"));

    let text = match content {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Array(parts)) => parts
            .iter()
            .filter(|part| part.get("type").and_then(|t| t.as_str()) == Some("text"))
            .filter_map(|part| part.get("text").and_then(|t| t.as_str()))
            .collect::<Vec<_>>()
            .join(""),
        _ => bail!("Response has no message content"),
    };

    if text.trim().is_empty() {
        bail!("Empty response from chat model");
    }
    Ok(text)
}

#[async_trait]
impl ChatBackend for LlmClient {
    async fn complete(&self, messages: Vec<ChatMessage>) -> Result<String> {
        let request = ChatRequest {
            model: &self.model,
            messages: &messages,
            max_tokens: self.max_tokens,
        };

        let response = self
            .client
            .post(self.endpoint.clone())
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .context("Failed to send request to chat provider")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            bail!("Chat API error ({}): {}", status, body);
        }

        let raw: Value = response.json().await.context("Failed to parse chat response")?;
        extract_content(&raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_endpoint_keeps_base_path() {
        let url = chat_endpoint("https://generativelanguage.googleapis.com/v1beta/openai").unwrap();
        assert_eq!(
            url.as_str(),
            "https://generativelanguage.googleapis.com/v1beta/openai/chat/completions"
        );

        let url = chat_endpoint("http://localhost:8080/v1/").unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/v1/chat/completions");
    }

    #[test]
    fn test_invalid_base_url_rejected() {
        assert!(chat_endpoint("not a url").is_err());
    }

    #[test]
    fn test_extracts_string_and_part_content() {
        let plain = json!({"choices": [{"message": {"role": "assistant", "content": "Keep left."}}]});
        assert_eq!(extract_content(&plain).unwrap(), "Keep left.");

        let parts = json!({"choices": [{"message": {"content": [
            {"type": "text", "text": "Give way "},
            {"type": "image_url", "image_url": {"url": "x"}},
            {"type": "text", "text": "to the right."}
        ]}}]});
        assert_eq!(extract_content(&parts).unwrap(), "Give way to the right.");
    }

    #[test]
    fn test_missing_or_empty_content_is_error() {
        assert!(extract_content(&json!({"choices": []})).is_err());
        assert!(extract_content(&json!({"choices": [{"message": {"content": "  "}}]})).is_err());
        assert!(extract_content(&json!({"error": {"message": "quota"}})).is_err());
    }
}
