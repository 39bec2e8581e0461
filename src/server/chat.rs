//! Chat assistant and prompt logging

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};

use crate::assistant::HistoryTurn;
use crate::error::{ApiJson, ApiResult};
use crate::models::{require_text, NewPrompt};
use crate::server::ServerState;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub history: Vec<HistoryTurn>,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub reply: String,
}

pub async fn chat_handler(
    State(state): State<ServerState>,
    ApiJson(req): ApiJson<ChatRequest>,
) -> ApiResult<Json<ChatResponse>> {
    require_text("message", &req.message)?;
    let reply = state.assistant.reply(&req.history, &req.message).await;
    Ok(Json(ChatResponse { reply }))
}

pub async fn log_prompt(
    State(state): State<ServerState>,
    ApiJson(prompt): ApiJson<NewPrompt>,
) -> ApiResult<(StatusCode, Json<serde_json::Value>)> {
    let log = state.store.log_prompt(&prompt).await?;
    Ok((StatusCode::CREATED, Json(serde_json::json!({ "id": log.id }))))
}
