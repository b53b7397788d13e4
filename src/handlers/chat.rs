use crate::engine::ResponsePayload;
use crate::error::Result;
use crate::state::AppState;
use crate::tools::ToolContext;
use axum::{extract::State, Json};
use serde::Deserialize;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub tenant_id: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

/// POST /chat - Answer a natural-language marketing question.
///
/// Only an empty or oversized message is an error (400). Tool and provider
/// failures are reported inside the payload with `ok: true`.
pub async fn chat_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ResponsePayload>> {
    let context = ToolContext {
        tenant_id: request.tenant_id,
        role: request.role,
    };
    let payload = state
        .engine
        .handle_chat_message(&request.message, &context)
        .await?;
    Ok(Json(payload))
}
