use crate::error::{AppError, Result};
use crate::state::AppState;
use crate::tools::{ToolContext, ToolDefinition, ToolResult};
use axum::{
    body::Bytes,
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

#[derive(Debug, Serialize)]
pub struct ToolListResponse {
    pub tools: Vec<ToolDefinition>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RunToolRequest {
    #[serde(default)]
    pub args: Option<Value>,
    #[serde(default)]
    pub tenant_id: Option<String>,
}

/// GET /tools - Registered tools with their input schemas.
pub async fn list_tools_handler(State(state): State<Arc<AppState>>) -> Json<ToolListResponse> {
    Json(ToolListResponse {
        tools: state.engine.tools(),
    })
}

impl RunToolRequest {
    /// An empty body means no arguments; anything else must be valid JSON.
    fn from_body(body: &[u8]) -> Result<Self> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }
        serde_json::from_slice(body)
            .map_err(|e| AppError::ValidationError(format!("Invalid request body: {}", e)))
    }
}

/// POST /tools/:name/run - Run one tool directly, skipping classification.
///
/// A malformed body is a 400. Otherwise always 200: unknown tools and
/// upstream failures come back as an `Err` tool result.
pub async fn run_tool_handler(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    body: Bytes,
) -> Result<Json<ToolResult>> {
    let request = RunToolRequest::from_body(&body)?;
    let args = request
        .args
        .unwrap_or_else(|| Value::Object(Default::default()));
    let context = ToolContext {
        tenant_id: request.tenant_id,
        role: None,
    };
    Ok(Json(state.engine.run_tool(&name, &args, &context).await))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_body_parsing() {
        let empty = RunToolRequest::from_body(b"").unwrap();
        assert!(empty.args.is_none());
        assert!(RunToolRequest::from_body(b"  \n").is_ok());

        let parsed = RunToolRequest::from_body(br#"{"args": {"limit": 2}, "tenant_id": "acme"}"#).unwrap();
        assert_eq!(parsed.args.unwrap()["limit"], 2);
        assert_eq!(parsed.tenant_id.as_deref(), Some("acme"));

        assert!(matches!(
            RunToolRequest::from_body(b"{\"args\": "),
            Err(AppError::ValidationError(_))
        ));
    }
}
