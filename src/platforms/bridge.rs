//! Remote tool execution used as a secondary path when a primary platform
//! client fails.

use crate::error::PlatformError;
use crate::tools::types::ToolArgs;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::time::Duration;

#[async_trait]
pub trait ToolCallBridge: Send + Sync {
    /// Execute `tool` remotely and return its raw JSON payload.
    async fn call(&self, tool: &str, args: &ToolArgs) -> Result<Value, PlatformError>;
}

/// Bridge speaking a minimal JSON protocol:
/// `POST {base}/tools/call {"name", "arguments"}` returning either the payload
/// itself, `{"result": payload}` or `{"ok": false, "error": "..."}`.
pub struct HttpToolBridge {
    http: reqwest::Client,
    base_url: String,
}

impl HttpToolBridge {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, PlatformError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PlatformError::Network(e.to_string()))?;
        let base_url = base_url.into();

        tracing::info!(base_url = %base_url, "Tool bridge configured");

        Ok(Self { http, base_url })
    }
}

#[async_trait]
impl ToolCallBridge for HttpToolBridge {
    async fn call(&self, tool: &str, args: &ToolArgs) -> Result<Value, PlatformError> {
        let url = format!("{}/tools/call", self.base_url.trim_end_matches('/'));
        let response = self
            .http
            .post(&url)
            .json(&json!({ "name": tool, "arguments": args }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PlatformError::from_status(status.as_u16(), body));
        }

        unwrap_payload(response.json::<Value>().await?)
    }
}

fn unwrap_payload(body: Value) -> Result<Value, PlatformError> {
    if body.get("ok").and_then(Value::as_bool) == Some(false) {
        let error = body
            .get("error")
            .and_then(Value::as_str)
            .unwrap_or("bridge reported failure")
            .to_string();
        return Err(PlatformError::Api {
            status: 200,
            body: error,
        });
    }

    match body {
        Value::Object(mut map) if map.contains_key("result") => {
            Ok(map.remove("result").unwrap_or(Value::Null))
        }
        other => Ok(other),
    }
}
