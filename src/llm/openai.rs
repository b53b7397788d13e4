use crate::error::LlmError;
use crate::llm::{LlmProvider, TOOL_SELECTION_INSTRUCTIONS};
use crate::tools::{ToolCall, ToolDefinition};
use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::time::Duration;

pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const GROQ_BASE_URL: &str = "https://api.groq.com/openai/v1";

/// Client for any OpenAI-compatible chat completions endpoint (OpenAI, Groq).
#[derive(Debug, Clone)]
pub struct OpenAiProvider {
    http: reqwest::Client,
    name: String,
    api_key: String,
    model: String,
    base_url: String,
}

impl OpenAiProvider {
    pub fn new(
        name: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, LlmError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LlmError::Network(e.to_string()))?;

        Ok(Self {
            http,
            name: name.into(),
            api_key: api_key.into(),
            model: model.into(),
            base_url: base_url.into(),
        })
    }

    async fn chat(&self, body: Value) -> Result<Value, LlmError> {
        let url = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::from_status(status.as_u16(), body));
        }

        Ok(response.json::<Value>().await?)
    }
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    fn name(&self) -> &str {
        &self.name
    }

    #[tracing::instrument(skip(self, prompt), fields(provider = %self.name, model = %self.model))]
    async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        let response = self
            .chat(json!({
                "model": self.model,
                "messages": [{ "role": "user", "content": prompt }],
                "temperature": 0.3,
            }))
            .await?;
        parse_content(&response)
    }

    #[tracing::instrument(skip(self, message, tools), fields(provider = %self.name))]
    async fn select_tools(
        &self,
        message: &str,
        tools: &[ToolDefinition],
    ) -> Result<Option<Vec<ToolCall>>, LlmError> {
        if tools.is_empty() {
            return Ok(None);
        }

        let functions: Vec<Value> = tools
            .iter()
            .map(|tool| {
                json!({
                    "type": "function",
                    "function": {
                        "name": tool.name,
                        "description": tool.description,
                        "parameters": tool.input_schema,
                    }
                })
            })
            .collect();

        let response = self
            .chat(json!({
                "model": self.model,
                "messages": [
                    { "role": "system", "content": TOOL_SELECTION_INSTRUCTIONS },
                    { "role": "user", "content": message },
                ],
                "tools": functions,
                "tool_choice": "auto",
                "temperature": 0,
            }))
            .await?;
        parse_tool_calls(&response)
    }
}

fn first_message(response: &Value) -> Result<&Value, LlmError> {
    response
        .get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("message"))
        .ok_or_else(|| LlmError::Malformed("response has no choices[0].message".to_string()))
}

fn parse_content(response: &Value) -> Result<String, LlmError> {
    let content = first_message(response)?
        .get("content")
        .and_then(Value::as_str)
        .map(str::trim)
        .unwrap_or_default();
    if content.is_empty() {
        return Err(LlmError::Malformed("empty completion".to_string()));
    }
    Ok(content.to_string())
}

fn parse_tool_calls(response: &Value) -> Result<Option<Vec<ToolCall>>, LlmError> {
    let Some(calls) = first_message(response)?
        .get("tool_calls")
        .and_then(Value::as_array)
    else {
        return Ok(None);
    };

    let mut parsed = Vec::with_capacity(calls.len());
    for call in calls {
        let function = call
            .get("function")
            .ok_or_else(|| LlmError::Malformed("tool call without function".to_string()))?;
        let name = function
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| LlmError::Malformed("tool call without name".to_string()))?;
        // Arguments arrive as a JSON-encoded string.
        let args = match function.get("arguments").and_then(Value::as_str) {
            Some(raw) if !raw.trim().is_empty() => serde_json::from_str::<Value>(raw)
                .map_err(|e| LlmError::Malformed(format!("tool arguments: {}", e)))?,
            _ => Value::Object(Map::new()),
        };
        parsed.push(ToolCall {
            name: name.to_string(),
            args,
        });
    }

    Ok((!parsed.is_empty()).then_some(parsed))
}
