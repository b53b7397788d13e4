use crate::error::{AppError, Result};
use crate::tools::types::{ToolArgs, ToolContext, ToolResult};
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// A named data-retrieval operation.
///
/// Implementations contain their own failures: `execute` returns
/// `ToolResult::Err` instead of panicking or propagating.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    /// Unique name used for dispatch.
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// JSON schema of the accepted arguments, exposed to function-calling LLMs.
    fn input_schema(&self) -> Value;

    async fn execute(&self, args: &ToolArgs, context: &ToolContext) -> ToolResult;
}

/// Serializable view of a registered tool.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

/// Catalog of tools, filled once at startup and read-only afterwards.
#[derive(Default)]
pub struct ToolRegistry {
    handlers: HashMap<String, Arc<dyn ToolHandler>>,
    order: Vec<String>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler. Names must be unique.
    pub fn register(&mut self, handler: Arc<dyn ToolHandler>) -> Result<()> {
        let name = handler.name().to_string();
        if self.handlers.contains_key(&name) {
            return Err(AppError::ConfigError(format!(
                "Tool '{}' is already registered",
                name
            )));
        }
        tracing::debug!(tool = %name, "Registered tool");
        self.order.push(name.clone());
        self.handlers.insert(name, handler);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn ToolHandler>> {
        self.handlers.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    /// Definitions in registration order.
    pub fn list(&self) -> Vec<ToolDefinition> {
        self.order
            .iter()
            .filter_map(|name| self.handlers.get(name))
            .map(|h| ToolDefinition {
                name: h.name().to_string(),
                description: h.description().to_string(),
                input_schema: h.input_schema(),
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Single execution entry point for every tool call.
    pub async fn run_by_name(&self, name: &str, args: &Value, context: &ToolContext) -> ToolResult {
        let Some(handler) = self.handlers.get(name) else {
            tracing::debug!(tool = %name, "Unknown tool requested");
            return ToolResult::failure(name, "Unknown tool");
        };
        let Some(args) = args.as_object() else {
            return ToolResult::failure(name, "Invalid tool arguments");
        };

        let result = handler.execute(args, context).await;

        let outcome = if result.is_ok() { "ok" } else { "error" };
        metrics::counter!("tool_calls_total", "tool" => name.to_string(), "outcome" => outcome)
            .increment(1);

        result
    }
}
