//! Optional LLM delegation.
//!
//! Providers are interchangeable behind [`LlmProvider`]. The delegate tries
//! them in preference order; any failure moves on to the next provider and,
//! when all fail, the deterministic routing chain answers instead.

pub mod gemini;
pub mod openai;
pub mod routing;

pub use gemini::{GeminiProvider, GEMINI_BASE_URL};
pub use openai::{OpenAiProvider, GROQ_BASE_URL, OPENAI_BASE_URL};
pub use routing::{Delegation, LlmDelegate, RoutingContext};

use crate::error::LlmError;
use crate::tools::{ToolCall, ToolDefinition};
use async_trait::async_trait;

/// Instructions prepended to every direct-answer prompt.
pub const ANSWER_INSTRUCTIONS: &str = "You are a performance-marketing assistant for a business \
running Meta (Facebook/Instagram) ads and tracking its website with GA4. Answer the question \
below in at most five short sentences. Be concrete and practical. If the question needs live \
account numbers you do not have, say which metric to check instead of inventing values.";

/// System prompt for native function-calling.
pub const TOOL_SELECTION_INSTRUCTIONS: &str = "You route marketing questions to data tools. \
Call the tools needed to answer the user's question. If no tool is relevant, reply briefly \
without calling any tool.";

#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Stable identifier used for routing preference and the response mode.
    fn name(&self) -> &str;

    async fn complete(&self, prompt: &str) -> Result<String, LlmError>;

    /// Let the model pick tools through native function-calling.
    ///
    /// `Ok(None)` means the provider has no function-calling support or
    /// chose not to call a tool.
    async fn select_tools(
        &self,
        _message: &str,
        _tools: &[ToolDefinition],
    ) -> Result<Option<Vec<ToolCall>>, LlmError> {
        Ok(None)
    }
}

pub fn answer_prompt(message: &str) -> String {
    format!("{}\n\nQuestion: {}", ANSWER_INSTRUCTIONS, message)
}
