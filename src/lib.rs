//! Adsight - natural-language marketing metrics gateway
//!
//! Answers questions about Meta ad spend, leads, campaigns and GA4 traffic
//! by classifying each message into tool calls, running them concurrently
//! and rendering the results as prose, tables or action plans.

pub mod cache;
pub mod config;
pub mod engine;
pub mod error;
pub mod format;
pub mod handlers;
pub mod intent;
pub mod llm;
pub mod normalize;
pub mod orchestrator;
pub mod platforms;
pub mod retrieval;
pub mod state;
pub mod tools;

// Re-export key types for convenience
pub use config::{Config, DataMode};
pub use engine::{ChatEngine, Clock, EngineOptions, FixedClock, ResponsePayload, SystemClock};
pub use error::{AppError, LlmError, PlatformError, Result};
pub use handlers::router;
pub use llm::{LlmDelegate, LlmProvider, RoutingContext};
pub use normalize::normalize;
pub use retrieval::PromptCorpus;
pub use state::AppState;
pub use tools::{ToolContext, ToolRegistry, ToolResult};
