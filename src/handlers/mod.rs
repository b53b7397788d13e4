pub mod chat;
pub mod health;
pub mod tools;

pub use chat::chat_handler;
pub use health::{health_handler, ready_handler};
pub use tools::{list_tools_handler, run_tool_handler};

use crate::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

/// API routes without middleware or the metrics endpoint.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/chat", post(chat_handler))
        .route("/tools", get(list_tools_handler))
        .route("/tools/:name/run", post(run_tool_handler))
        .route("/health", get(health_handler))
        .route("/ready", get(ready_handler))
        .with_state(state)
}
