//! Concurrent tool execution with per-tool failure isolation.

use crate::tools::{ToolCall, ToolContext, ToolRegistry, ToolResult};
use futures::future::join_all;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

/// One executed tool, as reported in `ResponsePayload.tools`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolOutcome {
    pub name: String,
    pub result: ToolResult,
}

pub struct Orchestrator {
    registry: Arc<ToolRegistry>,
    tool_timeout: Duration,
}

impl Orchestrator {
    pub fn new(registry: Arc<ToolRegistry>, tool_timeout: Duration) -> Self {
        Self {
            registry,
            tool_timeout,
        }
    }

    pub fn registry(&self) -> &Arc<ToolRegistry> {
        &self.registry
    }

    /// Run every call concurrently. The output keeps the input order and
    /// holds exactly one outcome per call: a panicking or hung tool becomes
    /// an `Err` result without affecting the others.
    pub async fn execute(&self, calls: &[ToolCall], context: &ToolContext) -> Vec<ToolOutcome> {
        let tasks = calls.iter().map(|call| {
            let registry = Arc::clone(&self.registry);
            let context = context.clone();
            let name = call.name.clone();
            let args = call.args.clone();
            let timeout = self.tool_timeout;

            let handle = tokio::spawn(async move {
                tokio::time::timeout(timeout, registry.run_by_name(&name, &args, &context)).await
            });

            let name = call.name.clone();
            async move {
                let result = match handle.await {
                    Ok(Ok(result)) => result,
                    Ok(Err(_elapsed)) => {
                        tracing::warn!(tool = %name, ?timeout, "Tool timed out");
                        ToolResult::failure(&name, format!("Tool timed out after {:?}", timeout))
                    }
                    Err(e) => {
                        tracing::error!(tool = %name, error = %e, "Tool task failed");
                        ToolResult::failure(&name, format!("Tool execution failed: {}", e))
                    }
                };
                ToolOutcome { name, result }
            }
        });

        join_all(tasks).await
    }

    /// Run a single tool inline, bypassing classification.
    pub async fn run_one(&self, call: &ToolCall, context: &ToolContext) -> ToolResult {
        self.execute(std::slice::from_ref(call), context)
            .await
            .pop()
            .map(|outcome| outcome.result)
            .unwrap_or_else(|| ToolResult::failure(&call.name, "Tool produced no result"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::{DataSource, DateRange, ToolArgs, ToolData, ToolHandler};
    use async_trait::async_trait;
    use serde_json::Value;

    enum Behaviour {
        Succeed,
        Panic,
        Hang,
    }

    struct FakeTool {
        name: &'static str,
        behaviour: Behaviour,
    }

    #[async_trait]
    impl ToolHandler for FakeTool {
        fn name(&self) -> &str {
            self.name
        }

        fn description(&self) -> &str {
            "fake"
        }

        fn input_schema(&self) -> Value {
            serde_json::json!({"type": "object"})
        }

        async fn execute(&self, _args: &ToolArgs, _context: &ToolContext) -> ToolResult {
            match self.behaviour {
                Behaviour::Succeed => ToolResult::success(
                    self.name,
                    ToolData::Leads {
                        leads: 3,
                        range: DateRange::Today,
                    },
                    DataSource::Mock,
                ),
                Behaviour::Panic => panic!("handler bug"),
                Behaviour::Hang => {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                    unreachable!()
                }
            }
        }
    }

    fn orchestrator() -> Orchestrator {
        let mut registry = ToolRegistry::new();
        for (name, behaviour) in [
            ("ok_tool", Behaviour::Succeed),
            ("panic_tool", Behaviour::Panic),
            ("hang_tool", Behaviour::Hang),
        ] {
            registry
                .register(Arc::new(FakeTool { name, behaviour }))
                .unwrap();
        }
        Orchestrator::new(Arc::new(registry), Duration::from_secs(2))
    }

    #[tokio::test]
    async fn test_failures_are_isolated_and_order_kept() {
        let orchestrator = orchestrator();
        let calls = [
            ToolCall::bare("panic_tool"),
            ToolCall::bare("ok_tool"),
            ToolCall::bare("missing_tool"),
        ];
        let outcomes = orchestrator.execute(&calls, &ToolContext::default()).await;

        let names: Vec<&str> = outcomes.iter().map(|o| o.name.as_str()).collect();
        assert_eq!(names, vec!["panic_tool", "ok_tool", "missing_tool"]);
        assert!(outcomes[0].result.error().unwrap().starts_with("Tool execution failed"));
        assert!(outcomes[1].result.is_ok());
        assert_eq!(outcomes[2].result.error(), Some("Unknown tool"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_hung_tool_times_out() {
        let orchestrator = orchestrator();
        let result = orchestrator
            .run_one(&ToolCall::bare("hang_tool"), &ToolContext::default())
            .await;
        assert!(result.error().unwrap().starts_with("Tool timed out"));
        assert_eq!(result.tool(), "hang_tool");
    }
}
