use crate::error::LlmError;
use crate::llm::{answer_prompt, LlmProvider};
use crate::tools::{ToolCall, ToolDefinition};
use parking_lot::RwLock;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Provider preference shared by every request handled by one engine.
///
/// The last provider that answered is tried first next time. Races between
/// concurrent requests only change which provider goes first.
#[derive(Debug, Default)]
pub struct RoutingContext {
    preferred: RwLock<Option<String>>,
}

impl RoutingContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn preferred(&self) -> Option<String> {
        self.preferred.read().clone()
    }

    pub fn record_success(&self, provider: &str) {
        let mut preferred = self.preferred.write();
        if preferred.as_deref() != Some(provider) {
            tracing::debug!(provider, "Preferred LLM provider updated");
            *preferred = Some(provider.to_string());
        }
    }

    /// Providers in attempt order: the preferred one, then the rest in
    /// their configured order.
    pub fn order(&self, providers: &[Arc<dyn LlmProvider>]) -> Vec<Arc<dyn LlmProvider>> {
        let preferred = self.preferred.read();
        let mut ordered: Vec<Arc<dyn LlmProvider>> = Vec::with_capacity(providers.len());
        if let Some(name) = preferred.as_deref() {
            ordered.extend(providers.iter().filter(|p| p.name() == name).cloned());
        }
        ordered.extend(
            providers
                .iter()
                .filter(|p| Some(p.name()) != preferred.as_deref())
                .cloned(),
        );
        ordered
    }
}

/// What the first successful provider produced.
#[derive(Debug, Clone, PartialEq)]
pub enum Delegation {
    /// The model picked registered tools to run.
    Tools { provider: String, calls: Vec<ToolCall> },
    /// The model answered in prose.
    Answer { provider: String, text: String },
}

impl Delegation {
    pub fn provider(&self) -> &str {
        match self {
            Delegation::Tools { provider, .. } | Delegation::Answer { provider, .. } => provider,
        }
    }
}

pub struct LlmDelegate {
    providers: Vec<Arc<dyn LlmProvider>>,
    routing: Arc<RoutingContext>,
    call_timeout: Duration,
}

impl LlmDelegate {
    pub fn new(
        providers: Vec<Arc<dyn LlmProvider>>,
        routing: Arc<RoutingContext>,
        call_timeout: Duration,
    ) -> Self {
        Self {
            providers,
            routing,
            call_timeout,
        }
    }

    pub fn is_configured(&self) -> bool {
        !self.providers.is_empty()
    }

    pub fn provider_names(&self) -> Vec<String> {
        self.providers.iter().map(|p| p.name().to_string()).collect()
    }

    pub fn routing(&self) -> &Arc<RoutingContext> {
        &self.routing
    }

    /// Try each provider until one succeeds. `None` when every provider
    /// failed or none is configured.
    pub async fn delegate(&self, message: &str, tools: &[ToolDefinition]) -> Option<Delegation> {
        for provider in self.routing.order(&self.providers) {
            let name = provider.name().to_string();
            match self.attempt(provider.as_ref(), message, tools).await {
                Ok(delegation) => {
                    self.routing.record_success(&name);
                    return Some(delegation);
                }
                Err(e) => {
                    tracing::warn!(provider = %name, error = %e, "LLM provider failed, trying next");
                    metrics::counter!("llm_provider_failures_total", "provider" => name)
                        .increment(1);
                }
            }
        }
        None
    }

    async fn attempt(
        &self,
        provider: &dyn LlmProvider,
        message: &str,
        tools: &[ToolDefinition],
    ) -> Result<Delegation, LlmError> {
        let provider_name = provider.name().to_string();

        if !tools.is_empty() {
            let selected = self.bounded(provider.select_tools(message, tools)).await?;
            let calls: Vec<ToolCall> = selected
                .unwrap_or_default()
                .into_iter()
                .filter(|call| tools.iter().any(|t| t.name == call.name))
                .collect();
            if !calls.is_empty() {
                return Ok(Delegation::Tools {
                    provider: provider_name,
                    calls,
                });
            }
        }

        let text = self.bounded(provider.complete(&answer_prompt(message))).await?;
        Ok(Delegation::Answer {
            provider: provider_name,
            text,
        })
    }

    async fn bounded<T>(
        &self,
        call: impl Future<Output = Result<T, LlmError>>,
    ) -> Result<T, LlmError> {
        tokio::time::timeout(self.call_timeout, call)
            .await
            .map_err(|_| LlmError::Timeout(self.call_timeout))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct ScriptedProvider {
        name: &'static str,
        fail: bool,
        tool: Option<&'static str>,
        calls: AtomicUsize,
    }

    impl ScriptedProvider {
        fn new(name: &'static str, fail: bool) -> Arc<Self> {
            Arc::new(Self {
                name,
                fail,
                tool: None,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl LlmProvider for ScriptedProvider {
        fn name(&self) -> &str {
            self.name
        }

        async fn complete(&self, _prompt: &str) -> Result<String, LlmError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(LlmError::RateLimited("quota".into()))
            } else {
                Ok(format!("answer from {}", self.name))
            }
        }

        async fn select_tools(
            &self,
            _message: &str,
            _tools: &[ToolDefinition],
        ) -> Result<Option<Vec<ToolCall>>, LlmError> {
            Ok(self.tool.map(|t| vec![ToolCall::bare(t)]))
        }
    }

    fn definition(name: &str) -> ToolDefinition {
        ToolDefinition {
            name: name.to_string(),
            description: String::new(),
            input_schema: json!({"type": "object"}),
        }
    }

    #[tokio::test]
    async fn test_failover_and_sticky_preference() {
        let first = ScriptedProvider::new("gemini", true);
        let second = ScriptedProvider::new("openai", false);
        let routing = Arc::new(RoutingContext::new());
        let delegate = LlmDelegate::new(
            vec![first.clone(), second.clone()],
            routing.clone(),
            Duration::from_secs(5),
        );

        let result = delegate.delegate("how do I improve ctr", &[]).await.unwrap();
        assert_eq!(result.provider(), "openai");
        assert_eq!(routing.preferred().as_deref(), Some("openai"));

        delegate.delegate("another question", &[]).await.unwrap();
        // The failing provider is not retried first once another succeeded.
        assert_eq!(first.calls.load(Ordering::SeqCst), 1);
        assert_eq!(second.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_all_providers_failing_yields_none() {
        let delegate = LlmDelegate::new(
            vec![ScriptedProvider::new("gemini", true), ScriptedProvider::new("groq", true)],
            Arc::new(RoutingContext::new()),
            Duration::from_secs(5),
        );
        assert!(delegate.delegate("hello", &[]).await.is_none());
    }

    #[tokio::test]
    async fn test_tool_selection_filters_unknown_tools() {
        let known = Arc::new(ScriptedProvider {
            name: "openai",
            fail: false,
            tool: Some("get_meta_spend_today"),
            calls: AtomicUsize::new(0),
        });
        let delegate = LlmDelegate::new(
            vec![known],
            Arc::new(RoutingContext::new()),
            Duration::from_secs(5),
        );
        let result = delegate
            .delegate("spend?", &[definition("get_meta_spend_today")])
            .await
            .unwrap();
        assert!(matches!(result, Delegation::Tools { ref calls, .. } if calls.len() == 1));

        let hallucinating = Arc::new(ScriptedProvider {
            name: "groq",
            fail: false,
            tool: Some("drop_database"),
            calls: AtomicUsize::new(0),
        });
        let delegate = LlmDelegate::new(
            vec![hallucinating],
            Arc::new(RoutingContext::new()),
            Duration::from_secs(5),
        );
        let result = delegate
            .delegate("spend?", &[definition("get_meta_spend_today")])
            .await
            .unwrap();
        assert!(matches!(result, Delegation::Answer { .. }));
    }

    #[test]
    fn test_order_puts_preferred_first() {
        let providers: Vec<Arc<dyn LlmProvider>> = vec![
            ScriptedProvider::new("gemini", false),
            ScriptedProvider::new("openai", false),
            ScriptedProvider::new("groq", false),
        ];
        let routing = RoutingContext::new();
        routing.record_success("groq");
        let names: Vec<String> = routing
            .order(&providers)
            .iter()
            .map(|p| p.name().to_string())
            .collect();
        assert_eq!(names, vec!["groq", "gemini", "openai"]);
    }
}
