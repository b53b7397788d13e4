//! The chat engine: normalize, classify, execute, render and cache.

use crate::cache::TtlCache;
use crate::error::{AppError, Result};
use crate::format::{self, CalendarDay};
use crate::intent::{self, rules, Intent, IntentParams, Message, Mode};
use crate::llm::{Delegation, LlmDelegate, RoutingContext};
use crate::normalize::normalize;
use crate::orchestrator::{Orchestrator, ToolOutcome};
use crate::retrieval::{PromptCorpus, PromptMatcher};
use crate::tools::{ToolCall, ToolContext, ToolDefinition, ToolRegistry, ToolResult};
use chrono::NaiveDate;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use uuid::Uuid;

const MAX_TOOLS_PER_MESSAGE: usize = 6;

/// Source of "today" for month-to-date arithmetic.
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        chrono::Local::now().date_naive()
    }
}

pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}

#[derive(Debug, Clone)]
pub struct EngineOptions {
    pub tool_timeout: Duration,
    pub response_cache_ttl: Duration,
    pub response_cache_capacity: usize,
    pub retrieval_cache_ttl: Duration,
    pub retrieval_cache_capacity: usize,
    pub max_message_chars: usize,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            tool_timeout: Duration::from_secs(25),
            response_cache_ttl: Duration::from_secs(60),
            response_cache_capacity: 500,
            retrieval_cache_ttl: Duration::from_secs(600),
            retrieval_cache_capacity: 5000,
            max_message_chars: 2000,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ResponseMeta {
    pub mode: String,
    pub request_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub matched_prompts: Vec<String>,
    #[serde(skip_serializing_if = "IntentParams::is_empty")]
    pub params: IntentParams,
    pub cached: bool,
    pub elapsed_ms: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResponsePayload {
    pub ok: bool,
    pub answer: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<ToolOutcome>>,
    pub meta: ResponseMeta,
}

impl ResponsePayload {
    fn has_tool_errors(&self) -> bool {
        self.tools
            .as_ref()
            .is_some_and(|tools| tools.iter().any(|t| !t.result.is_ok()))
    }
}

/// Tenant plus normalized message.
type CacheKey = (Option<String>, String);

pub struct ChatEngine {
    orchestrator: Orchestrator,
    matcher: PromptMatcher,
    llm: LlmDelegate,
    response_cache: TtlCache<CacheKey, ResponsePayload>,
    clock: Arc<dyn Clock>,
    max_message_chars: usize,
}

impl ChatEngine {
    pub fn new(
        registry: Arc<ToolRegistry>,
        corpus: Arc<PromptCorpus>,
        llm: LlmDelegate,
        options: EngineOptions,
    ) -> Self {
        Self {
            orchestrator: Orchestrator::new(registry, options.tool_timeout),
            matcher: PromptMatcher::new(
                corpus,
                options.retrieval_cache_capacity,
                options.retrieval_cache_ttl,
            ),
            llm,
            response_cache: TtlCache::new(
                options.response_cache_capacity,
                options.response_cache_ttl,
            ),
            clock: Arc::new(SystemClock),
            max_message_chars: options.max_message_chars,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn tools(&self) -> Vec<ToolDefinition> {
        self.orchestrator.registry().list()
    }

    pub fn corpus(&self) -> &PromptCorpus {
        self.matcher.corpus()
    }

    pub fn routing(&self) -> &Arc<RoutingContext> {
        self.llm.routing()
    }

    /// Compile the rule regexes and prime the retrieval cache.
    pub fn warm_up(&self) {
        let _ = rules::classify_before_llm("warmup spend 2.5 days");
        let _ = rules::classify_after_llm("warmup spend 2.5 days");
        let _ = self.matcher.retrieve("how much did i spend on facebook ads");
    }

    /// Answer one chat message. Fails only on invalid input.
    #[tracing::instrument(skip(self, message, context), fields(tenant = ?context.tenant_id))]
    pub async fn handle_chat_message(
        &self,
        message: &str,
        context: &ToolContext,
    ) -> Result<ResponsePayload> {
        let started = Instant::now();
        let message = message.trim();
        if message.is_empty() {
            return Err(AppError::ValidationError(
                "Message cannot be empty".to_string(),
            ));
        }
        if message.chars().count() > self.max_message_chars {
            return Err(AppError::ValidationError(format!(
                "Message exceeds {} characters",
                self.max_message_chars
            )));
        }

        let normalized = normalize(message);
        let request_id = Uuid::new_v4().to_string();

        // Explicit commands skip the cache and every classifier stage.
        if let Some(intent) = intent::explicit_command(&Message::new(&normalized)) {
            return Ok(self
                .execute(intent, None, context, request_id, started)
                .await);
        }

        let key: CacheKey = (context.tenant_id.clone(), normalized.clone());
        if let Some(mut cached) = self.response_cache.get(&key) {
            metrics::counter!("response_cache_hits_total").increment(1);
            cached.meta.mode = format!("{}-cache-hit", cached.meta.mode);
            cached.meta.cached = true;
            cached.meta.request_id = request_id;
            cached.meta.elapsed_ms = started.elapsed().as_millis() as u64;
            record(&cached);
            return Ok(cached);
        }

        let (intent, provider) = self.resolve(message, &normalized).await;
        let cacheable = intent.mode.cacheable();
        let payload = self
            .execute(intent, provider, context, request_id, started)
            .await;

        if cacheable && !payload.has_tool_errors() {
            self.response_cache.insert(key, payload.clone());
        }
        Ok(payload)
    }

    /// Run one tool by name, bypassing classification.
    pub async fn run_tool(&self, name: &str, args: &Value, context: &ToolContext) -> ToolResult {
        let call = ToolCall {
            name: name.to_string(),
            args: args.clone(),
        };
        self.orchestrator.run_one(&call, context).await
    }

    async fn resolve(&self, message: &str, normalized: &str) -> (Intent, Option<String>) {
        if let Some(intent) = rules::classify_before_llm(normalized) {
            return (intent, None);
        }

        if self.llm.is_configured() {
            match self.llm.delegate(message, &self.tools()).await {
                Some(Delegation::Tools { provider, mut calls }) => {
                    calls.truncate(MAX_TOOLS_PER_MESSAGE);
                    return (Intent::new(Mode::LlmToolCalling, calls), Some(provider));
                }
                Some(Delegation::Answer { provider, text }) => {
                    let intent = Intent::new(Mode::LlmAnswer(provider.clone()), Vec::new())
                        .with_params(IntentParams {
                            llm_answer: Some(text),
                            ..Default::default()
                        });
                    return (intent, Some(provider));
                }
                None => tracing::debug!("No LLM provider answered, using deterministic routing"),
            }
        }

        if let Some(intent) = rules::classify_after_llm(normalized) {
            return (intent, None);
        }

        let retrieval = self.matcher.retrieve(normalized);
        if !retrieval.tools.is_empty() {
            let calls = retrieval.tools.iter().map(ToolCall::bare).collect();
            let intent = Intent::new(Mode::PromptRetrieval, calls).with_params(IntentParams {
                matched_prompts: retrieval.matched_prompts,
                ..Default::default()
            });
            return (intent, None);
        }

        if let Some(intent) = rules::default_bundle(normalized) {
            return (intent, None);
        }
        (rules::no_match(normalized), None)
    }

    async fn execute(
        &self,
        intent: Intent,
        provider: Option<String>,
        context: &ToolContext,
        request_id: String,
        started: Instant,
    ) -> ResponsePayload {
        let outcomes = if intent.calls.is_empty() {
            Vec::new()
        } else {
            self.orchestrator.execute(&intent.calls, context).await
        };

        let day = CalendarDay::from_date(self.clock.today());
        let answer = format::render(&intent, &outcomes, day);

        let payload = ResponsePayload {
            ok: true,
            answer,
            tools: (!outcomes.is_empty()).then_some(outcomes),
            meta: ResponseMeta {
                mode: intent.mode.as_str(),
                request_id,
                provider,
                matched_prompts: intent.params.matched_prompts.clone(),
                params: intent.params,
                cached: false,
                elapsed_ms: started.elapsed().as_millis() as u64,
            },
        };
        record(&payload);
        payload
    }
}

fn record(payload: &ResponsePayload) {
    metrics::counter!("chat_requests_total", "mode" => payload.meta.mode.clone()).increment(1);
    metrics::histogram!("chat_latency_ms").record(payload.meta.elapsed_ms as f64);
    tracing::info!(
        mode = %payload.meta.mode,
        request_id = %payload.meta.request_id,
        tools = payload.tools.as_ref().map_or(0, Vec::len),
        elapsed_ms = payload.meta.elapsed_ms,
        "Chat message handled"
    );
}
