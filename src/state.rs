use crate::config::{Config, DataMode, ProviderSettings};
use crate::engine::ChatEngine;
use crate::error::{AppError, Result};
use crate::llm::{
    GeminiProvider, LlmDelegate, LlmProvider, OpenAiProvider, RoutingContext, GEMINI_BASE_URL,
    GROQ_BASE_URL, OPENAI_BASE_URL,
};
use crate::platforms::{
    AdsPlatformClient, AnalyticsPlatformClient, Ga4Client, Ga4Config, HttpToolBridge,
    MetaAdsClient, MetaAdsConfig, MockAdsClient, MockAnalyticsClient, ToolCallBridge,
    GA4_BASE_URL, GRAPH_BASE_URL,
};
use crate::retrieval::PromptCorpus;
use crate::tools::{register_marketing_tools, DataSource, PlatformClients, ToolRegistry};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

const KNOWN_PROVIDERS: &[&str] = &["gemini", "openai", "groq"];

/// Application state shared across all request handlers.
pub struct AppState {
    pub engine: Arc<ChatEngine>,
    /// Set once the prompt index is built and warmed up.
    pub ready: AtomicBool,
    pub config: Arc<Config>,
}

impl AppState {
    /// Build platform clients, LLM providers, the prompt corpus and the
    /// chat engine from configuration.
    pub fn new(config: Config) -> Result<Self> {
        let clients = platform_clients(&config)?;
        let mut registry = ToolRegistry::new();
        register_marketing_tools(&mut registry, clients)?;

        let providers = llm_providers(&config)?;
        tracing::info!(
            tools = registry.len(),
            providers = ?providers.iter().map(|p| p.name().to_string()).collect::<Vec<_>>(),
            data_mode = ?config.data_mode,
            "Tool registry and providers initialized"
        );

        let llm = LlmDelegate::new(
            providers,
            Arc::new(RoutingContext::new()),
            config.external_timeout(),
        );
        let engine = ChatEngine::new(
            Arc::new(registry),
            Arc::new(load_corpus(&config)),
            llm,
            config.engine_options(),
        );

        let state = Self {
            engine: Arc::new(engine),
            ready: AtomicBool::new(false),
            config: Arc::new(config),
        };
        state.warmup();
        state.ready.store(true, Ordering::SeqCst);

        Ok(state)
    }

    /// Wrap an already built engine. Used by tests.
    pub fn from_engine(engine: ChatEngine, config: Config) -> Self {
        Self {
            engine: Arc::new(engine),
            ready: AtomicBool::new(true),
            config: Arc::new(config),
        }
    }

    /// Compile classifier regexes and prime the retrieval index so the
    /// first real request doesn't pay for it.
    fn warmup(&self) {
        tracing::info!("Running classifier warmup...");
        self.engine.warm_up();
        tracing::info!(prompts = self.engine.corpus().len(), "Classifier warmup completed");
    }

    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }
}

fn platform_clients(config: &Config) -> Result<PlatformClients> {
    let timeout = config.external_timeout();

    if config.data_mode == DataMode::Mock {
        tracing::info!("Mock data mode: platform calls return sample numbers");
        return Ok(PlatformClients {
            ads: Some(Arc::new(MockAdsClient)),
            analytics: Some(Arc::new(MockAnalyticsClient)),
            bridge: None,
            source: DataSource::Mock,
            call_timeout: timeout,
        });
    }

    let meta = &config.meta;
    let ads: Option<Arc<dyn AdsPlatformClient>> =
        match (&meta.access_token, &meta.ad_account_id) {
            (Some(token), Some(account)) => {
                let client = MetaAdsClient::new(
                    MetaAdsConfig {
                        access_token: token.clone(),
                        ad_account_id: account.clone(),
                        page_id: meta.page_id.clone(),
                        page_token: meta.page_token.clone(),
                        api_version: meta.api_version.clone(),
                        base_url: GRAPH_BASE_URL.to_string(),
                    },
                    timeout,
                )
                .map_err(|e| AppError::ConfigError(format!("Meta Ads client: {}", e)))?;
                Some(Arc::new(client))
            }
            _ => {
                tracing::warn!("Meta Ads credentials missing, ad tools will report configuration errors");
                None
            }
        };

    let ga4 = &config.ga4;
    let analytics: Option<Arc<dyn AnalyticsPlatformClient>> =
        match (&ga4.property_id, &ga4.access_token) {
            (Some(property_id), Some(token)) => {
                let client = Ga4Client::new(
                    Ga4Config {
                        property_id: property_id.clone(),
                        access_token: token.clone(),
                        base_url: GA4_BASE_URL.to_string(),
                    },
                    timeout,
                )
                .map_err(|e| AppError::ConfigError(format!("GA4 client: {}", e)))?;
                Some(Arc::new(client))
            }
            _ => {
                tracing::warn!("GA4 credentials missing, analytics tools will report configuration errors");
                None
            }
        };

    let bridge: Option<Arc<dyn ToolCallBridge>> = match &config.tool_bridge_url {
        Some(url) => Some(Arc::new(
            HttpToolBridge::new(url.clone(), timeout)
                .map_err(|e| AppError::ConfigError(format!("Tool bridge: {}", e)))?,
        )),
        None => None,
    };

    Ok(PlatformClients {
        ads,
        analytics,
        bridge,
        source: DataSource::Live,
        call_timeout: timeout,
    })
}

/// Providers in configured preference order. Configured providers missing
/// from `PROVIDER_ORDER` go last.
fn llm_providers(config: &Config) -> Result<Vec<Arc<dyn LlmProvider>>> {
    let mut order: Vec<&str> = Vec::new();
    for name in config
        .provider_order
        .iter()
        .map(String::as_str)
        .chain(KNOWN_PROVIDERS.iter().copied())
    {
        if !KNOWN_PROVIDERS.contains(&name) {
            tracing::warn!(provider = name, "Unknown LLM provider in PROVIDER_ORDER, ignoring");
        } else if !order.contains(&name) {
            order.push(name);
        }
    }

    let timeout = config.external_timeout();
    let openai_compatible = |name: &str, settings: &ProviderSettings, default_url: &str| {
        OpenAiProvider::new(
            name,
            settings.api_key.clone(),
            settings.model.clone(),
            settings.base_url.clone().unwrap_or_else(|| default_url.to_string()),
            timeout,
        )
        .map_err(|e| AppError::ConfigError(format!("{} provider: {}", name, e)))
    };

    let mut providers: Vec<Arc<dyn LlmProvider>> = Vec::new();
    for name in order {
        match name {
            "openai" => {
                if let Some(settings) = &config.openai {
                    providers.push(Arc::new(openai_compatible("openai", settings, OPENAI_BASE_URL)?));
                }
            }
            "groq" => {
                if let Some(settings) = &config.groq {
                    providers.push(Arc::new(openai_compatible("groq", settings, GROQ_BASE_URL)?));
                }
            }
            "gemini" => {
                if let Some(settings) = &config.gemini {
                    let provider = GeminiProvider::new(
                        settings.api_key.clone(),
                        settings.model.clone(),
                        settings.base_url.clone().unwrap_or_else(|| GEMINI_BASE_URL.to_string()),
                        timeout,
                    )
                    .map_err(|e| AppError::ConfigError(format!("gemini provider: {}", e)))?;
                    providers.push(Arc::new(provider));
                }
            }
            _ => {}
        }
    }
    Ok(providers)
}

/// Question files from disk, or the compiled-in set when the directory is
/// missing or holds no questions.
fn load_corpus(config: &Config) -> PromptCorpus {
    match PromptCorpus::load_dir(&config.prompt_corpus_dir) {
        Ok(corpus) if !corpus.is_empty() => {
            tracing::info!(
                dir = %config.prompt_corpus_dir.display(),
                prompts = corpus.len(),
                "Prompt corpus loaded"
            );
            corpus
        }
        Ok(_) => {
            tracing::warn!(
                dir = %config.prompt_corpus_dir.display(),
                "Prompt corpus directory is empty, using embedded questions"
            );
            PromptCorpus::embedded()
        }
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load prompt corpus, using embedded questions");
            PromptCorpus::embedded()
        }
    }
}
