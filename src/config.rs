use crate::engine::EngineOptions;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Where tool data comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataMode {
    /// Real Meta Graph and GA4 Data API calls. Tools without credentials
    /// report a configuration error.
    Live,
    /// Deterministic sample numbers, no network.
    Mock,
}

impl DataMode {
    pub fn from_env() -> Self {
        Self::parse(&env::var("ADSIGHT_DATA_MODE").unwrap_or_default())
    }

    fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "mock" | "demo" | "sandbox" => Self::Mock,
            _ => Self::Live,
        }
    }
}

#[derive(Debug, Clone)]
pub struct MetaSettings {
    pub access_token: Option<String>,
    pub ad_account_id: Option<String>,
    pub page_id: Option<String>,
    pub page_token: Option<String>,
    pub api_version: String,
}

#[derive(Debug, Clone)]
pub struct Ga4Settings {
    pub property_id: Option<String>,
    pub access_token: Option<String>,
}

/// One LLM provider. Present only when its API key is set.
#[derive(Debug, Clone)]
pub struct ProviderSettings {
    pub api_key: String,
    pub model: String,
    pub base_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub shutdown_timeout_secs: u64,
    pub data_mode: DataMode,
    pub meta: MetaSettings,
    pub ga4: Ga4Settings,
    pub tool_bridge_url: Option<String>,
    pub openai: Option<ProviderSettings>,
    pub groq: Option<ProviderSettings>,
    pub gemini: Option<ProviderSettings>,
    /// Initial provider preference, e.g. `["gemini", "openai", "groq"]`.
    pub provider_order: Vec<String>,
    /// Bound on every outbound platform or provider call.
    pub external_timeout_secs: u64,
    pub tool_timeout_secs: u64,
    pub response_cache_ttl_secs: u64,
    pub response_cache_capacity: usize,
    pub retrieval_cache_ttl_secs: u64,
    pub retrieval_cache_capacity: usize,
    pub prompt_corpus_dir: PathBuf,
    pub max_message_chars: usize,
    pub cors_allow_origin: String,
}

/// Non-empty value of an environment variable.
fn optional(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn provider(key_var: &str, model_var: &str, default_model: &str) -> Option<ProviderSettings> {
    optional(key_var).map(|api_key| ProviderSettings {
        api_key,
        model: optional(model_var).unwrap_or_else(|| default_model.to_string()),
        base_url: None,
    })
}

fn parse_provider_order(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|p| p.trim().to_lowercase())
        .filter(|p| !p.is_empty())
        .collect()
}

impl Config {
    /// Load configuration from environment variables with sensible defaults.
    ///
    /// Missing platform or provider credentials are not errors: the tools
    /// that need them report a configuration failure at call time, and an
    /// unconfigured provider is simply skipped.
    pub fn from_env() -> anyhow::Result<Self> {
        let mut openai = provider("OPENAI_API_KEY", "OPENAI_MODEL", "gpt-4o-mini");
        if let Some(settings) = openai.as_mut() {
            settings.base_url = optional("OPENAI_BASE_URL");
        }

        Ok(Self {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()?,
            shutdown_timeout_secs: env::var("SHUTDOWN_TIMEOUT")
                .unwrap_or_else(|_| "5".to_string())
                .parse()?,
            data_mode: DataMode::from_env(),
            meta: MetaSettings {
                access_token: optional("META_ACCESS_TOKEN"),
                ad_account_id: optional("META_AD_ACCOUNT_ID"),
                page_id: optional("META_PAGE_ID"),
                page_token: optional("META_PAGE_TOKEN"),
                api_version: optional("META_API_VERSION").unwrap_or_else(|| "v19.0".to_string()),
            },
            ga4: Ga4Settings {
                property_id: optional("GA4_PROPERTY_ID"),
                access_token: optional("GA4_ACCESS_TOKEN"),
            },
            tool_bridge_url: optional("TOOL_BRIDGE_URL"),
            openai,
            groq: provider("GROQ_API_KEY", "GROQ_MODEL", "llama-3.1-8b-instant"),
            gemini: provider("GEMINI_API_KEY", "GEMINI_MODEL", "gemini-1.5-flash"),
            provider_order: parse_provider_order(
                &env::var("PROVIDER_ORDER").unwrap_or_else(|_| "gemini,openai,groq".to_string()),
            ),
            external_timeout_secs: env::var("EXTERNAL_TIMEOUT_SECS")
                .unwrap_or_else(|_| "15".to_string())
                .parse()?,
            tool_timeout_secs: env::var("TOOL_TIMEOUT_SECS")
                .unwrap_or_else(|_| "25".to_string())
                .parse()?,
            response_cache_ttl_secs: env::var("RESPONSE_CACHE_TTL_SECS")
                .unwrap_or_else(|_| "60".to_string())
                .parse()?,
            response_cache_capacity: env::var("RESPONSE_CACHE_CAPACITY")
                .unwrap_or_else(|_| "500".to_string())
                .parse()?,
            retrieval_cache_ttl_secs: env::var("RETRIEVAL_CACHE_TTL_SECS")
                .unwrap_or_else(|_| "600".to_string())
                .parse()?,
            retrieval_cache_capacity: env::var("RETRIEVAL_CACHE_CAPACITY")
                .unwrap_or_else(|_| "5000".to_string())
                .parse()?,
            prompt_corpus_dir: PathBuf::from(
                env::var("PROMPT_CORPUS_DIR").unwrap_or_else(|_| "./prompts".to_string()),
            ),
            max_message_chars: env::var("MAX_MESSAGE_CHARS")
                .unwrap_or_else(|_| "2000".to_string())
                .parse()?,
            cors_allow_origin: env::var("CORS_ALLOW_ORIGIN").unwrap_or_else(|_| "*".to_string()),
        })
    }

    pub fn external_timeout(&self) -> Duration {
        Duration::from_secs(self.external_timeout_secs)
    }

    pub fn engine_options(&self) -> EngineOptions {
        EngineOptions {
            tool_timeout: Duration::from_secs(self.tool_timeout_secs),
            response_cache_ttl: Duration::from_secs(self.response_cache_ttl_secs),
            response_cache_capacity: self.response_cache_capacity,
            retrieval_cache_ttl: Duration::from_secs(self.retrieval_cache_ttl_secs),
            retrieval_cache_capacity: self.retrieval_cache_capacity,
            max_message_chars: self.max_message_chars,
        }
    }
}

/// Mock data, no providers and the embedded corpus fallback.
impl Default for Config {
    fn default() -> Self {
        let options = EngineOptions::default();
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            shutdown_timeout_secs: 5,
            data_mode: DataMode::Mock,
            meta: MetaSettings {
                access_token: None,
                ad_account_id: None,
                page_id: None,
                page_token: None,
                api_version: "v19.0".to_string(),
            },
            ga4: Ga4Settings {
                property_id: None,
                access_token: None,
            },
            tool_bridge_url: None,
            openai: None,
            groq: None,
            gemini: None,
            provider_order: parse_provider_order("gemini,openai,groq"),
            external_timeout_secs: 15,
            tool_timeout_secs: options.tool_timeout.as_secs(),
            response_cache_ttl_secs: options.response_cache_ttl.as_secs(),
            response_cache_capacity: options.response_cache_capacity,
            retrieval_cache_ttl_secs: options.retrieval_cache_ttl.as_secs(),
            retrieval_cache_capacity: options.retrieval_cache_capacity,
            prompt_corpus_dir: PathBuf::from("./prompts"),
            max_message_chars: options.max_message_chars,
            cors_allow_origin: "*".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_mode_aliases() {
        assert_eq!(DataMode::parse("mock"), DataMode::Mock);
        assert_eq!(DataMode::parse(" Demo "), DataMode::Mock);
        assert_eq!(DataMode::parse("sandbox"), DataMode::Mock);
        assert_eq!(DataMode::parse("live"), DataMode::Live);
        assert_eq!(DataMode::parse(""), DataMode::Live);
    }

    #[test]
    fn test_provider_order_parsing() {
        assert_eq!(
            parse_provider_order(" Groq, gemini,,openai "),
            vec!["groq", "gemini", "openai"]
        );
    }

    #[test]
    fn test_default_engine_options_match_engine_defaults() {
        let options = Config::default().engine_options();
        assert_eq!(options.tool_timeout, Duration::from_secs(25));
        assert_eq!(options.response_cache_capacity, 500);
        assert_eq!(options.max_message_chars, 2000);
    }
}
