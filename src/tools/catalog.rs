//! The marketing tool catalog: every tool wraps one platform call, contains
//! its failures, and falls back to the remote bridge when one is configured.

use crate::error::{PlatformError, Result};
use crate::platforms::{AdsPlatformClient, AnalyticsPlatformClient, ToolCallBridge};
use crate::tools::names;
use crate::tools::registry::{ToolHandler, ToolRegistry};
use crate::tools::types::{
    best_post, rank_campaigns, DataSource, DateRange, Period, ToolArgs, ToolContext, ToolData,
    ToolResult,
};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

const DEFAULT_PAGE_LIMIT: usize = 5;
const MAX_PAGE_LIMIT: usize = 25;

/// Clients shared by all catalog tools. Missing clients surface as
/// configuration errors on the tools that need them.
#[derive(Clone)]
pub struct PlatformClients {
    pub ads: Option<Arc<dyn AdsPlatformClient>>,
    pub analytics: Option<Arc<dyn AnalyticsPlatformClient>>,
    pub bridge: Option<Arc<dyn ToolCallBridge>>,
    pub source: DataSource,
    pub call_timeout: Duration,
}

impl PlatformClients {
    fn ads(&self) -> std::result::Result<&Arc<dyn AdsPlatformClient>, PlatformError> {
        self.ads.as_ref().ok_or_else(|| {
            PlatformError::NotConfigured(
                "Meta Ads is not configured (set META_ACCESS_TOKEN and META_AD_ACCOUNT_ID)"
                    .to_string(),
            )
        })
    }

    fn analytics(&self) -> std::result::Result<&Arc<dyn AnalyticsPlatformClient>, PlatformError> {
        self.analytics.as_ref().ok_or_else(|| {
            PlatformError::NotConfigured(
                "GA4 is not configured (set GA4_PROPERTY_ID and GA4_ACCESS_TOKEN)".to_string(),
            )
        })
    }
}

#[derive(Debug, Clone, Copy)]
enum Operation {
    Spend(DateRange),
    Leads(DateRange),
    BestCampaign,
    RunningAds,
    BestPost,
    ActiveUsers(DateRange),
    Sessions(DateRange),
    TopPages,
}

struct Params {
    period: Period,
    limit: usize,
}

pub struct PlatformTool {
    name: &'static str,
    description: &'static str,
    operation: Operation,
    clients: Arc<PlatformClients>,
}

impl PlatformTool {
    fn parse_params(&self, args: &ToolArgs) -> std::result::Result<Params, String> {
        let period = match args.get("period") {
            None | Some(Value::Null) => Period::Today,
            Some(Value::String(s)) => {
                Period::parse(s).ok_or_else(|| format!("Invalid period '{}'", s))?
            }
            Some(other) => return Err(format!("Invalid period {}", other)),
        };
        let limit = match args.get("limit") {
            None | Some(Value::Null) => DEFAULT_PAGE_LIMIT,
            Some(v) => v
                .as_u64()
                .map(|n| (n as usize).clamp(1, MAX_PAGE_LIMIT))
                .ok_or_else(|| format!("Invalid limit {}", v))?,
        };
        Ok(Params { period, limit })
    }

    async fn fetch(
        &self,
        account: Option<&str>,
        params: &Params,
    ) -> std::result::Result<ToolData, PlatformError> {
        let clients = &self.clients;
        let data = match self.operation {
            Operation::Spend(range) => {
                let report = clients.ads()?.spend(account, range).await?;
                ToolData::Spend {
                    spend: report.spend,
                    currency: report.currency,
                    range,
                }
            }
            Operation::Leads(range) => ToolData::Leads {
                leads: clients.ads()?.leads(account, range).await?,
                range,
            },
            Operation::BestCampaign => {
                let campaigns = clients
                    .ads()?
                    .campaign_breakdown(account, params.period.range())
                    .await?;
                ToolData::CampaignRanking {
                    period: params.period,
                    campaigns: rank_campaigns(campaigns),
                }
            }
            Operation::RunningAds => {
                let running = clients.ads()?.running_ads(account).await?;
                ToolData::RunningAds {
                    active: running.active,
                    with_spend_today: running.with_spend_today,
                }
            }
            Operation::BestPost => {
                let posts = clients.ads()?.top_posts(params.period.range()).await?;
                ToolData::BestPost {
                    period: params.period,
                    scanned: posts.len(),
                    post: best_post(posts),
                }
            }
            Operation::ActiveUsers(range) => ToolData::ActiveUsers {
                users: clients.analytics()?.active_users(range).await?,
                range,
            },
            Operation::Sessions(range) => ToolData::Sessions {
                sessions: clients.analytics()?.sessions(range).await?,
                range,
            },
            Operation::TopPages => ToolData::TopPages {
                range: DateRange::Last7Days,
                pages: clients
                    .analytics()?
                    .top_pages(DateRange::Last7Days, params.limit)
                    .await?,
            },
        };
        Ok(data)
    }

    async fn fallback(&self, args: &ToolArgs, primary: PlatformError) -> ToolResult {
        let Some(bridge) = &self.clients.bridge else {
            return ToolResult::failure(self.name, primary.to_string());
        };

        let timeout = self.clients.call_timeout;
        let secondary = match tokio::time::timeout(timeout, bridge.call(self.name, args)).await {
            Ok(Ok(payload)) => serde_json::from_value::<ToolData>(payload)
                .map_err(|e| format!("malformed bridge payload: {}", e))
                .and_then(|data| {
                    if self.operation.produces(&data) {
                        Ok(data)
                    } else {
                        Err(format!("bridge payload does not match tool {}", self.name))
                    }
                }),
            Ok(Err(e)) => Err(e.to_string()),
            Err(_) => Err(PlatformError::Timeout(timeout).to_string()),
        };

        match secondary {
            Ok(data) => {
                tracing::info!(tool = self.name, "Served by tool bridge fallback");
                ToolResult::success(self.name, data, DataSource::Fallback)
            }
            Err(mcp_error) => {
                tracing::warn!(tool = self.name, error = %mcp_error, "Tool bridge fallback failed");
                ToolResult::failure_with_fallback(self.name, primary.to_string(), mcp_error)
            }
        }
    }
}

#[async_trait]
impl ToolHandler for PlatformTool {
    fn name(&self) -> &str {
        self.name
    }

    fn description(&self) -> &str {
        self.description
    }

    fn input_schema(&self) -> Value {
        let mut properties = serde_json::Map::new();
        if self.operation.is_ads() {
            properties.insert(
                "account_id".to_string(),
                json!({
                    "type": "string",
                    "description": "Ad account to query; defaults to the caller's account"
                }),
            );
        }
        match self.operation {
            Operation::BestCampaign | Operation::BestPost => {
                properties.insert(
                    "period".to_string(),
                    json!({
                        "type": "string",
                        "enum": ["today", "this_month", "maximum"],
                        "description": "Reporting window (default today)"
                    }),
                );
            }
            Operation::TopPages => {
                properties.insert(
                    "limit".to_string(),
                    json!({
                        "type": "integer",
                        "minimum": 1,
                        "maximum": MAX_PAGE_LIMIT,
                        "description": "Number of pages to return (default 5)"
                    }),
                );
            }
            _ => {}
        }
        json!({ "type": "object", "properties": properties })
    }

    #[tracing::instrument(skip(self, args, context), fields(tool = self.name))]
    async fn execute(&self, args: &ToolArgs, context: &ToolContext) -> ToolResult {
        let params = match self.parse_params(args) {
            Ok(params) => params,
            Err(message) => return ToolResult::failure(self.name, message),
        };
        let account = context.account(args);

        let timeout = self.clients.call_timeout;
        let primary = match tokio::time::timeout(timeout, self.fetch(account, &params)).await {
            Ok(result) => result,
            Err(_) => Err(PlatformError::Timeout(timeout)),
        };

        match primary {
            Ok(data) => ToolResult::success(self.name, data, self.clients.source),
            Err(error) => {
                tracing::warn!(error = %error, "Primary retrieval failed");
                self.fallback(args, error).await
            }
        }
    }
}

impl Operation {
    /// Whether `data` is the payload family (and fixed window) this
    /// operation returns.
    fn produces(&self, data: &ToolData) -> bool {
        match (self, data) {
            (Operation::Spend(want), ToolData::Spend { range, .. })
            | (Operation::Leads(want), ToolData::Leads { range, .. })
            | (Operation::ActiveUsers(want), ToolData::ActiveUsers { range, .. })
            | (Operation::Sessions(want), ToolData::Sessions { range, .. }) => want == range,
            (Operation::BestCampaign, ToolData::CampaignRanking { .. })
            | (Operation::RunningAds, ToolData::RunningAds { .. })
            | (Operation::BestPost, ToolData::BestPost { .. })
            | (Operation::TopPages, ToolData::TopPages { .. }) => true,
            _ => false,
        }
    }

    fn is_ads(&self) -> bool {
        matches!(
            self,
            Operation::Spend(_)
                | Operation::Leads(_)
                | Operation::BestCampaign
                | Operation::RunningAds
                | Operation::BestPost
        )
    }
}

const CATALOG: &[(&str, &str, Operation)] = &[
    (
        names::META_SPEND_TODAY,
        "Total Meta Ads spend for today, with account currency",
        Operation::Spend(DateRange::Today),
    ),
    (
        names::META_SPEND_YESTERDAY,
        "Total Meta Ads spend for yesterday",
        Operation::Spend(DateRange::Yesterday),
    ),
    (
        names::META_SPEND_MONTH,
        "Total Meta Ads spend for the current calendar month so far",
        Operation::Spend(DateRange::ThisMonth),
    ),
    (
        names::META_LEADS_TODAY,
        "Number of Meta Ads leads generated today",
        Operation::Leads(DateRange::Today),
    ),
    (
        names::META_LEADS_MONTH,
        "Number of Meta Ads leads generated this month so far",
        Operation::Leads(DateRange::ThisMonth),
    ),
    (
        names::BEST_CAMPAIGN,
        "Campaigns ranked by leads (ties: lower CPC, then higher spend) for a period",
        Operation::BestCampaign,
    ),
    (
        names::META_RUNNING_ADS,
        "Count of active ads and how many of them have spent today",
        Operation::RunningAds,
    ),
    (
        names::BEST_SOCIAL_POST,
        "Highest-engagement Facebook page post for a period",
        Operation::BestPost,
    ),
    (
        names::GA4_ACTIVE_USERS_TODAY,
        "GA4 active users today",
        Operation::ActiveUsers(DateRange::Today),
    ),
    (
        names::GA4_ACTIVE_USERS_YESTERDAY,
        "GA4 active users yesterday",
        Operation::ActiveUsers(DateRange::Yesterday),
    ),
    (
        names::GA4_WEEKLY_ACTIVE_USERS,
        "GA4 active users over the last 7 days",
        Operation::ActiveUsers(DateRange::Last7Days),
    ),
    (
        names::GA4_SESSIONS_TODAY,
        "GA4 sessions today",
        Operation::Sessions(DateRange::Today),
    ),
    (
        names::GA4_SESSIONS_MONTH,
        "GA4 sessions this month so far",
        Operation::Sessions(DateRange::ThisMonth),
    ),
    (
        names::GA4_TOP_PAGES,
        "Most viewed website pages over the last 7 days",
        Operation::TopPages,
    ),
];

/// Register the full marketing catalog.
pub fn register_marketing_tools(registry: &mut ToolRegistry, clients: PlatformClients) -> Result<()> {
    let clients = Arc::new(clients);
    for &(name, description, operation) in CATALOG {
        registry.register(Arc::new(PlatformTool {
            name,
            description,
            operation,
            clients: Arc::clone(&clients),
        }))?;
    }
    tracing::info!(tools = registry.len(), "Marketing tool catalog registered");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platforms::{MockAdsClient, MockAnalyticsClient, RunningAds, SpendReport};
    use crate::tools::types::{CampaignStat, PostStat};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct DownAds;

    #[async_trait]
    impl AdsPlatformClient for DownAds {
        async fn spend(
            &self,
            _account: Option<&str>,
            _range: DateRange,
        ) -> std::result::Result<SpendReport, PlatformError> {
            Err(PlatformError::Network("connection refused".into()))
        }

        async fn leads(
            &self,
            _account: Option<&str>,
            _range: DateRange,
        ) -> std::result::Result<u64, PlatformError> {
            Err(PlatformError::RateLimited("quota".into()))
        }

        async fn campaign_breakdown(
            &self,
            _account: Option<&str>,
            _range: DateRange,
        ) -> std::result::Result<Vec<CampaignStat>, PlatformError> {
            Err(PlatformError::Network("down".into()))
        }

        async fn running_ads(
            &self,
            _account: Option<&str>,
        ) -> std::result::Result<RunningAds, PlatformError> {
            Err(PlatformError::Network("down".into()))
        }

        async fn top_posts(
            &self,
            _range: DateRange,
        ) -> std::result::Result<Vec<PostStat>, PlatformError> {
            Err(PlatformError::Network("down".into()))
        }
    }

    struct CountingBridge {
        calls: AtomicUsize,
        payload: std::result::Result<Value, PlatformError>,
    }

    #[async_trait]
    impl ToolCallBridge for CountingBridge {
        async fn call(
            &self,
            _tool: &str,
            _args: &ToolArgs,
        ) -> std::result::Result<Value, PlatformError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.payload.clone()
        }
    }

    fn clients(
        ads: Option<Arc<dyn AdsPlatformClient>>,
        bridge: Option<Arc<dyn ToolCallBridge>>,
    ) -> PlatformClients {
        PlatformClients {
            ads,
            analytics: Some(Arc::new(MockAnalyticsClient)),
            bridge,
            source: DataSource::Mock,
            call_timeout: Duration::from_secs(5),
        }
    }

    fn registry(clients: PlatformClients) -> ToolRegistry {
        let mut registry = ToolRegistry::new();
        register_marketing_tools(&mut registry, clients).unwrap();
        registry
    }

    #[test]
    fn test_catalog_names_unique_and_complete() {
        let registry = registry(clients(Some(Arc::new(MockAdsClient)), None));
        assert_eq!(registry.len(), 14);
        assert!(registry.contains(names::BEST_CAMPAIGN));
        assert!(registry.contains(names::GA4_TOP_PAGES));
    }

    #[tokio::test]
    async fn test_missing_ads_client_is_config_error() {
        let registry = registry(clients(None, None));
        let result = registry
            .run_by_name(names::META_SPEND_TODAY, &json!({}), &ToolContext::default())
            .await;
        assert!(result.error().unwrap().contains("META_ACCESS_TOKEN"));
    }

    #[tokio::test]
    async fn test_best_campaign_is_ranked() {
        let registry = registry(clients(Some(Arc::new(MockAdsClient)), None));
        let result = registry
            .run_by_name(
                names::BEST_CAMPAIGN,
                &json!({"period": "this_month"}),
                &ToolContext::default(),
            )
            .await;
        match result.data() {
            Some(ToolData::CampaignRanking { period, campaigns }) => {
                assert_eq!(*period, Period::ThisMonth);
                assert_eq!(campaigns[0].name, "Lead Gen - Mumbai");
                assert!(campaigns[0].cpl.is_some());
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_invalid_period_fails_without_fallback() {
        let bridge = Arc::new(CountingBridge {
            calls: AtomicUsize::new(0),
            payload: Ok(json!({})),
        });
        let registry = registry(clients(Some(Arc::new(MockAdsClient)), Some(bridge.clone())));
        let result = registry
            .run_by_name(names::BEST_CAMPAIGN, &json!({"period": "decade"}), &ToolContext::default())
            .await;
        assert_eq!(result.error(), Some("Invalid period 'decade'"));
        assert_eq!(bridge.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_bridge_serves_when_primary_fails() {
        let bridge = Arc::new(CountingBridge {
            calls: AtomicUsize::new(0),
            payload: Ok(json!({"kind": "spend", "spend": 99.5, "currency": "USD", "range": "today"})),
        });
        let registry = registry(clients(Some(Arc::new(DownAds)), Some(bridge.clone())));
        let result = registry
            .run_by_name(names::META_SPEND_TODAY, &json!({}), &ToolContext::default())
            .await;

        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["source"], json!("fallback"));
        assert_eq!(value["spend"], json!(99.5));
        assert_eq!(bridge.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_both_errors_preserved_when_bridge_fails() {
        let bridge = Arc::new(CountingBridge {
            calls: AtomicUsize::new(0),
            payload: Err(PlatformError::Auth("bridge token expired".into())),
        });
        let registry = registry(clients(Some(Arc::new(DownAds)), Some(bridge)));
        let result = registry
            .run_by_name(names::META_LEADS_TODAY, &json!({}), &ToolContext::default())
            .await;

        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["ok"], json!(false));
        assert_eq!(value["primary_error"], json!("rate limited: quota"));
        assert_eq!(
            value["mcp_error"],
            json!("authentication failed: bridge token expired")
        );
    }

    #[tokio::test]
    async fn test_bridge_payload_of_another_tool_is_rejected() {
        let bridge = Arc::new(CountingBridge {
            calls: AtomicUsize::new(0),
            payload: Ok(json!({"kind": "leads", "leads": 7, "range": "today"})),
        });
        let registry = registry(clients(Some(Arc::new(DownAds)), Some(bridge.clone())));
        let result = registry
            .run_by_name(names::META_SPEND_TODAY, &json!({}), &ToolContext::default())
            .await;

        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["ok"], json!(false));
        assert_eq!(value["primary_error"], json!("network error: connection refused"));
        assert_eq!(
            value["mcp_error"],
            json!("bridge payload does not match tool get_meta_spend_today")
        );
        assert_eq!(bridge.calls.load(Ordering::SeqCst), 1);

        let wrong_window = Arc::new(CountingBridge {
            calls: AtomicUsize::new(0),
            payload: Ok(json!({"kind": "spend", "spend": 1.0, "currency": "USD", "range": "this_month"})),
        });
        let monthly = self::registry(clients(Some(Arc::new(DownAds)), Some(wrong_window)));
        let result = monthly
            .run_by_name(names::META_SPEND_TODAY, &json!({}), &ToolContext::default())
            .await;
        assert!(!result.is_ok());
    }

    #[tokio::test]
    async fn test_top_pages_limit_is_clamped() {
        let registry = registry(clients(Some(Arc::new(MockAdsClient)), None));
        let result = registry
            .run_by_name(names::GA4_TOP_PAGES, &json!({"limit": 0}), &ToolContext::default())
            .await;
        match result.data() {
            Some(ToolData::TopPages { pages, .. }) => assert_eq!(pages.len(), 1),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_schema_exposes_period_enum() {
        let registry = registry(clients(Some(Arc::new(MockAdsClient)), None));
        let schema = registry.get(names::BEST_CAMPAIGN).unwrap().input_schema();
        assert_eq!(
            schema["properties"]["period"]["enum"],
            json!(["today", "this_month", "maximum"])
        );
        assert!(schema["properties"]["account_id"].is_object());
    }
}
