//! Type definitions shared by the tool registry, the platform clients and
//! the response formatters.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::cmp::Ordering;

/// Per-call tool arguments. Always a JSON object; may carry `account_id`
/// to scope the call to one ad account.
pub type ToolArgs = Map<String, Value>;

/// Caller context forwarded from the HTTP layer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolContext {
    pub tenant_id: Option<String>,
    pub role: Option<String>,
}

impl ToolContext {
    pub fn for_tenant(tenant_id: impl Into<String>) -> Self {
        Self {
            tenant_id: Some(tenant_id.into()),
            role: None,
        }
    }

    /// Account to query: explicit `account_id` argument first, then tenant.
    pub fn account<'a>(&'a self, args: &'a ToolArgs) -> Option<&'a str> {
        args.get("account_id")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .or(self.tenant_id.as_deref())
    }
}

/// A resolved request to run one tool with the given arguments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub name: String,
    pub args: Value,
}

impl ToolCall {
    /// Call with no arguments.
    pub fn bare(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: Value::Object(Map::new()),
        }
    }

    pub fn with_period(name: impl Into<String>, period: Period) -> Self {
        let mut args = Map::new();
        args.insert("period".to_string(), Value::String(period.as_str().to_string()));
        Self {
            name: name.into(),
            args: Value::Object(args),
        }
    }
}

/// Reporting window understood by both platforms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateRange {
    Today,
    Yesterday,
    ThisMonth,
    Last7Days,
    Maximum,
}

impl DateRange {
    /// Phrase used in rendered answers ("Your Meta spend today ...").
    pub fn phrase(&self) -> &'static str {
        match self {
            DateRange::Today => "today",
            DateRange::Yesterday => "yesterday",
            DateRange::ThisMonth => "this month so far",
            DateRange::Last7Days => "over the last 7 days",
            DateRange::Maximum => "all time",
        }
    }
}

/// Time window selectable by the user for "best campaign/post" questions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Period {
    Today,
    ThisMonth,
    Maximum,
}

impl Period {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "today" => Some(Period::Today),
            "this_month" | "month" => Some(Period::ThisMonth),
            "maximum" | "lifetime" | "all_time" => Some(Period::Maximum),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Period::Today => "today",
            Period::ThisMonth => "this_month",
            Period::Maximum => "maximum",
        }
    }

    pub fn range(&self) -> DateRange {
        match self {
            Period::Today => DateRange::Today,
            Period::ThisMonth => DateRange::ThisMonth,
            Period::Maximum => DateRange::Maximum,
        }
    }

    pub fn phrase(&self) -> &'static str {
        match self {
            Period::Today => "today",
            Period::ThisMonth => "this month",
            Period::Maximum => "of all time",
        }
    }
}

/// Where a successful result came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSource {
    Live,
    Mock,
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CampaignStat {
    pub id: String,
    pub name: String,
    pub leads: u64,
    pub spend: f64,
    #[serde(default)]
    pub cpc: Option<f64>,
    #[serde(default)]
    pub cpl: Option<f64>,
}

impl CampaignStat {
    /// Reported CPL, or spend/leads when the platform did not supply one.
    pub fn effective_cpl(&self) -> Option<f64> {
        self.cpl.or_else(|| (self.leads > 0).then(|| self.spend / self.leads as f64))
    }
}

/// Ranking order for "best campaign": more leads first, then the cheaper
/// click (missing CPC last), then the larger spend.
pub fn compare_campaigns(a: &CampaignStat, b: &CampaignStat) -> Ordering {
    b.leads
        .cmp(&a.leads)
        .then_with(|| match (a.cpc, b.cpc) {
            (Some(x), Some(y)) => x.total_cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        })
        .then_with(|| b.spend.total_cmp(&a.spend))
}

/// Sort campaigns best-first and fill in derived CPL.
pub fn rank_campaigns(mut campaigns: Vec<CampaignStat>) -> Vec<CampaignStat> {
    campaigns.sort_by(compare_campaigns);
    for campaign in &mut campaigns {
        campaign.cpl = campaign.effective_cpl();
    }
    campaigns
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostStat {
    pub id: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub permalink: Option<String>,
    pub reactions: u64,
    pub comments: u64,
    pub shares: u64,
}

impl PostStat {
    pub fn engagement(&self) -> u64 {
        self.reactions + self.comments + self.shares
    }
}

/// Highest-engagement post; ties keep the earlier (newer) post.
pub fn best_post(posts: Vec<PostStat>) -> Option<PostStat> {
    posts
        .into_iter()
        .reduce(|best, next| if next.engagement() > best.engagement() { next } else { best })
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageStat {
    pub path: String,
    pub views: u64,
}

/// Domain payload of a successful tool call, one variant per tool family.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ToolData {
    Spend {
        spend: f64,
        currency: String,
        range: DateRange,
    },
    Leads {
        leads: u64,
        range: DateRange,
    },
    CampaignRanking {
        period: Period,
        campaigns: Vec<CampaignStat>,
    },
    RunningAds {
        active: u64,
        with_spend_today: u64,
    },
    BestPost {
        period: Period,
        post: Option<PostStat>,
        scanned: usize,
    },
    ActiveUsers {
        users: u64,
        range: DateRange,
    },
    Sessions {
        sessions: u64,
        range: DateRange,
    },
    TopPages {
        range: DateRange,
        pages: Vec<PageStat>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolSuccess {
    pub ok: bool,
    pub tool: String,
    #[serde(flatten)]
    pub data: ToolData,
    pub source: DataSource,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolFailure {
    pub ok: bool,
    pub tool: String,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary_error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mcp_error: Option<String>,
}

/// Uniform result envelope. Every variant carries the originating tool name
/// so formatters can dispatch without inspecting the payload shape.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ToolResult {
    Ok(ToolSuccess),
    Err(ToolFailure),
}

impl ToolResult {
    pub fn success(tool: impl Into<String>, data: ToolData, source: DataSource) -> Self {
        ToolResult::Ok(ToolSuccess {
            ok: true,
            tool: tool.into(),
            data,
            source,
        })
    }

    pub fn failure(tool: impl Into<String>, error: impl Into<String>) -> Self {
        ToolResult::Err(ToolFailure {
            ok: false,
            tool: tool.into(),
            error: error.into(),
            primary_error: None,
            mcp_error: None,
        })
    }

    /// Failure after both the primary client and the bridge were tried.
    pub fn failure_with_fallback(
        tool: impl Into<String>,
        primary_error: String,
        mcp_error: String,
    ) -> Self {
        ToolResult::Err(ToolFailure {
            ok: false,
            tool: tool.into(),
            error: format!("{}; fallback also failed: {}", primary_error, mcp_error),
            primary_error: Some(primary_error),
            mcp_error: Some(mcp_error),
        })
    }

    pub fn tool(&self) -> &str {
        match self {
            ToolResult::Ok(s) => &s.tool,
            ToolResult::Err(f) => &f.tool,
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, ToolResult::Ok(_))
    }

    pub fn data(&self) -> Option<&ToolData> {
        match self {
            ToolResult::Ok(s) => Some(&s.data),
            ToolResult::Err(_) => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            ToolResult::Ok(_) => None,
            ToolResult::Err(f) => Some(&f.error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn campaign(id: &str, leads: u64, cpc: Option<f64>, spend: f64) -> CampaignStat {
        CampaignStat {
            id: id.to_string(),
            name: format!("Campaign {}", id),
            leads,
            spend,
            cpc,
            cpl: None,
        }
    }

    #[test]
    fn test_tie_break_prefers_lower_cpc() {
        let ranked = rank_campaigns(vec![
            campaign("a", 10, Some(2.0), 100.0),
            campaign("b", 10, Some(1.0), 100.0),
            campaign("c", 5, Some(0.5), 100.0),
        ]);
        assert_eq!(ranked[0].id, "b");
        assert_eq!(ranked[1].id, "a");
        assert_eq!(ranked[2].id, "c");
    }

    #[test]
    fn test_missing_cpc_sorts_last_then_spend_desc() {
        let ranked = rank_campaigns(vec![
            campaign("no-cpc", 4, None, 900.0),
            campaign("low-spend", 4, Some(3.0), 50.0),
            campaign("high-spend", 4, Some(3.0), 75.0),
        ]);
        let ids: Vec<&str> = ranked.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["high-spend", "low-spend", "no-cpc"]);
    }

    #[test]
    fn test_rank_fills_cpl() {
        let ranked = rank_campaigns(vec![campaign("a", 4, None, 100.0), campaign("z", 0, None, 10.0)]);
        assert_eq!(ranked[0].cpl, Some(25.0));
        assert_eq!(ranked[1].cpl, None);
    }

    #[test]
    fn test_best_post_by_engagement() {
        let post = |id: &str, reactions| PostStat {
            id: id.to_string(),
            message: None,
            permalink: None,
            reactions,
            comments: 1,
            shares: 0,
        };
        let best = best_post(vec![post("p1", 5), post("p2", 9), post("p3", 9)]).unwrap();
        assert_eq!(best.id, "p2");
        assert!(best_post(vec![]).is_none());
    }

    #[test]
    fn test_success_envelope_shape() {
        let result = ToolResult::success(
            "get_meta_spend_today",
            ToolData::Spend {
                spend: 1250.0,
                currency: "USD".into(),
                range: DateRange::Today,
            },
            DataSource::Live,
        );
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["ok"], json!(true));
        assert_eq!(value["tool"], json!("get_meta_spend_today"));
        assert_eq!(value["kind"], json!("spend"));
        assert_eq!(value["spend"], json!(1250.0));
        assert_eq!(value["source"], json!("live"));
    }

    #[test]
    fn test_failure_envelope_shape() {
        let result = ToolResult::failure_with_fallback(
            "get_meta_leads_today",
            "network error: refused".into(),
            "bridge down".into(),
        );
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["ok"], json!(false));
        assert_eq!(value["primary_error"], json!("network error: refused"));
        assert_eq!(value["mcp_error"], json!("bridge down"));

        let plain = serde_json::to_value(ToolResult::failure("x", "Unknown tool")).unwrap();
        assert!(plain.get("primary_error").is_none());
    }

    #[test]
    fn test_tool_data_parses_from_bridge_json() {
        let data: ToolData =
            serde_json::from_value(json!({"kind": "leads", "leads": 7, "range": "today"})).unwrap();
        assert_eq!(
            data,
            ToolData::Leads {
                leads: 7,
                range: DateRange::Today
            }
        );
    }

    #[test]
    fn test_context_account_resolution() {
        let ctx = ToolContext::for_tenant("act_1");
        let mut args = ToolArgs::new();
        assert_eq!(ctx.account(&args), Some("act_1"));
        args.insert("account_id".into(), json!("act_2"));
        assert_eq!(ctx.account(&args), Some("act_2"));
    }
}
