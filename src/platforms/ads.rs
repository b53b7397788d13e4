//! Paid-ads reporting: the [`AdsPlatformClient`] contract, a Meta Graph API
//! implementation and a deterministic mock.

use crate::error::PlatformError;
use crate::tools::types::{CampaignStat, DateRange, PostStat};
use async_trait::async_trait;
use chrono::{Datelike, Local, NaiveDate, TimeZone};
use serde_json::Value;
use std::time::Duration;

pub const GRAPH_BASE_URL: &str = "https://graph.facebook.com";

/// Preferred lead action types, most specific aggregate first.
const LEAD_ACTION_TYPES: &[&str] = &[
    "lead",
    "onsite_conversion.lead_grouped",
    "offsite_conversion.fb_pixel_lead",
];

#[derive(Debug, Clone, PartialEq)]
pub struct SpendReport {
    pub spend: f64,
    pub currency: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunningAds {
    pub active: u64,
    pub with_spend_today: u64,
}

#[async_trait]
pub trait AdsPlatformClient: Send + Sync {
    async fn spend(&self, account: Option<&str>, range: DateRange)
        -> Result<SpendReport, PlatformError>;

    async fn leads(&self, account: Option<&str>, range: DateRange) -> Result<u64, PlatformError>;

    /// Per-campaign results, in platform order (unranked).
    async fn campaign_breakdown(
        &self,
        account: Option<&str>,
        range: DateRange,
    ) -> Result<Vec<CampaignStat>, PlatformError>;

    async fn running_ads(&self, account: Option<&str>) -> Result<RunningAds, PlatformError>;

    /// Organic page posts published within `range`, newest first.
    async fn top_posts(&self, range: DateRange) -> Result<Vec<PostStat>, PlatformError>;
}

#[derive(Debug, Clone)]
pub struct MetaAdsConfig {
    pub access_token: String,
    pub ad_account_id: String,
    pub page_id: Option<String>,
    pub page_token: Option<String>,
    pub api_version: String,
    pub base_url: String,
}

pub struct MetaAdsClient {
    http: reqwest::Client,
    config: MetaAdsConfig,
}

impl MetaAdsClient {
    pub fn new(config: MetaAdsConfig, timeout: Duration) -> Result<Self, PlatformError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PlatformError::Network(e.to_string()))?;

        tracing::info!(
            api_version = %config.api_version,
            page_configured = config.page_id.is_some(),
            "Meta Ads client initialized"
        );

        Ok(Self { http, config })
    }

    fn account_node(&self, account: Option<&str>) -> String {
        let id = account.unwrap_or(&self.config.ad_account_id);
        if id.starts_with("act_") {
            id.to_string()
        } else {
            format!("act_{}", id)
        }
    }

    async fn get_json(
        &self,
        path: &str,
        query: &[(&str, String)],
        token: &str,
    ) -> Result<Value, PlatformError> {
        let url = format!(
            "{}/{}/{}",
            self.config.base_url.trim_end_matches('/'),
            self.config.api_version,
            path
        );

        let response = self
            .http
            .get(&url)
            .query(query)
            .query(&[("access_token", token)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PlatformError::from_status(status.as_u16(), body));
        }

        Ok(response.json::<Value>().await?)
    }

    async fn insights(
        &self,
        account: Option<&str>,
        range: DateRange,
        fields: &str,
        level: Option<&str>,
    ) -> Result<Vec<Value>, PlatformError> {
        let mut query = vec![
            ("fields", fields.to_string()),
            ("date_preset", date_preset(range).to_string()),
            ("limit", "500".to_string()),
        ];
        if let Some(level) = level {
            query.push(("level", level.to_string()));
        }

        let path = format!("{}/insights", self.account_node(account));
        let body = self
            .get_json(&path, &query, &self.config.access_token)
            .await?;
        data_rows(&body)
    }
}

#[async_trait]
impl AdsPlatformClient for MetaAdsClient {
    async fn spend(
        &self,
        account: Option<&str>,
        range: DateRange,
    ) -> Result<SpendReport, PlatformError> {
        let rows = self
            .insights(account, range, "spend,account_currency", None)
            .await?;
        Ok(parse_spend(&rows))
    }

    async fn leads(&self, account: Option<&str>, range: DateRange) -> Result<u64, PlatformError> {
        let rows = self.insights(account, range, "actions", None).await?;
        Ok(rows.iter().map(lead_count).sum())
    }

    async fn campaign_breakdown(
        &self,
        account: Option<&str>,
        range: DateRange,
    ) -> Result<Vec<CampaignStat>, PlatformError> {
        let rows = self
            .insights(
                account,
                range,
                "campaign_id,campaign_name,spend,cpc,actions",
                Some("campaign"),
            )
            .await?;
        Ok(rows.iter().filter_map(parse_campaign).collect())
    }

    async fn running_ads(&self, account: Option<&str>) -> Result<RunningAds, PlatformError> {
        let path = format!("{}/ads", self.account_node(account));
        let query = [
            ("fields", "id".to_string()),
            ("effective_status", "[\"ACTIVE\"]".to_string()),
            ("limit", "500".to_string()),
        ];
        let ads = self
            .get_json(&path, &query, &self.config.access_token)
            .await?;
        let active = data_rows(&ads)?.len() as u64;

        let spend_rows = self
            .insights(account, DateRange::Today, "ad_id,spend", Some("ad"))
            .await?;
        let with_spend_today = spend_rows
            .iter()
            .filter(|row| number_field(row, "spend") > 0.0)
            .count() as u64;

        Ok(RunningAds {
            active,
            with_spend_today,
        })
    }

    async fn top_posts(&self, range: DateRange) -> Result<Vec<PostStat>, PlatformError> {
        let page_id = self.config.page_id.as_deref().ok_or_else(|| {
            PlatformError::NotConfigured(
                "Facebook page is not configured (set META_PAGE_ID)".to_string(),
            )
        })?;
        let token = self
            .config
            .page_token
            .as_deref()
            .unwrap_or(&self.config.access_token);

        let mut query = vec![
            (
                "fields",
                "id,message,permalink_url,reactions.summary(true).limit(0),comments.summary(true).limit(0),shares"
                    .to_string(),
            ),
            ("limit", "50".to_string()),
        ];
        if let Some(since) = since_timestamp(range, Local::now().date_naive()) {
            query.push(("since", since.to_string()));
        }

        let body = self
            .get_json(&format!("{}/posts", page_id), &query, token)
            .await?;
        Ok(data_rows(&body)?.iter().filter_map(parse_post).collect())
    }
}

fn date_preset(range: DateRange) -> &'static str {
    match range {
        DateRange::Today => "today",
        DateRange::Yesterday => "yesterday",
        DateRange::ThisMonth => "this_month",
        DateRange::Last7Days => "last_7d",
        DateRange::Maximum => "maximum",
    }
}

/// Unix timestamp of the window start, or `None` for an unbounded window.
fn since_timestamp(range: DateRange, today: NaiveDate) -> Option<i64> {
    let start = match range {
        DateRange::Today => today,
        DateRange::Yesterday => today.pred_opt()?,
        DateRange::ThisMonth => today.with_day(1)?,
        DateRange::Last7Days => today - chrono::Duration::days(7),
        DateRange::Maximum => return None,
    };
    let midnight = start.and_hms_opt(0, 0, 0)?;
    Local
        .from_local_datetime(&midnight)
        .earliest()
        .map(|dt| dt.timestamp())
}

fn data_rows(body: &Value) -> Result<Vec<Value>, PlatformError> {
    body.get("data")
        .and_then(Value::as_array)
        .cloned()
        .ok_or_else(|| PlatformError::Malformed("expected 'data' array".to_string()))
}

/// Graph API numbers arrive as strings ("12.34"); accept both.
fn number_field(row: &Value, key: &str) -> f64 {
    match row.get(key) {
        Some(Value::String(s)) => s.parse().unwrap_or(0.0),
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        _ => 0.0,
    }
}

fn optional_number(row: &Value, key: &str) -> Option<f64> {
    row.get(key).map(|_| number_field(row, key)).filter(|v| *v > 0.0)
}

fn parse_spend(rows: &[Value]) -> SpendReport {
    let spend = rows.iter().map(|row| number_field(row, "spend")).sum();
    let currency = rows
        .iter()
        .find_map(|row| row.get("account_currency").and_then(Value::as_str))
        .unwrap_or("USD")
        .to_string();
    SpendReport { spend, currency }
}

fn lead_count(row: &Value) -> u64 {
    let Some(actions) = row.get("actions").and_then(Value::as_array) else {
        return 0;
    };

    LEAD_ACTION_TYPES
        .iter()
        .find_map(|wanted| {
            actions
                .iter()
                .find(|a| a.get("action_type").and_then(Value::as_str) == Some(*wanted))
                .map(|a| number_field(a, "value") as u64)
        })
        .unwrap_or(0)
}

fn parse_campaign(row: &Value) -> Option<CampaignStat> {
    let id = row.get("campaign_id").and_then(Value::as_str)?;
    let name = row
        .get("campaign_name")
        .and_then(Value::as_str)
        .unwrap_or(id);
    let leads = lead_count(row);
    let spend = number_field(row, "spend");

    Some(CampaignStat {
        id: id.to_string(),
        name: name.to_string(),
        leads,
        spend,
        cpc: optional_number(row, "cpc"),
        cpl: (leads > 0).then(|| spend / leads as f64),
    })
}

fn summary_count(row: &Value, edge: &str) -> u64 {
    row.get(edge)
        .and_then(|e| e.get("summary"))
        .and_then(|s| s.get("total_count"))
        .and_then(Value::as_u64)
        .unwrap_or(0)
}

fn parse_post(row: &Value) -> Option<PostStat> {
    let id = row.get("id").and_then(Value::as_str)?;
    Some(PostStat {
        id: id.to_string(),
        message: row.get("message").and_then(Value::as_str).map(str::to_string),
        permalink: row
            .get("permalink_url")
            .and_then(Value::as_str)
            .map(str::to_string),
        reactions: summary_count(row, "reactions"),
        comments: summary_count(row, "comments"),
        shares: row
            .get("shares")
            .and_then(|s| s.get("count"))
            .and_then(Value::as_u64)
            .unwrap_or(0),
    })
}

/// Fixed sample account used in demo mode.
#[derive(Debug, Default, Clone)]
pub struct MockAdsClient;

#[async_trait]
impl AdsPlatformClient for MockAdsClient {
    async fn spend(
        &self,
        _account: Option<&str>,
        range: DateRange,
    ) -> Result<SpendReport, PlatformError> {
        let spend = match range {
            DateRange::Today => 1250.0,
            DateRange::Yesterday => 1420.5,
            DateRange::ThisMonth => 28640.0,
            DateRange::Last7Days => 8915.25,
            DateRange::Maximum => 412_380.0,
        };
        Ok(SpendReport {
            spend,
            currency: "INR".to_string(),
        })
    }

    async fn leads(&self, _account: Option<&str>, range: DateRange) -> Result<u64, PlatformError> {
        Ok(match range {
            DateRange::Today => 18,
            DateRange::Yesterday => 21,
            DateRange::ThisMonth => 402,
            DateRange::Last7Days => 131,
            DateRange::Maximum => 5_870,
        })
    }

    async fn campaign_breakdown(
        &self,
        _account: Option<&str>,
        range: DateRange,
    ) -> Result<Vec<CampaignStat>, PlatformError> {
        let scale = match range {
            DateRange::Today | DateRange::Yesterday => 1.0,
            DateRange::Last7Days => 7.0,
            DateRange::ThisMonth => 22.0,
            DateRange::Maximum => 320.0,
        };
        let campaign = |id: &str, name: &str, leads: f64, spend: f64, cpc: f64| CampaignStat {
            id: id.to_string(),
            name: name.to_string(),
            leads: (leads * scale) as u64,
            spend: spend * scale,
            cpc: Some(cpc),
            cpl: None,
        };
        Ok(vec![
            campaign("120210001", "Lead Gen - Mumbai", 8.0, 420.0, 6.8),
            campaign("120210002", "Retargeting - Site Visitors", 6.0, 310.0, 4.9),
            campaign("120210003", "Brand Awareness", 1.0, 290.0, 9.4),
            campaign("120210004", "Lookalike 1%", 3.0, 230.0, 7.1),
        ])
    }

    async fn running_ads(&self, _account: Option<&str>) -> Result<RunningAds, PlatformError> {
        Ok(RunningAds {
            active: 12,
            with_spend_today: 9,
        })
    }

    async fn top_posts(&self, _range: DateRange) -> Result<Vec<PostStat>, PlatformError> {
        let post = |id: &str, message: &str, reactions, comments, shares| PostStat {
            id: id.to_string(),
            message: Some(message.to_string()),
            permalink: None,
            reactions,
            comments,
            shares,
        };
        Ok(vec![
            post("p_3", "Weekend offer: free consultation", 142, 31, 12),
            post("p_2", "Behind the scenes at our studio", 96, 12, 4),
            post("p_1", "Customer story: 3x more enquiries", 188, 40, 25),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_spend_sums_rows_and_reads_currency() {
        let rows = vec![
            json!({"spend": "1000.50", "account_currency": "INR"}),
            json!({"spend": "249.50"}),
        ];
        let report = parse_spend(&rows);
        assert_eq!(report.spend, 1250.0);
        assert_eq!(report.currency, "INR");
    }

    #[test]
    fn test_parse_spend_empty_window() {
        let report = parse_spend(&[]);
        assert_eq!(report.spend, 0.0);
        assert_eq!(report.currency, "USD");
    }

    #[test]
    fn test_lead_count_prefers_aggregate_action() {
        let row = json!({"actions": [
            {"action_type": "link_click", "value": "300"},
            {"action_type": "onsite_conversion.lead_grouped", "value": "9"},
            {"action_type": "lead", "value": "11"}
        ]});
        assert_eq!(lead_count(&row), 11);

        let grouped_only = json!({"actions": [
            {"action_type": "onsite_conversion.lead_grouped", "value": "9"}
        ]});
        assert_eq!(lead_count(&grouped_only), 9);
        assert_eq!(lead_count(&json!({})), 0);
    }

    #[test]
    fn test_parse_campaign_derives_cpl() {
        let row = json!({
            "campaign_id": "42",
            "campaign_name": "Spring Promo",
            "spend": "200",
            "cpc": "1.25",
            "actions": [{"action_type": "lead", "value": "8"}]
        });
        let campaign = parse_campaign(&row).unwrap();
        assert_eq!(campaign.name, "Spring Promo");
        assert_eq!(campaign.leads, 8);
        assert_eq!(campaign.cpc, Some(1.25));
        assert_eq!(campaign.cpl, Some(25.0));

        assert!(parse_campaign(&json!({"campaign_name": "no id"})).is_none());
    }

    #[test]
    fn test_parse_post_counts_engagement() {
        let row = json!({
            "id": "123_456",
            "message": "Hello",
            "reactions": {"summary": {"total_count": 10}},
            "comments": {"summary": {"total_count": 3}},
            "shares": {"count": 2}
        });
        let post = parse_post(&row).unwrap();
        assert_eq!(post.engagement(), 15);
    }

    #[test]
    fn test_data_rows_rejects_missing_data() {
        assert!(matches!(
            data_rows(&json!({"error": {}})),
            Err(PlatformError::Malformed(_))
        ));
    }

    #[test]
    fn test_since_timestamp_windows() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        assert!(since_timestamp(DateRange::Maximum, today).is_none());
        let month = since_timestamp(DateRange::ThisMonth, today).unwrap();
        let day = since_timestamp(DateRange::Today, today).unwrap();
        assert!(month < day);
    }
}
