//! Web analytics reporting: the [`AnalyticsPlatformClient`] contract, a GA4
//! Data API implementation and a deterministic mock.

use crate::error::PlatformError;
use crate::tools::types::{DateRange, PageStat};
use async_trait::async_trait;
use chrono::{Datelike, Local, NaiveDate};
use serde_json::{json, Value};
use std::time::Duration;

pub const GA4_BASE_URL: &str = "https://analyticsdata.googleapis.com";

/// Earliest date the GA4 Data API accepts.
const GA4_EPOCH: &str = "2015-08-14";

#[async_trait]
pub trait AnalyticsPlatformClient: Send + Sync {
    async fn active_users(&self, range: DateRange) -> Result<u64, PlatformError>;

    async fn sessions(&self, range: DateRange) -> Result<u64, PlatformError>;

    async fn top_pages(&self, range: DateRange, limit: usize)
        -> Result<Vec<PageStat>, PlatformError>;
}

#[derive(Debug, Clone)]
pub struct Ga4Config {
    pub property_id: String,
    pub access_token: String,
    pub base_url: String,
}

pub struct Ga4Client {
    http: reqwest::Client,
    config: Ga4Config,
}

impl Ga4Client {
    pub fn new(config: Ga4Config, timeout: Duration) -> Result<Self, PlatformError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PlatformError::Network(e.to_string()))?;

        tracing::info!(property_id = %config.property_id, "GA4 client initialized");

        Ok(Self { http, config })
    }

    async fn run_report(&self, body: Value) -> Result<Value, PlatformError> {
        let url = format!(
            "{}/v1beta/properties/{}:runReport",
            self.config.base_url.trim_end_matches('/'),
            self.config.property_id
        );

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.config.access_token)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PlatformError::from_status(status.as_u16(), body));
        }

        Ok(response.json::<Value>().await?)
    }

    async fn single_metric(&self, metric: &str, range: DateRange) -> Result<u64, PlatformError> {
        let (start, end) = report_dates(range, Local::now().date_naive());
        let report = self
            .run_report(json!({
                "dateRanges": [{ "startDate": start, "endDate": end }],
                "metrics": [{ "name": metric }],
            }))
            .await?;
        parse_metric_total(&report)
    }
}

#[async_trait]
impl AnalyticsPlatformClient for Ga4Client {
    async fn active_users(&self, range: DateRange) -> Result<u64, PlatformError> {
        self.single_metric("activeUsers", range).await
    }

    async fn sessions(&self, range: DateRange) -> Result<u64, PlatformError> {
        self.single_metric("sessions", range).await
    }

    async fn top_pages(
        &self,
        range: DateRange,
        limit: usize,
    ) -> Result<Vec<PageStat>, PlatformError> {
        let (start, end) = report_dates(range, Local::now().date_naive());
        let report = self
            .run_report(json!({
                "dateRanges": [{ "startDate": start, "endDate": end }],
                "dimensions": [{ "name": "pagePath" }],
                "metrics": [{ "name": "screenPageViews" }],
                "orderBys": [{ "metric": { "metricName": "screenPageViews" }, "desc": true }],
                "limit": limit,
            }))
            .await?;
        parse_pages(&report)
    }
}

fn report_dates(range: DateRange, today: NaiveDate) -> (String, String) {
    let (start, end) = match range {
        DateRange::Today => ("today".to_string(), "today"),
        DateRange::Yesterday => ("yesterday".to_string(), "yesterday"),
        DateRange::Last7Days => ("7daysAgo".to_string(), "yesterday"),
        DateRange::ThisMonth => {
            let first = today.with_day(1).unwrap_or(today);
            (first.format("%Y-%m-%d").to_string(), "today")
        }
        DateRange::Maximum => (GA4_EPOCH.to_string(), "today"),
    };
    (start, end.to_string())
}

fn parse_metric_total(report: &Value) -> Result<u64, PlatformError> {
    let Some(rows) = report.get("rows").and_then(Value::as_array) else {
        // GA4 omits `rows` entirely when the window has no data.
        return Ok(0);
    };
    rows.first()
        .and_then(|row| row.get("metricValues"))
        .and_then(|values| values.get(0))
        .and_then(|v| v.get("value"))
        .and_then(Value::as_str)
        .map(|s| s.parse::<u64>().unwrap_or(0))
        .ok_or_else(|| PlatformError::Malformed("missing metricValues in GA4 report".to_string()))
}

fn parse_pages(report: &Value) -> Result<Vec<PageStat>, PlatformError> {
    let Some(rows) = report.get("rows").and_then(Value::as_array) else {
        return Ok(Vec::new());
    };

    rows.iter()
        .map(|row| {
            let path = row
                .get("dimensionValues")
                .and_then(|d| d.get(0))
                .and_then(|d| d.get("value"))
                .and_then(Value::as_str);
            let views = row
                .get("metricValues")
                .and_then(|m| m.get(0))
                .and_then(|m| m.get("value"))
                .and_then(Value::as_str)
                .and_then(|s| s.parse::<u64>().ok());
            match (path, views) {
                (Some(path), Some(views)) => Ok(PageStat {
                    path: path.to_string(),
                    views,
                }),
                _ => Err(PlatformError::Malformed(
                    "GA4 page row missing dimension or metric".to_string(),
                )),
            }
        })
        .collect()
}

/// Fixed sample property used in demo mode.
#[derive(Debug, Default, Clone)]
pub struct MockAnalyticsClient;

#[async_trait]
impl AnalyticsPlatformClient for MockAnalyticsClient {
    async fn active_users(&self, range: DateRange) -> Result<u64, PlatformError> {
        Ok(match range {
            DateRange::Today => 864,
            DateRange::Yesterday => 1_032,
            DateRange::Last7Days => 6_410,
            DateRange::ThisMonth => 18_220,
            DateRange::Maximum => 402_118,
        })
    }

    async fn sessions(&self, range: DateRange) -> Result<u64, PlatformError> {
        Ok(match range {
            DateRange::Today => 1_190,
            DateRange::Yesterday => 1_411,
            DateRange::Last7Days => 9_050,
            DateRange::ThisMonth => 25_730,
            DateRange::Maximum => 611_904,
        })
    }

    async fn top_pages(
        &self,
        _range: DateRange,
        limit: usize,
    ) -> Result<Vec<PageStat>, PlatformError> {
        let pages = [
            ("/", 3_420),
            ("/pricing", 1_288),
            ("/contact", 904),
            ("/blog/meta-ads-checklist", 611),
            ("/services/lead-generation", 455),
            ("/about", 203),
        ];
        Ok(pages
            .iter()
            .take(limit)
            .map(|(path, views)| PageStat {
                path: path.to_string(),
                views: *views,
            })
            .collect())
    }
}
