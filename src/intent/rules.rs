//! Ordered rule tables. Within a table the first rule that resolves wins.
//!
//! Rules before LLM delegation are the deterministic detectors that must
//! never be overridden by a model (explicit commands, comparisons,
//! parametrized single-topic questions, advisory plans). Rules after it are
//! the keyword fallbacks that guarantee an answer with no provider.

use crate::intent::keywords::*;
use crate::intent::{AdvisoryKind, Intent, IntentParams, Mode, ProjectionUnit, Topic};
use crate::tools::{names, DateRange, Period, ToolCall};
use regex::Regex;
use std::sync::LazyLock;

static EXPLICIT_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^run\s+([a-z][a-z0-9]*_[a-z0-9_]+)\s*$").unwrap());

static DAYS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d+(?:\.\d+)?)\s*(?:days?|d)\b").unwrap());

static HOURS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d+(?:\.\d+)?)\s*(?:hours?|hrs?|h)\b").unwrap());

static DECIMAL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b\d+\.\d+\b").unwrap());

const MAX_BUNDLE: usize = 6;

/// Projections further out than ten years are not answered.
const MAX_PROJECTION_DAYS: f64 = 3650.0;
const MAX_PROJECTION_HOURS: f64 = MAX_PROJECTION_DAYS * 24.0;

/// A named classifier stage.
pub struct Rule {
    pub name: &'static str,
    pub resolve: fn(&Message) -> Option<Intent>,
}

pub const BEFORE_LLM: &[Rule] = &[
    Rule { name: "explicit_command", resolve: explicit_command },
    Rule { name: "comparison", resolve: comparison },
    Rule { name: "best_campaign", resolve: best_campaign },
    Rule { name: "best_post", resolve: best_post },
    Rule { name: "weekly_active_users", resolve: weekly_active_users },
    Rule { name: "lead_quality", resolve: lead_quality },
    Rule { name: "reduce_cpl", resolve: reduce_cpl },
    Rule { name: "budget_waste", resolve: budget_waste },
];

pub const AFTER_LLM: &[Rule] = &[
    Rule { name: "cost_per_lead", resolve: cost_per_lead },
    Rule { name: "keyword_mapping", resolve: keyword_mapping },
    Rule { name: "spend_projection", resolve: spend_projection },
];

fn first_match(rules: &[Rule], msg: &Message) -> Option<Intent> {
    rules.iter().find_map(|rule| {
        let intent = (rule.resolve)(msg)?;
        tracing::debug!(rule = rule.name, mode = %intent.mode, "Classifier rule matched");
        Some(intent)
    })
}

pub fn classify_before_llm(normalized: &str) -> Option<Intent> {
    first_match(BEFORE_LLM, &Message::new(normalized))
}

pub fn classify_after_llm(normalized: &str) -> Option<Intent> {
    first_match(AFTER_LLM, &Message::new(normalized))
}

/// `run <tool_name>` calls the named tool with empty arguments.
pub fn explicit_command(msg: &Message) -> Option<Intent> {
    let captures = EXPLICIT_RUN.captures(msg.text())?;
    let name = captures.get(1)?.as_str();
    Some(Intent::new(Mode::DirectTool, vec![ToolCall::bare(name)]))
}

pub fn detect_period(msg: &Message) -> Period {
    if msg.has_any(ALL_TIME) || msg.has_phrase("all time") {
        Period::Maximum
    } else if msg.has_any(MONTH) {
        Period::ThisMonth
    } else {
        Period::Today
    }
}

fn period_params(period: Period) -> IntentParams {
    IntentParams {
        period: Some(period),
        ..Default::default()
    }
}

fn comparison(msg: &Message) -> Option<Intent> {
    if !msg.has_any(COMPARE) {
        return None;
    }

    let mut tools: Vec<&'static str> = Vec::new();
    let spend = msg.has_any(SPEND) || msg.has("cpl");
    let leads = msg.has_any(LEADS) || msg.has("cpl");
    let campaign = msg.has_any(CAMPAIGN);
    let analytics = msg.has_any(USERS) || msg.has_any(SESSIONS) || msg.has_any(ANALYTICS);

    if spend {
        tools.extend([names::META_SPEND_TODAY, names::META_SPEND_MONTH]);
    }
    if leads {
        tools.extend([names::META_LEADS_TODAY, names::META_LEADS_MONTH]);
    }
    if campaign {
        tools.push(names::BEST_CAMPAIGN);
    }
    if msg.has_any(ADS) && !spend && !leads {
        tools.extend([
            names::META_SPEND_TODAY,
            names::META_SPEND_MONTH,
            names::META_LEADS_TODAY,
            names::META_LEADS_MONTH,
        ]);
    }
    if analytics {
        tools.extend([
            names::GA4_ACTIVE_USERS_TODAY,
            names::GA4_ACTIVE_USERS_YESTERDAY,
            names::GA4_SESSIONS_TODAY,
            names::GA4_SESSIONS_MONTH,
        ]);
    }
    if tools.is_empty() {
        tools.extend([
            names::META_SPEND_TODAY,
            names::META_SPEND_MONTH,
            names::GA4_ACTIVE_USERS_TODAY,
            names::GA4_ACTIVE_USERS_YESTERDAY,
        ]);
    }

    let mut calls: Vec<ToolCall> = Vec::with_capacity(MAX_BUNDLE);
    for tool in tools {
        if calls.len() == MAX_BUNDLE {
            break;
        }
        if calls.iter().any(|c| c.name == tool) {
            continue;
        }
        calls.push(if tool == names::BEST_CAMPAIGN {
            ToolCall::with_period(tool, Period::ThisMonth)
        } else {
            ToolCall::bare(tool)
        });
    }
    Some(Intent::new(Mode::ComparisonTable, calls))
}

fn best_campaign(msg: &Message) -> Option<Intent> {
    if !(msg.has_any(CAMPAIGN) && (msg.has_any(BEST) || msg.has("most"))) {
        return None;
    }
    let period = detect_period(msg);
    Some(
        Intent::new(
            Mode::BestCampaign(period),
            vec![ToolCall::with_period(names::BEST_CAMPAIGN, period)],
        )
        .with_params(period_params(period)),
    )
}

fn best_post(msg: &Message) -> Option<Intent> {
    let engaging = msg.has_any(BEST) || msg.has_any(&["most", "engagement", "engaging", "viral"]);
    if !(msg.has_any(POSTS) && engaging) {
        return None;
    }
    let period = detect_period(msg);
    Some(
        Intent::new(
            Mode::BestPost(period),
            vec![ToolCall::with_period(names::BEST_SOCIAL_POST, period)],
        )
        .with_params(period_params(period)),
    )
}

fn weekly_active_users(msg: &Message) -> Option<Intent> {
    let weekly = msg.has_any(WEEK) || msg.has_phrase("7 days") || msg.has_phrase("7 day");
    if !(weekly && (msg.has_any(USERS) || msg.has("active"))) {
        return None;
    }
    Some(Intent::new(
        Mode::WeeklyActiveUsers,
        vec![ToolCall::bare(names::GA4_WEEKLY_ACTIVE_USERS)],
    ))
}

fn lead_quality(msg: &Message) -> Option<Intent> {
    let low_quality = msg.has_any(&["junk", "fake", "bad", "poor", "spam", "irrelevant", "unqualified"]);
    if !(msg.has_any(LEADS) && (msg.has("quality") || low_quality)) {
        return None;
    }
    Some(Intent::new(
        Mode::Advisory(AdvisoryKind::LeadQuality),
        vec![
            ToolCall::with_period(names::BEST_CAMPAIGN, Period::ThisMonth),
            ToolCall::bare(names::META_LEADS_MONTH),
            ToolCall::bare(names::META_SPEND_MONTH),
        ],
    ))
}

fn reduce_cpl(msg: &Message) -> Option<Intent> {
    let lowering = msg.has_any(&[
        "reduce", "lower", "decrease", "cut", "minimize", "minimise", "optimize", "optimise", "improve",
    ]);
    let too_high = msg.has_any(&["high", "higher", "expensive", "costly", "increasing"]);
    if !(msg.has("cpl") && (lowering || too_high)) {
        return None;
    }
    Some(Intent::new(
        Mode::Advisory(AdvisoryKind::ReduceCpl),
        vec![
            ToolCall::with_period(names::BEST_CAMPAIGN, Period::ThisMonth),
            ToolCall::bare(names::META_SPEND_MONTH),
            ToolCall::bare(names::META_LEADS_MONTH),
        ],
    ))
}

fn budget_waste(msg: &Message) -> Option<Intent> {
    let waste = msg.has_any(&["waste", "wasting", "wasted", "wastage", "leaking", "burning"]);
    if !(waste && (msg.has_any(SPEND) || msg.has("money") || msg.has_any(ADS))) {
        return None;
    }
    Some(Intent::new(
        Mode::Advisory(AdvisoryKind::BudgetWaste),
        vec![
            ToolCall::with_period(names::BEST_CAMPAIGN, Period::ThisMonth),
            ToolCall::bare(names::META_SPEND_TODAY),
            ToolCall::bare(names::META_RUNNING_ADS),
        ],
    ))
}

fn cost_per_lead(msg: &Message) -> Option<Intent> {
    if !msg.has("cpl") {
        return None;
    }
    let (range, spend, leads) = if msg.has_any(MONTH) {
        (DateRange::ThisMonth, names::META_SPEND_MONTH, names::META_LEADS_MONTH)
    } else if msg.has_any(TODAY) {
        (DateRange::Today, names::META_SPEND_TODAY, names::META_LEADS_TODAY)
    } else {
        return None;
    };
    Some(Intent::new(
        Mode::CostPerLead(range),
        vec![ToolCall::bare(spend), ToolCall::bare(leads)],
    ))
}

/// Keyword pairs, most specific window first. Every condition group must
/// contribute at least one word.
const KEYWORD_PAIRS: &[(&str, &[&[&str]], &str)] = &[
    ("spend-yesterday", &[SPEND, YESTERDAY], names::META_SPEND_YESTERDAY),
    ("spend-month", &[SPEND, MONTH], names::META_SPEND_MONTH),
    ("spend-today", &[SPEND, TODAY], names::META_SPEND_TODAY),
    ("leads-month", &[LEADS, MONTH], names::META_LEADS_MONTH),
    ("leads-today", &[LEADS, TODAY], names::META_LEADS_TODAY),
    ("running-ads", &[RUNNING, &["ad", "ads"]], names::META_RUNNING_ADS),
    ("users-yesterday", &[USERS, YESTERDAY], names::GA4_ACTIVE_USERS_YESTERDAY),
    ("users-today", &[USERS, TODAY], names::GA4_ACTIVE_USERS_TODAY),
    ("sessions-month", &[SESSIONS, MONTH], names::GA4_SESSIONS_MONTH),
    ("sessions-today", &[SESSIONS, TODAY], names::GA4_SESSIONS_TODAY),
    (
        "top-pages",
        &[PAGES, &["top", "popular", "most", "best", "viewed", "visited"]],
        names::GA4_TOP_PAGES,
    ),
];

fn keyword_mapping(msg: &Message) -> Option<Intent> {
    KEYWORD_PAIRS
        .iter()
        .find(|(_, groups, _)| groups.iter().all(|group| msg.has_any(group)))
        .map(|&(slug, _, tool)| Intent::new(Mode::ToolMapping(slug), vec![ToolCall::bare(tool)]))
}

fn spend_projection(msg: &Message) -> Option<Intent> {
    if !(msg.has_any(SPEND) || msg.has("cost")) {
        return None;
    }

    let (unit, quantity, limit) = if let Some(days) = DAYS.captures(msg.text()) {
        let quantity = days.get(1)?.as_str().parse::<f64>().ok()?;
        (ProjectionUnit::Days, quantity, MAX_PROJECTION_DAYS)
    } else if let Some(hours) = HOURS.captures(msg.text()) {
        let quantity = hours.get(1)?.as_str().parse::<f64>().ok()?;
        (ProjectionUnit::Hours, quantity, MAX_PROJECTION_HOURS)
    } else {
        return None;
    };
    if !quantity.is_finite() || quantity <= 0.0 || quantity > limit {
        tracing::debug!(quantity, "Projection window out of range");
        return None;
    }

    let params = IntentParams {
        quantity: Some(quantity),
        ambiguous_number: DECIMAL.is_match(msg.text()) || msg.has("cpl"),
        ..Default::default()
    };
    Some(
        Intent::new(
            Mode::SpendProjection(unit),
            vec![ToolCall::bare(names::META_SPEND_TODAY)],
        )
        .with_params(params),
    )
}

/// Snapshot bundle for marketing questions nothing more specific matched.
pub fn default_bundle(normalized: &str) -> Option<Intent> {
    let msg = Message::new(normalized);
    if !msg.has_any(MARKETING) {
        return None;
    }
    let topic = if msg.has_any(&["conversion", "conversions", "convert", "funnel", "landing", "form", "checkout"]) {
        Topic::Conversion
    } else if msg.has_any(&["creative", "creatives", "copy", "video", "image", "hook", "hooks", "design"]) {
        Topic::Creative
    } else if msg.has_any(&["budget", "scale", "scaling", "bid", "bidding", "cpl", "cpc", "cpm", "roas"]) {
        Topic::Budget
    } else if msg.has_any(&["analytics", "ga4", "traffic", "users", "sessions", "bounce", "website"]) {
        Topic::Analytics
    } else {
        Topic::Generic
    };
    Some(
        Intent::new(
            Mode::DefaultBundle,
            vec![
                ToolCall::bare(names::META_SPEND_TODAY),
                ToolCall::bare(names::META_LEADS_TODAY),
                ToolCall::bare(names::GA4_ACTIVE_USERS_TODAY),
            ],
        )
        .with_params(IntentParams {
            topic: Some(topic),
            ..Default::default()
        }),
    )
}

/// Always matches; never calls a tool.
pub fn no_match(normalized: &str) -> Intent {
    let msg = Message::new(normalized);
    let topic = if msg.has_any(&["seo", "ranking", "rank", "organic", "keywords", "backlinks", "google"]) {
        Topic::Seo
    } else if msg.has_any(&["sales", "sell", "selling", "revenue", "customers", "closing", "deals"]) {
        Topic::Sales
    } else if msg.has_any(&["content", "reel", "reels", "post", "posts", "design", "video"]) {
        Topic::Creative
    } else if msg.has_any(&["money", "invest", "investment", "pricing", "price"]) {
        Topic::Budget
    } else {
        Topic::Generic
    };
    Intent::new(Mode::NoMatch, Vec::new()).with_params(IntentParams {
        topic: Some(topic),
        ..Default::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::normalize;

    fn before(text: &str) -> Option<Intent> {
        classify_before_llm(&normalize(text))
    }

    fn after(text: &str) -> Option<Intent> {
        classify_after_llm(&normalize(text))
    }

    #[test]
    fn test_explicit_command() {
        let intent = before("run get_meta_spend_today").unwrap();
        assert_eq!(intent.mode, Mode::DirectTool);
        assert_eq!(intent.tool_names(), vec!["get_meta_spend_today"]);
        assert!(before("please run the numbers").is_none());
    }

    #[test]
    fn test_comparison_spend_bundle() {
        let intent = before("compare spend today vs this month").unwrap();
        assert_eq!(intent.mode, Mode::ComparisonTable);
        assert_eq!(
            intent.tool_names(),
            vec![names::META_SPEND_TODAY, names::META_SPEND_MONTH]
        );
    }

    #[test]
    fn test_comparison_bundle_capped_and_deduplicated() {
        let intent = before("compare spend, leads, campaigns and website users").unwrap();
        let tools = intent.tool_names();
        assert_eq!(tools.len(), 6);
        let unique: std::collections::HashSet<_> = tools.iter().collect();
        assert_eq!(unique.len(), tools.len());
    }

    #[test]
    fn test_comparison_default_bundle() {
        let intent = before("show me the trend").unwrap();
        assert_eq!(
            intent.tool_names(),
            vec![
                names::META_SPEND_TODAY,
                names::META_SPEND_MONTH,
                names::GA4_ACTIVE_USERS_TODAY,
                names::GA4_ACTIVE_USERS_YESTERDAY
            ]
        );
    }

    #[test]
    fn test_best_campaign_periods() {
        let cases = [
            ("which campaign is performing best", Period::Today),
            ("best campaign this month", Period::ThisMonth),
            ("top campaign of all time", Period::Maximum),
            ("best campaign ever", Period::Maximum),
        ];
        for (text, period) in cases {
            let intent = before(text).unwrap();
            assert_eq!(intent.mode, Mode::BestCampaign(period), "{}", text);
            assert_eq!(intent.calls[0].args["period"], period.as_str());
        }
    }

    #[test]
    fn test_best_post_and_weekly_users() {
        assert_eq!(
            before("which post got the most engagement this month").unwrap().mode,
            Mode::BestPost(Period::ThisMonth)
        );
        assert_eq!(before("weekly active users").unwrap().mode, Mode::WeeklyActiveUsers);
        assert_eq!(
            before("users in the last 7 days").unwrap().mode,
            Mode::WeeklyActiveUsers
        );
    }

    #[test]
    fn test_advisory_detectors() {
        assert_eq!(
            before("my leads are junk, how to fix lead quality").unwrap().mode,
            Mode::Advisory(AdvisoryKind::LeadQuality)
        );
        assert_eq!(
            before("how can I reduce cost per lead").unwrap().mode,
            Mode::Advisory(AdvisoryKind::ReduceCpl)
        );
        assert_eq!(
            before("am I wasting budget on ads").unwrap().mode,
            Mode::Advisory(AdvisoryKind::BudgetWaste)
        );
    }

    #[test]
    fn test_keyword_mapping() {
        let intent = after("How much meta spend today?").unwrap();
        assert_eq!(intent.mode, Mode::ToolMapping("spend-today"));
        assert_eq!(intent.tool_names(), vec![names::META_SPEND_TODAY]);

        assert_eq!(
            after("spnd ystrday").unwrap().mode,
            Mode::ToolMapping("spend-yesterday")
        );
        assert_eq!(after("leads this month").unwrap().mode, Mode::ToolMapping("leads-month"));
        assert_eq!(after("how many ads are running").unwrap().mode, Mode::ToolMapping("running-ads"));
        assert_eq!(after("top pages on my site").unwrap().mode, Mode::ToolMapping("top-pages"));
    }

    #[test]
    fn test_cost_per_lead_mapping() {
        let intent = after("what is my cpl today").unwrap();
        assert_eq!(intent.mode, Mode::CostPerLead(DateRange::Today));
        assert_eq!(
            intent.tool_names(),
            vec![names::META_SPEND_TODAY, names::META_LEADS_TODAY]
        );
    }

    #[test]
    fn test_spend_projection() {
        let intent = after("how much will I spend in 10 days").unwrap();
        assert_eq!(intent.mode, Mode::SpendProjection(ProjectionUnit::Days));
        assert_eq!(intent.params.quantity, Some(10.0));
        assert!(!intent.params.ambiguous_number);

        let intent = after("projected spend for next 6 hours").unwrap();
        assert_eq!(intent.mode, Mode::SpendProjection(ProjectionUnit::Hours));

        let intent = after("spend for 2.5 days").unwrap();
        assert!(intent.params.ambiguous_number);

        assert!(after("how much did I spend in 0 days").is_none());
    }

    #[test]
    fn test_spend_projection_rejects_unbounded_windows() {
        assert!(after("how much will I spend in 3650 days").is_some());
        assert!(after("how much will I spend in 3651 days").is_none());
        assert!(after("how much will I spend in 1000000000000000000000 days").is_none());
        assert!(after("spend over the next 87601 hours").is_none());
        let huge = format!("spend in {} days", "9".repeat(400));
        assert!(after(&huge).is_none());
    }

    #[test]
    fn test_phrases_match_whole_words() {
        let intent = before("how many users in the last 17 days");
        assert!(intent.map_or(true, |i| i.mode != Mode::WeeklyActiveUsers));
        let intent = before("users in the last 27 days");
        assert!(intent.map_or(true, |i| i.mode != Mode::WeeklyActiveUsers));

        assert_eq!(
            before("best campaign for a small time budget").unwrap().mode,
            Mode::BestCampaign(Period::Today)
        );
        assert_eq!(
            before("best campaign for all time").unwrap().mode,
            Mode::BestCampaign(Period::Maximum)
        );
    }

    #[test]
    fn test_unmatched_question_falls_through() {
        let text = normalize("What's the weather today");
        assert!(classify_before_llm(&text).is_none());
        assert!(classify_after_llm(&text).is_none());
        assert!(default_bundle(&text).is_none());
        let fallback = no_match(&text);
        assert_eq!(fallback.mode, Mode::NoMatch);
        assert!(fallback.calls.is_empty());
    }

    #[test]
    fn test_default_bundle_topic() {
        let intent = default_bundle(&normalize("my landing page conversions feel low")).unwrap();
        assert_eq!(intent.params.topic, Some(Topic::Conversion));
        assert_eq!(intent.calls.len(), 3);
    }
}
