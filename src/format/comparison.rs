//! Markdown comparison table. A row appears only when every tool it needs
//! succeeded; failed tools are listed as notes under the table.

use crate::format::numbers::{format_count, format_delta, format_money, percent_change};
use crate::format::single::tool_label;
use crate::format::{failure_notes, find, CalendarDay};
use crate::orchestrator::ToolOutcome;
use crate::tools::{names, ToolData};

pub const HEADER: &str = "| Metric | Current | Baseline | Delta | Insight |";
const DIVIDER: &str = "| --- | --- | --- | --- | --- |";

/// Within this band (percent) a change counts as flat.
const FLAT_BAND: f64 = 5.0;

struct Row {
    metric: String,
    current: String,
    baseline: String,
    delta: String,
    insight: String,
}

enum Trend {
    Up,
    Down,
    Flat,
}

/// Table cell text with `|` escaped so it cannot split the row.
fn cell(text: &str) -> String {
    text.replace('|', "\\|")
}

fn direction(current: f64, baseline: f64) -> Trend {
    match percent_change(current, baseline) {
        Some(pct) if pct > FLAT_BAND => Trend::Up,
        Some(pct) if pct < -FLAT_BAND => Trend::Down,
        _ => Trend::Flat,
    }
}

fn spend(outcomes: &[ToolOutcome], tool: &str) -> Option<(f64, String)> {
    match find(outcomes, tool)? {
        ToolData::Spend {
            spend, currency, ..
        } => Some((*spend, currency.clone())),
        _ => None,
    }
}

fn leads(outcomes: &[ToolOutcome], tool: &str) -> Option<u64> {
    match find(outcomes, tool)? {
        ToolData::Leads { leads, .. } => Some(*leads),
        _ => None,
    }
}

fn users(outcomes: &[ToolOutcome], tool: &str) -> Option<u64> {
    match find(outcomes, tool)? {
        ToolData::ActiveUsers { users, .. } => Some(*users),
        _ => None,
    }
}

fn sessions(outcomes: &[ToolOutcome], tool: &str) -> Option<u64> {
    match find(outcomes, tool)? {
        ToolData::Sessions { sessions, .. } => Some(*sessions),
        _ => None,
    }
}

fn spend_row(outcomes: &[ToolOutcome], day: CalendarDay) -> Option<Row> {
    let (today, currency) = spend(outcomes, names::META_SPEND_TODAY)?;
    let (month, _) = spend(outcomes, names::META_SPEND_MONTH)?;
    let daily = month / day.day_of_month as f64;
    let projection = daily * day.days_in_month as f64;
    let pacing = match direction(today, daily) {
        Trend::Up => "Pacing above the daily average",
        Trend::Down => "Pacing below the daily average",
        Trend::Flat => "In line with the daily average",
    };
    Some(Row {
        metric: "Spend (today vs avg/day this month)".to_string(),
        current: format_money(today, &currency),
        baseline: format_money(daily, &currency),
        delta: format_delta(today, daily),
        insight: format!(
            "{}; month-end projection {}",
            pacing,
            format_money(projection, &currency)
        ),
    })
}

fn leads_row(outcomes: &[ToolOutcome], day: CalendarDay) -> Option<Row> {
    let today = leads(outcomes, names::META_LEADS_TODAY)? as f64;
    let month = leads(outcomes, names::META_LEADS_MONTH)? as f64;
    let daily = month / day.day_of_month as f64;
    let insight = match direction(today, daily) {
        Trend::Up => "More leads than a typical day",
        Trend::Down => "Fewer leads than a typical day",
        Trend::Flat => "A typical day for leads",
    };
    Some(Row {
        metric: "Leads (today vs avg/day this month)".to_string(),
        current: format_count(today as u64),
        baseline: format!("{:.1}", daily),
        delta: format_delta(today, daily),
        insight: insight.to_string(),
    })
}

fn cpl_row(outcomes: &[ToolOutcome]) -> Option<Row> {
    let (spend_today, currency) = spend(outcomes, names::META_SPEND_TODAY)?;
    let (spend_month, _) = spend(outcomes, names::META_SPEND_MONTH)?;
    let leads_today = leads(outcomes, names::META_LEADS_TODAY)?;
    let leads_month = leads(outcomes, names::META_LEADS_MONTH)?;
    if leads_today == 0 || leads_month == 0 {
        return None;
    }
    let today = spend_today / leads_today as f64;
    let month = spend_month / leads_month as f64;
    let insight = match direction(today, month) {
        Trend::Up => "Leads cost more than this month's average",
        Trend::Down => "Leads are cheaper than this month's average",
        Trend::Flat => "CPL is steady",
    };
    Some(Row {
        metric: "CPL (today vs this month)".to_string(),
        current: format_money(today, &currency),
        baseline: format_money(month, &currency),
        delta: format_delta(today, month),
        insight: insight.to_string(),
    })
}

fn users_row(outcomes: &[ToolOutcome]) -> Option<Row> {
    let today = users(outcomes, names::GA4_ACTIVE_USERS_TODAY)?;
    let yesterday = users(outcomes, names::GA4_ACTIVE_USERS_YESTERDAY)?;
    let insight = match direction(today as f64, yesterday as f64) {
        Trend::Up => "Traffic is up vs yesterday",
        Trend::Down => "Traffic is down vs yesterday (today is still in progress)",
        Trend::Flat => "Traffic is flat vs yesterday",
    };
    Some(Row {
        metric: "Active users (today vs yesterday)".to_string(),
        current: format_count(today),
        baseline: format_count(yesterday),
        delta: format_delta(today as f64, yesterday as f64),
        insight: insight.to_string(),
    })
}

fn sessions_row(outcomes: &[ToolOutcome], day: CalendarDay) -> Option<Row> {
    let today = sessions(outcomes, names::GA4_SESSIONS_TODAY)? as f64;
    let month = sessions(outcomes, names::GA4_SESSIONS_MONTH)? as f64;
    let daily = month / day.day_of_month as f64;
    let insight = match direction(today, daily) {
        Trend::Up => "Busier than an average day",
        Trend::Down => "Quieter than an average day",
        Trend::Flat => "An average day for sessions",
    };
    Some(Row {
        metric: "Sessions (today vs avg/day this month)".to_string(),
        current: format_count(today as u64),
        baseline: format!("{:.0}", daily),
        delta: format_delta(today, daily),
        insight: insight.to_string(),
    })
}

fn campaign_row(outcomes: &[ToolOutcome]) -> Option<Row> {
    let ToolData::CampaignRanking { campaigns, .. } = find(outcomes, names::BEST_CAMPAIGN)? else {
        return None;
    };
    let best = campaigns.first()?;
    let runner_up = campaigns.get(1)?;
    let gap = best.leads.saturating_sub(runner_up.leads);
    Some(Row {
        metric: "Leads (top campaign vs runner-up)".to_string(),
        current: format!("{}: {}", best.name, format_count(best.leads)),
        baseline: format!("{}: {}", runner_up.name, format_count(runner_up.leads)),
        delta: format!("+{}", format_count(gap)),
        insight: format!("\"{}\" is the one to scale", best.name),
    })
}

pub fn render(outcomes: &[ToolOutcome], day: CalendarDay) -> String {
    let rows: Vec<Row> = [
        spend_row(outcomes, day),
        leads_row(outcomes, day),
        cpl_row(outcomes),
        users_row(outcomes),
        sessions_row(outcomes, day),
        campaign_row(outcomes),
    ]
    .into_iter()
    .flatten()
    .collect();

    let mut text = if rows.is_empty() {
        let fetched: Vec<String> = outcomes.iter().map(|o| tool_label(&o.name)).collect();
        format!(
            "I couldn't build a comparison from the available data ({}).",
            fetched.join(", ")
        )
    } else {
        let mut table = format!("Here's how the numbers compare:\n\n{}\n{}\n", HEADER, DIVIDER);
        for row in &rows {
            table.push_str(&format!(
                "| {} | {} | {} | {} | {} |\n",
                cell(&row.metric),
                cell(&row.current),
                cell(&row.baseline),
                cell(&row.delta),
                cell(&row.insight)
            ));
        }
        table.trim_end().to_string()
    };

    if let Some(notes) = failure_notes(outcomes) {
        text.push_str("\n\n");
        text.push_str(&notes);
    }
    text
}
