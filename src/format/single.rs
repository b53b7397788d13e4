//! One- or two-sentence phrasing for a single tool result.

use crate::format::numbers::{format_amount, format_count, format_money, plural};
use crate::tools::{names, DateRange, ToolData, ToolResult};

const SNIPPET_CHARS: usize = 80;

/// Human name of what a tool fetches, used in apologies and notes.
pub fn tool_label(tool: &str) -> String {
    let label = match tool {
        names::META_SPEND_TODAY => "today's Meta spend",
        names::META_SPEND_YESTERDAY => "yesterday's Meta spend",
        names::META_SPEND_MONTH => "this month's Meta spend",
        names::META_LEADS_TODAY => "today's Meta leads",
        names::META_LEADS_MONTH => "this month's Meta leads",
        names::BEST_CAMPAIGN => "campaign performance",
        names::META_RUNNING_ADS => "running ads",
        names::BEST_SOCIAL_POST => "social post performance",
        names::GA4_ACTIVE_USERS_TODAY => "today's website users",
        names::GA4_ACTIVE_USERS_YESTERDAY => "yesterday's website users",
        names::GA4_WEEKLY_ACTIVE_USERS => "weekly website users",
        names::GA4_SESSIONS_TODAY => "today's website sessions",
        names::GA4_SESSIONS_MONTH => "this month's website sessions",
        names::GA4_TOP_PAGES => "top pages",
        other => return format!("`{}`", other),
    };
    label.to_string()
}

pub fn apology(tool: &str, error: &str) -> String {
    format!("Sorry, I couldn't fetch {}: {}", tool_label(tool), error)
}

pub fn phrase(result: &ToolResult) -> String {
    match result {
        ToolResult::Ok(success) => describe(&success.data),
        ToolResult::Err(failure) => apology(&failure.tool, &failure.error),
    }
}

pub fn describe(data: &ToolData) -> String {
    match data {
        ToolData::Spend {
            spend,
            currency,
            range,
        } => {
            let verb = if *range == DateRange::Yesterday { "was" } else { "is" };
            format!(
                "Your Meta spend {} {} {}.",
                range.phrase(),
                verb,
                format_money(*spend, currency)
            )
        }
        ToolData::Leads { leads, range } => format!(
            "You got {} Meta {} {}.",
            format_count(*leads),
            plural(*leads, "lead", "leads"),
            range.phrase()
        ),
        ToolData::CampaignRanking { period, campaigns } => match campaigns.first() {
            Some(best) => {
                let mut text = format!(
                    "Your best campaign {} is \"{}\" with {} {}",
                    period.phrase(),
                    best.name,
                    format_count(best.leads),
                    plural(best.leads, "lead", "leads")
                );
                if let Some(cpl) = best.effective_cpl() {
                    text.push_str(&format!(" at {} per lead", format_amount(cpl)));
                }
                if let Some(cpc) = best.cpc {
                    text.push_str(&format!(" (CPC {})", format_amount(cpc)));
                }
                text.push('.');
                if let Some(runner_up) = campaigns.get(1) {
                    text.push_str(&format!(
                        " Runner-up: \"{}\" with {} {}.",
                        runner_up.name,
                        format_count(runner_up.leads),
                        plural(runner_up.leads, "lead", "leads")
                    ));
                }
                text
            }
            None => format!("No campaign has delivered results {} yet.", period.phrase()),
        },
        ToolData::RunningAds {
            active,
            with_spend_today,
        } => format!(
            "You have {} active {}; {} of them spent today.",
            format_count(*active),
            plural(*active, "ad", "ads"),
            format_count(*with_spend_today)
        ),
        ToolData::BestPost {
            period,
            post,
            scanned,
        } => match post {
            Some(post) => {
                let caption = post
                    .message
                    .as_deref()
                    .map(snippet)
                    .unwrap_or_else(|| "(no caption)".to_string());
                let mut text = format!(
                    "Your best social post {} is \"{}\" with {} interactions ({} reactions, {} comments, {} shares).",
                    period.phrase(),
                    caption,
                    format_count(post.engagement()),
                    format_count(post.reactions),
                    format_count(post.comments),
                    format_count(post.shares)
                );
                if let Some(link) = &post.permalink {
                    text.push_str(&format!(" Link: {}", link));
                }
                text
            }
            None => format!(
                "I couldn't find a post with engagement {} ({} scanned).",
                period.phrase(),
                scanned
            ),
        },
        ToolData::ActiveUsers { users, range } => match range {
            DateRange::Last7Days => format!(
                "Your website had {} weekly active users over the last 7 days.",
                format_count(*users)
            ),
            DateRange::Today => format!("Your website has {} active users today.", format_count(*users)),
            other => format!(
                "Your website had {} active users {}.",
                format_count(*users),
                other.phrase()
            ),
        },
        ToolData::Sessions { sessions, range } => format!(
            "Your website recorded {} {} {}.",
            format_count(*sessions),
            plural(*sessions, "session", "sessions"),
            range.phrase()
        ),
        ToolData::TopPages { range, pages } => {
            if pages.is_empty() {
                return format!("No page views were recorded {}.", range.phrase());
            }
            let mut text = format!("Top pages {}:", range.phrase());
            for (rank, page) in pages.iter().enumerate() {
                text.push_str(&format!(
                    "\n{}. {} ({} views)",
                    rank + 1,
                    page.path,
                    format_count(page.views)
                ));
            }
            text
        }
    }
}

fn snippet(text: &str) -> String {
    let line = text.lines().next().unwrap_or_default().trim();
    if line.chars().count() <= SNIPPET_CHARS {
        line.to_string()
    } else {
        let cut: String = line.chars().take(SNIPPET_CHARS).collect();
        format!("{}...", cut.trim_end())
    }
}
