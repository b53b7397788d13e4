//! Projection, cost-per-lead, snapshot and guidance answers.

use crate::format::numbers::{format_count, format_money, format_quantity, plural};
use crate::format::single::{apology, phrase};
use crate::format::failure_notes;
use crate::intent::{ProjectionUnit, Topic};
use crate::orchestrator::ToolOutcome;
use crate::tools::{names, DateRange, ToolData};

/// Linear run-rate projection from today's spend.
pub fn projection(
    unit: ProjectionUnit,
    quantity: f64,
    ambiguous_number: bool,
    outcomes: &[ToolOutcome],
) -> String {
    let Some(outcome) = outcomes.iter().find(|o| o.name == names::META_SPEND_TODAY) else {
        return "I couldn't fetch today's spend to project from.".to_string();
    };

    let mut text = match outcome.result.data() {
        Some(ToolData::Spend {
            spend, currency, ..
        }) => {
            let (factor, label) = match unit {
                ProjectionUnit::Days => (quantity, if quantity == 1.0 { "day" } else { "days" }),
                ProjectionUnit::Hours => (quantity / 24.0, if quantity == 1.0 { "hour" } else { "hours" }),
            };
            format!(
                "Projected Meta spend for the next {} {}: {} (based on today's run-rate of {}). This is a linear projection, not a guarantee.",
                format_quantity(quantity),
                label,
                format_money(spend * factor, currency),
                format_money(*spend, currency)
            )
        }
        _ => phrase(&outcome.result),
    };

    if ambiguous_number {
        text.push_str(&format!(
            "\n\nNote: if {} was meant as a cost-per-lead figure rather than a duration, ask \"how can I reduce cpl\" for a CPL action plan.",
            format_quantity(quantity)
        ));
    }
    text
}

pub fn cost_per_lead(range: DateRange, outcomes: &[ToolOutcome]) -> String {
    let spend = outcomes.iter().find_map(|o| match o.result.data() {
        Some(ToolData::Spend {
            spend, currency, ..
        }) => Some((*spend, currency.as_str())),
        _ => None,
    });
    let leads = outcomes.iter().find_map(|o| match o.result.data() {
        Some(ToolData::Leads { leads, .. }) => Some(*leads),
        _ => None,
    });

    match (spend, leads) {
        (Some((spend, currency)), Some(leads)) if leads > 0 => format!(
            "Your cost per lead {} is {} ({} spent for {} {}).",
            range.phrase(),
            format_money(spend / leads as f64, currency),
            format_money(spend, currency),
            format_count(leads),
            plural(leads, "lead", "leads")
        ),
        (Some((spend, currency)), Some(_)) => format!(
            "You spent {} {} but have no leads yet, so there is no cost per lead to report.",
            format_money(spend, currency),
            range.phrase()
        ),
        _ => {
            let notes = outcomes
                .iter()
                .filter_map(|o| o.result.error().map(|e| apology(&o.name, e)))
                .collect::<Vec<_>>();
            if notes.is_empty() {
                "I couldn't compute your cost per lead right now.".to_string()
            } else {
                notes.join("\n")
            }
        }
    }
}

fn advice(topic: Topic) -> &'static str {
    match topic {
        Topic::Conversion => "To lift conversions, keep landing pages fast (under 3 seconds), keep forms short and make the page headline repeat the ad's promise.",
        Topic::Creative => "For creatives, test 3-5 variations with different hooks in the first 3 seconds and retire ads once their CTR drops below 1%.",
        Topic::Budget => "On budget, scale winning ad sets by 15-20% every few days rather than in large jumps, and cap ad sets that spend 2-3x your target CPL without a lead.",
        Topic::Analytics => "On analytics, compare sessions with leads to find where visitors drop off, and check that GA4 conversion events fire on your thank-you page.",
        Topic::Seo | Topic::Sales | Topic::Generic => "Ask me about spend, leads, CPL, your best campaign or website traffic for a closer look.",
    }
}

/// Snapshot of the default bundle plus topic advice.
pub fn default_bundle(topic: Topic, outcomes: &[ToolOutcome]) -> String {
    let lines: Vec<String> = outcomes
        .iter()
        .filter(|o| o.result.is_ok())
        .map(|o| format!("- {}", phrase(&o.result)))
        .collect();

    let mut text = if lines.is_empty() {
        "I couldn't load your live numbers right now.".to_string()
    } else {
        format!("Here's a quick snapshot:\n{}", lines.join("\n"))
    };
    text.push_str("\n\n");
    text.push_str(advice(topic));
    if let Some(notes) = failure_notes(outcomes) {
        text.push_str("\n\n");
        text.push_str(&notes);
    }
    text
}

/// Canned guidance for questions outside the data the tools cover.
pub fn guidance(topic: Topic) -> String {
    let text = match topic {
        Topic::Seo => "I work with your Meta ads and GA4 data, so I can't pull SEO rankings. For organic growth, focus each page on a few high-intent keywords, improve page speed and track organic sessions in GA4. Ask me \"how many sessions this month\" to follow the trend.",
        Topic::Sales => "I can't see your sales pipeline, but I can show what feeds it. Ask \"how many leads today\" or \"what is my cpl this month\", and follow up new leads within 5 minutes since response time drives close rates.",
        Topic::Creative => "For content, post consistently, lead with a strong hook and reuse your best organic posts as ads. Ask me \"which post got the most engagement this month\" to find your winners.",
        Topic::Budget => "Before adding budget, check what it is buying today. Ask me \"what is my cpl this month\" or \"am I wasting budget on ads\" for a quick diagnosis.",
        Topic::Conversion | Topic::Analytics | Topic::Generic => "I can help with your Meta ads and website analytics. Tell me your goal, for example \"how much did I spend today\", \"best campaign this month\" or \"compare spend today vs this month\".",
    };
    text.to_string()
}

/// Bullet list of single-tool phrases, one per executed tool.
pub fn multi_tool(outcomes: &[ToolOutcome]) -> String {
    if outcomes.is_empty() {
        return "I couldn't find data for that question.".to_string();
    }
    outcomes
        .iter()
        .map(|o| format!("- {}", phrase(&o.result)))
        .collect::<Vec<_>>()
        .join("\n")
}
