//! Fixed three-step action plans. Live numbers only decide which campaigns
//! are named; the recommended reallocation is a static 15-25%.

use crate::format::numbers::{format_count, format_money, plural};
use crate::format::{failure_notes, find};
use crate::intent::AdvisoryKind;
use crate::orchestrator::ToolOutcome;
use crate::tools::{names, CampaignStat, ToolData};

struct Facts<'a> {
    best: Option<&'a CampaignStat>,
    worst: Option<&'a CampaignStat>,
    currency: String,
    spend_today: Option<f64>,
    spend_month: Option<f64>,
    leads_month: Option<u64>,
    running: Option<(u64, u64)>,
}

impl<'a> Facts<'a> {
    fn collect(outcomes: &'a [ToolOutcome]) -> Self {
        let campaigns: &[CampaignStat] = match find(outcomes, names::BEST_CAMPAIGN) {
            Some(ToolData::CampaignRanking { campaigns, .. }) => campaigns.as_slice(),
            _ => &[],
        };
        let best = campaigns.first();
        // Weakest spender: last in ranking order that actually spent.
        let worst = campaigns
            .iter()
            .rev()
            .find(|c| c.spend > 0.0 && Some(c.id.as_str()) != best.map(|b| b.id.as_str()));

        let mut facts = Facts {
            best,
            worst,
            currency: String::new(),
            spend_today: None,
            spend_month: None,
            leads_month: None,
            running: None,
        };
        for outcome in outcomes {
            match outcome.result.data() {
                Some(ToolData::Spend {
                    spend, currency, ..
                }) => {
                    facts.currency = currency.clone();
                    if outcome.name == names::META_SPEND_TODAY {
                        facts.spend_today = Some(*spend);
                    } else if outcome.name == names::META_SPEND_MONTH {
                        facts.spend_month = Some(*spend);
                    }
                }
                Some(ToolData::Leads { leads, .. }) if outcome.name == names::META_LEADS_MONTH => {
                    facts.leads_month = Some(*leads);
                }
                Some(ToolData::RunningAds {
                    active,
                    with_spend_today,
                }) => facts.running = Some((*active, *with_spend_today)),
                _ => {}
            }
        }
        facts
    }

    fn money(&self, value: f64) -> String {
        format_money(value, &self.currency)
    }

    fn best_name(&self) -> String {
        match self.best {
            Some(c) => {
                let cpl = c
                    .effective_cpl()
                    .map(|cpl| format!(", CPL {}", self.money(cpl)))
                    .unwrap_or_default();
                format!(
                    "\"{}\" ({} {}{})",
                    c.name,
                    format_count(c.leads),
                    plural(c.leads, "lead", "leads"),
                    cpl
                )
            }
            None => "your best-performing campaign".to_string(),
        }
    }

    fn worst_name(&self) -> String {
        match self.worst {
            Some(c) => format!(
                "\"{}\" ({} spent for {} {})",
                c.name,
                self.money(c.spend),
                format_count(c.leads),
                plural(c.leads, "lead", "leads")
            ),
            None => "your weakest campaign".to_string(),
        }
    }

    fn month_summary(&self) -> Option<String> {
        let spend = self.spend_month?;
        let leads = self.leads_month?;
        let cpl = if leads > 0 {
            format!(" (CPL {})", self.money(spend / leads as f64))
        } else {
            String::new()
        };
        Some(format!(
            "This month so far: {} spent for {} {}{}.",
            self.money(spend),
            format_count(leads),
            plural(leads, "lead", "leads"),
            cpl
        ))
    }
}

fn plan(kind: AdvisoryKind, facts: &Facts) -> (&'static str, Option<String>, [String; 3]) {
    let best = facts.best_name();
    let worst = facts.worst_name();
    match kind {
        AdvisoryKind::LeadQuality => (
            "Lead quality action plan",
            facts.month_summary(),
            [
                format!(
                    "Add a qualifying question or switch to a higher-intent form on {} so low-intent prospects filter themselves out.",
                    worst
                ),
                format!(
                    "Shift 15-25% of budget from {} to {}, which brings your strongest lead flow.",
                    worst, best
                ),
                "Send lead outcomes back to Meta through the Conversions API and build a 1% lookalike audience from your qualified leads.".to_string(),
            ],
        ),
        AdvisoryKind::ReduceCpl => (
            "Plan to reduce cost per lead",
            facts.month_summary(),
            [
                format!("Shift 15-25% of budget from {} to {}.", worst, best),
                format!(
                    "Refresh creatives on {}: test 2-3 new hooks and pause ads with CTR below 1%.",
                    worst
                ),
                "Tighten targeting: exclude existing leads and past converters, then test a lookalike of your best leads.".to_string(),
            ],
        ),
        AdvisoryKind::BudgetWaste => {
            let idle = match facts.running {
                Some((active, spending)) => format!(
                    "{} of your {} active ads have not spent today; pause or consolidate them so budget concentrates on ads that deliver.",
                    format_count(active.saturating_sub(spending)),
                    format_count(active)
                ),
                None => "Audit your active ads and pause or consolidate the ones that are not delivering.".to_string(),
            };
            (
                "Budget waste check",
                facts
                    .spend_today
                    .map(|spend| format!("Spend so far today: {}.", facts.money(spend))),
                [
                    format!(
                        "Review {}: cut its budget by 15-25% or pause it if results don't improve within 3 days.",
                        worst
                    ),
                    idle,
                    format!(
                        "Move the freed budget to {} and set a cost-per-result cap to stop overspend.",
                        best
                    ),
                ],
            )
        }
    }
}

pub fn render(kind: AdvisoryKind, outcomes: &[ToolOutcome]) -> String {
    let facts = Facts::collect(outcomes);
    let (title, summary, actions) = plan(kind, &facts);

    let mut text = format!("**{}**", title);
    if let Some(summary) = summary {
        text.push('\n');
        text.push_str(&summary);
    }
    for (step, action) in actions.iter().enumerate() {
        text.push_str(&format!("\n{}. {}", step + 1, action));
    }
    if let Some(notes) = failure_notes(outcomes) {
        text.push_str("\n\n");
        text.push_str(&notes);
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::{DataSource, DateRange, Period, ToolResult};

    fn campaign(name: &str, leads: u64, spend: f64) -> CampaignStat {
        CampaignStat {
            id: name.to_lowercase(),
            name: name.to_string(),
            leads,
            spend,
            cpc: None,
            cpl: None,
        }
    }

    fn ok(name: &str, data: ToolData) -> ToolOutcome {
        ToolOutcome {
            name: name.to_string(),
            result: ToolResult::success(name, data, DataSource::Mock),
        }
    }

    fn outcomes() -> Vec<ToolOutcome> {
        vec![
            ok(
                names::BEST_CAMPAIGN,
                ToolData::CampaignRanking {
                    period: Period::ThisMonth,
                    campaigns: vec![
                        campaign("Alpha", 40, 800.0),
                        campaign("Beta", 10, 600.0),
                        campaign("Paused", 0, 0.0),
                    ],
                },
            ),
            ok(
                names::META_SPEND_MONTH,
                ToolData::Spend {
                    spend: 1400.0,
                    currency: "USD".into(),
                    range: DateRange::ThisMonth,
                },
            ),
            ok(
                names::META_LEADS_MONTH,
                ToolData::Leads {
                    leads: 50,
                    range: DateRange::ThisMonth,
                },
            ),
        ]
    }

    fn action_lines(text: &str) -> Vec<&str> {
        text.lines()
            .filter(|l| l.chars().next().is_some_and(|c| c.is_ascii_digit()))
            .collect()
    }

    #[test]
    fn test_every_plan_has_three_actions() {
        for kind in [
            AdvisoryKind::LeadQuality,
            AdvisoryKind::ReduceCpl,
            AdvisoryKind::BudgetWaste,
        ] {
            assert_eq!(action_lines(&render(kind, &outcomes())).len(), 3);
            assert_eq!(action_lines(&render(kind, &[])).len(), 3);
        }
    }

    #[test]
    fn test_reduce_cpl_names_best_and_worst() {
        let text = render(AdvisoryKind::ReduceCpl, &outcomes());
        assert!(text.contains("This month so far: $1,400.00 spent for 50 leads (CPL $28.00)."));
        assert!(text.contains(
            "1. Shift 15-25% of budget from \"Beta\" ($600.00 spent for 10 leads) to \"Alpha\" (40 leads, CPL $20.00)."
        ));
    }

    #[test]
    fn test_budget_waste_without_data_uses_generic_names() {
        let text = render(AdvisoryKind::BudgetWaste, &[]);
        assert!(text.contains("your weakest campaign"));
        assert!(text.contains("Audit your active ads"));
    }
}
