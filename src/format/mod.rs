//! Response rendering. Every mode maps to exactly one formatter.

pub mod advisory;
pub mod comparison;
pub mod numbers;
pub mod prose;
pub mod single;

pub use numbers::{format_amount, format_count, format_money};

use crate::intent::{Formatter, Intent, Topic};
use crate::orchestrator::ToolOutcome;
use crate::tools::ToolData;
use chrono::{Datelike, NaiveDate};

/// Position within the current month, for daily averages and
/// month-end projections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarDay {
    pub day_of_month: u32,
    pub days_in_month: u32,
}

impl CalendarDay {
    pub fn from_date(date: NaiveDate) -> Self {
        let (year, month) = if date.month() == 12 {
            (date.year() + 1, 1)
        } else {
            (date.year(), date.month() + 1)
        };
        let days_in_month = NaiveDate::from_ymd_opt(year, month, 1)
            .and_then(|first| first.pred_opt())
            .map(|last| last.day())
            .unwrap_or(30);
        Self {
            day_of_month: date.day(),
            days_in_month,
        }
    }
}

/// Successful payload of the named tool, if it ran and succeeded.
pub fn find<'a>(outcomes: &'a [ToolOutcome], tool: &str) -> Option<&'a ToolData> {
    outcomes
        .iter()
        .find(|o| o.name == tool)
        .and_then(|o| o.result.data())
}

/// One line per failed tool, or `None` when everything succeeded.
pub fn failure_notes(outcomes: &[ToolOutcome]) -> Option<String> {
    let notes: Vec<String> = outcomes
        .iter()
        .filter_map(|o| {
            o.result
                .error()
                .map(|error| format!("_Note: couldn't fetch {}: {}_", single::tool_label(&o.name), error))
        })
        .collect();
    (!notes.is_empty()).then(|| notes.join("\n"))
}

pub fn render(intent: &Intent, outcomes: &[ToolOutcome], day: CalendarDay) -> String {
    let params = &intent.params;
    match intent.mode.formatter() {
        Formatter::SingleTool => match outcomes.first() {
            Some(outcome) => single::phrase(&outcome.result),
            None => "I couldn't run that tool.".to_string(),
        },
        Formatter::MultiTool => prose::multi_tool(outcomes),
        Formatter::CostPerLead(range) => prose::cost_per_lead(range, outcomes),
        Formatter::ComparisonTable => comparison::render(outcomes, day),
        Formatter::Advisory(kind) => advisory::render(kind, outcomes),
        Formatter::Projection(unit) => prose::projection(
            unit,
            params.quantity.unwrap_or(1.0),
            params.ambiguous_number,
            outcomes,
        ),
        Formatter::DefaultBundle => {
            prose::default_bundle(params.topic.unwrap_or(Topic::Generic), outcomes)
        }
        Formatter::Guidance => prose::guidance(params.topic.unwrap_or(Topic::Generic)),
        Formatter::LlmText => params.llm_answer.clone().unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intent::Mode;
    use crate::tools::{names, DataSource, DateRange, ToolCall, ToolResult};

    #[test]
    fn test_calendar_day() {
        let feb = CalendarDay::from_date(NaiveDate::from_ymd_opt(2024, 2, 10).unwrap());
        assert_eq!(feb, CalendarDay { day_of_month: 10, days_in_month: 29 });
        let dec = CalendarDay::from_date(NaiveDate::from_ymd_opt(2025, 12, 31).unwrap());
        assert_eq!(dec.days_in_month, 31);
    }

    #[test]
    fn test_render_single_tool() {
        let intent = Intent::new(
            Mode::ToolMapping("leads-today"),
            vec![ToolCall::bare(names::META_LEADS_TODAY)],
        );
        let outcomes = vec![ToolOutcome {
            name: names::META_LEADS_TODAY.to_string(),
            result: ToolResult::success(
                names::META_LEADS_TODAY,
                ToolData::Leads {
                    leads: 1,
                    range: DateRange::Today,
                },
                DataSource::Live,
            ),
        }];
        let day = CalendarDay {
            day_of_month: 1,
            days_in_month: 31,
        };
        assert_eq!(render(&intent, &outcomes, day), "You got 1 Meta lead today.");
    }

    #[test]
    fn test_failure_notes() {
        let outcomes = vec![ToolOutcome {
            name: names::GA4_TOP_PAGES.to_string(),
            result: ToolResult::failure(names::GA4_TOP_PAGES, "timed out after 15s"),
        }];
        assert_eq!(
            failure_notes(&outcomes).unwrap(),
            "_Note: couldn't fetch top pages: timed out after 15s_"
        );
        assert!(failure_notes(&[]).is_none());
    }
}
