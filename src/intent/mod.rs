//! Intent classification: which tools to run for a message and how to
//! render their results.

pub mod keywords;
pub mod rules;

pub use keywords::{infer_tools, Message};
pub use rules::{classify_after_llm, classify_before_llm, explicit_command, Rule};

use crate::tools::{DateRange, Period, ToolCall};
use serde::Serialize;

/// Sub-topic used to pick advisory or guidance prose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Topic {
    Conversion,
    Creative,
    Budget,
    Analytics,
    Seo,
    Sales,
    Generic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvisoryKind {
    LeadQuality,
    ReduceCpl,
    BudgetWaste,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectionUnit {
    Days,
    Hours,
}

/// Which classifier path produced an intent. Rendered into `meta.mode`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    DirectTool,
    ComparisonTable,
    /// Keyword-pair mapping, identified by a slug such as `spend-today`.
    ToolMapping(&'static str),
    CostPerLead(DateRange),
    BestCampaign(Period),
    BestPost(Period),
    WeeklyActiveUsers,
    Advisory(AdvisoryKind),
    LlmAnswer(String),
    LlmToolCalling,
    SpendProjection(ProjectionUnit),
    PromptRetrieval,
    DefaultBundle,
    NoMatch,
}

impl Mode {
    pub fn as_str(&self) -> String {
        match self {
            Mode::DirectTool => "direct-tool".to_string(),
            Mode::ComparisonTable => "comparison-table".to_string(),
            Mode::ToolMapping(slug) => format!("tool-mapping-{}", slug),
            Mode::CostPerLead(DateRange::ThisMonth) => "tool-mapping-cpl-month".to_string(),
            Mode::CostPerLead(_) => "tool-mapping-cpl-today".to_string(),
            Mode::BestCampaign(period) => format!("tool-mapping-best-campaign-{}", period.as_str()),
            Mode::BestPost(period) => format!("tool-mapping-best-post-{}", period.as_str()),
            Mode::WeeklyActiveUsers => "tool-mapping-weekly-active-users".to_string(),
            Mode::Advisory(AdvisoryKind::LeadQuality) => "lead-quality-action-plan".to_string(),
            Mode::Advisory(AdvisoryKind::ReduceCpl) => "reduce-cpl-action-plan".to_string(),
            Mode::Advisory(AdvisoryKind::BudgetWaste) => "budget-waste-action-plan".to_string(),
            Mode::LlmAnswer(provider) => format!("{}-fallback", provider),
            Mode::LlmToolCalling => "llm-tool-calling".to_string(),
            Mode::SpendProjection(ProjectionUnit::Days) => "spend-projection-days".to_string(),
            Mode::SpendProjection(ProjectionUnit::Hours) => "spend-projection-hours".to_string(),
            Mode::PromptRetrieval => "prompt-retrieval-multi-tool".to_string(),
            Mode::DefaultBundle => "marketing-default-bundle".to_string(),
            Mode::NoMatch => "no-match".to_string(),
        }
    }

    /// The one formatter that renders this mode.
    pub fn formatter(&self) -> Formatter {
        match self {
            Mode::DirectTool
            | Mode::ToolMapping(_)
            | Mode::BestCampaign(_)
            | Mode::BestPost(_)
            | Mode::WeeklyActiveUsers => Formatter::SingleTool,
            Mode::CostPerLead(range) => Formatter::CostPerLead(*range),
            Mode::ComparisonTable => Formatter::ComparisonTable,
            Mode::Advisory(kind) => Formatter::Advisory(*kind),
            Mode::LlmAnswer(_) => Formatter::LlmText,
            Mode::LlmToolCalling | Mode::PromptRetrieval => Formatter::MultiTool,
            Mode::SpendProjection(unit) => Formatter::Projection(*unit),
            Mode::DefaultBundle => Formatter::DefaultBundle,
            Mode::NoMatch => Formatter::Guidance,
        }
    }

    /// Whether a response produced by this mode may be served from cache.
    pub fn cacheable(&self) -> bool {
        !matches!(self, Mode::DirectTool | Mode::ComparisonTable)
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Formatter {
    SingleTool,
    MultiTool,
    CostPerLead(DateRange),
    ComparisonTable,
    Advisory(AdvisoryKind),
    Projection(ProjectionUnit),
    DefaultBundle,
    Guidance,
    LlmText,
}

/// Auxiliary values extracted while classifying.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IntentParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub period: Option<Period>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic: Option<Topic>,
    /// The number in the message may have been meant as a CPL value.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub ambiguous_number: bool,
    #[serde(skip)]
    pub matched_prompts: Vec<String>,
    #[serde(skip)]
    pub llm_answer: Option<String>,
}

impl IntentParams {
    pub fn is_empty(&self) -> bool {
        self.period.is_none()
            && self.quantity.is_none()
            && self.topic.is_none()
            && !self.ambiguous_number
    }
}

/// Resolved plan for one message.
#[derive(Debug, Clone, PartialEq)]
pub struct Intent {
    pub calls: Vec<ToolCall>,
    pub mode: Mode,
    pub params: IntentParams,
}

impl Intent {
    pub fn new(mode: Mode, calls: Vec<ToolCall>) -> Self {
        Self {
            calls,
            mode,
            params: IntentParams::default(),
        }
    }

    pub fn with_params(mut self, params: IntentParams) -> Self {
        self.params = params;
        self
    }

    pub fn tool_names(&self) -> Vec<&str> {
        self.calls.iter().map(|c| c.name.as_str()).collect()
    }
}
