//! Tool layer: typed results, the registry and the marketing catalog.

pub mod catalog;
pub mod names;
pub mod registry;
pub mod types;

pub use catalog::{register_marketing_tools, PlatformClients};
pub use registry::{ToolDefinition, ToolHandler, ToolRegistry};
pub use types::{
    CampaignStat, DataSource, DateRange, PageStat, Period, PostStat, ToolArgs, ToolCall,
    ToolContext, ToolData, ToolResult,
};
