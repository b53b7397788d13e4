//! Boundary to the external data platforms. The core only depends on the
//! traits; concrete HTTP clients and demo mocks live alongside them.

pub mod ads;
pub mod analytics;
pub mod bridge;

pub use ads::{
    AdsPlatformClient, MetaAdsClient, MetaAdsConfig, MockAdsClient, RunningAds, SpendReport,
    GRAPH_BASE_URL,
};
pub use analytics::{
    AnalyticsPlatformClient, Ga4Client, Ga4Config, MockAnalyticsClient, GA4_BASE_URL,
};
pub use bridge::{HttpToolBridge, ToolCallBridge};
