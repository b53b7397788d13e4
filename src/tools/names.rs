//! Tool names shared by the catalog, the intent rules and the formatters.

pub const META_SPEND_TODAY: &str = "get_meta_spend_today";
pub const META_SPEND_YESTERDAY: &str = "get_meta_spend_yesterday";
pub const META_SPEND_MONTH: &str = "get_meta_spend_month";
pub const META_LEADS_TODAY: &str = "get_meta_leads_today";
pub const META_LEADS_MONTH: &str = "get_meta_leads_month";
pub const BEST_CAMPAIGN: &str = "get_best_campaign";
pub const META_RUNNING_ADS: &str = "get_meta_running_ads";
pub const BEST_SOCIAL_POST: &str = "get_best_social_post";
pub const GA4_ACTIVE_USERS_TODAY: &str = "get_ga4_active_users_today";
pub const GA4_ACTIVE_USERS_YESTERDAY: &str = "get_ga4_active_users_yesterday";
pub const GA4_WEEKLY_ACTIVE_USERS: &str = "get_ga4_weekly_active_users";
pub const GA4_SESSIONS_TODAY: &str = "get_ga4_sessions_today";
pub const GA4_SESSIONS_MONTH: &str = "get_ga4_sessions_month";
pub const GA4_TOP_PAGES: &str = "get_ga4_top_pages";
