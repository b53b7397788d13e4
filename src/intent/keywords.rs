//! Keyword vocabulary shared by the classifier rules and prompt retrieval.

use crate::tools::names;
use std::collections::HashSet;

pub const COMPARE: &[&str] = &[
    "compare", "comparison", "vs", "versus", "difference", "diff", "trend", "against",
];
pub const SPEND: &[&str] = &["spend", "spent", "spending", "expense", "expenses", "budget"];
pub const LEADS: &[&str] = &["lead", "leads", "enquiries", "inquiries"];
pub const CAMPAIGN: &[&str] = &["campaign", "campaigns"];
pub const ADS: &[&str] = &["ad", "ads", "meta", "facebook", "instagram", "adset", "adsets"];
pub const USERS: &[&str] = &["users", "user", "visitors", "traffic"];
pub const SESSIONS: &[&str] = &["sessions", "session", "visits"];
pub const ANALYTICS: &[&str] = &["ga4", "analytics", "website", "site"];
pub const PAGES: &[&str] = &["page", "pages", "url", "urls", "landing"];
pub const POSTS: &[&str] = &["post", "posts", "reel", "reels"];
pub const BEST: &[&str] = &[
    "best", "top", "winning", "highest", "performing", "performer", "strongest",
];
pub const TODAY: &[&str] = &["today", "todays"];
pub const YESTERDAY: &[&str] = &["yesterday", "yesterdays"];
pub const MONTH: &[&str] = &["month", "monthly", "mtd"];
pub const WEEK: &[&str] = &["week", "weekly", "wau"];
pub const ALL_TIME: &[&str] = &["ever", "lifetime", "alltime"];
pub const RUNNING: &[&str] = &["running", "active", "live"];

/// Broad vocabulary that marks a message as marketing-related.
pub const MARKETING: &[&str] = &[
    "spend", "spent", "spending", "budget", "lead", "leads", "campaign", "campaigns", "ad", "ads",
    "adset", "meta", "facebook", "instagram", "ga4", "analytics", "users", "visitors", "traffic",
    "sessions", "conversion", "conversions", "convert", "creative", "creatives", "cpl", "cpc",
    "ctr", "cpm", "roas", "marketing", "audience", "targeting", "funnel", "retargeting", "website",
    "engagement", "reach", "impressions",
];

/// Normalized message with a word set for keyword checks.
///
/// Words are the maximal alphanumeric runs, so `today's` yields `today`
/// and `s`.
pub struct Message<'a> {
    text: &'a str,
    tokens: Vec<&'a str>,
    words: HashSet<&'a str>,
}

impl<'a> Message<'a> {
    pub fn new(normalized: &'a str) -> Self {
        let tokens: Vec<&str> = normalized
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .collect();
        let words = tokens.iter().copied().collect();
        Self {
            text: normalized,
            tokens,
            words,
        }
    }

    pub fn text(&self) -> &'a str {
        self.text
    }

    pub fn has(&self, word: &str) -> bool {
        self.words.contains(word)
    }

    pub fn has_any(&self, words: &[&str]) -> bool {
        words.iter().any(|w| self.words.contains(w))
    }

    /// Multi-word phrase as consecutive whole words, so `7 days` does not
    /// match inside `17 days`.
    pub fn has_phrase(&self, phrase: &str) -> bool {
        let wanted: Vec<&str> = phrase.split_whitespace().collect();
        !wanted.is_empty()
            && self
                .tokens
                .windows(wanted.len())
                .any(|window| window == wanted.as_slice())
    }
}

/// Simplified single-keyword mapping used to harvest tools from prompt
/// retrieval matches. At most one tool per family.
pub fn infer_tools(text: &str) -> Vec<&'static str> {
    let msg = Message::new(text);
    let monthly = msg.has_any(MONTH);
    let mut tools = Vec::new();

    if msg.has_any(SPEND) || msg.has("cpl") {
        tools.push(if monthly {
            names::META_SPEND_MONTH
        } else if msg.has_any(YESTERDAY) {
            names::META_SPEND_YESTERDAY
        } else {
            names::META_SPEND_TODAY
        });
    }
    if msg.has_any(LEADS) || msg.has("cpl") {
        tools.push(if monthly {
            names::META_LEADS_MONTH
        } else {
            names::META_LEADS_TODAY
        });
    }
    if msg.has_any(CAMPAIGN) {
        tools.push(names::BEST_CAMPAIGN);
    }
    if msg.has_any(POSTS) {
        tools.push(names::BEST_SOCIAL_POST);
    }
    if msg.has_any(USERS) {
        tools.push(if msg.has_any(YESTERDAY) {
            names::GA4_ACTIVE_USERS_YESTERDAY
        } else {
            names::GA4_ACTIVE_USERS_TODAY
        });
    }
    if msg.has_any(SESSIONS) {
        tools.push(if monthly {
            names::GA4_SESSIONS_MONTH
        } else {
            names::GA4_SESSIONS_TODAY
        });
    }
    if msg.has_any(PAGES) {
        tools.push(names::GA4_TOP_PAGES);
    }
    tools
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_words_split_on_punctuation() {
        let msg = Message::new("what's today's spend/leads");
        assert!(msg.has("today"));
        assert!(msg.has("spend"));
        assert!(msg.has("leads"));
        assert!(!msg.has("today's"));
    }

    #[test]
    fn test_phrase_needs_word_boundaries() {
        assert!(Message::new("users in the last 7 days").has_phrase("7 days"));
        assert!(!Message::new("users in the last 17 days").has_phrase("7 days"));
        assert!(!Message::new("a small time budget").has_phrase("all time"));
        assert!(Message::new("best of all time").has_phrase("all time"));
        assert!(!Message::new("anything").has_phrase(""));
    }

    #[test]
    fn test_infer_tools() {
        assert_eq!(infer_tools("facebook spend this month"), vec![names::META_SPEND_MONTH]);
        assert_eq!(
            infer_tools("cpl for my campaigns"),
            vec![names::META_SPEND_TODAY, names::META_LEADS_TODAY, names::BEST_CAMPAIGN]
        );
        assert!(infer_tools("what's the weather like").is_empty());
    }
}
