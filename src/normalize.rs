//! Text canonicalisation applied to every incoming message.
//!
//! All pattern matching downstream (intent rules, corpus retrieval, cache
//! keys) assumes its input went through [`normalize`]. The function is pure,
//! total and idempotent: `normalize(normalize(x)) == normalize(x)`.

/// Single-token rewrites. No right-hand side may appear as a left-hand side,
/// otherwise a second pass would rewrite again.
const TOKEN_FIXES: &[(&str, &str)] = &[
    // time words
    ("tdy", "today"),
    ("tday", "today"),
    ("tody", "today"),
    ("todya", "today"),
    ("toady", "today"),
    ("tdoay", "today"),
    ("2day", "today"),
    ("ystrday", "yesterday"),
    ("yday", "yesterday"),
    ("yest", "yesterday"),
    ("yesterdy", "yesterday"),
    ("yesturday", "yesterday"),
    ("ysterday", "yesterday"),
    ("yestarday", "yesterday"),
    ("yesteday", "yesterday"),
    ("mnth", "month"),
    ("mth", "month"),
    ("mont", "month"),
    ("monht", "month"),
    ("wk", "week"),
    // ads vocabulary
    ("spnd", "spend"),
    ("spemd", "spend"),
    ("speand", "spend"),
    ("spedn", "spend"),
    ("leds", "leads"),
    ("leeds", "leads"),
    ("laeds", "leads"),
    ("leades", "leads"),
    ("campain", "campaign"),
    ("campagin", "campaign"),
    ("campaing", "campaign"),
    ("camapign", "campaign"),
    ("campiagn", "campaign"),
    ("cmpaign", "campaign"),
    ("campains", "campaigns"),
    ("campaings", "campaigns"),
    ("campagins", "campaigns"),
    ("budgt", "budget"),
    ("buget", "budget"),
    ("budjet", "budget"),
    ("perfomance", "performance"),
    ("performace", "performance"),
    ("fb", "facebook"),
    ("metaa", "meta"),
    ("insta", "instagram"),
    ("ig", "instagram"),
    // analytics vocabulary
    ("analytcs", "analytics"),
    ("anlytics", "analytics"),
    ("analitics", "analytics"),
    ("ga-4", "ga4"),
    ("usrs", "users"),
    ("userz", "users"),
    ("usres", "users"),
    ("sesions", "sessions"),
    ("sessons", "sessions"),
    ("sesssions", "sessions"),
    ("sessionz", "sessions"),
    // chat shorthand
    ("comapre", "compare"),
    ("compair", "compare"),
    ("pls", "please"),
    ("plz", "please"),
    ("u", "you"),
    ("hw", "how"),
    ("wat", "what"),
    ("wht", "what"),
];

/// Multi-token rewrites, applied on word boundaries after token fixes.
const PHRASE_FIXES: &[(&str, &str)] = &[
    ("google analytics 4", "ga4"),
    ("ga 4", "ga4"),
    ("cost per lead", "cpl"),
    ("cost-per-lead", "cpl"),
    ("cost per click", "cpc"),
    ("cost-per-click", "cpc"),
    ("all-time", "all time"),
];

/// Tokens after which a stray "add" is read as "ad".
const AD_CONTEXT: &[&str] = &[
    "spend",
    "spends",
    "spending",
    "campaign",
    "campaigns",
    "account",
    "accounts",
    "set",
    "sets",
    "budget",
    "budgets",
    "cost",
    "costs",
    "performance",
    "creative",
    "creatives",
    "copy",
    "library",
    "manager",
    "results",
];

/// Canonicalise free text: lowercase, strip noise punctuation, fix common
/// misspellings, collapse whitespace.
pub fn normalize(text: &str) -> String {
    let cleaned = strip_noise(&text.to_lowercase());

    let mut tokens: Vec<String> = cleaned
        .split_whitespace()
        .map(|raw| raw.trim_matches(|c| matches!(c, '\'' | '-' | '.')))
        .filter(|t| !t.is_empty())
        .map(|t| fix_token(t).to_string())
        .collect();

    resolve_add(&mut tokens);

    apply_phrase_fixes(&tokens.join(" "))
}

fn strip_noise(lower: &str) -> String {
    let chars: Vec<char> = lower.chars().collect();
    let mut out = String::with_capacity(lower.len());

    for (i, &c) in chars.iter().enumerate() {
        match c {
            // thousands separators inside numbers: "1,250" -> "1250"
            ',' if i > 0
                && chars[i - 1].is_ascii_digit()
                && chars.get(i + 1).is_some_and(|n| n.is_ascii_digit()) => {}
            '\u{2019}' | '\u{2018}' => out.push('\''),
            c if c.is_alphanumeric() || c.is_whitespace() => out.push(c),
            '_' | '.' | '%' | '$' | '\u{20b9}' | '\'' | '/' | '-' | '&' => out.push(c),
            _ => out.push(' '),
        }
    }

    out
}

fn fix_token(token: &str) -> &str {
    TOKEN_FIXES
        .iter()
        .find(|(from, _)| *from == token)
        .map(|(_, to)| *to)
        .unwrap_or(token)
}

fn resolve_add(tokens: &mut [String]) {
    for i in 0..tokens.len().saturating_sub(1) {
        if tokens[i] == "add" && AD_CONTEXT.contains(&tokens[i + 1].as_str()) {
            tokens[i] = "ad".to_string();
        }
    }
}

fn apply_phrase_fixes(joined: &str) -> String {
    let mut padded = format!(" {} ", joined);
    for (from, to) in PHRASE_FIXES {
        let needle = format!(" {} ", from);
        let replacement = format!(" {} ", to);
        while padded.contains(&needle) {
            padded = padded.replace(&needle, &replacement);
        }
    }
    padded.split_whitespace().collect::<Vec<_>>().join(" ")
}
