//! Free-text intent classification.
//!
//! Rules are evaluated in a fixed order with short-circuit on first match,
//! so an utterance that could satisfy several patterns always lands on the
//! earliest-listed one.

use std::sync::OnceLock;

use regex::Regex;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Intent {
    Search { query: String },
    AddToCart { product_id: String, qty: u32 },
    TrackOrder { order_id: String, email: String },
    /// A track/check-order prefix without an extractable order id and email;
    /// answered with a usage prompt, no server call.
    TrackOrderUsage,
    Unknown,
}

type Rule = fn(&str) -> Option<Intent>;

/// Precedence: search prefixes beat the add-to-cart pattern, which beats the
/// track prefixes. Exactly one rule fires per utterance.
const RULES: [Rule; 3] = [match_search, match_add_to_cart, match_track_order];

pub fn classify(text: &str) -> Intent {
    for rule in RULES {
        if let Some(intent) = rule(text) {
            return intent;
        }
    }
    Intent::Unknown
}

fn search_prefix() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    // A leading "for" after the verb is filler, not part of the query:
    // "search for hoodie" queries "hoodie". The boundary keeps query words
    // that merely start with "for" (fortune, formal) intact.
    PATTERN.get_or_init(|| {
        Regex::new(r"^(search|find|looking for)(\s+for\b)?\s*").expect("static pattern")
    })
}

fn add_to_cart_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"add (p\d+) x(\d+)").expect("static pattern"))
}

fn order_id_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?i)ORD-\d{4}").expect("static pattern"))
}

fn email_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"[\w.-]+@[\w.-]+\.\w+").expect("static pattern"))
}

fn match_search(text: &str) -> Option<Intent> {
    let lower = text.to_lowercase();
    if !(lower.starts_with("search") || lower.starts_with("find") || lower.starts_with("looking for"))
    {
        return None;
    }
    let query = search_prefix().replace(&lower, "").trim().to_owned();
    Some(Intent::Search { query })
}

fn match_add_to_cart(text: &str) -> Option<Intent> {
    let lower = text.to_lowercase();
    let captures = add_to_cart_pattern().captures(&lower)?;
    let product_id = captures[1].to_owned();
    // The capture is all digits, so a parse failure means overflow; clamp so
    // the utterance still surfaces as an add-to-cart attempt instead of
    // falling through to the help text.
    let qty = captures[2].parse().unwrap_or(u32::MAX);
    Some(Intent::AddToCart { product_id, qty })
}

fn match_track_order(text: &str) -> Option<Intent> {
    let lower = text.to_lowercase();
    if !(lower.starts_with("track") || lower.starts_with("check order")) {
        return None;
    }

    let order_id = order_id_pattern().find(text).map(|m| m.as_str().to_uppercase());
    let email = email_pattern().find(text).map(|m| m.as_str().to_owned());

    match (order_id, email) {
        (Some(order_id), Some(email)) => Some(Intent::TrackOrder { order_id, email }),
        _ => Some(Intent::TrackOrderUsage),
    }
}
