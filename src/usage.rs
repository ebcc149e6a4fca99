//! Usage category model and API payload normalization

use chrono::{DateTime, Utc};
use fxhash::FxHashSet;
use serde_json::{Map, Value};

/// Canonical display order for well-known categories
pub const CATEGORY_ORDER: [&str; 4] = [
    "five_hour",
    "seven_day",
    "seven_day_opus",
    "seven_day_sonnet",
];

pub const FIVE_HOURS: i64 = 5 * 3600;
pub const SEVEN_DAYS: i64 = 7 * 24 * 3600;

/// Rolling window length for a known category key
fn known_window(key: &str) -> Option<i64> {
    match key {
        "five_hour" => Some(FIVE_HOURS),
        "seven_day" | "seven_day_opus" | "seven_day_sonnet" => Some(SEVEN_DAYS),
        _ => None,
    }
}

/// Display label for a known category key
fn known_name(key: &str) -> Option<&'static str> {
    match key {
        "five_hour" => Some("Current session"),
        "seven_day" => Some("All models (7-day)"),
        "seven_day_opus" => Some("Opus only (7-day)"),
        "seven_day_sonnet" => Some("Sonnet only (7-day)"),
        _ => None,
    }
}

/// Humanize an unrecognized key: underscores to spaces, title-cased
fn humanize_key(key: &str) -> String {
    key.split('_')
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// One renderable quota line
#[derive(Debug, Clone, PartialEq)]
pub struct UsageCategory {
    pub key: String,
    pub name: String,
    /// Percent consumed, clamped to [0, 100]
    pub utilization: f64,
    /// Window end; None when absent or unparsable
    pub resets_at: Option<DateTime<Utc>>,
    pub window_seconds: i64,
}

/// Extract `utilization` / `resets_at` from one payload entry.
///
/// Returns None when the entry is not an object or carries neither
/// field — such entries are skipped, not reported.
fn extract_entry(value: &Value) -> Option<(f64, Option<DateTime<Utc>>)> {
    let entry = value.as_object()?;
    let utilization = entry.get("utilization").and_then(Value::as_f64);
    let resets_raw = entry.get("resets_at").and_then(Value::as_str);
    if utilization.is_none() && resets_raw.is_none() {
        return None;
    }
    let resets_at = resets_raw.and_then(parse_reset_timestamp);
    Some((utilization.unwrap_or(0.0).clamp(0.0, 100.0), resets_at))
}

/// Parse an RFC 3339 reset timestamp from the API
pub fn parse_reset_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Normalize the raw usage payload into an ordered category list.
///
/// Known keys come first in canonical order, then leftover object
/// entries in payload iteration order with a 7-day default window and
/// a humanized display name. Malformed entries are dropped silently.
pub fn normalize_usage(data: &Map<String, Value>) -> Vec<UsageCategory> {
    let mut categories = Vec::new();
    let mut seen: FxHashSet<&str> = FxHashSet::default();

    for key in CATEGORY_ORDER {
        let Some(value) = data.get(key) else {
            continue;
        };
        seen.insert(key);
        let Some((utilization, resets_at)) = extract_entry(value) else {
            continue;
        };
        categories.push(UsageCategory {
            key: key.to_string(),
            name: known_name(key).unwrap_or(key).to_string(),
            utilization,
            resets_at,
            window_seconds: known_window(key).unwrap_or(FIVE_HOURS),
        });
    }

    // Unknown keys that look like usage categories
    for (key, value) in data {
        if seen.contains(key.as_str()) {
            continue;
        }
        let Some((utilization, resets_at)) = extract_entry(value) else {
            continue;
        };
        categories.push(UsageCategory {
            key: key.clone(),
            name: known_name(key)
                .map(str::to_string)
                .unwrap_or_else(|| humanize_key(key)),
            utilization,
            resets_at,
            window_seconds: known_window(key).unwrap_or(SEVEN_DAYS),
        });
    }

    categories
}
