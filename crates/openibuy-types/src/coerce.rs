//! Coercion helpers for values plucked out of untrusted payloads
//!
//! The remote service does not commit to a schema: ids arrive as numbers or
//! strings, flags as booleans or the string "true", prices with thousands
//! separators. Everything funnels through these helpers so that a malformed
//! value reads as absent, never as zero.

use serde_json::Value;

/// Interpret a JSON value as a positive integer id.
///
/// Accepts numbers and numeric strings. Zero, negatives, non-finite numbers
/// and non-numeric strings are all treated as absent.
pub fn positive_id(value: &Value) -> Option<u64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    if !n.is_finite() || n <= 0.0 {
        return None;
    }
    Some(n.floor() as u64)
}

/// Interpret a JSON value as a non-empty string.
///
/// Numbers are rendered to their decimal form; strings are trimmed. Anything
/// else, and the empty string, read as absent.
pub fn non_empty_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// First non-empty string among the given object fields.
///
/// Mirrors the camel/snake alias lists used throughout payload recognition:
/// the first key that yields a non-empty string wins.
pub fn first_string(obj: &Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| obj.get(key))
        .find_map(non_empty_string)
}

/// Whether a payload flag is set.
///
/// Accepts boolean `true` or the case-insensitive string `"true"`.
pub fn flag_is_set(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::String(s) => s.trim().eq_ignore_ascii_case("true"),
        _ => false,
    }
}

/// Parse a price string into a comparable number.
///
/// Strips thousands separators and surrounding whitespace. Negative and
/// non-finite results are rejected.
pub fn parse_price_str(raw: &str) -> Option<f64> {
    let cleaned = raw.trim().replace(',', "");
    if cleaned.is_empty() {
        return None;
    }
    let n = cleaned.parse::<f64>().ok()?;
    if !n.is_finite() || n < 0.0 {
        return None;
    }
    Some(n)
}

/// Parse a JSON value as a price.
pub fn parse_price(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => {
            let n = n.as_f64()?;
            if n.is_finite() && n >= 0.0 {
                Some(n)
            } else {
                None
            }
        }
        Value::String(s) => parse_price_str(s),
        _ => None,
    }
}
