//! Tool result normalization
//!
//! A tool response may carry its payload as structured data, as a single
//! text block holding JSON, or as plain prose. Normalization flattens all
//! three into one payload shape so the extraction layer only ever sees
//! JSON values.

use serde_json::{json, Value};

use openibuy_types::first_string;

/// Normalize a raw `tools/call` result.
///
/// Priority: `structuredContent` object; else the first `content[]` block
/// with `type == "text"`, parsed as JSON when possible and wrapped as a
/// `{success, message}` payload when not; a bare `isError` with no
/// content synthesizes a failure payload; anything else passes through.
pub fn normalize_tool_result(raw: Value) -> Value {
    if !raw.is_object() {
        return raw;
    }
    if let Some(structured) = raw.get("structuredContent") {
        if structured.is_object() {
            return structured.clone();
        }
    }

    let is_error = raw
        .get("isError")
        .and_then(Value::as_bool)
        .unwrap_or(false);

    let text = raw
        .get("content")
        .and_then(Value::as_array)
        .and_then(|items| {
            items.iter().find_map(|item| {
                if item.get("type").and_then(Value::as_str) == Some("text") {
                    item.get("text").and_then(Value::as_str)
                } else {
                    None
                }
            })
        });

    if let Some(text) = text {
        return match serde_json::from_str::<Value>(text) {
            Ok(parsed) => parsed,
            Err(_) => json!({ "success": !is_error, "message": text }),
        };
    }

    if is_error {
        return json!({
            "success": false,
            "message": "tools/call returned isError=true",
            "raw": raw,
        });
    }

    raw
}

/// Explicit failure signal carried by a normalized payload.
///
/// A payload with `success: false` always signals stage failure; the
/// carried `error` or `message` text is returned for the error report.
pub fn failure_message(payload: &Value) -> Option<String> {
    if payload.get("success").and_then(Value::as_bool) == Some(false) {
        return Some(
            first_string(payload, &["error", "message"])
                .unwrap_or_else(|| "unknown error".to_string()),
        );
    }
    None
}
