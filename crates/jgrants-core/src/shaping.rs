//! Response shaping for upstream envelopes.
//!
//! Upstream wraps every payload as `{"metadata": {...}, "result": ...}`. Records themselves are
//! passed through untouched.

use crate::error::{GrantsError, Result};
use crate::query::SearchQuery;
use serde_json::{Value, json};

/// Unwrap a detail envelope into the single subsidy record it carries.
///
/// - `result` is a non-empty list: the first element is returned.
/// - `result` is an object: it is returned as-is.
/// - no `result` key: the envelope itself is treated as the record.
///
/// # Errors
///
/// Returns [`GrantsError::UnexpectedShape`] for anything else (empty list, scalar, null).
pub fn unwrap_detail(envelope: Value) -> Result<Value> {
    let data = match envelope {
        Value::Object(mut map) => match map.remove("result") {
            Some(result) => result,
            None => Value::Object(map),
        },
        other => other,
    };

    match data {
        Value::Array(items) if !items.is_empty() => {
            Ok(items.into_iter().next().unwrap_or(Value::Null))
        }
        Value::Object(_) => Ok(data),
        other => {
            tracing::error!(result = %other, "unexpected detail response shape");
            Err(GrantsError::UnexpectedShape(json_type_name(&other).to_string()))
        }
    }
}

/// Turn a search envelope into `{total_count, subsidies, search_conditions}`.
///
/// `total_count` prefers upstream's `metadata.resultset.count` and falls back to the number of
/// returned records.
#[must_use]
pub fn search_result(envelope: Value, query: &SearchQuery) -> Value {
    let count = envelope
        .pointer("/metadata/resultset/count")
        .and_then(Value::as_u64);

    let subsidies = match envelope {
        Value::Object(mut map) => match map.remove("result") {
            Some(Value::Array(items)) => items,
            Some(Value::Null) | None => Vec::new(),
            Some(single) => vec![single],
        },
        Value::Array(items) => items,
        _ => Vec::new(),
    };

    json!({
        "total_count": count.unwrap_or(subsidies.len() as u64),
        "subsidies": subsidies,
        "search_conditions": query.conditions(),
    })
}

/// JSON type name used in shape errors.
#[must_use]
pub fn json_type_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(items) if items.is_empty() => "empty array",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
