// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Normalisation of loosely-typed stored values.
//!
//! Rows written by older clients hold counters as numbers, numeric strings,
//! floats or nothing at all. Everything that does arithmetic on a stored
//! counter goes through [`normalize_counter`] first.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Coerce any stored representation of a counter to a non-negative integer.
///
/// Numbers and numeric strings are accepted; negatives clamp to 0, fractions
/// truncate. Anything else (null, bool, garbage text, arrays) is 0.
pub fn normalize_counter(value: &Value) -> u64 {
    match value {
        Value::Number(n) => {
            if let Some(u) = n.as_u64() {
                u
            } else if let Some(f) = n.as_f64() {
                clamp_float(f)
            } else {
                0
            }
        }
        Value::String(s) => {
            let s = s.trim();
            s.parse::<u64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().map(clamp_float))
                .unwrap_or(0)
        }
        _ => 0,
    }
}

fn clamp_float(f: f64) -> u64 {
    if f.is_finite() && f > 0.0 {
        f.trunc() as u64
    } else {
        0
    }
}

/// Parse a stored value as a number for comparisons, if it is numeric at all.
pub fn numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Render any stored scalar as the string callers see.
///
/// Strings pass through unquoted, null becomes the empty string, and every
/// other value uses its JSON text.
pub fn display_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// serde adapter: counter field that tolerates heterogeneous stored types.
pub fn lenient_counter<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().map(normalize_counter).unwrap_or(0))
}

/// serde adapter: seats field, same tolerance as [`lenient_counter`].
pub fn lenient_seats<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let count = lenient_counter(deserializer)?;
    Ok(i64::try_from(count).unwrap_or(i64::MAX))
}

/// serde adapter: any scalar rendered through [`display_string`].
pub fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().map(display_string).unwrap_or_default())
}

/// serde adapter: list of ids. Scalars render through [`display_string`];
/// a missing or non-array value is the empty list.
pub fn lenient_strings<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let items = match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Array(items)) => items,
        _ => Vec::new(),
    };
    Ok(items
        .iter()
        .filter(|item| !item.is_null())
        .map(display_string)
        .collect())
}
