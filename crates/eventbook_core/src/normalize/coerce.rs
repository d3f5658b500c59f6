//! Best-effort scalar coercion for untrusted JSON.
//!
//! # Responsibility
//! - Turn arbitrary JSON values into numbers/strings with a default on
//!   failure, matching the loose conversions older front-ends relied on.
//!
//! # Invariants
//! - Coercion never fails and never yields a non-finite number.

use serde_json::Value;

/// Coerces `value` into a finite number, `0.0` when it has no numeric reading.
///
/// Strings are trimmed and parsed (empty -> 0, `0x`/`0o`/`0b` prefixes allowed),
/// booleans map to 1/0, a single-element array coerces its element, anything
/// else is 0.
pub fn coerce_number(value: &Value) -> f64 {
    let number = match value {
        Value::Null => 0.0,
        Value::Bool(flag) => {
            if *flag {
                1.0
            } else {
                0.0
            }
        }
        Value::Number(number) => number.as_f64().unwrap_or(0.0),
        Value::String(text) => parse_numeric_text(text).unwrap_or(0.0),
        Value::Array(items) => match items.as_slice() {
            [] => 0.0,
            [single @ (Value::Number(_) | Value::String(_) | Value::Array(_))] => {
                coerce_number(single)
            }
            _ => 0.0,
        },
        Value::Object(_) => 0.0,
    };

    if number.is_finite() {
        number
    } else {
        0.0
    }
}

/// Coerces `value` into a string, returning `fallback` for falsy input.
///
/// Falsy values are `null`, `false`, `0`, and `""`.
pub fn coerce_string(value: &Value, fallback: &str) -> String {
    if !is_truthy(value) {
        return fallback.to_string();
    }
    display_value(value)
}

/// Returns whether `value` counts as set for defaulting purposes.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number
            .as_f64()
            .map_or(true, |float| float != 0.0 && !float.is_nan()),
        Value::String(text) => !text.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn display_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(flag) => flag.to_string(),
        Value::Number(number) => display_number(number),
        Value::String(text) => text.clone(),
        Value::Array(items) => items
            .iter()
            .map(display_value)
            .collect::<Vec<_>>()
            .join(","),
        Value::Object(_) => "[object Object]".to_string(),
    }
}

fn display_number(number: &serde_json::Number) -> String {
    if number.is_i64() || number.is_u64() {
        return number.to_string();
    }
    match number.as_f64() {
        // 2.0 renders as "2", not "2.0".
        Some(float) if float.fract() == 0.0 && float.abs() < 1e15 => format!("{}", float as i64),
        Some(float) => format!("{float}"),
        None => number.to_string(),
    }
}

fn parse_numeric_text(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Some(0.0);
    }

    for (prefix, radix) in [("0x", 16), ("0X", 16), ("0o", 8), ("0O", 8), ("0b", 2), ("0B", 2)] {
        if let Some(digits) = trimmed.strip_prefix(prefix) {
            // from_str_radix tolerates a sign; prefixed literals do not.
            if digits.starts_with(['+', '-']) {
                return None;
            }
            return u64::from_str_radix(digits, radix).ok().map(|value| value as f64);
        }
    }

    // Rust accepts "inf"/"nan" spellings; they end up non-finite and are
    // mapped to 0 by the caller.
    trimmed.parse::<f64>().ok()
}
