//! Precision-preserving wire encoding for 64-bit integers.
//!
//! JSON has no integer width, but JavaScript clients read numbers as IEEE 754
//! doubles and silently corrupt anything past 2^53 - 1. Outbound values are
//! therefore rewritten so that any 64-bit integer outside the safe range
//! travels as a JSON string; the parse phase accepts both encodings inbound.

use serde_json::Value;

/// Largest integer exactly representable as an IEEE 754 double (2^53 - 1).
pub const MAX_SAFE_INTEGER: i64 = 9_007_199_254_740_991;

/// Whether a 64-bit integer survives the default JSON number encoding.
#[must_use]
pub fn fits_safe_range(n: i64) -> bool {
    (-MAX_SAFE_INTEGER..=MAX_SAFE_INTEGER).contains(&n)
}

/// Rewrite an outbound value tree, string-encoding integers that would lose
/// precision as JSON numbers. Everything else passes through untouched.
#[must_use]
pub fn encode(value: Value) -> Value {
    match value {
        Value::Number(n) => match n.as_i64() {
            Some(i) if !fits_safe_range(i) => Value::String(i.to_string()),
            _ => Value::Number(n),
        },
        Value::Array(items) => Value::Array(items.into_iter().map(encode).collect()),
        Value::Object(map) => Value::Object(map.into_iter().map(|(k, v)| (k, encode(v))).collect()),
        other => other,
    }
}
