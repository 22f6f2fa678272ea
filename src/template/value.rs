// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! JavaScript-flavoured conversions over JSON values.
//!
//! Expressions compute with [`serde_json::Value`]. `undefined` and `NaN`
//! both collapse to `null`; numbers with no fractional part are stored as
//! integers so they print without a trailing `.0`.

use serde_json::Value;

/// Largest integer stored exactly in an `f64`.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

/// Wraps an `f64` the way expressions store numbers.
#[allow(clippy::cast_possible_truncation)]
pub(crate) fn number(n: f64) -> Value {
    if !n.is_finite() {
        return Value::Null;
    }
    if n.fract() == 0.0 && n.abs() <= MAX_SAFE_INTEGER {
        // Safe: integral and within the exactly-representable range.
        return Value::from(n as i64);
    }
    Value::from(n)
}

/// JavaScript truthiness.
pub(crate) fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0 && !n.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// JavaScript `Number(value)`; `NaN` when there is no sensible number.
pub(crate) fn to_number(value: &Value) -> f64 {
    match value {
        Value::Null => 0.0,
        Value::Bool(b) => f64::from(u8::from(*b)),
        Value::Number(n) => n.as_f64().unwrap_or(f64::NAN),
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                0.0
            } else {
                trimmed.parse().unwrap_or(f64::NAN)
            }
        }
        Value::Array(items) => match items.as_slice() {
            [] => 0.0,
            [single] => to_number(single),
            _ => f64::NAN,
        },
        Value::Object(_) => f64::NAN,
    }
}

/// Formats a number the way JavaScript prints it.
#[allow(clippy::cast_possible_truncation)]
pub(crate) fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
    } else if n.fract() == 0.0 && n.abs() <= MAX_SAFE_INTEGER {
        // Safe: integral and within the exactly-representable range.
        (n as i64).to_string()
    } else {
        n.to_string()
    }
}

/// JavaScript `String(value)`, except objects print as JSON.
pub(crate) fn to_display(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => format_number(n.as_f64().unwrap_or(f64::NAN)),
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::Null => String::new(),
                other => to_display(other),
            })
            .collect::<Vec<_>>()
            .join(","),
        Value::Object(_) => value.to_string(),
    }
}

/// Renders a block result into the surrounding string; `null` renders empty.
pub(crate) fn to_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        other => to_display(other),
    }
}

/// `===`
pub(crate) fn strict_equals(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => a.as_f64() == b.as_f64(),
        _ => left == right,
    }
}

/// `==`
pub(crate) fn loose_equals(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Null, Value::Null) => true,
        (Value::Null, _) | (_, Value::Null) => false,
        (Value::Number(_) | Value::String(_) | Value::Bool(_), Value::Bool(_))
        | (Value::Bool(_), Value::Number(_) | Value::String(_))
        | (Value::Number(_), Value::String(_))
        | (Value::String(_), Value::Number(_)) => to_number(left) == to_number(right),
        _ => strict_equals(left, right),
    }
}
