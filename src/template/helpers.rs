// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The fixed helper namespace available to every expression.

use std::fmt::Write as _;
use std::sync::OnceLock;

use chrono::{DateTime, TimeDelta, Utc};
use regex::Regex;
use serde_json::Value;

use crate::error::TemplateError;

use super::context::TemplateContext;
use super::value::{format_number, number, to_display, to_number, truthy};

/// Names of every helper function.
pub const HELPER_NAMES: [&str; 11] = [
    "formatNumber",
    "formatDate",
    "round",
    "min",
    "max",
    "abs",
    "state",
    "attr",
    "iif",
    "relativeTime",
    "parseFloat",
];

/// Format used by `formatDate` when none is given.
pub const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Most decimals `formatNumber`, `round` and `toFixed` accept.
pub(crate) const MAX_DECIMALS: usize = 20;

/// Returns `true` if `name` is a helper.
#[must_use]
pub fn is_helper(name: &str) -> bool {
    HELPER_NAMES.contains(&name)
}

/// Calls helper `name`; `None` if there is no such helper.
pub(crate) fn call(
    name: &str,
    args: &[Value],
    ctx: &TemplateContext,
) -> Option<Result<Value, TemplateError>> {
    let arg = |i: usize| args.get(i).unwrap_or(&Value::Null);

    let result = match name {
        "formatNumber" => Ok(format_number_helper(arg(0), args.get(1))),
        "formatDate" => format_date(arg(0), args.get(1)),
        "round" => Ok(round(to_number(arg(0)), decimals(args.get(1)))),
        "min" => Ok(fold_numbers(args, f64::INFINITY, f64::min)),
        "max" => Ok(fold_numbers(args, f64::NEG_INFINITY, f64::max)),
        "abs" => Ok(number(to_number(arg(0)).abs())),
        "state" => Ok(entity_state(ctx, arg(0))),
        "attr" => Ok(entity_attribute(ctx, arg(0), arg(1))),
        "iif" => Ok(if truthy(arg(0)) {
            arg(1).clone()
        } else {
            arg(2).clone()
        }),
        "relativeTime" => relative_time_helper(arg(0), ctx.now()),
        "parseFloat" => Ok(parse_float(arg(0))),
        _ => return None,
    };
    Some(result)
}

/// Buckets an elapsed duration into a short human phrase.
///
/// Each tier uses floor division; negative durations read as "just now".
///
/// # Examples
///
/// ```
/// use chrono::TimeDelta;
/// use room_card::template::relative_time;
///
/// assert_eq!(relative_time(TimeDelta::seconds(59)), "just now");
/// assert_eq!(relative_time(TimeDelta::seconds(60)), "1 minute ago");
/// assert_eq!(relative_time(TimeDelta::minutes(150)), "2 hours ago");
/// assert_eq!(relative_time(TimeDelta::hours(24)), "1 day ago");
/// ```
#[must_use]
pub fn relative_time(elapsed: TimeDelta) -> String {
    let seconds = elapsed.num_seconds();
    let (count, unit) = if seconds < 60 {
        return "just now".to_string();
    } else if seconds < 60 * 60 {
        (seconds / 60, "minute")
    } else if seconds < 24 * 60 * 60 {
        (seconds / (60 * 60), "hour")
    } else {
        (seconds / (24 * 60 * 60), "day")
    };
    let plural = if count == 1 { "" } else { "s" };
    format!("{count} {unit}{plural} ago")
}

/// Reads the `decimals` argument, clamped into `0..=20`.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub(crate) fn decimals(value: Option<&Value>) -> usize {
    let n = value.map_or(0.0, to_number);
    if n.is_nan() {
        return 0;
    }
    // Safe: clamped into 0..=MAX_DECIMALS before the cast.
    n.trunc().clamp(0.0, MAX_DECIMALS as f64) as usize
}

/// `Math.round` semantics: halves round towards positive infinity.
fn round(n: f64, decimals: usize) -> Value {
    let factor = 10f64.powi(i32::try_from(decimals).unwrap_or(0));
    number((n * factor + 0.5).floor() / factor)
}

fn format_number_helper(value: &Value, decimals_arg: Option<&Value>) -> Value {
    let n = to_number(value);
    if n.is_nan() {
        return Value::String(to_display(value));
    }
    let text = match decimals_arg {
        Some(d) if !d.is_null() => format!("{n:.prec$}", prec = decimals(Some(d))),
        _ => format_number(n),
    };
    Value::String(text)
}

fn fold_numbers(args: &[Value], init: f64, pick: fn(f64, f64) -> f64) -> Value {
    let mut acc = init;
    let items = match args {
        [Value::Array(items)] => items.as_slice(),
        _ => args,
    };
    for item in items {
        let n = to_number(item);
        if n.is_nan() {
            return Value::Null;
        }
        acc = pick(acc, n);
    }
    number(acc)
}

fn entity_state(ctx: &TemplateContext, entity_id: &Value) -> Value {
    entity_id
        .as_str()
        .and_then(|id| ctx.states().get(id))
        .map_or(Value::Null, |e| Value::String(e.state.clone()))
}

fn entity_attribute(ctx: &TemplateContext, entity_id: &Value, name: &Value) -> Value {
    let (Some(id), Some(name)) = (entity_id.as_str(), name.as_str()) else {
        return Value::Null;
    };
    ctx.states()
        .get(id)
        .and_then(|e| e.attribute(name))
        .cloned()
        .unwrap_or(Value::Null)
}

/// Reads a timestamp: RFC 3339 text or epoch milliseconds.
#[allow(clippy::cast_possible_truncation)]
fn timestamp(value: &Value) -> Result<Option<DateTime<Utc>>, TemplateError> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) => DateTime::parse_from_rfc3339(s.trim())
            .map(|dt| Some(dt.with_timezone(&Utc)))
            .map_err(|e| TemplateError::eval(format!("invalid date {s:?}: {e}"))),
        Value::Number(n) => {
            let millis = n.as_f64().unwrap_or(f64::NAN);
            if !millis.is_finite() {
                return Err(TemplateError::eval("invalid date"));
            }
            // Safe: out-of-range values are rejected by from_timestamp_millis.
            DateTime::from_timestamp_millis(millis as i64)
                .map(Some)
                .ok_or_else(|| TemplateError::eval(format!("date out of range: {millis}")))
        }
        other => Err(TemplateError::eval(format!(
            "invalid date {}",
            to_display(other)
        ))),
    }
}

fn format_date(value: &Value, format: Option<&Value>) -> Result<Value, TemplateError> {
    let Some(at) = timestamp(value)? else {
        return Ok(Value::String(String::new()));
    };
    let format = format.and_then(Value::as_str).unwrap_or(DEFAULT_DATE_FORMAT);
    let mut text = String::new();
    write!(text, "{}", at.format(format))
        .map_err(|_| TemplateError::eval(format!("invalid date format {format:?}")))?;
    Ok(Value::String(text))
}

fn relative_time_helper(value: &Value, now: DateTime<Utc>) -> Result<Value, TemplateError> {
    let Some(at) = timestamp(value)? else {
        return Ok(Value::String(String::new()));
    };
    Ok(Value::String(relative_time(now - at)))
}

fn float_prefix() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[+-]?(?:[0-9]+\.?[0-9]*|\.[0-9]+)(?:[eE][+-]?[0-9]+)?")
            .expect("static float pattern compiles")
    })
}

/// `parseFloat`: the longest numeric prefix, `null` if there is none.
fn parse_float(value: &Value) -> Value {
    match value {
        Value::Number(_) => value.clone(),
        Value::String(s) => float_prefix()
            .find(s.trim_start())
            .and_then(|m| m.as_str().parse::<f64>().ok())
            .map_or(Value::Null, number),
        _ => Value::Null,
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use serde_json::json;

    use super::*;
    use crate::state::{EntityState, StateSnapshot};

    fn ctx() -> TemplateContext {
        let states = StateSnapshot::new().with(
            EntityState::new("sensor.humidity", "48.2").with_attribute("unit_of_measurement", "%"),
        );
        TemplateContext::new(states)
            .with_now(Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap())
    }

    fn run(name: &str, args: &[Value]) -> Value {
        call(name, args, &ctx()).unwrap().unwrap()
    }

    #[test]
    fn unknown_helper_is_none() {
        assert!(call("eval", &[], &ctx()).is_none());
        assert!(is_helper("iif"));
        assert!(!is_helper("window"));
    }

    #[test]
    fn relative_time_buckets() {
        assert_eq!(relative_time(TimeDelta::seconds(-5)), "just now");
        assert_eq!(relative_time(TimeDelta::seconds(119)), "1 minute ago");
        assert_eq!(relative_time(TimeDelta::minutes(59)), "59 minutes ago");
        assert_eq!(relative_time(TimeDelta::minutes(60)), "1 hour ago");
        assert_eq!(relative_time(TimeDelta::hours(47)), "1 day ago");
        assert_eq!(relative_time(TimeDelta::days(3)), "3 days ago");
    }

    #[test]
    fn relative_time_from_timestamp() {
        let out = run("relativeTime", &[json!("2024-05-01T11:57:30Z")]);
        assert_eq!(out, json!("2 minutes ago"));
    }

    #[test]
    fn number_helpers() {
        assert_eq!(run("formatNumber", &[json!(21.456), json!(1)]), json!("21.5"));
        assert_eq!(run("formatNumber", &[json!("7")]), json!("7"));
        assert_eq!(run("round", &[json!(2.5)]), json!(3));
        assert_eq!(run("round", &[json!(-2.5)]), json!(-2));
        assert_eq!(run("round", &[json!(1.2345), json!(2)]), json!(1.23));
        assert_eq!(run("min", &[json!(3), json!(1), json!(2)]), json!(1));
        assert_eq!(run("max", &[json!([3, 9, 2])]), json!(9));
        assert_eq!(run("abs", &[json!(-4)]), json!(4));
        assert_eq!(run("parseFloat", &[json!("21.5 °C")]), json!(21.5));
        assert_eq!(run("parseFloat", &[json!("abc")]), Value::Null);
    }

    #[test]
    fn state_lookups() {
        assert_eq!(run("state", &[json!("sensor.humidity")]), json!("48.2"));
        assert_eq!(run("state", &[json!("sensor.missing")]), Value::Null);
        assert_eq!(
            run("attr", &[json!("sensor.humidity"), json!("unit_of_measurement")]),
            json!("%")
        );
        assert_eq!(run("iif", &[json!(0), json!("a"), json!("b")]), json!("b"));
    }

    #[test]
    fn format_date_uses_strftime() {
        let out = run("formatDate", &[json!("2024-05-01T08:05:00Z"), json!("%H:%M")]);
        assert_eq!(out, json!("08:05"));
        assert_eq!(run("formatDate", &[Value::Null]), json!(""));
        assert!(call("formatDate", &[json!("yesterday")], &ctx()).unwrap().is_err());
    }
}
