//! Builtin sanitizer transforms

use crate::error::TransformError;
use crate::kind::RuleKind;
use serde_json::{Number, Value};

fn want_string(value: &Value) -> Result<&str, TransformError> {
    value
        .as_str()
        .ok_or_else(|| TransformError::new(format!("expected a string, got {}", shape(value))))
}

fn shape(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn trim_with(s: &str, chars: Option<&str>, left: bool, right: bool) -> String {
    let pred = |c: char| match chars {
        Some(set) => set.contains(c),
        None => c.is_whitespace(),
    };
    let mut out = s;
    if left {
        out = out.trim_start_matches(pred);
    }
    if right {
        out = out.trim_end_matches(pred);
    }
    out.to_string()
}

fn escape_html(s: &str) -> String {
    // Ampersand first so already-escaped entities are not double-touched.
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
        .replace('/', "&#x2F;")
}

fn strip_low(s: &str, keep_new_lines: bool) -> String {
    s.chars()
        .filter(|&c| {
            let code = c as u32;
            let control = code < 32 || code == 127;
            !control || (keep_new_lines && (c == '\n' || c == '\r'))
        })
        .collect()
}

fn normalize_email(s: &str, lowercase: bool) -> Result<String, TransformError> {
    let (local, domain) = s
        .split_once('@')
        .ok_or_else(|| TransformError::new("not an email address"))?;
    let local = if lowercase {
        local.to_lowercase()
    } else {
        local.to_string()
    };
    // The domain part is case-insensitive regardless of the flag.
    Ok(format!("{}@{}", local, domain.to_lowercase()))
}

fn to_boolean(value: &Value, strict: bool) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::String(s) => {
            if strict {
                s == "1" || s == "true"
            } else {
                !s.is_empty() && s != "0" && s != "false"
            }
        }
        Value::Number(n) => n.as_f64().map_or(false, |f| f != 0.0),
        Value::Null => false,
        _ => !strict,
    }
}

fn to_int(value: &Value, radix: u32) -> Result<i64, TransformError> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f.trunc() as i64))
            .ok_or_else(|| TransformError::new("number out of integer range")),
        Value::String(s) => {
            let trimmed = s.trim();
            i64::from_str_radix(trimmed, radix)
                // "12.9" style inputs truncate like the base-10 parseInt.
                .or_else(|e| {
                    if radix == 10 {
                        trimmed
                            .parse::<f64>()
                            .map(|f| f.trunc() as i64)
                            .map_err(|_| e)
                    } else {
                        Err(e)
                    }
                })
                .map_err(|_| {
                    TransformError::new(format!("'{}' is not a base-{} integer", trimmed, radix))
                })
        }
        other => Err(TransformError::new(format!(
            "cannot convert {} to an integer",
            shape(other)
        ))),
    }
}

fn to_float(value: &Value) -> Result<f64, TransformError> {
    match value {
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| TransformError::new("number out of float range")),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| TransformError::new(format!("'{}' is not a number", s.trim()))),
        other => Err(TransformError::new(format!(
            "cannot convert {} to a number",
            shape(other)
        ))),
    }
}

fn to_display_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn to_date(s: &str) -> Result<String, TransformError> {
    if let Ok(parsed) = chrono::DateTime::parse_from_rfc3339(s) {
        return Ok(parsed.to_rfc3339());
    }
    if let Ok(parsed) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Ok(parsed.format("%Y-%m-%dT%H:%M:%S").to_string());
    }
    if let Ok(parsed) = chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Ok(parsed.format("%Y-%m-%d").to_string());
    }
    Err(TransformError::new(format!("'{}' is not a parseable date", s)))
}

/// Apply a builtin sanitizer to a value.
///
/// Null passes through untouched (sanitizers never conjure values); a
/// present value of the wrong shape is a fatal transform failure.
pub(crate) fn apply(kind: &RuleKind, value: Value) -> Result<Value, TransformError> {
    if value.is_null() {
        return Ok(value);
    }

    match kind {
        RuleKind::Trim(chars) => Ok(Value::String(trim_with(
            want_string(&value)?,
            chars.as_deref(),
            true,
            true,
        ))),
        RuleKind::Ltrim(chars) => Ok(Value::String(trim_with(
            want_string(&value)?,
            chars.as_deref(),
            true,
            false,
        ))),
        RuleKind::Rtrim(chars) => Ok(Value::String(trim_with(
            want_string(&value)?,
            chars.as_deref(),
            false,
            true,
        ))),
        RuleKind::Escape => Ok(Value::String(escape_html(want_string(&value)?))),
        RuleKind::Blacklist(set) => Ok(Value::String(
            want_string(&value)?
                .chars()
                .filter(|c| !set.contains(*c))
                .collect(),
        )),
        RuleKind::Whitelist(set) => Ok(Value::String(
            want_string(&value)?
                .chars()
                .filter(|c| set.contains(*c))
                .collect(),
        )),
        RuleKind::StripLow { keep_new_lines } => Ok(Value::String(strip_low(
            want_string(&value)?,
            *keep_new_lines,
        ))),
        RuleKind::NormalizeEmail { lowercase } => {
            normalize_email(want_string(&value)?, *lowercase).map(Value::String)
        }
        RuleKind::ToBoolean { strict } => Ok(Value::Bool(to_boolean(&value, *strict))),
        RuleKind::ToInt { radix } => Ok(Value::Number(Number::from(to_int(&value, *radix)?))),
        RuleKind::ToFloat => {
            let f = to_float(&value)?;
            Number::from_f64(f)
                .map(Value::Number)
                .ok_or_else(|| TransformError::new("result is not a finite number"))
        }
        RuleKind::ToString => Ok(Value::String(to_display_string(&value))),
        RuleKind::ToDate => to_date(want_string(&value)?).map(Value::String),
        // Constraint kinds and CustomSanitize are dispatched by the engine.
        _ => Ok(value),
    }
}
