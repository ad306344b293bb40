//! Builtin constraint predicates

use crate::kind::RuleKind;
use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

fn email_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"^[a-zA-Z0-9]([a-zA-Z0-9._%+-]*[a-zA-Z0-9])?@[a-zA-Z0-9]([a-zA-Z0-9.-]*[a-zA-Z0-9])?\.[a-zA-Z]{2,}$",
        )
        .unwrap()
    })
}

fn float_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[-+]?([0-9]+(\.[0-9]*)?|\.[0-9]+)([eE][-+]?[0-9]+)?$").unwrap()
    })
}

fn hex_color_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^#?([0-9a-fA-F]{3}|[0-9a-fA-F]{6})$").unwrap())
}

fn as_str(value: &Value) -> Option<&str> {
    value.as_str()
}

/// Numeric view of a value: a JSON number, or a string that parses as one.
fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

fn str_check(value: &Value, check: impl Fn(&str) -> bool) -> bool {
    as_str(value).map(check).unwrap_or(false)
}

fn is_base64(s: &str) -> bool {
    if s.is_empty() || s.len() % 4 != 0 {
        return false;
    }
    let trimmed = s.trim_end_matches('=');
    if s.len() - trimmed.len() > 2 {
        return false;
    }
    trimmed
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || b == b'+' || b == b'/')
}

fn is_int_string(s: &str) -> bool {
    let digits = s.strip_prefix(['-', '+']).unwrap_or(s);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }
    // No leading zeros except the literal zero.
    digits.len() == 1 || !digits.starts_with('0')
}

fn is_uuid(s: &str, version: Option<u8>) -> bool {
    if s.len() != 36 || s.as_bytes()[8] != b'-' {
        return false;
    }
    match s.parse::<uuid::Uuid>() {
        Ok(parsed) => match version {
            Some(v) => parsed.get_version_num() == v as usize,
            None => true,
        },
        Err(_) => false,
    }
}

fn is_url(s: &str) -> bool {
    if s.is_empty() || s.contains(char::is_whitespace) {
        return false;
    }
    match url::Url::parse(s) {
        Ok(parsed) => parsed.has_host(),
        // Scheme-less inputs like "example.com/path" still count.
        Err(url::ParseError::RelativeUrlWithoutBase) => url::Url::parse(&format!("http://{}", s))
            .map(|p| p.has_host() && p.host_str().map_or(false, |h| h.contains('.')))
            .unwrap_or(false),
        Err(_) => false,
    }
}

fn is_iso8601(s: &str) -> bool {
    chrono::DateTime::parse_from_rfc3339(s).is_ok()
        || chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S").is_ok()
        || chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok()
}

/// Evaluate a builtin constraint against a value.
///
/// Missing and null values pass every check except the presence checks;
/// a present value of the wrong shape fails.
pub(crate) fn holds(kind: &RuleKind, value: &Value) -> bool {
    if value.is_null() {
        return !matches!(kind, RuleKind::NotEmpty | RuleKind::NotEmptyArray);
    }

    match kind {
        RuleKind::Contains(needle) => str_check(value, |s| s.contains(needle.as_str())),
        RuleKind::NotContains(needle) => str_check(value, |s| !s.contains(needle.as_str())),
        RuleKind::Equals(expected) => value == expected,
        RuleKind::NotEquals(expected) => value != expected,
        RuleKind::IsIn(allowed) => allowed.contains(value),
        RuleKind::IsNotIn(forbidden) => !forbidden.contains(value),

        RuleKind::Alpha => str_check(value, |s| {
            !s.is_empty() && s.bytes().all(|b| b.is_ascii_alphabetic())
        }),
        RuleKind::Alphanumeric => str_check(value, |s| {
            !s.is_empty() && s.bytes().all(|b| b.is_ascii_alphanumeric())
        }),
        RuleKind::Ascii => str_check(value, |s| s.is_ascii()),
        RuleKind::Base64 => str_check(value, is_base64),
        RuleKind::Hexadecimal => str_check(value, |s| {
            !s.is_empty() && s.bytes().all(|b| b.is_ascii_hexdigit())
        }),
        RuleKind::HexColor => str_check(value, |s| hex_color_regex().is_match(s)),
        RuleKind::Lowercase => str_check(value, |s| !s.chars().any(char::is_uppercase)),
        RuleKind::Uppercase => str_check(value, |s| !s.chars().any(char::is_lowercase)),
        RuleKind::BooleanString => {
            str_check(value, |s| matches!(s, "true" | "false" | "1" | "0"))
        }
        RuleKind::NumericString => str_check(value, |s| {
            let digits = s.strip_prefix(['-', '+']).unwrap_or(s);
            !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
        }),
        RuleKind::IntString => str_check(value, is_int_string),
        RuleKind::FloatString => str_check(value, |s| float_regex().is_match(s)),
        RuleKind::Json => str_check(value, |s| {
            matches!(
                serde_json::from_str::<Value>(s),
                Ok(Value::Object(_)) | Ok(Value::Array(_))
            )
        }),
        RuleKind::Email => str_check(value, |s| s.len() <= 320 && email_regex().is_match(s)),
        RuleKind::Url => str_check(value, is_url),
        RuleKind::Uuid(version) => str_check(value, |s| is_uuid(s, *version)),
        RuleKind::Ip => str_check(value, |s| s.parse::<std::net::IpAddr>().is_ok()),
        RuleKind::Iso8601 => str_check(value, is_iso8601),

        RuleKind::IsBoolean => value.is_boolean(),
        RuleKind::DivisibleBy(divisor) => as_number(value)
            .map(|n| *divisor != 0.0 && (n % divisor).abs() < f64::EPSILON)
            .unwrap_or(false),
        RuleKind::MinNumber(min) => as_number(value).map(|n| n >= *min).unwrap_or(false),
        RuleKind::MaxNumber(max) => as_number(value).map(|n| n <= *max).unwrap_or(false),

        RuleKind::Length { min, max } => str_check(value, |s| {
            let len = s.chars().count();
            len >= *min && max.map_or(true, |max| len <= max)
        }),
        RuleKind::MinLength(min) => str_check(value, |s| s.chars().count() >= *min),
        RuleKind::MaxLength(max) => str_check(value, |s| s.chars().count() <= *max),
        RuleKind::NotEmpty => match value {
            Value::String(s) => !s.is_empty(),
            Value::Null => false,
            _ => true,
        },
        RuleKind::NotEmptyArray => value.as_array().map(|a| !a.is_empty()).unwrap_or(false),
        RuleKind::MinSize(min) => value.as_array().map(|a| a.len() >= *min).unwrap_or(false),
        RuleKind::MaxSize(max) => value.as_array().map(|a| a.len() <= *max).unwrap_or(false),

        // Custom, nested, pattern and sanitizer kinds are dispatched by
        // the engine.
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_contains() {
        assert!(holds(&RuleKind::Contains("hello".into()), &json!("hello world")));
        assert!(!holds(&RuleKind::Contains("hello".into()), &json!("bye world")));
        assert!(!holds(&RuleKind::Contains("hello".into()), &json!(42)));
    }

    #[test]
    fn test_null_passes_except_presence_checks() {
        assert!(holds(&RuleKind::Contains("hello".into()), &Value::Null));
        assert!(holds(&RuleKind::MinNumber(10.0), &Value::Null));
        assert!(holds(&RuleKind::Email, &Value::Null));
        assert!(!holds(&RuleKind::NotEmpty, &Value::Null));
        assert!(!holds(&RuleKind::NotEmptyArray, &Value::Null));
    }

    #[test]
    fn test_equality_and_membership() {
        assert!(holds(&RuleKind::Equals(json!("x")), &json!("x")));
        assert!(!holds(&RuleKind::Equals(json!("x")), &json!("y")));
        assert!(holds(
            &RuleKind::IsIn(vec![json!("a"), json!("b")]),
            &json!("b")
        ));
        assert!(!holds(
            &RuleKind::IsNotIn(vec![json!("a"), json!("b")]),
            &json!("b")
        ));
    }

    #[test]
    fn test_string_shapes() {
        assert!(holds(&RuleKind::Alpha, &json!("hello")));
        assert!(!holds(&RuleKind::Alpha, &json!("hello1")));
        assert!(holds(&RuleKind::Alphanumeric, &json!("hello1")));
        assert!(!holds(&RuleKind::Alphanumeric, &json!("hello world")));
        assert!(holds(&RuleKind::Ascii, &json!("abc 123!")));
        assert!(!holds(&RuleKind::Ascii, &json!("héllo")));
        assert!(holds(&RuleKind::Lowercase, &json!("abc 123")));
        assert!(!holds(&RuleKind::Lowercase, &json!("Abc")));
        assert!(holds(&RuleKind::Hexadecimal, &json!("deadBEEF01")));
        assert!(holds(&RuleKind::HexColor, &json!("#ff00aa")));
        assert!(holds(&RuleKind::HexColor, &json!("f0a")));
        assert!(!holds(&RuleKind::HexColor, &json!("#ff00a")));
        assert!(holds(&RuleKind::Base64, &json!("aGVsbG8=")));
        assert!(!holds(&RuleKind::Base64, &json!("not base64!")));
    }

    #[test]
    fn test_numeric_strings() {
        assert!(holds(&RuleKind::NumericString, &json!("-42")));
        assert!(!holds(&RuleKind::NumericString, &json!("4.2")));
        assert!(holds(&RuleKind::IntString, &json!("0")));
        assert!(holds(&RuleKind::IntString, &json!("-120")));
        assert!(!holds(&RuleKind::IntString, &json!("042")));
        assert!(holds(&RuleKind::FloatString, &json!("-1.5e3")));
        assert!(holds(&RuleKind::FloatString, &json!(".5")));
        assert!(!holds(&RuleKind::FloatString, &json!("1.2.3")));
        assert!(holds(&RuleKind::BooleanString, &json!("true")));
        assert!(!holds(&RuleKind::BooleanString, &json!("yes")));
    }

    #[test]
    fn test_json_check_requires_object_or_array() {
        assert!(holds(&RuleKind::Json, &json!(r#"{"a": 1}"#)));
        assert!(holds(&RuleKind::Json, &json!("[1, 2]")));
        assert!(!holds(&RuleKind::Json, &json!("42")));
        assert!(!holds(&RuleKind::Json, &json!("not json")));
    }

    #[test]
    fn test_formats() {
        assert!(holds(&RuleKind::Email, &json!("user@example.com")));
        assert!(!holds(&RuleKind::Email, &json!("user@")));
        assert!(!holds(&RuleKind::Email, &json!("@example.com")));

        assert!(holds(&RuleKind::Url, &json!("https://example.com/path?q=1")));
        assert!(holds(&RuleKind::Url, &json!("example.com/path")));
        assert!(!holds(&RuleKind::Url, &json!("not a url")));

        assert!(holds(
            &RuleKind::Uuid(None),
            &json!("67e55044-10b1-426f-9247-bb680e5fe0c8")
        ));
        assert!(holds(
            &RuleKind::Uuid(Some(4)),
            &json!("9b4d6e12-21f4-45cd-8af4-5a9c1b38a71e")
        ));
        assert!(!holds(
            &RuleKind::Uuid(Some(3)),
            &json!("9b4d6e12-21f4-45cd-8af4-5a9c1b38a71e")
        ));
        assert!(!holds(&RuleKind::Uuid(None), &json!("not-a-uuid")));

        assert!(holds(&RuleKind::Ip, &json!("192.168.1.1")));
        assert!(holds(&RuleKind::Ip, &json!("::1")));
        assert!(!holds(&RuleKind::Ip, &json!("999.1.1.1")));

        assert!(holds(&RuleKind::Iso8601, &json!("2024-06-01T12:30:00Z")));
        assert!(holds(&RuleKind::Iso8601, &json!("2024-06-01")));
        assert!(!holds(&RuleKind::Iso8601, &json!("06/01/2024")));
    }

    #[test]
    fn test_numbers() {
        for ok in [10, 20, 30, 40] {
            assert!(holds(&RuleKind::MinNumber(10.0), &json!(ok)));
        }
        for bad in [1, 5, 9, -10] {
            assert!(!holds(&RuleKind::MinNumber(10.0), &json!(bad)));
        }
        assert!(!holds(&RuleKind::MinNumber(10.0), &json!(9.9)));
        // String numbers count.
        assert!(holds(&RuleKind::MinNumber(10.0), &json!("12")));
        assert!(holds(&RuleKind::MaxNumber(10.0), &json!(10)));
        assert!(!holds(&RuleKind::MaxNumber(10.0), &json!(11)));
        assert!(holds(&RuleKind::DivisibleBy(3.0), &json!(9)));
        assert!(!holds(&RuleKind::DivisibleBy(3.0), &json!(10)));
        assert!(!holds(&RuleKind::DivisibleBy(0.0), &json!(10)));
        assert!(holds(&RuleKind::IsBoolean, &json!(true)));
        assert!(!holds(&RuleKind::IsBoolean, &json!("true")));
    }

    #[test]
    fn test_lengths_count_characters() {
        let kind = RuleKind::Length { min: 2, max: Some(3) };
        assert!(holds(&kind, &json!("de")));
        assert!(holds(&kind, &json!("abc")));
        assert!(!holds(&kind, &json!("")));
        assert!(!holds(&kind, &json!("a")));
        assert!(!holds(&kind, &json!("abcd")));
        // Multi-byte characters count once each.
        assert!(holds(&RuleKind::MaxLength(3), &json!("héé")));
        assert!(holds(&RuleKind::MinLength(5), &json!("héllo")));
    }

    #[test]
    fn test_sizes() {
        assert!(holds(&RuleKind::NotEmptyArray, &json!(["a"])));
        assert!(!holds(&RuleKind::NotEmptyArray, &json!([])));
        assert!(holds(&RuleKind::MinSize(2), &json!([1, 2])));
        assert!(!holds(&RuleKind::MinSize(2), &json!([1])));
        assert!(holds(&RuleKind::MaxSize(2), &json!([1, 2])));
        assert!(!holds(&RuleKind::MaxSize(2), &json!([1, 2, 3])));
    }

    #[test]
    fn test_not_empty() {
        assert!(holds(&RuleKind::NotEmpty, &json!("x")));
        assert!(!holds(&RuleKind::NotEmpty, &json!("")));
        assert!(holds(&RuleKind::NotEmpty, &json!(0)));
        assert!(holds(&RuleKind::NotEmpty, &json!(false)));
    }
}
