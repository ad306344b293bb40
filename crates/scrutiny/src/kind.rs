//! Closed set of rule kinds and their default messages

use serde_json::Value;

/// One variant per declarable rule, each carrying its own typed arguments.
///
/// Constraint kinds yield pass/fail against a value; sanitizer kinds
/// transform the value in place before validation. `Custom` and
/// `CustomSanitize` name an implementation registered separately in the
/// metadata registry.
#[derive(Debug, Clone, PartialEq)]
pub enum RuleKind {
    // Equality and membership
    Contains(String),
    NotContains(String),
    Equals(Value),
    NotEquals(Value),
    IsIn(Vec<Value>),
    IsNotIn(Vec<Value>),

    // String shape
    Alpha,
    Alphanumeric,
    Ascii,
    Base64,
    Hexadecimal,
    HexColor,
    Lowercase,
    Uppercase,
    BooleanString,
    NumericString,
    IntString,
    FloatString,
    Json,
    /// Regular expression the whole string must match somewhere
    Matches(String),

    // Formats
    Email,
    Url,
    /// Optionally pinned to a UUID version (3, 4 or 5)
    Uuid(Option<u8>),
    Ip,
    Iso8601,

    // Numbers and booleans
    IsBoolean,
    DivisibleBy(f64),
    MinNumber(f64),
    MaxNumber(f64),

    // Lengths and sizes
    Length { min: usize, max: Option<usize> },
    MinLength(usize),
    MaxLength(usize),
    NotEmpty,
    NotEmptyArray,
    MinSize(usize),
    MaxSize(usize),

    // Composition
    /// Delegates to a registered custom constraint
    Custom { constraint: String },
    /// Recursively validates the sub-object against another target's rules
    Nested { target: String },

    // Sanitizers
    /// Trim whitespace, or the given characters, from both sides
    Trim(Option<String>),
    Ltrim(Option<String>),
    Rtrim(Option<String>),
    /// Replace <, >, &, ', " and / with HTML entities
    Escape,
    /// Remove every character present in the set
    Blacklist(String),
    /// Remove every character absent from the set
    Whitelist(String),
    /// Strip control characters, optionally keeping \n and \r
    StripLow { keep_new_lines: bool },
    NormalizeEmail { lowercase: bool },
    ToBoolean { strict: bool },
    ToInt { radix: u32 },
    ToFloat,
    ToString,
    /// Normalize a parseable date string to ISO form
    ToDate,
    /// Delegates to a registered custom sanitizer
    CustomSanitize { sanitizer: String },
}

impl RuleKind {
    /// Whether this kind transforms the value instead of checking it.
    pub fn is_sanitizer(&self) -> bool {
        matches!(
            self,
            RuleKind::Trim(_)
                | RuleKind::Ltrim(_)
                | RuleKind::Rtrim(_)
                | RuleKind::Escape
                | RuleKind::Blacklist(_)
                | RuleKind::Whitelist(_)
                | RuleKind::StripLow { .. }
                | RuleKind::NormalizeEmail { .. }
                | RuleKind::ToBoolean { .. }
                | RuleKind::ToInt { .. }
                | RuleKind::ToFloat
                | RuleKind::ToString
                | RuleKind::ToDate
                | RuleKind::CustomSanitize { .. }
        )
    }

    /// Stable code for this kind; custom rules report their registered key.
    pub fn code(&self) -> &str {
        match self {
            RuleKind::Contains(_) => "contains",
            RuleKind::NotContains(_) => "not_contains",
            RuleKind::Equals(_) => "equals",
            RuleKind::NotEquals(_) => "not_equals",
            RuleKind::IsIn(_) => "is_in",
            RuleKind::IsNotIn(_) => "is_not_in",
            RuleKind::Alpha => "alpha",
            RuleKind::Alphanumeric => "alphanumeric",
            RuleKind::Ascii => "ascii",
            RuleKind::Base64 => "base64",
            RuleKind::Hexadecimal => "hexadecimal",
            RuleKind::HexColor => "hex_color",
            RuleKind::Lowercase => "lowercase",
            RuleKind::Uppercase => "uppercase",
            RuleKind::BooleanString => "boolean_string",
            RuleKind::NumericString => "numeric_string",
            RuleKind::IntString => "int_string",
            RuleKind::FloatString => "float_string",
            RuleKind::Json => "json",
            RuleKind::Matches(_) => "matches",
            RuleKind::Email => "email",
            RuleKind::Url => "url",
            RuleKind::Uuid(_) => "uuid",
            RuleKind::Ip => "ip",
            RuleKind::Iso8601 => "iso8601",
            RuleKind::IsBoolean => "is_boolean",
            RuleKind::DivisibleBy(_) => "divisible_by",
            RuleKind::MinNumber(_) => "min_number",
            RuleKind::MaxNumber(_) => "max_number",
            RuleKind::Length { .. } => "length",
            RuleKind::MinLength(_) => "min_length",
            RuleKind::MaxLength(_) => "max_length",
            RuleKind::NotEmpty => "not_empty",
            RuleKind::NotEmptyArray => "not_empty_array",
            RuleKind::MinSize(_) => "min_size",
            RuleKind::MaxSize(_) => "max_size",
            RuleKind::Custom { constraint } => constraint,
            RuleKind::Nested { .. } => "nested",
            RuleKind::Trim(_) => "trim",
            RuleKind::Ltrim(_) => "ltrim",
            RuleKind::Rtrim(_) => "rtrim",
            RuleKind::Escape => "escape",
            RuleKind::Blacklist(_) => "blacklist",
            RuleKind::Whitelist(_) => "whitelist",
            RuleKind::StripLow { .. } => "strip_low",
            RuleKind::NormalizeEmail { .. } => "normalize_email",
            RuleKind::ToBoolean { .. } => "to_boolean",
            RuleKind::ToInt { .. } => "to_int",
            RuleKind::ToFloat => "to_float",
            RuleKind::ToString => "to_string",
            RuleKind::ToDate => "to_date",
            RuleKind::CustomSanitize { sanitizer } => sanitizer,
        }
    }

    /// Built-in message used when the rule declares no override.
    pub(crate) fn default_message(&self, field: &str) -> String {
        match self {
            RuleKind::Contains(s) => format!("{} must contain '{}'", field, s),
            RuleKind::NotContains(s) => format!("{} must not contain '{}'", field, s),
            RuleKind::Equals(v) => format!("{} must equal {}", field, v),
            RuleKind::NotEquals(v) => format!("{} must not equal {}", field, v),
            RuleKind::IsIn(_) => format!("{} must be one of the allowed values", field),
            RuleKind::IsNotIn(_) => format!("{} must not be one of the forbidden values", field),
            RuleKind::Alpha => format!("{} must contain only letters", field),
            RuleKind::Alphanumeric => {
                format!("{} must contain only letters and numbers", field)
            }
            RuleKind::Ascii => format!("{} must contain only ASCII characters", field),
            RuleKind::Base64 => format!("{} must be base64 encoded", field),
            RuleKind::Hexadecimal => format!("{} must be a hexadecimal number", field),
            RuleKind::HexColor => format!("{} must be a hex color", field),
            RuleKind::Lowercase => format!("{} must be lowercase", field),
            RuleKind::Uppercase => format!("{} must be uppercase", field),
            RuleKind::BooleanString => format!("{} must be a boolean string", field),
            RuleKind::NumericString => format!("{} must be a numeric string", field),
            RuleKind::IntString => format!("{} must be an integer string", field),
            RuleKind::FloatString => format!("{} must be a float string", field),
            RuleKind::Json => format!("{} must be a JSON object string", field),
            RuleKind::Matches(p) => format!("{} must match the pattern '{}'", field, p),
            RuleKind::Email => format!("{} must be a valid email address", field),
            RuleKind::Url => format!("{} must be a valid URL", field),
            RuleKind::Uuid(Some(v)) => format!("{} must be a version {} UUID", field, v),
            RuleKind::Uuid(None) => format!("{} must be a UUID", field),
            RuleKind::Ip => format!("{} must be an IP address", field),
            RuleKind::Iso8601 => format!("{} must be an ISO 8601 date", field),
            RuleKind::IsBoolean => format!("{} must be a boolean", field),
            RuleKind::DivisibleBy(d) => format!("{} must be divisible by {}", field, d),
            RuleKind::MinNumber(min) => format!("{} must be at least {}", field, min),
            RuleKind::MaxNumber(max) => format!("{} must be at most {}", field, max),
            RuleKind::Length {
                min,
                max: Some(max),
            } => format!(
                "{} must be between {} and {} characters long",
                field, min, max
            ),
            RuleKind::Length { min, max: None } => {
                format!("{} must be at least {} characters long", field, min)
            }
            RuleKind::MinLength(min) => {
                format!("{} must be at least {} characters long", field, min)
            }
            RuleKind::MaxLength(max) => {
                format!("{} must be at most {} characters long", field, max)
            }
            RuleKind::NotEmpty => format!("{} must not be empty", field),
            RuleKind::NotEmptyArray => format!("{} must not be an empty array", field),
            RuleKind::MinSize(min) => format!("{} must have at least {} items", field, min),
            RuleKind::MaxSize(max) => format!("{} must have at most {} items", field, max),
            RuleKind::Custom { constraint } => {
                format!("{} failed the '{}' constraint", field, constraint)
            }
            RuleKind::Nested { target } => {
                format!("{} has an invalid nested '{}' value", field, target)
            }
            // Sanitizer kinds never resolve messages; the pass either
            // succeeds or aborts with a SanitizeError.
            other => format!("{} failed '{}'", field, other.code()),
        }
    }
}
