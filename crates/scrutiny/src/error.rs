//! Validation issue model and error types

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use thiserror::Error;

/// One failed constraint on a property: the rule code (or custom constraint
/// key) and the resolved message.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FailedConstraint {
    /// Stable code identifying the rule kind or custom constraint
    pub code: String,
    /// Human-readable error message
    pub message: String,
}

/// Per-property failure record produced by the validation engine.
///
/// A property collects all of its failed constraints into a single issue;
/// nested validation attaches the sub-object's issues under `children`
/// instead of failing the property directly.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ValidationIssue {
    /// Registry key of the declaring type
    pub target: String,
    /// Property that failed; empty for type-level rules
    pub property: String,
    /// The rejected value (the first failing element under `each`)
    pub value: Value,
    /// Failed constraints in rule-declaration order
    pub failed_constraints: Vec<FailedConstraint>,
    /// Issues of a nested sub-object, populated only by nested rules
    pub children: Vec<ValidationIssue>,
}

impl ValidationIssue {
    pub(crate) fn new(
        target: impl Into<String>,
        property: impl Into<String>,
        value: Value,
    ) -> Self {
        Self {
            target: target.into(),
            property: property.into(),
            value,
            failed_constraints: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Record a failed constraint, keeping the first entry per code.
    pub(crate) fn push_failure(&mut self, code: &str, message: String) {
        if !self.has_code(code) {
            self.failed_constraints.push(FailedConstraint {
                code: code.to_string(),
                message,
            });
        }
    }

    /// Check whether a constraint with the given code failed on this property.
    pub fn has_code(&self, code: &str) -> bool {
        self.failed_constraints.iter().any(|f| f.code == code)
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:", self.property)?;
        for failed in &self.failed_constraints {
            write!(f, " [{}] {}", failed.code, failed.message)?;
        }
        if !self.children.is_empty() {
            write!(f, " ({} nested issue(s))", self.children.len())?;
        }
        Ok(())
    }
}

/// Aggregate error carrying the full issue list, raised by `ensure_valid`
/// and by the rejecting path of `validate_async`.
#[derive(Debug, Clone, Error)]
#[error("validation failed for {} property(ies)", .issues.len())]
pub struct ValidationFailed {
    /// Issues in registry declaration order
    pub issues: Vec<ValidationIssue>,
}

/// Programmer errors: the declared contract cannot be honored at all.
///
/// These are fatal and surface immediately at evaluation time instead of
/// being folded into the issue list.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    /// A rule references a custom constraint or sanitizer key that was
    /// never registered.
    #[error("no constraint registered under key '{0}'")]
    UnknownConstraint(String),

    /// The registered implementation does not match the referencing rule
    /// (constraint referenced as sanitizer, or the other way around).
    #[error("'{key}' is registered as a {registered} but referenced as a {referenced}")]
    ConstraintMismatch {
        key: String,
        registered: &'static str,
        referenced: &'static str,
    },

    /// A pattern rule carries a regular expression that does not compile.
    #[error("pattern '{pattern}' does not compile: {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// The instance handed to the engine is not a JSON object, so its
    /// properties cannot be read.
    #[error("instance for target '{0}' is not an object")]
    NotAnObject(String),

    /// A typed instance could not be converted to or from its value form.
    #[error("cannot convert instance: {0}")]
    Convert(#[from] serde_json::Error),
}

/// Failure inside a single sanitizer transform.
///
/// Transforms are fatal on failure: the sanitize pass for the instance
/// aborts rather than silently dropping the value.
#[derive(Debug, Clone, Error)]
#[error("sanitizing '{property}' with '{code}' failed: {reason}")]
pub struct SanitizeError {
    pub property: String,
    pub code: String,
    pub reason: String,
}

/// Reason a transform could not produce a value for its input.
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct TransformError(pub String);

impl TransformError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self(reason.into())
    }
}

/// Top-level error for the entry points that can fail in more than one way.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    Invalid(#[from] ValidationFailed),

    #[error(transparent)]
    Sanitize(#[from] SanitizeError),
}
