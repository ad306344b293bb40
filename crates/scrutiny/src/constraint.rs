//! Custom constraint and sanitizer contracts

use crate::error::{ConfigurationError, TransformError};
use crate::metadata::MetadataRegistry;
use serde_json::Value;
use std::future::Future;
use std::pin::Pin;

/// A constraint evaluation that has not resolved yet.
pub type PendingCheck = Pin<Box<dyn Future<Output = bool> + Send>>;

/// Result of a single constraint check.
///
/// Synchronous constraints return `Resolved`; asynchronous ones hand back a
/// future. The synchronous entry points only observe already-resolved
/// results and treat `Pending` as non-failing; the asynchronous entry point
/// awaits every pending check before settling.
pub enum Verdict {
    Resolved(bool),
    Pending(PendingCheck),
}

impl Verdict {
    /// A resolved passing verdict.
    pub fn pass() -> Self {
        Verdict::Resolved(true)
    }

    /// A resolved failing verdict.
    pub fn fail() -> Self {
        Verdict::Resolved(false)
    }

    /// Defer the verdict to a future.
    pub fn pending<F>(future: F) -> Self
    where
        F: Future<Output = bool> + Send + 'static,
    {
        Verdict::Pending(Box::pin(future))
    }
}

impl From<bool> for Verdict {
    fn from(ok: bool) -> Self {
        Verdict::Resolved(ok)
    }
}

impl std::fmt::Debug for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Verdict::Resolved(ok) => f.debug_tuple("Resolved").field(ok).finish(),
            Verdict::Pending(_) => f.write_str("Pending(..)"),
        }
    }
}

/// Contract for custom constraints referenced by `RuleKind::Custom`.
///
/// Implementations are instantiated fresh for every evaluation, so they must
/// not rely on state shared across checks. `instance` is the whole object
/// under validation, for cross-property constraints.
pub trait Constraint: Send + Sync {
    fn check(&self, value: &Value, instance: &Value) -> Verdict;
}

/// Contract for custom sanitizers referenced by `RuleKind::CustomSanitize`.
///
/// A transform that cannot produce a value for its input returns an error,
/// which aborts the whole sanitize pass for the instance.
pub trait Sanitizer: Send + Sync {
    fn apply(&self, value: Value) -> Result<Value, TransformError>;
}

/// Resolve a custom constraint key to a fresh instance.
///
/// A missing registration, or a key registered as a sanitizer, is a
/// configuration failure rather than a validation issue.
pub(crate) fn resolve_constraint(
    registry: &MetadataRegistry,
    key: &str,
) -> Result<Box<dyn Constraint>, ConfigurationError> {
    let descriptor = registry
        .constraint_for(key)
        .ok_or_else(|| ConfigurationError::UnknownConstraint(key.to_string()))?;
    descriptor
        .build_check()
        .ok_or_else(|| ConfigurationError::ConstraintMismatch {
            key: key.to_string(),
            registered: "sanitizer",
            referenced: "constraint",
        })
}

/// Resolve a custom sanitizer key to a fresh instance.
pub(crate) fn resolve_sanitizer(
    registry: &MetadataRegistry,
    key: &str,
) -> Result<Box<dyn Sanitizer>, ConfigurationError> {
    let descriptor = registry
        .constraint_for(key)
        .ok_or_else(|| ConfigurationError::UnknownConstraint(key.to_string()))?;
    descriptor
        .build_transform()
        .ok_or_else(|| ConfigurationError::ConstraintMismatch {
            key: key.to_string(),
            registered: "constraint",
            referenced: "sanitizer",
        })
}
