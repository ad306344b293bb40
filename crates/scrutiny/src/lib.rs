//! Declarative validation and sanitization driven by a metadata registry.
//!
//! Rules are declared once per target type and evaluated later against
//! value-form instances. Declarations cover builtin constraints (string
//! shapes, formats, numbers, lengths), sanitizers that rewrite the value
//! before checking it, custom constraint implementations resolved by key,
//! and nested rules that recurse into sub-objects. Failures come back as a
//! structured issue tree rather than a flat message list.
//!
//! ```
//! use scrutiny::{
//!     Declarations, MetadataRegistry, RuleKind, RuleOptions, ValidateOptions, Validator,
//! };
//! use serde_json::json;
//!
//! let registry = MetadataRegistry::new();
//! Declarations::on("Post")
//!     .rule("title", RuleKind::Trim(None))
//!     .rule("title", RuleKind::Contains("hello".into()))
//!     .rule_with("tags", RuleKind::MinLength(2), RuleOptions::new().each(true))
//!     .register(&registry);
//!
//! let validator = Validator::new(&registry);
//! let mut post = json!({ "title": "  hello world  ", "tags": ["rust", "web"] });
//! let issues = validator
//!     .sanitize_and_validate("Post", &mut post, &ValidateOptions::new())
//!     .unwrap();
//! assert!(issues.is_empty());
//! assert_eq!(post["title"], json!("hello world"));
//! ```
//!
//! Custom constraints may resolve asynchronously: [`Validator::validate`]
//! skips checks that are still pending, while [`Validator::validate_async`]
//! awaits every one of them before settling.

mod checks;
mod constraint;
mod declare;
mod engine;
mod error;
mod kind;
mod metadata;
mod sanitize;
mod transforms;

pub use constraint::{Constraint, PendingCheck, Sanitizer, Verdict};
pub use declare::Declarations;
pub use engine::{Validatable, ValidateOptions, Validator};
pub use error::{
    ConfigurationError, Error, FailedConstraint, SanitizeError, TransformError, ValidationFailed,
    ValidationIssue,
};
pub use kind::RuleKind;
pub use metadata::{ConstraintDescriptor, MetadataRegistry, RuleDescriptor, RuleOptions};
