//! Validation engine: rule evaluation, nesting and async settlement

use crate::constraint::{resolve_constraint, Constraint, PendingCheck, Verdict};
use crate::error::{ConfigurationError, Error, ValidationFailed, ValidationIssue};
use crate::kind::RuleKind;
use crate::metadata::{MetadataRegistry, RuleDescriptor};
use crate::{checks, sanitize};
use regex::Regex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

static NULL: Value = Value::Null;

/// Ties a type to its registry key so typed values can be validated
/// without repeating the key at every call site.
pub trait Validatable: Serialize {
    /// Registry key this type declares its rules under.
    fn type_key() -> &'static str;
}

/// Per-call evaluation options.
#[derive(Debug, Clone, Default)]
pub struct ValidateOptions {
    groups: Option<Vec<String>>,
}

impl ValidateOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict evaluation to rules in the given groups (plus `always`
    /// rules and rules declared without groups).
    pub fn groups<I, S>(mut self, groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.groups = Some(groups.into_iter().map(Into::into).collect());
        self
    }

    fn requested(&self) -> Option<&[String]> {
        self.groups.as_deref()
    }
}

/// One level of the object tree a pending check was found under, used to
/// attach its failure at the right depth once the future settles.
#[derive(Clone)]
struct Frame {
    target: String,
    property: String,
    value: Value,
}

/// An asynchronous check captured during the synchronous walk.
struct PendingRule {
    path: Vec<Frame>,
    code: String,
    message: String,
    future: PendingCheck,
}

/// Evaluates declared rules against value-form instances.
///
/// The validator borrows its registry; [`Validator::global`] evaluates
/// against the process-wide one.
pub struct Validator<'r> {
    registry: &'r MetadataRegistry,
}

impl Validator<'static> {
    /// A validator over the process-wide registry.
    pub fn global() -> Self {
        Self {
            registry: MetadataRegistry::global(),
        }
    }
}

impl Default for Validator<'static> {
    fn default() -> Self {
        Self::global()
    }
}

impl<'r> Validator<'r> {
    pub fn new(registry: &'r MetadataRegistry) -> Self {
        Self { registry }
    }

    /// Validate an instance against the rules declared for `target`.
    ///
    /// Returns the issue list; an empty list means the instance is valid.
    /// Pending asynchronous checks are skipped here and never fail the
    /// instance; use [`validate_async`](Validator::validate_async) to
    /// settle them.
    pub fn validate(
        &self,
        target: &str,
        instance: &Value,
        options: &ValidateOptions,
    ) -> Result<Vec<ValidationIssue>, ConfigurationError> {
        let (issues, pendings) = self.collect(target, instance, options.requested(), &[])?;
        if !pendings.is_empty() {
            tracing::debug!(
                target_type = target,
                skipped = pendings.len(),
                "pending async checks skipped by synchronous validation"
            );
        }
        Ok(issues)
    }

    /// Whether the instance passes every applicable synchronous rule.
    pub fn is_valid(
        &self,
        target: &str,
        instance: &Value,
        options: &ValidateOptions,
    ) -> Result<bool, ConfigurationError> {
        Ok(self.validate(target, instance, options)?.is_empty())
    }

    /// Validate and fail with the full issue list if anything is invalid.
    pub fn ensure_valid(
        &self,
        target: &str,
        instance: &Value,
        options: &ValidateOptions,
    ) -> Result<(), Error> {
        let issues = self.validate(target, instance, options)?;
        if issues.is_empty() {
            Ok(())
        } else {
            Err(ValidationFailed { issues }.into())
        }
    }

    /// Validate, awaiting every asynchronous check before settling.
    ///
    /// Returns the instance on success so async pipelines can keep
    /// threading it; rejects with the full issue list otherwise.
    pub async fn validate_async(
        &self,
        target: &str,
        instance: Value,
        options: &ValidateOptions,
    ) -> Result<Value, Error> {
        let (mut issues, pendings) =
            self.collect(target, &instance, options.requested(), &[])?;
        for pending in pendings {
            if !pending.future.await {
                attach_failure(&mut issues, &pending.path, &pending.code, pending.message);
            }
        }
        if issues.is_empty() {
            Ok(instance)
        } else {
            Err(ValidationFailed { issues }.into())
        }
    }

    /// Apply the sanitizer rules declared for `target` to the instance.
    pub fn sanitize(&self, target: &str, instance: &mut Value) -> Result<(), Error> {
        sanitize::run(self.registry, target, instance)
    }

    /// Sanitize in place, then validate the sanitized instance.
    pub fn sanitize_and_validate(
        &self,
        target: &str,
        instance: &mut Value,
        options: &ValidateOptions,
    ) -> Result<Vec<ValidationIssue>, Error> {
        self.sanitize(target, instance)?;
        Ok(self.validate(target, instance, options)?)
    }

    /// Validate a typed value under its own registry key.
    pub fn validate_struct<T: Validatable>(
        &self,
        value: &T,
        options: &ValidateOptions,
    ) -> Result<Vec<ValidationIssue>, ConfigurationError> {
        let instance = serde_json::to_value(value)?;
        self.validate(T::type_key(), &instance, options)
    }

    /// Validate a typed value, failing with the full issue list if
    /// anything is invalid.
    pub fn ensure_valid_struct<T: Validatable>(
        &self,
        value: &T,
        options: &ValidateOptions,
    ) -> Result<(), Error> {
        let issues = self.validate_struct(value, options)?;
        if issues.is_empty() {
            Ok(())
        } else {
            Err(ValidationFailed { issues }.into())
        }
    }

    /// Sanitize a typed value, returning the transformed value.
    pub fn sanitize_struct<T>(&self, value: T) -> Result<T, Error>
    where
        T: Validatable + DeserializeOwned,
    {
        let mut instance = serde_json::to_value(&value).map_err(ConfigurationError::from)?;
        self.sanitize(T::type_key(), &mut instance)?;
        let back = serde_json::from_value(instance).map_err(ConfigurationError::from)?;
        Ok(back)
    }

    /// Synchronous walk over one target's rules. Nested rules recurse;
    /// asynchronous verdicts are captured with their tree path and bubbled
    /// up unevaluated.
    fn collect(
        &self,
        target: &str,
        instance: &Value,
        groups: Option<&[String]>,
        path: &[Frame],
    ) -> Result<(Vec<ValidationIssue>, Vec<PendingRule>), ConfigurationError> {
        if !instance.is_object() {
            return Err(ConfigurationError::NotAnObject(target.to_string()));
        }

        let mut issues = Vec::new();
        let mut pendings = Vec::new();

        for rule in self.registry.rules_for(target) {
            if rule.is_sanitizer() || !rule.applies_to(groups) {
                continue;
            }

            let value = match rule.property.as_deref() {
                Some(property) => instance.get(property).unwrap_or(&NULL),
                // Type-level rules see the whole instance.
                None => instance,
            };

            match &rule.kind {
                RuleKind::Custom { constraint } => {
                    let implementation = resolve_constraint(self.registry, constraint)?;
                    self.check_custom(
                        target,
                        &rule,
                        implementation.as_ref(),
                        value,
                        instance,
                        path,
                        &mut issues,
                        &mut pendings,
                    );
                }
                RuleKind::Nested { target: sub } => {
                    self.check_nested(
                        target,
                        sub,
                        &rule,
                        value,
                        groups,
                        path,
                        &mut issues,
                        &mut pendings,
                    )?;
                }
                RuleKind::Matches(pattern) => {
                    // A pattern that does not compile is a broken rule, not
                    // a data failure. Compiled once per rule, not per element.
                    let re = Regex::new(pattern).map_err(|e| {
                        ConfigurationError::InvalidPattern {
                            pattern: pattern.clone(),
                            reason: e.to_string(),
                        }
                    })?;
                    check_builtin(
                        target,
                        &rule,
                        |v| v.is_null() || v.as_str().map_or(false, |s| re.is_match(s)),
                        value,
                        &mut issues,
                    );
                }
                builtin => check_builtin(
                    target,
                    &rule,
                    |v| checks::holds(builtin, v),
                    value,
                    &mut issues,
                ),
            }
        }

        Ok((issues, pendings))
    }

    #[allow(clippy::too_many_arguments)]
    fn check_custom(
        &self,
        target: &str,
        rule: &RuleDescriptor,
        implementation: &dyn Constraint,
        value: &Value,
        instance: &Value,
        path: &[Frame],
        issues: &mut Vec<ValidationIssue>,
        pendings: &mut Vec<PendingRule>,
    ) {
        let property = rule.property.as_deref().unwrap_or("");
        let elements: Vec<&Value> = match value {
            Value::Array(items) if rule.options.each => items.iter().collect(),
            single => vec![single],
        };

        for element in elements {
            match implementation.check(element, instance) {
                Verdict::Resolved(true) => {}
                Verdict::Resolved(false) => {
                    entry(issues, target, property, element)
                        .push_failure(rule.code(), rule.resolve_message(element));
                }
                Verdict::Pending(future) => {
                    let mut full_path = path.to_vec();
                    full_path.push(Frame {
                        target: target.to_string(),
                        property: property.to_string(),
                        value: element.clone(),
                    });
                    pendings.push(PendingRule {
                        path: full_path,
                        code: rule.code().to_string(),
                        message: rule.resolve_message(element),
                        future,
                    });
                }
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn check_nested(
        &self,
        target: &str,
        sub_target: &str,
        rule: &RuleDescriptor,
        value: &Value,
        groups: Option<&[String]>,
        path: &[Frame],
        issues: &mut Vec<ValidationIssue>,
        pendings: &mut Vec<PendingRule>,
    ) -> Result<(), ConfigurationError> {
        // Absent sub-objects pass; presence is NotEmpty's job.
        if value.is_null() {
            return Ok(());
        }
        let property = rule.property.as_deref().unwrap_or("");

        let elements: Vec<&Value> = match value {
            Value::Array(items) if rule.options.each => items.iter().collect(),
            single => vec![single],
        };

        for element in elements {
            if !element.is_object() {
                entry(issues, target, property, element)
                    .push_failure(rule.code(), rule.resolve_message(element));
                continue;
            }

            let mut sub_path = path.to_vec();
            sub_path.push(Frame {
                target: target.to_string(),
                property: property.to_string(),
                value: element.clone(),
            });

            let (sub_issues, sub_pendings) =
                self.collect(sub_target, element, groups, &sub_path)?;
            if !sub_issues.is_empty() {
                entry(issues, target, property, element)
                    .children
                    .extend(sub_issues);
            }
            pendings.extend(sub_pendings);
        }

        Ok(())
    }
}

fn check_builtin(
    target: &str,
    rule: &RuleDescriptor,
    holds: impl Fn(&Value) -> bool,
    value: &Value,
    issues: &mut Vec<ValidationIssue>,
) {
    let property = rule.property.as_deref().unwrap_or("");
    match value {
        Value::Array(items) if rule.options.each => {
            // Record the first failing element.
            if let Some(bad) = items.iter().find(|item| !holds(item)) {
                entry(issues, target, property, bad)
                    .push_failure(rule.code(), rule.resolve_message(bad));
            }
        }
        single => {
            if !holds(single) {
                entry(issues, target, property, single)
                    .push_failure(rule.code(), rule.resolve_message(single));
            }
        }
    }
}

/// Find or create the issue record for a property at one tree level.
fn entry<'a>(
    issues: &'a mut Vec<ValidationIssue>,
    target: &str,
    property: &str,
    value: &Value,
) -> &'a mut ValidationIssue {
    let pos = match issues.iter().position(|i| i.property == property) {
        Some(pos) => pos,
        None => {
            issues.push(ValidationIssue::new(target, property, value.clone()));
            issues.len() - 1
        }
    };
    &mut issues[pos]
}

/// Attach a settled async failure at the depth its path frames describe,
/// creating intermediate issue records as needed.
fn attach_failure(
    issues: &mut Vec<ValidationIssue>,
    path: &[Frame],
    code: &str,
    message: String,
) {
    let Some((last, prefix)) = path.split_last() else {
        return;
    };
    let mut level = issues;
    for frame in prefix {
        let slot = entry(level, &frame.target, &frame.property, &frame.value);
        level = &mut slot.children;
    }
    entry(level, &last.target, &last.property, &last.value).push_failure(code, message);
}
