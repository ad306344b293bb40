//! Sanitize pass over an instance

use crate::constraint::resolve_sanitizer;
use crate::error::{ConfigurationError, Error, SanitizeError, TransformError};
use crate::kind::RuleKind;
use crate::metadata::{MetadataRegistry, RuleDescriptor};
use serde_json::Value;

/// Apply every sanitizer rule declared for `target` to the instance,
/// in declaration order. Absent properties are left absent.
pub(crate) fn run(
    registry: &MetadataRegistry,
    target: &str,
    instance: &mut Value,
) -> Result<(), Error> {
    if !instance.is_object() {
        return Err(ConfigurationError::NotAnObject(target.to_string()).into());
    }

    let rules: Vec<RuleDescriptor> = registry
        .rules_for(target)
        .into_iter()
        .filter(|r| r.is_sanitizer())
        .collect();

    for rule in rules {
        // Sanitizers only make sense on properties.
        let Some(property) = rule.property.clone() else {
            continue;
        };
        let Some(slot) = instance.get_mut(&property) else {
            continue;
        };

        // The slot is only written on success; a failing transform leaves
        // the property holding its pre-pass value.
        let current = slot.clone();
        let transformed = if rule.options.each {
            transform_each(registry, &rule, current)
        } else {
            transform_one(registry, &rule.kind, current)
        };

        match transformed {
            Ok(next) => *slot = next,
            Err(Error::Sanitize(mut err)) => {
                err.property = property;
                return Err(err.into());
            }
            Err(other) => return Err(other),
        }
    }

    Ok(())
}

fn transform_each(
    registry: &MetadataRegistry,
    rule: &RuleDescriptor,
    value: Value,
) -> Result<Value, Error> {
    match value {
        Value::Array(items) => items
            .into_iter()
            .map(|item| transform_one(registry, &rule.kind, item))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        other => transform_one(registry, &rule.kind, other),
    }
}

fn transform_one(
    registry: &MetadataRegistry,
    kind: &RuleKind,
    value: Value,
) -> Result<Value, Error> {
    match kind {
        RuleKind::CustomSanitize { sanitizer } => {
            let implementation = resolve_sanitizer(registry, sanitizer)?;
            if value.is_null() {
                return Ok(value);
            }
            implementation
                .apply(value)
                .map_err(|e: TransformError| SanitizeError {
                    property: String::new(),
                    code: sanitizer.clone(),
                    reason: e.to_string(),
                }
                .into())
        }
        builtin => crate::transforms::apply(builtin, value).map_err(|e| {
            SanitizeError {
                property: String::new(),
                code: builtin.code().to_string(),
                reason: e.to_string(),
            }
            .into()
        }),
    }
}
