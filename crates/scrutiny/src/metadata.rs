//! Metadata registry for rule and constraint declarations

use crate::constraint::{Constraint, Sanitizer};
use crate::kind::RuleKind;
use serde_json::Value;
use std::fmt;
use std::sync::{Arc, OnceLock, RwLock};

/// Uniform option bag threaded through every property-level declaration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleOptions {
    /// Groups this rule belongs to; unset means the rule always applies
    pub groups: Option<Vec<String>>,
    /// Message override; `{property}` and `{value}` are interpolated
    pub message: Option<String>,
    /// Run regardless of the requested groups
    pub always: bool,
    /// Apply the rule to every element of an array-valued property
    pub each: bool,
}

impl RuleOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn groups<I, S>(mut self, groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.groups = Some(groups.into_iter().map(Into::into).collect());
        self
    }

    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn always(mut self, always: bool) -> Self {
        self.always = always;
        self
    }

    pub fn each(mut self, each: bool) -> Self {
        self.each = each;
        self
    }
}

/// One declared rule on a property (or on the type itself).
///
/// Descriptors are immutable once registered and owned by the registry;
/// `rules_for` hands out clones.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleDescriptor {
    /// Registry key of the declaring type
    pub target: String,
    /// Decorated property; `None` declares a type-level rule
    pub property: Option<String>,
    pub kind: RuleKind,
    pub options: RuleOptions,
}

impl RuleDescriptor {
    pub fn new(
        target: impl Into<String>,
        property: Option<String>,
        kind: RuleKind,
        options: RuleOptions,
    ) -> Self {
        Self {
            target: target.into(),
            property,
            kind,
            options,
        }
    }

    pub fn is_sanitizer(&self) -> bool {
        self.kind.is_sanitizer()
    }

    pub fn code(&self) -> &str {
        self.kind.code()
    }

    /// Group filter: run iff `always`, ungrouped, or intersecting the
    /// requested groups. No requested groups runs every ungrouped rule.
    pub(crate) fn applies_to(&self, requested: Option<&[String]>) -> bool {
        if self.options.always {
            return true;
        }
        match &self.options.groups {
            Some(groups) if !groups.is_empty() => requested
                .map_or(false, |req| groups.iter().any(|g| req.contains(g))),
            _ => true,
        }
    }

    /// Resolve the message for a failed check: declared override with
    /// placeholder interpolation, else the kind's built-in template.
    pub(crate) fn resolve_message(&self, value: &Value) -> String {
        let field = self.property.as_deref().unwrap_or("value");
        match &self.options.message {
            Some(template) => {
                let shown = match value {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                template
                    .replace("{property}", field)
                    .replace("{value}", &shown)
            }
            None => self.kind.default_message(field),
        }
    }
}

type ConstraintFactory = Arc<dyn Fn() -> Box<dyn Constraint> + Send + Sync>;
type SanitizerFactory = Arc<dyn Fn() -> Box<dyn Sanitizer> + Send + Sync>;

#[derive(Clone)]
enum Factory {
    Check(ConstraintFactory),
    Transform(SanitizerFactory),
}

/// Registration record for a custom constraint or sanitizer implementation.
///
/// The factory replaces runtime type lookup: it is captured at declaration
/// time and builds a fresh instance for every evaluation.
#[derive(Clone)]
pub struct ConstraintDescriptor {
    key: String,
    factory: Factory,
}

impl ConstraintDescriptor {
    /// Register a constraint implementation under a stable key.
    pub fn constraint<F, C>(key: impl Into<String>, build: F) -> Self
    where
        F: Fn() -> C + Send + Sync + 'static,
        C: Constraint + 'static,
    {
        Self {
            key: key.into(),
            factory: Factory::Check(Arc::new(move || Box::new(build()))),
        }
    }

    /// Register a sanitizer implementation under a stable key.
    pub fn sanitizer<F, S>(key: impl Into<String>, build: F) -> Self
    where
        F: Fn() -> S + Send + Sync + 'static,
        S: Sanitizer + 'static,
    {
        Self {
            key: key.into(),
            factory: Factory::Transform(Arc::new(move || Box::new(build()))),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn is_sanitizer(&self) -> bool {
        matches!(self.factory, Factory::Transform(_))
    }

    pub(crate) fn build_check(&self) -> Option<Box<dyn Constraint>> {
        match &self.factory {
            Factory::Check(build) => Some(build()),
            Factory::Transform(_) => None,
        }
    }

    pub(crate) fn build_transform(&self) -> Option<Box<dyn Sanitizer>> {
        match &self.factory {
            Factory::Transform(build) => Some(build()),
            Factory::Check(_) => None,
        }
    }
}

impl fmt::Debug for ConstraintDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConstraintDescriptor")
            .field("key", &self.key)
            .field("is_sanitizer", &self.is_sanitizer())
            .finish()
    }
}

#[derive(Default)]
struct Inner {
    rules: Vec<RuleDescriptor>,
    constraints: Vec<ConstraintDescriptor>,
}

/// Store of every rule and constraint declaration, keyed by declaring type.
///
/// Written during declaration, read-mostly afterwards. Lookup is exact-key:
/// rules declared for one target are never merged into another. The
/// process-wide default lives behind [`MetadataRegistry::global`]; tests
/// construct their own instances or call [`reset`](MetadataRegistry::reset).
#[derive(Default)]
pub struct MetadataRegistry {
    inner: RwLock<Inner>,
}

impl MetadataRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide default registry.
    pub fn global() -> &'static MetadataRegistry {
        static GLOBAL: OnceLock<MetadataRegistry> = OnceLock::new();
        GLOBAL.get_or_init(MetadataRegistry::new)
    }

    /// Register one rule. Descriptors are not checked for well-formedness
    /// here; malformed references surface as engine-time failures.
    pub fn add_rule(&self, descriptor: RuleDescriptor) {
        tracing::debug!(
            declaring_type = %descriptor.target,
            property = descriptor.property.as_deref().unwrap_or("<type>"),
            code = descriptor.code(),
            "rule registered"
        );
        self.write().rules.push(descriptor);
    }

    /// Register a custom constraint or sanitizer implementation. A second
    /// registration under the same key replaces the first.
    pub fn add_constraint(&self, descriptor: ConstraintDescriptor) {
        tracing::debug!(key = descriptor.key(), "constraint registered");
        let mut inner = self.write();
        match inner
            .constraints
            .iter()
            .position(|c| c.key() == descriptor.key())
        {
            Some(pos) => inner.constraints[pos] = descriptor,
            None => inner.constraints.push(descriptor),
        }
    }

    /// Rules declared for a target, in declaration order.
    pub fn rules_for(&self, target: &str) -> Vec<RuleDescriptor> {
        self.read()
            .rules
            .iter()
            .filter(|r| r.target == target)
            .cloned()
            .collect()
    }

    /// Exact-key constraint lookup.
    pub fn constraint_for(&self, key: &str) -> Option<ConstraintDescriptor> {
        self.read()
            .constraints
            .iter()
            .find(|c| c.key() == key)
            .cloned()
    }

    /// Every registered constraint, in registration order.
    pub fn constraints(&self) -> Vec<ConstraintDescriptor> {
        self.read().constraints.clone()
    }

    /// Drop all declarations. Intended for test isolation.
    pub fn reset(&self) {
        let mut inner = self.write();
        inner.rules.clear();
        inner.constraints.clear();
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Inner> {
        self.inner.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap_or_else(|e| e.into_inner())
    }
}
