//! Fluent builder for declaring rules against a target type

use crate::kind::RuleKind;
use crate::metadata::{MetadataRegistry, RuleDescriptor, RuleOptions};

/// Collects rule declarations for one target type before registration.
///
/// The builder is the registration surface that decorators provide in
/// annotation-based validators: each call records one descriptor, and
/// [`register`](Declarations::register) hands the batch to a registry.
///
/// ```
/// use scrutiny::{Declarations, MetadataRegistry, RuleKind, RuleOptions};
///
/// let registry = MetadataRegistry::new();
/// Declarations::on("Post")
///     .rule("title", RuleKind::Contains("hello".into()))
///     .rule_with(
///         "title",
///         RuleKind::MinLength(10),
///         RuleOptions::new().message("{property} is too short"),
///     )
///     .register(&registry);
/// ```
#[derive(Debug)]
pub struct Declarations {
    target: String,
    rules: Vec<RuleDescriptor>,
}

impl Declarations {
    /// Start declaring rules for the given target key.
    pub fn on(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            rules: Vec::new(),
        }
    }

    /// Declare a property rule with default options.
    pub fn rule(self, property: impl Into<String>, kind: RuleKind) -> Self {
        self.rule_with(property, kind, RuleOptions::new())
    }

    /// Declare a property rule with an explicit option bag.
    pub fn rule_with(
        mut self,
        property: impl Into<String>,
        kind: RuleKind,
        options: RuleOptions,
    ) -> Self {
        self.rules.push(RuleDescriptor::new(
            self.target.clone(),
            Some(property.into()),
            kind,
            options,
        ));
        self
    }

    /// Declare a rule on the type itself rather than on a property.
    pub fn type_rule(self, kind: RuleKind) -> Self {
        self.type_rule_with(kind, RuleOptions::new())
    }

    /// Declare a type-level rule with an explicit option bag.
    pub fn type_rule_with(mut self, kind: RuleKind, options: RuleOptions) -> Self {
        self.rules.push(RuleDescriptor::new(
            self.target.clone(),
            None,
            kind,
            options,
        ));
        self
    }

    /// Register every collected descriptor, in declaration order.
    pub fn register(self, registry: &MetadataRegistry) {
        for descriptor in self.rules {
            registry.add_rule(descriptor);
        }
    }

    /// The collected descriptors, for callers that manage registration
    /// themselves.
    pub fn descriptors(self) -> Vec<RuleDescriptor> {
        self.rules
    }
}
