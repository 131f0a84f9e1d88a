//! Constraint descriptors.
//!
//! A descriptor is one constraint occurrence: its logical type, attributes,
//! declared groups, the validators able to check it, and any composing
//! constraints. Descriptors are immutable and shared behind `Arc`; since the
//! composing list is fixed when a descriptor is built, composition trees
//! cannot contain cycles.

use crate::core::error::BoxError;
use crate::core::types::Value;
use crate::groups::Group;
use indexmap::IndexMap;
use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

static NEXT_CONSTRAINT_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of a constraint occurrence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ConstraintId(u64);

impl ConstraintId {
    fn next() -> Self {
        Self(NEXT_CONSTRAINT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for ConstraintId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// How the results of composing constraints combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum CompositionType {
    /// Every composing constraint must be satisfied
    #[default]
    And,
    /// At least one composing constraint must be satisfied
    Or,
    /// No composing constraint may be satisfied
    AllFalse,
}

/// One constraint occurrence.
#[derive(Debug, Clone, Serialize)]
pub struct ConstraintDescriptor {
    id: ConstraintId,
    constraint_type: String,
    attributes: IndexMap<String, Value>,
    groups: Vec<Group>,
    payload: Vec<String>,
    validators: Vec<String>,
    composing: Vec<Arc<ConstraintDescriptor>>,
    composition: CompositionType,
    report_as_single_violation: bool,
}

impl ConstraintDescriptor {
    /// Name of the standard message attribute.
    pub const MESSAGE: &'static str = "message";

    /// Start building a descriptor for the given constraint type.
    pub fn builder(constraint_type: impl Into<String>) -> ConstraintDescriptorBuilder {
        ConstraintDescriptorBuilder::new(constraint_type)
    }

    /// Identity of this occurrence.
    pub fn id(&self) -> ConstraintId {
        self.id
    }

    /// Logical constraint type, e.g. `NotNull`.
    pub fn constraint_type(&self) -> &str {
        &self.constraint_type
    }

    /// All attributes, including `message`.
    pub fn attributes(&self) -> &IndexMap<String, Value> {
        &self.attributes
    }

    /// A single attribute.
    pub fn attribute(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    /// An integer attribute, failing if it is missing or of another type.
    pub fn integer_attribute(&self, name: &str) -> Result<i64, BoxError> {
        self.attribute(name).and_then(Value::as_integer).ok_or_else(|| {
            format!(
                "constraint {} requires integer attribute '{}'",
                self.constraint_type, name
            )
            .into()
        })
    }

    /// A text attribute, failing if it is missing or of another type.
    pub fn text_attribute(&self, name: &str) -> Result<&str, BoxError> {
        self.attribute(name).and_then(Value::as_text).ok_or_else(|| {
            format!(
                "constraint {} requires text attribute '{}'",
                self.constraint_type, name
            )
            .into()
        })
    }

    /// The raw message template.
    pub fn message_template(&self) -> &str {
        self.attribute(Self::MESSAGE)
            .and_then(Value::as_text)
            .unwrap_or_default()
    }

    /// Declared groups; never empty.
    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    /// Payload identifiers.
    pub fn payload(&self) -> &[String] {
        &self.payload
    }

    /// Ids of the validators able to check this constraint.
    pub fn validators(&self) -> &[String] {
        &self.validators
    }

    /// Composing constraints, in declaration order.
    pub fn composing(&self) -> &[Arc<ConstraintDescriptor>] {
        &self.composing
    }

    /// Whether this constraint is composed of others.
    pub fn is_composed(&self) -> bool {
        !self.composing.is_empty()
    }

    /// How composing results combine.
    pub fn composition(&self) -> CompositionType {
        self.composition
    }

    /// Whether a failure is reported once, for this constraint, instead of per composing constraint.
    pub fn report_as_single_violation(&self) -> bool {
        self.report_as_single_violation
    }
}

/// Builder for [`ConstraintDescriptor`].
#[derive(Debug, Clone)]
pub struct ConstraintDescriptorBuilder {
    constraint_type: String,
    attributes: IndexMap<String, Value>,
    groups: Vec<Group>,
    payload: Vec<String>,
    validators: Vec<String>,
    composing: Vec<Arc<ConstraintDescriptor>>,
    composition: CompositionType,
    report_as_single_violation: bool,
}

impl ConstraintDescriptorBuilder {
    fn new(constraint_type: impl Into<String>) -> Self {
        Self {
            constraint_type: constraint_type.into(),
            attributes: IndexMap::new(),
            groups: Vec::new(),
            payload: Vec::new(),
            validators: Vec::new(),
            composing: Vec::new(),
            composition: CompositionType::And,
            report_as_single_violation: false,
        }
    }

    /// Set an attribute.
    pub fn attribute(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Set the message template.
    pub fn message(self, template: impl Into<String>) -> Self {
        self.attribute(ConstraintDescriptor::MESSAGE, template.into())
    }

    /// Restrict the constraint to the given groups.
    pub fn groups<I, G>(mut self, groups: I) -> Self
    where
        I: IntoIterator<Item = G>,
        G: Into<Group>,
    {
        self.groups = groups.into_iter().map(Into::into).collect();
        self
    }

    /// Add a payload identifier.
    pub fn payload(mut self, payload: impl Into<String>) -> Self {
        self.payload.push(payload.into());
        self
    }

    /// Add a validator able to check this constraint.
    pub fn validator(mut self, id: impl Into<String>) -> Self {
        self.validators.push(id.into());
        self
    }

    /// Add a composing constraint.
    pub fn composing(mut self, descriptor: Arc<ConstraintDescriptor>) -> Self {
        self.composing.push(descriptor);
        self
    }

    /// Set how composing results combine.
    pub fn composition(mut self, composition: CompositionType) -> Self {
        self.composition = composition;
        self
    }

    /// Report failures as one violation of this constraint.
    pub fn report_as_single_violation(mut self) -> Self {
        self.report_as_single_violation = true;
        self
    }

    /// Finish the descriptor.
    ///
    /// Missing groups default to `Default`; a missing message defaults to
    /// `{<type>.message}`. The attribute map mirrors `groups` and `payload`.
    pub fn build(mut self) -> Arc<ConstraintDescriptor> {
        if self.groups.is_empty() {
            self.groups.push(Group::default_group());
        }
        if !self.attributes.contains_key(ConstraintDescriptor::MESSAGE) {
            let template = format!("{{{}.message}}", self.constraint_type);
            self.attributes
                .insert(ConstraintDescriptor::MESSAGE.to_string(), Value::Text(template));
        }
        self.attributes.insert(
            "groups".to_string(),
            Value::list(self.groups.iter().map(|g| g.name().to_string())),
        );
        self.attributes.insert(
            "payload".to_string(),
            Value::list(self.payload.iter().cloned()),
        );

        Arc::new(ConstraintDescriptor {
            id: ConstraintId::next(),
            constraint_type: self.constraint_type,
            attributes: self.attributes,
            groups: self.groups,
            payload: self.payload,
            validators: self.validators,
            composing: self.composing,
            composition: self.composition,
            report_as_single_violation: self.report_as_single_violation,
        })
    }
}
