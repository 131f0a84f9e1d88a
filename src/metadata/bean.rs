//! Flattened, immutable per-type metadata.
//!
//! Everything a type declares or inherits is merged here once, so the traversal
//! never walks a type hierarchy while validating.

use crate::core::error::{MetadataError, MetadataResult};
use crate::core::types::BeanRef;
use crate::groups::Group;
use crate::metadata::declaration::{DefaultGroupSequenceProvider, ExecutableKind};
use crate::metadata::descriptor::ConstraintDescriptor;
use crate::metadata::extractor::ValueExtractor;
use indexmap::IndexMap;
use std::fmt;
use std::sync::Arc;

/// A constraint placed at a location of a specific declaring type.
#[derive(Debug, Clone)]
pub struct MetaConstraint {
    descriptor: Arc<ConstraintDescriptor>,
    declaring_type: String,
    groups: Vec<Group>,
}

impl MetaConstraint {
    /// Place a descriptor on `declaring_type`.
    ///
    /// A constraint in `Default` also belongs to the declaring type's own group.
    pub fn new(descriptor: Arc<ConstraintDescriptor>, declaring_type: &str) -> Self {
        let mut groups = descriptor.groups().to_vec();
        if groups.iter().any(Group::is_default) {
            let own = Group::new(declaring_type);
            if !groups.contains(&own) {
                groups.push(own);
            }
        }
        Self {
            descriptor,
            declaring_type: declaring_type.to_string(),
            groups,
        }
    }

    /// The constraint descriptor.
    pub fn descriptor(&self) -> &Arc<ConstraintDescriptor> {
        &self.descriptor
    }

    /// Type that declared the constraint.
    pub fn declaring_type(&self) -> &str {
        &self.declaring_type
    }

    /// Resolved groups, including the implicit type group.
    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    /// Whether the constraint is evaluated for `group`.
    pub fn applies_to(&self, group: &Group) -> bool {
        self.groups.contains(group)
    }
}

/// Cascading metadata of a property, parameter or return value.
#[derive(Debug, Clone, Default)]
pub struct CascadingMetaData {
    /// Whether values are validated recursively
    pub cascade: bool,
    /// How container values yield children
    pub extractor: ValueExtractor,
    /// Constraints on each extracted container element
    pub element_constraints: Vec<MetaConstraint>,
    /// Group conversions applied when cascading
    pub group_conversions: IndexMap<Group, Group>,
}

impl CascadingMetaData {
    /// The group to cascade with when validating for `group`.
    pub fn convert_group(&self, group: &Group) -> Group {
        self.group_conversions
            .get(group)
            .cloned()
            .unwrap_or_else(|| group.clone())
    }
}

/// A flattened property.
#[derive(Debug, Clone)]
pub struct PropertyMetaData {
    /// Property name
    pub name: String,
    /// Bean type the property holds, if declared
    pub declared_type: Option<String>,
    /// Constraints on the property value
    pub constraints: Vec<MetaConstraint>,
    /// Cascading settings
    pub cascading: CascadingMetaData,
}

/// A flattened parameter.
#[derive(Debug, Clone)]
pub struct ParameterMetaData {
    /// Position in the argument list
    pub index: usize,
    /// Parameter name
    pub name: String,
    /// Declared type name
    pub type_name: String,
    /// Constraints on the argument
    pub constraints: Vec<MetaConstraint>,
    /// Cascading settings
    pub cascading: CascadingMetaData,
}

/// A flattened method or constructor.
#[derive(Debug, Clone)]
pub struct ExecutableMetaData {
    /// Method name, or the type name for constructors
    pub name: String,
    /// Method or constructor
    pub kind: ExecutableKind,
    /// Parameters in order
    pub parameters: Vec<ParameterMetaData>,
    /// Constraints over the whole argument list
    pub cross_parameter_constraints: Vec<MetaConstraint>,
    /// Constraints on the return value
    pub return_constraints: Vec<MetaConstraint>,
    /// Cascading settings of the return value
    pub return_cascading: CascadingMetaData,
}

impl ExecutableMetaData {
    /// Declared parameter types, in order.
    pub fn parameter_types(&self) -> Vec<String> {
        self.parameters.iter().map(|p| p.type_name.clone()).collect()
    }

    /// Whether any argument or the return value is cascaded.
    pub fn has_cascades(&self) -> bool {
        self.return_cascading.cascade || self.parameters.iter().any(|p| p.cascading.cascade)
    }
}

/// Default group sequence of a type.
#[derive(Clone, Default)]
pub enum DefaultSequence {
    /// Plain `Default`
    #[default]
    Default,
    /// A fixed sequence; the type's own group has been replaced by `Default`
    Redefined(Vec<Group>),
    /// Computed per instance
    Provider(Arc<dyn DefaultGroupSequenceProvider>),
}

impl fmt::Debug for DefaultSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefaultSequence::Default => f.write_str("Default"),
            DefaultSequence::Redefined(groups) => f.debug_tuple("Redefined").field(groups).finish(),
            DefaultSequence::Provider(_) => f.write_str("Provider(<provider>)"),
        }
    }
}

/// Flattened metadata of one type.
#[derive(Debug, Clone)]
pub struct BeanMetaData {
    pub(crate) type_name: String,
    pub(crate) class_hierarchy: Vec<String>,
    pub(crate) bean_constraints: Vec<MetaConstraint>,
    pub(crate) properties: IndexMap<String, PropertyMetaData>,
    pub(crate) methods: IndexMap<String, ExecutableMetaData>,
    pub(crate) constructors: Vec<ExecutableMetaData>,
    pub(crate) default_sequence: DefaultSequence,
    pub(crate) default_sequence_host: Option<String>,
    pub(crate) has_cascadables: bool,
}

impl BeanMetaData {
    /// Metadata for a type nothing was declared for.
    pub fn unconstrained(type_name: &str) -> Self {
        Self {
            type_name: type_name.to_string(),
            class_hierarchy: vec![type_name.to_string()],
            bean_constraints: Vec::new(),
            properties: IndexMap::new(),
            methods: IndexMap::new(),
            constructors: Vec::new(),
            default_sequence: DefaultSequence::Default,
            default_sequence_host: None,
            has_cascadables: false,
        }
    }

    /// The type name.
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// The type followed by all supertypes, breadth first.
    pub fn class_hierarchy(&self) -> &[String] {
        &self.class_hierarchy
    }

    /// Bean-level constraints, own and inherited.
    pub fn bean_constraints(&self) -> &[MetaConstraint] {
        &self.bean_constraints
    }

    /// Constrained or cascaded properties.
    pub fn properties(&self) -> &IndexMap<String, PropertyMetaData> {
        &self.properties
    }

    /// A single property.
    pub fn property(&self, name: &str) -> Option<&PropertyMetaData> {
        self.properties.get(name)
    }

    /// A method by name.
    pub fn method(&self, name: &str) -> Option<&ExecutableMetaData> {
        self.methods.get(name)
    }

    /// The constructor taking `arity` arguments.
    pub fn constructor(&self, arity: usize) -> Option<&ExecutableMetaData> {
        self.constructors.iter().find(|c| c.parameters.len() == arity)
    }

    /// Whether any property is cascaded.
    pub fn has_cascadables(&self) -> bool {
        self.has_cascadables
    }

    /// Whether the bean has any constraint or cascade at all.
    pub fn is_constrained(&self) -> bool {
        !self.bean_constraints.is_empty() || !self.properties.is_empty()
    }

    /// Whether `Default` means something other than plain `Default` for this type.
    pub fn redefines_default_group_sequence(&self) -> bool {
        match &self.default_sequence {
            DefaultSequence::Default => false,
            DefaultSequence::Redefined(groups) => groups.len() > 1,
            DefaultSequence::Provider(_) => true,
        }
    }

    /// The first type of the class hierarchy, starting with this one, that
    /// redefines its default group sequence.
    ///
    /// Validating `Default` walks the hierarchy up to that type: the types
    /// before it contribute the constraints they declare directly, the host
    /// contributes all of its constraints through its sequence.
    pub fn default_sequence_host(&self) -> Option<&str> {
        self.default_sequence_host.as_deref()
    }

    /// The default group sequence for `bean`, with the type group replaced by `Default`.
    pub fn default_group_sequence(&self, bean: Option<&BeanRef>) -> MetadataResult<Vec<Group>> {
        match &self.default_sequence {
            DefaultSequence::Default => Ok(vec![Group::default_group()]),
            DefaultSequence::Redefined(groups) => Ok(groups.clone()),
            DefaultSequence::Provider(provider) => {
                normalize_default_sequence(&self.type_name, provider.validation_groups(bean))
            }
        }
    }
}

/// Check a redefined default sequence and substitute the type group with `Default`.
pub(crate) fn normalize_default_sequence(
    type_name: &str,
    groups: Vec<Group>,
) -> MetadataResult<Vec<Group>> {
    let own = Group::new(type_name);
    let invalid = |reason: &str| MetadataError::InvalidDefaultSequence {
        type_name: type_name.to_string(),
        reason: reason.to_string(),
    };
    if groups.iter().any(Group::is_default) {
        return Err(invalid("'Default' may not be part of it"));
    }
    if !groups.contains(&own) {
        return Err(invalid("it must contain the type's own group"));
    }
    Ok(groups
        .into_iter()
        .map(|g| if g == own { Group::default_group() } else { g })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_constraint_gets_type_group() {
        let d = ConstraintDescriptor::builder("NotNull").build();
        let mc = MetaConstraint::new(d, "Car");
        assert!(mc.applies_to(&Group::default_group()));
        assert!(mc.applies_to(&Group::new("Car")));
        assert!(!mc.applies_to(&Group::new("Vehicle")));
    }

    #[test]
    fn test_non_default_constraint_keeps_groups() {
        let d = ConstraintDescriptor::builder("NotNull").groups(["Strict"]).build();
        let mc = MetaConstraint::new(d, "Car");
        assert_eq!(mc.groups(), &[Group::new("Strict")]);
    }

    #[test]
    fn test_normalize_replaces_own_group() {
        let seq = normalize_default_sequence("Car", vec!["Car".into(), "Extra".into()]).unwrap();
        assert_eq!(seq, vec![Group::default_group(), Group::new("Extra")]);
    }

    #[test]
    fn test_normalize_rejects_missing_own_group_and_default() {
        assert!(normalize_default_sequence("Car", vec!["Extra".into()]).is_err());
        assert!(
            normalize_default_sequence("Car", vec!["Car".into(), "Default".into()]).is_err()
        );
    }

    #[test]
    fn test_single_group_sequence_is_not_redefined() {
        let mut meta = BeanMetaData::unconstrained("Car");
        meta.default_sequence = DefaultSequence::Redefined(vec![Group::default_group()]);
        assert!(!meta.redefines_default_group_sequence());
        meta.default_sequence =
            DefaultSequence::Redefined(vec![Group::default_group(), Group::new("Extra")]);
        assert!(meta.redefines_default_group_sequence());
    }

    #[test]
    fn test_group_conversion() {
        let mut cascading = CascadingMetaData::default();
        cascading
            .group_conversions
            .insert(Group::default_group(), Group::new("Basic"));
        assert_eq!(
            cascading.convert_group(&Group::default_group()),
            Group::new("Basic")
        );
        assert_eq!(cascading.convert_group(&Group::new("X")), Group::new("X"));
    }
}
