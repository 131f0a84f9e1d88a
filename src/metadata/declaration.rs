//! Raw per-type constraint declarations.
//!
//! Declarations describe what a single type declares, without anything
//! inherited. Whatever discovers constraints (annotations, mapping files, code)
//! produces these; the metadata manager flattens them across the hierarchy.

use crate::groups::Group;
use crate::metadata::descriptor::ConstraintDescriptor;
use crate::metadata::extractor::ValueExtractor;
use crate::core::types::BeanRef;
use indexmap::IndexMap;
use std::fmt;
use std::sync::Arc;

/// Computes a bean's default group sequence per instance.
pub trait DefaultGroupSequenceProvider: Send + Sync {
    /// The default group sequence for `bean`, which is `None` when validating a
    /// detached value or constructor arguments. The result must contain the
    /// bean's own type group and must not contain `Default`.
    fn validation_groups(&self, bean: Option<&BeanRef>) -> Vec<Group>;
}

/// Cascading settings shared by properties, parameters and return values.
#[derive(Debug, Clone, Default)]
pub struct CascadeDeclaration {
    pub(crate) cascade: bool,
    pub(crate) extractor: ValueExtractor,
    pub(crate) element_constraints: Vec<Arc<ConstraintDescriptor>>,
    pub(crate) group_conversions: Vec<(Group, Group)>,
}

impl CascadeDeclaration {
    fn is_declared(&self) -> bool {
        self.cascade || !self.element_constraints.is_empty() || !self.group_conversions.is_empty()
    }
}

macro_rules! cascade_builders {
    () => {
        /// Mark the element for cascaded validation.
        pub fn cascade(mut self) -> Self {
            self.cascading.cascade = true;
            self
        }

        /// Set how children are extracted from a container value.
        pub fn extractor(mut self, extractor: ValueExtractor) -> Self {
            self.cascading.extractor = extractor;
            self
        }

        /// Add a constraint applied to every extracted container element.
        pub fn element_constraint(mut self, descriptor: Arc<ConstraintDescriptor>) -> Self {
            self.cascading.element_constraints.push(descriptor);
            self
        }

        /// Convert group `from` to `to` when cascading.
        pub fn convert_group(mut self, from: impl Into<Group>, to: impl Into<Group>) -> Self {
            self.cascading.group_conversions.push((from.into(), to.into()));
            self
        }
    };
}

/// A property declared on a type.
#[derive(Debug, Clone)]
pub struct PropertyDeclaration {
    pub(crate) name: String,
    pub(crate) declared_type: Option<String>,
    pub(crate) constraints: Vec<Arc<ConstraintDescriptor>>,
    pub(crate) cascading: CascadeDeclaration,
}

impl PropertyDeclaration {
    /// Declare a property.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            declared_type: None,
            constraints: Vec::new(),
            cascading: CascadeDeclaration::default(),
        }
    }

    /// Add a constraint.
    pub fn constraint(mut self, descriptor: Arc<ConstraintDescriptor>) -> Self {
        self.constraints.push(descriptor);
        self
    }

    /// Declare the bean type held by this property, used to navigate nested
    /// paths without an instance.
    pub fn of_type(mut self, type_name: impl Into<String>) -> Self {
        self.declared_type = Some(type_name.into());
        self
    }

    cascade_builders!();
}

/// A parameter of an executable.
#[derive(Debug, Clone)]
pub struct ParameterDeclaration {
    pub(crate) name: String,
    pub(crate) type_name: String,
    pub(crate) constraints: Vec<Arc<ConstraintDescriptor>>,
    pub(crate) cascading: CascadeDeclaration,
}

impl ParameterDeclaration {
    /// Declare a parameter with its type name.
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            constraints: Vec::new(),
            cascading: CascadeDeclaration::default(),
        }
    }

    /// Add a constraint.
    pub fn constraint(mut self, descriptor: Arc<ConstraintDescriptor>) -> Self {
        self.constraints.push(descriptor);
        self
    }

    cascade_builders!();

    pub(crate) fn is_constrained(&self) -> bool {
        !self.constraints.is_empty() || self.cascading.is_declared()
    }
}

/// Whether an executable is a method or a constructor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExecutableKind {
    /// An instance method
    Method,
    /// A constructor; never inherited
    Constructor,
}

/// A method or constructor declared on a type.
#[derive(Debug, Clone)]
pub struct ExecutableDeclaration {
    pub(crate) name: String,
    pub(crate) kind: ExecutableKind,
    pub(crate) parameters: Vec<ParameterDeclaration>,
    pub(crate) cross_parameter_constraints: Vec<Arc<ConstraintDescriptor>>,
    pub(crate) return_constraints: Vec<Arc<ConstraintDescriptor>>,
    pub(crate) cascading: CascadeDeclaration,
}

impl ExecutableDeclaration {
    /// Declare a method.
    pub fn method(name: impl Into<String>) -> Self {
        Self::new(name.into(), ExecutableKind::Method)
    }

    /// Declare a constructor. Its name is filled in with the declaring type.
    pub fn constructor() -> Self {
        Self::new(String::new(), ExecutableKind::Constructor)
    }

    fn new(name: String, kind: ExecutableKind) -> Self {
        Self {
            name,
            kind,
            parameters: Vec::new(),
            cross_parameter_constraints: Vec::new(),
            return_constraints: Vec::new(),
            cascading: CascadeDeclaration::default(),
        }
    }

    /// Add the next parameter.
    pub fn parameter(mut self, parameter: ParameterDeclaration) -> Self {
        self.parameters.push(parameter);
        self
    }

    /// Add a constraint over all parameters at once.
    pub fn cross_parameter_constraint(mut self, descriptor: Arc<ConstraintDescriptor>) -> Self {
        self.cross_parameter_constraints.push(descriptor);
        self
    }

    /// Add a return value constraint.
    pub fn return_constraint(mut self, descriptor: Arc<ConstraintDescriptor>) -> Self {
        self.return_constraints.push(descriptor);
        self
    }

    /// Mark the return value for cascaded validation.
    pub fn cascade_return_value(mut self) -> Self {
        self.cascading.cascade = true;
        self
    }

    /// Set how children are extracted from a container return value.
    pub fn return_value_extractor(mut self, extractor: ValueExtractor) -> Self {
        self.cascading.extractor = extractor;
        self
    }

    /// Convert group `from` to `to` when cascading into the return value.
    pub fn convert_return_group(mut self, from: impl Into<Group>, to: impl Into<Group>) -> Self {
        self.cascading.group_conversions.push((from.into(), to.into()));
        self
    }

    pub(crate) fn declares_parameter_rules(&self) -> bool {
        !self.cross_parameter_constraints.is_empty()
            || self.parameters.iter().any(ParameterDeclaration::is_constrained)
    }
}

/// Everything a single type declares.
#[derive(Clone)]
pub struct BeanDeclaration {
    pub(crate) type_name: String,
    pub(crate) supertypes: Vec<String>,
    pub(crate) constraints: Vec<Arc<ConstraintDescriptor>>,
    pub(crate) properties: IndexMap<String, PropertyDeclaration>,
    pub(crate) methods: IndexMap<String, ExecutableDeclaration>,
    pub(crate) constructors: Vec<ExecutableDeclaration>,
    pub(crate) default_group_sequence: Option<Vec<Group>>,
    pub(crate) sequence_provider: Option<Arc<dyn DefaultGroupSequenceProvider>>,
}

impl BeanDeclaration {
    /// Start declaring a type.
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            supertypes: Vec::new(),
            constraints: Vec::new(),
            properties: IndexMap::new(),
            methods: IndexMap::new(),
            constructors: Vec::new(),
            default_group_sequence: None,
            sequence_provider: None,
        }
    }

    /// Add a direct supertype (superclass or interface).
    pub fn extends(mut self, supertype: impl Into<String>) -> Self {
        self.supertypes.push(supertype.into());
        self
    }

    /// Add a bean-level constraint.
    pub fn constraint(mut self, descriptor: Arc<ConstraintDescriptor>) -> Self {
        self.constraints.push(descriptor);
        self
    }

    /// Declare a property. Declaring the same name twice replaces the first.
    pub fn property(mut self, property: PropertyDeclaration) -> Self {
        self.properties.insert(property.name.clone(), property);
        self
    }

    /// Declare a method.
    pub fn method(mut self, method: ExecutableDeclaration) -> Self {
        self.methods.insert(method.name.clone(), method);
        self
    }

    /// Declare a constructor.
    pub fn constructor(mut self, mut constructor: ExecutableDeclaration) -> Self {
        constructor.name = self.type_name.clone();
        constructor.kind = ExecutableKind::Constructor;
        self.constructors.push(constructor);
        self
    }

    /// Redefine the default group sequence. It must contain this type's own
    /// group, which stands for the `Default` constraints of the type.
    pub fn default_group_sequence<I, G>(mut self, groups: I) -> Self
    where
        I: IntoIterator<Item = G>,
        G: Into<Group>,
    {
        self.default_group_sequence = Some(groups.into_iter().map(Into::into).collect());
        self
    }

    /// Compute the default group sequence per instance.
    pub fn group_sequence_provider(mut self, provider: Arc<dyn DefaultGroupSequenceProvider>) -> Self {
        self.sequence_provider = Some(provider);
        self
    }

    /// The declared type name.
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Whether `Default` means more than the type's own `Default` constraints.
    pub(crate) fn redefines_default_group_sequence(&self) -> bool {
        self.sequence_provider.is_some()
            || self
                .default_group_sequence
                .as_ref()
                .map_or(false, |groups| groups.len() > 1)
    }

    /// Every group named anywhere in this declaration.
    pub(crate) fn referenced_groups(&self) -> Vec<Group> {
        fn collect(descriptor: &ConstraintDescriptor, out: &mut Vec<Group>) {
            out.extend(descriptor.groups().iter().cloned());
            for child in descriptor.composing() {
                collect(child, out);
            }
        }
        fn collect_cascade(cascade: &CascadeDeclaration, out: &mut Vec<Group>) {
            for d in &cascade.element_constraints {
                collect(d, out);
            }
            for (from, to) in &cascade.group_conversions {
                out.push(from.clone());
                out.push(to.clone());
            }
        }

        let mut out = vec![Group::new(&self.type_name)];
        for d in &self.constraints {
            collect(d, &mut out);
        }
        for property in self.properties.values() {
            for d in &property.constraints {
                collect(d, &mut out);
            }
            collect_cascade(&property.cascading, &mut out);
        }
        for executable in self.methods.values().chain(self.constructors.iter()) {
            for d in executable
                .cross_parameter_constraints
                .iter()
                .chain(executable.return_constraints.iter())
            {
                collect(d, &mut out);
            }
            collect_cascade(&executable.cascading, &mut out);
            for parameter in &executable.parameters {
                for d in &parameter.constraints {
                    collect(d, &mut out);
                }
                collect_cascade(&parameter.cascading, &mut out);
            }
        }
        if let Some(sequence) = &self.default_group_sequence {
            out.extend(sequence.iter().cloned());
        }
        out.sort();
        out.dedup();
        out
    }
}

impl fmt::Debug for BeanDeclaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BeanDeclaration")
            .field("type_name", &self.type_name)
            .field("supertypes", &self.supertypes)
            .field("constraints", &self.constraints.len())
            .field("properties", &self.properties.keys().collect::<Vec<_>>())
            .field("methods", &self.methods.keys().collect::<Vec<_>>())
            .field("constructors", &self.constructors.len())
            .field("default_group_sequence", &self.default_group_sequence)
            .field(
                "sequence_provider",
                &self.sequence_provider.as_ref().map(|_| "<provider>"),
            )
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_referenced_groups_include_type_and_conversions() {
        let d = ConstraintDescriptor::builder("NotNull").groups(["Strict"]).build();
        let decl = BeanDeclaration::new("Order")
            .property(PropertyDeclaration::new("id").constraint(d))
            .property(
                PropertyDeclaration::new("customer")
                    .cascade()
                    .convert_group("Default", "CustomerChecks"),
            );
        let names: Vec<String> = decl
            .referenced_groups()
            .iter()
            .map(|g| g.to_string())
            .collect();
        assert_eq!(names, vec!["CustomerChecks", "Default", "Order", "Strict"]);
    }

    #[test]
    fn test_constructor_takes_type_name() {
        let decl = BeanDeclaration::new("Car").constructor(
            ExecutableDeclaration::constructor()
                .parameter(ParameterDeclaration::new("plate", "Text")),
        );
        assert_eq!(decl.constructors[0].name, "Car");
        assert_eq!(decl.constructors[0].kind, ExecutableKind::Constructor);
    }

    #[test]
    fn test_parameter_rules_detected() {
        let plain = ExecutableDeclaration::method("drive")
            .parameter(ParameterDeclaration::new("speed", "Integer"));
        assert!(!plain.declares_parameter_rules());
        let cascaded = ExecutableDeclaration::method("drive")
            .parameter(ParameterDeclaration::new("driver", "Person").cascade());
        assert!(cascaded.declares_parameter_rules());
    }
}
