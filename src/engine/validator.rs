//! The validator: entry points and the graph traversal behind them.
//!
//! Every entry point resolves the requested groups into a [`ValidationOrder`],
//! creates a fresh [`ValidationContext`] and walks the graph depth first. For
//! each group a bean's own constraints are checked before its cascaded
//! properties are entered. A bean is processed at most once per group and
//! call, which makes shared substructure cheap and cyclic graphs terminate.

use crate::constraints::evaluator::ConstraintEvaluator;
use crate::constraints::manager::ConstraintValidatorManager;
use crate::core::error::{MetadataError, PathError, ValidatorError, ValidatorResult};
use crate::core::path::{ContainerSegment, Node, NodeKind, Path, TraversalPath};
use crate::core::types::{BeanRef, Value};
use crate::engine::context::{ExecutableInfo, ValidationContext};
use crate::engine::options::ValidatorOptions;
use crate::engine::violation::ConstraintViolation;
use crate::groups::{Group, GroupUnit, ValidationOrder, ValidationOrderGenerator};
use crate::metadata::{
    BeanMetaData, BeanMetaDataManager, CascadingMetaData, ExecutableMetaData, MetaConstraint,
};
use rayon::prelude::*;
use std::fmt;
use std::sync::Arc;

/// State shared by every validator of one factory.
pub(crate) struct FactoryShared {
    pub(crate) metadata: BeanMetaDataManager,
    pub(crate) orders: ValidationOrderGenerator,
    pub(crate) validators: ConstraintValidatorManager,
}

/// Validates beans, single properties, detached values and executables.
///
/// Cheap to clone; clones share metadata and validator caches. Safe to use
/// from many threads at once.
#[derive(Clone)]
pub struct Validator {
    shared: Arc<FactoryShared>,
    options: Arc<ValidatorOptions>,
}

impl fmt::Debug for Validator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Validator")
            .field("options", &self.options)
            .field("cached_metadata", &self.shared.metadata.cached_count())
            .field("cached_validators", &self.shared.validators.cached_count())
            .finish()
    }
}

impl Validator {
    pub(crate) fn new(shared: Arc<FactoryShared>, options: Arc<ValidatorOptions>) -> Self {
        Self { shared, options }
    }

    /// The options this validator runs with.
    pub fn options(&self) -> &ValidatorOptions {
        &self.options
    }

    /// Flattened metadata of a type.
    pub fn constraints_for(&self, type_name: &str) -> ValidatorResult<Arc<BeanMetaData>> {
        Ok(self.shared.metadata.get(type_name)?)
    }

    /// Validate every constraint of `root` and of the beans it cascades to.
    pub fn validate(&self, root: &Value, groups: &[Group]) -> ValidatorResult<Vec<ConstraintViolation>> {
        let bean = require_bean(root)?;
        let meta = self.shared.metadata.get(bean.type_name())?;
        let order = self.shared.orders.validation_order(groups)?;
        log::debug!("Validating {:?} for groups {:?}", bean, groups);

        let ctx = ValidationContext::new(
            Some(bean.clone()),
            bean.type_name(),
            &self.options,
            meta.has_cascadables(),
        );
        let mut traversal = Traversal::new(self, ctx);
        let target = Target {
            bean: Some(bean.clone()),
            meta,
            path: TraversalPath::root(),
            filter: PropertyFilter::All,
        };
        traversal.validate_bean(&target, &order)?;
        Ok(traversal.finish())
    }

    /// Validate many roots in parallel. Each root gets its own context.
    pub fn validate_batch(
        &self,
        roots: &[Value],
        groups: &[Group],
    ) -> Vec<ValidatorResult<Vec<ConstraintViolation>>> {
        roots
            .par_iter()
            .map(|root| self.validate(root, groups))
            .collect()
    }

    /// Validate the constraints of one property of `root`.
    ///
    /// `property` may be a nested path such as `address.city` or
    /// `orders[2].total`; intermediate properties must be cascaded. The
    /// property's cascaded values are validated too.
    pub fn validate_property(
        &self,
        root: &Value,
        property: &str,
        groups: &[Group],
    ) -> ValidatorResult<Vec<ConstraintViolation>> {
        let bean = require_bean(root)?;
        let path: Path = property.parse()?;
        let meta = self.shared.metadata.get(bean.type_name())?;
        let order = self.shared.orders.validation_order(groups)?;
        log::debug!("Validating property '{}' of {:?}", property, bean);

        let ctx = ValidationContext::new(
            Some(bean.clone()),
            bean.type_name(),
            &self.options,
            meta.has_cascadables(),
        );
        let mut traversal = Traversal::new(self, ctx);
        if let Some(target) = traversal.navigate(Some(bean.clone()), meta, &path, None)? {
            traversal.validate_bean(&target, &order)?;
        }
        Ok(traversal.finish())
    }

    /// Validate `value` as if it were assigned to `property` of a `type_name` bean.
    ///
    /// Nested paths need declared property types to navigate through.
    pub fn validate_value(
        &self,
        type_name: &str,
        property: &str,
        value: &Value,
        groups: &[Group],
    ) -> ValidatorResult<Vec<ConstraintViolation>> {
        let path: Path = property.parse()?;
        let meta = self.shared.metadata.get(type_name)?;
        let order = self.shared.orders.validation_order(groups)?;
        log::debug!("Validating value for {}.{}", type_name, property);

        let ctx = ValidationContext::new(None, type_name, &self.options, meta.has_cascadables());
        let mut traversal = Traversal::new(self, ctx);
        if let Some(target) = traversal.navigate(None, meta, &path, Some(value.clone()))? {
            traversal.validate_bean(&target, &order)?;
        }
        Ok(traversal.finish())
    }

    /// Validate the arguments of a method call on `root`.
    pub fn validate_parameters(
        &self,
        root: &Value,
        method: &str,
        args: &[Value],
        groups: &[Group],
    ) -> ValidatorResult<Vec<ConstraintViolation>> {
        let bean = require_bean(root)?;
        let meta = self.shared.metadata.get(bean.type_name())?;
        let executable = find_method(&meta, method)?;
        check_arity(executable, args)?;
        let order = self.shared.orders.validation_order(groups)?;
        log::debug!("Validating parameters of {}.{}", bean.type_name(), method);

        let ctx = ValidationContext::new(
            Some(bean.clone()),
            bean.type_name(),
            &self.options,
            executable.has_cascades(),
        )
        .with_executable(ExecutableInfo {
            name: method.to_string(),
            parameters: Some(args.to_vec()),
            return_value: None,
        });
        let path =
            TraversalPath::root().append(Node::method(method, executable.parameter_types()));
        let mut traversal = Traversal::new(self, ctx);
        traversal.validate_executable(&meta, Some(bean), &order, |t, group| {
            t.validate_parameters_for_group(executable, &path, args, Some(bean), group)
        })?;
        Ok(traversal.finish())
    }

    /// Validate the value returned by a method call on `root`.
    pub fn validate_return_value(
        &self,
        root: &Value,
        method: &str,
        return_value: &Value,
        groups: &[Group],
    ) -> ValidatorResult<Vec<ConstraintViolation>> {
        let bean = require_bean(root)?;
        let meta = self.shared.metadata.get(bean.type_name())?;
        let executable = find_method(&meta, method)?;
        let order = self.shared.orders.validation_order(groups)?;
        log::debug!("Validating return value of {}.{}", bean.type_name(), method);

        let ctx = ValidationContext::new(
            Some(bean.clone()),
            bean.type_name(),
            &self.options,
            executable.has_cascades(),
        )
        .with_executable(ExecutableInfo {
            name: method.to_string(),
            parameters: None,
            return_value: Some(return_value.clone()),
        });
        let path =
            TraversalPath::root().append(Node::method(method, executable.parameter_types()));
        let mut traversal = Traversal::new(self, ctx);
        traversal.validate_executable(&meta, Some(bean), &order, |t, group| {
            t.validate_return_value_for_group(executable, &path, return_value, Some(bean), group)
        })?;
        Ok(traversal.finish())
    }

    /// Validate the arguments of a `type_name` constructor call.
    pub fn validate_constructor_parameters(
        &self,
        type_name: &str,
        args: &[Value],
        groups: &[Group],
    ) -> ValidatorResult<Vec<ConstraintViolation>> {
        let meta = self.shared.metadata.get(type_name)?;
        let executable = find_constructor(&meta, args.len())?;
        let order = self.shared.orders.validation_order(groups)?;
        log::debug!("Validating constructor parameters of {}", type_name);

        let ctx = ValidationContext::new(None, type_name, &self.options, executable.has_cascades())
            .with_executable(ExecutableInfo {
                name: type_name.to_string(),
                parameters: Some(args.to_vec()),
                return_value: None,
            });
        let path = TraversalPath::root()
            .append(Node::constructor(type_name, executable.parameter_types()));
        let mut traversal = Traversal::new(self, ctx);
        traversal.validate_executable(&meta, None, &order, |t, group| {
            t.validate_parameters_for_group(executable, &path, args, None, group)
        })?;
        Ok(traversal.finish())
    }

    /// Validate a bean created by its constructor taking `arity` arguments.
    pub fn validate_constructor_return_value(
        &self,
        created: &Value,
        arity: usize,
        groups: &[Group],
    ) -> ValidatorResult<Vec<ConstraintViolation>> {
        let bean = require_bean(created)?;
        let type_name = bean.type_name();
        let meta = self.shared.metadata.get(type_name)?;
        let executable = find_constructor(&meta, arity)?;
        let order = self.shared.orders.validation_order(groups)?;
        log::debug!("Validating constructor return value of {}", type_name);

        let ctx = ValidationContext::new(None, type_name, &self.options, executable.has_cascades())
            .with_executable(ExecutableInfo {
                name: type_name.to_string(),
                parameters: None,
                return_value: Some(created.clone()),
            });
        let path = TraversalPath::root()
            .append(Node::constructor(type_name, executable.parameter_types()));
        let mut traversal = Traversal::new(self, ctx);
        traversal.validate_executable(&meta, None, &order, |t, group| {
            t.validate_return_value_for_group(executable, &path, created, Some(bean), group)
        })?;
        Ok(traversal.finish())
    }

    fn evaluator(&self) -> ConstraintEvaluator<'_> {
        ConstraintEvaluator::new(
            &self.shared.validators,
            &self.shared.metadata,
            self.options.clock.as_ref(),
            self.options.fail_fast,
        )
    }
}

// ============================================================================
// Entry point helpers
// ============================================================================

fn require_bean(value: &Value) -> ValidatorResult<&BeanRef> {
    value.as_bean().ok_or_else(|| {
        ValidatorError::NotABean(
            value
                .value_type()
                .map_or_else(|| "null".to_string(), |t| t.display_name()),
        )
    })
}

fn find_method<'m>(meta: &'m BeanMetaData, method: &str) -> ValidatorResult<&'m ExecutableMetaData> {
    meta.method(method).ok_or_else(|| {
        MetadataError::UnknownExecutable {
            type_name: meta.type_name().to_string(),
            executable: method.to_string(),
        }
        .into()
    })
}

fn find_constructor(meta: &BeanMetaData, arity: usize) -> ValidatorResult<&ExecutableMetaData> {
    meta.constructor(arity).ok_or_else(|| {
        MetadataError::UnknownExecutable {
            type_name: meta.type_name().to_string(),
            executable: format!("{}/{}", meta.type_name(), arity),
        }
        .into()
    })
}

fn check_arity(executable: &ExecutableMetaData, args: &[Value]) -> ValidatorResult<()> {
    if executable.parameters.len() != args.len() {
        return Err(MetadataError::ParameterCountMismatch {
            executable: executable.name.clone(),
            expected: executable.parameters.len(),
            actual: args.len(),
        }
        .into());
    }
    Ok(())
}

/// Pick the container element a path node points at.
fn select_element(
    container: Value,
    segment: Option<&ContainerSegment>,
    property: &str,
    path: &Path,
) -> Result<Value, PathError> {
    let matches_key = |key: &Value, wanted: &str| key.to_string() == wanted;
    match (segment, container) {
        (_, Value::Null) => Ok(Value::Null),
        (None, Value::List(_) | Value::Set(_) | Value::Map(_)) => Err(PathError::IndexRequired {
            property: property.to_string(),
            path: path.to_string(),
        }),
        (None, value) => Ok(value),
        (Some(ContainerSegment::Index(i)), Value::List(items)) => {
            Ok(items.get(*i).cloned().unwrap_or(Value::Null))
        }
        (Some(ContainerSegment::Index(i)), Value::Map(entries)) => Ok(entries
            .into_iter()
            .find(|(k, _)| matches_key(k, &i.to_string()))
            .map_or(Value::Null, |(_, v)| v)),
        (Some(ContainerSegment::Key(key)), Value::Map(entries)) => Ok(entries
            .into_iter()
            .find(|(k, _)| k == key || matches_key(k, &key.to_string()))
            .map_or(Value::Null, |(_, v)| v)),
        (Some(_), _) => Err(PathError::Parse {
            path: path.to_string(),
            reason: format!("'{}' cannot be indexed", property),
        }),
    }
}

// ============================================================================
// Traversal
// ============================================================================

/// Which properties of a bean are validated.
#[derive(Debug, Clone)]
enum PropertyFilter {
    All,
    /// A single property, optionally with a detached value standing in for it.
    Only { name: String, value: Option<Value> },
}

impl PropertyFilter {
    fn includes(&self, property: &str) -> bool {
        match self {
            PropertyFilter::All => true,
            PropertyFilter::Only { name, .. } => name == property,
        }
    }
}

/// The type whose redefined default sequence stands in for `Default`.
struct SequenceHost {
    meta: Arc<BeanMetaData>,
    sequence: Vec<Group>,
}

/// A bean (or detached value) about to be validated.
#[derive(Debug, Clone)]
struct Target {
    bean: Option<BeanRef>,
    meta: Arc<BeanMetaData>,
    path: TraversalPath,
    filter: PropertyFilter,
}

impl Target {
    fn property_value(&self, property: &str) -> Value {
        match &self.filter {
            PropertyFilter::Only { value: Some(value), .. } => value.clone(),
            _ => self
                .bean
                .as_ref()
                .map_or(Value::Null, |bean| bean.get(property)),
        }
    }
}

struct Traversal<'v> {
    validator: &'v Validator,
    ctx: ValidationContext<'v>,
}

impl<'v> Traversal<'v> {
    fn new(validator: &'v Validator, ctx: ValidationContext<'v>) -> Self {
        Self { validator, ctx }
    }

    fn finish(self) -> Vec<ConstraintViolation> {
        let violations = self.ctx.into_violations();
        log::debug!("Validation finished with {} violation(s)", violations.len());
        violations
    }

    /// Process the units of `order`, stopping a sequence at its first failing step.
    fn run_order<F>(
        &mut self,
        order: &ValidationOrder,
        default_sequence: Option<&[Group]>,
        mut step: F,
    ) -> ValidatorResult<()>
    where
        F: FnMut(&mut Self, &Group) -> ValidatorResult<()>,
    {
        if let Some(sequence) = default_sequence {
            if order
                .units()
                .iter()
                .any(|u| matches!(u, GroupUnit::Sequence { .. }) && u.contains_default())
            {
                order.assert_default_expandable(sequence)?;
            }
        }

        for unit in order.units() {
            match unit {
                GroupUnit::Single(group) => step(self, group)?,
                GroupUnit::Sequence { name, steps } => {
                    for groups in steps.iter() {
                        let before = self.ctx.violation_count();
                        for group in groups {
                            step(self, group)?;
                            if self.ctx.should_stop() {
                                return Ok(());
                            }
                        }
                        if self.ctx.violation_count() > before {
                            log::trace!("Sequence {} stopped after failing step {:?}", name, groups);
                            break;
                        }
                    }
                }
            }
            if self.ctx.should_stop() {
                return Ok(());
            }
        }
        Ok(())
    }

    /// Evaluate a redefined default group sequence in place of `Default`.
    fn expand_default<F>(&mut self, sequence: &[Group], mut step: F) -> ValidatorResult<()>
    where
        F: FnMut(&mut Self, &Group) -> ValidatorResult<()>,
    {
        let validator = self.validator;
        for member in sequence {
            let before = self.ctx.violation_count();
            for group in validator.shared.orders.catalog().with_ancestors(member) {
                step(self, &group)?;
                if self.ctx.should_stop() {
                    return Ok(());
                }
            }
            if self.ctx.violation_count() > before {
                break;
            }
        }
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Beans
    // ------------------------------------------------------------------------

    fn validate_bean(&mut self, target: &Target, order: &ValidationOrder) -> ValidatorResult<()> {
        let host = match target.meta.default_sequence_host() {
            Some(host) => {
                let meta = self.validator.shared.metadata.get(host)?;
                let sequence = meta.default_group_sequence(target.bean.as_ref())?;
                Some(SequenceHost { meta, sequence })
            }
            None => None,
        };
        let sequence = host.as_ref().map(|h| h.sequence.as_slice());
        self.run_order(order, sequence, |t, group| {
            t.validate_bean_for_group(target, group, host.as_ref())
        })
    }

    fn validate_bean_for_group(
        &mut self,
        target: &Target,
        group: &Group,
        host: Option<&SequenceHost>,
    ) -> ValidatorResult<()> {
        if let Some(bean) = &target.bean {
            if !self.ctx.mark_processed(bean, group) {
                log::trace!("{:?} already validated for {}", bean, group);
                return Ok(());
            }
        }

        match host {
            Some(host) if group.is_default() => self.validate_default_hierarchy(target, host)?,
            _ => self.validate_constraints(target, group, None)?,
        }
        if self.ctx.should_stop() {
            return Ok(());
        }
        self.validate_cascades(target, group)
    }

    /// `Default` over a hierarchy where some type redefines its default
    /// sequence. Types below the host contribute their direct `Default`
    /// constraints; the host's sequence covers the host and its supertypes.
    fn validate_default_hierarchy(
        &mut self,
        target: &Target,
        host: &SequenceHost,
    ) -> ValidatorResult<()> {
        let default = Group::default_group();
        for declaring_type in target.meta.class_hierarchy() {
            if declaring_type == host.meta.type_name() {
                let hosted = Target {
                    meta: Arc::clone(&host.meta),
                    ..target.clone()
                };
                self.expand_default(&host.sequence, |t, g| {
                    t.validate_constraints(&hosted, g, None)
                })?;
            } else if host.meta.class_hierarchy().contains(declaring_type) {
                continue;
            } else {
                self.validate_constraints(target, &default, Some(declaring_type))?;
            }
            if self.ctx.should_stop() {
                return Ok(());
            }
        }
        Ok(())
    }

    /// Bean-level and property constraints of `target` for one group,
    /// restricted to one declaring type when `declared_by` is set.
    fn validate_constraints(
        &mut self,
        target: &Target,
        group: &Group,
        declared_by: Option<&str>,
    ) -> ValidatorResult<()> {
        if let (PropertyFilter::All, Some(bean)) = (&target.filter, &target.bean) {
            let value = Value::Bean(bean.clone());
            let path = target.path.append(Node::bean());
            for constraint in applicable(target.meta.bean_constraints(), group, declared_by) {
                self.check(constraint, &value, &path, Some(bean))?;
                if self.ctx.should_stop() {
                    return Ok(());
                }
            }
        }

        for (name, property) in target.meta.properties() {
            if !target.filter.includes(name) {
                continue;
            }
            let has_work = applicable(&property.constraints, group, declared_by)
                .next()
                .is_some()
                || applicable(&property.cascading.element_constraints, group, declared_by)
                    .next()
                    .is_some();
            if !has_work || !self.ctx.is_traversable(target.bean.as_ref(), name) {
                continue;
            }
            let value = target.property_value(name);
            self.validate_element(
                &target.path,
                Node::property(name.clone()),
                &value,
                &property.constraints,
                &property.cascading,
                target.bean.as_ref(),
                group,
                declared_by,
            )?;
            if self.ctx.should_stop() {
                return Ok(());
            }
        }
        Ok(())
    }

    fn validate_cascades(&mut self, target: &Target, group: &Group) -> ValidatorResult<()> {
        for (name, property) in target.meta.properties() {
            if !property.cascading.cascade || !target.filter.includes(name) {
                continue;
            }
            let value = target.property_value(name);
            if value.is_null() || !self.ctx.is_traversable(target.bean.as_ref(), name) {
                continue;
            }
            self.cascade(
                &target.path,
                Node::property(name.clone()),
                &value,
                &property.cascading,
                group,
            )?;
            if self.ctx.should_stop() {
                return Ok(());
            }
        }
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Elements shared by properties, parameters and return values
    // ------------------------------------------------------------------------

    /// Constraints on an element and on each of its container children.
    #[allow(clippy::too_many_arguments)]
    fn validate_element(
        &mut self,
        parent: &TraversalPath,
        node: Node,
        value: &Value,
        constraints: &[MetaConstraint],
        cascading: &CascadingMetaData,
        leaf: Option<&BeanRef>,
        group: &Group,
        declared_by: Option<&str>,
    ) -> ValidatorResult<()> {
        let path = parent.append(node.clone());
        for constraint in applicable(constraints, group, declared_by) {
            self.check(constraint, value, &path, leaf)?;
            if self.ctx.should_stop() {
                return Ok(());
            }
        }

        let element_constraints: Vec<&MetaConstraint> =
            applicable(&cascading.element_constraints, group, declared_by).collect();
        if element_constraints.is_empty() {
            return Ok(());
        }
        let Some(children) = cascading.extractor.extract(value) else {
            return Ok(());
        };
        for (segment, child) in children {
            let child_path = parent.append(node.clone().in_container(segment));
            for constraint in &element_constraints {
                self.check(constraint, &child, &child_path, leaf)?;
                if self.ctx.should_stop() {
                    return Ok(());
                }
            }
        }
        Ok(())
    }

    /// Validate the beans held by a cascaded element.
    fn cascade(
        &mut self,
        parent: &TraversalPath,
        node: Node,
        value: &Value,
        cascading: &CascadingMetaData,
        group: &Group,
    ) -> ValidatorResult<()> {
        let converted = cascading.convert_group(group);
        let order = if &converted == group {
            ValidationOrder::single(converted)
        } else {
            log::trace!("Converting group {} to {} at '{}'", group, converted, parent);
            self.validator.shared.orders.order_for_group(&converted)?
        };

        match cascading.extractor.extract(value) {
            Some(children) => {
                for (segment, child) in children {
                    if let Value::Bean(bean) = &child {
                        let path = parent.append(node.clone().in_container(segment));
                        self.validate_cascaded(bean, path, &order)?;
                        if self.ctx.should_stop() {
                            return Ok(());
                        }
                    }
                }
            }
            None => {
                if let Value::Bean(bean) = value {
                    self.validate_cascaded(bean, parent.append(node), &order)?;
                }
            }
        }
        Ok(())
    }

    fn validate_cascaded(
        &mut self,
        bean: &BeanRef,
        path: TraversalPath,
        order: &ValidationOrder,
    ) -> ValidatorResult<()> {
        let meta = self.validator.shared.metadata.get(bean.type_name())?;
        let target = Target {
            bean: Some(bean.clone()),
            meta,
            path,
            filter: PropertyFilter::All,
        };
        self.validate_bean(&target, order)
    }

    fn check(
        &mut self,
        constraint: &MetaConstraint,
        value: &Value,
        path: &TraversalPath,
        leaf: Option<&BeanRef>,
    ) -> ValidatorResult<()> {
        let result = self
            .validator
            .evaluator()
            .evaluate(constraint.descriptor(), value, path)?;
        for pending in result.violations {
            self.ctx.add_violation(pending, path, leaf, value);
            if self.ctx.should_stop() {
                break;
            }
        }
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Property paths
    // ------------------------------------------------------------------------

    /// Walk `path` down to the bean hosting its last property.
    ///
    /// Returns `None` when an intermediate value is null, or when the leaf
    /// property exists on the bean but carries no constraints.
    fn navigate(
        &mut self,
        mut bean: Option<BeanRef>,
        mut meta: Arc<BeanMetaData>,
        path: &Path,
        detached: Option<Value>,
    ) -> ValidatorResult<Option<Target>> {
        let Some((leaf, intermediate)) = path.nodes().split_last() else {
            return Err(PathError::Parse {
                path: path.to_string(),
                reason: "no property given".to_string(),
            }
            .into());
        };

        let mut traversal_path = TraversalPath::root();
        for node in intermediate {
            let name = property_name(node, path)?;
            let property = meta.property(name).ok_or_else(|| PathError::UnknownProperty {
                type_name: meta.type_name().to_string(),
                property: name.to_string(),
            })?;
            if !property.cascading.cascade {
                return Err(PathError::NotCascaded {
                    type_name: meta.type_name().to_string(),
                    property: name.to_string(),
                }
                .into());
            }

            let next_type = match bean.as_ref().map(|current| current.get(name)) {
                Some(container) => match select_element(container, node.container(), name, path)? {
                    Value::Null => return Ok(None),
                    Value::Bean(next) => {
                        let type_name = next.type_name().to_string();
                        bean = Some(next);
                        type_name
                    }
                    _ => {
                        return Err(PathError::UnresolvableType {
                            type_name: meta.type_name().to_string(),
                            property: name.to_string(),
                        }
                        .into())
                    }
                },
                None => property
                    .declared_type
                    .clone()
                    .ok_or_else(|| PathError::UnresolvableType {
                        type_name: meta.type_name().to_string(),
                        property: name.to_string(),
                    })?,
            };
            meta = self.validator.shared.metadata.get(&next_type)?;
            traversal_path = traversal_path.append(node.clone());
        }

        let name = property_name(leaf, path)?;
        if leaf.is_in_iterable() {
            return Err(PathError::Parse {
                path: path.to_string(),
                reason: format!("the validated property '{}' may not be indexed", name),
            }
            .into());
        }
        if meta.property(name).is_none() {
            if bean.as_ref().map_or(false, |b| b.has_property(name)) {
                return Ok(None);
            }
            return Err(PathError::UnknownProperty {
                type_name: meta.type_name().to_string(),
                property: name.to_string(),
            }
            .into());
        }

        Ok(Some(Target {
            bean,
            meta,
            path: traversal_path,
            filter: PropertyFilter::Only {
                name: name.to_string(),
                value: detached,
            },
        }))
    }

    // ------------------------------------------------------------------------
    // Executables
    // ------------------------------------------------------------------------

    fn validate_executable<F>(
        &mut self,
        meta: &BeanMetaData,
        bean: Option<&BeanRef>,
        order: &ValidationOrder,
        mut per_group: F,
    ) -> ValidatorResult<()>
    where
        F: FnMut(&mut Self, &Group) -> ValidatorResult<()>,
    {
        let default_sequence = if meta.redefines_default_group_sequence() {
            Some(meta.default_group_sequence(bean)?)
        } else {
            None
        };
        let sequence = default_sequence.as_deref();
        self.run_order(order, sequence, |t, group| match sequence {
            Some(sequence) if group.is_default() => t.expand_default(sequence, &mut per_group),
            _ => per_group(t, group),
        })
    }

    fn validate_parameters_for_group(
        &mut self,
        executable: &ExecutableMetaData,
        path: &TraversalPath,
        args: &[Value],
        leaf: Option<&BeanRef>,
        group: &Group,
    ) -> ValidatorResult<()> {
        let cross: Vec<&MetaConstraint> =
            applicable(&executable.cross_parameter_constraints, group, None).collect();
        if !cross.is_empty() {
            let all = Value::List(args.to_vec());
            let cross_path = path.append(Node::cross_parameter());
            for constraint in cross {
                self.check(constraint, &all, &cross_path, leaf)?;
                if self.ctx.should_stop() {
                    return Ok(());
                }
            }
        }

        for (parameter, arg) in executable.parameters.iter().zip(args) {
            self.validate_element(
                path,
                Node::parameter(parameter.name.clone(), parameter.index),
                arg,
                &parameter.constraints,
                &parameter.cascading,
                leaf,
                group,
                None,
            )?;
            if self.ctx.should_stop() {
                return Ok(());
            }
        }

        for (parameter, arg) in executable.parameters.iter().zip(args) {
            if !parameter.cascading.cascade || arg.is_null() {
                continue;
            }
            self.cascade(
                path,
                Node::parameter(parameter.name.clone(), parameter.index),
                arg,
                &parameter.cascading,
                group,
            )?;
            if self.ctx.should_stop() {
                return Ok(());
            }
        }
        Ok(())
    }

    fn validate_return_value_for_group(
        &mut self,
        executable: &ExecutableMetaData,
        path: &TraversalPath,
        value: &Value,
        leaf: Option<&BeanRef>,
        group: &Group,
    ) -> ValidatorResult<()> {
        self.validate_element(
            path,
            Node::return_value(),
            value,
            &executable.return_constraints,
            &executable.return_cascading,
            leaf,
            group,
            None,
        )?;
        if self.ctx.should_stop() || !executable.return_cascading.cascade || value.is_null() {
            return Ok(());
        }
        self.cascade(
            path,
            Node::return_value(),
            value,
            &executable.return_cascading,
            group,
        )
    }
}

fn applicable<'c>(
    constraints: &'c [MetaConstraint],
    group: &'c Group,
    declared_by: Option<&'c str>,
) -> impl Iterator<Item = &'c MetaConstraint> + 'c {
    constraints.iter().filter(move |c| {
        c.applies_to(group) && declared_by.map_or(true, |t| c.declaring_type() == t)
    })
}

fn property_name<'n>(node: &'n Node, path: &Path) -> Result<&'n str, PathError> {
    match (node.kind(), node.name()) {
        (NodeKind::Property, Some(name)) => Ok(name),
        _ => Err(PathError::Parse {
            path: path.to_string(),
            reason: format!("'{}' is not a property", node),
        }),
    }
}
