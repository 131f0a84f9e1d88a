//! Per-call validation state.

use crate::constraints::evaluator::PendingViolation;
use crate::core::path::{Node, TraversalPath};
use crate::core::types::{BeanRef, Value};
use crate::engine::interpolator::{MessageContext, MessageInterpolator};
use crate::engine::options::ValidatorOptions;
use crate::engine::traversable::CachingTraversableResolver;
use crate::engine::violation::ConstraintViolation;
use crate::groups::Group;
use indexmap::IndexSet;
use std::collections::HashSet;

/// Executable under validation, carried into every violation of the call.
#[derive(Debug, Clone, Default)]
pub(crate) struct ExecutableInfo {
    pub name: String,
    pub parameters: Option<Vec<Value>>,
    pub return_value: Option<Value>,
}

/// State of one validation call. Never shared between calls or threads.
pub(crate) struct ValidationContext<'a> {
    root_bean: Option<BeanRef>,
    root_type: String,
    executable: Option<ExecutableInfo>,
    fail_fast: bool,
    interpolator: &'a dyn MessageInterpolator,
    traversable: CachingTraversableResolver<'a>,
    /// `None` when the root cannot reach any other bean.
    processed: Option<HashSet<(BeanRef, Group)>>,
    violations: IndexSet<ConstraintViolation>,
}

impl<'a> ValidationContext<'a> {
    pub(crate) fn new(
        root_bean: Option<BeanRef>,
        root_type: impl Into<String>,
        options: &'a ValidatorOptions,
        track_processed: bool,
    ) -> Self {
        Self {
            root_bean,
            root_type: root_type.into(),
            executable: None,
            fail_fast: options.fail_fast,
            interpolator: options.message_interpolator.as_ref(),
            traversable: CachingTraversableResolver::new(options.traversable_resolver.as_ref()),
            processed: track_processed.then(HashSet::new),
            violations: IndexSet::new(),
        }
    }

    pub(crate) fn with_executable(mut self, executable: ExecutableInfo) -> Self {
        self.executable = Some(executable);
        self
    }

    /// Record `(bean, group)` as processed. Returns `false` if it already was.
    pub(crate) fn mark_processed(&mut self, bean: &BeanRef, group: &Group) -> bool {
        match &mut self.processed {
            Some(processed) => processed.insert((bean.clone(), group.clone())),
            None => true,
        }
    }

    pub(crate) fn is_traversable(&mut self, bean: Option<&BeanRef>, property: &str) -> bool {
        self.traversable.is_traversable(bean, property)
    }

    pub(crate) fn violation_count(&self) -> usize {
        self.violations.len()
    }

    /// Whether fail-fast requires the traversal to stop now.
    pub(crate) fn should_stop(&self) -> bool {
        self.fail_fast && !self.violations.is_empty()
    }

    /// Materialize and record a violation found at `path`.
    pub(crate) fn add_violation(
        &mut self,
        pending: PendingViolation,
        path: &TraversalPath,
        leaf_bean: Option<&BeanRef>,
        invalid_value: &Value,
    ) {
        let path = match pending.property {
            Some(property) => path.append(Node::property(property)).materialize(),
            None => path.materialize(),
        };
        let message = self.interpolator.interpolate(&MessageContext {
            template: &pending.template,
            descriptor: &pending.descriptor,
            invalid_value,
            root_type: &self.root_type,
            path: &path,
        });
        log::trace!(
            "Violation of {} at '{}': {}",
            pending.descriptor.constraint_type(),
            path,
            message
        );

        let (executable, parameters, return_value) = match &self.executable {
            Some(info) => (
                Some(info.name.clone()),
                info.parameters.clone(),
                info.return_value.clone(),
            ),
            None => (None, None, None),
        };
        self.violations.insert(ConstraintViolation {
            message,
            message_template: pending.template,
            root_bean: self.root_bean.clone(),
            root_type: self.root_type.clone(),
            leaf_bean: leaf_bean.cloned(),
            invalid_value: invalid_value.clone(),
            path,
            descriptor: pending.descriptor,
            executable,
            parameters,
            return_value,
        });
    }

    pub(crate) fn into_violations(self) -> Vec<ConstraintViolation> {
        self.violations.into_iter().collect()
    }
}
