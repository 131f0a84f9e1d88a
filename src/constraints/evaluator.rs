//! Evaluation of a single constraint and, recursively, its composing constraints.

use crate::constraints::manager::ConstraintValidatorManager;
use crate::constraints::validator::{ClockProvider, ConstraintValidatorContext, CustomViolation};
use crate::core::error::{ConstraintError, ValidatorResult};
use crate::core::path::TraversalPath;
use crate::core::types::{TypeHierarchy, Value};
use crate::metadata::{CompositionType, ConstraintDescriptor};
use std::sync::Arc;

/// Deepest composition evaluated before giving up.
pub const MAX_COMPOSITION_DEPTH: usize = 64;

/// A violation produced by evaluation, not yet recorded.
#[derive(Debug, Clone)]
pub struct PendingViolation {
    /// The constraint the violation is reported for
    pub descriptor: Arc<ConstraintDescriptor>,
    /// Raw message template
    pub template: String,
    /// Property node to append to the current path
    pub property: Option<String>,
}

impl PendingViolation {
    fn from_custom(descriptor: &Arc<ConstraintDescriptor>, custom: CustomViolation) -> Self {
        Self {
            descriptor: Arc::clone(descriptor),
            template: custom.template,
            property: custom.property,
        }
    }

    fn default_for(descriptor: &Arc<ConstraintDescriptor>) -> Self {
        Self {
            descriptor: Arc::clone(descriptor),
            template: descriptor.message_template().to_string(),
            property: None,
        }
    }
}

/// Outcome of evaluating one constraint tree.
#[derive(Debug, Clone, Default)]
pub struct EvaluationResult {
    /// Whether the constraint is satisfied
    pub satisfied: bool,
    /// Violations to record; empty when satisfied
    pub violations: Vec<PendingViolation>,
}

/// Evaluates constraint trees against values.
///
/// Composing constraints are evaluated first, depth first, against the same
/// value and path. With fail-fast on, an `And` composition stops at the first
/// failing child and skips the constraint's own validator.
pub struct ConstraintEvaluator<'a> {
    validators: &'a ConstraintValidatorManager,
    types: &'a dyn TypeHierarchy,
    clock: &'a dyn ClockProvider,
    fail_fast: bool,
}

impl<'a> ConstraintEvaluator<'a> {
    /// Create an evaluator.
    pub fn new(
        validators: &'a ConstraintValidatorManager,
        types: &'a dyn TypeHierarchy,
        clock: &'a dyn ClockProvider,
        fail_fast: bool,
    ) -> Self {
        Self {
            validators,
            types,
            clock,
            fail_fast,
        }
    }

    /// Evaluate `descriptor` against `value` found at `path`.
    pub fn evaluate(
        &self,
        descriptor: &Arc<ConstraintDescriptor>,
        value: &Value,
        path: &TraversalPath,
    ) -> ValidatorResult<EvaluationResult> {
        self.evaluate_tree(descriptor, value, path, 0)
    }

    fn evaluate_tree(
        &self,
        descriptor: &Arc<ConstraintDescriptor>,
        value: &Value,
        path: &TraversalPath,
        depth: usize,
    ) -> ValidatorResult<EvaluationResult> {
        if depth > MAX_COMPOSITION_DEPTH {
            return Err(ConstraintError::CompositionTooDeep {
                constraint: descriptor.constraint_type().to_string(),
                limit: MAX_COMPOSITION_DEPTH,
            }
            .into());
        }
        let composition = descriptor.composition();

        let mut child_violations = Vec::new();
        let mut all_true = true;
        let mut at_least_one_true = false;
        for child in descriptor.composing() {
            let result = self.evaluate_tree(child, value, path, depth + 1)?;
            if result.satisfied {
                at_least_one_true = true;
            } else {
                all_true = false;
                child_violations.extend(result.violations);
            }
            match composition {
                CompositionType::Or if at_least_one_true => break,
                CompositionType::And if self.fail_fast && !all_true => break,
                _ => {}
            }
        }

        // Own validator: None when absent or skipped, Some(outcome) otherwise.
        let mut own_violations = Vec::new();
        let own = if self.needs_own_evaluation(descriptor, &child_violations, at_least_one_true) {
            self.evaluate_own(descriptor, value, path, &mut own_violations)?
        } else {
            None
        };

        let satisfied = match composition {
            CompositionType::And => all_true && own != Some(false),
            CompositionType::Or if descriptor.is_composed() => {
                at_least_one_true || own == Some(true)
            }
            CompositionType::Or => own != Some(false),
            CompositionType::AllFalse => !at_least_one_true && own != Some(false),
        };
        log::trace!(
            "Constraint {} at '{}' satisfied: {}",
            descriptor.constraint_type(),
            path,
            satisfied
        );

        if satisfied {
            return Ok(EvaluationResult {
                satisfied,
                violations: Vec::new(),
            });
        }

        let single = descriptor.report_as_single_violation()
            || composition == CompositionType::AllFalse;
        let violations = if single {
            if own_violations.is_empty() {
                vec![PendingViolation::default_for(descriptor)]
            } else {
                own_violations
            }
        } else {
            let mut all = child_violations;
            all.extend(own_violations);
            if all.is_empty() {
                all.push(PendingViolation::default_for(descriptor));
            }
            all
        };

        Ok(EvaluationResult {
            satisfied,
            violations,
        })
    }

    fn needs_own_evaluation(
        &self,
        descriptor: &ConstraintDescriptor,
        child_violations: &[PendingViolation],
        at_least_one_true: bool,
    ) -> bool {
        if descriptor.validators().is_empty() {
            return false;
        }
        match descriptor.composition() {
            CompositionType::Or => !at_least_one_true,
            CompositionType::And => {
                child_violations.is_empty()
                    || !(self.fail_fast || descriptor.report_as_single_violation())
            }
            CompositionType::AllFalse => !(self.fail_fast && !child_violations.is_empty()),
        }
    }

    /// Run the descriptor's own validator. Null values that no candidate
    /// handles count as valid.
    fn evaluate_own(
        &self,
        descriptor: &Arc<ConstraintDescriptor>,
        value: &Value,
        path: &TraversalPath,
        violations: &mut Vec<PendingViolation>,
    ) -> ValidatorResult<Option<bool>> {
        let Some(definition) = self.validators.resolve(descriptor, value, self.types)? else {
            return Ok(Some(true));
        };
        let validator = self.validators.get_or_create(descriptor, definition)?;

        let mut context = ConstraintValidatorContext::new(descriptor.message_template(), self.clock);
        let valid = validator.is_valid(value, &mut context).map_err(|source| {
            log::debug!(
                "Validator {} failed at '{}': {}",
                definition.id(),
                path,
                source
            );
            ConstraintError::ValidatorFailure {
                constraint: descriptor.constraint_type().to_string(),
                path: path.to_string(),
                source,
            }
        })?;

        if !valid {
            let reported = context.into_violations();
            if reported.is_empty() {
                log::warn!(
                    "Validator {} rejected the value at '{}' without reporting a violation",
                    definition.id(),
                    path
                );
                return Err(ConstraintError::NoViolationReported {
                    constraint: descriptor.constraint_type().to_string(),
                    path: path.to_string(),
                }
                .into());
            }
            violations.extend(
                reported
                    .into_iter()
                    .map(|custom| PendingViolation::from_custom(descriptor, custom)),
            );
        }
        Ok(Some(valid))
    }
}
