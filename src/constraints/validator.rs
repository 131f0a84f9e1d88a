//! The constraint validator contract.

use crate::core::error::BoxError;
use crate::core::types::{Value, ValueType};
use crate::metadata::ConstraintDescriptor;
use std::fmt;
use std::sync::Arc;
use std::time::SystemTime;

/// Logic deciding whether a single value satisfies a constraint.
///
/// Validators are shared between threads and calls once initialized. An `Err`
/// means the validator itself failed; it aborts the validation call.
pub trait ConstraintValidator: Send + Sync {
    /// Check `value`. `Ok(false)` records a violation.
    fn is_valid(
        &self,
        value: &Value,
        context: &mut ConstraintValidatorContext<'_>,
    ) -> Result<bool, BoxError>;
}

/// Source of the current time for time-sensitive validators.
pub trait ClockProvider: Send + Sync {
    /// The current instant.
    fn now(&self) -> SystemTime;
}

/// Clock backed by the system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl ClockProvider for SystemClock {
    fn now(&self) -> SystemTime {
        SystemTime::now()
    }
}

/// A violation requested by a validator, before it is recorded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomViolation {
    /// Raw message template
    pub template: String,
    /// Property node to append below the current path
    pub property: Option<String>,
}

/// Context handed to [`ConstraintValidator::is_valid`].
///
/// By default a failed check produces one violation with the constraint's
/// message template. Validators can replace it with their own violations.
pub struct ConstraintValidatorContext<'a> {
    default_template: &'a str,
    default_disabled: bool,
    custom: Vec<CustomViolation>,
    clock: &'a dyn ClockProvider,
}

impl<'a> ConstraintValidatorContext<'a> {
    /// Create a context for a constraint with the given default template.
    pub fn new(default_template: &'a str, clock: &'a dyn ClockProvider) -> Self {
        Self {
            default_template,
            default_disabled: false,
            custom: Vec::new(),
            clock,
        }
    }

    /// The constraint's own message template.
    pub fn default_template(&self) -> &str {
        self.default_template
    }

    /// Suppress the default violation.
    pub fn disable_default_violation(&mut self) {
        self.default_disabled = true;
    }

    /// Add a violation with a custom template at the current path.
    pub fn add_violation(&mut self, template: impl Into<String>) {
        self.custom.push(CustomViolation {
            template: template.into(),
            property: None,
        });
    }

    /// Add a violation below the current path, at `property`.
    pub fn add_property_violation(&mut self, template: impl Into<String>, property: impl Into<String>) {
        self.custom.push(CustomViolation {
            template: template.into(),
            property: Some(property.into()),
        });
    }

    /// The configured clock.
    pub fn clock(&self) -> &dyn ClockProvider {
        self.clock
    }

    /// Violations to record after a failed check.
    pub fn into_violations(self) -> Vec<CustomViolation> {
        let mut violations = Vec::with_capacity(self.custom.len() + 1);
        if !self.default_disabled {
            violations.push(CustomViolation {
                template: self.default_template.to_string(),
                property: None,
            });
        }
        violations.extend(self.custom);
        violations
    }
}

/// Creates an initialized validator for one constraint occurrence.
pub type ValidatorInit =
    Arc<dyn Fn(&ConstraintDescriptor) -> Result<Box<dyn ConstraintValidator>, BoxError> + Send + Sync>;

/// A validator implementation registered for a constraint.
#[derive(Clone)]
pub struct ValidatorDefinition {
    id: String,
    target: ValueType,
    handles_null: bool,
    init: ValidatorInit,
}

impl ValidatorDefinition {
    /// Define a validator that is initialized from the constraint descriptor.
    pub fn new<F>(id: impl Into<String>, target: ValueType, init: F) -> Self
    where
        F: Fn(&ConstraintDescriptor) -> Result<Box<dyn ConstraintValidator>, BoxError>
            + Send
            + Sync
            + 'static,
    {
        Self {
            id: id.into(),
            target,
            handles_null: false,
            init: Arc::new(init),
        }
    }

    /// Define a stateless validator from a predicate.
    pub fn from_fn<F>(id: impl Into<String>, target: ValueType, check: F) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        let check = Arc::new(check);
        Self::new(id, target, move |_| {
            Ok(Box::new(PredicateValidator(Arc::clone(&check))) as Box<dyn ConstraintValidator>)
        })
    }

    /// Let the validator see null values instead of treating them as valid.
    pub fn handles_null(mut self) -> Self {
        self.handles_null = true;
        self
    }

    /// Unique validator id.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The value type this validator accepts.
    pub fn target(&self) -> &ValueType {
        &self.target
    }

    /// Whether null values reach this validator.
    pub fn accepts_null(&self) -> bool {
        self.handles_null
    }

    /// Create an initialized instance for `descriptor`.
    pub fn create(&self, descriptor: &ConstraintDescriptor) -> Result<Box<dyn ConstraintValidator>, BoxError> {
        (self.init)(descriptor)
    }
}

impl fmt::Debug for ValidatorDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidatorDefinition")
            .field("id", &self.id)
            .field("target", &self.target)
            .field("handles_null", &self.handles_null)
            .field("init", &"<init>")
            .finish()
    }
}

struct PredicateValidator<F>(Arc<F>);

impl<F> ConstraintValidator for PredicateValidator<F>
where
    F: Fn(&Value) -> bool + Send + Sync,
{
    fn is_valid(&self, value: &Value, _: &mut ConstraintValidatorContext<'_>) -> Result<bool, BoxError> {
        Ok((self.0)(value))
    }
}
