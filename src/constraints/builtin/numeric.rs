//! Numeric bounds.

use crate::constraints::registry::ValidatorRegistry;
use crate::constraints::validator::{
    ConstraintValidator, ConstraintValidatorContext, ValidatorDefinition,
};
use crate::core::error::BoxError;
use crate::core::types::{Value, ValueType};
use crate::metadata::{ConstraintDescriptor, ConstraintDescriptorBuilder};

/// Register numeric validators.
pub fn register(registry: &mut ValidatorRegistry) {
    registry.register(ValidatorDefinition::new("Min", ValueType::Number, |d| {
        Ok(Box::new(Bound::lower(d.integer_attribute("value")?, true)))
    }));
    registry.register(ValidatorDefinition::new("Max", ValueType::Number, |d| {
        Ok(Box::new(Bound::upper(d.integer_attribute("value")?)))
    }));
    registry.register(ValidatorDefinition::new("Positive", ValueType::Number, |_| {
        Ok(Box::new(Bound::lower(0, false)))
    }));
    registry.register(ValidatorDefinition::new(
        "PositiveOrZero",
        ValueType::Number,
        |_| Ok(Box::new(Bound::lower(0, true))),
    ));
}

/// The number must be at least `value`.
pub fn min(value: i64) -> ConstraintDescriptorBuilder {
    ConstraintDescriptor::builder("Min")
        .attribute("value", value)
        .validator("Min")
}

/// The number must be at most `value`.
pub fn max(value: i64) -> ConstraintDescriptorBuilder {
    ConstraintDescriptor::builder("Max")
        .attribute("value", value)
        .validator("Max")
}

/// The number must be strictly greater than zero.
pub fn positive() -> ConstraintDescriptorBuilder {
    ConstraintDescriptor::builder("Positive").validator("Positive")
}

/// The number must be zero or greater.
pub fn positive_or_zero() -> ConstraintDescriptorBuilder {
    ConstraintDescriptor::builder("PositiveOrZero").validator("PositiveOrZero")
}

#[derive(Debug, Clone, Copy)]
enum Bound {
    Lower { limit: i64, inclusive: bool },
    Upper { limit: i64 },
}

impl Bound {
    fn lower(limit: i64, inclusive: bool) -> Self {
        Bound::Lower { limit, inclusive }
    }

    fn upper(limit: i64) -> Self {
        Bound::Upper { limit }
    }
}

impl ConstraintValidator for Bound {
    fn is_valid(&self, value: &Value, _: &mut ConstraintValidatorContext<'_>) -> Result<bool, BoxError> {
        let ordering = match value {
            Value::Integer(i) => i.cmp(&self.limit()),
            Value::Float(f) if f.is_nan() => return Ok(false),
            Value::Float(f) => match f.partial_cmp(&(self.limit() as f64)) {
                Some(ordering) => ordering,
                None => return Ok(false),
            },
            other => return Err(format!("expected a number, got {}", other).into()),
        };
        Ok(match self {
            Bound::Lower { inclusive: true, .. } => ordering.is_ge(),
            Bound::Lower { inclusive: false, .. } => ordering.is_gt(),
            Bound::Upper { .. } => ordering.is_le(),
        })
    }
}

impl Bound {
    fn limit(&self) -> i64 {
        match self {
            Bound::Lower { limit, .. } | Bound::Upper { limit } => *limit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraints::validator::SystemClock;

    fn check(validator: &dyn ConstraintValidator, value: Value) -> bool {
        let clock = SystemClock;
        let mut ctx = ConstraintValidatorContext::new("", &clock);
        validator.is_valid(&value, &mut ctx).unwrap()
    }

    #[test]
    fn test_min_and_max() {
        let mut registry = ValidatorRegistry::new();
        register(&mut registry);
        let min_def = registry.get("Min").unwrap();
        let validator = min_def.create(&min(18).build()).unwrap();
        assert!(check(validator.as_ref(), Value::Integer(18)));
        assert!(!check(validator.as_ref(), Value::Integer(17)));
        assert!(!check(validator.as_ref(), Value::Float(17.5)));

        let max_def = registry.get("Max").unwrap();
        let validator = max_def.create(&max(10).build()).unwrap();
        assert!(check(validator.as_ref(), Value::Float(10.0)));
        assert!(!check(validator.as_ref(), Value::Integer(11)));
    }

    #[test]
    fn test_positive_variants() {
        assert!(!check(&Bound::lower(0, false), Value::Integer(0)));
        assert!(check(&Bound::lower(0, true), Value::Integer(0)));
        assert!(!check(&Bound::lower(0, true), Value::Float(f64::NAN)));
    }

    #[test]
    fn test_missing_bound_fails_initialization() {
        let mut registry = ValidatorRegistry::new();
        register(&mut registry);
        let d = ConstraintDescriptor::builder("Min").validator("Min").build();
        assert!(registry.get("Min").unwrap().create(&d).is_err());
    }
}
