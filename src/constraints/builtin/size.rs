//! Size bounds for text, collections and maps.

use crate::constraints::registry::ValidatorRegistry;
use crate::constraints::validator::{
    ConstraintValidator, ConstraintValidatorContext, ValidatorDefinition,
};
use crate::core::error::BoxError;
use crate::core::types::{Value, ValueType};
use crate::metadata::{ConstraintDescriptor, ConstraintDescriptorBuilder};

/// Register size validators, one per sized value type.
pub fn register(registry: &mut ValidatorRegistry) {
    for (id, target) in [
        ("Size.Text", ValueType::Text),
        ("Size.Collection", ValueType::Collection),
        ("Size.Map", ValueType::Map),
    ] {
        registry.register(ValidatorDefinition::new(id, target, |d| {
            Ok(Box::new(SizeValidator::from_descriptor(d)?))
        }));
    }
}

/// The size must lie within `min..=max`. Text is measured in characters.
pub fn size(min: i64, max: i64) -> ConstraintDescriptorBuilder {
    ConstraintDescriptor::builder("Size")
        .attribute("min", min)
        .attribute("max", max)
        .validator("Size.Text")
        .validator("Size.Collection")
        .validator("Size.Map")
}

/// The value must be non-null and non-empty.
pub fn not_empty() -> ConstraintDescriptorBuilder {
    ConstraintDescriptor::builder("NotEmpty")
        .composing(super::not_null().build())
        .composing(size(1, i64::MAX).build())
        .report_as_single_violation()
}

#[derive(Debug, Clone, Copy)]
struct SizeValidator {
    min: usize,
    max: usize,
}

impl SizeValidator {
    fn from_descriptor(descriptor: &ConstraintDescriptor) -> Result<Self, BoxError> {
        let bound = |name: &str, default: i64| match descriptor.attribute(name) {
            None => Ok(default),
            Some(_) => descriptor.integer_attribute(name),
        };
        let min = bound("min", 0)?;
        let max = bound("max", i64::MAX)?;
        if min < 0 || max < 0 {
            return Err("size bounds must not be negative".into());
        }
        if min > max {
            return Err(format!("size min {} exceeds max {}", min, max).into());
        }
        Ok(Self {
            min: usize::try_from(min)?,
            max: usize::try_from(max).unwrap_or(usize::MAX),
        })
    }
}

impl ConstraintValidator for SizeValidator {
    fn is_valid(&self, value: &Value, _: &mut ConstraintValidatorContext<'_>) -> Result<bool, BoxError> {
        let len = value
            .len()
            .ok_or_else(|| format!("value {} has no size", value))?;
        Ok(len >= self.min && len <= self.max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraints::validator::SystemClock;

    fn validator(min: i64, max: i64) -> SizeValidator {
        SizeValidator::from_descriptor(&size(min, max).build()).unwrap()
    }

    fn check(v: &SizeValidator, value: Value) -> bool {
        let clock = SystemClock;
        let mut ctx = ConstraintValidatorContext::new("", &clock);
        v.is_valid(&value, &mut ctx).unwrap()
    }

    #[test]
    fn test_text_measured_in_chars() {
        let v = validator(2, 3);
        assert!(check(&v, Value::from("äöü")));
        assert!(!check(&v, Value::from("a")));
        assert!(!check(&v, Value::from("abcd")));
    }

    #[test]
    fn test_containers() {
        let v = validator(1, 2);
        assert!(check(&v, Value::list([1, 2])));
        assert!(!check(&v, Value::set(Vec::<i64>::new())));
        assert!(check(&v, Value::map([("k", 1)])));
    }

    #[test]
    fn test_invalid_bounds_rejected() {
        assert!(SizeValidator::from_descriptor(&size(5, 2).build()).is_err());
        assert!(SizeValidator::from_descriptor(&size(-1, 2).build()).is_err());
    }

    #[test]
    fn test_not_empty_is_composed() {
        let d = not_empty().build();
        assert!(d.is_composed());
        assert!(d.report_as_single_violation());
        assert!(d.validators().is_empty());
    }
}
