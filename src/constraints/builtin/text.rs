//! Text checks.

use crate::constraints::registry::ValidatorRegistry;
use crate::constraints::validator::{
    ConstraintValidator, ConstraintValidatorContext, ValidatorDefinition,
};
use crate::core::error::BoxError;
use crate::core::types::{Value, ValueType};
use crate::metadata::{ConstraintDescriptor, ConstraintDescriptorBuilder};
use regex::Regex;

/// Register text validators.
pub fn register(registry: &mut ValidatorRegistry) {
    registry.register(
        ValidatorDefinition::from_fn("NotBlank", ValueType::Text, |v| {
            v.as_text().map_or(false, |s| !s.trim().is_empty())
        })
        .handles_null(),
    );
    registry.register(ValidatorDefinition::new("Pattern", ValueType::Text, |d| {
        Ok(Box::new(PatternValidator::from_descriptor(d)?))
    }));
}

/// The text must be non-null and contain a non-whitespace character.
pub fn not_blank() -> ConstraintDescriptorBuilder {
    ConstraintDescriptor::builder("NotBlank").validator("NotBlank")
}

/// The whole text must match `regexp`.
pub fn pattern(regexp: impl Into<String>) -> ConstraintDescriptorBuilder {
    ConstraintDescriptor::builder("Pattern")
        .attribute("regexp", regexp.into())
        .validator("Pattern")
}

#[derive(Debug, Clone)]
struct PatternValidator {
    regex: Regex,
}

impl PatternValidator {
    fn from_descriptor(descriptor: &ConstraintDescriptor) -> Result<Self, BoxError> {
        let source = descriptor.text_attribute("regexp")?;
        let regex = Regex::new(&format!("^(?:{})$", source))?;
        Ok(Self { regex })
    }
}

impl ConstraintValidator for PatternValidator {
    fn is_valid(&self, value: &Value, _: &mut ConstraintValidatorContext<'_>) -> Result<bool, BoxError> {
        let text = value
            .as_text()
            .ok_or_else(|| format!("expected text, got {}", value))?;
        Ok(self.regex.is_match(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraints::validator::SystemClock;

    fn check(v: &dyn ConstraintValidator, value: Value) -> bool {
        let clock = SystemClock;
        let mut ctx = ConstraintValidatorContext::new("", &clock);
        v.is_valid(&value, &mut ctx).unwrap()
    }

    #[test]
    fn test_pattern_matches_whole_text() {
        let v = PatternValidator::from_descriptor(&pattern("[A-Z]{2}-\\d+").build()).unwrap();
        assert!(check(&v, Value::from("DD-1234")));
        assert!(!check(&v, Value::from("xDD-1234")));
        assert!(!check(&v, Value::from("DD-12x")));
    }

    #[test]
    fn test_invalid_regex_fails_initialization() {
        assert!(PatternValidator::from_descriptor(&pattern("(unclosed").build()).is_err());
    }

    #[test]
    fn test_not_blank_sees_null() {
        let mut registry = ValidatorRegistry::new();
        register(&mut registry);
        let def = registry.get("NotBlank").unwrap();
        assert!(def.accepts_null());
        let v = def.create(&not_blank().build()).unwrap();
        assert!(!check(v.as_ref(), Value::from("   ")));
        assert!(!check(v.as_ref(), Value::Null));
        assert!(check(v.as_ref(), Value::from(" x ")));
    }
}
