//! Boolean assertions.

use crate::constraints::registry::ValidatorRegistry;
use crate::constraints::validator::ValidatorDefinition;
use crate::core::types::ValueType;
use crate::metadata::{ConstraintDescriptor, ConstraintDescriptorBuilder};

/// Register boolean validators.
pub fn register(registry: &mut ValidatorRegistry) {
    registry.register(ValidatorDefinition::from_fn(
        "AssertTrue",
        ValueType::Boolean,
        |v| v.as_bool() == Some(true),
    ));
    registry.register(ValidatorDefinition::from_fn(
        "AssertFalse",
        ValueType::Boolean,
        |v| v.as_bool() == Some(false),
    ));
}

/// The value must be `true`.
pub fn assert_true() -> ConstraintDescriptorBuilder {
    ConstraintDescriptor::builder("AssertTrue").validator("AssertTrue")
}

/// The value must be `false`.
pub fn assert_false() -> ConstraintDescriptorBuilder {
    ConstraintDescriptor::builder("AssertFalse").validator("AssertFalse")
}
