//! Null checks.

use crate::constraints::registry::ValidatorRegistry;
use crate::constraints::validator::ValidatorDefinition;
use crate::core::types::ValueType;
use crate::metadata::{ConstraintDescriptor, ConstraintDescriptorBuilder};

/// Register null-check validators.
pub fn register(registry: &mut ValidatorRegistry) {
    registry.register(
        ValidatorDefinition::from_fn("NotNull", ValueType::Any, |v| !v.is_null()).handles_null(),
    );
    registry.register(
        ValidatorDefinition::from_fn("Null", ValueType::Any, |v| v.is_null()).handles_null(),
    );
}

/// The value must not be null.
pub fn not_null() -> ConstraintDescriptorBuilder {
    ConstraintDescriptor::builder("NotNull").validator("NotNull")
}

/// The value must be null.
pub fn null() -> ConstraintDescriptorBuilder {
    ConstraintDescriptor::builder("Null").validator("Null")
}
