//! Built-in constraints.
//!
//! Each constraint comes as a descriptor constructor returning a
//! [`ConstraintDescriptorBuilder`](crate::metadata::ConstraintDescriptorBuilder)
//! (so groups, payload and message can still be set) plus the validator
//! definitions able to check it.

mod boolean;
mod null;
mod numeric;
mod size;
mod text;

use crate::constraints::registry::ValidatorRegistry;

/// Register all built-in validators.
pub fn register_all(registry: &mut ValidatorRegistry) {
    null::register(registry);
    boolean::register(registry);
    numeric::register(registry);
    size::register(registry);
    text::register(registry);
}

pub use boolean::{assert_false, assert_true};
pub use null::{not_null, null};
pub use numeric::{max, min, positive, positive_or_zero};
pub use size::{not_empty, size};
pub use text::{not_blank, pattern};
