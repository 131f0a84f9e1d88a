//! Message interpolation contract.

use crate::core::path::Path;
use crate::core::types::Value;
use crate::metadata::ConstraintDescriptor;

/// Everything an interpolator may use to render a message.
#[derive(Debug, Clone, Copy)]
pub struct MessageContext<'a> {
    /// Raw template
    pub template: &'a str,
    /// The failed constraint
    pub descriptor: &'a ConstraintDescriptor,
    /// The value that failed
    pub invalid_value: &'a Value,
    /// Type of the validated root
    pub root_type: &'a str,
    /// Path to the invalid value
    pub path: &'a Path,
}

/// Renders violation messages. Called once per recorded violation.
pub trait MessageInterpolator: Send + Sync {
    /// Render the message for `context`.
    fn interpolate(&self, context: &MessageContext<'_>) -> String;
}

/// Returns templates unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct VerbatimInterpolator;

impl MessageInterpolator for VerbatimInterpolator {
    fn interpolate(&self, context: &MessageContext<'_>) -> String {
        context.template.to_string()
    }
}

impl<F> MessageInterpolator for F
where
    F: Fn(&MessageContext<'_>) -> String + Send + Sync,
{
    fn interpolate(&self, context: &MessageContext<'_>) -> String {
        self(context)
    }
}
