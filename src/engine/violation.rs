//! Constraint violations.

use crate::core::path::Path;
use crate::core::types::{BeanRef, Value};
use crate::metadata::ConstraintDescriptor;
use serde::Serialize;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// One failed constraint occurrence.
///
/// Two violations are equal when they share path, constraint occurrence,
/// invalid value, root bean and message template.
#[derive(Debug, Clone, Serialize)]
pub struct ConstraintViolation {
    pub(crate) message: String,
    pub(crate) message_template: String,
    pub(crate) root_bean: Option<BeanRef>,
    pub(crate) root_type: String,
    pub(crate) leaf_bean: Option<BeanRef>,
    pub(crate) invalid_value: Value,
    pub(crate) path: Path,
    pub(crate) descriptor: Arc<ConstraintDescriptor>,
    pub(crate) executable: Option<String>,
    pub(crate) parameters: Option<Vec<Value>>,
    pub(crate) return_value: Option<Value>,
}

impl ConstraintViolation {
    /// The interpolated message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The raw message template.
    pub fn message_template(&self) -> &str {
        &self.message_template
    }

    /// The validated root bean; `None` for detached values and constructor parameters.
    pub fn root_bean(&self) -> Option<&BeanRef> {
        self.root_bean.as_ref()
    }

    /// Type of the validated root.
    pub fn root_type(&self) -> &str {
        &self.root_type
    }

    /// The bean holding the invalid value, if any.
    pub fn leaf_bean(&self) -> Option<&BeanRef> {
        self.leaf_bean.as_ref()
    }

    /// The value that failed.
    pub fn invalid_value(&self) -> &Value {
        &self.invalid_value
    }

    /// Path from the root to the invalid value.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The failed constraint.
    pub fn descriptor(&self) -> &Arc<ConstraintDescriptor> {
        &self.descriptor
    }

    /// Logical type of the failed constraint.
    pub fn constraint_type(&self) -> &str {
        self.descriptor.constraint_type()
    }

    /// Name of the validated method or constructor.
    pub fn executable(&self) -> Option<&str> {
        self.executable.as_deref()
    }

    /// Arguments of a parameter validation.
    pub fn parameters(&self) -> Option<&[Value]> {
        self.parameters.as_deref()
    }

    /// Return value of a return value validation.
    pub fn return_value(&self) -> Option<&Value> {
        self.return_value.as_ref()
    }
}

impl PartialEq for ConstraintViolation {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path
            && self.descriptor.id() == other.descriptor.id()
            && self.invalid_value == other.invalid_value
            && self.root_bean == other.root_bean
            && self.message_template == other.message_template
    }
}

impl Eq for ConstraintViolation {}

impl Hash for ConstraintViolation {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.path.hash(state);
        self.descriptor.id().hash(state);
        self.invalid_value.hash(state);
        self.root_bean.hash(state);
        self.message_template.hash(state);
    }
}

impl fmt::Display for ConstraintViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "{}: {}", self.root_type, self.message)
        } else {
            write!(f, "{}.{}: {}", self.root_type, self.path, self.message)
        }
    }
}
