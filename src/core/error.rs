//! Error types for Beanguard.
//!
//! Uses thiserror for structured errors with context. Errors are reserved for
//! configuration and programming mistakes; failed constraints are reported as
//! violations, never as errors. Every error names the group, type, property or
//! constraint that triggered it.

use serde::Serialize;
use thiserror::Error;

/// Boxed error raised by user-supplied validator code.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Top-level error type for Beanguard.
///
/// Any of these aborts the validation call in progress; no partial
/// violation set is returned.
#[derive(Error, Debug)]
pub enum ValidatorError {
    #[error("Group error: {0}")]
    Group(#[from] GroupError),

    #[error("Metadata error: {0}")]
    Metadata(#[from] MetadataError),

    #[error("Constraint error: {0}")]
    Constraint(#[from] ConstraintError),

    #[error("Path error: {0}")]
    Path(#[from] PathError),

    #[error("Cannot validate a {0} value: only beans can be validated")]
    NotABean(String),
}

/// Errors resolving validation groups and group sequences.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
pub enum GroupError {
    #[error("Group '{0}' is not defined")]
    UnknownGroup(String),

    #[error("Cyclic dependency in group sequence '{sequence}': {}", .chain.join(" -> "))]
    CyclicSequence { sequence: String, chain: Vec<String> },

    #[error("Group sequence '{sequence}' cannot be expanded: group '{group}' appears twice at a non-final position")]
    NotExpandable { sequence: String, group: String },

    #[error("Group sequence '{0}' has no members")]
    EmptySequence(String),

    #[error("'{0}' is already defined as a {1}")]
    ConflictingDefinition(String, &'static str),
}

/// Errors building or reading bean metadata.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
pub enum MetadataError {
    #[error("Invalid default group sequence for {type_name}: {reason}")]
    InvalidDefaultSequence { type_name: String, reason: String },

    #[error("{type_name} declares both a default group sequence and a group sequence provider")]
    SequenceAndProvider { type_name: String },

    #[error("{type_name}.{executable} overrides an inherited executable and may not add parameter constraints or cascades")]
    IllegalParameterOverride { type_name: String, executable: String },

    #[error("Return value of {executable} is marked for cascading more than once in the hierarchy of {type_name}")]
    ReturnValueCascadeRedeclared { type_name: String, executable: String },

    #[error("{type_name} has no executable named '{executable}'")]
    UnknownExecutable { type_name: String, executable: String },

    #[error("{executable} expects {expected} argument(s), got {actual}")]
    ParameterCountMismatch {
        executable: String,
        expected: usize,
        actual: usize,
    },
}

/// Errors resolving, initializing or running constraint validators.
#[derive(Error, Debug)]
pub enum ConstraintError {
    #[error("No validator for constraint {constraint} accepts a value of type {value_type}")]
    NoValidatorFound {
        constraint: String,
        value_type: String,
    },

    #[error("Ambiguous validators for constraint {constraint} and type {value_type}: {}", .candidates.join(", "))]
    AmbiguousValidators {
        constraint: String,
        value_type: String,
        candidates: Vec<String>,
    },

    #[error("Constraint {constraint} references unregistered validator '{validator}'")]
    UnknownValidator {
        constraint: String,
        validator: String,
    },

    #[error("Validator '{validator}' for constraint {constraint} failed to initialize: {source}")]
    InitializationFailed {
        constraint: String,
        validator: String,
        #[source]
        source: BoxError,
    },

    #[error("Unexpected failure in validator for constraint {constraint} at '{path}': {source}")]
    ValidatorFailure {
        constraint: String,
        path: String,
        #[source]
        source: BoxError,
    },

    #[error("Constraint {constraint} nests composing constraints deeper than {limit} levels")]
    CompositionTooDeep { constraint: String, limit: usize },

    #[error("Validator for constraint {constraint} at '{path}' disabled the default violation without adding one")]
    NoViolationReported { constraint: String, path: String },
}

/// Errors parsing or resolving property paths.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
pub enum PathError {
    #[error("Cannot parse property path '{path}': {reason}")]
    Parse { path: String, reason: String },

    #[error("{type_name} has no property named '{property}'")]
    UnknownProperty { type_name: String, property: String },

    #[error("Property '{property}' of {type_name} is not cascaded and cannot be navigated")]
    NotCascaded { type_name: String, property: String },

    #[error("Property '{property}' holds a container; path '{path}' must give an index or key")]
    IndexRequired { property: String, path: String },

    #[error("Property '{property}' of {type_name} has no declared bean type to navigate into")]
    UnresolvableType { type_name: String, property: String },
}

// ============================================================================
// Error Utilities
// ============================================================================

impl ValidatorError {
    /// Whether the error stems from validator code rather than configuration.
    pub fn is_validator_failure(&self) -> bool {
        matches!(
            self,
            ValidatorError::Constraint(ConstraintError::ValidatorFailure { .. })
        )
    }

    /// Whether the error is a configuration or metadata problem.
    pub fn is_configuration_error(&self) -> bool {
        !self.is_validator_failure()
    }
}

impl ConstraintError {
    /// Name of the constraint involved.
    pub fn constraint(&self) -> &str {
        match self {
            ConstraintError::NoValidatorFound { constraint, .. }
            | ConstraintError::AmbiguousValidators { constraint, .. }
            | ConstraintError::UnknownValidator { constraint, .. }
            | ConstraintError::InitializationFailed { constraint, .. }
            | ConstraintError::ValidatorFailure { constraint, .. }
            | ConstraintError::CompositionTooDeep { constraint, .. }
            | ConstraintError::NoViolationReported { constraint, .. } => constraint,
        }
    }
}

/// Result type alias for Beanguard operations.
pub type ValidatorResult<T> = Result<T, ValidatorError>;

/// Result type alias for group resolution.
pub type GroupResult<T> = Result<T, GroupError>;

/// Result type alias for metadata operations.
pub type MetadataResult<T> = Result<T, MetadataError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cyclic_sequence_message_lists_chain() {
        let err = GroupError::CyclicSequence {
            sequence: "A".into(),
            chain: vec!["A".into(), "B".into(), "A".into()],
        };
        assert_eq!(
            err.to_string(),
            "Cyclic dependency in group sequence 'A': A -> B -> A"
        );
    }

    #[test]
    fn test_validator_failure_is_not_configuration() {
        let err: ValidatorError = ConstraintError::ValidatorFailure {
            constraint: "Odd".into(),
            path: "count".into(),
            source: "boom".into(),
        }
        .into();
        assert!(err.is_validator_failure());
        assert!(!err.is_configuration_error());
        assert!(err.to_string().contains("'count'"));
    }

    #[test]
    fn test_group_error_converts() {
        let err: ValidatorError = GroupError::UnknownGroup("Nope".into()).into();
        assert!(err.is_configuration_error());
        assert_eq!(err.to_string(), "Group error: Group 'Nope' is not defined");
    }
}
