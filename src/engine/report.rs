//! Serializable summaries of validation results.

use crate::core::types::Value;
use crate::engine::violation::ConstraintViolation;
use serde::Serialize;

/// Flat view of one violation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViolationEntry {
    /// Property path, in string form
    pub path: String,
    /// Constraint type
    pub constraint: String,
    /// Interpolated message
    pub message: String,
    /// Value that failed
    pub invalid_value: Value,
}

/// Result of one validation call, ready to be logged or serialized.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationReport {
    /// Whether no violation was found.
    pub valid: bool,
    /// Type of the validated root.
    pub root_type: String,
    /// Violations in the order they were recorded.
    pub violations: Vec<ViolationEntry>,
}

impl ValidationReport {
    /// Build a report for a call on `root_type`.
    pub fn new(root_type: impl Into<String>, violations: &[ConstraintViolation]) -> Self {
        Self {
            valid: violations.is_empty(),
            root_type: root_type.into(),
            violations: violations
                .iter()
                .map(|v| ViolationEntry {
                    path: v.path().to_string(),
                    constraint: v.constraint_type().to_string(),
                    message: v.message().to_string(),
                    invalid_value: v.invalid_value().clone(),
                })
                .collect(),
        }
    }

    /// Get a human-readable summary.
    pub fn summary(&self) -> String {
        if self.valid {
            format!("✓ {} is valid", self.root_type)
        } else {
            format!(
                "✗ {} has {} constraint violation(s)",
                self.root_type,
                self.violations.len()
            )
        }
    }

    /// One line per violation.
    pub fn detailed(&self) -> Vec<String> {
        self.violations
            .iter()
            .enumerate()
            .map(|(i, v)| {
                let path = if v.path.is_empty() { "<bean>" } else { v.path.as_str() };
                format!("{}. {} ({}): {}", i + 1, path, v.constraint, v.message)
            })
            .collect()
    }

    /// Serialize to pretty JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
