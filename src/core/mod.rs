//! Core types for the Beanguard validation engine.
//!
//! This module contains the foundational types everything else builds on:
//! - Value types (beans, containers, scalars) and the runtime type lattice
//! - Property paths, both live and materialized
//! - Error types

pub mod error;
pub mod path;
pub mod types;

// Re-export commonly used types
pub use error::{
    BoxError, ConstraintError, GroupError, MetadataError, PathError, ValidatorError,
    ValidatorResult,
};
pub use path::{ContainerSegment, Node, NodeKind, Path, TraversalPath};
pub use types::{Bean, BeanRef, TypeHierarchy, Value, ValueType};
