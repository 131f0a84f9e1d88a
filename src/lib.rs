//! # Beanguard - Constraint Validation for Object Graphs
//!
//! Beanguard checks declaratively constrained object graphs and reports every
//! violation with a precise property path.
//!
//! ## Features
//!
//! - **Declarative metadata**: Constraints on types, properties, container
//!   elements, method parameters and return values, flattened across type
//!   hierarchies
//! - **Groups and sequences**: Group inheritance, ordered group sequences that
//!   stop at the first failing step, and per-type default sequences
//! - **Composed constraints**: AND, OR and ALL_FALSE composition with optional
//!   single-violation reporting
//! - **Cascading**: Recursive validation through beans and containers, with
//!   cycle-safe traversal and group conversion
//! - **Caching**: Flattened metadata and initialized validators are built once
//!   per factory
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use beanguard::prelude::*;
//!
//! let factory = ValidatorFactory::builder()
//!     .with_builtins()
//!     .register_bean(
//!         BeanDeclaration::new("Car").property(
//!             PropertyDeclaration::new("licensePlate")
//!                 .constraint(builtin::not_null().build())
//!                 .constraint(builtin::size(2, 14).build()),
//!         ),
//!     )
//!     .build()?;
//!
//! let car = BeanRef::new("Car").with("licensePlate", Value::Null);
//! let violations = factory.validator().validate(&car.into(), &[])?;
//! assert_eq!(violations[0].path().to_string(), "licensePlate");
//! ```
//!
//! ## Architecture
//!
//! - [`core`]: Values, property paths and errors
//! - [`groups`]: Group catalog and validation order resolution
//! - [`metadata`]: Constraint declarations and flattened bean metadata
//! - [`constraints`]: Validator contract, registry, caching and evaluation
//! - [`engine`]: Factory, validator entry points and graph traversal
//!
//! ## Custom Constraints
//!
//! Register a [`ValidatorDefinition`](constraints::ValidatorDefinition) and
//! reference its id from a descriptor:
//!
//! ```rust,ignore
//! use beanguard::prelude::*;
//!
//! let even = ValidatorDefinition::from_fn("Even", ValueType::Integer, |v| {
//!     v.as_integer().map_or(true, |i| i % 2 == 0)
//! });
//! let factory = ValidatorFactory::builder()
//!     .register_validator(even)
//!     .register_bean(BeanDeclaration::new("Pair").property(
//!         PropertyDeclaration::new("size")
//!             .constraint(ConstraintDescriptor::builder("Even").validator("Even").build()),
//!     ))
//!     .build()?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod constraints;
pub mod core;
pub mod engine;
pub mod groups;
pub mod metadata;

/// Prelude module for convenient imports.
///
/// Import everything commonly needed with:
/// ```rust,ignore
/// use beanguard::prelude::*;
/// ```
pub mod prelude {
    // Core types
    pub use crate::core::path::{ContainerSegment, Node, NodeKind, Path};
    pub use crate::core::types::{BeanRef, Value, ValueType};

    // Errors
    pub use crate::core::error::{
        BoxError, ConstraintError, GroupError, MetadataError, PathError, ValidatorError,
        ValidatorResult,
    };

    // Groups
    pub use crate::groups::Group;

    // Metadata
    pub use crate::metadata::{
        BeanDeclaration, CompositionType, ConstraintDescriptor, CustomExtractor,
        DefaultGroupSequenceProvider, ExecutableDeclaration, ParameterDeclaration,
        PropertyDeclaration, ValueExtractor,
    };

    // Constraints
    pub use crate::constraints::builtin;
    pub use crate::constraints::{
        ClockProvider, ConstraintValidator, ConstraintValidatorContext, ValidatorDefinition,
    };

    // Engine
    pub use crate::engine::{
        ConstraintViolation, MessageContext, MessageInterpolator, TraversableResolver,
        ValidationReport, Validator, ValidatorFactory, ValidatorOptions,
    };
}

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name.
pub const NAME: &str = env!("CARGO_PKG_NAME");
