//! Validation engine: the factory, validators and their entry points, the
//! per-call context and the violations they produce.

mod context;
pub mod factory;
pub mod interpolator;
pub mod options;
pub mod report;
pub mod traversable;
pub mod validator;
pub mod violation;


pub use factory::{ValidatorFactory, ValidatorFactoryBuilder};
pub use interpolator::{MessageContext, MessageInterpolator, VerbatimInterpolator};
pub use options::ValidatorOptions;
pub use report::{ValidationReport, ViolationEntry};
pub use traversable::{AlwaysTraversable, TraversableResolver};
pub use validator::Validator;
pub use violation::ConstraintViolation;
