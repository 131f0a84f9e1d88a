//! Constraint validators: the validator contract, the registry of available
//! implementations, their resolution and caching, and the evaluation of
//! (possibly composed) constraints.

pub mod builtin;
pub mod evaluator;
pub mod manager;
pub mod registry;
pub mod validator;

pub use evaluator::{ConstraintEvaluator, EvaluationResult, PendingViolation};
pub use manager::{CacheStats, ConstraintValidatorManager, ValidatorKey, DEFAULT_CACHE_CAPACITY};
pub use registry::ValidatorRegistry;
pub use validator::{
    ClockProvider, ConstraintValidator, ConstraintValidatorContext, CustomViolation,
    SystemClock, ValidatorDefinition,
};
