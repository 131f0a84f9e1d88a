//! Validation groups, group sequences and the resolution of requested groups
//! into an ordered list of units to evaluate.

pub mod group;
pub mod order;

pub use group::{Group, GroupCatalog};
pub use order::{GroupUnit, ValidationOrder, ValidationOrderGenerator};
