//! Metadata model.
//!
//! Raw per-type declarations go in; immutable, hierarchy-flattened
//! [`BeanMetaData`] comes out, built once per type and cached.

pub mod bean;
pub mod declaration;
pub mod descriptor;
pub mod extractor;
pub mod manager;

pub use bean::{
    BeanMetaData, CascadingMetaData, DefaultSequence, ExecutableMetaData, MetaConstraint,
    ParameterMetaData, PropertyMetaData,
};
pub use declaration::{
    BeanDeclaration, DefaultGroupSequenceProvider, ExecutableDeclaration, ExecutableKind,
    ParameterDeclaration, PropertyDeclaration,
};
pub use descriptor::{
    CompositionType, ConstraintDescriptor, ConstraintDescriptorBuilder, ConstraintId,
};
pub use extractor::{CustomExtractor, ValueExtractor};
pub use manager::BeanMetaDataManager;
