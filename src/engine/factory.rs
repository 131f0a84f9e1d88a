//! Validator factory: owns metadata, groups and validator caches, and hands
//! out validators sharing them.

use crate::constraints::manager::{CacheStats, ConstraintValidatorManager};
use crate::constraints::registry::ValidatorRegistry;
use crate::constraints::validator::ValidatorDefinition;
use crate::core::error::{GroupError, ValidatorResult};
use crate::engine::options::ValidatorOptions;
use crate::engine::validator::{FactoryShared, Validator};
use crate::groups::{Group, GroupCatalog, ValidationOrderGenerator};
use crate::metadata::{BeanDeclaration, BeanMetaDataManager};
use std::fmt;
use std::sync::Arc;

/// Entry point for configuring validation.
///
/// ```rust,ignore
/// let factory = ValidatorFactory::builder()
///     .with_builtins()
///     .register_bean(
///         BeanDeclaration::new("Car").property(
///             PropertyDeclaration::new("licensePlate")
///                 .constraint(builtin::not_null().build())
///                 .constraint(builtin::size(2, 14).build()),
///         ),
///     )
///     .build()?;
/// let violations = factory.validator().validate(&car, &[])?;
/// ```
pub struct ValidatorFactory {
    shared: Arc<FactoryShared>,
    options: Arc<ValidatorOptions>,
}

impl fmt::Debug for ValidatorFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidatorFactory")
            .field("options", &self.options)
            .field("validators", &self.shared.validators.registry().len())
            .finish()
    }
}

impl ValidatorFactory {
    /// Start configuring a factory.
    pub fn builder() -> ValidatorFactoryBuilder {
        ValidatorFactoryBuilder::new()
    }

    /// A validator using the factory's options.
    pub fn validator(&self) -> Validator {
        Validator::new(Arc::clone(&self.shared), Arc::clone(&self.options))
    }

    /// A validator with its own options, sharing the factory's caches.
    ///
    /// The cache capacity of `options` is ignored; caches belong to the factory.
    pub fn validator_with(&self, options: ValidatorOptions) -> Validator {
        Validator::new(Arc::clone(&self.shared), Arc::new(options))
    }

    /// Statistics of the initialized-validator cache.
    pub fn validator_cache_stats(&self) -> CacheStats {
        self.shared.validators.stats()
    }

    /// Release every cached validator instance.
    pub fn clear_validator_cache(&self) {
        self.shared.validators.clear();
    }
}

/// Builder for [`ValidatorFactory`].
pub struct ValidatorFactoryBuilder {
    catalog: GroupCatalog,
    declarations: Vec<BeanDeclaration>,
    registry: ValidatorRegistry,
    options: ValidatorOptions,
    errors: Vec<GroupError>,
}

impl ValidatorFactoryBuilder {
    fn new() -> Self {
        Self {
            catalog: GroupCatalog::new(),
            declarations: Vec::new(),
            registry: ValidatorRegistry::new(),
            options: ValidatorOptions::default(),
            errors: Vec::new(),
        }
    }

    /// Register the built-in validators.
    pub fn with_builtins(mut self) -> Self {
        crate::constraints::builtin::register_all(&mut self.registry);
        self
    }

    /// Set the default options of handed-out validators.
    pub fn with_options(mut self, options: ValidatorOptions) -> Self {
        self.options = options;
        self
    }

    /// Enable/disable fail-fast.
    pub fn with_fail_fast(mut self, fail_fast: bool) -> Self {
        self.options.fail_fast = fail_fast;
        self
    }

    /// Add a type declaration. A later declaration of the same type replaces
    /// the earlier one.
    pub fn register_bean(mut self, declaration: BeanDeclaration) -> Self {
        self.declarations.push(declaration);
        self
    }

    /// Declare a plain group extending `extends`.
    pub fn group<I, G>(mut self, name: impl Into<Group>, extends: I) -> Self
    where
        I: IntoIterator<Item = G>,
        G: Into<Group>,
    {
        let result = self
            .catalog
            .define_group(name.into(), extends.into_iter().map(Into::into));
        if let Err(e) = result {
            self.errors.push(e);
        }
        self
    }

    /// Declare a group sequence.
    pub fn group_sequence<I, G>(mut self, name: impl Into<Group>, members: I) -> Self
    where
        I: IntoIterator<Item = G>,
        G: Into<Group>,
    {
        let result = self
            .catalog
            .define_sequence(name.into(), members.into_iter().map(Into::into));
        if let Err(e) = result {
            self.errors.push(e);
        }
        self
    }

    /// Register a validator implementation.
    pub fn register_validator(mut self, definition: ValidatorDefinition) -> Self {
        self.registry.register(definition);
        self
    }

    /// Finish the factory.
    ///
    /// Every group named by a declaration becomes known, and every group
    /// sequence is expanded once so cycles and unknown members surface here.
    pub fn build(mut self) -> ValidatorResult<ValidatorFactory> {
        if let Some(error) = self.errors.into_iter().next() {
            log::warn!("Rejecting group configuration: {}", error);
            return Err(error.into());
        }

        for declaration in &self.declarations {
            for group in declaration.referenced_groups() {
                self.catalog.ensure_known(&group);
            }
        }

        let orders = ValidationOrderGenerator::new(Arc::new(self.catalog));
        if let Err(error) = orders.check_all_sequences() {
            log::warn!("Rejecting group sequences: {}", error);
            return Err(error.into());
        }

        log::debug!(
            "Building validator factory: {} type(s), {} validator(s)",
            self.declarations.len(),
            self.registry.len()
        );
        let shared = FactoryShared {
            metadata: BeanMetaDataManager::new(self.declarations),
            orders,
            validators: ConstraintValidatorManager::new(
                Arc::new(self.registry),
                self.options.cache_capacity,
            ),
        };
        Ok(ValidatorFactory {
            shared: Arc::new(shared),
            options: Arc::new(self.options),
        })
    }
}

impl fmt::Debug for ValidatorFactoryBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidatorFactoryBuilder")
            .field("catalog", &self.catalog)
            .field("declarations", &self.declarations.len())
            .field("registry", &self.registry)
            .field("options", &self.options)
            .finish()
    }
}
