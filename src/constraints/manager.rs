//! Constraint validator lifecycle: resolution of the most specific validator
//! and caching of initialized instances.

use crate::constraints::registry::ValidatorRegistry;
use crate::constraints::validator::{ConstraintValidator, ValidatorDefinition};
use crate::core::error::{ConstraintError, ValidatorResult};
use crate::core::types::{TypeHierarchy, Value};
use crate::metadata::{ConstraintDescriptor, ConstraintId};
use lru::LruCache;
use parking_lot::Mutex;
use std::num::NonZeroUsize;
use std::sync::Arc;

/// Default number of initialized validators kept.
pub const DEFAULT_CACHE_CAPACITY: usize = 512;

/// Cache key: one initialized instance per constraint occurrence and validator.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ValidatorKey {
    /// The constraint occurrence.
    pub constraint: ConstraintId,
    /// The validator definition id.
    pub validator: String,
}

/// Cache statistics.
#[derive(Debug, Clone, Copy, Default)]
pub struct CacheStats {
    /// Number of cache hits.
    pub hits: u64,
    /// Number of cache misses.
    pub misses: u64,
}

impl CacheStats {
    /// Calculate hit ratio.
    pub fn hit_ratio(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            return 0.0;
        }
        self.hits as f64 / total as f64
    }
}

/// Resolves and caches constraint validators.
///
/// Safe for concurrent get-or-create: instances are created outside the lock
/// and the first one published for a key wins.
pub struct ConstraintValidatorManager {
    registry: Arc<ValidatorRegistry>,
    cache: Mutex<LruCache<ValidatorKey, Arc<dyn ConstraintValidator>>>,
    stats: Mutex<CacheStats>,
}

impl ConstraintValidatorManager {
    /// Create a manager with the given cache capacity.
    pub fn new(registry: Arc<ValidatorRegistry>, capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            registry,
            cache: Mutex::new(LruCache::new(capacity)),
            stats: Mutex::new(CacheStats::default()),
        }
    }

    /// The registry validators are resolved from.
    pub fn registry(&self) -> &ValidatorRegistry {
        &self.registry
    }

    /// Pick the validator definition for `value`.
    ///
    /// Returns `None` when the descriptor declares no validator of its own, or
    /// when `value` is null and no candidate handles null (null is then valid).
    /// Among candidates accepting the value's type, the most specific target
    /// wins; several equally specific candidates are an error.
    pub fn resolve<'r>(
        &'r self,
        descriptor: &ConstraintDescriptor,
        value: &Value,
        types: &dyn TypeHierarchy,
    ) -> ValidatorResult<Option<&'r ValidatorDefinition>> {
        if descriptor.validators().is_empty() {
            return Ok(None);
        }

        let mut candidates = Vec::with_capacity(descriptor.validators().len());
        for id in descriptor.validators() {
            let definition =
                self.registry
                    .get(id)
                    .ok_or_else(|| ConstraintError::UnknownValidator {
                        constraint: descriptor.constraint_type().to_string(),
                        validator: id.clone(),
                    })?;
            candidates.push(definition);
        }

        let value_type = match value.value_type() {
            None => {
                candidates.retain(|d| d.accepts_null());
                if candidates.is_empty() {
                    return Ok(None);
                }
                "null".to_string()
            }
            Some(actual) => {
                let mut assignable = Vec::with_capacity(candidates.len());
                for candidate in candidates {
                    if candidate.target().is_assignable_from(&actual, types)? {
                        assignable.push(candidate);
                    }
                }
                candidates = assignable;
                actual.to_string()
            }
        };

        if candidates.is_empty() {
            return Err(ConstraintError::NoValidatorFound {
                constraint: descriptor.constraint_type().to_string(),
                value_type,
            }
            .into());
        }

        // Drop every candidate for which a strictly more specific one exists.
        let mut most_specific = Vec::with_capacity(candidates.len());
        for candidate in &candidates {
            let mut dominated = false;
            for other in &candidates {
                if other.target() != candidate.target()
                    && candidate.target().is_assignable_from(other.target(), types)?
                {
                    dominated = true;
                    break;
                }
            }
            if !dominated {
                most_specific.push(*candidate);
            }
        }

        match most_specific.as_slice() {
            [single] => Ok(Some(*single)),
            _ => Err(ConstraintError::AmbiguousValidators {
                constraint: descriptor.constraint_type().to_string(),
                value_type,
                candidates: most_specific.iter().map(|d| d.id().to_string()).collect(),
            }
            .into()),
        }
    }

    /// Get the initialized instance of `definition` for `descriptor`, creating it on first use.
    pub fn get_or_create(
        &self,
        descriptor: &ConstraintDescriptor,
        definition: &ValidatorDefinition,
    ) -> ValidatorResult<Arc<dyn ConstraintValidator>> {
        let key = ValidatorKey {
            constraint: descriptor.id(),
            validator: definition.id().to_string(),
        };

        if let Some(validator) = self.cache.lock().get(&key) {
            self.stats.lock().hits += 1;
            log::trace!("Validator cache hit for {} {}", key.validator, key.constraint);
            return Ok(Arc::clone(validator));
        }
        self.stats.lock().misses += 1;

        let created: Arc<dyn ConstraintValidator> = definition
            .create(descriptor)
            .map_err(|source| ConstraintError::InitializationFailed {
                constraint: descriptor.constraint_type().to_string(),
                validator: definition.id().to_string(),
                source,
            })?
            .into();

        let mut cache = self.cache.lock();
        if let Some(existing) = cache.get(&key) {
            return Ok(Arc::clone(existing));
        }
        cache.put(key, Arc::clone(&created));
        Ok(created)
    }

    /// Cache statistics.
    pub fn stats(&self) -> CacheStats {
        *self.stats.lock()
    }

    /// Number of cached instances.
    pub fn cached_count(&self) -> usize {
        self.cache.lock().len()
    }

    /// Release every cached instance.
    pub fn clear(&self) {
        self.cache.lock().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::{ValidatorError, ValidatorResult};
    use crate::core::types::ValueType;

    struct Hierarchy;

    impl TypeHierarchy for Hierarchy {
        fn is_subtype(&self, sub: &str, sup: &str) -> ValidatorResult<bool> {
            Ok(sub == sup || (sub == "Car" && (sup == "Vehicle" || sup == "Insured")))
        }
    }

    fn manager(definitions: Vec<ValidatorDefinition>) -> ConstraintValidatorManager {
        let mut registry = ValidatorRegistry::new();
        for d in definitions {
            registry.register(d);
        }
        ConstraintValidatorManager::new(Arc::new(registry), 16)
    }

    fn always(id: &str, target: ValueType) -> ValidatorDefinition {
        ValidatorDefinition::from_fn(id, target, |_| true)
    }

    #[test]
    fn test_most_specific_wins() {
        let m = manager(vec![
            always("Any", ValueType::Any),
            always("Number", ValueType::Number),
            always("Integer", ValueType::Integer),
        ]);
        let d = ConstraintDescriptor::builder("C")
            .validator("Any")
            .validator("Number")
            .validator("Integer")
            .build();
        let picked = m.resolve(&d, &Value::Integer(1), &Hierarchy).unwrap().unwrap();
        assert_eq!(picked.id(), "Integer");
        let picked = m.resolve(&d, &Value::Float(1.0), &Hierarchy).unwrap().unwrap();
        assert_eq!(picked.id(), "Number");
        let picked = m.resolve(&d, &Value::from("x"), &Hierarchy).unwrap().unwrap();
        assert_eq!(picked.id(), "Any");
    }

    #[test]
    fn test_unrelated_supertypes_are_ambiguous() {
        let m = manager(vec![
            always("Vehicle", ValueType::Bean("Vehicle".into())),
            always("Insured", ValueType::Bean("Insured".into())),
        ]);
        let d = ConstraintDescriptor::builder("C")
            .validator("Vehicle")
            .validator("Insured")
            .build();
        let car = Value::Bean(crate::core::types::BeanRef::new("Car"));
        let err = m.resolve(&d, &car, &Hierarchy).unwrap_err();
        assert!(matches!(
            err,
            ValidatorError::Constraint(ConstraintError::AmbiguousValidators { .. })
        ));
    }

    #[test]
    fn test_no_matching_validator() {
        let m = manager(vec![always("Text", ValueType::Text)]);
        let d = ConstraintDescriptor::builder("C").validator("Text").build();
        let err = m.resolve(&d, &Value::Integer(3), &Hierarchy).unwrap_err();
        assert!(matches!(
            err,
            ValidatorError::Constraint(ConstraintError::NoValidatorFound { .. })
        ));
    }

    #[test]
    fn test_null_short_circuits_unless_handled() {
        let m = manager(vec![
            always("Text", ValueType::Text),
            always("NullAware", ValueType::Any).handles_null(),
        ]);
        let plain = ConstraintDescriptor::builder("C").validator("Text").build();
        assert!(m.resolve(&plain, &Value::Null, &Hierarchy).unwrap().is_none());
        let aware = ConstraintDescriptor::builder("C").validator("NullAware").build();
        assert!(m.resolve(&aware, &Value::Null, &Hierarchy).unwrap().is_some());
    }

    #[test]
    fn test_unknown_validator_id() {
        let m = manager(vec![]);
        let d = ConstraintDescriptor::builder("C").validator("Missing").build();
        assert!(m.resolve(&d, &Value::Integer(1), &Hierarchy).is_err());
    }

    #[test]
    fn test_instances_are_cached_per_constraint() {
        let m = manager(vec![always("Any", ValueType::Any)]);
        let d1 = ConstraintDescriptor::builder("C").validator("Any").build();
        let d2 = ConstraintDescriptor::builder("C").validator("Any").build();
        let def = m.registry().get("Any").unwrap().clone();
        let a = m.get_or_create(&d1, &def).unwrap();
        let b = m.get_or_create(&d1, &def).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        m.get_or_create(&d2, &def).unwrap();
        assert_eq!(m.cached_count(), 2);
        assert_eq!(m.stats().hits, 1);
        assert_eq!(m.stats().misses, 2);
    }

    #[test]
    fn test_initialization_failure_reported() {
        let m = manager(vec![ValidatorDefinition::new("Broken", ValueType::Any, |_| {
            Err("bad attribute".into())
        })]);
        let d = ConstraintDescriptor::builder("C").validator("Broken").build();
        let def = m.registry().get("Broken").unwrap().clone();
        let err = m.get_or_create(&d, &def).err().unwrap();
        assert!(err.to_string().contains("bad attribute"));
    }
}
