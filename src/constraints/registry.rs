//! Registry of available constraint validator implementations.

use crate::constraints::validator::ValidatorDefinition;
use crate::core::types::ValueType;
use indexmap::IndexMap;

/// Registry for all available validator definitions.
///
/// The registry maps validator ids to definitions. Constraint descriptors name
/// the ids able to check them; resolution picks among those by value type.
#[derive(Debug, Clone, Default)]
pub struct ValidatorRegistry {
    /// Definitions indexed by their unique id.
    definitions: IndexMap<String, ValidatorDefinition>,
}

impl ValidatorRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            definitions: IndexMap::new(),
        }
    }

    /// Create a registry pre-populated with the built-in validators.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        crate::constraints::builtin::register_all(&mut registry);
        registry
    }

    /// Register a definition, replacing any previous one with the same id.
    pub fn register(&mut self, definition: ValidatorDefinition) {
        if self.definitions.contains_key(definition.id()) {
            log::warn!("Replacing validator definition '{}'", definition.id());
        }
        self.definitions.insert(definition.id().to_string(), definition);
    }

    /// Look up a definition.
    pub fn get(&self, id: &str) -> Option<&ValidatorDefinition> {
        self.definitions.get(id)
    }

    /// Check if a validator is registered.
    pub fn contains(&self, id: &str) -> bool {
        self.definitions.contains_key(id)
    }

    /// Get all registered validator ids.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.definitions.keys().map(|s| s.as_str())
    }

    /// Definitions accepting exactly the given target type.
    pub fn by_target(&self, target: &ValueType) -> Vec<&ValidatorDefinition> {
        self.definitions
            .values()
            .filter(|d| d.target() == target)
            .collect()
    }

    /// Number of registered definitions.
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_lookup() {
        let mut registry = ValidatorRegistry::new();
        registry.register(ValidatorDefinition::from_fn("Odd", ValueType::Integer, |v| {
            v.as_integer().map_or(false, |i| i % 2 != 0)
        }));
        assert!(registry.contains("Odd"));
        assert_eq!(registry.get("Odd").unwrap().target(), &ValueType::Integer);
        assert_eq!(registry.by_target(&ValueType::Integer).len(), 1);
        assert_eq!(registry.ids().collect::<Vec<_>>(), vec!["Odd"]);
    }

    #[test]
    fn test_builtins_registered() {
        let registry = ValidatorRegistry::with_builtins();
        assert!(registry.contains("NotNull"));
        assert!(registry.contains("Size.Text"));
        assert!(registry.contains("Pattern"));
        assert!(!registry.is_empty());
    }
}
