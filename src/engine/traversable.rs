//! Traversable resolution: whether the engine may touch a property at all.

use crate::core::types::BeanRef;
use std::collections::HashMap;

/// Decides whether properties may be inspected and cascaded into.
///
/// `bean` is `None` when a detached value is validated.
pub trait TraversableResolver: Send + Sync {
    /// Whether the property value may be read.
    fn is_reachable(&self, bean: Option<&BeanRef>, property: &str) -> bool;

    /// Whether the property value may be cascaded into.
    fn is_cascadable(&self, bean: Option<&BeanRef>, property: &str) -> bool;
}

/// Allows everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysTraversable;

impl TraversableResolver for AlwaysTraversable {
    fn is_reachable(&self, _: Option<&BeanRef>, _: &str) -> bool {
        true
    }

    fn is_cascadable(&self, _: Option<&BeanRef>, _: &str) -> bool {
        true
    }
}

/// Memoizes a resolver for the duration of one validation call.
pub(crate) struct CachingTraversableResolver<'a> {
    delegate: &'a dyn TraversableResolver,
    answers: HashMap<(Option<BeanRef>, String), bool>,
}

impl<'a> CachingTraversableResolver<'a> {
    pub(crate) fn new(delegate: &'a dyn TraversableResolver) -> Self {
        Self {
            delegate,
            answers: HashMap::new(),
        }
    }

    /// Whether the property is both reachable and cascadable.
    pub(crate) fn is_traversable(&mut self, bean: Option<&BeanRef>, property: &str) -> bool {
        let key = (bean.cloned(), property.to_string());
        if let Some(answer) = self.answers.get(&key) {
            return *answer;
        }
        let answer = self.delegate.is_reachable(bean, property)
            && self.delegate.is_cascadable(bean, property);
        if !answer {
            log::trace!("Property '{}' is not traversable", property);
        }
        self.answers.insert(key, answer);
        answer
    }
}
