//! Value extractors: how child values are pulled out of container values.

use crate::core::path::ContainerSegment;
use crate::core::types::Value;
use std::fmt;
use std::sync::Arc;

/// User-supplied extraction logic for container values.
pub trait CustomExtractor: Send + Sync {
    /// Name used in debug output.
    fn name(&self) -> &str;

    /// Extract the children of `value`, or `None` if it is not a container this
    /// extractor understands.
    fn extract(&self, value: &Value) -> Option<Vec<(ContainerSegment, Value)>>;
}

/// Describes how a cascaded or container-constrained element yields children.
#[derive(Clone, Default)]
pub enum ValueExtractor {
    /// Lists by index, sets without index, map values by key
    #[default]
    Auto,
    /// Elements of lists and sets only
    Elements,
    /// Values of maps, keyed
    MapValues,
    /// Keys of maps
    MapKeys,
    /// Custom extraction
    Custom(Arc<dyn CustomExtractor>),
}

impl ValueExtractor {
    /// Children of `value` with their path segments.
    ///
    /// Returns `None` when the value is not a container for this extractor, in
    /// which case callers treat the value itself as the cascaded element.
    pub fn extract(&self, value: &Value) -> Option<Vec<(ContainerSegment, Value)>> {
        match (self, value) {
            (ValueExtractor::Custom(custom), _) => custom.extract(value),
            (ValueExtractor::Auto | ValueExtractor::Elements, Value::List(items)) => Some(
                items
                    .iter()
                    .enumerate()
                    .map(|(i, v)| (ContainerSegment::Index(i), v.clone()))
                    .collect(),
            ),
            (ValueExtractor::Auto | ValueExtractor::Elements, Value::Set(items)) => Some(
                items
                    .iter()
                    .map(|v| (ContainerSegment::Iterable, v.clone()))
                    .collect(),
            ),
            (ValueExtractor::Auto | ValueExtractor::MapValues, Value::Map(entries)) => Some(
                entries
                    .iter()
                    .map(|(k, v)| (ContainerSegment::Key(k.clone()), v.clone()))
                    .collect(),
            ),
            (ValueExtractor::MapKeys, Value::Map(entries)) => Some(
                entries
                    .iter()
                    .map(|(k, _)| (ContainerSegment::MapKey(k.clone()), k.clone()))
                    .collect(),
            ),
            _ => None,
        }
    }
}

impl fmt::Debug for ValueExtractor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueExtractor::Auto => f.write_str("Auto"),
            ValueExtractor::Elements => f.write_str("Elements"),
            ValueExtractor::MapValues => f.write_str("MapValues"),
            ValueExtractor::MapKeys => f.write_str("MapKeys"),
            ValueExtractor::Custom(custom) => write!(f, "Custom({})", custom.name()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auto_list_is_indexed() {
        let children = ValueExtractor::Auto
            .extract(&Value::list(["a", "b"]))
            .unwrap();
        assert_eq!(children[1], (ContainerSegment::Index(1), Value::from("b")));
    }

    #[test]
    fn test_auto_map_keeps_opaque_keys() {
        let children = ValueExtractor::Auto
            .extract(&Value::map([(42, "x")]))
            .unwrap();
        assert_eq!(
            children[0],
            (ContainerSegment::Key(Value::Integer(42)), Value::from("x"))
        );
    }

    #[test]
    fn test_map_keys_extraction() {
        let children = ValueExtractor::MapKeys
            .extract(&Value::map([("en", 1)]))
            .unwrap();
        assert_eq!(
            children[0],
            (ContainerSegment::MapKey(Value::from("en")), Value::from("en"))
        );
    }

    #[test]
    fn test_non_container_yields_none() {
        assert!(ValueExtractor::Auto.extract(&Value::Integer(1)).is_none());
        assert!(ValueExtractor::Elements.extract(&Value::map([(1, 2)])).is_none());
    }

    #[test]
    fn test_set_elements_have_no_index() {
        let children = ValueExtractor::Elements.extract(&Value::set([1])).unwrap();
        assert_eq!(children[0].0, ContainerSegment::Iterable);
    }
}
