//! Core value types that make up a validated object graph.
//!
//! The type system uses an enum-based approach:
//! - Closed set of types: constraint validators match on a finite set of value kinds
//! - Beans are shared handles so graphs may contain shared substructure and cycles
//! - Equality and hashing treat beans by reference identity, everything else by value

use crate::core::error::ValidatorResult;
use indexmap::IndexMap;
use parking_lot::RwLock;
use serde::ser::{SerializeSeq, Serializer};
use serde::Serialize;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// A value in an object graph.
///
/// Containers come in three shapes that matter for path construction:
/// indexed lists, unindexed sets, and keyed maps. Map keys may be any value.
#[derive(Debug, Clone)]
pub enum Value {
    /// Absence of a value
    Null,
    /// Boolean value
    Boolean(bool),
    /// 64-bit signed integer
    Integer(i64),
    /// 64-bit floating point number
    Float(f64),
    /// UTF-8 string
    Text(String),
    /// Ordered, indexed container
    List(Vec<Value>),
    /// Iterable container without indices
    Set(Vec<Value>),
    /// Keyed container, kept in insertion order
    Map(Vec<(Value, Value)>),
    /// Reference to a bean instance
    Bean(BeanRef),
}

/// Runtime type of a value, used to pick the most specific constraint validator.
///
/// The lattice is:
/// `Any > {Number > {Integer, Float}, Text, Boolean, Collection > {List, Set}, Map, Bean(_)}`.
/// Bean types relate to each other through their declared hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", content = "name")]
pub enum ValueType {
    /// Accepts any value
    Any,
    /// Integer or floating point numbers
    Number,
    /// Integers only
    Integer,
    /// Floating point numbers only
    Float,
    /// Strings
    Text,
    /// Booleans
    Boolean,
    /// Lists and sets
    Collection,
    /// Lists only
    List,
    /// Sets only
    Set,
    /// Maps
    Map,
    /// A named bean type
    Bean(String),
}

/// Answers subtype questions about bean types.
///
/// Implemented by the metadata manager, which knows every declared hierarchy.
pub trait TypeHierarchy {
    /// Whether `sub` is `sup` or one of its (transitive) subtypes.
    fn is_subtype(&self, sub: &str, sup: &str) -> ValidatorResult<bool>;
}

// ============================================================================
// Beans
// ============================================================================

/// A bean instance: a type name plus named property values.
///
/// Properties sit behind a lock so that graphs with cycles can be wired up
/// after the beans are created.
pub struct Bean {
    type_name: String,
    properties: RwLock<IndexMap<String, Value>>,
}

/// Shared handle to a [`Bean`].
///
/// Two handles are equal only when they point at the same instance.
#[derive(Clone)]
pub struct BeanRef(Arc<Bean>);

impl BeanRef {
    /// Create a new bean of the given type with no properties.
    pub fn new(type_name: impl Into<String>) -> Self {
        Self(Arc::new(Bean {
            type_name: type_name.into(),
            properties: RwLock::new(IndexMap::new()),
        }))
    }

    /// Builder-style property assignment.
    pub fn with(self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }

    /// Set a property value.
    pub fn set(&self, name: impl Into<String>, value: impl Into<Value>) {
        self.0.properties.write().insert(name.into(), value.into());
    }

    /// Get a property value. Missing properties read as [`Value::Null`].
    pub fn get(&self, name: &str) -> Value {
        self.0
            .properties
            .read()
            .get(name)
            .cloned()
            .unwrap_or(Value::Null)
    }

    /// Whether the property has been assigned.
    pub fn has_property(&self, name: &str) -> bool {
        self.0.properties.read().contains_key(name)
    }

    /// Names of all assigned properties, in assignment order.
    pub fn property_names(&self) -> Vec<String> {
        self.0.properties.read().keys().cloned().collect()
    }

    /// The bean's type name.
    pub fn type_name(&self) -> &str {
        &self.0.type_name
    }

    /// Whether both handles point at the same instance.
    pub fn ptr_eq(&self, other: &BeanRef) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Address of the instance, stable for its lifetime.
    pub fn identity(&self) -> usize {
        Arc::as_ptr(&self.0) as usize
    }
}

impl PartialEq for BeanRef {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for BeanRef {}

impl Hash for BeanRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.identity().hash(state);
    }
}

impl fmt::Debug for BeanRef {
    // Never descends into properties: graphs may be cyclic.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{:x}", self.type_name(), self.identity())
    }
}

impl Serialize for BeanRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.type_name())
    }
}

// ============================================================================
// Value Implementation
// ============================================================================

impl Value {
    /// Runtime type of this value, `None` for [`Value::Null`].
    pub fn value_type(&self) -> Option<ValueType> {
        match self {
            Value::Null => None,
            Value::Boolean(_) => Some(ValueType::Boolean),
            Value::Integer(_) => Some(ValueType::Integer),
            Value::Float(_) => Some(ValueType::Float),
            Value::Text(_) => Some(ValueType::Text),
            Value::List(_) => Some(ValueType::List),
            Value::Set(_) => Some(ValueType::Set),
            Value::Map(_) => Some(ValueType::Map),
            Value::Bean(bean) => Some(ValueType::Bean(bean.type_name().to_string())),
        }
    }

    /// Build a list from anything convertible to values.
    pub fn list<I, V>(items: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Value::List(items.into_iter().map(Into::into).collect())
    }

    /// Build a set from anything convertible to values.
    pub fn set<I, V>(items: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Value::Set(items.into_iter().map(Into::into).collect())
    }

    /// Build a map from key/value pairs.
    pub fn map<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<Value>,
        V: Into<Value>,
    {
        Value::Map(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Check if this value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Try to get this value as an integer.
    pub fn as_integer(&self) -> Option<i64> {
        if let Value::Integer(i) = self {
            Some(*i)
        } else {
            None
        }
    }

    /// Try to get this value as a float.
    /// Integers are automatically converted to floats.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Try to get this value as a string reference.
    pub fn as_text(&self) -> Option<&str> {
        if let Value::Text(s) = self {
            Some(s)
        } else {
            None
        }
    }

    /// Try to get this value as a boolean.
    pub fn as_bool(&self) -> Option<bool> {
        if let Value::Boolean(b) = self {
            Some(*b)
        } else {
            None
        }
    }

    /// Try to get this value as a bean handle.
    pub fn as_bean(&self) -> Option<&BeanRef> {
        if let Value::Bean(b) = self {
            Some(b)
        } else {
            None
        }
    }

    /// Number of elements for containers and characters for text.
    pub fn len(&self) -> Option<usize> {
        match self {
            Value::Text(s) => Some(s.chars().count()),
            Value::List(items) | Value::Set(items) => Some(items.len()),
            Value::Map(entries) => Some(entries.len()),
            _ => None,
        }
    }

    /// Whether this value is a container or text with no elements.
    pub fn is_empty(&self) -> bool {
        self.len() == Some(0)
    }
}

/// Hash a Value consistently with its equality.
fn hash_value<H: Hasher>(value: &Value, hasher: &mut H) {
    std::mem::discriminant(value).hash(hasher);

    match value {
        Value::Null => {}
        Value::Boolean(b) => b.hash(hasher),
        Value::Integer(i) => i.hash(hasher),
        Value::Float(f) => f.to_bits().hash(hasher),
        Value::Text(s) => s.hash(hasher),
        Value::List(items) | Value::Set(items) => {
            items.len().hash(hasher);
            for v in items {
                hash_value(v, hasher);
            }
        }
        Value::Map(entries) => {
            entries.len().hash(hasher);
            for (k, v) in entries {
                hash_value(k, hasher);
                hash_value(v, hasher);
            }
        }
        Value::Bean(bean) => bean.hash(hasher),
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a.to_bits() == b.to_bits(),
            (Value::Text(a), Value::Text(b)) => a == b,
            (Value::List(a), Value::List(b)) | (Value::Set(a), Value::Set(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            (Value::Bean(a), Value::Bean(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        hash_value(self, state);
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Boolean(b) => serializer.serialize_bool(*b),
            Value::Integer(i) => serializer.serialize_i64(*i),
            Value::Float(f) => serializer.serialize_f64(*f),
            Value::Text(s) => serializer.serialize_str(s),
            Value::List(items) | Value::Set(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            // Keys are arbitrary values, so entries go out as pairs.
            Value::Map(entries) => {
                let mut seq = serializer.serialize_seq(Some(entries.len()))?;
                for entry in entries {
                    seq.serialize_element(entry)?;
                }
                seq.end()
            }
            Value::Bean(bean) => bean.serialize(serializer),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Float(fl) => write!(f, "{}", fl),
            Value::Text(s) => write!(f, "{}", s),
            Value::List(items) => write!(f, "List[{}]", items.len()),
            Value::Set(items) => write!(f, "Set[{}]", items.len()),
            Value::Map(entries) => write!(f, "Map{{{} entries}}", entries.len()),
            Value::Bean(bean) => write!(f, "{}", bean.type_name()),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Integer(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<BeanRef> for Value {
    fn from(bean: BeanRef) -> Self {
        Value::Bean(bean)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

// ============================================================================
// ValueType Implementation
// ============================================================================

impl ValueType {
    /// Whether a value of type `other` can be handed to a validator targeting `self`.
    pub fn is_assignable_from(
        &self,
        other: &ValueType,
        types: &dyn TypeHierarchy,
    ) -> ValidatorResult<bool> {
        let assignable = match (self, other) {
            (ValueType::Any, _) => true,
            (ValueType::Number, ValueType::Integer | ValueType::Float | ValueType::Number) => true,
            (ValueType::Collection, ValueType::List | ValueType::Set | ValueType::Collection) => {
                true
            }
            (ValueType::Bean(sup), ValueType::Bean(sub)) => types.is_subtype(sub, sup)?,
            (a, b) => a == b,
        };
        Ok(assignable)
    }

    /// Human-readable name.
    pub fn display_name(&self) -> String {
        match self {
            ValueType::Any => "Any".to_string(),
            ValueType::Number => "Number".to_string(),
            ValueType::Integer => "Integer".to_string(),
            ValueType::Float => "Float".to_string(),
            ValueType::Text => "Text".to_string(),
            ValueType::Boolean => "Boolean".to_string(),
            ValueType::Collection => "Collection".to_string(),
            ValueType::List => "List".to_string(),
            ValueType::Set => "Set".to_string(),
            ValueType::Map => "Map".to_string(),
            ValueType::Bean(name) => name.clone(),
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FlatHierarchy;

    impl TypeHierarchy for FlatHierarchy {
        fn is_subtype(&self, sub: &str, sup: &str) -> ValidatorResult<bool> {
            Ok(sub == sup || (sub == "Car" && sup == "Vehicle"))
        }
    }

    #[test]
    fn test_value_type_inference() {
        assert_eq!(Value::Integer(42).value_type(), Some(ValueType::Integer));
        assert_eq!(Value::from("x").value_type(), Some(ValueType::Text));
        assert_eq!(Value::Null.value_type(), None);
        assert_eq!(
            Value::Bean(BeanRef::new("Car")).value_type(),
            Some(ValueType::Bean("Car".to_string()))
        );
    }

    #[test]
    fn test_value_type_assignability() {
        let h = FlatHierarchy;
        assert!(ValueType::Number
            .is_assignable_from(&ValueType::Integer, &h)
            .unwrap());
        assert!(ValueType::Collection
            .is_assignable_from(&ValueType::Set, &h)
            .unwrap());
        assert!(!ValueType::Integer
            .is_assignable_from(&ValueType::Number, &h)
            .unwrap());
        assert!(ValueType::Any.is_assignable_from(&ValueType::Map, &h).unwrap());
        assert!(ValueType::Bean("Vehicle".into())
            .is_assignable_from(&ValueType::Bean("Car".into()), &h)
            .unwrap());
        assert!(!ValueType::Bean("Car".into())
            .is_assignable_from(&ValueType::Bean("Vehicle".into()), &h)
            .unwrap());
    }

    #[test]
    fn test_bean_identity_equality() {
        let a = BeanRef::new("Car").with("plate", "AB-123");
        let b = BeanRef::new("Car").with("plate", "AB-123");
        assert_ne!(Value::Bean(a.clone()), Value::Bean(b));
        assert_eq!(Value::Bean(a.clone()), Value::Bean(a));
    }

    #[test]
    fn test_cyclic_bean_debug_terminates() {
        let a = BeanRef::new("A");
        let b = BeanRef::new("B").with("a", a.clone());
        a.set("b", b.clone());
        let rendered = format!("{:?}", Value::Bean(a));
        assert!(rendered.starts_with("Bean(A@"));
    }

    #[test]
    fn test_missing_property_reads_null() {
        let bean = BeanRef::new("Car");
        assert!(bean.get("plate").is_null());
        assert!(!bean.has_property("plate"));
    }

    #[test]
    fn test_float_equality_by_bits() {
        assert_eq!(Value::Float(f64::NAN), Value::Float(f64::NAN));
        assert_ne!(Value::Float(0.0), Value::Float(-0.0));
    }

    #[test]
    fn test_len_counts_chars() {
        assert_eq!(Value::from("héllo").len(), Some(5));
        assert_eq!(Value::list([1, 2, 3]).len(), Some(3));
        assert_eq!(Value::Integer(3).len(), None);
    }

    #[test]
    fn test_map_serializes_as_pairs() {
        let map = Value::map([(1, "one")]);
        assert_eq!(serde_json::to_string(&map).unwrap(), r#"[[1,"one"]]"#);
    }
}
