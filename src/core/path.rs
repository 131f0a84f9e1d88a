//! Property paths.
//!
//! A [`TraversalPath`] is the live path threaded through a traversal. It is a
//! persistent parent-linked list: appending a node returns a new path and never
//! changes the one it was built from, so sibling branches cannot observe each
//! other. A [`Path`] is the materialized, immutable snapshot stored on a
//! violation.
//!
//! String form follows the usual conventions:
//! `orders[3].deliveryAddress.addressline[1]`, `labels[en]`, `labels<K>[en]`
//! for map keys, `tags[]` for unindexed containers, `placeOrder.customer`,
//! `placeOrder.<cross-parameter>` and `placeOrder.<return value>`.

use crate::core::error::PathError;
use crate::core::types::Value;
use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Node name used for return values.
pub const RETURN_VALUE_NODE_NAME: &str = "<return value>";
/// Node name used for cross-parameter constraints.
pub const CROSS_PARAMETER_NODE_NAME: &str = "<cross-parameter>";
/// Marker rendered between a map property name and the key it was reached by.
const MAP_KEY_MARKER: &str = "<K>";

/// Kind of a path node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum NodeKind {
    /// A bean; has no name
    Bean,
    /// A bean property
    Property,
    /// A method
    Method,
    /// A constructor
    Constructor,
    /// A method or constructor parameter
    Parameter,
    /// All parameters of an executable at once
    CrossParameter,
    /// An executable's return value
    ReturnValue,
}

/// How a container child was reached from its container.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ContainerSegment {
    /// Position in an ordered container
    Index(usize),
    /// Key of a map entry whose value was extracted
    Key(Value),
    /// Key of a map entry, when the key itself was extracted
    MapKey(Value),
    /// Element of an unordered container
    Iterable,
}

/// One element of a path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Node {
    kind: NodeKind,
    name: Option<String>,
    container: Option<ContainerSegment>,
    parameter_index: Option<usize>,
    parameter_types: Vec<String>,
}

impl Node {
    fn with_kind(kind: NodeKind, name: Option<String>) -> Self {
        Self {
            kind,
            name,
            container: None,
            parameter_index: None,
            parameter_types: Vec::new(),
        }
    }

    /// A bean node.
    pub fn bean() -> Self {
        Self::with_kind(NodeKind::Bean, None)
    }

    /// A property node.
    pub fn property(name: impl Into<String>) -> Self {
        Self::with_kind(NodeKind::Property, Some(name.into()))
    }

    /// A method node with its parameter types.
    pub fn method(name: impl Into<String>, parameter_types: Vec<String>) -> Self {
        Self {
            parameter_types,
            ..Self::with_kind(NodeKind::Method, Some(name.into()))
        }
    }

    /// A constructor node with its parameter types.
    pub fn constructor(type_name: impl Into<String>, parameter_types: Vec<String>) -> Self {
        Self {
            parameter_types,
            ..Self::with_kind(NodeKind::Constructor, Some(type_name.into()))
        }
    }

    /// A parameter node.
    pub fn parameter(name: impl Into<String>, index: usize) -> Self {
        Self {
            parameter_index: Some(index),
            ..Self::with_kind(NodeKind::Parameter, Some(name.into()))
        }
    }

    /// A cross-parameter node.
    pub fn cross_parameter() -> Self {
        Self::with_kind(
            NodeKind::CrossParameter,
            Some(CROSS_PARAMETER_NODE_NAME.to_string()),
        )
    }

    /// A return value node.
    pub fn return_value() -> Self {
        Self::with_kind(NodeKind::ReturnValue, Some(RETURN_VALUE_NODE_NAME.to_string()))
    }

    /// This node, reached through a container segment.
    pub fn in_container(mut self, segment: ContainerSegment) -> Self {
        self.container = Some(segment);
        self
    }

    /// The node kind.
    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    /// The node name, `None` for bean nodes.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// How this node was reached through a container, if at all.
    pub fn container(&self) -> Option<&ContainerSegment> {
        self.container.as_ref()
    }

    /// Index within an ordered container.
    pub fn index(&self) -> Option<usize> {
        match self.container {
            Some(ContainerSegment::Index(i)) => Some(i),
            _ => None,
        }
    }

    /// Key within a map.
    pub fn key(&self) -> Option<&Value> {
        match &self.container {
            Some(ContainerSegment::Key(k)) | Some(ContainerSegment::MapKey(k)) => Some(k),
            _ => None,
        }
    }

    /// Whether the node was reached through any container.
    pub fn is_in_iterable(&self) -> bool {
        self.container.is_some()
    }

    /// Position of a parameter node.
    pub fn parameter_index(&self) -> Option<usize> {
        self.parameter_index
    }

    /// Parameter types of a method or constructor node.
    pub fn parameter_types(&self) -> &[String] {
        &self.parameter_types
    }

    /// Whether this node renders to nothing.
    fn is_silent(&self) -> bool {
        self.name.is_none() && self.container.is_none()
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(name) = &self.name {
            f.write_str(name)?;
        }
        match &self.container {
            None => Ok(()),
            Some(ContainerSegment::Index(i)) => write!(f, "[{}]", i),
            Some(ContainerSegment::Key(k)) => write!(f, "[{}]", k),
            Some(ContainerSegment::MapKey(k)) => write!(f, "{}[{}]", MAP_KEY_MARKER, k),
            Some(ContainerSegment::Iterable) => f.write_str("[]"),
        }
    }
}

// ============================================================================
// Materialized paths
// ============================================================================

/// An immutable path snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Path {
    nodes: Vec<Node>,
}

impl Path {
    /// The empty path, denoting a root bean.
    pub fn root() -> Self {
        Self::default()
    }

    /// Build a path from nodes.
    pub fn from_nodes(nodes: Vec<Node>) -> Self {
        Self { nodes }
    }

    /// Nodes from root to leaf.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Iterate over nodes from root to leaf.
    pub fn iter(&self) -> std::slice::Iter<'_, Node> {
        self.nodes.iter()
    }

    /// The last node, if any.
    pub fn leaf(&self) -> Option<&Node> {
        self.nodes.last()
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the path has no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for node in self.nodes.iter().filter(|n| !n.is_silent()) {
            if !first && node.name.is_some() {
                f.write_str(".")?;
            }
            write!(f, "{}", node)?;
            first = false;
        }
        Ok(())
    }
}

impl Serialize for Path {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl FromStr for Path {
    type Err = PathError;

    /// Parse a property path such as `orders[3].deliveryAddress.addressline[1]`.
    ///
    /// Bracket contents made only of digits become indices, anything else
    /// becomes a text key.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let error = |reason: &str| PathError::Parse {
            path: s.to_string(),
            reason: reason.to_string(),
        };
        if s.is_empty() {
            return Ok(Path::root());
        }

        let mut nodes = Vec::new();
        for token in split_top_level(s).map_err(|reason| error(reason))? {
            let (name_part, bracket) = match token.find('[') {
                Some(open) => {
                    if !token.ends_with(']') {
                        return Err(error("unterminated '['"));
                    }
                    (&token[..open], Some(&token[open + 1..token.len() - 1]))
                }
                None => (token, None),
            };

            let (name, map_key) = match name_part.strip_suffix(MAP_KEY_MARKER) {
                Some(stripped) if bracket.is_some() => (stripped, true),
                _ => (name_part, false),
            };
            if name.is_empty() {
                return Err(error("empty node name"));
            }

            let mut node = match name {
                RETURN_VALUE_NODE_NAME => Node::return_value(),
                CROSS_PARAMETER_NODE_NAME => Node::cross_parameter(),
                _ => Node::property(name),
            };
            if let Some(content) = bracket {
                let segment = if content.is_empty() {
                    ContainerSegment::Iterable
                } else if map_key {
                    ContainerSegment::MapKey(Value::Text(content.to_string()))
                } else if content.bytes().all(|b| b.is_ascii_digit()) {
                    let index = content.parse().map_err(|_| error("index out of range"))?;
                    ContainerSegment::Index(index)
                } else {
                    ContainerSegment::Key(Value::Text(content.to_string()))
                };
                node = node.in_container(segment);
            }
            nodes.push(node);
        }
        Ok(Path { nodes })
    }
}

/// Split on dots that are not inside brackets.
fn split_top_level(s: &str) -> Result<Vec<&str>, &'static str> {
    let mut tokens = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in s.char_indices() {
        match c {
            '[' => depth += 1,
            ']' => depth = depth.checked_sub(1).ok_or("unbalanced ']'")?,
            '.' if depth == 0 => {
                tokens.push(&s[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    if depth != 0 {
        return Err("unterminated '['");
    }
    tokens.push(&s[start..]);
    Ok(tokens)
}

// ============================================================================
// Live traversal paths
// ============================================================================

struct Link {
    node: Node,
    parent: Option<Arc<Link>>,
    depth: usize,
}

/// Persistent path used while traversing a graph.
///
/// Cloning and appending are O(1); materializing copies the nodes.
#[derive(Clone, Default)]
pub struct TraversalPath {
    head: Option<Arc<Link>>,
}

impl TraversalPath {
    /// The empty path.
    pub fn root() -> Self {
        Self::default()
    }

    /// A new path with `node` appended. `self` is left untouched.
    pub fn append(&self, node: Node) -> Self {
        let depth = self.len() + 1;
        Self {
            head: Some(Arc::new(Link {
                node,
                parent: self.head.clone(),
                depth,
            })),
        }
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.head.as_ref().map_or(0, |link| link.depth)
    }

    /// Whether the path has no nodes.
    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    /// The most recently appended node.
    pub fn leaf(&self) -> Option<&Node> {
        self.head.as_ref().map(|link| &link.node)
    }

    /// Snapshot the path.
    pub fn materialize(&self) -> Path {
        let mut nodes = Vec::with_capacity(self.len());
        let mut cursor = self.head.as_deref();
        while let Some(link) = cursor {
            nodes.push(link.node.clone());
            cursor = link.parent.as_deref();
        }
        nodes.reverse();
        Path { nodes }
    }
}

impl fmt::Display for TraversalPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.materialize())
    }
}

impl fmt::Debug for TraversalPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TraversalPath({})", self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_path_fidelity_literal() {
        let path = TraversalPath::root()
            .append(Node::property("orders").in_container(ContainerSegment::Index(3)))
            .append(Node::property("deliveryAddress"))
            .append(Node::property("addressline").in_container(ContainerSegment::Index(1)));
        let rendered = path.materialize().to_string();
        assert_eq!(rendered, "orders[3].deliveryAddress.addressline[1]");
        let parsed: Path = rendered.parse().unwrap();
        assert_eq!(parsed.to_string(), rendered);
        assert_eq!(parsed, path.materialize());
    }

    #[test]
    fn test_append_does_not_mutate_parent() {
        let parent = TraversalPath::root().append(Node::property("bs"));
        let left = parent.append(Node::property("b"));
        let right = parent.append(Node::property("c"));
        assert_eq!(parent.to_string(), "bs");
        assert_eq!(left.to_string(), "bs.b");
        assert_eq!(right.to_string(), "bs.c");
        assert_eq!(left.len(), 2);
    }

    #[test]
    fn test_bean_nodes_render_silently() {
        let path = TraversalPath::root()
            .append(Node::property("bs").in_container(ContainerSegment::Index(0)))
            .append(Node::bean());
        assert_eq!(path.to_string(), "bs[0]");
        assert_eq!(TraversalPath::root().append(Node::bean()).to_string(), "");
    }

    #[test]
    fn test_map_and_set_rendering() {
        let key = Node::property("labels").in_container(ContainerSegment::Key(Value::Integer(7)));
        let map_key =
            Node::property("labels").in_container(ContainerSegment::MapKey(Value::from("en")));
        let set = Node::property("tags").in_container(ContainerSegment::Iterable);
        assert_eq!(key.to_string(), "labels[7]");
        assert_eq!(map_key.to_string(), "labels<K>[en]");
        assert_eq!(set.to_string(), "tags[]");
    }

    #[test]
    fn test_executable_paths() {
        let method = TraversalPath::root().append(Node::method("placeOrder", vec!["Customer".into()]));
        assert_eq!(
            method.append(Node::parameter("customer", 0)).to_string(),
            "placeOrder.customer"
        );
        assert_eq!(
            method.append(Node::cross_parameter()).to_string(),
            "placeOrder.<cross-parameter>"
        );
        assert_eq!(
            method.append(Node::return_value()).to_string(),
            "placeOrder.<return value>"
        );
    }

    #[test]
    fn test_parse_special_nodes() {
        let path: Path = "placeOrder.<return value>".parse().unwrap();
        assert_eq!(path.nodes()[1].kind(), NodeKind::ReturnValue);
        let path: Path = "labels<K>[en].size".parse().unwrap();
        assert_eq!(
            path.nodes()[0].container(),
            Some(&ContainerSegment::MapKey(Value::from("en")))
        );
    }

    #[test]
    fn test_parse_errors() {
        assert!("a..b".parse::<Path>().is_err());
        assert!("a[1".parse::<Path>().is_err());
        assert!("a]".parse::<Path>().is_err());
        assert!("[1]".parse::<Path>().is_err());
    }

    #[test]
    fn test_key_containing_dot_survives() {
        let path: Path = "props[a.b].value".parse().unwrap();
        assert_eq!(path.len(), 2);
        assert_eq!(path.nodes()[0].key(), Some(&Value::from("a.b")));
        assert_eq!(path.to_string(), "props[a.b].value");
    }

    #[test]
    fn test_path_serializes_as_string() {
        let path: Path = "bs[0].b".parse().unwrap();
        assert_eq!(serde_json::to_string(&path).unwrap(), "\"bs[0].b\"");
    }

    fn segment_strategy() -> impl Strategy<Value = Option<ContainerSegment>> {
        prop_oneof![
            Just(None),
            Just(Some(ContainerSegment::Iterable)),
            (0usize..1000).prop_map(|i| Some(ContainerSegment::Index(i))),
            "[a-z][a-z0-9]{0,5}".prop_map(|k| Some(ContainerSegment::Key(Value::Text(k)))),
            "[a-z][a-z0-9]{0,5}".prop_map(|k| Some(ContainerSegment::MapKey(Value::Text(k)))),
        ]
    }

    fn node_strategy() -> impl Strategy<Value = Node> {
        ("[a-zA-Z][a-zA-Z0-9_]{0,8}", segment_strategy()).prop_map(|(name, segment)| {
            let node = Node::property(name);
            match segment {
                Some(segment) => node.in_container(segment),
                None => node,
            }
        })
    }

    proptest! {
        #[test]
        fn test_property_paths_round_trip(nodes in prop::collection::vec(node_strategy(), 1..6)) {
            let path = Path::from_nodes(nodes);
            let rendered = path.to_string();
            let parsed: Path = rendered.parse().unwrap();
            prop_assert_eq!(parsed, path);
        }
    }
}
