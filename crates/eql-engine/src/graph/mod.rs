//! Contracts towards the underlying graph store and the display schema.
//!
//! The engine consumes exactly these operations; any store that can iterate
//! keys of a kind, perform one traversal hop and fetch attribute slices can
//! back it. A reference in-memory implementation lives in [`memory`].

mod memory;

use crate::collections::IndexMap;
use crate::Value;
use std::fmt;

pub use memory::MemoryGraph;

/// The reserved kind of group nodes. Group membership is expressed through
/// edges between a group node and its members.
pub const GROUP_KIND: &str = "group";

/// An error reported by a graph store, propagated verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphError(String);

impl GraphError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

impl fmt::Display for GraphError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for GraphError {}

/// A node fetched from the store: key, kind and an attribute map.
///
/// `key` and `kind` are also reachable as the reserved attributes of the
/// same name.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NodeData {
    key: String,
    kind: String,
    attrs: IndexMap<String, Value>,
}

impl NodeData {
    pub fn new(key: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            kind: kind.into(),
            attrs: IndexMap::default(),
        }
    }

    /// Builder-style attribute setter.
    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attrs.insert(name.into(), value.into());
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn attr(&self, name: &str) -> Option<Value> {
        match name {
            "key" => Some(Value::Str(self.key.clone())),
            "kind" => Some(Value::Str(self.kind.clone())),
            _ => self.attrs.get(name).cloned(),
        }
    }

    pub fn attrs(&self) -> &IndexMap<String, Value> {
        &self.attrs
    }

    /// Copy of this node carrying only the requested attributes.
    pub(crate) fn restricted_to(&self, attrs: &[String]) -> NodeData {
        NodeData {
            key: self.key.clone(),
            kind: self.kind.clone(),
            attrs: self
                .attrs
                .iter()
                .filter(|(name, _)| attrs.iter().any(|a| a == *name))
                .map(|(name, value)| (name.clone(), value.clone()))
                .collect(),
        }
    }
}

/// One endpoint of an edge.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EndPoint {
    pub key: String,
    pub kind: String,
    pub role: String,
    pub cascading: bool,
}

impl EndPoint {
    pub fn new(key: impl Into<String>, kind: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            kind: kind.into(),
            role: role.into(),
            cascading: false,
        }
    }
}

/// An edge fetched from the store. The endpoint data is reachable through
/// the reserved attributes `end1key`, `end1kind`, `end1role`,
/// `end1cascading` and their `end2` counterparts.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EdgeData {
    key: String,
    kind: String,
    end1: EndPoint,
    end2: EndPoint,
    attrs: IndexMap<String, Value>,
}

impl EdgeData {
    pub fn new(
        key: impl Into<String>,
        kind: impl Into<String>,
        end1: EndPoint,
        end2: EndPoint,
    ) -> Self {
        Self {
            key: key.into(),
            kind: kind.into(),
            end1,
            end2,
            attrs: IndexMap::default(),
        }
    }

    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attrs.insert(name.into(), value.into());
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn end1(&self) -> &EndPoint {
        &self.end1
    }

    pub fn end2(&self) -> &EndPoint {
        &self.end2
    }

    pub fn attr(&self, name: &str) -> Option<Value> {
        match name {
            "key" => Some(Value::Str(self.key.clone())),
            "kind" => Some(Value::Str(self.kind.clone())),
            "end1key" => Some(Value::Str(self.end1.key.clone())),
            "end1kind" => Some(Value::Str(self.end1.kind.clone())),
            "end1role" => Some(Value::Str(self.end1.role.clone())),
            "end1cascading" => Some(Value::Bool(self.end1.cascading)),
            "end2key" => Some(Value::Str(self.end2.key.clone())),
            "end2kind" => Some(Value::Str(self.end2.kind.clone())),
            "end2role" => Some(Value::Str(self.end2.role.clone())),
            "end2cascading" => Some(Value::Bool(self.end2.cascading)),
            _ => self.attrs.get(name).cloned(),
        }
    }

    pub(crate) fn restricted_to(&self, attrs: &[String]) -> EdgeData {
        EdgeData {
            key: self.key.clone(),
            kind: self.kind.clone(),
            end1: self.end1.clone(),
            end2: self.end2.clone(),
            attrs: self
                .attrs
                .iter()
                .filter(|(name, _)| attrs.iter().any(|a| a == *name))
                .map(|(name, value)| (name.clone(), value.clone()))
                .collect(),
        }
    }
}

/// A parsed traversal spec: `<edgeRole>:<edgeKind>:<endRole>:<endKind>`,
/// any component empty to mean "any".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraversalSpec {
    pub edge_role: String,
    pub edge_kind: String,
    pub end_role: String,
    pub end_kind: String,
}

impl TraversalSpec {
    /// Parse a spec string; `None` when the colon count is wrong.
    pub fn parse(spec: &str) -> Option<TraversalSpec> {
        let parts: Vec<&str> = spec.split(':').collect();
        let [edge_role, edge_kind, end_role, end_kind] = parts.as_slice() else {
            return None;
        };
        Some(TraversalSpec {
            edge_role: edge_role.to_string(),
            edge_kind: edge_kind.to_string(),
            end_role: end_role.to_string(),
            end_kind: end_kind.to_string(),
        })
    }

    pub fn matches(&self, edge_role: &str, edge_kind: &str, end_role: &str, end_kind: &str) -> bool {
        fn component(pattern: &str, value: &str) -> bool {
            pattern.is_empty() || pattern == value
        }
        component(&self.edge_role, edge_role)
            && component(&self.edge_kind, edge_kind)
            && component(&self.end_role, end_role)
            && component(&self.end_kind, end_kind)
    }
}

/// The graph store contract.
///
/// Implementations must be safe for concurrent readers; the engine itself
/// issues all calls for one query from a single thread.
pub trait Graph {
    /// All keys of a kind within a partition. `None` signals an unknown
    /// kind.
    fn node_key_iterator(
        &self,
        partition: &str,
        kind: &str,
    ) -> Result<Option<Box<dyn Iterator<Item = String> + '_>>, GraphError>;

    /// One traversal hop from the given node, returning matching
    /// `(node, edge)` pairs in store order. With `with_data` unset the
    /// returned values are shallow placeholders carrying structure but no
    /// attributes.
    fn traverse_multi(
        &self,
        partition: &str,
        key: &str,
        kind: &str,
        spec: &str,
        with_data: bool,
    ) -> Result<(Vec<NodeData>, Vec<EdgeData>), GraphError>;

    /// Targeted partial fetch of a node: only the requested attributes are
    /// populated. `None` when the node does not exist.
    fn fetch_node_part(
        &self,
        partition: &str,
        key: &str,
        kind: &str,
        attrs: &[String],
    ) -> Result<Option<NodeData>, GraphError>;

    /// Targeted partial fetch of an edge.
    fn fetch_edge_part(
        &self,
        partition: &str,
        key: &str,
        kind: &str,
        attrs: &[String],
    ) -> Result<Option<EdgeData>, GraphError>;

    /// All node kinds the store has ever seen.
    fn node_kinds(&self) -> Vec<String>;

    /// All attribute names recorded for a node kind.
    fn node_attributes(&self, kind: &str) -> Result<Vec<String>, GraphError>;
}

/// The display/schema oracle: names columns and enumerates summary
/// attributes for default projections.
pub trait NodeInfo {
    /// The attributes shown for a kind when a query has no show clause.
    fn summary_attributes(&self, kind: &str) -> Vec<String>;

    /// Human-readable column label for an attribute of a kind.
    fn attribute_display_string(&self, kind: &str, attr: &str) -> String;

    /// Whether a bare identifier in a where clause names an attribute.
    fn is_valid_attr(&self, attr: &str) -> bool;
}

/// [`NodeInfo`] derived from the store itself: summary attributes are `key`
/// plus the kind's attributes in alphabetical order, labels title-case the
/// attribute (with `key`/`kind` prefixed by the kind name).
pub struct DefaultNodeInfo<'a> {
    graph: &'a dyn Graph,
}

impl<'a> DefaultNodeInfo<'a> {
    pub fn new(graph: &'a dyn Graph) -> Self {
        Self { graph }
    }
}

impl NodeInfo for DefaultNodeInfo<'_> {
    fn summary_attributes(&self, kind: &str) -> Vec<String> {
        let mut attrs: Vec<String> = self
            .graph
            .node_attributes(kind)
            .unwrap_or_default()
            .into_iter()
            .filter(|attr| attr != "key" && attr != "kind")
            .collect();
        attrs.sort();
        attrs.insert(0, "key".to_string());
        attrs
    }

    fn attribute_display_string(&self, kind: &str, attr: &str) -> String {
        match attr {
            "key" if !kind.is_empty() => format!("{kind} Key"),
            "kind" if !kind.is_empty() => format!("{kind} Kind"),
            _ => {
                let mut chars = attr.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect(),
                    None => String::new(),
                }
            }
        }
    }

    fn is_valid_attr(&self, attr: &str) -> bool {
        if attr == "key" || attr == "kind" {
            return true;
        }
        self.graph.node_kinds().iter().any(|kind| {
            self.graph
                .node_attributes(kind)
                .unwrap_or_default()
                .iter()
                .any(|a| a == attr)
        })
    }
}
