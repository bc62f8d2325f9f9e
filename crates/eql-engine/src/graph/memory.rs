//! Reference in-memory graph store.
//!
//! Backs the test suite and embedders that want to run queries without a
//! persistent store. Nodes and edges iterate in insertion order, which
//! makes traversal output and therefore query results deterministic.

use crate::collections::IndexMap;
use crate::graph::EdgeData;
use crate::graph::Graph;
use crate::graph::GraphError;
use crate::graph::NodeData;
use crate::graph::TraversalSpec;

#[derive(Debug, Default)]
struct Partition {
    // kind -> key -> node
    nodes: IndexMap<String, IndexMap<String, NodeData>>,
    edges: Vec<EdgeData>,
}

/// An in-memory [`Graph`] implementation.
#[derive(Debug, Default)]
pub struct MemoryGraph {
    partitions: IndexMap<String, Partition>,
}

impl MemoryGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a node; a node with the same kind and key is replaced.
    pub fn store_node(&mut self, partition: &str, node: NodeData) {
        let part = self.partitions.entry(partition.to_string()).or_default();
        part.nodes
            .entry(node.kind().to_string())
            .or_default()
            .insert(node.key().to_string(), node);
    }

    /// Store an edge between two already known endpoints.
    pub fn store_edge(&mut self, partition: &str, edge: EdgeData) {
        let part = self.partitions.entry(partition.to_string()).or_default();
        part.edges.push(edge);
    }

    fn partition(&self, partition: &str) -> Option<&Partition> {
        self.partitions.get(partition)
    }
}

impl Graph for MemoryGraph {
    fn node_key_iterator(
        &self,
        partition: &str,
        kind: &str,
    ) -> Result<Option<Box<dyn Iterator<Item = String> + '_>>, GraphError> {
        let Some(keys) = self
            .partition(partition)
            .and_then(|part| part.nodes.get(kind))
        else {
            return Ok(None);
        };
        Ok(Some(Box::new(keys.keys().cloned())))
    }

    fn traverse_multi(
        &self,
        partition: &str,
        key: &str,
        kind: &str,
        spec: &str,
        with_data: bool,
    ) -> Result<(Vec<NodeData>, Vec<EdgeData>), GraphError> {
        let spec = TraversalSpec::parse(spec)
            .ok_or_else(|| GraphError::new(format!("Invalid traversal spec ({spec})")))?;

        let mut nodes = Vec::new();
        let mut edges = Vec::new();
        let Some(part) = self.partition(partition) else {
            return Ok((nodes, edges));
        };

        for edge in &part.edges {
            for (this_end, other_end) in [
                (edge.end1(), edge.end2()),
                (edge.end2(), edge.end1()),
            ] {
                if this_end.key != key || this_end.kind != kind {
                    continue;
                }
                if !spec.matches(
                    &this_end.role,
                    edge.kind(),
                    &other_end.role,
                    &other_end.kind,
                ) {
                    continue;
                }
                let target = part
                    .nodes
                    .get(&other_end.kind)
                    .and_then(|keys| keys.get(&other_end.key));
                let node = match (with_data, target) {
                    (true, Some(node)) => node.clone(),
                    _ => NodeData::new(other_end.key.clone(), other_end.kind.clone()),
                };
                nodes.push(node);
                edges.push(if with_data {
                    edge.clone()
                } else {
                    edge.clone().restricted_to(&[])
                });
            }
        }

        Ok((nodes, edges))
    }

    fn fetch_node_part(
        &self,
        partition: &str,
        key: &str,
        kind: &str,
        attrs: &[String],
    ) -> Result<Option<NodeData>, GraphError> {
        let node = self
            .partition(partition)
            .and_then(|part| part.nodes.get(kind))
            .and_then(|keys| keys.get(key));
        Ok(node.map(|node| node.restricted_to(attrs)))
    }

    fn fetch_edge_part(
        &self,
        partition: &str,
        key: &str,
        kind: &str,
        attrs: &[String],
    ) -> Result<Option<EdgeData>, GraphError> {
        let edge = self
            .partition(partition)
            .and_then(|part| {
                part.edges
                    .iter()
                    .find(|edge| edge.key() == key && edge.kind() == kind)
            });
        Ok(edge.map(|edge| edge.restricted_to(attrs)))
    }

    fn node_kinds(&self) -> Vec<String> {
        let mut kinds = Vec::new();
        for part in self.partitions.values() {
            for kind in part.nodes.keys() {
                if !kinds.contains(kind) {
                    kinds.push(kind.clone());
                }
            }
        }
        kinds
    }

    fn node_attributes(&self, kind: &str) -> Result<Vec<String>, GraphError> {
        let mut attrs = vec!["key".to_string(), "kind".to_string()];
        for part in self.partitions.values() {
            if let Some(nodes) = part.nodes.get(kind) {
                for node in nodes.values() {
                    for name in node.attrs().keys() {
                        if !attrs.contains(name) {
                            attrs.push(name.clone());
                        }
                    }
                }
            }
        }
        Ok(attrs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::EndPoint;
    use crate::Value;

    fn graph() -> MemoryGraph {
        let mut g = MemoryGraph::new();
        g.store_node(
            "main",
            NodeData::new("a1", "Author").with_attr("name", "Mike"),
        );
        g.store_node(
            "main",
            NodeData::new("s1", "Song")
                .with_attr("name", "Aria1")
                .with_attr("ranking", 8i64),
        );
        g.store_edge(
            "main",
            EdgeData::new(
                "w1",
                "Wrote",
                EndPoint::new("a1", "Author", "author"),
                EndPoint::new("s1", "Song", "song"),
            ),
        );
        g
    }

    #[test]
    fn key_iteration_signals_unknown_kinds() {
        let g = graph();
        let keys: Vec<String> = g
            .node_key_iterator("main", "Author")
            .unwrap()
            .expect("Author is known")
            .collect();
        assert_eq!(keys, ["a1"]);
        assert!(g.node_key_iterator("main", "Movie").unwrap().is_none());
        assert!(g.node_key_iterator("other", "Author").unwrap().is_none());
    }

    #[test]
    fn traversal_matches_spec_components() {
        let g = graph();
        let (nodes, edges) = g
            .traverse_multi("main", "a1", "Author", ":::Song", false)
            .unwrap();
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].key(), "s1");
        // shallow placeholders carry no attributes
        assert_eq!(nodes[0].attr("name"), None);
        assert_eq!(edges[0].attr("end2role"), Some(Value::from("song")));

        let (nodes, _) = g
            .traverse_multi("main", "a1", "Author", "author:Wrote:song:Song", true)
            .unwrap();
        assert_eq!(nodes[0].attr("name"), Some(Value::from("Aria1")));

        let (nodes, _) = g
            .traverse_multi("main", "a1", "Author", "song:::", false)
            .unwrap();
        assert!(nodes.is_empty());
    }

    #[test]
    fn traversal_works_from_either_end() {
        let g = graph();
        let (nodes, _) = g
            .traverse_multi("main", "s1", "Song", ":::Author", false)
            .unwrap();
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].key(), "a1");
    }

    #[test]
    fn partial_fetch_restricts_attributes() {
        let mut g = graph();
        g.store_node(
            "main",
            NodeData::new("a1", "Author")
                .with_attr("name", "Mike")
                .with_attr("age", 42i64),
        );
        let node = g
            .fetch_node_part("main", "a1", "Author", &["name".to_string()])
            .unwrap()
            .expect("node exists");
        assert_eq!(node.attr("name"), Some(Value::from("Mike")));
        assert_eq!(node.attr("age"), None);
        // key and kind stay reachable
        assert_eq!(node.attr("key"), Some(Value::from("a1")));
    }

    #[test]
    fn bad_spec_is_a_store_error() {
        let g = graph();
        let err = g
            .traverse_multi("main", "a1", "Author", ":Song", false)
            .unwrap_err();
        assert_eq!(err.to_string(), "Invalid traversal spec (:Song)");
    }
}
