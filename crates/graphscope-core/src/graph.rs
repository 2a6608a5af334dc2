//! PropertyGraph: the directed, multi-edge labeled graph every engine stage
//! reads and produces.
//!
//! Storage is a petgraph `StableGraph<Node, Edge>` plus two key indices:
//! node keys in insertion order (so iteration and exports are
//! deterministic) and edge keys for duplicate detection. Multi-edges and
//! self-loops are allowed; edge keys must be unique.
//!
//! Engine stages never mutate a graph they were given. They clone it or build
//! a new one through [`PropertyGraph::insert_node`] and
//! [`PropertyGraph::add_edge`].

use std::collections::HashMap;

use indexmap::IndexMap;
use petgraph::graph::{EdgeIndex, NodeIndex};
use petgraph::stable_graph::StableGraph;
use petgraph::visit::EdgeRef;
use petgraph::{Directed, Direction};
use serde::{Serialize, Serializer};

use crate::document::GraphDocument;
use crate::edge::{Edge, EdgeEntry};
use crate::error::GraphError;
use crate::id::{EdgeKey, NodeKey};
use crate::node::{Node, Properties};
use crate::types::{Model, RelType};

/// The property graph container.
#[derive(Debug, Clone, Default)]
pub struct PropertyGraph {
    graph: StableGraph<Node, Edge, Directed, u32>,
    /// Node key -> index, in insertion order.
    nodes: IndexMap<NodeKey, NodeIndex<u32>>,
    /// Edge key -> index.
    edges: HashMap<EdgeKey, EdgeIndex<u32>>,
    /// Graph-level attributes (e.g. `platform`, `corpora`).
    attributes: Properties,
}

/// An edge together with its resolved endpoint nodes.
#[derive(Debug, Clone, Copy)]
pub struct EdgeView<'g> {
    pub edge: &'g Edge,
    pub source: &'g Node,
    pub target: &'g Node,
}

impl PropertyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty graph carrying the given graph-level attributes.
    pub fn with_attributes(attributes: Properties) -> Self {
        PropertyGraph {
            attributes,
            ..Self::default()
        }
    }

    pub fn attributes(&self) -> &Properties {
        &self.attributes
    }

    // -----------------------------------------------------------------------
    // Mutation
    // -----------------------------------------------------------------------

    /// Inserts a node, or replaces the attributes of the node with the same
    /// key. Incident edges of a replaced node are kept. Returns the replaced
    /// node, if any.
    pub fn insert_node(&mut self, node: Node) -> Option<Node> {
        let existing = self.nodes.get(&node.key).copied();
        match existing {
            Some(idx) => Some(std::mem::replace(&mut self.graph[idx], node)),
            None => {
                let key = node.key.clone();
                let idx = self.graph.add_node(node);
                self.nodes.insert(key, idx);
                None
            }
        }
    }

    /// Adds an edge between two existing nodes.
    ///
    /// Fails with [`GraphError::UnknownEndpoint`] if either endpoint is
    /// missing and with [`GraphError::DuplicateEdge`] if the edge key is
    /// already taken. The graph is unchanged on failure.
    pub fn add_edge(
        &mut self,
        source: &NodeKey,
        target: &NodeKey,
        edge: Edge,
    ) -> Result<EdgeIndex<u32>, GraphError> {
        let from = self.endpoint(&edge.key, source)?;
        let to = self.endpoint(&edge.key, target)?;
        if self.edges.contains_key(&edge.key) {
            return Err(GraphError::DuplicateEdge {
                edge: edge.key,
                source_key: source.clone(),
                target_key: target.clone(),
            });
        }
        let key = edge.key.clone();
        let idx = self.graph.add_edge(from, to, edge);
        self.edges.insert(key, idx);
        Ok(idx)
    }

    fn endpoint(&self, edge: &EdgeKey, key: &NodeKey) -> Result<NodeIndex<u32>, GraphError> {
        self.nodes
            .get(key)
            .copied()
            .ok_or_else(|| GraphError::UnknownEndpoint {
                edge: edge.clone(),
                endpoint: key.clone(),
            })
    }

    /// Mutable access to a node's weight. Crate-private: only the normalizer
    /// and scope engine annotate nodes, and only on graphs they own.
    pub(crate) fn node_weight_mut(&mut self, idx: NodeIndex<u32>) -> Option<&mut Node> {
        self.graph.node_weight_mut(idx)
    }

    // -----------------------------------------------------------------------
    // Lookup
    // -----------------------------------------------------------------------

    pub fn index_of(&self, key: &str) -> Option<NodeIndex<u32>> {
        self.nodes.get(key).copied()
    }

    pub fn node(&self, key: &str) -> Option<&Node> {
        self.index_of(key).map(|idx| &self.graph[idx])
    }

    pub fn node_at(&self, idx: NodeIndex<u32>) -> Option<&Node> {
        self.graph.node_weight(idx)
    }

    pub fn contains_edge(&self, key: &str) -> bool {
        self.edges.contains_key(key)
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    // -----------------------------------------------------------------------
    // Iteration
    // -----------------------------------------------------------------------

    /// Node indices in insertion order.
    pub fn node_indices(&self) -> impl Iterator<Item = NodeIndex<u32>> + '_ {
        self.nodes.values().copied()
    }

    /// Nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> + '_ {
        self.nodes.values().map(move |&idx| &self.graph[idx])
    }

    /// Edges in insertion order, with their endpoints.
    pub fn edges(&self) -> impl Iterator<Item = EdgeView<'_>> + '_ {
        self.graph.edge_indices().filter_map(move |idx| {
            let (from, to) = self.graph.edge_endpoints(idx)?;
            Some(EdgeView {
                edge: &self.graph[idx],
                source: &self.graph[from],
                target: &self.graph[to],
            })
        })
    }

    /// Targets of the outgoing `rel` edges of `idx`.
    pub fn targets(
        &self,
        idx: NodeIndex<u32>,
        rel: RelType,
    ) -> impl Iterator<Item = NodeIndex<u32>> + '_ {
        self.graph
            .edges_directed(idx, Direction::Outgoing)
            .filter(move |e| *e.weight().rel() == rel)
            .map(|e| e.target())
    }

    /// Sources of the incoming `rel` edges of `idx`.
    pub fn sources(
        &self,
        idx: NodeIndex<u32>,
        rel: RelType,
    ) -> impl Iterator<Item = NodeIndex<u32>> + '_ {
        self.graph
            .edges_directed(idx, Direction::Incoming)
            .filter(move |e| *e.weight().rel() == rel)
            .map(|e| e.source())
    }

    /// Returns `true` if the node at `idx` has the given model.
    pub fn is_model(&self, idx: NodeIndex<u32>, model: Model) -> bool {
        self.node_at(idx).and_then(Node::model) == Some(model)
    }

    // -----------------------------------------------------------------------
    // Export
    // -----------------------------------------------------------------------

    /// Exports the graph as a JSON graph document (nodes then edges, both in
    /// insertion order).
    pub fn to_document(&self) -> GraphDocument {
        GraphDocument {
            attributes: self.attributes.clone(),
            nodes: self.nodes().cloned().collect(),
            edges: self
                .edges()
                .map(|view| EdgeEntry {
                    key: view.edge.key.clone(),
                    source: view.source.key.clone(),
                    target: view.target.key.clone(),
                    attributes: view.edge.attributes.clone(),
                })
                .collect(),
        }
    }
}

impl Serialize for PropertyGraph {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_document().serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Label;

    fn key(s: &str) -> NodeKey {
        NodeKey::from(s)
    }

    fn small_graph() -> PropertyGraph {
        let mut graph = PropertyGraph::new();
        graph.insert_node(Node::new("a1", [Label::Annotation]));
        graph.insert_node(Node::new("p1", [Label::Post]));
        graph.insert_node(Node::new("c1", [Label::Code]));
        graph
            .add_edge(&key("a1"), &key("p1"), Edge::new("e1", RelType::Annotates))
            .unwrap();
        graph
            .add_edge(&key("a1"), &key("c1"), Edge::new("e2", RelType::RefersTo))
            .unwrap();
        graph
    }

    #[test]
    fn basic_construction() {
        let graph = small_graph();
        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.edge_count(), 2);
        assert!(graph.contains_edge("e1"));
        assert_eq!(graph.node("p1").unwrap().model(), Some(Model::Post));
    }

    #[test]
    fn add_edge_with_unknown_endpoint_errors_and_leaves_graph_unchanged() {
        let mut graph = small_graph();
        let result = graph.add_edge(&key("a1"), &key("ghost"), Edge::new("e3", RelType::RefersTo));
        match result {
            Err(GraphError::UnknownEndpoint { edge, endpoint }) => {
                assert_eq!(edge, EdgeKey::from("e3"));
                assert_eq!(endpoint, key("ghost"));
            }
            other => panic!("expected UnknownEndpoint, got {:?}", other),
        }
        assert_eq!(graph.edge_count(), 2);
    }

    #[test]
    fn duplicate_edge_key_errors() {
        let mut graph = small_graph();
        let result = graph.add_edge(&key("p1"), &key("c1"), Edge::new("e1", RelType::Likes));
        assert!(matches!(result, Err(GraphError::DuplicateEdge { .. })));
        assert!(result.unwrap_err().is_recoverable());
        assert_eq!(graph.edge_count(), 2);
    }

    #[test]
    fn multi_edges_and_self_loops_are_allowed() {
        let mut graph = small_graph();
        graph
            .add_edge(&key("a1"), &key("p1"), Edge::new("e3", RelType::Annotates))
            .unwrap();
        graph
            .add_edge(&key("c1"), &key("c1"), Edge::new("e4", RelType::Cooccurs))
            .unwrap();
        assert_eq!(graph.edge_count(), 4);
    }

    #[test]
    fn insert_node_replaces_attributes_and_keeps_edges() {
        let mut graph = small_graph();
        let replaced = graph.insert_node(Node::new("p1", [Label::Post]).with_property("raw", "x"));
        assert!(replaced.is_some());
        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.edge_count(), 2);
        assert_eq!(
            graph.node("p1").unwrap().property("raw"),
            Some(&serde_json::json!("x"))
        );
    }

    #[test]
    fn directed_traversal_helpers() {
        let graph = small_graph();
        let a1 = graph.index_of("a1").unwrap();
        let p1 = graph.index_of("p1").unwrap();
        let c1 = graph.index_of("c1").unwrap();

        assert_eq!(graph.targets(a1, RelType::RefersTo).collect::<Vec<_>>(), vec![c1]);
        assert_eq!(graph.sources(p1, RelType::Annotates).collect::<Vec<_>>(), vec![a1]);
        assert_eq!(graph.sources(p1, RelType::RefersTo).count(), 0);
        assert_eq!(graph.targets(p1, RelType::Annotates).count(), 0);
        assert!(graph.is_model(c1, Model::Code));
    }

    #[test]
    fn export_preserves_insertion_order() {
        let graph = small_graph();
        let doc = graph.to_document();
        let keys: Vec<&str> = doc.nodes.iter().map(|n| n.key.as_str()).collect();
        assert_eq!(keys, vec!["a1", "p1", "c1"]);
        assert_eq!(doc.edges[1].source, key("a1"));
        assert_eq!(doc.edges[1].target, key("c1"));

        let json = serde_json::to_value(&graph).unwrap();
        assert_eq!(json["edges"][0]["attributes"]["type"], "ANNOTATES");
    }
}
