//! Identity normalization.
//!
//! Raw documents key nodes by storage-engine ids that change between
//! exports. [`normalize`] rekeys every node that has exactly one known model
//! label and a natural key to the business id `"{model}_{natural_key}"`
//! (e.g. `code_42`), rewrites edge endpoints through the resulting map, and
//! fills in the presentation attributes (`model`, `label`, `color`).
//!
//! Two raw nodes that produce the same business id are a collision: it is
//! logged, recorded, and the later node wins. Edges that cannot be inserted
//! (unknown endpoint, duplicate key) are logged and dropped.

use std::collections::HashMap;

use serde::Serialize;
use serde_json::Value;

use crate::config::EngineConfig;
use crate::document::GraphDocument;
use crate::error::GraphError;
use crate::graph::PropertyGraph;
use crate::id::{EdgeKey, NodeKey};
use crate::node::Node;
use crate::types::Model;

/// Raw id <-> business id mapping produced by normalization.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IdMap {
    /// Raw id -> business id, for every raw node (identity for unmatched ones).
    pub to_business: HashMap<NodeKey, NodeKey>,
    /// Business id -> raw id of the node that last produced it.
    pub to_raw: HashMap<NodeKey, NodeKey>,
}

impl IdMap {
    pub fn business(&self, raw: &str) -> Option<&NodeKey> {
        self.to_business.get(raw)
    }

    pub fn raw(&self, business: &str) -> Option<&NodeKey> {
        self.to_raw.get(business)
    }
}

/// Two raw nodes that normalized to the same business id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Collision {
    pub business: NodeKey,
    /// The raw id that held the business id before.
    pub previous: NodeKey,
    /// The raw id that replaced it.
    pub replacement: NodeKey,
}

/// Result of [`normalize`].
#[derive(Debug, Clone)]
pub struct Normalized {
    pub graph: PropertyGraph,
    pub id_map: IdMap,
    pub collisions: Vec<Collision>,
    /// Keys of raw edges that could not be inserted.
    pub dropped_edges: Vec<EdgeKey>,
}

/// Rekeys a raw document into a normalized [`PropertyGraph`].
///
/// Never fails: every anomaly is logged and routed around. Structural
/// validation of the document happens before, in
/// [`GraphDocument::validate`].
pub fn normalize(doc: GraphDocument, config: &EngineConfig) -> Normalized {
    let mut graph = PropertyGraph::with_attributes(doc.attributes);
    let mut id_map = IdMap::default();
    let mut collisions = Vec::new();

    for mut node in doc.nodes {
        let raw = node.key.clone();
        let model = Model::from_labels(node.labels());
        let business = model
            .and_then(|m| business_key(&node, m, &config.natural_key))
            .unwrap_or_else(|| raw.clone());

        if let Some(model) = model {
            decorate(&mut node, model, config);
        }

        if let Some(previous) = id_map.to_raw.insert(business.clone(), raw.clone()) {
            if previous != raw {
                tracing::warn!(
                    business = %business,
                    previous = %previous,
                    replacement = %raw,
                    "identity collision, keeping the later node"
                );
                collisions.push(Collision {
                    business: business.clone(),
                    previous,
                    replacement: raw.clone(),
                });
            }
        }
        id_map.to_business.insert(raw, business.clone());

        node.key = business;
        graph.insert_node(node);
    }

    let mut dropped_edges = Vec::new();
    for entry in doc.edges {
        let (source, target, edge) = entry.into_parts();
        let key = edge.key.clone();
        let inserted = rekey(&id_map, &key, &source)
            .and_then(|source| Ok((source, rekey(&id_map, &key, &target)?)))
            .and_then(|(source, target)| graph.add_edge(&source, &target, edge));
        if let Err(err) = inserted {
            tracing::warn!(edge = %key, error = %err, "dropping edge during normalization");
            dropped_edges.push(key);
        }
    }

    tracing::debug!(
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        collisions = collisions.len(),
        dropped_edges = dropped_edges.len(),
        "normalized graph"
    );

    Normalized {
        graph,
        id_map,
        collisions,
        dropped_edges,
    }
}

/// Maps a raw edge endpoint to its business id. Only raw ids of nodes in the
/// document resolve; anything else is an unknown endpoint, even if it
/// happens to spell an existing business id.
fn rekey(id_map: &IdMap, edge: &EdgeKey, raw: &NodeKey) -> Result<NodeKey, GraphError> {
    id_map
        .to_business
        .get(raw)
        .cloned()
        .ok_or_else(|| GraphError::UnknownEndpoint {
            edge: edge.clone(),
            endpoint: raw.clone(),
        })
}

/// `"{model}_{natural_key}"`, or `None` when the natural key is missing or
/// not a scalar.
fn business_key(node: &Node, model: Model, natural_key: &str) -> Option<NodeKey> {
    let id = match node.property(natural_key)? {
        Value::String(s) if !s.is_empty() => s.clone(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    Some(NodeKey(format!("{}_{}", model.as_str(), id)))
}

fn decorate(node: &mut Node, model: Model, config: &EngineConfig) {
    let model_config = config.model(model);
    let label = node.property(&model_config.label_field).map(|v| match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    });
    node.attributes.model = Some(model);
    node.attributes.label = label;
    node.attributes.color = Some(model_config.color.clone());
}
