//! The JSON graph document exchanged with the fetch layer.
//!
//! ```text
//! { attributes?: {...},
//!   nodes: [{ key, attributes: { labels, properties } }],
//!   edges: [{ key, source, target, attributes: { type, properties } }] }
//! ```
//!
//! The same shape is used for exports of derived graphs. Raw storage-engine
//! ids are opaque strings.

use serde::{Deserialize, Serialize};

use crate::edge::EdgeEntry;
use crate::error::GraphError;
use crate::node::{Node, Properties};

/// A graph as a flat list of nodes and edges.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphDocument {
    #[serde(default)]
    pub attributes: Properties,
    pub nodes: Vec<Node>,
    pub edges: Vec<EdgeEntry>,
}

impl GraphDocument {
    /// Parses and validates a document.
    ///
    /// Any parse failure (missing `nodes`/`edges`, wrong shapes) is reported
    /// as [`GraphError::MalformedGraphInput`].
    pub fn from_json(json: &str) -> Result<Self, GraphError> {
        let doc: GraphDocument =
            serde_json::from_str(json).map_err(|e| GraphError::MalformedGraphInput {
                reason: e.to_string(),
            })?;
        doc.validate()?;
        Ok(doc)
    }

    /// Structural checks that make a document unusable as a whole.
    ///
    /// Individual dangling edges are not errors here; the normalizer drops
    /// them. What is rejected is an edge list with no node list behind it,
    /// and edges whose source or target is empty.
    pub fn validate(&self) -> Result<(), GraphError> {
        if self.nodes.is_empty() && !self.edges.is_empty() {
            return Err(GraphError::MalformedGraphInput {
                reason: format!("{} edge(s) but no nodes", self.edges.len()),
            });
        }
        if let Some(edge) = self
            .edges
            .iter()
            .find(|e| e.source.as_str().is_empty() || e.target.as_str().is_empty())
        {
            return Err(GraphError::MalformedGraphInput {
                reason: format!("edge '{}' has an empty endpoint", edge.key),
            });
        }
        Ok(())
    }
}
