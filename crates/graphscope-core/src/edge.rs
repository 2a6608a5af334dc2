//! Graph edges.
//!
//! [`Edge`] is the edge weight stored in the graph: key, relationship type and
//! property bag. Endpoints are structural and live in the graph itself.
//! [`EdgeEntry`] is the exported/raw form, which carries `source` and
//! `target` keys explicitly.

use serde::{Deserialize, Serialize};

use crate::id::{EdgeKey, NodeKey};
use crate::node::Properties;
use crate::types::RelType;

/// An edge weight of the property graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub key: EdgeKey,
    pub attributes: EdgeAttributes,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeAttributes {
    #[serde(rename = "type")]
    pub rel: RelType,
    #[serde(default)]
    pub properties: Properties,
}

/// An edge together with its endpoint keys, as it appears in a JSON graph
/// document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeEntry {
    pub key: EdgeKey,
    pub source: NodeKey,
    pub target: NodeKey,
    pub attributes: EdgeAttributes,
}

impl Edge {
    pub fn new(key: impl Into<EdgeKey>, rel: RelType) -> Self {
        Edge {
            key: key.into(),
            attributes: EdgeAttributes {
                rel,
                properties: Properties::new(),
            },
        }
    }

    pub fn with_property(mut self, name: &str, value: impl Into<serde_json::Value>) -> Self {
        self.attributes.properties.insert(name.to_string(), value.into());
        self
    }

    pub fn rel(&self) -> &RelType {
        &self.attributes.rel
    }

    /// Reads a numeric property, e.g. the `count` weight.
    pub fn weight(&self, property: &str) -> Option<f64> {
        self.attributes.properties.get(property)?.as_f64()
    }
}

impl EdgeEntry {
    /// Splits the entry into its endpoints and the stored edge weight.
    pub fn into_parts(self) -> (NodeKey, NodeKey, Edge) {
        let edge = Edge {
            key: self.key,
            attributes: self.attributes,
        };
        (self.source, self.target, edge)
    }
}
