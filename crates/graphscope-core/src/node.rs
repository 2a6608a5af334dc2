//! Graph nodes.
//!
//! A [`Node`] has the same shape as the nodes of the exported JSON graph
//! (`{key, attributes: {labels, properties, ...}}`), so raw documents
//! deserialize straight into it. The derived attributes (`model`, `label`,
//! `color`, `inScopeArea`) are absent on raw input and filled in by the
//! normalizer and the scope engine.

use std::collections::BTreeSet;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::id::NodeKey;
use crate::types::{Label, Model};

/// Open property bag of a node or edge, in insertion order.
pub type Properties = IndexMap<String, serde_json::Value>;

/// Label set of a node. Nearly every node carries one or two labels.
pub type Labels = SmallVec<[Label; 2]>;

/// A node of the property graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub key: NodeKey,
    #[serde(default)]
    pub attributes: NodeAttributes,
}

/// Everything a node carries besides its key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeAttributes {
    #[serde(default)]
    pub labels: Labels,
    #[serde(default)]
    pub properties: Properties,
    /// The single model chosen to drive derived behavior.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<Model>,
    /// Presentation label, set once during load.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Presentation color, set once during load.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    /// `None` until a scope has been applied.
    #[serde(
        rename = "inScopeArea",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub in_scope_area: Option<bool>,
}

impl Node {
    /// Creates a node with the given labels and no properties.
    pub fn new(key: impl Into<NodeKey>, labels: impl IntoIterator<Item = Label>) -> Self {
        Node {
            key: key.into(),
            attributes: NodeAttributes {
                labels: labels.into_iter().collect(),
                ..NodeAttributes::default()
            },
        }
    }

    /// Builder-style property setter.
    pub fn with_property(mut self, name: &str, value: impl Into<serde_json::Value>) -> Self {
        self.attributes.properties.insert(name.to_string(), value.into());
        self
    }

    pub fn labels(&self) -> &[Label] {
        &self.attributes.labels
    }

    pub fn has_label(&self, label: &Label) -> bool {
        self.attributes.labels.contains(label)
    }

    pub fn property(&self, name: &str) -> Option<&serde_json::Value> {
        self.attributes.properties.get(name)
    }

    /// The node's model: the one set at load time, or else the single known
    /// label in its label set.
    pub fn model(&self) -> Option<Model> {
        self.attributes
            .model
            .or_else(|| Model::from_labels(&self.attributes.labels))
    }

    /// Every known model among the node's labels. Unlike [`Node::model`]
    /// this does not require the label to be unique, so a `[code, post]`
    /// node yields both.
    pub fn models(&self) -> BTreeSet<Model> {
        self.attributes.labels.iter().filter_map(Label::model).collect()
    }

    /// Whether the node is in scope area. Absence of the flag means no scope
    /// has been applied yet and counts as in scope.
    pub fn in_scope_area(&self) -> bool {
        self.attributes.in_scope_area.unwrap_or(true)
    }

    /// Display text: the presentation label if set, else the key.
    pub fn display(&self) -> &str {
        self.attributes
            .label
            .as_deref()
            .unwrap_or(self.key.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn raw_node_deserializes_without_derived_fields() {
        let node: Node = serde_json::from_value(json!({
            "key": "17",
            "attributes": {
                "labels": ["post"],
                "properties": {"discourse_id": 5, "raw": "hello"}
            }
        }))
        .unwrap();
        assert_eq!(node.key, NodeKey::from("17"));
        assert_eq!(node.labels(), &[Label::Post]);
        assert_eq!(node.property("discourse_id"), Some(&json!(5)));
        assert_eq!(node.attributes.model, None);
        assert!(node.in_scope_area());
    }

    #[test]
    fn model_falls_back_to_labels() {
        let node = Node::new("c", [Label::Code]);
        assert_eq!(node.model(), Some(Model::Code));

        let mut tagged = Node::new("x", [Label::Tag]);
        assert_eq!(tagged.model(), None);
        tagged.attributes.model = Some(Model::Topic);
        assert_eq!(tagged.model(), Some(Model::Topic));
    }

    #[test]
    fn derived_fields_are_omitted_until_set() {
        let node = Node::new("u", [Label::User]).with_property("username", "ann");
        let value = serde_json::to_value(&node).unwrap();
        assert_eq!(
            value,
            json!({
                "key": "u",
                "attributes": {"labels": ["user"], "properties": {"username": "ann"}}
            })
        );
    }

    #[test]
    fn in_scope_area_flag_serializes_camel_case() {
        let mut node = Node::new("p", [Label::Post]);
        node.attributes.in_scope_area = Some(false);
        let value = serde_json::to_value(&node).unwrap();
        assert_eq!(value["attributes"]["inScopeArea"], json!(false));
        assert!(!node.in_scope_area());
    }

    #[test]
    fn display_prefers_presentation_label() {
        let mut node = Node::new("user_3", [Label::User]);
        assert_eq!(node.display(), "user_3");
        node.attributes.label = Some("ann".into());
        assert_eq!(node.display(), "ann");
    }
}
