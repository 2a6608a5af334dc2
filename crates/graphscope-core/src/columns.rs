//! Table column schema and computed-column derivations.
//!
//! A [`Column`] either copies a node property or computes its value with a
//! [`Derivation`] that walks the node's incident edges. Derivations are a
//! closed enum rather than callbacks so that the whole schema stays
//! serializable (and therefore part of the configuration).

use std::collections::BTreeSet;

use petgraph::graph::NodeIndex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::graph::PropertyGraph;
use crate::node::Node;
use crate::scope::{Scope, ScopeDimension};
use crate::types::{Model, RelType};

/// Value type of a column, used by the presentation layer for formatting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    String,
    Number,
    Boolean,
    Date,
}

/// One column of a table schema.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Column {
    /// Row field name; also the node property read when `derive` is unset.
    pub property: String,
    /// Column header.
    pub label: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<ColumnType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub derive: Option<Derivation>,
}

impl Column {
    /// A column copied from the node property of the same name.
    pub fn property(property: &str, label: &str, kind: ColumnType) -> Self {
        Column {
            property: property.to_string(),
            label: label.to_string(),
            kind: Some(kind),
            derive: None,
        }
    }

    /// A computed column.
    pub fn derived(property: &str, label: &str, kind: ColumnType, derive: Derivation) -> Self {
        Column {
            property: property.to_string(),
            label: label.to_string(),
            kind: Some(kind),
            derive: Some(derive),
        }
    }

    /// Computes this column's value for the node at `idx`.
    ///
    /// `None` means the row has no value for the column and the field is
    /// omitted from the row.
    pub fn value(
        &self,
        graph: &PropertyGraph,
        idx: NodeIndex<u32>,
        scope: Option<&Scope>,
    ) -> Option<Value> {
        match &self.derive {
            Some(derivation) => derivation.derive(graph, idx, scope),
            None => graph.node_at(idx)?.property(&self.property).cloned(),
        }
    }
}

/// Computed column functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Derivation {
    /// Post: number of distinct in-scope-area codes reachable through its
    /// annotations.
    InScopeCodeCount,
    /// Post or code: number of annotations attached to it.
    AnnotationCount,
    /// Code: number of distinct posts annotated with it.
    AnnotatedPostCount,
    /// Code: number of distinct users who wrote a post annotated with it.
    ParticipantCount,
    /// Post: display name of the user who created it.
    Author,
    /// User: posts created. Topic: posts in the topic.
    PostCount,
    /// Annotation: key of the post it annotates.
    AnnotatedPost,
    /// Annotation: whether the code it refers to is pinned in the code scope.
    CodeInScope,
}

impl Derivation {
    /// Evaluates the derivation. Returns `None` when it does not apply to
    /// the node's model.
    pub fn derive(
        &self,
        graph: &PropertyGraph,
        idx: NodeIndex<u32>,
        scope: Option<&Scope>,
    ) -> Option<Value> {
        let model = graph.node_at(idx)?.model()?;
        match (self, model) {
            (Derivation::InScopeCodeCount, Model::Post) => {
                let codes: BTreeSet<NodeIndex<u32>> = annotation_codes(graph, idx)
                    .filter(|&c| graph.node_at(c).is_some_and(Node::in_scope_area))
                    .collect();
                Some(Value::from(codes.len()))
            }
            (Derivation::AnnotationCount, Model::Post) => {
                Some(Value::from(graph.sources(idx, RelType::Annotates).count()))
            }
            (Derivation::AnnotationCount, Model::Code) => {
                Some(Value::from(graph.sources(idx, RelType::RefersTo).count()))
            }
            (Derivation::AnnotatedPostCount, Model::Code) => {
                Some(Value::from(code_posts(graph, idx).len()))
            }
            (Derivation::ParticipantCount, Model::Code) => {
                let users: BTreeSet<NodeIndex<u32>> = code_posts(graph, idx)
                    .into_iter()
                    .flat_map(|p| graph.sources(p, RelType::Created))
                    .collect();
                Some(Value::from(users.len()))
            }
            (Derivation::Author, Model::Post) => {
                let author = graph.sources(idx, RelType::Created).next()?;
                graph.node_at(author).map(|n| Value::from(n.display()))
            }
            (Derivation::PostCount, Model::User) => {
                let posts = graph
                    .targets(idx, RelType::Created)
                    .filter(|&p| graph.is_model(p, Model::Post))
                    .count();
                Some(Value::from(posts))
            }
            (Derivation::PostCount, Model::Topic) => {
                Some(Value::from(graph.sources(idx, RelType::InTopic).count()))
            }
            (Derivation::AnnotatedPost, Model::Annotation) => {
                let post = graph.targets(idx, RelType::Annotates).next()?;
                graph.node_at(post).map(|n| Value::from(n.key.as_str()))
            }
            (Derivation::CodeInScope, Model::Annotation) => {
                let pinned = graph.targets(idx, RelType::RefersTo).any(|c| {
                    match (scope, graph.node_at(c)) {
                        (Some(scope), Some(code)) => scope.contains(ScopeDimension::Code, code.key.as_str()),
                        _ => false,
                    }
                });
                Some(Value::Bool(pinned))
            }
            _ => None,
        }
    }
}

/// Codes reached from a post through `annotation -ANNOTATES-> post` and
/// `annotation -REFERS_TO-> code`.
fn annotation_codes(
    graph: &PropertyGraph,
    post: NodeIndex<u32>,
) -> impl Iterator<Item = NodeIndex<u32>> + '_ {
    graph
        .sources(post, RelType::Annotates)
        .flat_map(move |a| graph.targets(a, RelType::RefersTo))
}

/// Distinct posts annotated with a code.
fn code_posts(graph: &PropertyGraph, code: NodeIndex<u32>) -> BTreeSet<NodeIndex<u32>> {
    graph
        .sources(code, RelType::RefersTo)
        .flat_map(|a| graph.targets(a, RelType::Annotates))
        .collect()
}
