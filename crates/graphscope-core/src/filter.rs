//! View filter: label and edge-type restricted subgraphs for network views.

use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::graph::PropertyGraph;
use crate::types::{Label, RelType};

/// Which nodes and edges a network view shows. Empty lists mean "all".
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NetworkOptions {
    pub node_labels: Vec<Label>,
    pub edge_types: Vec<RelType>,
}

impl NetworkOptions {
    pub fn new(
        node_labels: impl IntoIterator<Item = Label>,
        edge_types: impl IntoIterator<Item = RelType>,
    ) -> Self {
        NetworkOptions {
            node_labels: node_labels.into_iter().collect(),
            edge_types: edge_types.into_iter().collect(),
        }
    }
}

/// Min/max of the weight property over the kept edges.
///
/// Starts at `{min: +inf, max: -inf}`, which means "no weight data". The
/// infinities serialize as `null` in JSON.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WeightBounds {
    pub min: f64,
    pub max: f64,
}

impl Default for WeightBounds {
    fn default() -> Self {
        WeightBounds {
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
        }
    }
}

impl WeightBounds {
    pub fn has_data(&self) -> bool {
        self.min <= self.max
    }

    fn record(&mut self, weight: f64) {
        self.min = self.min.min(weight);
        self.max = self.max.max(weight);
    }
}

/// A filtered subgraph.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilteredGraph {
    pub graph: PropertyGraph,
    pub edge_weight: WeightBounds,
}

/// Builds network views out of a (usually scoped) graph.
#[derive(Debug, Clone)]
pub struct ViewFilter {
    weight_property: String,
}

impl ViewFilter {
    pub fn new(config: &EngineConfig) -> Self {
        ViewFilter {
            weight_property: config.weight_property.clone(),
        }
    }

    /// Keeps the nodes whose labels intersect `options.node_labels` and that
    /// are in scope area (or carry no flag), then the edges of the selected
    /// types between kept nodes.
    pub fn filter(&self, graph: &PropertyGraph, options: &NetworkOptions) -> FilteredGraph {
        let mut out = PropertyGraph::with_attributes(graph.attributes().clone());

        for node in graph.nodes() {
            let label_ok = options.node_labels.is_empty()
                || node.labels().iter().any(|l| options.node_labels.contains(l));
            if label_ok && node.in_scope_area() {
                out.insert_node(node.clone());
            }
        }

        let mut bounds = WeightBounds::default();
        for view in graph.edges() {
            if out.index_of(view.source.key.as_str()).is_none()
                || out.index_of(view.target.key.as_str()).is_none()
            {
                continue;
            }
            if !options.edge_types.is_empty() && !options.edge_types.contains(view.edge.rel()) {
                continue;
            }
            let weight = view.edge.weight(&self.weight_property);
            match out.add_edge(&view.source.key, &view.target.key, view.edge.clone()) {
                Ok(_) => {
                    if let Some(weight) = weight {
                        bounds.record(weight);
                    }
                }
                Err(err) => {
                    tracing::warn!(
                        edge = %view.edge.key,
                        source = %view.source.key,
                        target = %view.target.key,
                        properties = ?view.edge.attributes.properties,
                        error = %err,
                        "skipping edge in filtered view"
                    );
                }
            }
        }

        tracing::debug!(
            nodes = out.node_count(),
            edges = out.edge_count(),
            "filtered view"
        );
        FilteredGraph {
            graph: out,
            edge_weight: bounds,
        }
    }
}
