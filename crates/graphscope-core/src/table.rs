//! Table projector: flat rows per model for table views.

use std::cmp::Ordering;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::columns::Column;
use crate::config::EngineConfig;
use crate::graph::PropertyGraph;
use crate::id::NodeKey;
use crate::scope::Scope;
use crate::types::Model;

/// Which table to build. The scope feeds scope-aware computed columns.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableOptions {
    pub node_label: Model,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<Scope>,
}

impl TableOptions {
    pub fn new(node_label: Model) -> Self {
        TableOptions {
            node_label,
            scope: None,
        }
    }

    pub fn with_scope(mut self, scope: Scope) -> Self {
        self.scope = Some(scope);
        self
    }
}

/// One table row: the node key plus the values present for it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Row {
    pub key: NodeKey,
    #[serde(flatten)]
    pub values: IndexMap<String, Value>,
}

impl Row {
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.values.get(column)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

/// One sort criterion.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SortColumn {
    pub column: String,
    #[serde(default)]
    pub direction: SortDirection,
}

impl SortColumn {
    /// Parses `column` or `column:asc` / `column:desc`.
    pub fn parse(s: &str) -> Option<SortColumn> {
        let (column, direction) = match s.split_once(':') {
            Some((column, "asc")) => (column, SortDirection::Asc),
            Some((column, "desc")) => (column, SortDirection::Desc),
            Some(_) => return None,
            None => (s, SortDirection::Asc),
        };
        if column.is_empty() {
            return None;
        }
        Some(SortColumn {
            column: column.to_string(),
            direction,
        })
    }
}

/// A projected table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableData {
    pub label: Model,
    pub columns: Vec<Column>,
    pub rows: Vec<Row>,
}

impl TableData {
    /// Stable sort by the given criteria; the first non-equal column decides.
    pub fn sort_rows(&mut self, by: &[SortColumn]) {
        self.rows.sort_by(|a, b| {
            by.iter()
                .map(|sort| {
                    let ordering = compare_values(a.get(&sort.column), b.get(&sort.column));
                    match sort.direction {
                        SortDirection::Asc => ordering,
                        SortDirection::Desc => ordering.reverse(),
                    }
                })
                .find(|o| o.is_ne())
                .unwrap_or(Ordering::Equal)
        });
    }
}

/// Numbers compare numerically when both sides are numbers; everything else
/// compares by its string form. Missing values sort first.
fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
            x.total_cmp(&y)
        }
        (Some(x), Some(y)) => sort_text(x).cmp(&sort_text(y)),
    }
}

fn sort_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Projects graphs onto the per-model column schemas of an [`EngineConfig`].
#[derive(Debug, Clone, Copy)]
pub struct TableProjector<'c> {
    config: &'c EngineConfig,
}

impl<'c> TableProjector<'c> {
    pub fn new(config: &'c EngineConfig) -> Self {
        TableProjector { config }
    }

    /// One row per node labelled `options.node_label` that is in scope area
    /// (or carries no flag), with the values of the configured columns.
    pub fn project(&self, graph: &PropertyGraph, options: &TableOptions) -> TableData {
        let model = options.node_label;
        let columns = self.config.model(model).columns.clone();
        let label = model.label();

        let rows: Vec<Row> = graph
            .node_indices()
            .filter_map(|idx| {
                let node = graph.node_at(idx)?;
                if !node.has_label(&label) || !node.in_scope_area() {
                    return None;
                }
                let values = columns
                    .iter()
                    .filter_map(|column| {
                        column
                            .value(graph, idx, options.scope.as_ref())
                            .map(|v| (column.property.clone(), v))
                    })
                    .collect();
                Some(Row {
                    key: node.key.clone(),
                    values,
                })
            })
            .collect();

        tracing::debug!(model = %model, rows = rows.len(), "projected table");
        TableData {
            label: model,
            columns,
            rows,
        }
    }
}
