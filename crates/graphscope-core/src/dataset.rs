//! A loaded dataset: the normalized graph of one (platform, corpus) export
//! and its per-model statistics.

use serde::Serialize;

use crate::config::EngineConfig;
use crate::document::GraphDocument;
use crate::error::GraphError;
use crate::graph::PropertyGraph;
use crate::normalize::{normalize, Collision, IdMap};
use crate::types::Model;

/// Node counts per model.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub struct DatasetStats {
    pub users: usize,
    pub posts: usize,
    pub annotations: usize,
    pub topics: usize,
    pub codes: usize,
}

impl DatasetStats {
    /// A node with several model labels counts once under each.
    pub fn of(graph: &PropertyGraph) -> Self {
        let mut stats = DatasetStats::default();
        for model in graph.nodes().flat_map(|n| n.models()) {
            *stats.slot(model) += 1;
        }
        stats
    }

    pub fn count(&self, model: Model) -> usize {
        match model {
            Model::User => self.users,
            Model::Post => self.posts,
            Model::Annotation => self.annotations,
            Model::Topic => self.topics,
            Model::Code => self.codes,
        }
    }

    fn slot(&mut self, model: Model) -> &mut usize {
        match model {
            Model::User => &mut self.users,
            Model::Post => &mut self.posts,
            Model::Annotation => &mut self.annotations,
            Model::Topic => &mut self.topics,
            Model::Code => &mut self.codes,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub graph: PropertyGraph,
    pub stats: DatasetStats,
    pub id_map: IdMap,
    pub collisions: Vec<Collision>,
}

impl Dataset {
    /// Validates and normalizes a raw document.
    pub fn from_document(doc: GraphDocument, config: &EngineConfig) -> Result<Self, GraphError> {
        doc.validate()?;
        let normalized = normalize(doc, config);
        let stats = DatasetStats::of(&normalized.graph);
        tracing::info!(
            users = stats.users,
            posts = stats.posts,
            annotations = stats.annotations,
            topics = stats.topics,
            codes = stats.codes,
            "loaded dataset"
        );
        Ok(Dataset {
            graph: normalized.graph,
            stats,
            id_map: normalized.id_map,
            collisions: normalized.collisions,
        })
    }

    pub fn from_json(json: &str, config: &EngineConfig) -> Result<Self, GraphError> {
        Self::from_document(GraphDocument::from_json(json)?, config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FORUM: &str = r#"{
        "attributes": {"platform": "edgeryders", "corpora": "poprebel"},
        "nodes": [
            {"key": "1", "attributes": {"labels": ["user"], "properties": {"discourse_id": 1, "username": "ann"}}},
            {"key": "2", "attributes": {"labels": ["post"], "properties": {"discourse_id": 10}}},
            {"key": "3", "attributes": {"labels": ["post"], "properties": {"discourse_id": 11}}},
            {"key": "4", "attributes": {"labels": ["code"], "properties": {"discourse_id": 42}}},
            {"key": "5", "attributes": {"labels": ["platform"], "properties": {}}}
        ],
        "edges": [
            {"key": "e1", "source": "1", "target": "2", "attributes": {"type": "CREATED"}}
        ]
    }"#;

    #[test]
    fn stats_count_nodes_per_model() {
        let dataset = Dataset::from_json(FORUM, &EngineConfig::default()).unwrap();
        assert_eq!(
            dataset.stats,
            DatasetStats { users: 1, posts: 2, annotations: 0, topics: 0, codes: 1 }
        );
        assert_eq!(dataset.stats.count(Model::Post), 2);
        assert_eq!(dataset.graph.attributes()["corpora"], "poprebel");
        assert!(dataset.graph.node("post_10").is_some());
    }

    #[test]
    fn multi_model_nodes_count_under_each_model() {
        let dataset = Dataset::from_json(
            r#"{"nodes": [
                {"key": "1", "attributes": {"labels": ["code", "post"], "properties": {"discourse_id": 5}}},
                {"key": "2", "attributes": {"labels": ["code"], "properties": {"discourse_id": 6}}}
            ], "edges": []}"#,
            &EngineConfig::default(),
        )
        .unwrap();
        assert_eq!(
            dataset.stats,
            DatasetStats { users: 0, posts: 1, annotations: 0, topics: 0, codes: 2 }
        );
    }

    #[test]
    fn malformed_input_surfaces() {
        let err = Dataset::from_json(r#"{"nodes": 3, "edges": []}"#, &EngineConfig::default())
            .unwrap_err();
        assert!(matches!(err, GraphError::MalformedGraphInput { .. }));
    }
}
