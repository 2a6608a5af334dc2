//! Engine configuration.
//!
//! [`EngineConfig`] is injected into the normalizer, scope engine, view
//! filter and table projector. It carries per-model presentation settings
//! (label, color, icon, display field), per-model table column schemas, the
//! natural-key and weight property names, and the scope combinator.
//!
//! The defaults reproduce the dashboard's built-in configuration. A partial
//! JSON document can override any part of it: every struct here is
//! `#[serde(default)]`.

use serde::{Deserialize, Serialize};

use crate::columns::{Column, ColumnType, Derivation};
use crate::types::Model;

/// How the active cross-dimension scope conditions are combined.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScopeCombinator {
    /// Every active condition must hold (assortative).
    #[default]
    All,
    /// Any active condition suffices (cumulative).
    Any,
}

/// Presentation and table settings for one model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Human-readable name of the model ("participant" for users).
    pub label: String,
    pub color: String,
    pub icon: String,
    /// Node property copied into the presentation `label` attribute.
    pub label_field: String,
    /// Ordered table schema.
    pub columns: Vec<Column>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        ModelConfig {
            label: String::new(),
            color: "#555555".to_string(),
            icon: "question".to_string(),
            label_field: "name".to_string(),
            columns: Vec::new(),
        }
    }
}

/// One [`ModelConfig`] per model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfigs {
    pub code: ModelConfig,
    pub post: ModelConfig,
    pub user: ModelConfig,
    pub annotation: ModelConfig,
    pub topic: ModelConfig,
}

impl ModelConfigs {
    pub fn get(&self, model: Model) -> &ModelConfig {
        match model {
            Model::Code => &self.code,
            Model::Post => &self.post,
            Model::User => &self.user,
            Model::Annotation => &self.annotation,
            Model::Topic => &self.topic,
        }
    }
}

/// Top-level engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Property holding each node's natural key.
    pub natural_key: String,
    /// Numeric edge property used as weight by the view filter.
    pub weight_property: String,
    pub scope_combinator: ScopeCombinator,
    pub models: ModelConfigs,
}

impl EngineConfig {
    /// Parses a (possibly partial) JSON configuration.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn model(&self, model: Model) -> &ModelConfig {
        self.models.get(model)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            natural_key: "discourse_id".to_string(),
            weight_property: "count".to_string(),
            scope_combinator: ScopeCombinator::All,
            models: ModelConfigs::default(),
        }
    }
}

impl Default for ModelConfigs {
    fn default() -> Self {
        ModelConfigs {
            code: ModelConfig {
                label: "code".to_string(),
                color: "#0292D5".to_string(),
                icon: "code".to_string(),
                label_field: "name".to_string(),
                columns: vec![
                    Column::property("name", "Name", ColumnType::String),
                    Column::property("description", "Description", ColumnType::String),
                    Column::property("created_at", "Created", ColumnType::Date),
                    Column::derived("annotations", "Annotations", ColumnType::Number, Derivation::AnnotationCount),
                    Column::derived("posts", "Posts", ColumnType::Number, Derivation::AnnotatedPostCount),
                    Column::derived("participants", "Participants", ColumnType::Number, Derivation::ParticipantCount),
                ],
            },
            post: ModelConfig {
                label: "post".to_string(),
                color: "#EA37B0".to_string(),
                icon: "file-alt".to_string(),
                label_field: "raw".to_string(),
                columns: vec![
                    Column::property("raw", "Content", ColumnType::String),
                    Column::derived("author", "Author", ColumnType::String, Derivation::Author),
                    Column::property("created_at", "Created", ColumnType::Date),
                    Column::property("like_count", "Likes", ColumnType::Number),
                    Column::property("reply_count", "Replies", ColumnType::Number),
                    Column::property("word_count", "Words", ColumnType::Number),
                    Column::derived("codes", "Codes in scope", ColumnType::Number, Derivation::InScopeCodeCount),
                ],
            },
            user: ModelConfig {
                label: "participant".to_string(),
                color: "#6AD74D".to_string(),
                icon: "user-alt".to_string(),
                label_field: "username".to_string(),
                columns: vec![
                    Column::property("username", "Username", ColumnType::String),
                    Column::derived("posts", "Posts", ColumnType::Number, Derivation::PostCount),
                ],
            },
            annotation: ModelConfig {
                label: "annotation".to_string(),
                color: "#555555".to_string(),
                icon: "pencil-alt".to_string(),
                label_field: "quote".to_string(),
                columns: vec![
                    Column::property("quote", "Quote", ColumnType::String),
                    Column::property("text", "Text", ColumnType::String),
                    Column::property("created_at", "Created", ColumnType::Date),
                    Column::derived("post", "Post", ColumnType::String, Derivation::AnnotatedPost),
                    Column::derived("code_in_scope", "Code in scope", ColumnType::Boolean, Derivation::CodeInScope),
                ],
            },
            topic: ModelConfig {
                label: "topic".to_string(),
                color: "#555555".to_string(),
                icon: "question".to_string(),
                label_field: "title".to_string(),
                columns: vec![
                    Column::property("title", "Title", ColumnType::String),
                    Column::property("created_at", "Created", ColumnType::Date),
                    Column::derived("posts", "Posts", ColumnType::Number, Derivation::PostCount),
                ],
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_dashboard_palette() {
        let config = EngineConfig::default();
        assert_eq!(config.model(Model::Code).color, "#0292D5");
        assert_eq!(config.model(Model::Post).color, "#EA37B0");
        assert_eq!(config.model(Model::User).color, "#6AD74D");
        assert_eq!(config.model(Model::User).label, "participant");
        assert_eq!(config.natural_key, "discourse_id");
        assert_eq!(config.scope_combinator, ScopeCombinator::All);
    }

    #[test]
    fn partial_json_overrides_only_given_fields() {
        let config = EngineConfig::from_json(
            r##"{"scope_combinator": "any", "models": {"code": {"color": "#000000"}}}"##,
        )
        .unwrap();
        assert_eq!(config.scope_combinator, ScopeCombinator::Any);
        assert_eq!(config.model(Model::Code).color, "#000000");
        // Fields of an overridden model not present in the JSON fall back to
        // `ModelConfig::default()`, not to the code defaults.
        assert!(config.model(Model::Code).columns.is_empty());
        // Untouched models keep the full defaults.
        assert_eq!(config.model(Model::Post).color, "#EA37B0");
        assert_eq!(config.weight_property, "count");
    }

    #[test]
    fn every_model_has_a_column_schema() {
        let config = EngineConfig::default();
        for model in Model::ALL {
            assert!(!config.model(model).columns.is_empty(), "{model} has no columns");
        }
    }

    #[test]
    fn annotation_schema_snapshot() {
        let config = EngineConfig::default();
        insta::assert_json_snapshot!(config.model(Model::Annotation).columns, @r###"
        [
          {
            "property": "quote",
            "label": "Quote",
            "type": "string"
          },
          {
            "property": "text",
            "label": "Text",
            "type": "string"
          },
          {
            "property": "created_at",
            "label": "Created",
            "type": "date"
          },
          {
            "property": "post",
            "label": "Post",
            "type": "string",
            "derive": "annotated_post"
          },
          {
            "property": "code_in_scope",
            "label": "Code in scope",
            "type": "boolean",
            "derive": "code_in_scope"
          }
        ]
        "###);
    }
}
