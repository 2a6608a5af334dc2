//! The graph vocabulary: node labels, entity models and relationship types.
//!
//! Labels and relationship types come from a fixed vocabulary, but the graph
//! is loaded from an external database, so unknown tags are preserved in an
//! `Other` variant rather than rejected. Both serialize as their plain tag
//! string.
//!
//! [`Model`] is the closed set of entity kinds the engine reasons about.
//! Scope rules and table schemas are selected by matching on it.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Labels
// ---------------------------------------------------------------------------

/// A node type label.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Label {
    User,
    Code,
    Post,
    Topic,
    Annotation,
    Group,
    Category,
    Tag,
    Platform,
    GlobalUser,
    Language,
    Codename,
    CorpusTag,
    /// A label outside the known vocabulary, kept verbatim.
    Other(String),
}

impl Label {
    /// Returns the tag string as stored in the graph database.
    pub fn as_str(&self) -> &str {
        match self {
            Label::User => "user",
            Label::Code => "code",
            Label::Post => "post",
            Label::Topic => "topic",
            Label::Annotation => "annotation",
            Label::Group => "group",
            Label::Category => "category",
            Label::Tag => "tag",
            Label::Platform => "platform",
            Label::GlobalUser => "globaluser",
            Label::Language => "language",
            Label::Codename => "codename",
            Label::CorpusTag => "corpus_tag",
            Label::Other(s) => s,
        }
    }

    /// Returns the entity model this label drives, if any.
    pub fn model(&self) -> Option<Model> {
        match self {
            Label::User => Some(Model::User),
            Label::Code => Some(Model::Code),
            Label::Post => Some(Model::Post),
            Label::Topic => Some(Model::Topic),
            Label::Annotation => Some(Model::Annotation),
            _ => None,
        }
    }
}

impl From<&str> for Label {
    fn from(s: &str) -> Self {
        match s {
            "user" => Label::User,
            "code" => Label::Code,
            "post" => Label::Post,
            "topic" => Label::Topic,
            "annotation" => Label::Annotation,
            "group" => Label::Group,
            "category" => Label::Category,
            "tag" => Label::Tag,
            "platform" => Label::Platform,
            "globaluser" => Label::GlobalUser,
            "language" => Label::Language,
            "codename" => Label::Codename,
            "corpus_tag" => Label::CorpusTag,
            other => Label::Other(other.to_string()),
        }
    }
}

impl From<String> for Label {
    fn from(s: String) -> Self {
        Label::from(s.as_str())
    }
}

impl From<Label> for String {
    fn from(label: Label) -> Self {
        match label {
            Label::Other(s) => s,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Models
// ---------------------------------------------------------------------------

/// The entity kinds with model-specific behavior (scope rules, columns,
/// presentation).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Model {
    User,
    Code,
    Post,
    Topic,
    Annotation,
}

impl Model {
    pub const ALL: [Model; 5] = [
        Model::User,
        Model::Code,
        Model::Post,
        Model::Topic,
        Model::Annotation,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Model::User => "user",
            Model::Code => "code",
            Model::Post => "post",
            Model::Topic => "topic",
            Model::Annotation => "annotation",
        }
    }

    /// The node label carrying this model.
    pub fn label(&self) -> Label {
        match self {
            Model::User => Label::User,
            Model::Code => Label::Code,
            Model::Post => Label::Post,
            Model::Topic => Label::Topic,
            Model::Annotation => Label::Annotation,
        }
    }

    /// Picks the model of a label set: exactly one known label must match.
    /// Zero or several matches yield `None`.
    pub fn from_labels<'a>(labels: impl IntoIterator<Item = &'a Label>) -> Option<Model> {
        let mut found = None;
        for model in labels.into_iter().filter_map(Label::model) {
            match found {
                None => found = Some(model),
                Some(existing) if existing == model => {}
                Some(_) => return None,
            }
        }
        found
    }

    pub fn parse(s: &str) -> Option<Model> {
        Label::from(s).model()
    }
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Relationship types
// ---------------------------------------------------------------------------

/// A relationship (edge) type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RelType {
    /// `user -> post`, `user -> topic`.
    Created,
    /// `annotation -> post`.
    Annotates,
    /// `annotation -> code`.
    RefersTo,
    TalkedTo,
    Quoted,
    TalkedOrQuoted,
    Likes,
    /// `post -> topic`.
    InTopic,
    Cooccurs,
    UsedCode,
    IsReplyTo,
    ContainsQuoteFrom,
    InCorpus,
    OnPlatform,
    HasParentCode,
    HasCodename,
    TaggedWith,
    InCategory,
    InGroup,
    Other(String),
}

impl RelType {
    pub fn as_str(&self) -> &str {
        match self {
            RelType::Created => "CREATED",
            RelType::Annotates => "ANNOTATES",
            RelType::RefersTo => "REFERS_TO",
            RelType::TalkedTo => "TALKED_TO",
            RelType::Quoted => "QUOTED",
            RelType::TalkedOrQuoted => "TALKED_OR_QUOTED",
            RelType::Likes => "LIKES",
            RelType::InTopic => "IN_TOPIC",
            RelType::Cooccurs => "COOCCURS",
            RelType::UsedCode => "USED_CODE",
            RelType::IsReplyTo => "IS_REPLY_TO",
            RelType::ContainsQuoteFrom => "CONTAINS_QUOTE_FROM",
            RelType::InCorpus => "IN_CORPUS",
            RelType::OnPlatform => "ON_PLATFORM",
            RelType::HasParentCode => "HAS_PARENT_CODE",
            RelType::HasCodename => "HAS_CODENAME",
            RelType::TaggedWith => "TAGGED_WITH",
            RelType::InCategory => "IN_CATEGORY",
            RelType::InGroup => "IN_GROUP",
            RelType::Other(s) => s,
        }
    }
}

impl From<&str> for RelType {
    fn from(s: &str) -> Self {
        match s {
            "CREATED" => RelType::Created,
            "ANNOTATES" => RelType::Annotates,
            "REFERS_TO" => RelType::RefersTo,
            "TALKED_TO" => RelType::TalkedTo,
            "QUOTED" => RelType::Quoted,
            "TALKED_OR_QUOTED" => RelType::TalkedOrQuoted,
            "LIKES" => RelType::Likes,
            "IN_TOPIC" => RelType::InTopic,
            "COOCCURS" => RelType::Cooccurs,
            "USED_CODE" => RelType::UsedCode,
            "IS_REPLY_TO" => RelType::IsReplyTo,
            "CONTAINS_QUOTE_FROM" => RelType::ContainsQuoteFrom,
            "IN_CORPUS" => RelType::InCorpus,
            "ON_PLATFORM" => RelType::OnPlatform,
            "HAS_PARENT_CODE" => RelType::HasParentCode,
            "HAS_CODENAME" => RelType::HasCodename,
            "TAGGED_WITH" => RelType::TaggedWith,
            "IN_CATEGORY" => RelType::InCategory,
            "IN_GROUP" => RelType::InGroup,
            other => RelType::Other(other.to_string()),
        }
    }
}

impl From<String> for RelType {
    fn from(s: String) -> Self {
        RelType::from(s.as_str())
    }
}

impl From<RelType> for String {
    fn from(rel: RelType) -> Self {
        match rel {
            RelType::Other(s) => s,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for RelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_parses_known_and_unknown_tags() {
        assert_eq!(Label::from("corpus_tag"), Label::CorpusTag);
        assert_eq!(Label::from("globaluser"), Label::GlobalUser);
        assert_eq!(Label::from("widget"), Label::Other("widget".into()));
    }

    #[test]
    fn label_serializes_as_tag_string() {
        let json = serde_json::to_string(&vec![Label::Code, Label::Other("x".into())]).unwrap();
        assert_eq!(json, r#"["code","x"]"#);
    }

    #[test]
    fn model_from_labels_requires_exactly_one_known_label() {
        assert_eq!(Model::from_labels(&[Label::Post]), Some(Model::Post));
        assert_eq!(
            Model::from_labels(&[Label::Platform, Label::Code]),
            Some(Model::Code)
        );
        assert_eq!(Model::from_labels(&[Label::Code, Label::Post]), None);
        assert_eq!(Model::from_labels(&[Label::Tag]), None);
        assert_eq!(Model::from_labels(std::iter::empty()), None);
    }

    #[test]
    fn rel_type_roundtrips_through_strings() {
        for tag in ["CREATED", "ANNOTATES", "REFERS_TO", "COOCCURS", "FOLLOWS"] {
            let rel = RelType::from(tag);
            assert_eq!(rel.as_str(), tag);
            assert_eq!(String::from(rel), tag);
        }
        assert_eq!(RelType::from("FOLLOWS"), RelType::Other("FOLLOWS".into()));
    }

    #[test]
    fn model_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Model::Annotation).unwrap(), "\"annotation\"");
        assert_eq!(Model::parse("user"), Some(Model::User));
        assert_eq!(Model::parse("tag"), None);
    }
}
