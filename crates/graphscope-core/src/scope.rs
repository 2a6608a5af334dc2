//! Scope and the scope engine.
//!
//! A [`Scope`] pins node keys per entity type (`code`, `user`, `post`). The
//! [`ScopeEngine`] marks every node of a graph as in or out of *scope area*:
//!
//! - no scope, or an empty one: every node is in scope area;
//! - otherwise the rule depends on the node's model:
//!   - **code**: some annotation referring to it annotates posts that match
//!     the post scope and/or were created by a user of the user scope;
//!   - **user**: some post it created matches the post scope and/or is
//!     annotated with a code of the code scope;
//!   - **post**: it was created by a user of the user scope and/or is
//!     annotated with a code of the code scope;
//!   - every other node is in scope area.
//!
//! Only the dimensions that are set take part, and a rule whose dimensions
//! are all unset does not fire. The set dimensions are combined with
//! [`ScopeCombinator::All`] (the default) or [`ScopeCombinator::Any`].
//!
//! The engine reads nothing but the input graph and the scope: flags left on
//! the input by an earlier run are ignored, and the result is a new graph.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use petgraph::graph::NodeIndex;
use serde::{Deserialize, Serialize};

use crate::config::{EngineConfig, ScopeCombinator};
use crate::graph::PropertyGraph;
use crate::id::NodeKey;
use crate::types::{Model, RelType};

// ---------------------------------------------------------------------------
// Scope
// ---------------------------------------------------------------------------

/// Entity types a scope can pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScopeDimension {
    Code,
    User,
    Post,
}

impl ScopeDimension {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScopeDimension::Code => "code",
            ScopeDimension::User => "user",
            ScopeDimension::Post => "post",
        }
    }

    pub fn parse(s: &str) -> Option<ScopeDimension> {
        match s {
            "code" => Some(ScopeDimension::Code),
            "user" => Some(ScopeDimension::User),
            "post" => Some(ScopeDimension::Post),
            _ => None,
        }
    }
}

impl fmt::Display for ScopeDimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Node keys pinned per entity type.
///
/// Serializes as `{"code": [...], "user": [...], "post": [...]}`. Empty sets
/// are never stored, so "absent" and "empty" are the same state and
/// `Scope::default()` is the empty scope.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "BTreeMap<String, serde_json::Value>")]
pub struct Scope(BTreeMap<ScopeDimension, BTreeSet<NodeKey>>);

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The pinned keys of a dimension; `None` when the dimension is unset.
    pub fn get(&self, dim: ScopeDimension) -> Option<&BTreeSet<NodeKey>> {
        self.0.get(&dim)
    }

    pub fn contains(&self, dim: ScopeDimension, key: &str) -> bool {
        self.0.get(&dim).is_some_and(|keys| keys.contains(key))
    }

    /// Pins a key. Returns `true` if it was not pinned yet.
    pub fn insert(&mut self, dim: ScopeDimension, key: impl Into<NodeKey>) -> bool {
        self.0.entry(dim).or_default().insert(key.into())
    }

    /// Unpins a key, dropping the dimension when it becomes empty. Returns
    /// `true` if the key was pinned.
    pub fn remove(&mut self, dim: ScopeDimension, key: &str) -> bool {
        let Some(keys) = self.0.get_mut(&dim) else {
            return false;
        };
        let removed = keys.remove(key);
        if keys.is_empty() {
            self.0.remove(&dim);
        }
        removed
    }

    /// Replaces a whole dimension. An empty iterator unsets it.
    pub fn set(&mut self, dim: ScopeDimension, keys: impl IntoIterator<Item = NodeKey>) {
        let keys: BTreeSet<NodeKey> = keys.into_iter().collect();
        if keys.is_empty() {
            self.0.remove(&dim);
        } else {
            self.0.insert(dim, keys);
        }
    }

    /// Set dimensions with their keys, in dimension order.
    pub fn iter(&self) -> impl Iterator<Item = (ScopeDimension, &BTreeSet<NodeKey>)> + '_ {
        self.0.iter().map(|(dim, keys)| (*dim, keys))
    }
}

/// Lenient conversion used for deserialization: unknown entity types,
/// non-array values and non-string ids are ignored rather than rejected.
impl From<BTreeMap<String, serde_json::Value>> for Scope {
    fn from(raw: BTreeMap<String, serde_json::Value>) -> Self {
        let mut scope = Scope::default();
        for (name, value) in raw {
            let Some(dim) = ScopeDimension::parse(&name) else {
                tracing::debug!(dimension = %name, "ignoring unknown scope dimension");
                continue;
            };
            let Some(ids) = value.as_array() else {
                tracing::debug!(dimension = %name, "ignoring non-array scope dimension");
                continue;
            };
            scope.set(
                dim,
                ids.iter()
                    .filter_map(|id| id.as_str())
                    .map(NodeKey::from),
            );
        }
        scope
    }
}

// ---------------------------------------------------------------------------
// Scope engine
// ---------------------------------------------------------------------------

/// In-scope-area count for one model: "X of Y in scope".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeCount {
    pub in_scope: usize,
    pub total: usize,
}

/// Per-model in-scope-area counts. A node with several model labels counts
/// under each.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScopeCounts(BTreeMap<Model, ScopeCount>);

impl ScopeCounts {
    pub fn get(&self, model: Model) -> ScopeCount {
        self.0.get(&model).copied().unwrap_or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Model, ScopeCount)> + '_ {
        self.0.iter().map(|(model, count)| (*model, *count))
    }
}

/// A graph annotated with `inScopeArea` flags, plus its counts.
#[derive(Debug, Clone, Serialize)]
pub struct ScopedGraph {
    pub graph: PropertyGraph,
    pub counts: ScopeCounts,
}

/// Computes scope-area membership.
#[derive(Debug, Clone, Copy)]
pub struct ScopeEngine {
    combinator: ScopeCombinator,
}

impl ScopeEngine {
    pub fn new(config: &EngineConfig) -> Self {
        ScopeEngine {
            combinator: config.scope_combinator,
        }
    }

    pub fn with_combinator(combinator: ScopeCombinator) -> Self {
        ScopeEngine { combinator }
    }

    /// Returns an annotated copy of `graph` where every node carries an
    /// `inScopeArea` flag, together with per-model counts.
    pub fn apply(&self, graph: &PropertyGraph, scope: Option<&Scope>) -> ScopedGraph {
        let scope = scope.filter(|s| !s.is_empty());
        let rules = scope.map(|scope| Rules {
            graph,
            scope,
            combinator: self.combinator,
        });

        // Evaluate against the input graph only, then write the flags.
        let flags: Vec<(NodeIndex<u32>, bool)> = graph
            .node_indices()
            .map(|idx| {
                let in_scope = rules.as_ref().map_or(true, |r| r.in_scope_area(idx));
                (idx, in_scope)
            })
            .collect();

        let mut annotated = graph.clone();
        let mut counts: BTreeMap<Model, ScopeCount> = BTreeMap::new();
        for (idx, in_scope) in flags {
            let Some(node) = annotated.node_weight_mut(idx) else {
                continue;
            };
            node.attributes.in_scope_area = Some(in_scope);
            for model in node.models() {
                let count = counts.entry(model).or_default();
                count.total += 1;
                if in_scope {
                    count.in_scope += 1;
                }
            }
        }

        tracing::debug!(
            nodes = annotated.node_count(),
            scoped = scope.is_some(),
            "applied scope"
        );
        ScopedGraph {
            graph: annotated,
            counts: ScopeCounts(counts),
        }
    }
}

/// The per-model membership rules for one (graph, scope) pair.
struct Rules<'a> {
    graph: &'a PropertyGraph,
    scope: &'a Scope,
    combinator: ScopeCombinator,
}

impl Rules<'_> {
    fn in_scope_area(&self, idx: NodeIndex<u32>) -> bool {
        let Some(model) = self.graph.node_at(idx).and_then(|n| n.model()) else {
            return true;
        };
        match model {
            Model::Code => self.code_rule(idx),
            Model::User => self.user_rule(idx),
            Model::Post => self.post_rule(idx),
            Model::Topic | Model::Annotation => true,
        }
    }

    fn code_rule(&self, code: NodeIndex<u32>) -> bool {
        let posts = self.scope.get(ScopeDimension::Post);
        let users = self.scope.get(ScopeDimension::User);
        if posts.is_none() && users.is_none() {
            return true;
        }
        self.graph
            .sources(code, RelType::RefersTo)
            .filter(|&a| self.graph.is_model(a, Model::Annotation))
            .any(|annotation| {
                let annotated: Vec<NodeIndex<u32>> =
                    self.graph.targets(annotation, RelType::Annotates).collect();
                let post_ok =
                    posts.map(|keys| annotated.iter().any(|&p| self.pinned(keys, p)));
                let user_ok =
                    users.map(|keys| annotated.iter().any(|&p| self.created_by(p, keys)));
                self.combine([post_ok, user_ok])
            })
    }

    fn user_rule(&self, user: NodeIndex<u32>) -> bool {
        let posts = self.scope.get(ScopeDimension::Post);
        let codes = self.scope.get(ScopeDimension::Code);
        if posts.is_none() && codes.is_none() {
            return true;
        }
        self.graph
            .targets(user, RelType::Created)
            .filter(|&p| self.graph.is_model(p, Model::Post))
            .any(|post| {
                let post_ok = posts.map(|keys| self.pinned(keys, post));
                let code_ok = codes.map(|keys| self.annotated_with(post, keys));
                self.combine([post_ok, code_ok])
            })
    }

    fn post_rule(&self, post: NodeIndex<u32>) -> bool {
        let users = self.scope.get(ScopeDimension::User);
        let codes = self.scope.get(ScopeDimension::Code);
        if users.is_none() && codes.is_none() {
            return true;
        }
        let user_ok = users.map(|keys| self.created_by(post, keys));
        let code_ok = codes.map(|keys| self.annotated_with(post, keys));
        self.combine([user_ok, code_ok])
    }

    /// Combines the conditions of the set dimensions (`None` = unset).
    fn combine<const N: usize>(&self, conditions: [Option<bool>; N]) -> bool {
        let mut active = conditions.into_iter().flatten().peekable();
        if active.peek().is_none() {
            return true;
        }
        match self.combinator {
            ScopeCombinator::All => active.all(|ok| ok),
            ScopeCombinator::Any => active.any(|ok| ok),
        }
    }

    fn pinned(&self, keys: &BTreeSet<NodeKey>, idx: NodeIndex<u32>) -> bool {
        self.graph
            .node_at(idx)
            .is_some_and(|node| keys.contains(&node.key))
    }

    /// `post` was created by one of the pinned users.
    fn created_by(&self, post: NodeIndex<u32>, users: &BTreeSet<NodeKey>) -> bool {
        self.graph
            .sources(post, RelType::Created)
            .any(|u| self.pinned(users, u))
    }

    /// `post` is annotated with one of the pinned codes.
    fn annotated_with(&self, post: NodeIndex<u32>, codes: &BTreeSet<NodeKey>) -> bool {
        self.graph
            .sources(post, RelType::Annotates)
            .flat_map(|a| self.graph.targets(a, RelType::RefersTo))
            .any(|c| self.pinned(codes, c))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edge::Edge;
    use crate::node::Node;
    use crate::types::Label;
    use serde_json::json;

    fn link(graph: &mut PropertyGraph, key: &str, from: &str, to: &str, rel: RelType) {
        graph
            .add_edge(&NodeKey::from(from), &NodeKey::from(to), Edge::new(key, rel))
            .unwrap();
    }

    /// Two users, two posts, two codes:
    /// u1 -CREATED-> p1 <-ANNOTATES- a1 -REFERS_TO-> c1
    /// u2 -CREATED-> p2 <-ANNOTATES- a2 -REFERS_TO-> c2
    /// plus a topic t1 holding both posts.
    fn forum() -> PropertyGraph {
        let mut graph = PropertyGraph::new();
        for (key, label) in [
            ("u1", Label::User),
            ("u2", Label::User),
            ("p1", Label::Post),
            ("p2", Label::Post),
            ("a1", Label::Annotation),
            ("a2", Label::Annotation),
            ("c1", Label::Code),
            ("c2", Label::Code),
            ("t1", Label::Topic),
        ] {
            graph.insert_node(Node::new(key, [label]));
        }
        link(&mut graph, "e1", "u1", "p1", RelType::Created);
        link(&mut graph, "e2", "u2", "p2", RelType::Created);
        link(&mut graph, "e3", "a1", "p1", RelType::Annotates);
        link(&mut graph, "e4", "a1", "c1", RelType::RefersTo);
        link(&mut graph, "e5", "a2", "p2", RelType::Annotates);
        link(&mut graph, "e6", "a2", "c2", RelType::RefersTo);
        link(&mut graph, "e7", "p1", "t1", RelType::InTopic);
        link(&mut graph, "e8", "p2", "t1", RelType::InTopic);
        graph
    }

    fn flags(scoped: &ScopedGraph) -> BTreeMap<String, bool> {
        scoped
            .graph
            .nodes()
            .map(|n| (n.key.to_string(), n.in_scope_area()))
            .collect()
    }

    fn scope(pairs: &[(ScopeDimension, &str)]) -> Scope {
        let mut scope = Scope::new();
        for (dim, key) in pairs {
            scope.insert(*dim, *key);
        }
        scope
    }

    fn engine() -> ScopeEngine {
        ScopeEngine::with_combinator(ScopeCombinator::All)
    }

    #[test]
    fn no_scope_marks_everything_in_scope() {
        let graph = forum();
        for scoped in [engine().apply(&graph, None), engine().apply(&graph, Some(&Scope::new()))] {
            assert!(scoped.graph.nodes().all(|n| n.attributes.in_scope_area == Some(true)));
            assert_eq!(scoped.counts.get(Model::Post), ScopeCount { in_scope: 2, total: 2 });
        }
    }

    #[test]
    fn code_scope_selects_posts_and_users() {
        let graph = forum();
        let scoped = engine().apply(&graph, Some(&scope(&[(ScopeDimension::Code, "c1")])));
        let f = flags(&scoped);
        assert!(f["p1"]);
        assert!(!f["p2"]);
        assert!(f["u1"]);
        assert!(!f["u2"]);
        // Code scope alone does not constrain codes, topics or annotations.
        assert!(f["c1"] && f["c2"] && f["t1"] && f["a2"]);
        assert_eq!(scoped.counts.get(Model::User), ScopeCount { in_scope: 1, total: 2 });
    }

    #[test]
    fn user_scope_selects_posts_and_codes() {
        let graph = forum();
        let scoped = engine().apply(&graph, Some(&scope(&[(ScopeDimension::User, "u2")])));
        let f = flags(&scoped);
        assert!(!f["p1"]);
        assert!(f["p2"]);
        assert!(!f["c1"]);
        assert!(f["c2"]);
        // User scope alone does not constrain users.
        assert!(f["u1"] && f["u2"]);
    }

    #[test]
    fn post_scope_selects_codes_and_users_but_not_posts() {
        let graph = forum();
        let scoped = engine().apply(&graph, Some(&scope(&[(ScopeDimension::Post, "p1")])));
        let f = flags(&scoped);
        assert!(f["c1"]);
        assert!(!f["c2"]);
        assert!(f["u1"]);
        assert!(!f["u2"]);
        assert!(f["p1"] && f["p2"]);
    }

    #[test]
    fn dimensions_combine_with_and_by_default() {
        let graph = forum();
        // u1 wrote p1 (annotated with c1); c2 is only on p2.
        let s = scope(&[(ScopeDimension::User, "u1"), (ScopeDimension::Code, "c2")]);
        let f = flags(&engine().apply(&graph, Some(&s)));
        assert!(!f["p1"]);
        assert!(!f["p2"]);

        let f = flags(&ScopeEngine::with_combinator(ScopeCombinator::Any).apply(&graph, Some(&s)));
        assert!(f["p1"]);
        assert!(f["p2"]);
    }

    #[test]
    fn stale_flags_on_input_are_ignored() {
        let graph = forum();
        let narrowed = engine().apply(&graph, Some(&scope(&[(ScopeDimension::Code, "c1")])));
        let widened = engine().apply(&narrowed.graph, None);
        assert!(widened.graph.nodes().all(|n| n.in_scope_area()));
        // And the input itself is untouched.
        assert!(graph.nodes().all(|n| n.attributes.in_scope_area.is_none()));
    }

    #[test]
    fn scope_insert_remove_keeps_no_empty_dimensions() {
        let mut s = Scope::new();
        assert!(s.insert(ScopeDimension::Post, "p1"));
        assert!(!s.insert(ScopeDimension::Post, "p1"));
        assert!(s.contains(ScopeDimension::Post, "p1"));
        assert!(s.remove(ScopeDimension::Post, "p1"));
        assert!(!s.remove(ScopeDimension::Post, "p1"));
        assert!(s.is_empty());
        assert_eq!(s, Scope::default());
    }

    #[test]
    fn multi_model_nodes_count_under_each_model() {
        let mut graph = forum();
        graph.insert_node(Node::new("cp", [Label::Code, Label::Post, Label::Code]));
        let scoped = engine().apply(&graph, Some(&scope(&[(ScopeDimension::User, "u1")])));
        // No single model, so no rule fires for it.
        assert!(flags(&scoped)["cp"]);
        assert_eq!(scoped.counts.get(Model::Code), ScopeCount { in_scope: 2, total: 3 });
        assert_eq!(scoped.counts.get(Model::Post), ScopeCount { in_scope: 2, total: 3 });
    }

    #[test]
    fn scope_deserializes_leniently() {
        let s: Scope = serde_json::from_value(json!({
            "code": ["c1", "c2", 7],
            "user": [],
            "post": "p1",
            "topic": ["t1"]
        }))
        .unwrap();
        assert_eq!(s.get(ScopeDimension::Code).map(|k| k.len()), Some(2));
        assert!(s.get(ScopeDimension::User).is_none());
        assert!(s.get(ScopeDimension::Post).is_none());
        assert_eq!(serde_json::to_value(&s).unwrap(), json!({"code": ["c1", "c2"]}));
    }
}
