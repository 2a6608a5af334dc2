//! Stable key newtypes for graph entities.
//!
//! Node and edge keys are opaque strings (raw storage-engine ids before
//! normalization, business ids such as `code_42` after). Both are distinct
//! newtype wrappers so that a `NodeKey` cannot be accidentally used where an
//! `EdgeKey` is expected.

use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Node identifier, unique within one graph instance.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeKey(pub String);

/// Edge identifier, unique within one graph instance.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EdgeKey(pub String);

impl NodeKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl EdgeKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// Display implementations -- just print the inner value.

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for EdgeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeKey {
    fn from(s: &str) -> Self {
        NodeKey(s.to_string())
    }
}

impl From<String> for NodeKey {
    fn from(s: String) -> Self {
        NodeKey(s)
    }
}

impl From<&str> for EdgeKey {
    fn from(s: &str) -> Self {
        EdgeKey(s.to_string())
    }
}

impl From<String> for EdgeKey {
    fn from(s: String) -> Self {
        EdgeKey(s)
    }
}

// Allows `HashMap<NodeKey, _>::get("code_1")` and friends.

impl Borrow<str> for NodeKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for EdgeKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn node_key_display() {
        assert_eq!(format!("{}", NodeKey::from("code_7")), "code_7");
    }

    #[test]
    fn edge_key_display() {
        assert_eq!(format!("{}", EdgeKey::from("99")), "99");
    }

    #[test]
    fn keys_serialize_as_plain_strings() {
        let json = serde_json::to_string(&NodeKey::from("post_1")).unwrap();
        assert_eq!(json, "\"post_1\"");
        let back: EdgeKey = serde_json::from_str("\"e1\"").unwrap();
        assert_eq!(back, EdgeKey::from("e1"));
    }

    #[test]
    fn borrowed_lookup_by_str() {
        let set: BTreeSet<NodeKey> = ["a", "b"].into_iter().map(NodeKey::from).collect();
        assert!(set.contains("a"));
        assert!(!set.contains("c"));
    }
}
