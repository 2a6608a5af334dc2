//! Core error types for graphscope-core.
//!
//! Uses `thiserror` for structured, matchable error variants. Most anomalies
//! in the engine are data-quality conditions that are logged and routed
//! around; the variants here are what the graph container reports when an
//! insertion cannot be honoured, plus the one condition that does surface
//! to callers: a malformed input document.

use thiserror::Error;

use crate::id::{EdgeKey, NodeKey};

/// Errors produced by the graphscope-core crate.
#[derive(Debug, Error)]
pub enum GraphError {
    /// An edge references a node that is not present in the graph.
    #[error("edge '{edge}' references unknown endpoint '{endpoint}'")]
    UnknownEndpoint { edge: EdgeKey, endpoint: NodeKey },

    /// An edge with the same key already exists in the graph.
    #[error("duplicate edge key '{edge}' ({source_key} -> {target_key})")]
    DuplicateEdge {
        edge: EdgeKey,
        source_key: NodeKey,
        target_key: NodeKey,
    },

    /// The raw graph document cannot be turned into a graph at all.
    #[error("malformed graph input: {reason}")]
    MalformedGraphInput { reason: String },
}

impl GraphError {
    /// Returns `true` for the benign insertion failures the engine logs and
    /// skips, as opposed to input errors that must reach the caller.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            GraphError::UnknownEndpoint { .. } | GraphError::DuplicateEdge { .. }
        )
    }
}
