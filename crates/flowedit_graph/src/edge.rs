// SPDX-License-Identifier: MIT OR Apache-2.0
//! Edge definitions for the flow graph.

use crate::handle::HandleId;
use crate::node::NodeId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for an edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EdgeId(pub Uuid);

impl EdgeId {
    /// Create a new random edge ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for EdgeId {
    fn default() -> Self {
        Self::new()
    }
}

/// A directed edge between two node handles
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    /// Unique edge ID
    pub id: EdgeId,
    /// Source node ID
    pub source: NodeId,
    /// Source handle, tagged `*-source`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_handle: Option<HandleId>,
    /// Target node ID
    pub target: NodeId,
    /// Target handle, tagged `*-target`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_handle: Option<HandleId>,
}

impl Edge {
    /// Check if this edge touches a specific node
    pub fn involves_node(&self, node_id: NodeId) -> bool {
        self.source == node_id || self.target == node_id
    }
}

/// A prospective edge, as reported by a drag or drop
///
/// Endpoints are optional because a drop outside any node reports no target.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectionCandidate {
    /// Source node
    pub source: Option<NodeId>,
    /// Source handle
    pub source_handle: Option<HandleId>,
    /// Target node
    pub target: Option<NodeId>,
    /// Target handle
    pub target_handle: Option<HandleId>,
}

impl ConnectionCandidate {
    /// Candidate between two nodes without handles
    pub fn new(source: NodeId, target: NodeId) -> Self {
        Self {
            source: Some(source),
            target: Some(target),
            ..Self::default()
        }
    }

    /// Set the source handle
    pub fn with_source_handle(mut self, handle: impl Into<HandleId>) -> Self {
        self.source_handle = Some(handle.into());
        self
    }

    /// Set the target handle
    pub fn with_target_handle(mut self, handle: impl Into<HandleId>) -> Self {
        self.target_handle = Some(handle.into());
        self
    }

    /// Turn an accepted candidate into an edge with a fresh id
    pub(crate) fn into_edge(self, source: NodeId, target: NodeId) -> Edge {
        Edge {
            id: EdgeId::new(),
            source,
            source_handle: self.source_handle,
            target,
            target_handle: self.target_handle,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_involves_node() {
        let a = NodeId::new();
        let b = NodeId::new();
        let edge = ConnectionCandidate::new(a, b).into_edge(a, b);
        assert!(edge.involves_node(a));
        assert!(edge.involves_node(b));
        assert!(!edge.involves_node(NodeId::new()));
    }

    #[test]
    fn test_missing_handles_are_omitted_from_json() {
        let a = NodeId::new();
        let b = NodeId::new();
        let edge = ConnectionCandidate::new(a, b)
            .with_target_handle("left-target")
            .into_edge(a, b);
        let json = serde_json::to_value(&edge).unwrap();
        assert!(json.get("source_handle").is_none());
        assert_eq!(json["target_handle"], "left-target");
    }
}
