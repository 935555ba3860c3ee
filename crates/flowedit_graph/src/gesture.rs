// SPDX-License-Identifier: MIT OR Apache-2.0
//! Connection drag state machine.
//!
//! `Idle --begin_drag--> Dragging --drop/cancel--> Idle`. Only one gesture can
//! be active; every way out of `Dragging` clears the graph's
//! `connecting_from` marker.

use crate::edge::{ConnectionCandidate, EdgeId};
use crate::graph::Graph;
use crate::handle::HandleId;
use crate::node::NodeId;
use crate::validation::{self, ConnectionError};

/// State of the connection gesture
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ConnectionGesture {
    /// No drag in progress
    #[default]
    Idle,
    /// A connection is being dragged out of a source handle
    Dragging {
        /// Node the drag started on
        source: NodeId,
        /// Handle the drag started on
        source_handle: HandleId,
    },
}

impl ConnectionGesture {
    /// Create an idle gesture
    pub fn new() -> Self {
        Self::Idle
    }

    /// Whether a drag is in progress
    pub fn is_dragging(&self) -> bool {
        matches!(self, Self::Dragging { .. })
    }

    /// Source node of the active drag
    pub fn source(&self) -> Option<NodeId> {
        match self {
            Self::Idle => None,
            Self::Dragging { source, .. } => Some(*source),
        }
    }

    /// Start dragging a connection out of `handle` on `node`
    ///
    /// Returns `false` and changes nothing when a drag is already active, when
    /// the handle is not a source handle, or when the node cannot start
    /// connections.
    pub fn begin_drag(&mut self, graph: &mut Graph, node: NodeId, handle: HandleId) -> bool {
        if let Self::Dragging { source, .. } = self {
            tracing::debug!("Ignoring drag from {node}: drag from {source} already active");
            return false;
        }
        if !handle.is_source() {
            tracing::debug!("Ignoring drag from non-source handle {handle}");
            return false;
        }
        let can_initiate = graph
            .node(node)
            .is_some_and(|n| n.capabilities().can_initiate);
        if !can_initiate || graph.set_connecting_from(Some(node)).is_err() {
            tracing::debug!("Node {node} cannot start a connection");
            return false;
        }

        *self = Self::Dragging {
            source: node,
            source_handle: handle,
        };
        true
    }

    /// Candidate from the drag source to the given target
    pub fn candidate(
        &self,
        target: Option<NodeId>,
        target_handle: Option<HandleId>,
    ) -> Option<ConnectionCandidate> {
        match self {
            Self::Idle => None,
            Self::Dragging {
                source,
                source_handle,
            } => Some(ConnectionCandidate {
                source: Some(*source),
                source_handle: Some(source_handle.clone()),
                target,
                target_handle,
            }),
        }
    }

    /// Live check while hovering a target; never mutates
    pub fn preview(
        &self,
        graph: &Graph,
        target: Option<NodeId>,
        target_handle: Option<HandleId>,
    ) -> bool {
        self.candidate(target, target_handle)
            .is_some_and(|candidate| validation::is_valid_connection(graph, &candidate))
    }

    /// Finish the drag with a drop
    ///
    /// The candidate is validated against the graph as it is now. An accepted
    /// candidate becomes an edge; either way the marker is cleared and the
    /// gesture returns to idle.
    pub fn drop_connection(
        &mut self,
        graph: &mut Graph,
        candidate: ConnectionCandidate,
    ) -> Result<EdgeId, ConnectionError> {
        if !self.is_dragging() {
            return Err(ConnectionError::NoActiveGesture);
        }
        let result = graph.add_edge(candidate);
        if let Err(err) = &result {
            tracing::debug!("Dropped connection rejected: {err}");
        }
        self.finish(graph);
        result
    }

    /// Drop onto a target, building the candidate from the drag source
    pub fn drop_on(
        &mut self,
        graph: &mut Graph,
        target: Option<NodeId>,
        target_handle: Option<HandleId>,
    ) -> Result<EdgeId, ConnectionError> {
        let candidate = self
            .candidate(target, target_handle)
            .ok_or(ConnectionError::NoActiveGesture)?;
        self.drop_connection(graph, candidate)
    }

    /// Abandon the drag
    ///
    /// Returns whether a drag was active. Safe to call at any time.
    pub fn cancel(&mut self, graph: &mut Graph) -> bool {
        let was_dragging = self.is_dragging();
        self.finish(graph);
        was_dragging
    }

    fn finish(&mut self, graph: &mut Graph) {
        graph.clear_connecting_from();
        *self = Self::Idle;
    }
}
