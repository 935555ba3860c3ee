// SPDX-License-Identifier: MIT OR Apache-2.0
//! Connection validation.
//!
//! A pure predicate over the graph passed in. It is consulted live while a
//! connection is being dragged and again when the drop is committed; only the
//! drop-time check may lead to a mutation. Nothing is cached between calls, so
//! the outgoing-edge check always sees the committed edge set.

use crate::edge::ConnectionCandidate;
use crate::graph::Graph;
use crate::handle::HandleId;
use crate::node::NodeId;
use crate::registry::NodeVariant;

/// Check a candidate and report why it is rejected
pub fn check_connection(
    graph: &Graph,
    candidate: &ConnectionCandidate,
) -> Result<(), ConnectionError> {
    resolve_endpoints(graph, candidate).map(|_| ())
}

/// Whether a candidate would be accepted
pub fn is_valid_connection(graph: &Graph, candidate: &ConnectionCandidate) -> bool {
    check_connection(graph, candidate).is_ok()
}

/// Run every rule and return the accepted `(source, target)` pair
pub(crate) fn resolve_endpoints(
    graph: &Graph,
    candidate: &ConnectionCandidate,
) -> Result<(NodeId, NodeId), ConnectionError> {
    let (Some(source), Some(target)) = (candidate.source, candidate.target) else {
        return Err(ConnectionError::MissingEndpoint);
    };

    let source_node = graph.node(source).ok_or(ConnectionError::NodeNotFound(source))?;
    let target_node = graph.node(target).ok_or(ConnectionError::NodeNotFound(target))?;

    if let Some(handle) = &candidate.source_handle {
        if !handle.is_source() {
            return Err(ConnectionError::InvalidSourceHandle(handle.clone()));
        }
    }
    if let Some(handle) = &candidate.target_handle {
        if !handle.is_target() {
            return Err(ConnectionError::InvalidTargetHandle(handle.clone()));
        }
    }

    if source == target {
        return Err(ConnectionError::SelfLoop);
    }

    if !source_node.capabilities().has_source_handles {
        return Err(ConnectionError::SourceNotAllowed(source_node.variant()));
    }
    if !target_node.capabilities().has_target_handles {
        return Err(ConnectionError::TargetNotAllowed(target_node.variant()));
    }

    // Fan-in is unbounded, fan-out is one.
    if graph.outgoing_edge(source).is_some() {
        return Err(ConnectionError::SourceAlreadyConnected(source));
    }

    Ok((source, target))
}

/// Reason a connection was refused
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConnectionError {
    /// Source or target is missing from the candidate
    #[error("Connection is missing an endpoint")]
    MissingEndpoint,

    /// Node not found
    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    /// Source handle is not tagged `*-source`
    #[error("Handle {0} is not a source handle")]
    InvalidSourceHandle(HandleId),

    /// Target handle is not tagged `*-target`
    #[error("Handle {0} is not a target handle")]
    InvalidTargetHandle(HandleId),

    /// Self-loop not allowed
    #[error("Self-loop not allowed")]
    SelfLoop,

    /// Source variant exposes no source handles
    #[error("A {0} node cannot be a connection source")]
    SourceNotAllowed(NodeVariant),

    /// Target variant exposes no target handles
    #[error("A {0} node cannot be a connection target")]
    TargetNotAllowed(NodeVariant),

    /// Source already has its single outgoing edge
    #[error("Node {0} already has an outgoing edge")]
    SourceAlreadyConnected(NodeId),

    /// Drop received while no gesture is active
    #[error("No connection gesture is active")]
    NoActiveGesture,
}
