// SPDX-License-Identifier: MIT OR Apache-2.0
//! Branching fan-out controller.
//!
//! Keeps the set of output children of a branching node in step with its
//! declared `output_count`. Children are ordinary nodes that point back at
//! their parent by id; the parent never owns them.
//!
//! The count and the child set are written inside one `&mut Graph` call, so
//! readers only ever see them agree.

use crate::graph::{Graph, RemovedNodes};
use crate::node::{ChildDeletionPolicy, Node, NodeId, NodeKind};
use std::ops::Range;

/// Horizontal offset of children from their parent
pub const CHILD_OFFSET_X: f32 = 220.0;
/// Vertical offset of the first child from its parent
pub const CHILD_OFFSET_Y: f32 = 0.0;
/// Vertical distance between stacked children
pub const CHILD_SPACING_Y: f32 = 70.0;

/// Outcome of an output count change
#[derive(Debug, Clone, PartialEq)]
pub struct FanoutChange {
    /// Branching node
    pub node: NodeId,
    /// Count before the change
    pub previous: u32,
    /// Count after the change
    pub current: u32,
    /// Children created
    pub added: Vec<NodeId>,
    /// Children and edges removed
    pub removed: RemovedNodes,
}

/// Default position of the child with the given index under an unmoved parent
pub fn child_position(parent: [f32; 2], index: u32) -> [f32; 2] {
    [
        parent[0] + CHILD_OFFSET_X,
        parent[1] + CHILD_OFFSET_Y + index as f32 * CHILD_SPACING_Y,
    ]
}

/// Set the output count of a branching node and reconcile its children
///
/// Growing appends children after the highest existing index. Shrinking
/// removes the highest-index children first, along with their edges. A count
/// outside the module bounds changes nothing.
pub fn set_output_count(
    graph: &mut Graph,
    node_id: NodeId,
    new_count: u32,
) -> Result<FanoutChange, FanoutError> {
    let node = graph.node(node_id).ok_or(FanoutError::NodeNotFound(node_id))?;
    let NodeKind::Branching { output_count: previous, config } = node.kind else {
        return Err(FanoutError::NotBranching(node_id));
    };

    if !config.output_count.contains(new_count) {
        tracing::debug!(
            "Rejected output count {new_count} for {node_id} (min {}, max {:?})",
            config.output_count.min,
            config.output_count.max
        );
        return Err(FanoutError::OutOfRange {
            node: node_id,
            requested: new_count,
            min: config.output_count.min,
            max: config.output_count.max,
        });
    }

    let children: Vec<(NodeId, u32)> = graph
        .children_of(node_id)
        .iter()
        .map(|child| (child.id, child.child_index().unwrap_or(0)))
        .collect();
    let actual = children.len() as u32;

    let mut change = FanoutChange {
        node: node_id,
        previous,
        current: new_count,
        added: Vec::new(),
        removed: RemovedNodes::default(),
    };

    if new_count > actual {
        let first_index = match children.last() {
            Some((_, index)) => index.checked_add(1),
            None => Some(0),
        };
        let indices = first_index
            .and_then(|first| first.checked_add(new_count - actual).map(|end| first..end))
            .ok_or(FanoutError::IndexOverflow(node_id))?;
        change.added = spawn_children_from(graph, node_id, indices);
    } else if new_count < actual {
        let excess: Vec<NodeId> = children
            .iter()
            .rev()
            .take((actual - new_count) as usize)
            .map(|(id, _)| *id)
            .collect();
        change.removed = graph.detach_nodes(&excess);
    }
    graph.write_output_count(node_id, new_count);

    tracing::debug!("Output count of {node_id}: {previous} -> {new_count}");
    Ok(change)
}

/// Delete one output child directly, as allowed by its parent's policy
///
/// With [`ChildDeletionPolicy::DecrementParent`] the parent's count drops by
/// one in the same step; the call is refused if that would go below the
/// minimum. With [`ChildDeletionPolicy::Blocked`] the call is always refused.
pub fn remove_output_child(
    graph: &mut Graph,
    child_id: NodeId,
) -> Result<RemovedNodes, FanoutError> {
    let child = graph.node(child_id).ok_or(FanoutError::NodeNotFound(child_id))?;
    let parent_id = child.parent().ok_or(FanoutError::NotOutputChild(child_id))?;
    let parent = graph.node(parent_id).ok_or(FanoutError::NodeNotFound(parent_id))?;
    let NodeKind::Branching { output_count, config } = parent.kind else {
        return Err(FanoutError::NotBranching(parent_id));
    };

    match config.child_deletion {
        ChildDeletionPolicy::Blocked => {
            tracing::debug!("Deletion of output {child_id} blocked by {parent_id}");
            Err(FanoutError::ChildDeletionBlocked(child_id))
        }
        ChildDeletionPolicy::DecrementParent => {
            let remaining = output_count.saturating_sub(1);
            if output_count == 0 || !config.output_count.contains(remaining) {
                return Err(FanoutError::OutOfRange {
                    node: parent_id,
                    requested: remaining,
                    min: config.output_count.min,
                    max: config.output_count.max,
                });
            }
            let removed = graph.detach_nodes(&[child_id]);
            graph.write_output_count(parent_id, remaining);
            tracing::debug!("Removed output {child_id}, {parent_id} now has {remaining}");
            Ok(removed)
        }
    }
}

/// Create the initial children of a freshly inserted branching node.
pub(crate) fn spawn_children(graph: &mut Graph, parent: NodeId, count: u32) -> Vec<NodeId> {
    spawn_children_from(graph, parent, 0..count)
}

/// New children stack below the highest-index child; the first ones sit at
/// their default position.
fn spawn_children_from(graph: &mut Graph, parent: NodeId, indices: Range<u32>) -> Vec<NodeId> {
    let Some(origin) = graph.node(parent).map(|n| n.position) else {
        return Vec::new();
    };
    let mut taken: Vec<[f32; 2]> = graph
        .children_of(parent)
        .iter()
        .map(|n| n.position)
        .collect();
    let mut slot = match taken.last() {
        Some(last) => [last[0], last[1] + CHILD_SPACING_Y],
        None => child_position(origin, indices.start),
    };

    let mut added = Vec::with_capacity(indices.len());
    for index in indices {
        slot = free_slot(&taken, slot);
        let child = Node::output_child(parent, index, slot);
        added.push(child.id);
        graph.insert_child(child);
        taken.push(slot);
        slot[1] += CHILD_SPACING_Y;
    }
    added
}

fn free_slot(taken: &[[f32; 2]], mut slot: [f32; 2]) -> [f32; 2] {
    for _ in 0..taken.len() {
        if !taken.contains(&slot) {
            break;
        }
        slot[1] += CHILD_SPACING_Y;
    }
    slot
}

/// Error when reconciling branching outputs
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FanoutError {
    /// Node not found
    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    /// Node is not a branching node
    #[error("Node {0} is not a branching node")]
    NotBranching(NodeId),

    /// Node is not a branching output child
    #[error("Node {0} is not a branching output")]
    NotOutputChild(NodeId),

    /// Requested count outside the module bounds
    #[error(
        "Output count {requested} for node {node} is outside [{min}, {}]",
        .max.map_or_else(|| "unbounded".to_string(), |m| m.to_string())
    )]
    OutOfRange {
        /// Branching node
        node: NodeId,
        /// Requested count
        requested: u32,
        /// Lower bound
        min: u32,
        /// Upper bound, if any
        max: Option<u32>,
    },

    /// Child indices of the node are exhausted
    #[error("Node {0} has no child indices left")]
    IndexOverflow(NodeId),

    /// The parent's policy forbids deleting single children
    #[error("Output {0} can only be removed by changing the output count")]
    ChildDeletionBlocked(NodeId),
}
