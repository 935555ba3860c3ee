// SPDX-License-Identifier: MIT OR Apache-2.0
//! Graph store holding nodes, edges and the active gesture marker.
//!
//! Every mutation either commits a state that satisfies all graph invariants
//! or is rejected without touching anything. Cascades (a branching node and
//! its children, edges of removed nodes) happen inside a single `&mut self`
//! call, so no caller can observe a half-applied removal.

use crate::edge::{ConnectionCandidate, Edge, EdgeId};
use crate::fanout::{self, FanoutError};
use crate::handle::HandleId;
use crate::node::{Node, NodeId, NodeKind};
use crate::registry::NodeVariant;
use crate::validation::{self, ConnectionError};
use indexmap::IndexMap;
use std::collections::{HashMap, HashSet};

/// A flow graph
#[derive(Debug, Clone, PartialEq)]
pub struct Graph {
    /// Graph name
    pub name: String,
    /// Nodes in insertion order
    nodes: IndexMap<NodeId, Node>,
    /// Edges in insertion order
    edges: IndexMap<EdgeId, Edge>,
    /// Source node of the connection currently being dragged
    connecting_from: Option<NodeId>,
}

/// Everything removed by a node deletion
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RemovedNodes {
    /// Removed nodes, the requested one first
    pub nodes: Vec<Node>,
    /// Edges removed because they touched a removed node
    pub edges: Vec<Edge>,
}

impl RemovedNodes {
    /// IDs of the removed nodes
    pub fn node_ids(&self) -> Vec<NodeId> {
        self.nodes.iter().map(|n| n.id).collect()
    }

    /// IDs of the removed edges
    pub fn edge_ids(&self) -> Vec<EdgeId> {
        self.edges.iter().map(|e| e.id).collect()
    }
}

impl Graph {
    /// Create a new empty graph
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            nodes: IndexMap::new(),
            edges: IndexMap::new(),
            connecting_from: None,
        }
    }

    /// Build a graph from stored parts, refusing anything inconsistent
    pub fn from_parts(
        name: impl Into<String>,
        nodes: Vec<Node>,
        edges: Vec<Edge>,
    ) -> Result<Self, InvariantViolation> {
        let mut graph = Self::new(name);
        for node in nodes {
            if graph.nodes.contains_key(&node.id) {
                return Err(InvariantViolation::DuplicateNode(node.id));
            }
            graph.nodes.insert(node.id, node);
        }
        for edge in edges {
            if graph.edges.contains_key(&edge.id) {
                return Err(InvariantViolation::DuplicateEdge(edge.id));
            }
            graph.edges.insert(edge.id, edge);
        }
        graph.check_invariants()?;
        Ok(graph)
    }

    /// Add a node to the graph
    ///
    /// A branching node gets its `output_count` children in the same step.
    /// Output children cannot be added directly.
    pub fn add_node(&mut self, node: Node) -> Result<NodeId, GraphError> {
        let id = node.id;
        if self.nodes.contains_key(&id) {
            return Err(GraphError::DuplicateNode(id));
        }
        if !is_finite(node.position) {
            return Err(GraphError::NonFinitePosition(id));
        }

        let spawn = match &node.kind {
            NodeKind::Single => None,
            NodeKind::Branching { output_count, config } => {
                if !config.output_count.is_well_formed() {
                    return Err(GraphError::InvalidBranchingConfig(id));
                }
                if !config.output_count.contains(*output_count) {
                    return Err(FanoutError::OutOfRange {
                        node: id,
                        requested: *output_count,
                        min: config.output_count.min,
                        max: config.output_count.max,
                    }
                    .into());
                }
                Some(*output_count)
            }
            NodeKind::BranchingOutput { .. } => return Err(GraphError::OutputChildNotInsertable),
        };

        self.nodes.insert(id, node);
        if let Some(count) = spawn {
            fanout::spawn_children(self, id, count);
        }
        tracing::trace!("Added node {id}");
        Ok(id)
    }

    /// Remove a node, cascading to its children and every touching edge
    ///
    /// Removing an output child directly is governed by the parent's
    /// child deletion policy.
    pub fn remove_node(&mut self, node_id: NodeId) -> Result<RemovedNodes, GraphError> {
        let node = self.nodes.get(&node_id).ok_or(GraphError::NodeNotFound(node_id))?;

        if node.variant() == NodeVariant::BranchingOutput {
            return Ok(fanout::remove_output_child(self, node_id)?);
        }

        let mut doomed = vec![node_id];
        doomed.extend(self.children_of(node_id).iter().map(|child| child.id));
        Ok(self.detach_nodes(&doomed))
    }

    /// Add an edge after validating it against the current edge set
    pub fn add_edge(&mut self, candidate: ConnectionCandidate) -> Result<EdgeId, ConnectionError> {
        let (source, target) = validation::resolve_endpoints(self, &candidate)?;
        let edge = candidate.into_edge(source, target);
        let id = edge.id;
        self.edges.insert(id, edge);
        tracing::trace!("Connected {source} -> {target}");
        Ok(id)
    }

    /// Remove an edge
    pub fn remove_edge(&mut self, edge_id: EdgeId) -> Option<Edge> {
        self.edges.shift_remove(&edge_id)
    }

    /// Move a node
    pub fn update_node_position(
        &mut self,
        node_id: NodeId,
        position: [f32; 2],
    ) -> Result<(), GraphError> {
        let node = self.nodes.get_mut(&node_id).ok_or(GraphError::NodeNotFound(node_id))?;
        if !is_finite(position) {
            return Err(GraphError::NonFinitePosition(node_id));
        }
        node.position = position;
        Ok(())
    }

    /// Change a node's display label
    pub fn set_node_label(
        &mut self,
        node_id: NodeId,
        label: impl Into<String>,
    ) -> Result<(), GraphError> {
        let node = self.nodes.get_mut(&node_id).ok_or(GraphError::NodeNotFound(node_id))?;
        node.label = label.into();
        Ok(())
    }

    /// Mark the node a connection drag starts from, or clear the marker
    pub fn set_connecting_from(&mut self, node_id: Option<NodeId>) -> Result<(), GraphError> {
        if let Some(id) = node_id {
            if !self.nodes.contains_key(&id) {
                return Err(GraphError::NodeNotFound(id));
            }
        }
        self.connecting_from = node_id;
        Ok(())
    }

    /// Clear the gesture marker
    pub fn clear_connecting_from(&mut self) {
        self.connecting_from = None;
    }

    /// Source node of the connection being dragged, if any
    pub fn connecting_from(&self) -> Option<NodeId> {
        self.connecting_from
    }

    /// Whether `node_id` is the source of the active drag
    pub fn is_connecting_source(&self, node_id: NodeId) -> bool {
        self.connecting_from == Some(node_id)
    }

    /// Get a node by ID
    pub fn node(&self, node_id: NodeId) -> Option<&Node> {
        self.nodes.get(&node_id)
    }

    /// Get all nodes
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Get all node IDs
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.keys().copied()
    }

    /// Get the number of nodes
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Get an edge by ID
    pub fn edge(&self, edge_id: EdgeId) -> Option<&Edge> {
        self.edges.get(&edge_id)
    }

    /// Get all edges
    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.values()
    }

    /// Get the number of edges
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// The single outgoing edge of a node
    pub fn outgoing_edge(&self, node_id: NodeId) -> Option<&Edge> {
        self.edges.values().find(|e| e.source == node_id)
    }

    /// Edges arriving at a node
    pub fn incoming_edges(&self, node_id: NodeId) -> impl Iterator<Item = &Edge> {
        self.edges.values().filter(move |e| e.target == node_id)
    }

    /// Edges touching a node
    pub fn edges_for_node(&self, node_id: NodeId) -> impl Iterator<Item = &Edge> {
        self.edges.values().filter(move |e| e.involves_node(node_id))
    }

    /// Output children of a branching node, ordered by index
    pub fn children_of(&self, parent: NodeId) -> Vec<&Node> {
        let mut children: Vec<&Node> = self
            .nodes
            .values()
            .filter(|n| n.parent() == Some(parent))
            .collect();
        children.sort_by_key(|n| n.child_index());
        children
    }

    pub(crate) fn insert_child(&mut self, child: Node) {
        self.nodes.insert(child.id, child);
    }

    pub(crate) fn write_output_count(&mut self, node_id: NodeId, count: u32) {
        if let Some(Node {
            kind: NodeKind::Branching { output_count, .. },
            ..
        }) = self.nodes.get_mut(&node_id)
        {
            *output_count = count;
        }
    }

    /// Remove nodes and every edge touching them in one step.
    pub(crate) fn detach_nodes(&mut self, ids: &[NodeId]) -> RemovedNodes {
        let doomed: HashSet<NodeId> = ids.iter().copied().collect();

        let mut removed = RemovedNodes::default();
        self.edges.retain(|_, edge| {
            let keep = !doomed.contains(&edge.source) && !doomed.contains(&edge.target);
            if !keep {
                removed.edges.push(edge.clone());
            }
            keep
        });
        for id in ids {
            if let Some(node) = self.nodes.shift_remove(id) {
                removed.nodes.push(node);
            }
        }

        if self.connecting_from.is_some_and(|id| doomed.contains(&id)) {
            self.connecting_from = None;
        }

        tracing::trace!(
            "Removed {} node(s) and {} edge(s)",
            removed.nodes.len(),
            removed.edges.len()
        );
        removed
    }

    /// Verify every structural invariant of the graph
    pub fn check_invariants(&self) -> Result<(), InvariantViolation> {
        let mut sources = HashSet::new();
        for edge in self.edges.values() {
            for endpoint in [edge.source, edge.target] {
                if !self.nodes.contains_key(&endpoint) {
                    return Err(InvariantViolation::DanglingReference {
                        from: Reference::Edge(edge.id),
                        missing: endpoint,
                    });
                }
            }
            if edge.source == edge.target {
                return Err(InvariantViolation::SelfLoop(edge.id));
            }
            if !sources.insert(edge.source) {
                return Err(InvariantViolation::MultipleOutgoing(edge.source));
            }
            check_handle(edge.id, edge.source_handle.as_ref(), HandleId::is_source)?;
            check_handle(edge.id, edge.target_handle.as_ref(), HandleId::is_target)?;

            let source = &self.nodes[&edge.source];
            if source.is_branching() {
                return Err(InvariantViolation::BranchingSource(edge.id));
            }
            if !source.capabilities().has_source_handles {
                return Err(InvariantViolation::CapabilityMismatch {
                    edge: edge.id,
                    node: edge.source,
                    variant: source.variant(),
                });
            }
            let target = &self.nodes[&edge.target];
            if !target.capabilities().has_target_handles {
                return Err(InvariantViolation::CapabilityMismatch {
                    edge: edge.id,
                    node: edge.target,
                    variant: target.variant(),
                });
            }
        }

        if let Some(node) = self.nodes.values().find(|n| !is_finite(n.position)) {
            return Err(InvariantViolation::NonFinitePosition(node.id));
        }

        let mut child_counts: HashMap<NodeId, u32> = HashMap::new();
        let mut child_indices = HashSet::new();
        for node in self.nodes.values() {
            let NodeKind::BranchingOutput { parent, index } = node.kind else {
                continue;
            };
            if !self.nodes.get(&parent).is_some_and(Node::is_branching) {
                return Err(InvariantViolation::DanglingReference {
                    from: Reference::Child(node.id),
                    missing: parent,
                });
            }
            if !child_indices.insert((parent, index)) {
                return Err(InvariantViolation::DuplicateChildIndex { parent, index });
            }
            *child_counts.entry(parent).or_default() += 1;
        }

        for node in self.nodes.values() {
            let NodeKind::Branching { output_count, config } = &node.kind else {
                continue;
            };
            if !config.output_count.contains(*output_count) {
                return Err(InvariantViolation::OutputCountOutOfRange {
                    node: node.id,
                    count: *output_count,
                });
            }
            let actual = child_counts.get(&node.id).copied().unwrap_or(0);
            if actual != *output_count {
                return Err(InvariantViolation::ChildCountMismatch {
                    node: node.id,
                    declared: *output_count,
                    actual,
                });
            }
        }

        if let Some(id) = self.connecting_from {
            if !self.nodes.contains_key(&id) {
                return Err(InvariantViolation::DanglingReference {
                    from: Reference::Gesture,
                    missing: id,
                });
            }
        }

        Ok(())
    }
}

fn is_finite(position: [f32; 2]) -> bool {
    position.iter().all(|c| c.is_finite())
}

fn check_handle(
    edge: EdgeId,
    handle: Option<&HandleId>,
    tagged: fn(&HandleId) -> bool,
) -> Result<(), InvariantViolation> {
    match handle {
        Some(handle) if !tagged(handle) => Err(InvariantViolation::MisTaggedHandle {
            edge,
            handle: handle.clone(),
        }),
        _ => Ok(()),
    }
}

impl Default for Graph {
    fn default() -> Self {
        Self::new("Untitled")
    }
}

/// Error when mutating the graph
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    /// Node not found
    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    /// A node with this ID already exists
    #[error("Duplicate node: {0}")]
    DuplicateNode(NodeId),

    /// Output children are created by the fan-out controller only
    #[error("Branching output nodes cannot be added directly")]
    OutputChildNotInsertable,

    /// Branching node carries bounds with `min > max`
    #[error("Invalid output count bounds on node {0}")]
    InvalidBranchingConfig(NodeId),

    /// Position with a NaN or infinite coordinate
    #[error("Node {0} cannot be placed at a non-finite position")]
    NonFinitePosition(NodeId),

    /// Fan-out rejection
    #[error(transparent)]
    Fanout(#[from] FanoutError),
}

/// Owner of a reference found dangling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reference {
    /// An edge endpoint
    Edge(EdgeId),
    /// An output child's parent link
    Child(NodeId),
    /// The active gesture marker
    Gesture,
}

/// A broken graph invariant
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvariantViolation {
    /// Two nodes share an ID
    #[error("Duplicate node: {0}")]
    DuplicateNode(NodeId),

    /// Two edges share an ID
    #[error("Duplicate edge: {0:?}")]
    DuplicateEdge(EdgeId),

    /// Something references a node that does not exist
    #[error("{from:?} references missing node {missing}")]
    DanglingReference {
        /// Holder of the reference
        from: Reference,
        /// Node that is gone
        missing: NodeId,
    },

    /// Edge from a node to itself
    #[error("Edge {0:?} is a self-loop")]
    SelfLoop(EdgeId),

    /// Node with more than one outgoing edge
    #[error("Node {0} has more than one outgoing edge")]
    MultipleOutgoing(NodeId),

    /// Handle with the wrong role suffix
    #[error("Edge {edge:?} uses mis-tagged handle {handle}")]
    MisTaggedHandle {
        /// Offending edge
        edge: EdgeId,
        /// Offending handle
        handle: HandleId,
    },

    /// Edge leaving a branching node directly
    #[error("Edge {0:?} leaves a branching node")]
    BranchingSource(EdgeId),

    /// Edge endpoint whose variant lacks the needed handles
    #[error("Edge {edge:?} uses node {node} ({variant}) in a role it does not support")]
    CapabilityMismatch {
        /// Offending edge
        edge: EdgeId,
        /// Endpoint node
        node: NodeId,
        /// Endpoint variant
        variant: NodeVariant,
    },

    /// Node placed at a NaN or infinite coordinate
    #[error("Node {0} has a non-finite position")]
    NonFinitePosition(NodeId),

    /// Two children of one parent share an index
    #[error("Node {parent} has two children with index {index}")]
    DuplicateChildIndex {
        /// Branching node
        parent: NodeId,
        /// Repeated index
        index: u32,
    },

    /// Declared output count outside the module bounds
    #[error("Node {node} declares {count} outputs, outside its bounds")]
    OutputCountOutOfRange {
        /// Branching node
        node: NodeId,
        /// Declared count
        count: u32,
    },

    /// Declared output count differs from the number of children
    #[error("Node {node} declares {declared} outputs but has {actual} children")]
    ChildCountMismatch {
        /// Branching node
        node: NodeId,
        /// Declared count
        declared: u32,
        /// Children present
        actual: u32,
    },
}
