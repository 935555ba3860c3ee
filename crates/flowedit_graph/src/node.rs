// SPDX-License-Identifier: MIT OR Apache-2.0
//! Node definitions for the flow graph.

use crate::registry::{capabilities_of, CapabilityRecord, NodeVariant};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub Uuid);

impl NodeId {
    /// Create a new random node ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Allowed range for a branching node's output count
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputCountConfig {
    /// Smallest allowed count
    pub min: u32,
    /// Largest allowed count, unbounded when absent
    #[serde(default)]
    pub max: Option<u32>,
}

impl OutputCountConfig {
    /// Bounded range `[min, max]`
    pub fn new(min: u32, max: u32) -> Self {
        Self { min, max: Some(max) }
    }

    /// Range with no upper bound
    pub fn at_least(min: u32) -> Self {
        Self { min, max: None }
    }

    /// Whether `count` lies inside the range
    pub fn contains(&self, count: u32) -> bool {
        count >= self.min && self.max.map_or(true, |max| count <= max)
    }

    /// Whether `min <= max`
    pub fn is_well_formed(&self) -> bool {
        self.max.map_or(true, |max| self.min <= max)
    }
}

impl Default for OutputCountConfig {
    fn default() -> Self {
        Self::new(2, 8)
    }
}

/// What happens when a single output child is deleted directly
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChildDeletionPolicy {
    /// Children can only go away through an output count change
    #[default]
    Blocked,
    /// Deleting a child lowers the parent's output count with it
    DecrementParent,
}

/// Per-module configuration carried by every branching node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BranchingConfig {
    /// Output count bounds
    pub output_count: OutputCountConfig,
    /// Individual child deletion policy
    #[serde(default)]
    pub child_deletion: ChildDeletionPolicy,
}

/// Variant-specific node data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    /// Plain node
    Single,
    /// Fan-out node owning `output_count` children
    Branching {
        /// Declared number of output children
        output_count: u32,
        /// Bounds and deletion policy from the module
        config: BranchingConfig,
    },
    /// Generated output child of a branching node
    BranchingOutput {
        /// Owning branching node (lookup key only)
        parent: NodeId,
        /// Creation index under the parent, unique per parent
        index: u32,
    },
}

/// A node instance in the flow
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Unique instance ID
    pub id: NodeId,
    /// Variant and variant data
    pub kind: NodeKind,
    /// Display label
    pub label: String,
    /// Position in the editor canvas
    pub position: [f32; 2],
    /// Catalog module this node was created from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module: Option<String>,
}

impl Node {
    /// Create a plain node
    pub fn single(label: impl Into<String>) -> Self {
        Self::with_kind(NodeKind::Single, label)
    }

    /// Create a branching node starting at its minimum output count
    pub fn branching(label: impl Into<String>, config: BranchingConfig) -> Self {
        let output_count = config.output_count.min;
        Self::with_kind(NodeKind::Branching { output_count, config }, label)
    }

    /// Output children are only built by the fan-out controller.
    pub(crate) fn output_child(parent: NodeId, index: u32, position: [f32; 2]) -> Self {
        Self {
            id: NodeId::new(),
            kind: NodeKind::BranchingOutput { parent, index },
            label: format!("Output {}", index + 1),
            position,
            module: None,
        }
    }

    fn with_kind(kind: NodeKind, label: impl Into<String>) -> Self {
        Self {
            id: NodeId::new(),
            kind,
            label: label.into(),
            position: [0.0, 0.0],
            module: None,
        }
    }

    /// Set the position
    pub fn with_position(mut self, x: f32, y: f32) -> Self {
        self.position = [x, y];
        self
    }

    /// Record the catalog module
    pub fn with_module(mut self, module: impl Into<String>) -> Self {
        self.module = Some(module.into());
        self
    }

    /// Set the initial output count of a branching node
    ///
    /// Has no effect on other variants. The count is checked against the
    /// bounds when the node is added to a graph.
    pub fn with_output_count(mut self, count: u32) -> Self {
        if let NodeKind::Branching { output_count, .. } = &mut self.kind {
            *output_count = count;
        }
        self
    }

    /// Closed variant tag
    pub fn variant(&self) -> NodeVariant {
        match self.kind {
            NodeKind::Single => NodeVariant::Single,
            NodeKind::Branching { .. } => NodeVariant::Branching,
            NodeKind::BranchingOutput { .. } => NodeVariant::BranchingOutput,
        }
    }

    /// Capabilities of this node's variant
    pub fn capabilities(&self) -> &'static CapabilityRecord {
        capabilities_of(self.variant())
    }

    /// Whether this is a branching node
    pub fn is_branching(&self) -> bool {
        matches!(self.kind, NodeKind::Branching { .. })
    }

    /// Declared output count of a branching node
    pub fn output_count(&self) -> Option<u32> {
        match self.kind {
            NodeKind::Branching { output_count, .. } => Some(output_count),
            _ => None,
        }
    }

    /// Module configuration of a branching node
    pub fn branching_config(&self) -> Option<&BranchingConfig> {
        match &self.kind {
            NodeKind::Branching { config, .. } => Some(config),
            _ => None,
        }
    }

    /// Owning branching node of an output child
    pub fn parent(&self) -> Option<NodeId> {
        match self.kind {
            NodeKind::BranchingOutput { parent, .. } => Some(parent),
            _ => None,
        }
    }

    /// Creation index of an output child
    pub fn child_index(&self) -> Option<u32> {
        match self.kind {
            NodeKind::BranchingOutput { index, .. } => Some(index),
            _ => None,
        }
    }
}
