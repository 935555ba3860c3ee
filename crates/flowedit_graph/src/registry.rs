// SPDX-License-Identifier: MIT OR Apache-2.0
//! Node-type registry.
//!
//! The set of node variants is closed. Each variant has one static
//! [`CapabilityRecord`] describing which handles it exposes and whether a
//! connection gesture may start from it. String tags coming from catalogs or
//! documents are checked against the closed set before any node is built.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Closed set of node-type variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeVariant {
    /// Plain node with one outgoing edge at most
    Single,
    /// Node that fans out through generated output children
    Branching,
    /// Generated child of a branching node
    BranchingOutput,
}

impl NodeVariant {
    /// All variants in registry order
    pub const ALL: [NodeVariant; 3] = [Self::Single, Self::Branching, Self::BranchingOutput];

    /// Tag used in catalogs and documents
    pub fn tag(self) -> &'static str {
        match self {
            Self::Single => "single",
            Self::Branching => "branching",
            Self::BranchingOutput => "branching_output",
        }
    }
}

impl fmt::Display for NodeVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.tag())
    }
}

impl FromStr for NodeVariant {
    type Err = RegistryError;

    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|variant| variant.tag() == tag)
            .ok_or_else(|| RegistryError::UnknownNodeType(tag.to_string()))
    }
}

/// What a node variant is allowed to do with connections
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapabilityRecord {
    /// Variant this record describes
    pub variant: NodeVariant,
    /// Exposes `*-target` handles
    pub has_target_handles: bool,
    /// Exposes `*-source` handles
    pub has_source_handles: bool,
    /// A connection drag may start from one of its source handles
    pub can_initiate: bool,
    /// Styling class for the renderer
    pub class_name: &'static str,
}

static CAPABILITIES: [CapabilityRecord; 3] = [
    CapabilityRecord {
        variant: NodeVariant::Single,
        has_target_handles: true,
        has_source_handles: true,
        can_initiate: true,
        class_name: "single-node",
    },
    // Branching nodes route only through their children.
    CapabilityRecord {
        variant: NodeVariant::Branching,
        has_target_handles: true,
        has_source_handles: false,
        can_initiate: false,
        class_name: "branching-node",
    },
    CapabilityRecord {
        variant: NodeVariant::BranchingOutput,
        has_target_handles: false,
        has_source_handles: true,
        can_initiate: true,
        class_name: "branching-output-node",
    },
];

/// Capabilities of a variant
pub fn capabilities_of(variant: NodeVariant) -> &'static CapabilityRecord {
    match variant {
        NodeVariant::Single => &CAPABILITIES[0],
        NodeVariant::Branching => &CAPABILITIES[1],
        NodeVariant::BranchingOutput => &CAPABILITIES[2],
    }
}

/// Capabilities of a variant given by its string tag
///
/// An unknown tag is not fatal: callers skip the node or refuse the module.
pub fn capabilities_of_tag(tag: &str) -> Result<&'static CapabilityRecord, RegistryError> {
    let variant = tag.parse::<NodeVariant>()?;
    Ok(capabilities_of(variant))
}

/// Registry lookup failure
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// Tag is not one of the registered variants
    #[error("Unknown node type: {0}")]
    UnknownNodeType(String),
}
