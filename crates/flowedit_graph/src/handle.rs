// SPDX-License-Identifier: MIT OR Apache-2.0
//! Handle definitions for node connection points.
//!
//! A handle id is a plain string such as `"right-source"`. Its suffix decides
//! the role; the prefix is the side of the node the handle sits on.

use serde::{Deserialize, Serialize};
use std::fmt;

const SOURCE_SUFFIX: &str = "-source";
const TARGET_SUFFIX: &str = "-target";

/// Side of the node a handle is drawn on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HandlePosition {
    /// Top edge
    Top,
    /// Right edge
    Right,
    /// Bottom edge
    Bottom,
    /// Left edge
    Left,
}

impl HandlePosition {
    /// All positions, clockwise from the top
    pub const ALL: [HandlePosition; 4] = [Self::Top, Self::Right, Self::Bottom, Self::Left];

    /// Tag used as the handle id prefix
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Top => "top",
            Self::Right => "right",
            Self::Bottom => "bottom",
            Self::Left => "left",
        }
    }
}

/// Role of a handle in a connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HandleRole {
    /// Edges leave through this handle
    Source,
    /// Edges arrive at this handle
    Target,
}

impl HandleRole {
    fn suffix(self) -> &'static str {
        match self {
            Self::Source => SOURCE_SUFFIX,
            Self::Target => TARGET_SUFFIX,
        }
    }
}

/// Identifier of a connection point on a node
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HandleId(String);

impl HandleId {
    /// Build the canonical id for a position and role, e.g. `right-source`
    pub fn new(position: HandlePosition, role: HandleRole) -> Self {
        Self(format!("{}{}", position.as_str(), role.suffix()))
    }

    /// Source handle on the given side
    pub fn source(position: HandlePosition) -> Self {
        Self::new(position, HandleRole::Source)
    }

    /// Target handle on the given side
    pub fn target(position: HandlePosition) -> Self {
        Self::new(position, HandleRole::Target)
    }

    /// Role fixed by the id's suffix, if it carries one
    pub fn role(&self) -> Option<HandleRole> {
        if self.0.ends_with(SOURCE_SUFFIX) {
            Some(HandleRole::Source)
        } else if self.0.ends_with(TARGET_SUFFIX) {
            Some(HandleRole::Target)
        } else {
            None
        }
    }

    /// Whether the id is tagged `*-source`
    pub fn is_source(&self) -> bool {
        self.role() == Some(HandleRole::Source)
    }

    /// Whether the id is tagged `*-target`
    pub fn is_target(&self) -> bool {
        self.role() == Some(HandleRole::Target)
    }

    /// Side of the node, when the prefix is one of the four known positions
    pub fn position(&self) -> Option<HandlePosition> {
        let role = self.role()?;
        let prefix = self.0.strip_suffix(role.suffix())?;
        HandlePosition::ALL.into_iter().find(|p| p.as_str() == prefix)
    }

    /// Raw id string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HandleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for HandleId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for HandleId {
    fn from(value: String) -> Self {
        Self(value)
    }
}
