// SPDX-License-Identifier: MIT OR Apache-2.0
//! Persisted flow documents.
//!
//! A document is `{nodes, edges}` plus a format version and the graph name.
//! JSON is the exchange format; RON is accepted too. Importing re-checks
//! every graph invariant, so a hand-edited file cannot smuggle in a broken
//! graph.

use crate::edge::Edge;
use crate::graph::{Graph, InvariantViolation};
use crate::node::Node;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Current document format version
pub const DOCUMENT_VERSION: u32 = 1;

fn default_version() -> u32 {
    DOCUMENT_VERSION
}

/// Serializable snapshot of a graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowDocument {
    /// Format version
    #[serde(default = "default_version")]
    pub version: u32,
    /// Graph name
    #[serde(default)]
    pub name: String,
    /// Nodes in graph order
    pub nodes: Vec<Node>,
    /// Edges in graph order
    pub edges: Vec<Edge>,
}

impl FlowDocument {
    /// Serialize as pretty JSON
    pub fn to_json(&self) -> Result<String, DocumentError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse JSON
    pub fn from_json(source: &str) -> Result<Self, DocumentError> {
        Ok(serde_json::from_str(source)?)
    }

    /// Serialize as pretty RON
    pub fn to_ron(&self) -> Result<String, DocumentError> {
        let config = ron::ser::PrettyConfig::default().enumerate_arrays(false);
        Ok(ron::ser::to_string_pretty(self, config)?)
    }

    /// Parse RON
    pub fn from_ron(source: &str) -> Result<Self, DocumentError> {
        Ok(ron::from_str(source)?)
    }

    /// Read a document, choosing the format from the file extension
    pub fn load(path: &Path) -> Result<Self, DocumentError> {
        let content = std::fs::read_to_string(path)?;
        let document = if is_ron(path) {
            Self::from_ron(&content)?
        } else {
            Self::from_json(&content)?
        };
        tracing::info!(
            "Read {} node(s) and {} edge(s) from {}",
            document.nodes.len(),
            document.edges.len(),
            path.display()
        );
        Ok(document)
    }

    /// Write a document, choosing the format from the file extension
    pub fn save(&self, path: &Path) -> Result<(), DocumentError> {
        let content = if is_ron(path) {
            self.to_ron()?
        } else {
            self.to_json()?
        };
        std::fs::write(path, content)?;
        Ok(())
    }
}

fn is_ron(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("ron"))
}

impl Graph {
    /// Snapshot the graph as a document
    pub fn to_document(&self) -> FlowDocument {
        FlowDocument {
            version: DOCUMENT_VERSION,
            name: self.name.clone(),
            nodes: self.nodes().cloned().collect(),
            edges: self.edges().cloned().collect(),
        }
    }

    /// Rebuild a graph from a document, checking every invariant
    pub fn from_document(document: FlowDocument) -> Result<Self, DocumentError> {
        if document.version > DOCUMENT_VERSION {
            return Err(DocumentError::UnsupportedVersion {
                found: document.version,
                supported: DOCUMENT_VERSION,
            });
        }
        Ok(Graph::from_parts(document.name, document.nodes, document.edges)?)
    }
}

/// Error when reading or writing a document
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    /// File could not be read or written
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// RON parse error
    #[error("RON parse error: {0}")]
    RonParse(#[from] ron::error::SpannedError),

    /// RON serialization error
    #[error("RON error: {0}")]
    Ron(#[from] ron::Error),

    /// Document written by a newer format
    #[error("Document version {found} is newer than supported version {supported}")]
    UnsupportedVersion {
        /// Version in the document
        found: u32,
        /// Newest supported version
        supported: u32,
    },

    /// Document describes an inconsistent graph
    #[error("Invalid graph: {0}")]
    Invariant(#[from] InvariantViolation),
}
