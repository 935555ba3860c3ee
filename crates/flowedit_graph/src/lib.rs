// SPDX-License-Identifier: MIT OR Apache-2.0
//! Graph connection engine for the FlowEdit flow editor.
//!
//! Flows are directed graphs of typed nodes picked from a module catalog.
//! This crate holds everything that decides what a flow may look like while
//! it is being edited:
//! - Node, edge and handle data model
//! - Node-type registry with per-variant capabilities
//! - Connection validation (one outgoing edge per node, tagged handles)
//! - The connection drag state machine
//! - Branching fan-out: generated output children kept in step with a count
//! - Change notification, documents and the minimap projection
//!
//! ## Architecture
//!
//! [`Graph`] is the store and enforces every invariant on each mutation.
//! [`FlowSession`] wraps it as the single writer: it runs the gesture machine
//! and the fan-out controller against the graph and tells subscribers what
//! changed. Renderers only ever read.

pub mod handle;
pub mod registry;
pub mod node;
pub mod edge;
pub mod validation;
pub mod graph;
pub mod gesture;
pub mod fanout;
pub mod catalog;
pub mod events;
pub mod session;
pub mod minimap;
pub mod document;

pub use catalog::{default_catalog, ModuleCatalog, ModuleDefinition};
pub use document::FlowDocument;
pub use edge::{ConnectionCandidate, Edge, EdgeId};
pub use events::GraphEvent;
pub use gesture::ConnectionGesture;
pub use graph::{Graph, GraphError, InvariantViolation};
pub use handle::{HandleId, HandlePosition, HandleRole};
pub use node::{BranchingConfig, ChildDeletionPolicy, Node, NodeId, NodeKind, OutputCountConfig};
pub use registry::{capabilities_of, CapabilityRecord, NodeVariant};
pub use session::FlowSession;
pub use validation::{is_valid_connection, ConnectionError};
