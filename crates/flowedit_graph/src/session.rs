// SPDX-License-Identifier: MIT OR Apache-2.0
//! Editing session.
//!
//! The session owns the graph, the connection gesture, the module catalog and
//! the subscribers. It is the only writer: every mutation goes through a
//! `&mut self` method, runs to completion, and then notifies subscribers.
//! Rejected input leaves the graph untouched and is reported as an `Err` the
//! UI is free to ignore.

use crate::catalog::{CatalogError, ModuleCatalog};
use crate::document::{DocumentError, FlowDocument};
use crate::edge::{ConnectionCandidate, Edge, EdgeId};
use crate::events::{EventBus, GraphEvent, SubscriptionId};
use crate::fanout::{self, FanoutChange, FanoutError};
use crate::gesture::ConnectionGesture;
use crate::graph::{Graph, GraphError, RemovedNodes};
use crate::handle::HandleId;
use crate::node::{Node, NodeId};
use crate::validation::ConnectionError;

/// Single-writer owner of an editable flow
#[derive(Debug)]
pub struct FlowSession {
    graph: Graph,
    gesture: ConnectionGesture,
    catalog: ModuleCatalog,
    events: EventBus,
}

impl FlowSession {
    /// Start an empty session
    pub fn new(catalog: ModuleCatalog) -> Self {
        Self::with_graph(catalog, Graph::default())
    }

    /// Start a session on an existing graph
    pub fn with_graph(catalog: ModuleCatalog, mut graph: Graph) -> Self {
        graph.clear_connecting_from();
        Self {
            graph,
            gesture: ConnectionGesture::new(),
            catalog,
            events: EventBus::new(),
        }
    }

    /// Read-only view for renderers
    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    /// Module catalog
    pub fn catalog(&self) -> &ModuleCatalog {
        &self.catalog
    }

    /// Current gesture state
    pub fn gesture(&self) -> &ConnectionGesture {
        &self.gesture
    }

    /// Be notified after every committed change
    pub fn subscribe<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: FnMut(&GraphEvent) + 'static,
    {
        self.events.subscribe(callback)
    }

    /// Stop notifications
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.events.unsubscribe(id)
    }

    /// Drop a catalog module onto the canvas
    pub fn add_module_node(
        &mut self,
        module_id: &str,
        position: [f32; 2],
    ) -> Result<NodeId, SessionError> {
        let node = self.catalog.create_node(module_id, position)?;
        Ok(self.add_node(node)?)
    }

    /// Insert a node built by the caller
    pub fn add_node(&mut self, node: Node) -> Result<NodeId, GraphError> {
        let id = self.graph.add_node(node).inspect_err(|err| {
            tracing::debug!("Rejected node: {err}");
        })?;
        let children = self.graph.children_of(id).iter().map(|n| n.id).collect();
        self.events.emit(&GraphEvent::NodeAdded { node: id, children });
        Ok(id)
    }

    /// Delete a node with its cascade
    ///
    /// Deleting an output child that lowers its parent's count also reports
    /// the count change.
    pub fn remove_node(&mut self, node_id: NodeId) -> Result<RemovedNodes, GraphError> {
        let parent = self
            .graph
            .node(node_id)
            .and_then(Node::parent)
            .and_then(|p| Some((p, self.graph.node(p)?.output_count()?)));

        let removed = self.graph.remove_node(node_id).inspect_err(|err| {
            tracing::debug!("Rejected removal of {node_id}: {err}");
        })?;

        // A drag whose source just vanished cannot complete.
        if let Some(source) = self.gesture.source() {
            if removed.nodes.iter().any(|n| n.id == source) {
                self.cancel_gesture();
            }
        }

        self.events.emit(&GraphEvent::NodesRemoved {
            nodes: removed.node_ids(),
            edges: removed.edge_ids(),
        });

        if let Some((parent, previous)) = parent {
            if let Some(current) = self.graph.node(parent).and_then(Node::output_count) {
                self.events.emit(&GraphEvent::OutputCountChanged {
                    node: parent,
                    previous,
                    current,
                    added: Vec::new(),
                    removed: removed.node_ids(),
                });
            }
        }
        Ok(removed)
    }

    /// Delete an edge
    pub fn remove_edge(&mut self, edge_id: EdgeId) -> Option<Edge> {
        let edge = self.graph.remove_edge(edge_id)?;
        self.events.emit(&GraphEvent::EdgeRemoved { edge: edge_id });
        Some(edge)
    }

    /// Move a node
    pub fn move_node(&mut self, node_id: NodeId, position: [f32; 2]) -> Result<(), GraphError> {
        self.graph.update_node_position(node_id, position)?;
        self.events.emit(&GraphEvent::NodeMoved {
            node: node_id,
            position,
        });
        Ok(())
    }

    /// Rename a node
    pub fn rename_node(
        &mut self,
        node_id: NodeId,
        label: impl Into<String>,
    ) -> Result<(), GraphError> {
        self.graph.set_node_label(node_id, label)?;
        self.events.emit(&GraphEvent::NodeRelabeled { node: node_id });
        Ok(())
    }

    /// Start dragging a connection; ignored while another drag is active
    pub fn begin_drag(&mut self, node_id: NodeId, handle: HandleId) -> bool {
        let started = self.gesture.begin_drag(&mut self.graph, node_id, handle);
        if started {
            self.events.emit(&GraphEvent::GestureStarted { source: node_id });
        }
        started
    }

    /// Whether dropping on this target would be accepted right now
    pub fn preview(&self, target: Option<NodeId>, target_handle: Option<HandleId>) -> bool {
        self.gesture.preview(&self.graph, target, target_handle)
    }

    /// Drop the active drag onto a target
    pub fn drop_on(
        &mut self,
        target: Option<NodeId>,
        target_handle: Option<HandleId>,
    ) -> Result<EdgeId, ConnectionError> {
        let candidate = self
            .gesture
            .candidate(target, target_handle)
            .ok_or(ConnectionError::NoActiveGesture)?;
        self.drop_connection(candidate)
    }

    /// Drop the active drag with an explicit candidate
    pub fn drop_connection(
        &mut self,
        candidate: ConnectionCandidate,
    ) -> Result<EdgeId, ConnectionError> {
        let source = self.gesture.source().ok_or(ConnectionError::NoActiveGesture)?;
        let result = self.gesture.drop_connection(&mut self.graph, candidate);

        let edge = result.as_ref().ok().copied();
        if let Some(edge) = edge {
            self.events.emit(&GraphEvent::EdgeAdded { edge });
        }
        self.events.emit(&GraphEvent::GestureEnded { source, edge });
        result
    }

    /// Abandon the active drag, if any
    pub fn cancel_gesture(&mut self) -> bool {
        let source = self.gesture.source();
        let cancelled = self.gesture.cancel(&mut self.graph);
        if let Some(source) = source {
            self.events.emit(&GraphEvent::GestureEnded { source, edge: None });
        }
        cancelled
    }

    /// Change a branching node's output count
    pub fn set_output_count(
        &mut self,
        node_id: NodeId,
        count: u32,
    ) -> Result<FanoutChange, FanoutError> {
        let change = fanout::set_output_count(&mut self.graph, node_id, count)?;

        if let Some(source) = self.gesture.source() {
            if self.graph.node(source).is_none() {
                self.cancel_gesture();
            }
        }

        self.events.emit(&GraphEvent::OutputCountChanged {
            node: change.node,
            previous: change.previous,
            current: change.current,
            added: change.added.clone(),
            removed: change.removed.node_ids(),
        });
        Ok(change)
    }

    /// Replace the graph with an imported document
    ///
    /// The current graph is kept when the document is invalid.
    pub fn import(&mut self, document: FlowDocument) -> Result<(), DocumentError> {
        let graph = Graph::from_document(document)?;
        self.cancel_gesture();
        tracing::info!(
            "Imported flow {:?}: {} node(s), {} edge(s)",
            graph.name,
            graph.node_count(),
            graph.edge_count()
        );
        self.graph = graph;
        self.events.emit(&GraphEvent::GraphReplaced);
        Ok(())
    }

    /// Snapshot the graph for saving
    pub fn export(&self) -> FlowDocument {
        self.graph.to_document()
    }
}

impl Drop for FlowSession {
    fn drop(&mut self) {
        self.cancel_gesture();
    }
}

/// Error from session-level operations
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Catalog lookup failed
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// Graph rejected the change
    #[error(transparent)]
    Graph(#[from] GraphError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::default_catalog;
    use crate::handle::HandlePosition;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn recorded_session() -> (FlowSession, Rc<RefCell<Vec<GraphEvent>>>) {
        let mut session = FlowSession::new(default_catalog());
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&log);
        session.subscribe(move |event| sink.borrow_mut().push(event.clone()));
        (session, log)
    }

    fn right() -> HandleId {
        HandleId::source(HandlePosition::Right)
    }

    #[test]
    fn test_module_nodes_and_events() {
        let (mut session, log) = recorded_session();
        let router = session.add_module_node("router", [0.0, 0.0]).unwrap();
        assert_eq!(session.graph().children_of(router).len(), 2);

        match &log.borrow()[0] {
            GraphEvent::NodeAdded { node, children } => {
                assert_eq!(*node, router);
                assert_eq!(children.len(), 2);
            }
            other => panic!("unexpected event {other:?}"),
        }

        assert!(matches!(
            session.add_module_node("nope", [0.0, 0.0]),
            Err(SessionError::Catalog(CatalogError::UnknownModule(_)))
        ));
        assert_eq!(log.borrow().len(), 1);
    }

    #[test]
    fn test_full_gesture_flow() {
        let (mut session, log) = recorded_session();
        let source = session.add_module_node("source", [0.0, 0.0]).unwrap();
        let sink = session.add_module_node("sink", [300.0, 0.0]).unwrap();

        assert!(session.begin_drag(source, right()));
        assert!(session.graph().is_connecting_source(source));
        assert!(session.preview(Some(sink), None));

        let edge = session
            .drop_on(Some(sink), Some(HandleId::target(HandlePosition::Left)))
            .unwrap();
        assert_eq!(session.graph().connecting_from(), None);
        assert!(session.graph().edge(edge).is_some());

        let log = log.borrow();
        assert!(log.contains(&GraphEvent::EdgeAdded { edge }));
        assert_eq!(
            log.last(),
            Some(&GraphEvent::GestureEnded {
                source,
                edge: Some(edge),
            })
        );
    }

    #[test]
    fn test_removing_drag_source_cancels_gesture() {
        let (mut session, _) = recorded_session();
        let source = session.add_module_node("source", [0.0, 0.0]).unwrap();
        session.begin_drag(source, right());
        session.remove_node(source).unwrap();
        assert!(!session.gesture().is_dragging());
        assert_eq!(session.graph().connecting_from(), None);
    }

    #[test]
    fn test_shrinking_away_drag_source_cancels_gesture() {
        let (mut session, _) = recorded_session();
        let router = session.add_module_node("router", [0.0, 0.0]).unwrap();
        session.set_output_count(router, 3).unwrap();
        let last = session.graph().children_of(router)[2].id;
        assert!(session.begin_drag(last, right()));

        session.set_output_count(router, 2).unwrap();
        assert!(!session.gesture().is_dragging());
    }

    #[test]
    fn test_output_count_event() {
        let (mut session, log) = recorded_session();
        let router = session.add_module_node("router", [0.0, 0.0]).unwrap();
        session.set_output_count(router, 4).unwrap();
        assert!(matches!(
            log.borrow().last(),
            Some(GraphEvent::OutputCountChanged { previous: 2, current: 4, added, .. }) if added.len() == 2
        ));

        // Out of range: nothing emitted.
        let before = log.borrow().len();
        assert!(session.set_output_count(router, 9).is_err());
        assert_eq!(log.borrow().len(), before);
    }

    #[test]
    fn test_import_keeps_graph_on_error() {
        let (mut session, log) = recorded_session();
        session.add_module_node("source", [0.0, 0.0]).unwrap();
        let mut document = session.export();
        document.version = 99;
        assert!(session.import(document).is_err());
        assert_eq!(session.graph().node_count(), 1);

        let mut other = FlowSession::new(default_catalog());
        other.add_module_node("fan_out", [0.0, 0.0]).unwrap();
        session.import(other.export()).unwrap();
        assert_eq!(session.graph().node_count(), 2);
        assert_eq!(log.borrow().last(), Some(&GraphEvent::GraphReplaced));
    }

    #[test]
    fn test_drop_cancels_active_gesture() {
        let (mut session, log) = recorded_session();
        let source = session.add_module_node("source", [0.0, 0.0]).unwrap();
        session.begin_drag(source, right());
        drop(session);
        assert_eq!(
            log.borrow().last(),
            Some(&GraphEvent::GestureEnded { source, edge: None })
        );
    }

    #[test]
    fn test_fan_out_child_deletion_decrements() {
        let (mut session, _) = recorded_session();
        let fan = session.add_module_node("fan_out", [0.0, 0.0]).unwrap();
        session.set_output_count(fan, 3).unwrap();
        let child = session.graph().children_of(fan)[0].id;
        session.remove_node(child).unwrap();
        assert_eq!(session.graph().node(fan).and_then(Node::output_count), Some(2));

        let router = session.add_module_node("router", [0.0, 300.0]).unwrap();
        let child = session.graph().children_of(router)[0].id;
        assert!(matches!(
            session.remove_node(child),
            Err(GraphError::Fanout(FanoutError::ChildDeletionBlocked(_)))
        ));
    }

    #[test]
    fn test_child_deletion_reports_count_change() {
        let (mut session, log) = recorded_session();
        let fan = session.add_module_node("fan_out", [0.0, 0.0]).unwrap();
        session.set_output_count(fan, 3).unwrap();
        let child = session.graph().children_of(fan)[1].id;
        session.remove_node(child).unwrap();

        assert_eq!(
            log.borrow().last(),
            Some(&GraphEvent::OutputCountChanged {
                node: fan,
                previous: 3,
                current: 2,
                added: Vec::new(),
                removed: vec![child],
            })
        );

        // Plain deletions report no count change.
        let source = session.add_module_node("source", [0.0, 300.0]).unwrap();
        session.remove_node(source).unwrap();
        assert!(matches!(
            log.borrow().last(),
            Some(GraphEvent::NodesRemoved { .. })
        ));
    }
}
