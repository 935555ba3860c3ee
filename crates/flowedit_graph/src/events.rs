// SPDX-License-Identifier: MIT OR Apache-2.0
//! Change notification for graph views.
//!
//! Views subscribe once and are called after every committed mutation
//! instead of polling the graph.

use crate::edge::EdgeId;
use crate::node::NodeId;
use std::fmt;

/// A committed change to the editing session
#[derive(Debug, Clone, PartialEq)]
pub enum GraphEvent {
    /// Node added, with any output children created alongside it
    NodeAdded {
        /// New node
        node: NodeId,
        /// Output children created with it
        children: Vec<NodeId>,
    },
    /// Nodes removed together with their edges
    NodesRemoved {
        /// Removed nodes
        nodes: Vec<NodeId>,
        /// Removed edges
        edges: Vec<EdgeId>,
    },
    /// Node moved
    NodeMoved {
        /// Moved node
        node: NodeId,
        /// New position
        position: [f32; 2],
    },
    /// Node label changed
    NodeRelabeled {
        /// Renamed node
        node: NodeId,
    },
    /// Edge created
    EdgeAdded {
        /// New edge
        edge: EdgeId,
    },
    /// Edge deleted
    EdgeRemoved {
        /// Deleted edge
        edge: EdgeId,
    },
    /// Branching output count changed and children were reconciled
    OutputCountChanged {
        /// Branching node
        node: NodeId,
        /// Count before
        previous: u32,
        /// Count after
        current: u32,
        /// Children created
        added: Vec<NodeId>,
        /// Children removed
        removed: Vec<NodeId>,
    },
    /// Connection drag started
    GestureStarted {
        /// Drag source
        source: NodeId,
    },
    /// Connection drag ended by drop or cancel
    GestureEnded {
        /// Drag source
        source: NodeId,
        /// Edge created by the drop, if accepted
        edge: Option<EdgeId>,
    },
    /// Whole graph replaced by an import
    GraphReplaced,
}

/// Handle returned by [`EventBus::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Callback = Box<dyn FnMut(&GraphEvent)>;

/// Delivers events to subscribers in subscription order
#[derive(Default)]
pub struct EventBus {
    next_id: u64,
    subscribers: Vec<(SubscriptionId, Callback)>,
}

impl EventBus {
    /// Create a bus with no subscribers
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback
    pub fn subscribe<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: FnMut(&GraphEvent) + 'static,
    {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.subscribers.push((id, Box::new(callback)));
        id
    }

    /// Remove a callback; returns whether it was registered
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sub, _)| *sub != id);
        self.subscribers.len() != before
    }

    /// Deliver an event to every subscriber
    pub fn emit(&mut self, event: &GraphEvent) {
        tracing::trace!("Emitting {event:?}");
        for (_, callback) in &mut self.subscribers {
            callback(event);
        }
    }

    /// Number of subscribers
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}
