// SPDX-License-Identifier: MIT OR Apache-2.0
//! Property tests: random editing sequences never break the graph.
//!
//! Every step either commits a graph that passes `check_invariants` or is
//! rejected with the graph left exactly as it was.

use flowedit_graph::fanout::set_output_count;
use flowedit_graph::{
    BranchingConfig, ChildDeletionPolicy, ConnectionCandidate, ConnectionGesture, Graph, HandleId,
    HandlePosition, Node, NodeId, OutputCountConfig,
};
use proptest::collection::vec;
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    AddSingle,
    AddBranching { count: u32, decrement: bool },
    RemoveNode(usize),
    Connect { source: usize, target: usize, tagged: bool },
    RemoveEdge(usize),
    SetCount { node: usize, count: u32 },
    BeginDrag(usize),
    DropOn(Option<usize>),
    Cancel,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        2 => Just(Op::AddSingle),
        1 => (0u32..7, any::<bool>()).prop_map(|(count, decrement)| Op::AddBranching { count, decrement }),
        1 => any::<usize>().prop_map(Op::RemoveNode),
        4 => (any::<usize>(), any::<usize>(), any::<bool>())
            .prop_map(|(source, target, tagged)| Op::Connect { source, target, tagged }),
        1 => any::<usize>().prop_map(Op::RemoveEdge),
        2 => (any::<usize>(), 0u32..7).prop_map(|(node, count)| Op::SetCount { node, count }),
        2 => any::<usize>().prop_map(Op::BeginDrag),
        2 => proptest::option::of(any::<usize>()).prop_map(Op::DropOn),
        1 => Just(Op::Cancel),
    ]
}

fn pick(graph: &Graph, index: usize) -> Option<NodeId> {
    let count = graph.node_count();
    if count == 0 {
        return None;
    }
    graph.node_ids().nth(index % count)
}

/// Apply one operation; returns whether it committed.
fn apply(graph: &mut Graph, gesture: &mut ConnectionGesture, op: &Op) -> bool {
    match op {
        Op::AddSingle => graph.add_node(Node::single("Step")).is_ok(),
        Op::AddBranching { count, decrement } => {
            let config = BranchingConfig {
                output_count: OutputCountConfig::new(1, 5),
                child_deletion: if *decrement {
                    ChildDeletionPolicy::DecrementParent
                } else {
                    ChildDeletionPolicy::Blocked
                },
            };
            graph
                .add_node(Node::branching("Split", config).with_output_count(*count))
                .is_ok()
        }
        Op::RemoveNode(index) => match pick(graph, *index) {
            Some(id) => {
                let removed = graph.remove_node(id);
                if removed.is_ok() && gesture.source().is_some_and(|s| graph.node(s).is_none()) {
                    gesture.cancel(graph);
                }
                removed.is_ok()
            }
            None => false,
        },
        Op::Connect { source, target, tagged } => {
            let (Some(source), Some(target)) = (pick(graph, *source), pick(graph, *target)) else {
                return false;
            };
            let mut candidate = ConnectionCandidate::new(source, target);
            if *tagged {
                candidate = candidate
                    .with_source_handle(HandleId::source(HandlePosition::Bottom))
                    .with_target_handle(HandleId::target(HandlePosition::Top));
            }
            graph.add_edge(candidate).is_ok()
        }
        Op::RemoveEdge(index) => {
            let count = graph.edge_count();
            if count == 0 {
                return false;
            }
            let id = graph.edges().nth(index % count).map(|e| e.id);
            id.and_then(|id| graph.remove_edge(id)).is_some()
        }
        Op::SetCount { node, count } => match pick(graph, *node) {
            Some(id) => {
                let changed = set_output_count(graph, id, *count).is_ok();
                if changed && gesture.source().is_some_and(|s| graph.node(s).is_none()) {
                    gesture.cancel(graph);
                }
                changed
            }
            None => false,
        },
        Op::BeginDrag(index) => match pick(graph, *index) {
            Some(id) => gesture.begin_drag(graph, id, HandleId::source(HandlePosition::Right)),
            None => false,
        },
        Op::DropOn(target) => {
            let target = target.and_then(|index| pick(graph, index));
            // A drop always ends the gesture, so it counts as a change.
            let was_dragging = gesture.is_dragging();
            let _ = gesture.drop_on(graph, target, Some(HandleId::target(HandlePosition::Left)));
            was_dragging
        }
        Op::Cancel => gesture.cancel(graph),
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    /// Invariants hold after every step of any editing sequence.
    #[test]
    fn invariants_hold_after_every_step(ops in vec(op(), 1..60)) {
        let mut graph = Graph::new("prop");
        let mut gesture = ConnectionGesture::new();

        for op in &ops {
            let before = graph.to_document();
            let before_marker = graph.connecting_from();
            let committed = apply(&mut graph, &mut gesture, op);

            prop_assert!(graph.check_invariants().is_ok(), "{:?} broke {:?}", op, graph.check_invariants());
            prop_assert_eq!(graph.connecting_from(), gesture.source());
            if !committed {
                prop_assert_eq!(graph.to_document(), before);
                prop_assert_eq!(graph.connecting_from(), before_marker);
            }
        }
    }

    /// Once a node has an outgoing edge, no further connection from it is valid.
    #[test]
    fn single_outgoing_edge(targets in vec(any::<bool>(), 1..8)) {
        let mut graph = Graph::new("prop");
        let source = graph.add_node(Node::single("Source")).expect("add");
        let first = graph.add_node(Node::single("First")).expect("add");
        graph.add_edge(ConnectionCandidate::new(source, first)).expect("connect");

        for branching in targets {
            let target = if branching {
                graph.add_node(Node::branching("Split", BranchingConfig::default())).expect("add")
            } else {
                graph.add_node(Node::single("Next")).expect("add")
            };
            let candidate = ConnectionCandidate::new(source, target);
            prop_assert!(!flowedit_graph::is_valid_connection(&graph, &candidate));
        }
    }

    /// Handles without the right role suffix are always refused.
    #[test]
    fn handle_tagging_decides_validity(suffix in "(-source|-target|[a-z-]{0,8})") {
        let mut graph = Graph::new("prop");
        let a = graph.add_node(Node::single("A")).expect("add");
        let b = graph.add_node(Node::single("B")).expect("add");

        let candidate = ConnectionCandidate::new(a, b).with_source_handle(format!("right{suffix}"));
        prop_assert_eq!(
            flowedit_graph::is_valid_connection(&graph, &candidate),
            suffix.ends_with("-source")
        );

        let candidate = ConnectionCandidate::new(a, b).with_target_handle(format!("left{suffix}"));
        prop_assert_eq!(
            flowedit_graph::is_valid_connection(&graph, &candidate),
            suffix.ends_with("-target")
        );
    }
}
