//! Property tests over the graph and pheromone invariants.

use formica_core::fixed::Fixed64;
use formica_core::geom::Position;
use formica_core::graph::{
    GraphError, MAX_PHEROMONE, MIN_PHEROMONE, NEUTRAL_TRAFFIC, WaypointGraph,
};
use formica_core::id::NodeId;
use formica_core::test_utils::fixed;
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum GraphOp {
    AddNode { x: i32, y: i32 },
    Connect { a: usize, b: usize },
    RemoveNode { n: usize },
    Disconnect { e: usize },
    AddTraffic { e: usize, amount: u16 },
    ReduceTraffic { e: usize, amount: u16 },
    AddPheromone { e: usize, amount: u16, bounded: bool },
    Evaporate { e: usize },
}

fn graph_op() -> impl Strategy<Value = GraphOp> {
    prop_oneof![
        (-500i32..500, -500i32..500).prop_map(|(x, y)| GraphOp::AddNode { x, y }),
        (0usize..32, 0usize..32).prop_map(|(a, b)| GraphOp::Connect { a, b }),
        (0usize..32).prop_map(|n| GraphOp::RemoveNode { n }),
        (0usize..64).prop_map(|e| GraphOp::Disconnect { e }),
        (0usize..64, 0u16..2000).prop_map(|(e, amount)| GraphOp::AddTraffic { e, amount }),
        (0usize..64, 0u16..2000).prop_map(|(e, amount)| GraphOp::ReduceTraffic { e, amount }),
        (0usize..64, 0u16..5000, any::<bool>())
            .prop_map(|(e, amount, bounded)| GraphOp::AddPheromone { e, amount, bounded }),
        (0usize..64).prop_map(|e| GraphOp::Evaporate { e }),
    ]
}

fn pick<T: Copy>(items: &[T], index: usize) -> Option<T> {
    if items.is_empty() {
        None
    } else {
        Some(items[index % items.len()])
    }
}

proptest! {
    /// Every structural and numeric invariant holds after any op sequence:
    /// adjacency stays mirrored, degrees stay capped, traffic never drops
    /// below neutral, and bounded pheromone stays inside the band.
    #[test]
    fn graph_invariants_hold_under_random_ops(ops in proptest::collection::vec(graph_op(), 1..120)) {
        let mut graph = WaypointGraph::new(40, 5);
        let mut nodes: Vec<NodeId> = Vec::new();
        let mut bounded_edges = std::collections::HashSet::new();

        for op in ops {
            match op {
                GraphOp::AddNode { x, y } => {
                    if let Ok(n) = graph.add_node(Position::from_f64(x as f64, y as f64)) {
                        nodes.push(n);
                    }
                }
                GraphOp::Connect { a, b } => {
                    if let (Some(a), Some(b)) = (pick(&nodes, a), pick(&nodes, b)) {
                        match graph.connect(a, b) {
                            Ok(_) => {}
                            Err(
                                GraphError::SelfLoop(_)
                                | GraphError::DuplicateEdge(..)
                                | GraphError::DegreeExceeded(_),
                            ) => {}
                            Err(other) => return Err(TestCaseError::fail(other.to_string())),
                        }
                    }
                }
                GraphOp::RemoveNode { n } => {
                    if let Some(n) = pick(&nodes, n) {
                        let _ = graph.remove_node(n);
                        nodes.retain(|&existing| existing != n);
                    }
                }
                GraphOp::Disconnect { e } => {
                    if let Some(e) = pick(&graph.edge_ids(), e) {
                        graph.disconnect(e).map_err(|err| TestCaseError::fail(err.to_string()))?;
                        bounded_edges.remove(&e);
                    }
                }
                GraphOp::AddTraffic { e, amount } => {
                    if let Some(e) = pick(&graph.edge_ids(), e) {
                        graph.add_traffic(e, fixed(amount as f64 / 10.0))
                            .map_err(|err| TestCaseError::fail(err.to_string()))?;
                    }
                }
                GraphOp::ReduceTraffic { e, amount } => {
                    if let Some(e) = pick(&graph.edge_ids(), e) {
                        graph.reduce_traffic(e, fixed(amount as f64 / 10.0))
                            .map_err(|err| TestCaseError::fail(err.to_string()))?;
                    }
                }
                GraphOp::AddPheromone { e, amount, bounded } => {
                    if let Some(e) = pick(&graph.edge_ids(), e) {
                        graph.add_pheromone(e, fixed(amount as f64 / 10.0), bounded)
                            .map_err(|err| TestCaseError::fail(err.to_string()))?;
                        if bounded {
                            bounded_edges.insert(e);
                        } else {
                            bounded_edges.remove(&e);
                        }
                    }
                }
                GraphOp::Evaporate { e } => {
                    if let Some(e) = pick(&graph.edge_ids(), e) {
                        let current = graph.pheromone(e)
                            .ok_or_else(|| TestCaseError::fail("edge vanished"))?;
                        graph.set_pheromone(e, current * fixed(0.9), true)
                            .map_err(|err| TestCaseError::fail(err.to_string()))?;
                        bounded_edges.insert(e);
                    }
                }
            }

            prop_assert!(graph.adjacency_is_mirrored());
            for (id, _) in graph.iter_nodes() {
                prop_assert!(graph.degree(id) <= 5);
            }
            for e in graph.edge_ids() {
                let traffic = graph.traffic(e)
                    .ok_or_else(|| TestCaseError::fail("edge vanished"))?;
                prop_assert!(traffic >= NEUTRAL_TRAFFIC);

                let pheromone = graph.pheromone(e)
                    .ok_or_else(|| TestCaseError::fail("edge vanished"))?;
                prop_assert!(pheromone >= Fixed64::ZERO);
                if bounded_edges.contains(&e) {
                    prop_assert!(pheromone >= MIN_PHEROMONE);
                    prop_assert!(pheromone <= MAX_PHEROMONE);
                }
            }
        }
    }

    /// Connecting the same pair twice is always rejected, in either
    /// endpoint order.
    #[test]
    fn duplicate_edges_are_rejected(flip in any::<bool>()) {
        let mut graph = WaypointGraph::new(10, 5);
        let a = graph.add_node(Position::from_f64(0.0, 0.0)).map_err(|e| TestCaseError::fail(e.to_string()))?;
        let b = graph.add_node(Position::from_f64(30.0, 40.0)).map_err(|e| TestCaseError::fail(e.to_string()))?;
        graph.connect(a, b).map_err(|e| TestCaseError::fail(e.to_string()))?;
        let (x, y) = if flip { (b, a) } else { (a, b) };
        prop_assert!(matches!(graph.connect(x, y), Err(GraphError::DuplicateEdge(..))));
    }
}
