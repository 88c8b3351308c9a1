//! The waypoint graph: positioned nodes and traffic-weighted edges.
//!
//! Adjacency is stored in a `SecondaryMap` keyed by `NodeId`, with parallel
//! `neighbors`/`edges` vectors kept in insertion order. The iteration order
//! of those vectors is load-bearing: roulette-wheel edge selection walks
//! them in order, so a stable order is required for determinism.
//!
//! Effective traversal cost is `base_cost * traffic` and is recomputed on
//! every query. Traffic can change between two visits to the same edge, so
//! the product is never cached.

use crate::fixed::{Fixed64, round_to_i64};
use crate::geom::Position;
use crate::id::{EdgeId, NodeId};
use serde::{Deserialize, Serialize};
use slotmap::{SecondaryMap, SlotMap};

// ---------------------------------------------------------------------------
// Pheromone and traffic bounds
// ---------------------------------------------------------------------------

/// Floor for edge pheromone under every strategy.
pub const MIN_PHEROMONE: Fixed64 = Fixed64::from_bits(1 << 32);

/// Ceiling for edge pheromone under the bounded (MMAS) strategy.
pub const MAX_PHEROMONE: Fixed64 = Fixed64::from_bits(1000 << 32);

/// Neutral traffic multiplier; traffic never drops below this.
pub const NEUTRAL_TRAFFIC: Fixed64 = Fixed64::from_bits(1 << 32);

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can occur during graph operations.
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    #[error("node {0:?} is already at the maximum degree")]
    DegreeExceeded(NodeId),
    #[error("nodes {0:?} and {1:?} are already adjacent")]
    DuplicateEdge(NodeId, NodeId),
    #[error("cannot connect node {0:?} to itself")]
    SelfLoop(NodeId),
    #[error("node limit reached ({0} nodes)")]
    NodeLimit(usize),
    #[error("node not found: {0:?}")]
    NodeNotFound(NodeId),
    #[error("edge not found: {0:?}")]
    EdgeNotFound(EdgeId),
}

// ---------------------------------------------------------------------------
// Core data structures
// ---------------------------------------------------------------------------

/// Adjacency lists for a single node. `neighbors[i]` is the node on the far
/// side of `edges[i]`; the two vectors always move in lock-step.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct NodeAdjacency {
    neighbors: Vec<NodeId>,
    edges: Vec<EdgeId>,
}

/// Per-node data stored in the waypoint graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeData {
    /// Stable external id, assigned at creation and kept across snapshots.
    pub display_id: u32,
    /// Placement in the plane.
    pub position: Position,
    /// Whether this node is the colony's source.
    pub is_source: bool,
    /// Whether this node is the colony's destination.
    pub is_destination: bool,
}

/// Per-edge data stored in the waypoint graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdgeData {
    /// Stable external id, assigned at creation and kept across snapshots.
    pub display_id: u32,
    /// The two endpoints. An edge always has exactly two.
    pub endpoints: [NodeId; 2],
    /// Euclidean distance between the endpoints, fixed at creation.
    pub base_cost: Fixed64,
    /// Raw pheromone quantity. Mutated only through the bounded setters.
    pheromone: Fixed64,
    /// Congestion multiplier, always >= 1.
    traffic: Fixed64,
}

impl EdgeData {
    /// Raw pheromone value (strategy math operates on this).
    pub fn pheromone(&self) -> Fixed64 {
        self.pheromone
    }

    /// Current traffic multiplier.
    pub fn traffic(&self) -> Fixed64 {
        self.traffic
    }

    /// Effective traversal cost, recomputed live.
    pub fn cost(&self) -> Fixed64 {
        self.base_cost * self.traffic
    }
}

// ---------------------------------------------------------------------------
// WaypointGraph
// ---------------------------------------------------------------------------

/// The waypoint graph: nodes with positions and source/destination flags,
/// undirected edges with pheromone and traffic, and mirrored adjacency.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaypointGraph {
    nodes: SlotMap<NodeId, NodeData>,
    edges: SlotMap<EdgeId, EdgeData>,
    adjacency: SecondaryMap<NodeId, NodeAdjacency>,

    source: Option<NodeId>,
    destination: Option<NodeId>,

    max_nodes: usize,
    max_degree: usize,

    next_node_display: u32,
    next_edge_display: u32,
}

impl WaypointGraph {
    /// Create an empty graph with the given capacity limits.
    pub fn new(max_nodes: usize, max_degree: usize) -> Self {
        Self {
            nodes: SlotMap::with_key(),
            edges: SlotMap::with_key(),
            adjacency: SecondaryMap::new(),
            source: None,
            destination: None,
            max_nodes,
            max_degree,
            next_node_display: 0,
            next_edge_display: 0,
        }
    }

    // -----------------------------------------------------------------------
    // Node operations
    // -----------------------------------------------------------------------

    /// Add a node at the given position.
    pub fn add_node(&mut self, position: Position) -> Result<NodeId, GraphError> {
        if self.nodes.len() >= self.max_nodes {
            return Err(GraphError::NodeLimit(self.max_nodes));
        }
        let display_id = self.next_node_display;
        self.next_node_display += 1;
        let id = self.nodes.insert(NodeData {
            display_id,
            position,
            is_source: false,
            is_destination: false,
        });
        self.adjacency.insert(id, NodeAdjacency::default());
        Ok(id)
    }

    /// Remove a node, cascading `disconnect` over all incident edges.
    /// Returns the removed edges so the caller can report them.
    pub fn remove_node(&mut self, node: NodeId) -> Result<Vec<EdgeId>, GraphError> {
        if !self.nodes.contains_key(node) {
            return Err(GraphError::NodeNotFound(node));
        }
        let incident: Vec<EdgeId> = self.adjacency[node].edges.clone();
        for &edge in &incident {
            self.disconnect(edge)?;
        }
        if self.source == Some(node) {
            self.source = None;
        }
        if self.destination == Some(node) {
            self.destination = None;
        }
        self.adjacency.remove(node);
        self.nodes.remove(node);
        Ok(incident)
    }

    /// Mark a node as the source, clearing any previous source flag.
    pub fn set_source(&mut self, node: NodeId) -> Result<(), GraphError> {
        if !self.nodes.contains_key(node) {
            return Err(GraphError::NodeNotFound(node));
        }
        if let Some(old) = self.source.take() {
            if let Some(data) = self.nodes.get_mut(old) {
                data.is_source = false;
            }
        }
        self.nodes[node].is_source = true;
        self.source = Some(node);
        Ok(())
    }

    /// Mark a node as the destination, clearing any previous flag.
    pub fn set_destination(&mut self, node: NodeId) -> Result<(), GraphError> {
        if !self.nodes.contains_key(node) {
            return Err(GraphError::NodeNotFound(node));
        }
        if let Some(old) = self.destination.take() {
            if let Some(data) = self.nodes.get_mut(old) {
                data.is_destination = false;
            }
        }
        self.nodes[node].is_destination = true;
        self.destination = Some(node);
        Ok(())
    }

    pub fn source(&self) -> Option<NodeId> {
        self.source
    }

    pub fn destination(&self) -> Option<NodeId> {
        self.destination
    }

    pub fn is_source(&self, node: NodeId) -> bool {
        self.source == Some(node)
    }

    pub fn is_destination(&self, node: NodeId) -> bool {
        self.destination == Some(node)
    }

    pub fn node(&self, node: NodeId) -> Option<&NodeData> {
        self.nodes.get(node)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn max_nodes(&self) -> usize {
        self.max_nodes
    }

    pub fn max_degree(&self) -> usize {
        self.max_degree
    }

    pub fn degree(&self, node: NodeId) -> usize {
        self.adjacency.get(node).map_or(0, |adj| adj.edges.len())
    }

    /// Neighbor nodes in insertion order.
    pub fn neighbors(&self, node: NodeId) -> &[NodeId] {
        self.adjacency
            .get(node)
            .map_or(&[], |adj| adj.neighbors.as_slice())
    }

    /// Incident edges in insertion order. Roulette selection iterates this.
    pub fn incident_edges(&self, node: NodeId) -> &[EdgeId] {
        self.adjacency
            .get(node)
            .map_or(&[], |adj| adj.edges.as_slice())
    }

    /// Iterate over all nodes.
    pub fn iter_nodes(&self) -> impl Iterator<Item = (NodeId, &NodeData)> {
        self.nodes.iter()
    }

    // -----------------------------------------------------------------------
    // Edge operations
    // -----------------------------------------------------------------------

    /// Connect two nodes with a new edge. The base cost is the Euclidean
    /// distance between the endpoints at creation time; pheromone starts at
    /// the floor and traffic at neutral.
    pub fn connect(&mut self, a: NodeId, b: NodeId) -> Result<EdgeId, GraphError> {
        if a == b {
            return Err(GraphError::SelfLoop(a));
        }
        let pos_a = self.nodes.get(a).ok_or(GraphError::NodeNotFound(a))?.position;
        let pos_b = self.nodes.get(b).ok_or(GraphError::NodeNotFound(b))?.position;
        if self.adjacency[a].neighbors.contains(&b) {
            return Err(GraphError::DuplicateEdge(a, b));
        }
        if self.adjacency[a].edges.len() >= self.max_degree {
            return Err(GraphError::DegreeExceeded(a));
        }
        if self.adjacency[b].edges.len() >= self.max_degree {
            return Err(GraphError::DegreeExceeded(b));
        }

        let display_id = self.next_edge_display;
        self.next_edge_display += 1;
        let edge = self.edges.insert(EdgeData {
            display_id,
            endpoints: [a, b],
            base_cost: pos_a.distance(pos_b),
            pheromone: MIN_PHEROMONE,
            traffic: NEUTRAL_TRAFFIC,
        });

        let adj_a = &mut self.adjacency[a];
        adj_a.neighbors.push(b);
        adj_a.edges.push(edge);
        let adj_b = &mut self.adjacency[b];
        adj_b.neighbors.push(a);
        adj_b.edges.push(edge);
        Ok(edge)
    }

    /// Remove an edge and its mutual adjacency entries. Returns the removed
    /// data so the caller can report it.
    pub fn disconnect(&mut self, edge: EdgeId) -> Result<EdgeData, GraphError> {
        let data = self
            .edges
            .remove(edge)
            .ok_or(GraphError::EdgeNotFound(edge))?;
        let [a, b] = data.endpoints;
        Self::remove_adjacency(&mut self.adjacency, a, edge);
        Self::remove_adjacency(&mut self.adjacency, b, edge);
        Ok(data)
    }

    fn remove_adjacency(
        adjacency: &mut SecondaryMap<NodeId, NodeAdjacency>,
        node: NodeId,
        edge: EdgeId,
    ) {
        if let Some(adj) = adjacency.get_mut(node)
            && let Some(idx) = adj.edges.iter().position(|&e| e == edge)
        {
            adj.edges.remove(idx);
            adj.neighbors.remove(idx);
        }
    }

    pub fn edge(&self, edge: EdgeId) -> Option<&EdgeData> {
        self.edges.get(edge)
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Iterate over all edges.
    pub fn iter_edges(&self) -> impl Iterator<Item = (EdgeId, &EdgeData)> {
        self.edges.iter()
    }

    /// Collect all edge ids. Used by the pheromone pass, which mutates
    /// edges while iterating.
    pub fn edge_ids(&self) -> Vec<EdgeId> {
        self.edges.keys().collect()
    }

    /// The endpoint of `edge` that is not `node`, if `node` is an endpoint.
    pub fn other_endpoint(&self, edge: EdgeId, node: NodeId) -> Option<NodeId> {
        let [a, b] = self.edges.get(edge)?.endpoints;
        if a == node {
            Some(b)
        } else if b == node {
            Some(a)
        } else {
            None
        }
    }

    /// The edge directly connecting `a` and `b`, if they are adjacent.
    pub fn edge_between(&self, a: NodeId, b: NodeId) -> Option<EdgeId> {
        let adj = self.adjacency.get(a)?;
        let idx = adj.neighbors.iter().position(|&n| n == b)?;
        Some(adj.edges[idx])
    }

    // -----------------------------------------------------------------------
    // Cost, traffic, pheromone
    // -----------------------------------------------------------------------

    /// Effective traversal cost: `base_cost * traffic`, never cached.
    pub fn cost(&self, edge: EdgeId) -> Option<Fixed64> {
        self.edges.get(edge).map(EdgeData::cost)
    }

    pub fn traffic(&self, edge: EdgeId) -> Option<Fixed64> {
        self.edges.get(edge).map(EdgeData::traffic)
    }

    /// Increase an edge's traffic multiplier.
    pub fn add_traffic(&mut self, edge: EdgeId, amount: Fixed64) -> Result<Fixed64, GraphError> {
        let data = self
            .edges
            .get_mut(edge)
            .ok_or(GraphError::EdgeNotFound(edge))?;
        data.traffic = data.traffic.saturating_add(amount);
        Ok(data.traffic)
    }

    /// Decrease an edge's traffic multiplier, never below neutral.
    pub fn reduce_traffic(&mut self, edge: EdgeId, amount: Fixed64) -> Result<Fixed64, GraphError> {
        let data = self
            .edges
            .get_mut(edge)
            .ok_or(GraphError::EdgeNotFound(edge))?;
        let reduced = data.traffic - amount;
        data.traffic = if reduced > NEUTRAL_TRAFFIC {
            reduced
        } else {
            NEUTRAL_TRAFFIC
        };
        Ok(data.traffic)
    }

    /// Set an edge's traffic directly (snapshot restore), floored at neutral.
    pub fn set_traffic(&mut self, edge: EdgeId, value: Fixed64) -> Result<(), GraphError> {
        let data = self
            .edges
            .get_mut(edge)
            .ok_or(GraphError::EdgeNotFound(edge))?;
        data.traffic = value.max(NEUTRAL_TRAFFIC);
        Ok(())
    }

    /// Raw pheromone value on an edge.
    pub fn pheromone(&self, edge: EdgeId) -> Option<Fixed64> {
        self.edges.get(edge).map(EdgeData::pheromone)
    }

    /// Rounded integer pheromone level. This is the value selection weights
    /// and displays use, not the raw strategy value.
    pub fn pheromone_level(&self, edge: EdgeId) -> Option<i64> {
        self.edges.get(edge).map(|e| round_to_i64(e.pheromone))
    }

    /// Set an edge's pheromone. When `bounded` the value is clamped into
    /// `[MIN_PHEROMONE, MAX_PHEROMONE]`; otherwise only the floor applies.
    pub fn set_pheromone(
        &mut self,
        edge: EdgeId,
        value: Fixed64,
        bounded: bool,
    ) -> Result<(), GraphError> {
        let data = self
            .edges
            .get_mut(edge)
            .ok_or(GraphError::EdgeNotFound(edge))?;
        data.pheromone = if bounded {
            value.clamp(MIN_PHEROMONE, MAX_PHEROMONE)
        } else {
            value.max(MIN_PHEROMONE)
        };
        Ok(())
    }

    /// Deposit pheromone on an edge. When `bounded` the result saturates at
    /// the ceiling; otherwise it grows without limit.
    pub fn add_pheromone(
        &mut self,
        edge: EdgeId,
        amount: Fixed64,
        bounded: bool,
    ) -> Result<(), GraphError> {
        let data = self
            .edges
            .get_mut(edge)
            .ok_or(GraphError::EdgeNotFound(edge))?;
        let raised = data.pheromone.saturating_add(amount);
        data.pheromone = if bounded {
            raised.min(MAX_PHEROMONE)
        } else {
            raised
        };
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Environment maintenance
    // -----------------------------------------------------------------------

    /// Restore every edge to minimum pheromone and neutral traffic.
    pub fn reset_edges(&mut self) {
        for (_, data) in self.edges.iter_mut() {
            data.pheromone = MIN_PHEROMONE;
            data.traffic = NEUTRAL_TRAFFIC;
        }
    }

    /// Remove every node and edge and clear the source/destination flags.
    /// Display id counters keep running so ids stay unique per session.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.edges.clear();
        self.adjacency.clear();
        self.source = None;
        self.destination = None;
    }

    /// Check that adjacency lists are mirror images of each other and in
    /// sync with edge endpoints. Test support.
    #[cfg(any(test, feature = "test-utils"))]
    pub fn adjacency_is_mirrored(&self) -> bool {
        for (edge, data) in self.edges.iter() {
            let [a, b] = data.endpoints;
            let a_adj = &self.adjacency[a];
            let b_adj = &self.adjacency[b];
            let a_idx = a_adj.edges.iter().position(|&e| e == edge);
            let b_idx = b_adj.edges.iter().position(|&e| e == edge);
            match (a_idx, b_idx) {
                (Some(ai), Some(bi)) => {
                    if a_adj.neighbors[ai] != b || b_adj.neighbors[bi] != a {
                        return false;
                    }
                }
                _ => return false,
            }
        }
        for (node, adj) in self.adjacency.iter() {
            if adj.neighbors.len() != adj.edges.len() {
                return false;
            }
            for &edge in &adj.edges {
                if self.other_endpoint(edge, node).is_none() {
                    return false;
                }
            }
        }
        true
    }
}

impl Default for WaypointGraph {
    fn default() -> Self {
        Self::new(200, 5)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixed::f64_to_fixed64;

    fn grid_pair(graph: &mut WaypointGraph) -> (NodeId, NodeId) {
        let a = graph.add_node(Position::from_f64(0.0, 0.0)).unwrap();
        let b = graph.add_node(Position::from_f64(3.0, 4.0)).unwrap();
        (a, b)
    }

    #[test]
    fn connect_sets_base_cost_to_distance() {
        let mut graph = WaypointGraph::default();
        let (a, b) = grid_pair(&mut graph);
        let edge = graph.connect(a, b).unwrap();
        assert_eq!(graph.edge(edge).unwrap().base_cost, f64_to_fixed64(5.0));
    }

    #[test]
    fn new_edge_starts_at_floor_pheromone_and_neutral_traffic() {
        let mut graph = WaypointGraph::default();
        let (a, b) = grid_pair(&mut graph);
        let edge = graph.connect(a, b).unwrap();
        assert_eq!(graph.pheromone(edge), Some(MIN_PHEROMONE));
        assert_eq!(graph.traffic(edge), Some(NEUTRAL_TRAFFIC));
    }

    #[test]
    fn connect_is_mirrored() {
        let mut graph = WaypointGraph::default();
        let (a, b) = grid_pair(&mut graph);
        let edge = graph.connect(a, b).unwrap();
        assert_eq!(graph.neighbors(a), &[b]);
        assert_eq!(graph.neighbors(b), &[a]);
        assert_eq!(graph.incident_edges(a), &[edge]);
        assert_eq!(graph.incident_edges(b), &[edge]);
        assert!(graph.adjacency_is_mirrored());
    }

    #[test]
    fn duplicate_connect_fails_once() {
        let mut graph = WaypointGraph::default();
        let (a, b) = grid_pair(&mut graph);
        assert!(graph.connect(a, b).is_ok());
        assert!(matches!(
            graph.connect(a, b),
            Err(GraphError::DuplicateEdge(_, _))
        ));
        // Adjacency unchanged by the failed call.
        assert_eq!(graph.degree(a), 1);
        assert_eq!(graph.degree(b), 1);
        assert!(graph.adjacency_is_mirrored());
    }

    #[test]
    fn duplicate_check_catches_reversed_order() {
        let mut graph = WaypointGraph::default();
        let (a, b) = grid_pair(&mut graph);
        graph.connect(a, b).unwrap();
        assert!(matches!(
            graph.connect(b, a),
            Err(GraphError::DuplicateEdge(_, _))
        ));
    }

    #[test]
    fn self_loop_rejected() {
        let mut graph = WaypointGraph::default();
        let a = graph.add_node(Position::default()).unwrap();
        assert!(matches!(graph.connect(a, a), Err(GraphError::SelfLoop(_))));
    }

    #[test]
    fn degree_limit_enforced() {
        let mut graph = WaypointGraph::new(200, 2);
        let hub = graph.add_node(Position::from_f64(0.0, 0.0)).unwrap();
        let n1 = graph.add_node(Position::from_f64(1.0, 0.0)).unwrap();
        let n2 = graph.add_node(Position::from_f64(0.0, 1.0)).unwrap();
        let n3 = graph.add_node(Position::from_f64(1.0, 1.0)).unwrap();
        graph.connect(hub, n1).unwrap();
        graph.connect(hub, n2).unwrap();
        assert!(matches!(
            graph.connect(hub, n3),
            Err(GraphError::DegreeExceeded(_))
        ));
        assert_eq!(graph.degree(hub), 2);
    }

    #[test]
    fn degree_limit_checked_on_far_endpoint_too() {
        let mut graph = WaypointGraph::new(200, 1);
        let a = graph.add_node(Position::from_f64(0.0, 0.0)).unwrap();
        let b = graph.add_node(Position::from_f64(1.0, 0.0)).unwrap();
        let c = graph.add_node(Position::from_f64(2.0, 0.0)).unwrap();
        graph.connect(a, b).unwrap();
        assert!(matches!(
            graph.connect(c, b),
            Err(GraphError::DegreeExceeded(_))
        ));
    }

    #[test]
    fn node_limit_enforced() {
        let mut graph = WaypointGraph::new(2, 5);
        graph.add_node(Position::default()).unwrap();
        graph.add_node(Position::default()).unwrap();
        assert!(matches!(
            graph.add_node(Position::default()),
            Err(GraphError::NodeLimit(2))
        ));
    }

    #[test]
    fn disconnect_removes_mutual_adjacency() {
        let mut graph = WaypointGraph::default();
        let (a, b) = grid_pair(&mut graph);
        let edge = graph.connect(a, b).unwrap();
        graph.disconnect(edge).unwrap();
        assert!(graph.neighbors(a).is_empty());
        assert!(graph.neighbors(b).is_empty());
        assert_eq!(graph.edge_count(), 0);
        assert!(matches!(
            graph.disconnect(edge),
            Err(GraphError::EdgeNotFound(_))
        ));
    }

    #[test]
    fn remove_node_cascades_disconnect() {
        let mut graph = WaypointGraph::default();
        let hub = graph.add_node(Position::from_f64(0.0, 0.0)).unwrap();
        let n1 = graph.add_node(Position::from_f64(1.0, 0.0)).unwrap();
        let n2 = graph.add_node(Position::from_f64(0.0, 1.0)).unwrap();
        let e1 = graph.connect(hub, n1).unwrap();
        let e2 = graph.connect(hub, n2).unwrap();

        let removed = graph.remove_node(hub).unwrap();
        assert_eq!(removed, vec![e1, e2]);
        assert_eq!(graph.edge_count(), 0);
        assert!(graph.neighbors(n1).is_empty());
        assert!(graph.neighbors(n2).is_empty());
        assert!(graph.node(hub).is_none());
    }

    #[test]
    fn remove_node_clears_role_flags() {
        let mut graph = WaypointGraph::default();
        let a = graph.add_node(Position::default()).unwrap();
        graph.set_source(a).unwrap();
        graph.remove_node(a).unwrap();
        assert_eq!(graph.source(), None);
    }

    #[test]
    fn source_flag_moves() {
        let mut graph = WaypointGraph::default();
        let (a, b) = grid_pair(&mut graph);
        graph.set_source(a).unwrap();
        graph.set_source(b).unwrap();
        assert!(!graph.node(a).unwrap().is_source);
        assert!(graph.node(b).unwrap().is_source);
        assert_eq!(graph.source(), Some(b));
    }

    #[test]
    fn cost_tracks_traffic_live() {
        let mut graph = WaypointGraph::default();
        let (a, b) = grid_pair(&mut graph);
        let edge = graph.connect(a, b).unwrap();
        assert_eq!(graph.cost(edge), Some(f64_to_fixed64(5.0)));

        graph.add_traffic(edge, f64_to_fixed64(1.0)).unwrap();
        assert_eq!(graph.cost(edge), Some(f64_to_fixed64(10.0)));

        graph.reduce_traffic(edge, f64_to_fixed64(0.5)).unwrap();
        assert_eq!(graph.cost(edge), Some(f64_to_fixed64(7.5)));
    }

    #[test]
    fn reduce_traffic_floors_at_neutral() {
        let mut graph = WaypointGraph::default();
        let (a, b) = grid_pair(&mut graph);
        let edge = graph.connect(a, b).unwrap();
        graph.add_traffic(edge, f64_to_fixed64(0.5)).unwrap();
        graph.reduce_traffic(edge, f64_to_fixed64(10.0)).unwrap();
        assert_eq!(graph.traffic(edge), Some(NEUTRAL_TRAFFIC));
    }

    #[test]
    fn bounded_pheromone_clamps_both_ends() {
        let mut graph = WaypointGraph::default();
        let (a, b) = grid_pair(&mut graph);
        let edge = graph.connect(a, b).unwrap();

        graph
            .set_pheromone(edge, f64_to_fixed64(5000.0), true)
            .unwrap();
        assert_eq!(graph.pheromone(edge), Some(MAX_PHEROMONE));

        graph
            .set_pheromone(edge, f64_to_fixed64(0.25), true)
            .unwrap();
        assert_eq!(graph.pheromone(edge), Some(MIN_PHEROMONE));
    }

    #[test]
    fn unbounded_pheromone_has_no_ceiling() {
        let mut graph = WaypointGraph::default();
        let (a, b) = grid_pair(&mut graph);
        let edge = graph.connect(a, b).unwrap();
        graph
            .set_pheromone(edge, f64_to_fixed64(5000.0), false)
            .unwrap();
        assert_eq!(graph.pheromone(edge), Some(f64_to_fixed64(5000.0)));
        // Floor still applies.
        graph
            .set_pheromone(edge, f64_to_fixed64(0.0), false)
            .unwrap();
        assert_eq!(graph.pheromone(edge), Some(MIN_PHEROMONE));
    }

    #[test]
    fn add_pheromone_bounded_saturates() {
        let mut graph = WaypointGraph::default();
        let (a, b) = grid_pair(&mut graph);
        let edge = graph.connect(a, b).unwrap();
        graph
            .add_pheromone(edge, f64_to_fixed64(999.5), true)
            .unwrap();
        assert_eq!(graph.pheromone(edge), Some(MAX_PHEROMONE));
    }

    #[test]
    fn pheromone_level_is_rounded() {
        let mut graph = WaypointGraph::default();
        let (a, b) = grid_pair(&mut graph);
        let edge = graph.connect(a, b).unwrap();
        graph
            .set_pheromone(edge, f64_to_fixed64(7.6), false)
            .unwrap();
        assert_eq!(graph.pheromone_level(edge), Some(8));
        assert_eq!(graph.pheromone(edge), Some(f64_to_fixed64(7.6)));
    }

    #[test]
    fn edge_between_finds_connecting_edge() {
        let mut graph = WaypointGraph::default();
        let (a, b) = grid_pair(&mut graph);
        let c = graph.add_node(Position::from_f64(9.0, 9.0)).unwrap();
        let edge = graph.connect(a, b).unwrap();
        assert_eq!(graph.edge_between(a, b), Some(edge));
        assert_eq!(graph.edge_between(b, a), Some(edge));
        assert_eq!(graph.edge_between(a, c), None);
    }

    #[test]
    fn reset_edges_restores_floor_and_neutral() {
        let mut graph = WaypointGraph::default();
        let (a, b) = grid_pair(&mut graph);
        let edge = graph.connect(a, b).unwrap();
        graph
            .add_pheromone(edge, f64_to_fixed64(50.0), false)
            .unwrap();
        graph.add_traffic(edge, f64_to_fixed64(3.0)).unwrap();

        graph.reset_edges();
        assert_eq!(graph.pheromone(edge), Some(MIN_PHEROMONE));
        assert_eq!(graph.traffic(edge), Some(NEUTRAL_TRAFFIC));
    }

    #[test]
    fn display_ids_survive_clear() {
        let mut graph = WaypointGraph::default();
        let a = graph.add_node(Position::default()).unwrap();
        assert_eq!(graph.node(a).unwrap().display_id, 0);
        graph.clear();
        let b = graph.add_node(Position::default()).unwrap();
        // Kill: counter must not rewind on clear.
        assert_eq!(graph.node(b).unwrap().display_id, 1);
    }
}
