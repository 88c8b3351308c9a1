//! Owned read-model views over engine state.
//!
//! Renderers and recorders consume these instead of borrowing into the
//! engine, so a frame can be captured and the engine advanced without
//! fighting the borrow checker.

use crate::fixed::Fixed64;
use crate::geom::Position;
use crate::id::{AntId, EdgeId, NodeId};

/// One ant's renderable state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AntSnapshot {
    pub id: AntId,
    pub x: Fixed64,
    pub y: Fixed64,
    /// True while searching for the destination, false while backtracking.
    pub outbound: bool,
    pub visible: bool,
}

/// The current best route and its cost at current traffic.
#[derive(Debug, Clone, PartialEq)]
pub struct BestRouteView {
    pub edges: Vec<EdgeId>,
    pub live_cost: Fixed64,
}

/// One edge's renderable state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeSnapshot {
    pub id: EdgeId,
    pub display_id: u32,
    pub endpoints: [NodeId; 2],
    /// Pheromone rounded to the nearest whole unit, as selection sees it.
    pub pheromone_level: i64,
    pub traffic: Fixed64,
    /// Effective cost: base cost times traffic.
    pub cost: Fixed64,
}

/// One node's renderable state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeView {
    pub id: NodeId,
    pub display_id: u32,
    pub position: Position,
    pub is_source: bool,
    pub is_destination: bool,
    pub degree: usize,
}
