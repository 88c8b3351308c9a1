//! The per-ant traversal state machine.
//!
//! An ant is either **outbound** (searching toward the destination) or
//! **inbound** (replaying its recorded path back to the source). While
//! outbound it builds two parallel stacks, `nodes_taken` and `edges_taken`,
//! recording the loop-free path so far. The node stack is seeded with the
//! starting node, so it always holds exactly one more entry than the edge
//! stack: `edges_taken[i]` is the edge that led to `nodes_taken[i + 1]`.
//!
//! Edge selection is a roulette wheel weighted by rounded pheromone levels,
//! with two deterministic shortcuts: a degree-2 node away from the source
//! has only one forward option, and a dead end forces the single incident
//! edge (legitimate backtracking). Before a chosen node is committed the
//! stacks are unwound to collapse any cycle the random walk produced, so
//! the recorded path is always simple.

use crate::engine::SimError;
use crate::fixed::Fixed64;
use crate::geom::Position;
use crate::graph::{NEUTRAL_TRAFFIC, WaypointGraph};
use crate::id::{AntId, EdgeId, NodeId};
use crate::rng::SimRng;
use serde::{Deserialize, Serialize};

/// A single ant: position, phase, and the recorded outbound path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ant {
    pub id: AntId,
    /// Interpolated position, snapped to the node on arrival.
    pub position: Position,
    /// `true` while searching toward the destination.
    pub outbound: bool,
    /// The node most recently occupied.
    pub current_node: NodeId,
    /// The edge recorded for the leg in progress.
    pub current_edge: Option<EdgeId>,
    /// Target of the leg in progress; `None` while choosing.
    pub next_node: Option<NodeId>,
    /// The edge just walked; excluded from the next roulette draw.
    prev_edge: Option<EdgeId>,
    nodes_taken: Vec<NodeId>,
    edges_taken: Vec<EdgeId>,
    /// Cost of the last completed outbound route; sizes AS deposits on the
    /// return trip.
    pub last_route_cost: Fixed64,
}

impl Ant {
    /// Spawn an ant at the source node.
    pub fn new(id: AntId, source: NodeId, position: Position) -> Self {
        Self {
            id,
            position,
            outbound: true,
            current_node: source,
            current_edge: None,
            next_node: None,
            prev_edge: None,
            nodes_taken: vec![source],
            edges_taken: Vec::new(),
            last_route_cost: Fixed64::ZERO,
        }
    }

    /// The loop-free node path recorded so far, starting node first.
    pub fn nodes_taken(&self) -> &[NodeId] {
        &self.nodes_taken
    }

    /// The edges of the recorded path; entry `i` leads to node `i + 1`.
    pub fn edges_taken(&self) -> &[EdgeId] {
        &self.edges_taken
    }

    pub fn prev_edge(&self) -> Option<EdgeId> {
        self.prev_edge
    }

    pub(crate) fn set_prev_edge(&mut self, edge: Option<EdgeId>) {
        self.prev_edge = edge;
    }

    // -----------------------------------------------------------------------
    // Edge selection
    // -----------------------------------------------------------------------

    /// Pick the next edge to walk and commit it to the path stacks.
    ///
    /// Three branches, in priority order:
    /// 1. Exactly two incident edges away from the source: the edge not
    ///    just arrived on is the only forward option; take it.
    /// 2. More than one incident edge: roulette wheel over the rounded
    ///    pheromone levels of every incident edge except the previous one.
    ///    (At the source there is no previous edge, so all are eligible.)
    /// 3. A single incident edge (dead end): take it, backtracking.
    ///
    /// Returns the edge recorded on the stack, which may differ from the
    /// edge walked when a loop was collapsed.
    pub fn choose_edge(
        &mut self,
        graph: &WaypointGraph,
        rng: &mut SimRng,
    ) -> Result<EdgeId, SimError> {
        let incident = graph.incident_edges(self.current_node);
        let invalid = || SimError::InvalidTraversal {
            ant: self.id,
            node: self.current_node,
        };

        let chosen = if incident.len() == 2 && !graph.is_source(self.current_node) {
            // Two options, one is the edge just walked; one forward option.
            incident
                .iter()
                .copied()
                .find(|&e| Some(e) != self.prev_edge)
                .ok_or_else(invalid)?
        } else if incident.len() > 1 {
            let mut total: i64 = 0;
            for &e in incident {
                if Some(e) != self.prev_edge {
                    total += graph.pheromone_level(e).unwrap_or(0);
                }
            }
            // Uniform draw in [0, total]; walk the eligible edges in order
            // until the running pheromone sum meets the draw.
            let drawn = rng.next_below(total.max(0) as u64 + 1) as i64;
            let mut running: i64 = 0;
            let mut pick = None;
            for &e in incident {
                if Some(e) == self.prev_edge {
                    continue;
                }
                running += graph.pheromone_level(e).unwrap_or(0);
                if running >= drawn {
                    pick = Some(e);
                    break;
                }
            }
            pick.ok_or_else(invalid)?
        } else if let Some(&only) = incident.first() {
            // Dead end, or the only way forward is back the way we came.
            only
        } else {
            return Err(invalid());
        };

        let next = graph
            .other_endpoint(chosen, self.current_node)
            .ok_or_else(invalid)?;
        self.next_node = Some(next);
        self.prev_edge = Some(chosen);
        let recorded = self.collapse_loop(next).unwrap_or(chosen);
        self.nodes_taken.push(next);
        self.edges_taken.push(recorded);
        self.current_edge = Some(recorded);
        Ok(recorded)
    }

    /// Collapse any cycle the candidate node would close.
    ///
    /// If `candidate` already appears on the node stack, pop both stacks in
    /// lock-step until it is gone and return the edge popped last: that edge
    /// re-enters the stack as the candidate's incoming hop, turning the
    /// detour into a single hop from the node preceding the duplicate.
    ///
    /// The seeded bottom entry never participates; an ant walking back onto
    /// the source is handled by the arrival reset instead.
    pub fn collapse_loop(&mut self, candidate: NodeId) -> Option<EdgeId> {
        while self.nodes_taken[1..].contains(&candidate) {
            self.nodes_taken.pop();
            if self.nodes_taken[1..].contains(&candidate) {
                self.edges_taken.pop();
            } else {
                return self.edges_taken.pop();
            }
        }
        None
    }

    /// Record arrival at the destination: the final leg is pushed here, not
    /// in `choose_edge`, because the hop to an adjacent destination skips
    /// selection entirely.
    pub(crate) fn push_final_leg(&mut self, node: NodeId, edge: EdgeId) {
        self.nodes_taken.push(node);
        self.edges_taken.push(edge);
    }

    /// Pop one leg off the recorded path during the inbound replay.
    /// Returns the popped edge and the node now on top of the stack.
    pub(crate) fn pop_leg(&mut self) -> Option<(EdgeId, NodeId)> {
        if self.edges_taken.is_empty() {
            return None;
        }
        self.nodes_taken.pop();
        let edge = self.edges_taken.pop()?;
        let top = *self.nodes_taken.last()?;
        Some((edge, top))
    }

    // -----------------------------------------------------------------------
    // Movement
    // -----------------------------------------------------------------------

    /// Advance the position one step toward `next_node`. The step length is
    /// `speed / traffic` of the current edge, so congestion slows the ant.
    pub fn travel(&mut self, graph: &WaypointGraph, speed: Fixed64) {
        let (Some(next), Some(edge)) = (self.next_node, self.current_edge) else {
            return;
        };
        let (Some(from), Some(to)) = (graph.node(self.current_node), graph.node(next)) else {
            return;
        };
        let from = from.position;
        let to = to.position;
        let dx = (from.x - to.x).abs();
        let dy = (from.y - to.y).abs();
        let magnitude = crate::fixed::sqrt(dx * dx + dy * dy);
        if magnitude == Fixed64::ZERO {
            return;
        }
        let traffic = graph.traffic(edge).unwrap_or(NEUTRAL_TRAFFIC);
        let x_step = dx / magnitude * speed / traffic;
        let y_step = dy / magnitude * speed / traffic;

        if from.x > to.x {
            self.position.x -= x_step;
        } else if from.x < to.x {
            self.position.x += x_step;
        }
        if from.y > to.y {
            self.position.y -= y_step;
        } else if from.y < to.y {
            self.position.y += y_step;
        }
    }

    /// Clear the recorded path and re-seed it with `source`. Used when a
    /// round trip completes and when an outbound walk loops back to the
    /// source.
    pub fn reset_route(&mut self, source: NodeId) {
        self.nodes_taken.clear();
        self.edges_taken.clear();
        self.nodes_taken.push(source);
        self.prev_edge = None;
        self.next_node = None;
    }
}
