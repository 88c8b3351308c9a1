//! Route cost evaluation and best-route tracking.
//!
//! A route is an ordered list of edge ids. Its cost is the sum of the live
//! edge costs, so the same route can price differently between queries as
//! traffic moves. The best route is compared and replaced on *rounded*
//! cost, matching the integer display convention; its live cost is
//! re-derived on every query and demotion only happens when a newly
//! completed route beats it.

use crate::fixed::{Fixed64, round_to_i64};
use crate::graph::WaypointGraph;
use crate::id::EdgeId;
use serde::{Deserialize, Serialize};

/// How a completed route compared against the current best.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteVerdict {
    /// Strictly better on rounded cost (or no best existed); now the best.
    NewBest,
    /// Equal rounded cost; the colony is following the best route.
    FollowingBest,
    /// Worse; no change.
    Slower,
}

/// Tracks the best completed route as an ordered edge list.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RouteEvaluator {
    best: Vec<EdgeId>,
}

impl RouteEvaluator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sum of live edge costs over a route. Deterministic for a fixed edge
    /// set and traffic assignment.
    pub fn evaluate(graph: &WaypointGraph, edges: &[EdgeId]) -> Fixed64 {
        edges
            .iter()
            .filter_map(|&e| graph.cost(e))
            .fold(Fixed64::ZERO, |acc, c| acc + c)
    }

    /// Record a completed route. Returns the verdict and the route's cost.
    pub fn record(&mut self, graph: &WaypointGraph, route: &[EdgeId]) -> (RouteVerdict, Fixed64) {
        let cost = Self::evaluate(graph, route);
        let verdict = match self.live_best_cost(graph) {
            None => {
                self.best = route.to_vec();
                RouteVerdict::NewBest
            }
            Some(best_cost) => {
                let new = round_to_i64(cost);
                let old = round_to_i64(best_cost);
                if new < old {
                    self.best = route.to_vec();
                    RouteVerdict::NewBest
                } else if new == old {
                    RouteVerdict::FollowingBest
                } else {
                    RouteVerdict::Slower
                }
            }
        };
        (verdict, cost)
    }

    pub fn has_best(&self) -> bool {
        !self.best.is_empty()
    }

    /// The best route's edges in traversal order.
    pub fn best_edges(&self) -> &[EdgeId] {
        &self.best
    }

    /// The best route's cost at current traffic, if a best route exists.
    pub fn live_best_cost(&self, graph: &WaypointGraph) -> Option<Fixed64> {
        if self.best.is_empty() {
            return None;
        }
        Some(Self::evaluate(graph, &self.best))
    }

    /// Drop the best route if it contains `edge`. Returns whether it did.
    pub fn invalidate_if_contains(&mut self, edge: EdgeId) -> bool {
        if self.best.contains(&edge) {
            self.best.clear();
            true
        } else {
            false
        }
    }

    pub fn clear(&mut self) {
        self.best.clear();
    }
}
