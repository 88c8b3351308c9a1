//! The two pheromone reinforcement strategies.
//!
//! - **AS (Ant System)**: deposits happen continuously as each ant replays
//!   its route back to the source, sized by that ant's own route cost and
//!   unbounded above. The iteration pass only evaporates.
//! - **MMAS (Max-Min Ant System)**: pheromone stays inside
//!   `[MIN_PHEROMONE, MAX_PHEROMONE]`. The iteration pass deposits on the
//!   current best route only, then counts iterations without improvement;
//!   at the stagnation limit every edge *off* the best route receives a
//!   flat bonus to force exploration. Evaporation runs last, clamped.
//!
//! Hitting the MMAS ceiling is a designed saturation policy, not an error.

use crate::fixed::{Fixed64, f64_to_fixed64};
use crate::graph::WaypointGraph;
use crate::id::EdgeId;
use serde::{Deserialize, Serialize};

/// Flat per-edge bonus injected on stagnation under MMAS.
pub const STAGNATION_BONUS: Fixed64 = Fixed64::from_bits(10 << 32);

/// Which reinforcement rule the colony runs under.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Strategy {
    /// Ant System: per-ant deposits during backtracking, unbounded.
    #[default]
    AntSystem,
    /// Max-Min Ant System: best-route-only deposits, bounded.
    MaxMin,
}

impl Strategy {
    /// Whether pheromone is clamped to the `[min, max]` band.
    pub fn bounded(self) -> bool {
        matches!(self, Strategy::MaxMin)
    }
}

/// What an iteration pass did, for event reporting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IterationOutcome {
    /// MMAS injected the stagnation bonus this iteration.
    pub stagnation_refreshed: bool,
}

/// Owns the strategy parameters and the MMAS stagnation counter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PheromoneUpdater {
    strategy: Strategy,
    evaporation: Fixed64,
    deposit_constant: Fixed64,
    multiplier: Fixed64,
    stagnation_limit: u32,
    stagnation: u32,
}

impl PheromoneUpdater {
    pub fn new(
        strategy: Strategy,
        evaporation: f64,
        deposit_constant: f64,
        multiplier: f64,
        stagnation_limit: u32,
    ) -> Self {
        Self {
            strategy,
            evaporation: f64_to_fixed64(evaporation),
            deposit_constant: f64_to_fixed64(deposit_constant),
            multiplier: f64_to_fixed64(multiplier),
            stagnation_limit,
            stagnation: 0,
        }
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    /// Iterations since the best route last improved (MMAS only).
    pub fn stagnation(&self) -> u32 {
        self.stagnation
    }

    /// Reset the stagnation counter. Called when a strictly better route
    /// is recorded.
    pub fn note_improvement(&mut self) {
        self.stagnation = 0;
    }

    /// Clear iteration state for an environment reset.
    pub fn reset(&mut self) {
        self.stagnation = 0;
    }

    /// Deposit sized by a route cost: `constant / cost * multiplier`.
    fn deposit_amount(&self, route_cost: Fixed64) -> Option<Fixed64> {
        if route_cost <= Fixed64::ZERO {
            return None;
        }
        Some(self.deposit_constant / route_cost * self.multiplier)
    }

    /// Per-ant deposit while backtracking. Only the AS strategy reinforces
    /// here; under MMAS the replay pops edges without depositing.
    pub fn backtrack_deposit(
        &self,
        graph: &mut WaypointGraph,
        edge: EdgeId,
        route_cost: Fixed64,
    ) {
        if self.strategy != Strategy::AntSystem {
            return;
        }
        if let Some(amount) = self.deposit_amount(route_cost) {
            // Edge may have been removed mid-replay; nothing to reinforce.
            let _ = graph.add_pheromone(edge, amount, false);
        }
    }

    /// The per-iteration pass: deposits (MMAS), stagnation recovery (MMAS),
    /// then evaporation for both strategies.
    pub fn end_iteration(
        &mut self,
        graph: &mut WaypointGraph,
        best_route: Option<(&[EdgeId], Fixed64)>,
    ) -> IterationOutcome {
        let mut outcome = IterationOutcome::default();

        if self.strategy == Strategy::MaxMin
            && let Some((best_edges, best_cost)) = best_route
        {
            if let Some(amount) = self.deposit_amount(best_cost) {
                for &edge in best_edges {
                    let _ = graph.add_pheromone(edge, amount, true);
                }
            }
            self.stagnation += 1;
            if self.stagnation >= self.stagnation_limit {
                for edge in graph.edge_ids() {
                    if !best_edges.contains(&edge) {
                        let _ = graph.add_pheromone(edge, STAGNATION_BONUS, true);
                    }
                }
                self.stagnation = 0;
                outcome.stagnation_refreshed = true;
            }
        }

        let bounded = self.strategy.bounded();
        for edge in graph.edge_ids() {
            if let Some(pheromone) = graph.pheromone(edge) {
                let _ = graph.set_pheromone(edge, pheromone * self.evaporation, bounded);
            }
        }

        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixed::f64_to_fixed64;
    use crate::geom::Position;
    use crate::graph::{MAX_PHEROMONE, MIN_PHEROMONE};
    use crate::id::NodeId;

    fn two_edge_graph() -> (WaypointGraph, Vec<NodeId>, Vec<EdgeId>) {
        let mut graph = WaypointGraph::default();
        let a = graph.add_node(Position::from_f64(0.0, 0.0)).unwrap();
        let b = graph.add_node(Position::from_f64(10.0, 0.0)).unwrap();
        let c = graph.add_node(Position::from_f64(20.0, 0.0)).unwrap();
        let e1 = graph.connect(a, b).unwrap();
        let e2 = graph.connect(b, c).unwrap();
        (graph, vec![a, b, c], vec![e1, e2])
    }

    fn updater(strategy: Strategy, stagnation_limit: u32) -> PheromoneUpdater {
        PheromoneUpdater::new(strategy, 0.9, 10_000.0, 1.0, stagnation_limit)
    }

    /// 0.9 is not exactly representable in Q32.32, so evaporation results
    /// are compared within a tight tolerance.
    fn assert_close(actual: Option<Fixed64>, expected: f64) {
        let actual = actual.unwrap().to_num::<f64>();
        assert!(
            (actual - expected).abs() < 1e-6,
            "expected ~{expected}, got {actual}"
        );
    }

    #[test]
    fn as_evaporates_every_edge_from_raw_value() {
        let (mut graph, _, edges) = two_edge_graph();
        graph
            .set_pheromone(edges[0], f64_to_fixed64(100.0), false)
            .unwrap();
        graph
            .set_pheromone(edges[1], f64_to_fixed64(10.0), false)
            .unwrap();

        let mut updater = updater(Strategy::AntSystem, 20);
        updater.end_iteration(&mut graph, None);

        assert_close(graph.pheromone(edges[0]), 90.0);
        assert_close(graph.pheromone(edges[1]), 9.0);
    }

    #[test]
    fn as_evaporation_floors_at_minimum() {
        let (mut graph, _, edges) = two_edge_graph();
        let mut updater = updater(Strategy::AntSystem, 20);
        for _ in 0..10 {
            updater.end_iteration(&mut graph, None);
        }
        assert_eq!(graph.pheromone(edges[0]), Some(MIN_PHEROMONE));
    }

    #[test]
    fn as_backtrack_deposit_is_unbounded() {
        let (mut graph, _, edges) = two_edge_graph();
        let updater = updater(Strategy::AntSystem, 20);
        // Route cost 5 -> deposit 2000 per pass, well past the MMAS ceiling.
        updater.backtrack_deposit(&mut graph, edges[0], f64_to_fixed64(5.0));
        assert_eq!(graph.pheromone(edges[0]), Some(f64_to_fixed64(2001.0)));
    }

    #[test]
    fn mmas_ignores_backtrack_deposits() {
        let (mut graph, _, edges) = two_edge_graph();
        let updater = updater(Strategy::MaxMin, 20);
        updater.backtrack_deposit(&mut graph, edges[0], f64_to_fixed64(5.0));
        assert_eq!(graph.pheromone(edges[0]), Some(MIN_PHEROMONE));
    }

    #[test]
    fn zero_cost_route_deposits_nothing() {
        let (mut graph, _, edges) = two_edge_graph();
        let updater = updater(Strategy::AntSystem, 20);
        updater.backtrack_deposit(&mut graph, edges[0], Fixed64::ZERO);
        assert_eq!(graph.pheromone(edges[0]), Some(MIN_PHEROMONE));
    }

    #[test]
    fn mmas_deposits_on_best_route_only() {
        let (mut graph, _, edges) = two_edge_graph();
        let mut updater = updater(Strategy::MaxMin, 20);
        let best = [edges[0]];
        updater.end_iteration(&mut graph, Some((&best, f64_to_fixed64(100.0))));

        // Best edge: (1 + 10000/100) * 0.9; other edge stays at the floor.
        assert_close(graph.pheromone(edges[0]), 90.9);
        assert_eq!(graph.pheromone(edges[1]), Some(MIN_PHEROMONE));
    }

    #[test]
    fn mmas_deposit_saturates_at_ceiling() {
        let (mut graph, _, edges) = two_edge_graph();
        let mut updater = updater(Strategy::MaxMin, 20);
        let best = [edges[0]];
        for _ in 0..50 {
            updater.end_iteration(&mut graph, Some((&best, f64_to_fixed64(1.0))));
        }
        let p = graph.pheromone(edges[0]).unwrap();
        assert!(p <= MAX_PHEROMONE && p >= MIN_PHEROMONE);
    }

    #[test]
    fn stagnation_bonus_hits_off_route_edges() {
        let (mut graph, _, edges) = two_edge_graph();
        let mut updater = updater(Strategy::MaxMin, 3);
        let best = [edges[0]];
        let mut refreshed = 0;
        for _ in 0..3 {
            let outcome = updater.end_iteration(&mut graph, Some((&best, f64_to_fixed64(100.0))));
            if outcome.stagnation_refreshed {
                refreshed += 1;
            }
        }
        assert_eq!(refreshed, 1);
        assert_eq!(updater.stagnation(), 0);
        // Off-route edge sat at the floor for two iterations, then took the
        // flat bonus and one evaporation: (1 + 10) * 0.9.
        assert_close(graph.pheromone(edges[1]), 9.9);
    }

    #[test]
    fn improvement_resets_stagnation_counter() {
        let (mut graph, _, edges) = two_edge_graph();
        let mut updater = updater(Strategy::MaxMin, 5);
        let best = [edges[0]];
        for _ in 0..3 {
            updater.end_iteration(&mut graph, Some((&best, f64_to_fixed64(100.0))));
        }
        assert_eq!(updater.stagnation(), 3);
        updater.note_improvement();
        assert_eq!(updater.stagnation(), 0);
    }

    #[test]
    fn no_best_route_means_no_mmas_stagnation_count() {
        let (mut graph, _, _) = two_edge_graph();
        let mut updater = updater(Strategy::MaxMin, 2);
        for _ in 0..10 {
            let outcome = updater.end_iteration(&mut graph, None);
            assert!(!outcome.stagnation_refreshed);
        }
        assert_eq!(updater.stagnation(), 0);
    }
}
