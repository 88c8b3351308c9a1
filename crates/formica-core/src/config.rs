//! Simulation configuration.
//!
//! Supplied whole at engine construction and applied again on reset; never
//! mutated mid-tick. Real-valued parameters are plain f64 here and are
//! converted to fixed-point once, at initialization.

use crate::pheromone::Strategy;
use serde::{Deserialize, Serialize};

/// All tunables for a colony run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Colony size: ants spawned at the source on start.
    pub max_ants: u32,
    /// Cap on graph nodes.
    pub max_nodes: usize,
    /// Cap on connections per node.
    pub max_degree: usize,
    /// Scales every pheromone deposit.
    pub pheromone_multiplier: f64,
    /// Per-iteration evaporation factor.
    pub evaporation: f64,
    /// Numerator of the deposit formula `constant / route_cost`.
    pub pheromone_constant: f64,
    /// Iterations without improvement before MMAS injects its bonus.
    pub stagnation_limit: u32,
    /// Which reinforcement strategy the colony runs.
    pub strategy: Strategy,
    /// PRNG seed; identical seeds give identical runs.
    pub seed: u64,
    /// Movement ticks per simulated second (iteration cadence).
    pub ticks_per_second: u32,
    /// Distance an ant covers per movement tick at neutral traffic.
    pub ant_speed: f64,
    /// Arrival snap distance. Must exceed the largest per-tick step or
    /// ants overshoot their target node.
    pub arrival_threshold: f64,
    /// Ring buffer capacity per event kind.
    pub event_capacity: usize,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            max_ants: 100,
            max_nodes: 200,
            max_degree: 5,
            pheromone_multiplier: 1.0,
            evaporation: 0.9,
            pheromone_constant: 10_000.0,
            stagnation_limit: 20,
            strategy: Strategy::AntSystem,
            seed: 42,
            ticks_per_second: 1000,
            ant_speed: 5.0,
            arrival_threshold: 5.0,
            event_capacity: 256,
        }
    }
}

impl SimConfig {
    /// Load a configuration from JSON. Missing fields take their defaults.
    #[cfg(feature = "data-loader")]
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
