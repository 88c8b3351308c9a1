//! Shared fixtures for unit and integration tests.

use crate::config::SimConfig;
use crate::engine::ColonyEngine;
use crate::fixed::{Fixed64, f64_to_fixed64};
use crate::id::{EdgeId, NodeId};
use crate::pheromone::Strategy;

/// Shorthand fixed-point constructor for test literals.
pub fn fixed(v: f64) -> Fixed64 {
    f64_to_fixed64(v)
}

/// A one-ant configuration with a short iteration so tests do not need
/// thousands of ticks per simulated second.
pub fn single_ant_config(strategy: Strategy) -> SimConfig {
    SimConfig {
        max_ants: 1,
        ticks_per_second: 8,
        strategy,
        ..SimConfig::default()
    }
}

/// A small-colony configuration for the diamond fixture.
pub fn diamond_config(strategy: Strategy) -> SimConfig {
    SimConfig {
        max_ants: 10,
        ticks_per_second: 8,
        strategy,
        ..SimConfig::default()
    }
}

/// Handles into the diamond fixture graph.
pub struct DiamondIds {
    pub a: NodeId,
    pub b: NodeId,
    pub c: NodeId,
    pub d: NodeId,
    /// a -- b, length 10.
    pub e1: EdgeId,
    /// b -- d, length 10.
    pub e2: EdgeId,
    /// a -- c, length 15, traffic 2.0 (effective cost 30).
    pub e3: EdgeId,
    /// c -- d, length 5.
    pub e4: EdgeId,
}

/// A four-node graph with two source-to-destination routes: the upper route
/// a-b-d costs 20, the lower route a-c-d costs 35 once traffic is applied.
/// The engine is built but not started.
pub fn diamond(config: SimConfig) -> (ColonyEngine, DiamondIds) {
    let mut engine = ColonyEngine::new(config);
    let a = engine.add_node_at(0.0, 0.0).unwrap();
    let b = engine.add_node_at(10.0, 0.0).unwrap();
    let c = engine.add_node_at(15.0, 0.0).unwrap();
    let d = engine.add_node_at(20.0, 0.0).unwrap();

    let e1 = engine.connect(a, b).unwrap();
    let e2 = engine.connect(b, d).unwrap();
    let e3 = engine.connect(a, c).unwrap();
    let e4 = engine.connect(c, d).unwrap();
    engine.add_traffic(e3, 1.0).unwrap();

    engine.set_source(a).unwrap();
    engine.set_destination(d).unwrap();

    (engine, DiamondIds {
        a,
        b,
        c,
        d,
        e1,
        e2,
        e3,
        e4,
    })
}
