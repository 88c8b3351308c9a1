//! Save/load of a live environment through the snapshot crate.

use formica_core::engine::ColonyEngine;
use formica_core::fixed::round_to_i64;
use formica_core::pheromone::Strategy;
use formica_core::test_utils::{diamond, diamond_config};
use formica_snapshot::EnvironmentSnapshot;

#[test]
fn running_environment_survives_a_save_load_cycle() {
    let (mut engine, _) = diamond(diamond_config(Strategy::AntSystem));
    engine.start().unwrap();
    for _ in 0..2_000 {
        engine.advance().unwrap();
    }
    engine.stop();

    let bytes = EnvironmentSnapshot::capture(&engine.graph)
        .to_bytes()
        .unwrap();
    let restored = EnvironmentSnapshot::from_bytes(&bytes)
        .unwrap()
        .restore()
        .unwrap();

    assert_eq!(restored.node_count(), engine.graph.node_count());
    assert_eq!(restored.edge_ids().len(), engine.graph.edge_ids().len());
    assert_eq!(
        restored.source().is_some(),
        engine.graph.source().is_some()
    );

    // Trail state carried over: total rounded pheromone matches.
    let total = |g: &formica_core::graph::WaypointGraph| -> i64 {
        g.edge_ids()
            .iter()
            .filter_map(|&e| g.pheromone_level(e))
            .sum()
    };
    assert_eq!(total(&restored), total(&engine.graph));
}

#[test]
fn restored_environment_runs_a_fresh_colony() {
    let (mut original, _) = diamond(diamond_config(Strategy::AntSystem));
    original.start().unwrap();
    for _ in 0..2_000 {
        original.advance().unwrap();
    }

    let snapshot = EnvironmentSnapshot::capture(&original.graph);

    let mut engine = ColonyEngine::new(diamond_config(Strategy::AntSystem));
    engine.graph = snapshot.restore().unwrap();
    engine.start().unwrap();
    for _ in 0..20_000 {
        engine.advance().unwrap();
    }

    let best = engine.best_route().expect("colony should find a route");
    assert_eq!(round_to_i64(best.live_cost), 20);
}

#[test]
fn two_restores_of_one_snapshot_replay_identically() {
    let (original, _) = diamond(diamond_config(Strategy::AntSystem));
    let snapshot = EnvironmentSnapshot::capture(&original.graph);

    let run = || {
        let mut engine = ColonyEngine::new(diamond_config(Strategy::AntSystem));
        engine.graph = snapshot.restore().unwrap();
        engine.start().unwrap();
        for _ in 0..3_000 {
            engine.advance().unwrap();
        }
        let levels: Vec<i64> = engine
            .edge_snapshots()
            .iter()
            .map(|s| s.pheromone_level)
            .collect();
        (engine.rng_state(), levels)
    };

    assert_eq!(run(), run());
}
