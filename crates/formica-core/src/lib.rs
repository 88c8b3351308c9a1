//! Formica Core -- an ant colony optimization engine on dynamic graphs.
//!
//! This crate provides the waypoint graph, the per-ant traversal state
//! machine, the two pheromone update strategies, route evaluation, typed
//! events, and deterministic fixed-point arithmetic that the Formica tools
//! are built on.
//!
//! # Two Cadences
//!
//! The engine runs on two independent cadences, both driven by
//! [`engine::ColonyEngine::advance`]:
//!
//! 1. **Movement tick** -- every call advances each ant's state machine by
//!    one step: choose an edge, travel along it, or handle arrival.
//! 2. **Iteration tick** -- every `ticks_per_second` movement ticks, the
//!    pheromone strategy runs (deposits, evaporation, stagnation recovery)
//!    and one simulated second of runtime elapses.
//!
//! # Key Types
//!
//! - [`engine::ColonyEngine`] -- Owns the graph, colony, RNG, and event bus;
//!   exposes the editor mutation surface and the tick loop.
//! - [`graph::WaypointGraph`] -- Undirected graph of positioned nodes and
//!   traffic-weighted edges with mirrored adjacency.
//! - [`ant::Ant`] -- Outbound/inbound traversal state machine with
//!   stack-based loop elimination.
//! - [`pheromone::PheromoneUpdater`] -- AS and MMAS reinforcement strategies.
//! - [`route::RouteEvaluator`] -- Best-route tracking over live edge costs.
//! - [`fixed::Fixed64`] -- Q32.32 fixed-point type for deterministic math.
//! - [`event::EventBus`] -- Suppressible ring-buffered event bus.

pub mod ant;
pub mod config;
pub mod engine;
pub mod event;
pub mod fixed;
pub mod geom;
pub mod graph;
pub mod id;
pub mod pheromone;
pub mod query;
pub mod rng;
pub mod route;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
