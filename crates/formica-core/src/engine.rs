//! The colony engine: owns the waypoint graph, the colony, and the two-
//! cadence tick loop.
//!
//! # Architecture
//!
//! The `ColonyEngine` owns:
//! - A [`WaypointGraph`] (nodes = waypoints, edges = traffic-weighted paths)
//! - The colony: a `Vec<Ant>`, stepped sequentially in insertion order
//! - A [`SimRng`] seeded from configuration so runs are reproducible
//! - A [`PheromoneUpdater`] and [`RouteEvaluator`]
//! - An [`EventBus`] for structured log events
//!
//! # Tick Loop
//!
//! Each [`ColonyEngine::advance`] call is one movement tick: every ant
//! either chooses its next edge, travels along the current one, or handles
//! arrival. Every `ticks_per_second` movement ticks, one iteration tick
//! runs: the pheromone strategy's per-iteration pass, one simulated second
//! of runtime, and a best-route refresh event.
//!
//! Ants are processed one at a time, so no two ants ever mutate the same
//! edge within a tick, and the iteration pass never overlaps a movement
//! step.

use crate::ant::Ant;
use crate::config::SimConfig;
use crate::event::{Event, EventBus};
use crate::fixed::{Fixed64, f64_to_fixed64};
use crate::geom::Position;
use crate::graph::{GraphError, WaypointGraph};
use crate::id::{AntId, EdgeId, NodeId};
use crate::pheromone::PheromoneUpdater;
use crate::query::{AntSnapshot, BestRouteView, EdgeSnapshot, NodeView};
use crate::rng::SimRng;
use crate::route::{RouteEvaluator, RouteVerdict};

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that halt or refuse a simulation operation.
#[derive(Debug, thiserror::Error)]
pub enum SimError {
    #[error("no source node set")]
    MissingSource,
    #[error("no destination node set")]
    MissingDestination,
    /// An ant reached a choosing state with zero incident edges. This is a
    /// graph-invariant violation and unrecoverable; the run halts.
    #[error("ant {ant:?} is stranded at node {node:?} with no incident edges")]
    InvalidTraversal { ant: AntId, node: NodeId },
    #[error(transparent)]
    Graph(#[from] GraphError),
}

/// What a single `advance` call did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Whether the colony was stepped (false while stopped).
    pub ticked: bool,
    /// Whether this tick closed out an iteration (one simulated second).
    pub iteration_completed: bool,
    /// Runtime seconds after this tick.
    pub runtime: u64,
}

// ---------------------------------------------------------------------------
// ColonyEngine
// ---------------------------------------------------------------------------

/// The core simulation engine. Owns all colony state and exposes the editor
/// mutation surface, the lifecycle controls, and the tick loop.
#[derive(Debug)]
pub struct ColonyEngine {
    /// The waypoint graph.
    pub graph: WaypointGraph,

    /// Typed event bus for structured log events.
    pub event_bus: EventBus,

    config: SimConfig,
    ants: Vec<Ant>,
    rng: SimRng,
    updater: PheromoneUpdater,
    evaluator: RouteEvaluator,

    running: bool,
    /// Simulated seconds elapsed (iteration count).
    runtime: u64,
    /// Movement ticks into the current simulated second.
    tick_in_second: u32,
    /// Presentation hint; the engine itself never reads it.
    ants_visible: bool,
    next_ant_id: u32,

    speed: Fixed64,
    arrival_threshold: Fixed64,
}

impl ColonyEngine {
    /// Create an engine with the given configuration.
    pub fn new(config: SimConfig) -> Self {
        let updater = PheromoneUpdater::new(
            config.strategy,
            config.evaporation,
            config.pheromone_constant,
            config.pheromone_multiplier,
            config.stagnation_limit,
        );
        Self {
            graph: WaypointGraph::new(config.max_nodes, config.max_degree),
            event_bus: EventBus::new(config.event_capacity),
            rng: SimRng::new(config.seed),
            updater,
            evaluator: RouteEvaluator::new(),
            ants: Vec::new(),
            running: false,
            runtime: 0,
            tick_in_second: 0,
            ants_visible: true,
            next_ant_id: 0,
            speed: f64_to_fixed64(config.ant_speed),
            arrival_threshold: f64_to_fixed64(config.arrival_threshold),
            config,
        }
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    // -----------------------------------------------------------------------
    // Editor surface
    // -----------------------------------------------------------------------

    /// Add a node at the given position.
    pub fn add_node_at(&mut self, x: f64, y: f64) -> Result<NodeId, GraphError> {
        let node = self.graph.add_node(Position::from_f64(x, y))?;
        self.event_bus.emit(Event::NodeAdded {
            node,
            runtime: self.runtime,
        });
        Ok(node)
    }

    /// Remove a node and all its incident edges. Invalidates the best route
    /// if it used any of them.
    pub fn remove_node(&mut self, node: NodeId) -> Result<(), GraphError> {
        let removed = self.graph.remove_node(node)?;
        for edge in removed {
            self.on_edge_removed(edge);
        }
        self.event_bus.emit(Event::NodeRemoved {
            node,
            runtime: self.runtime,
        });
        Ok(())
    }

    /// Connect two nodes.
    pub fn connect(&mut self, a: NodeId, b: NodeId) -> Result<EdgeId, GraphError> {
        let edge = self.graph.connect(a, b)?;
        self.event_bus.emit(Event::EdgeAdded {
            edge,
            a,
            b,
            runtime: self.runtime,
        });
        Ok(edge)
    }

    /// Remove an edge. Invalidates the best route if it used the edge.
    pub fn disconnect(&mut self, edge: EdgeId) -> Result<(), GraphError> {
        self.graph.disconnect(edge)?;
        self.on_edge_removed(edge);
        Ok(())
    }

    fn on_edge_removed(&mut self, edge: EdgeId) {
        if self.evaluator.invalidate_if_contains(edge) {
            self.event_bus.emit(Event::BestRouteInvalidated {
                edge,
                runtime: self.runtime,
            });
        }
        self.event_bus.emit(Event::EdgeRemoved {
            edge,
            runtime: self.runtime,
        });
    }

    /// Raise an edge's traffic multiplier.
    pub fn add_traffic(&mut self, edge: EdgeId, amount: f64) -> Result<(), GraphError> {
        let traffic = self.graph.add_traffic(edge, f64_to_fixed64(amount))?;
        self.event_bus.emit(Event::TrafficChanged {
            edge,
            traffic,
            runtime: self.runtime,
        });
        Ok(())
    }

    /// Lower an edge's traffic multiplier (floored at neutral).
    pub fn reduce_traffic(&mut self, edge: EdgeId, amount: f64) -> Result<(), GraphError> {
        let traffic = self.graph.reduce_traffic(edge, f64_to_fixed64(amount))?;
        self.event_bus.emit(Event::TrafficChanged {
            edge,
            traffic,
            runtime: self.runtime,
        });
        Ok(())
    }

    pub fn set_source(&mut self, node: NodeId) -> Result<(), GraphError> {
        self.graph.set_source(node)
    }

    pub fn set_destination(&mut self, node: NodeId) -> Result<(), GraphError> {
        self.graph.set_destination(node)
    }

    /// Remove every node, edge, and ant.
    pub fn clear_environment(&mut self) {
        self.ants.clear();
        self.graph.clear();
        self.evaluator.clear();
        self.updater.reset();
        self.running = false;
        self.runtime = 0;
        self.tick_in_second = 0;
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    /// Start (or resume) the simulation. On a fresh start the colony is
    /// spawned at the source, one ant per colony-size slot.
    pub fn start(&mut self) -> Result<(), SimError> {
        let source = self.graph.source().ok_or(SimError::MissingSource)?;
        self.graph.destination().ok_or(SimError::MissingDestination)?;

        if self.ants.is_empty() {
            let position = self
                .graph
                .node(source)
                .ok_or(GraphError::NodeNotFound(source))?
                .position;
            for _ in 0..self.config.max_ants {
                let id = AntId(self.next_ant_id);
                self.next_ant_id += 1;
                self.ants.push(Ant::new(id, source, position));
            }
            self.event_bus.emit(Event::SimulationStarted {
                colony_size: self.config.max_ants,
                runtime: self.runtime,
            });
        }
        self.running = true;
        Ok(())
    }

    /// Freeze the colony in place. Ant state is left exactly where it was
    /// and `start` resumes it.
    pub fn stop(&mut self) {
        self.running = false;
        self.event_bus.emit(Event::SimulationStopped {
            runtime: self.runtime,
        });
    }

    /// Remove all ants, restore every edge to minimum pheromone and neutral
    /// traffic, and clear the best route and elapsed runtime.
    pub fn reset(&mut self) {
        self.ants.clear();
        self.graph.reset_edges();
        self.evaluator.clear();
        self.updater.reset();
        self.rng = SimRng::new(self.config.seed);
        self.running = false;
        self.runtime = 0;
        self.tick_in_second = 0;
        self.next_ant_id = 0;
        self.event_bus.emit(Event::SimulationReset { runtime: 0 });
    }

    // -----------------------------------------------------------------------
    // Tick loop
    // -----------------------------------------------------------------------

    /// One movement tick; every `ticks_per_second` calls, also one
    /// iteration tick. No-op while stopped.
    ///
    /// An [`SimError::InvalidTraversal`] halts the run: the engine stops
    /// and the error is returned rather than guessing a fallback.
    pub fn advance(&mut self) -> Result<TickReport, SimError> {
        if !self.running {
            return Ok(TickReport {
                ticked: false,
                iteration_completed: false,
                runtime: self.runtime,
            });
        }

        for idx in 0..self.ants.len() {
            if let Err(err) = self.step_ant(idx) {
                if let SimError::InvalidTraversal { ant, node } = err {
                    self.event_bus.emit(Event::SimulationHalted {
                        ant,
                        node,
                        runtime: self.runtime,
                    });
                }
                self.running = false;
                return Err(err);
            }
        }

        self.tick_in_second += 1;
        let iteration_completed = self.tick_in_second >= self.config.ticks_per_second;
        if iteration_completed {
            self.tick_in_second = 0;
            self.runtime += 1;
            self.end_iteration();
        }

        Ok(TickReport {
            ticked: true,
            iteration_completed,
            runtime: self.runtime,
        })
    }

    fn end_iteration(&mut self) {
        let best_cost = self.evaluator.live_best_cost(&self.graph);
        let outcome = match best_cost {
            Some(cost) => self
                .updater
                .end_iteration(&mut self.graph, Some((self.evaluator.best_edges(), cost))),
            None => self.updater.end_iteration(&mut self.graph, None),
        };
        if outcome.stagnation_refreshed {
            self.event_bus.emit(Event::StagnationRefresh {
                threshold: self.config.stagnation_limit,
                runtime: self.runtime,
            });
        }
        // Refresh the displayed best cost at current traffic.
        self.event_bus.emit(Event::IterationCompleted {
            best_cost: self.evaluator.live_best_cost(&self.graph),
            runtime: self.runtime,
        });
    }

    // -----------------------------------------------------------------------
    // Per-ant state machine
    // -----------------------------------------------------------------------

    fn step_ant(&mut self, idx: usize) -> Result<(), SimError> {
        let next = self.ants[idx].next_node;
        match next {
            None => {
                if self.ants[idx].outbound {
                    self.outbound_choose(idx)
                } else {
                    self.begin_backtrack(idx);
                    Ok(())
                }
            }
            Some(next) => {
                if self.arrived(idx, next)? {
                    if self.ants[idx].outbound {
                        self.outbound_arrival(idx, next)
                    } else {
                        self.inbound_arrival(idx, next);
                        Ok(())
                    }
                } else {
                    self.ants[idx].travel(&self.graph, self.speed);
                    Ok(())
                }
            }
        }
    }

    fn arrived(&self, idx: usize, next: NodeId) -> Result<bool, SimError> {
        let target = self
            .graph
            .node(next)
            .ok_or(GraphError::NodeNotFound(next))?
            .position;
        Ok(self.ants[idx].position.distance(target) < self.arrival_threshold)
    }

    /// Outbound choosing phase. The hop to an adjacent destination skips
    /// random selection and is recorded at arrival, so it is pushed exactly
    /// once.
    fn outbound_choose(&mut self, idx: usize) -> Result<(), SimError> {
        let current = self.ants[idx].current_node;
        if let Some(destination) = self.graph.destination()
            && let Some(edge) = self.graph.edge_between(current, destination)
        {
            let ant = &mut self.ants[idx];
            ant.next_node = Some(destination);
            ant.current_edge = Some(edge);
            ant.set_prev_edge(Some(edge));
            return Ok(());
        }
        self.ants[idx].choose_edge(&self.graph, &mut self.rng)?;
        Ok(())
    }

    fn outbound_arrival(&mut self, idx: usize, next: NodeId) -> Result<(), SimError> {
        let position = self
            .graph
            .node(next)
            .ok_or(GraphError::NodeNotFound(next))?
            .position;
        let ant = &mut self.ants[idx];
        ant.position = position;
        ant.current_node = next;
        ant.next_node = None;

        if self.graph.is_destination(next) {
            let edge = ant.current_edge.ok_or(SimError::InvalidTraversal {
                ant: ant.id,
                node: next,
            })?;
            ant.push_final_leg(next, edge);

            let route = ant.edges_taken().to_vec();
            let ant_id = ant.id;
            let (verdict, cost) = self.evaluator.record(&self.graph, &route);
            let ant = &mut self.ants[idx];
            ant.last_route_cost = cost;
            ant.outbound = false;
            match verdict {
                RouteVerdict::NewBest => {
                    self.updater.note_improvement();
                    self.event_bus.emit(Event::RouteFound {
                        ant: ant_id,
                        cost,
                        runtime: self.runtime,
                    });
                }
                RouteVerdict::FollowingBest => {
                    self.event_bus.emit(Event::FollowingBestRoute {
                        ant: ant_id,
                        runtime: self.runtime,
                    });
                }
                RouteVerdict::Slower => {}
            }
        } else if self.graph.is_source(next) {
            // The random walk looped all the way home without finding the
            // destination; start the outbound leg over.
            ant.reset_route(next);
        }
        Ok(())
    }

    /// First inbound step: aim at the top of the recorded path. The top is
    /// the node the ant is standing on, so the next tick arrives instantly
    /// and starts popping legs.
    fn begin_backtrack(&mut self, idx: usize) {
        let ant = &mut self.ants[idx];
        ant.next_node = ant.nodes_taken().last().copied();
        ant.current_edge = ant.edges_taken().last().copied();
    }

    fn inbound_arrival(&mut self, idx: usize, next: NodeId) {
        let position = self
            .graph
            .node(next)
            .map(|n| n.position)
            .unwrap_or(self.ants[idx].position);
        let ant = &mut self.ants[idx];
        ant.position = position;
        ant.current_node = next;
        ant.next_node = None;

        if self.graph.is_source(next) {
            // Round trip complete; flip outbound and re-depart next tick.
            ant.outbound = true;
            ant.reset_route(next);
        } else if let Some((edge, top)) = ant.pop_leg() {
            // Walk the popped edge back toward the new stack top. Under AS
            // this is where the route deposit lands, sized by this ant's
            // own route cost.
            ant.current_edge = Some(edge);
            ant.next_node = Some(top);
            let cost = ant.last_route_cost;
            self.updater
                .backtrack_deposit(&mut self.graph, edge, cost);
        } else if let Some(source) = self.graph.source() {
            // Replay exhausted without reaching the source node; head
            // straight for it.
            ant.next_node = Some(source);
        }
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Simulated seconds elapsed (equals completed iterations).
    pub fn runtime(&self) -> u64 {
        self.runtime
    }

    pub fn colony_size(&self) -> usize {
        self.ants.len()
    }

    pub fn ants_visible(&self) -> bool {
        self.ants_visible
    }

    pub fn set_ants_visible(&mut self, visible: bool) {
        self.ants_visible = visible;
    }

    /// Read-only access to an ant, for tests and diagnostics.
    pub fn ant(&self, idx: usize) -> Option<&Ant> {
        self.ants.get(idx)
    }

    /// The PRNG state, for determinism checks.
    pub fn rng_state(&self) -> u64 {
        self.rng.state()
    }

    /// Owned per-ant views for rendering.
    pub fn ant_snapshots(&self) -> Vec<AntSnapshot> {
        self.ants
            .iter()
            .map(|ant| AntSnapshot {
                id: ant.id,
                x: ant.position.x,
                y: ant.position.y,
                outbound: ant.outbound,
                visible: self.ants_visible,
            })
            .collect()
    }

    /// The best route and its cost at current traffic, if one exists.
    pub fn best_route(&self) -> Option<BestRouteView> {
        let live_cost = self.evaluator.live_best_cost(&self.graph)?;
        Some(BestRouteView {
            edges: self.evaluator.best_edges().to_vec(),
            live_cost,
        })
    }

    /// Owned per-edge views for rendering.
    pub fn edge_snapshots(&self) -> Vec<EdgeSnapshot> {
        self.graph
            .iter_edges()
            .map(|(id, data)| EdgeSnapshot {
                id,
                display_id: data.display_id,
                endpoints: data.endpoints,
                pheromone_level: self.graph.pheromone_level(id).unwrap_or(0),
                traffic: data.traffic(),
                cost: data.cost(),
            })
            .collect()
    }

    /// Owned per-node views for rendering.
    pub fn node_views(&self) -> Vec<NodeView> {
        self.graph
            .iter_nodes()
            .map(|(id, data)| NodeView {
                id,
                display_id: data.display_id,
                position: data.position,
                is_source: data.is_source,
                is_destination: data.is_destination,
                degree: self.graph.degree(id),
            })
            .collect()
    }
}
