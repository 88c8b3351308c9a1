//! Colony statistics module.
//!
//! Listens to engine events (`RouteFound`, `FollowingBestRoute`,
//! `IterationCompleted`, `StagnationRefresh`, ...) and aggregates them into
//! counters and a rolling best-cost history, using [`Fixed64`] arithmetic
//! throughout.
//!
//! # Usage
//!
//! ```ignore
//! let mut stats = ColonyStats::new(StatsConfig::default());
//! // Drain the engine's event buffers each frame:
//! stats.process_event(&event);
//! // Query metrics:
//! let trend = stats.mean_best_cost(60);
//! ```

use formica_core::event::Event;
use formica_core::fixed::Fixed64;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Configuration for the statistics module.
#[derive(Debug, Clone)]
pub struct StatsConfig {
    /// Number of per-iteration best-cost samples to retain.
    pub history_capacity: usize,
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            history_capacity: 256,
        }
    }
}

// ---------------------------------------------------------------------------
// CostHistory — ring buffer of per-iteration best costs
// ---------------------------------------------------------------------------

/// A fixed-capacity ring buffer of [`Fixed64`] samples for trend analysis.
///
/// When full, the oldest sample is overwritten. Iterates oldest-to-newest.
#[derive(Debug, Clone)]
pub struct CostHistory {
    data: Vec<Fixed64>,
    head: usize,
    len: usize,
}

impl CostHistory {
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "CostHistory capacity must be > 0");
        Self {
            data: vec![Fixed64::ZERO; capacity],
            head: 0,
            len: 0,
        }
    }

    /// Push a sample, overwriting the oldest if at capacity.
    pub fn push(&mut self, value: Fixed64) {
        self.data[self.head] = value;
        self.head = (self.head + 1) % self.capacity();
        if self.len < self.capacity() {
            self.len += 1;
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// The most recently pushed sample, if any.
    pub fn latest(&self) -> Option<Fixed64> {
        if self.len == 0 {
            return None;
        }
        let idx = if self.head == 0 {
            self.capacity() - 1
        } else {
            self.head - 1
        };
        Some(self.data[idx])
    }

    /// Iterate samples from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = Fixed64> + '_ {
        let start = if self.len < self.capacity() {
            0
        } else {
            self.head
        };
        (0..self.len).map(move |i| self.data[(start + i) % self.capacity()])
    }

    /// Mean of the newest `window` samples (or all, if fewer).
    pub fn mean(&self, window: usize) -> Option<Fixed64> {
        if self.len == 0 || window == 0 {
            return None;
        }
        let take = window.min(self.len);
        let sum: Fixed64 = self.iter().skip(self.len - take).sum();
        Some(sum / Fixed64::from_num(take as u32))
    }

    pub fn clear(&mut self) {
        self.head = 0;
        self.len = 0;
    }
}

// ---------------------------------------------------------------------------
// ColonyStats
// ---------------------------------------------------------------------------

/// Rolling colony metrics, fed from the engine's event stream.
#[derive(Debug, Clone)]
pub struct ColonyStats {
    history: CostHistory,

    routes_found: u64,
    routes_followed: u64,
    iterations: u64,
    stagnation_refreshes: u64,
    traffic_changes: u64,
    invalidations: u64,
    halts: u64,

    last_best_cost: Option<Fixed64>,
}

impl ColonyStats {
    pub fn new(config: StatsConfig) -> Self {
        Self {
            history: CostHistory::new(config.history_capacity),
            routes_found: 0,
            routes_followed: 0,
            iterations: 0,
            stagnation_refreshes: 0,
            traffic_changes: 0,
            invalidations: 0,
            halts: 0,
            last_best_cost: None,
        }
    }

    /// Fold one engine event into the metrics. Unrelated events are ignored,
    /// so the whole stream can be fed through unfiltered.
    pub fn process_event(&mut self, event: &Event) {
        match event {
            Event::RouteFound { cost, .. } => {
                self.routes_found += 1;
                self.last_best_cost = Some(*cost);
            }
            Event::FollowingBestRoute { .. } => {
                self.routes_followed += 1;
            }
            Event::IterationCompleted { best_cost, .. } => {
                self.iterations += 1;
                if let Some(cost) = best_cost {
                    self.history.push(*cost);
                    self.last_best_cost = Some(*cost);
                }
            }
            Event::StagnationRefresh { .. } => {
                self.stagnation_refreshes += 1;
            }
            Event::TrafficChanged { .. } => {
                self.traffic_changes += 1;
            }
            Event::BestRouteInvalidated { .. } => {
                self.invalidations += 1;
                self.last_best_cost = None;
            }
            Event::SimulationHalted { .. } => {
                self.halts += 1;
            }
            Event::SimulationReset { .. } => {
                self.reset();
            }
            _ => {}
        }
    }

    /// Clear everything, as after an environment reset.
    pub fn reset(&mut self) {
        self.history.clear();
        self.routes_found = 0;
        self.routes_followed = 0;
        self.iterations = 0;
        self.stagnation_refreshes = 0;
        self.traffic_changes = 0;
        self.invalidations = 0;
        self.last_best_cost = None;
    }

    pub fn routes_found(&self) -> u64 {
        self.routes_found
    }

    pub fn routes_followed(&self) -> u64 {
        self.routes_followed
    }

    pub fn iterations(&self) -> u64 {
        self.iterations
    }

    pub fn stagnation_refreshes(&self) -> u64 {
        self.stagnation_refreshes
    }

    pub fn traffic_changes(&self) -> u64 {
        self.traffic_changes
    }

    pub fn invalidations(&self) -> u64 {
        self.invalidations
    }

    pub fn halts(&self) -> u64 {
        self.halts
    }

    /// The best route cost as of the latest relevant event, if any route
    /// currently stands.
    pub fn last_best_cost(&self) -> Option<Fixed64> {
        self.last_best_cost
    }

    /// Rolling mean of the best cost over the newest `window` iterations.
    pub fn mean_best_cost(&self, window: usize) -> Option<Fixed64> {
        self.history.mean(window)
    }

    /// Share of destination arrivals that re-used the standing best route.
    /// `None` until any arrival has been recorded.
    pub fn follow_ratio(&self) -> Option<Fixed64> {
        let total = self.routes_found + self.routes_followed;
        if total == 0 {
            return None;
        }
        Some(Fixed64::from_num(self.routes_followed as u32) / Fixed64::from_num(total as u32))
    }

    pub fn history(&self) -> &CostHistory {
        &self.history
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use formica_core::id::AntId;
    use formica_core::test_utils::fixed;

    fn route_found(cost: f64) -> Event {
        Event::RouteFound {
            ant: AntId(0),
            cost: fixed(cost),
            runtime: 0,
        }
    }

    fn iteration(best: Option<f64>) -> Event {
        Event::IterationCompleted {
            best_cost: best.map(fixed),
            runtime: 0,
        }
    }

    #[test]
    fn history_overwrites_oldest_when_full() {
        let mut history = CostHistory::new(3);
        for v in [1.0, 2.0, 3.0, 4.0, 5.0] {
            history.push(fixed(v));
        }
        assert_eq!(history.len(), 3);
        let samples: Vec<Fixed64> = history.iter().collect();
        assert_eq!(samples, vec![fixed(3.0), fixed(4.0), fixed(5.0)]);
        assert_eq!(history.latest(), Some(fixed(5.0)));
    }

    #[test]
    fn mean_uses_newest_window() {
        let mut history = CostHistory::new(8);
        for v in [10.0, 20.0, 30.0, 40.0] {
            history.push(fixed(v));
        }
        assert_eq!(history.mean(2), Some(fixed(35.0)));
        assert_eq!(history.mean(100), Some(fixed(25.0)));
        assert_eq!(history.mean(0), None);
        assert_eq!(CostHistory::new(4).mean(2), None);
    }

    #[test]
    fn counters_track_the_event_stream() {
        let mut stats = ColonyStats::new(StatsConfig::default());
        stats.process_event(&route_found(35.0));
        stats.process_event(&route_found(20.0));
        stats.process_event(&Event::FollowingBestRoute {
            ant: AntId(1),
            runtime: 0,
        });
        stats.process_event(&iteration(Some(20.0)));
        stats.process_event(&Event::StagnationRefresh {
            threshold: 20,
            runtime: 1,
        });

        assert_eq!(stats.routes_found(), 2);
        assert_eq!(stats.routes_followed(), 1);
        assert_eq!(stats.iterations(), 1);
        assert_eq!(stats.stagnation_refreshes(), 1);
        assert_eq!(stats.last_best_cost(), Some(fixed(20.0)));
        assert_eq!(stats.mean_best_cost(10), Some(fixed(20.0)));
    }

    #[test]
    fn follow_ratio_counts_arrivals() {
        let mut stats = ColonyStats::new(StatsConfig::default());
        assert_eq!(stats.follow_ratio(), None);

        stats.process_event(&route_found(20.0));
        for _ in 0..3 {
            stats.process_event(&Event::FollowingBestRoute {
                ant: AntId(2),
                runtime: 0,
            });
        }
        assert_eq!(stats.follow_ratio(), Some(fixed(0.75)));
    }

    #[test]
    fn iterations_without_a_best_route_add_no_samples() {
        let mut stats = ColonyStats::new(StatsConfig::default());
        stats.process_event(&iteration(None));
        stats.process_event(&iteration(None));
        assert_eq!(stats.iterations(), 2);
        assert!(stats.history().is_empty());
        assert_eq!(stats.last_best_cost(), None);
    }

    #[test]
    fn reset_event_clears_everything() {
        let mut stats = ColonyStats::new(StatsConfig::default());
        stats.process_event(&route_found(20.0));
        stats.process_event(&iteration(Some(20.0)));
        stats.process_event(&Event::SimulationReset { runtime: 0 });

        assert_eq!(stats.routes_found(), 0);
        assert_eq!(stats.iterations(), 0);
        assert!(stats.history().is_empty());
        assert_eq!(stats.last_best_cost(), None);
    }
}
