//! Typed event system with pre-allocated ring buffers.
//!
//! The engine never writes logs itself: it emits structured events carrying
//! the simulated runtime second, and presentation-side consumers subscribe
//! or poll. Each event kind has its own [`EventBuffer`] ring buffer with a
//! configurable capacity.
//!
//! # Suppression
//!
//! Event kinds can be suppressed via [`EventBus::suppress`], which prevents
//! any allocation or recording for that kind. Suppressed events have zero
//! cost.

use crate::fixed::Fixed64;
use crate::id::{AntId, EdgeId, NodeId};

// ---------------------------------------------------------------------------
// Event types
// ---------------------------------------------------------------------------

/// A simulation event. All events carry the runtime second at which they
/// occurred.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    // -- Editor --
    NodeAdded {
        node: NodeId,
        runtime: u64,
    },
    NodeRemoved {
        node: NodeId,
        runtime: u64,
    },
    EdgeAdded {
        edge: EdgeId,
        a: NodeId,
        b: NodeId,
        runtime: u64,
    },
    EdgeRemoved {
        edge: EdgeId,
        runtime: u64,
    },
    TrafficChanged {
        edge: EdgeId,
        traffic: Fixed64,
        runtime: u64,
    },

    // -- Routes --
    RouteFound {
        ant: AntId,
        cost: Fixed64,
        runtime: u64,
    },
    FollowingBestRoute {
        ant: AntId,
        runtime: u64,
    },
    BestRouteInvalidated {
        edge: EdgeId,
        runtime: u64,
    },

    // -- Iterations --
    StagnationRefresh {
        threshold: u32,
        runtime: u64,
    },
    IterationCompleted {
        best_cost: Option<Fixed64>,
        runtime: u64,
    },

    // -- Lifecycle --
    SimulationStarted {
        colony_size: u32,
        runtime: u64,
    },
    SimulationStopped {
        runtime: u64,
    },
    SimulationReset {
        runtime: u64,
    },
    SimulationHalted {
        ant: AntId,
        node: NodeId,
        runtime: u64,
    },
}

/// Discriminant tag for event types, used for suppression and filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    NodeAdded,
    NodeRemoved,
    EdgeAdded,
    EdgeRemoved,
    TrafficChanged,
    RouteFound,
    FollowingBestRoute,
    BestRouteInvalidated,
    StagnationRefresh,
    IterationCompleted,
    SimulationStarted,
    SimulationStopped,
    SimulationReset,
    SimulationHalted,
}

/// Total number of event kinds.
const EVENT_KIND_COUNT: usize = 14;

/// Severity for text rendering of an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl Event {
    /// Get the discriminant kind for this event.
    pub fn kind(&self) -> EventKind {
        match self {
            Event::NodeAdded { .. } => EventKind::NodeAdded,
            Event::NodeRemoved { .. } => EventKind::NodeRemoved,
            Event::EdgeAdded { .. } => EventKind::EdgeAdded,
            Event::EdgeRemoved { .. } => EventKind::EdgeRemoved,
            Event::TrafficChanged { .. } => EventKind::TrafficChanged,
            Event::RouteFound { .. } => EventKind::RouteFound,
            Event::FollowingBestRoute { .. } => EventKind::FollowingBestRoute,
            Event::BestRouteInvalidated { .. } => EventKind::BestRouteInvalidated,
            Event::StagnationRefresh { .. } => EventKind::StagnationRefresh,
            Event::IterationCompleted { .. } => EventKind::IterationCompleted,
            Event::SimulationStarted { .. } => EventKind::SimulationStarted,
            Event::SimulationStopped { .. } => EventKind::SimulationStopped,
            Event::SimulationReset { .. } => EventKind::SimulationReset,
            Event::SimulationHalted { .. } => EventKind::SimulationHalted,
        }
    }

    /// The runtime second the event was emitted at.
    pub fn runtime(&self) -> u64 {
        match *self {
            Event::NodeAdded { runtime, .. }
            | Event::NodeRemoved { runtime, .. }
            | Event::EdgeAdded { runtime, .. }
            | Event::EdgeRemoved { runtime, .. }
            | Event::TrafficChanged { runtime, .. }
            | Event::RouteFound { runtime, .. }
            | Event::FollowingBestRoute { runtime, .. }
            | Event::BestRouteInvalidated { runtime, .. }
            | Event::StagnationRefresh { runtime, .. }
            | Event::IterationCompleted { runtime, .. }
            | Event::SimulationStarted { runtime, .. }
            | Event::SimulationStopped { runtime, .. }
            | Event::SimulationReset { runtime, .. }
            | Event::SimulationHalted { runtime, .. } => runtime,
        }
    }

    /// Severity for text log rendering.
    pub fn severity(&self) -> Severity {
        match self {
            Event::StagnationRefresh { .. } | Event::BestRouteInvalidated { .. } => {
                Severity::Warning
            }
            Event::SimulationHalted { .. } => Severity::Error,
            _ => Severity::Info,
        }
    }

    /// Numeric payload for route-found and stagnation events.
    pub fn payload(&self) -> Option<Fixed64> {
        match *self {
            Event::RouteFound { cost, .. } => Some(cost),
            Event::IterationCompleted { best_cost, .. } => best_cost,
            Event::StagnationRefresh { threshold, .. } => Some(Fixed64::from_num(threshold)),
            _ => None,
        }
    }

    /// Human-readable message for text log rendering.
    pub fn message(&self) -> String {
        match self {
            Event::NodeAdded { node, .. } => format!("Node added: {node:?}"),
            Event::NodeRemoved { node, .. } => format!("Node removed: {node:?}"),
            Event::EdgeAdded { edge, .. } => format!("Edge added: {edge:?}"),
            Event::EdgeRemoved { edge, .. } => format!("Edge removed: {edge:?}"),
            Event::TrafficChanged { edge, traffic, .. } => {
                format!("Traffic on {edge:?} now {traffic}")
            }
            Event::RouteFound { ant, cost, .. } => {
                format!("Ant {} found a new best route, cost {cost}", ant.0)
            }
            Event::FollowingBestRoute { ant, .. } => {
                format!("Ant {} is following the best route", ant.0)
            }
            Event::BestRouteInvalidated { edge, .. } => {
                format!("Best route lost edge {edge:?}")
            }
            Event::StagnationRefresh { threshold, .. } => {
                format!("No improvement for {threshold} iterations, refreshing pheromone")
            }
            Event::IterationCompleted { best_cost, .. } => match best_cost {
                Some(cost) => format!("Iteration complete, best route cost {cost}"),
                None => "Iteration complete, no route found yet".to_string(),
            },
            Event::SimulationStarted { colony_size, .. } => {
                format!("Simulation started with {colony_size} ants")
            }
            Event::SimulationStopped { .. } => "Simulation stopped".to_string(),
            Event::SimulationReset { .. } => "Environment reset".to_string(),
            Event::SimulationHalted { ant, node, .. } => {
                format!("Ant {} stranded at {node:?} with no edges, halting", ant.0)
            }
        }
    }
}

impl EventKind {
    /// Convert to usize index for array lookups.
    fn index(self) -> usize {
        self as usize
    }
}

// ---------------------------------------------------------------------------
// EventBuffer -- pre-allocated ring buffer
// ---------------------------------------------------------------------------

/// A pre-allocated ring buffer for events. Fixed capacity; when full, the
/// oldest events are dropped.
#[derive(Debug)]
pub struct EventBuffer {
    /// Pre-allocated storage.
    events: Vec<Option<Event>>,
    /// Write position (wraps around).
    head: usize,
    /// Number of events currently stored (may be less than capacity).
    len: usize,
    /// Total events ever written (including dropped).
    total_written: u64,
}

impl EventBuffer {
    /// Create a new ring buffer with the given capacity.
    /// A capacity of 0 is clamped to 1.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            events: (0..capacity).map(|_| None).collect(),
            head: 0,
            len: 0,
            total_written: 0,
        }
    }

    /// Push an event into the ring buffer. If full, the oldest event is
    /// dropped.
    pub fn push(&mut self, event: Event) {
        self.events[self.head] = Some(event);
        self.head = (self.head + 1) % self.capacity();
        if self.len < self.capacity() {
            self.len += 1;
        }
        self.total_written += 1;
    }

    /// The total capacity of the buffer.
    pub fn capacity(&self) -> usize {
        self.events.len()
    }

    /// Number of events currently stored.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Total events written since creation (including dropped).
    pub fn total_written(&self) -> u64 {
        self.total_written
    }

    /// Number of events that were dropped because the buffer was full.
    pub fn dropped_count(&self) -> u64 {
        self.total_written.saturating_sub(self.capacity() as u64)
    }

    /// Iterate over events in order from oldest to newest.
    pub fn iter(&self) -> EventBufferIter<'_> {
        let start = if self.len < self.capacity() {
            0
        } else {
            // head points to the next write position, which is the oldest entry
            self.head
        };
        EventBufferIter {
            buffer: self,
            index: start,
            remaining: self.len,
        }
    }

    /// Clear all events from the buffer.
    pub fn clear(&mut self) {
        for slot in &mut self.events {
            *slot = None;
        }
        self.head = 0;
        self.len = 0;
    }
}

/// Iterator over events in an [`EventBuffer`], from oldest to newest.
pub struct EventBufferIter<'a> {
    buffer: &'a EventBuffer,
    index: usize,
    remaining: usize,
}

impl<'a> Iterator for EventBufferIter<'a> {
    type Item = &'a Event;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let event = self.buffer.events[self.index].as_ref();
        self.index = (self.index + 1) % self.buffer.capacity();
        self.remaining -= 1;
        event
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for EventBufferIter<'_> {}

// ---------------------------------------------------------------------------
// Subscribers
// ---------------------------------------------------------------------------

/// A passive listener receives events read-only.
pub type PassiveListener = Box<dyn FnMut(&Event)>;

/// Priority level for event subscribers. Lower priorities run first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SubscriberPriority {
    Pre = 0,
    Normal = 1,
    Post = 2,
}

/// Optional predicate that filters events for a subscriber.
pub type EventFilter = Box<dyn Fn(&Event) -> bool>;

/// Wraps a listener with priority, optional filter, and insertion order.
struct SubscriberEntry {
    listener: PassiveListener,
    priority: SubscriberPriority,
    filter: Option<EventFilter>,
    insertion_order: u64,
}

impl std::fmt::Debug for SubscriberEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriberEntry")
            .field("priority", &self.priority)
            .field(
                "filter",
                &if self.filter.is_some() {
                    "Some(<fn>)"
                } else {
                    "None"
                },
            )
            .field("insertion_order", &self.insertion_order)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// The central event bus. Holds one ring buffer per event kind, subscriber
/// lists, and suppression flags.
pub struct EventBus {
    /// One ring buffer per event kind.
    buffers: [Option<EventBuffer>; EVENT_KIND_COUNT],

    /// Suppressed event kinds. Suppressed events are never buffered.
    suppressed: [bool; EVENT_KIND_COUNT],

    /// Subscribers indexed by event kind.
    subscribers: [Vec<SubscriberEntry>; EVENT_KIND_COUNT],

    /// Default buffer capacity for new event buffers.
    default_capacity: usize,

    /// Monotonically increasing counter for stable sort ordering.
    next_insertion_order: u64,
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("buffers", &self.buffers)
            .field("suppressed", &self.suppressed)
            .field("default_capacity", &self.default_capacity)
            .finish_non_exhaustive()
    }
}

const fn empty_subscriber_array() -> [Vec<SubscriberEntry>; EVENT_KIND_COUNT] {
    // Cannot use Default in const context, so we build it manually.
    [
        Vec::new(),
        Vec::new(),
        Vec::new(),
        Vec::new(),
        Vec::new(),
        Vec::new(),
        Vec::new(),
        Vec::new(),
        Vec::new(),
        Vec::new(),
        Vec::new(),
        Vec::new(),
        Vec::new(),
        Vec::new(),
    ]
}

impl EventBus {
    /// Create a new event bus with the given default buffer capacity per
    /// kind.
    pub fn new(default_capacity: usize) -> Self {
        Self {
            buffers: Default::default(),
            suppressed: [false; EVENT_KIND_COUNT],
            subscribers: empty_subscriber_array(),
            default_capacity,
            next_insertion_order: 0,
        }
    }

    /// Suppress an event kind. Suppressed events are never allocated or
    /// buffered.
    pub fn suppress(&mut self, kind: EventKind) {
        self.suppressed[kind.index()] = true;
        // Drop the buffer if it exists -- zero allocation for suppressed events.
        self.buffers[kind.index()] = None;
    }

    /// Check if an event kind is suppressed.
    pub fn is_suppressed(&self, kind: EventKind) -> bool {
        self.suppressed[kind.index()]
    }

    /// Emit an event. Stores it in the appropriate ring buffer. No-ops if
    /// the event kind is suppressed.
    pub fn emit(&mut self, event: Event) {
        let idx = event.kind().index();

        if self.suppressed[idx] {
            return;
        }

        // Lazily allocate buffer on first emit.
        let buffer = self.buffers[idx].get_or_insert_with(|| EventBuffer::new(self.default_capacity));
        buffer.push(event);
    }

    /// Register a passive listener for an event kind. Listeners are called
    /// in registration order during delivery with Normal priority and no
    /// filter.
    pub fn on_passive(&mut self, kind: EventKind, listener: PassiveListener) {
        self.on_passive_filtered(kind, SubscriberPriority::Normal, None, listener);
    }

    /// Register a passive listener with explicit priority and optional
    /// filter.
    pub fn on_passive_filtered(
        &mut self,
        kind: EventKind,
        priority: SubscriberPriority,
        filter: Option<EventFilter>,
        listener: PassiveListener,
    ) {
        let order = self.next_insertion_order;
        self.next_insertion_order += 1;
        self.subscribers[kind.index()].push(SubscriberEntry {
            listener,
            priority,
            filter,
            insertion_order: order,
        });
    }

    /// Deliver all buffered events to subscribers and clear the buffers.
    ///
    /// For each event kind that has buffered events:
    /// 1. Sort subscribers by `(priority, insertion_order)`.
    /// 2. Iterate events oldest-to-newest.
    /// 3. For each subscriber, check the optional filter; skip if it
    ///    returns false.
    /// 4. Call the listener.
    pub fn deliver(&mut self) {
        for idx in 0..EVENT_KIND_COUNT {
            if self.suppressed[idx] {
                continue;
            }

            let Some(buffer) = self.buffers[idx].as_ref() else {
                continue;
            };

            if buffer.is_empty() {
                continue;
            }

            // Collect events into a temporary Vec to avoid borrow conflicts
            // between the buffer and subscribers.
            let events: Vec<Event> = buffer.iter().cloned().collect();

            // Sort subscribers by (priority, insertion_order) for stable ordering.
            self.subscribers[idx]
                .sort_by_key(|entry| (entry.priority as u8, entry.insertion_order));

            for entry in &mut self.subscribers[idx] {
                for event in &events {
                    if let Some(ref filter) = entry.filter
                        && !filter(event)
                    {
                        continue;
                    }
                    (entry.listener)(event);
                }
            }

            if let Some(buffer) = self.buffers[idx].as_mut() {
                buffer.clear();
            }
        }
    }

    /// Get the event buffer for a specific event kind (read-only).
    pub fn buffer(&self, kind: EventKind) -> Option<&EventBuffer> {
        self.buffers[kind.index()].as_ref()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}
