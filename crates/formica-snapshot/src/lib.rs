//! Environment persistence for the colony engine.
//!
//! Captures a [`WaypointGraph`] into a portable, versioned binary blob via
//! `bitcode`. Records are keyed by display ids rather than slotmap keys, so
//! a snapshot survives any number of insert/remove cycles and can be
//! restored into a freshly allocated graph.
//!
//! Ant state is deliberately not captured: a restored environment starts
//! cold, the way an environment loaded from disk always has.

use std::collections::HashMap;

use formica_core::fixed::Fixed64;
use formica_core::fixed::f64_to_fixed64;
use formica_core::geom::Position;
use formica_core::graph::{GraphError, WaypointGraph};
use formica_core::id::NodeId;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Magic number identifying a colony environment snapshot.
pub const SNAPSHOT_MAGIC: u32 = 0xA0C0_0001;

/// Current format version. Increment when breaking the wire format.
pub const FORMAT_VERSION: u32 = 1;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors raised while encoding, decoding, or restoring a snapshot.
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("bitcode encoding failed: {0}")]
    Encode(String),
    #[error("bitcode decoding failed: {0}")]
    Decode(String),
    #[error("invalid magic number: expected 0x{:08X}, got 0x{:08X}", SNAPSHOT_MAGIC, .0)]
    InvalidMagic(u32),
    #[error("snapshot from future version {0} (this build supports up to {FORMAT_VERSION})")]
    FutureVersion(u32),
    #[error("unsupported format version: expected {}, got {}", FORMAT_VERSION, .0)]
    UnsupportedVersion(u32),
    #[error("edge {edge} references node {node}, which is not in the snapshot")]
    MissingEndpoints { edge: u32, node: u32 },
    #[error(transparent)]
    Graph(#[from] GraphError),
}

// ---------------------------------------------------------------------------
// Snapshot header
// ---------------------------------------------------------------------------

/// Header prepended to every snapshot, validated before the payload is
/// trusted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotHeader {
    pub magic: u32,
    pub version: u32,
}

impl SnapshotHeader {
    pub fn new() -> Self {
        Self {
            magic: SNAPSHOT_MAGIC,
            version: FORMAT_VERSION,
        }
    }

    pub fn validate(&self) -> Result<(), SnapshotError> {
        if self.magic != SNAPSHOT_MAGIC {
            return Err(SnapshotError::InvalidMagic(self.magic));
        }
        if self.version > FORMAT_VERSION {
            return Err(SnapshotError::FutureVersion(self.version));
        }
        if self.version < FORMAT_VERSION {
            return Err(SnapshotError::UnsupportedVersion(self.version));
        }
        Ok(())
    }
}

impl Default for SnapshotHeader {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// One node, keyed by its display id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeRecord {
    pub id: u32,
    pub x: Fixed64,
    pub y: Fixed64,
    pub source: bool,
    pub destination: bool,
}

/// One edge, endpoints given as node display ids. The base cost is not
/// stored: it is the endpoint distance and is recomputed on restore, so a
/// rescaled snapshot gets correctly rescaled costs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdgeRecord {
    pub id: u32,
    pub a: u32,
    pub b: u32,
    pub pheromone: Fixed64,
    pub traffic: Fixed64,
}

// ---------------------------------------------------------------------------
// EnvironmentSnapshot
// ---------------------------------------------------------------------------

/// A complete, portable copy of a waypoint graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvironmentSnapshot {
    header: SnapshotHeader,
    max_nodes: usize,
    max_degree: usize,
    nodes: Vec<NodeRecord>,
    edges: Vec<EdgeRecord>,
}

impl EnvironmentSnapshot {
    /// Capture the current graph. Records are sorted by display id so the
    /// encoded bytes are independent of slot allocation history.
    pub fn capture(graph: &WaypointGraph) -> Self {
        let mut nodes: Vec<NodeRecord> = graph
            .iter_nodes()
            .map(|(id, data)| NodeRecord {
                id: data.display_id,
                x: data.position.x,
                y: data.position.y,
                source: graph.is_source(id),
                destination: graph.is_destination(id),
            })
            .collect();
        nodes.sort_by_key(|n| n.id);

        let mut edges: Vec<EdgeRecord> = graph
            .iter_edges()
            .map(|(_, data)| {
                let [a, b] = data.endpoints;
                EdgeRecord {
                    id: data.display_id,
                    a: graph.node(a).map_or(u32::MAX, |n| n.display_id),
                    b: graph.node(b).map_or(u32::MAX, |n| n.display_id),
                    pheromone: data.pheromone(),
                    traffic: data.traffic(),
                }
            })
            .collect();
        edges.sort_by_key(|e| e.id);

        Self {
            header: SnapshotHeader::new(),
            max_nodes: graph.max_nodes(),
            max_degree: graph.max_degree(),
            nodes,
            edges,
        }
    }

    pub fn node_records(&self) -> &[NodeRecord] {
        &self.nodes
    }

    pub fn edge_records(&self) -> &[EdgeRecord] {
        &self.edges
    }

    /// Encode to a binary blob.
    pub fn to_bytes(&self) -> Result<Vec<u8>, SnapshotError> {
        bitcode::serialize(self).map_err(|e| SnapshotError::Encode(e.to_string()))
    }

    /// Decode from a binary blob and validate the header.
    pub fn from_bytes(data: &[u8]) -> Result<Self, SnapshotError> {
        let snapshot: Self =
            bitcode::deserialize(data).map_err(|e| SnapshotError::Decode(e.to_string()))?;
        snapshot.header.validate()?;
        Ok(snapshot)
    }

    /// Build a fresh graph from the records.
    ///
    /// Nodes and edges are inserted in display-id order, so incident-edge
    /// ordering (which selection iterates) is reproduced deterministically.
    /// Display ids are reassigned by the new graph; the record ids only wire
    /// edges to endpoints.
    pub fn restore(&self) -> Result<WaypointGraph, SnapshotError> {
        let mut graph = WaypointGraph::new(self.max_nodes, self.max_degree);
        let mut by_id: HashMap<u32, NodeId> = HashMap::with_capacity(self.nodes.len());

        for record in &self.nodes {
            let node = graph.add_node(Position {
                x: record.x,
                y: record.y,
            })?;
            by_id.insert(record.id, node);
            if record.source {
                graph.set_source(node)?;
            }
            if record.destination {
                graph.set_destination(node)?;
            }
        }

        for record in &self.edges {
            let a = *by_id
                .get(&record.a)
                .ok_or(SnapshotError::MissingEndpoints {
                    edge: record.id,
                    node: record.a,
                })?;
            let b = *by_id
                .get(&record.b)
                .ok_or(SnapshotError::MissingEndpoints {
                    edge: record.id,
                    node: record.b,
                })?;
            let edge = graph.connect(a, b)?;
            graph.set_pheromone(edge, record.pheromone, false)?;
            graph.set_traffic(edge, record.traffic)?;
        }

        Ok(graph)
    }

    /// Scale every node position. Restored edge costs follow, since the
    /// base cost is recomputed from positions.
    pub fn rescale(&mut self, sx: f64, sy: f64) {
        let sx = f64_to_fixed64(sx);
        let sy = f64_to_fixed64(sy);
        for node in &mut self.nodes {
            node.x *= sx;
            node.y *= sy;
        }
    }
}

// ===========================================================================
// Tests
// ===========================================================================
