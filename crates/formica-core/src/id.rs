use serde::{Deserialize, Serialize};
use slotmap::new_key_type;

new_key_type! {
    /// Identifies a node (waypoint) in the graph.
    pub struct NodeId;

    /// Identifies an edge (path segment) in the graph.
    pub struct EdgeId;
}

/// Identifies an ant in the colony. Cheap to copy and compare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AntId(pub u32);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ant_id_equality() {
        let a = AntId(0);
        let b = AntId(0);
        let c = AntId(1);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn ant_ids_are_hashable() {
        use std::collections::HashMap;
        let mut map = HashMap::new();
        map.insert(AntId(0), "scout");
        map.insert(AntId(1), "worker");
        assert_eq!(map[&AntId(0)], "scout");
    }
}
