//! 2D positions in fixed-point, with the Euclidean metric the engine uses
//! for base edge costs and ant movement.

use crate::fixed::{self, Fixed64};
use serde::{Deserialize, Serialize};

/// A point in the plane, in Q32.32 coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub x: Fixed64,
    pub y: Fixed64,
}

impl Position {
    pub fn new(x: Fixed64, y: Fixed64) -> Self {
        Self { x, y }
    }

    /// Construct from f64 coordinates. Initialization only.
    pub fn from_f64(x: f64, y: f64) -> Self {
        Self {
            x: Fixed64::from_num(x),
            y: Fixed64::from_num(y),
        }
    }

    /// Euclidean distance to another position.
    pub fn distance(self, other: Self) -> Fixed64 {
        let dx = (self.x - other.x).abs();
        let dy = (self.y - other.y).abs();
        fixed::sqrt(dx * dx + dy * dy)
    }
}
