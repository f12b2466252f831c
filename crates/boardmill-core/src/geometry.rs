//! Planar coordinates on the board.

use crate::units::Length;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A position on the board, relative to the machining origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Coordinate {
    pub x: Length,
    pub y: Length,
}

impl Coordinate {
    /// Create a coordinate from two lengths.
    pub const fn new(x: Length, y: Length) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another coordinate.
    pub fn distance_to(&self, other: &Coordinate) -> Length {
        let dx = (self.x - other.x).as_um() as f64;
        let dy = (self.y - other.y).as_um() as f64;
        Length::from_um(dx.hypot(dy).round() as i64)
    }

    /// Linear interpolation towards `other`; `t` in `[0, 1]`.
    pub fn lerp(&self, other: &Coordinate, t: f64) -> Coordinate {
        Coordinate {
            x: self.x + (other.x - self.x) * t,
            y: self.y + (other.y - self.y) * t,
        }
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}
