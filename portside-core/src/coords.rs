//! World-space coordinate primitives shared by ports and routes.

use serde::{Deserialize, Serialize};

/// A point in the game world. Plane 0 is sea level, where all ports sit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorldPoint {
    pub x: i32,
    pub y: i32,
    #[serde(default)]
    pub plane: u8,
}

impl WorldPoint {
    #[must_use]
    pub const fn new(x: i32, y: i32, plane: u8) -> Self {
        Self { x, y, plane }
    }

    /// Sea-level point, the common case for route waypoints.
    #[must_use]
    pub const fn sea(x: i32, y: i32) -> Self {
        Self { x, y, plane: 0 }
    }

    /// Planar distance to another point, ignoring the plane.
    #[must_use]
    pub fn distance_to(self, other: Self) -> f64 {
        let dx = f64::from(self.x - other.x);
        let dy = f64::from(self.y - other.y);
        dx.hypot(dy)
    }
}

/// Total planar length of a polyline, summed over consecutive pairs.
#[must_use]
pub fn path_length(points: &[WorldPoint]) -> f64 {
    points
        .windows(2)
        .map(|pair| pair[0].distance_to(pair[1]))
        .sum()
}
