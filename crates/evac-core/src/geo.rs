//! Planar plan coordinates.
//!
//! Waypoint positions are projected floor-plan coordinates in which one unit
//! is taken as one metre.  The projection fixes `y` increasing downward
//! (screen convention), which is what [`Point::turn_angle_deg`] assumes.

use serde::{Deserialize, Serialize};

/// A projected 2-D position on the floor plan.
#[derive(Copy, Clone, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    #[inline]
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance in metres.
    #[inline]
    pub fn distance(self, other: Point) -> f32 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Signed angle in degrees between segment `prev → self` and segment
    /// `self → next`, in `(-180, 180]`.
    ///
    /// The sign comes from the cross product and the magnitude from
    /// `atan2(cross, dot)`.  Collinear segments give `0.0`; a degenerate
    /// (zero-length) segment also gives `0.0`.
    pub fn turn_angle_deg(prev: Point, at: Point, next: Point) -> f32 {
        let (ax, ay) = (at.x - prev.x, at.y - prev.y);
        let (bx, by) = (next.x - at.x, next.y - at.y);
        let cross = ax * by - ay * bx;
        let dot   = ax * bx + ay * by;
        cross.atan2(dot).to_degrees()
    }
}

impl std::fmt::Display for Point {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.2}, {:.2})", self.x, self.y)
    }
}
