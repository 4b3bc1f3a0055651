//! Data models for gantry control
//!
//! Provides the Cartesian position types, the machine profile and the
//! waypoint lookup seam.

pub mod profile;
pub mod waypoint;

use serde::{Deserialize, Serialize};
use std::fmt;

/// A Cartesian gantry axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    /// X axis
    X,
    /// Y axis
    Y,
    /// Z axis
    Z,
}

impl Axis {
    /// All axes in X, Y, Z order
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    /// G-code letter of the axis
    pub fn letter(&self) -> char {
        match self {
            Self::X => 'X',
            Self::Y => 'Y',
            Self::Z => 'Z',
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}

/// A concrete gantry position in millimeters
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    /// X-axis position
    pub x: f64,
    /// Y-axis position
    pub y: f64,
    /// Z-axis position
    pub z: f64,
}

impl Position {
    /// Create a new position with X, Y, Z coordinates
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Coordinate along one axis
    pub fn get(&self, axis: Axis) -> f64 {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
            Axis::Z => self.z,
        }
    }

    /// Copy of this position with one axis replaced
    pub fn with(mut self, axis: Axis, value: f64) -> Self {
        match axis {
            Axis::X => self.x = value,
            Axis::Y => self.y = value,
            Axis::Z => self.z = value,
        }
        self
    }

    /// Euclidean distance to another position
    pub fn distance_to(&self, other: &Position) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }

    /// True when X and Y both match exactly
    pub fn same_xy(&self, other: &Position) -> bool {
        self.x == other.x && self.y == other.y
    }

    /// Component-wise offset
    pub fn offset(&self, dx: f64, dy: f64, dz: f64) -> Self {
        Self::new(self.x + dx, self.y + dy, self.z + dz)
    }

    /// True when every component is finite
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

impl From<(f64, f64, f64)> for Position {
    fn from((x, y, z): (f64, f64, f64)) -> Self {
        Self::new(x, y, z)
    }
}

/// A partial target; unset axes keep their current value
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TargetPosition {
    /// Target X, if moving along X
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    /// Target Y, if moving along Y
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    /// Target Z, if moving along Z
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub z: Option<f64>,
}

impl TargetPosition {
    /// Create a target from optional components
    pub fn new(x: Option<f64>, y: Option<f64>, z: Option<f64>) -> Self {
        Self { x, y, z }
    }

    /// Create a fully specified target
    pub fn xyz(x: f64, y: f64, z: f64) -> Self {
        Self::new(Some(x), Some(y), Some(z))
    }

    /// Requested coordinate along one axis
    pub fn get(&self, axis: Axis) -> Option<f64> {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
            Axis::Z => self.z,
        }
    }

    /// Fill unset components from `current`
    pub fn resolve(&self, current: &Position) -> Position {
        Position::new(
            self.x.unwrap_or(current.x),
            self.y.unwrap_or(current.y),
            self.z.unwrap_or(current.z),
        )
    }

    /// True when no axis is set
    pub fn is_empty(&self) -> bool {
        self.x.is_none() && self.y.is_none() && self.z.is_none()
    }
}

impl From<Position> for TargetPosition {
    fn from(p: Position) -> Self {
        Self::xyz(p.x, p.y, p.z)
    }
}

impl From<(Option<f64>, Option<f64>, Option<f64>)> for TargetPosition {
    fn from((x, y, z): (Option<f64>, Option<f64>, Option<f64>)) -> Self {
        Self::new(x, y, z)
    }
}

impl fmt::Display for TargetPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let part = |v: Option<f64>| v.map_or_else(|| "-".to_string(), |v| v.to_string());
        write!(f, "({}, {}, {})", part(self.x), part(self.y), part(self.z))
    }
}
