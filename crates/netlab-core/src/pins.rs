//! Connection points and their logical geometry
//!
//! Pins are symbolic; a pin becomes a coordinate only when resolved against
//! a component's center and size. The geometry here is logical (used to
//! describe link endpoints and coverage), not pixel layout.

use serde::{Deserialize, Serialize};

/// Default logical width/height of a component
pub const DEFAULT_SIZE: f64 = 120.0;

/// A point in logical units
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// An axis-aligned rectangle given by its origin (top-left) and size
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub origin: Point,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    /// Rectangle of the given size centered on `center`
    pub fn centered(center: Point, width: f64, height: f64) -> Self {
        Self {
            origin: Point::new(center.x - width / 2.0, center.y - height / 2.0),
            width,
            height,
        }
    }

    /// Inclusive containment
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.origin.x
            && point.x <= self.origin.x + self.width
            && point.y >= self.origin.y
            && point.y <= self.origin.y + self.height
    }
}

/// A named attachment point on a component
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ConnectionPoint {
    Top,
    Bottom,
    Left,
    Right,
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl ConnectionPoint {
    pub const SIDES: [ConnectionPoint; 4] = [
        ConnectionPoint::Top,
        ConnectionPoint::Bottom,
        ConnectionPoint::Left,
        ConnectionPoint::Right,
    ];

    pub const ALL: [ConnectionPoint; 8] = [
        ConnectionPoint::Top,
        ConnectionPoint::Bottom,
        ConnectionPoint::Left,
        ConnectionPoint::Right,
        ConnectionPoint::TopLeft,
        ConnectionPoint::TopRight,
        ConnectionPoint::BottomLeft,
        ConnectionPoint::BottomRight,
    ];

    /// Unit offset from the center, scaled by half-size in [`position`]
    fn unit_offset(self) -> (f64, f64) {
        match self {
            ConnectionPoint::Top => (0.0, -1.0),
            ConnectionPoint::Bottom => (0.0, 1.0),
            ConnectionPoint::Left => (-1.0, 0.0),
            ConnectionPoint::Right => (1.0, 0.0),
            ConnectionPoint::TopLeft => (-1.0, -1.0),
            ConnectionPoint::TopRight => (1.0, -1.0),
            ConnectionPoint::BottomLeft => (-1.0, 1.0),
            ConnectionPoint::BottomRight => (1.0, 1.0),
        }
    }
}

impl std::fmt::Display for ConnectionPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ConnectionPoint::Top => "top",
            ConnectionPoint::Bottom => "bottom",
            ConnectionPoint::Left => "left",
            ConnectionPoint::Right => "right",
            ConnectionPoint::TopLeft => "top-left",
            ConnectionPoint::TopRight => "top-right",
            ConnectionPoint::BottomLeft => "bottom-left",
            ConnectionPoint::BottomRight => "bottom-right",
        };
        f.write_str(s)
    }
}

/// Error returned when a string names no connection point
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown connection point: {0}")]
pub struct UnknownConnectionPoint(pub String);

impl std::str::FromStr for ConnectionPoint {
    type Err = UnknownConnectionPoint;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ConnectionPoint::ALL
            .into_iter()
            .find(|p| p.to_string().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownConnectionPoint(s.to_string()))
    }
}

/// Resolve a pin against a component of default size
pub fn position(pin: ConnectionPoint, center: Point) -> Point {
    position_sized(pin, center, DEFAULT_SIZE, DEFAULT_SIZE)
}

/// Resolve a pin against a component of the given size
///
/// Side pins sit on the midpoint of their edge, corner pins on the corner.
pub fn position_sized(pin: ConnectionPoint, center: Point, width: f64, height: f64) -> Point {
    let (dx, dy) = pin.unit_offset();
    Point::new(center.x + dx * width / 2.0, center.y + dy * height / 2.0)
}

/// The spatial zone a broadcasting component covers
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CoverageZone {
    pub width: f64,
    pub height: f64,
}

impl CoverageZone {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn bounds(&self, center: Point) -> Rect {
        area_bounds(center, self.width, self.height)
    }

    pub fn contains(&self, center: Point, point: Point) -> bool {
        self.bounds(center).contains(point)
    }
}

impl Default for CoverageZone {
    fn default() -> Self {
        Self::new(DEFAULT_SIZE, DEFAULT_SIZE)
    }
}

/// Area a component occupies around `center`
pub fn area_bounds(center: Point, width: f64, height: f64) -> Rect {
    Rect::centered(center, width, height)
}

/// Whether `point` falls inside the default-size area around `center`
pub fn contains_point(point: Point, center: Point) -> bool {
    area_bounds(center, DEFAULT_SIZE, DEFAULT_SIZE).contains(point)
}
