#[cfg(test)]
#[path = "math_test.rs"]
mod math_test;

use serde::{Deserialize, Serialize};

/// A point or offset in either normalized map space or pixel space.
///
/// Normalized values lie in `[0, 1]` relative to the map width/height. Which
/// space a particular value lives in is a property of the call site, not the
/// type.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vector2 {
    pub x: f64,
    pub y: f64,
}

impl Vector2 {
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    #[must_use]
    pub fn add(self, other: Self) -> Self {
        Self::new(self.x + other.x, self.y + other.y)
    }

    #[must_use]
    pub fn sub(self, other: Self) -> Self {
        Self::new(self.x - other.x, self.y - other.y)
    }

    #[must_use]
    pub fn scale(self, factor: f64) -> Self {
        Self::new(self.x * factor, self.y * factor)
    }

    /// Component-wise multiplication, used to lift normalized points into pixel space.
    #[must_use]
    pub fn mul(self, other: Self) -> Self {
        Self::new(self.x * other.x, self.y * other.y)
    }

    /// Component-wise division by a cell size.
    #[must_use]
    pub fn div_size(self, size: Size) -> Self {
        Self::new(self.x / size.width, self.y / size.height)
    }

    #[must_use]
    pub fn length(self) -> f64 {
        self.x.hypot(self.y)
    }

    #[must_use]
    pub fn distance(self, other: Self) -> f64 {
        self.sub(other).length()
    }

    /// Rotate around the origin by `degrees`, counter-clockwise in a y-up frame.
    #[must_use]
    pub fn rotate(self, degrees: f64) -> Self {
        let (sin, cos) = degrees.to_radians().sin_cos();
        Self::new(self.x * cos - self.y * sin, self.x * sin + self.y * cos)
    }

    #[must_use]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Width/height pair for cells and grids, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    #[must_use]
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    #[must_use]
    pub const fn zero() -> Self {
        Self { width: 0.0, height: 0.0 }
    }

    #[must_use]
    pub fn is_zero(self) -> bool {
        self.width == 0.0 || self.height == 0.0
    }

    #[must_use]
    pub fn as_vector(self) -> Vector2 {
        Vector2::new(self.width, self.height)
    }
}

/// Axis-aligned bounds derived from a point set. Never stored; recompute instead.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min: Vector2,
    pub max: Vector2,
    pub width: f64,
    pub height: f64,
    pub center: Vector2,
}

impl BoundingBox {
    /// Build a box from two opposite corners.
    #[must_use]
    pub fn from_corners(a: Vector2, b: Vector2) -> Self {
        let min = Vector2::new(a.x.min(b.x), a.y.min(b.y));
        let max = Vector2::new(a.x.max(b.x), a.y.max(b.y));
        Self {
            min,
            max,
            width: max.x - min.x,
            height: max.y - min.y,
            center: Vector2::new((min.x + max.x) / 2.0, (min.y + max.y) / 2.0),
        }
    }

    /// Bounds of a point set, or `None` when it is empty.
    #[must_use]
    pub fn from_points(points: &[Vector2]) -> Option<Self> {
        let first = points.first()?;
        let (min, max) = points.iter().skip(1).fold((*first, *first), |(lo, hi), p| {
            (Vector2::new(lo.x.min(p.x), lo.y.min(p.y)), Vector2::new(hi.x.max(p.x), hi.y.max(p.y)))
        });
        Some(Self::from_corners(min, max))
    }

    /// Scale a normalized box into pixel space.
    #[must_use]
    pub fn scaled(&self, map_size: Vector2) -> Self {
        Self::from_corners(self.min.mul(map_size), self.max.mul(map_size))
    }
}
