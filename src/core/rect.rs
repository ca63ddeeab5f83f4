//! Axis-aligned rectangle used for obstacles and query windows.

use serde::{Deserialize, Serialize};

use super::point::Point;

/// Axis-aligned rectangle with min.x < max.x and min.y < max.y.
#[derive(Clone, Copy, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    /// Minimum corner (smallest x and y values).
    pub min: Point,
    /// Maximum corner (largest x and y values).
    pub max: Point,
}

impl Rect {
    /// Create a new rectangle from min and max corners.
    #[inline]
    pub const fn new(min: Point, max: Point) -> Self {
        Self { min, max }
    }

    /// Create a rectangle from corner coordinates.
    #[inline]
    pub fn from_coords(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self {
            min: Point::new(x1.min(x2), y1.min(y2)),
            max: Point::new(x1.max(x2), y1.max(y2)),
        }
    }

    /// Width of the rectangle (x extent).
    #[inline]
    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    /// Height of the rectangle (y extent).
    #[inline]
    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    /// Area of the rectangle.
    #[inline]
    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }

    /// Check whether a point lies strictly inside the rectangle.
    #[inline]
    pub fn contains(&self, point: Point) -> bool {
        point.x > self.min.x && point.y > self.min.y && point.x < self.max.x && point.y < self.max.y
    }

    /// Check whether two rectangles overlap.
    pub fn intersects(&self, other: &Rect) -> bool {
        intervals_overlap(self.min.x, self.max.x, other.min.x, other.max.x)
            && intervals_overlap(self.min.y, self.max.y, other.min.y, other.max.y)
    }

    /// Grow (or shrink, with a negative amount) the rectangle on every side.
    #[inline]
    pub fn inflate(&self, amount: f64) -> Rect {
        Rect {
            min: Point::new(self.min.x - amount, self.min.y - amount),
            max: Point::new(self.max.x + amount, self.max.y + amount),
        }
    }

    /// Window of half-side `radius` centered on a point.
    #[inline]
    pub fn window(center: Point, radius: f64) -> Rect {
        Rect {
            min: Point::new(center.x - radius, center.y - radius),
            max: Point::new(center.x + radius, center.y + radius),
        }
    }
}

/// Check whether the closed intervals [a1, a2] and [b1, b2] overlap.
#[inline]
pub fn intervals_overlap(a1: f64, a2: f64, b1: f64, b2: f64) -> bool {
    a1 <= b2 && b1 <= a2
}
