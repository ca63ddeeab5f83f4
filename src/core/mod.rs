//! Core geometry types for drishti-plan.
//!
//! - [`Point`]: 2D point in map coordinates (f64)
//! - [`Rect`]: axis-aligned rectangle (obstacles, query windows)
//! - [`math`]: angle normalization and angular-extent tests
//!
//! Map coordinates are in pixels of the occupancy raster, X right, Y down,
//! angles CCW from +X as produced by `atan2`.

pub mod math;
pub mod point;
pub mod rect;

pub use point::Point;
pub use rect::Rect;
