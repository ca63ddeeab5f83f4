//! Occupancy map: read-only grayscale raster plus collision predicates.
//!
//! The raster convention follows the obstacle images the planner consumes:
//! high pixel values are obstacles, low values are open floor. Two
//! thresholds are in play and are deliberately different: collision checks
//! treat a pixel above `min_obstacle_color` (default 200) as blocked, while
//! sampling only accepts pixels strictly below the stricter `free_below`
//! threshold (default 50), keeping new nodes away from anti-aliased obstacle
//! fringes.

pub mod generate;
pub mod occupancy;

pub use generate::generate_obstacles;
pub use occupancy::OccupancyMap;
