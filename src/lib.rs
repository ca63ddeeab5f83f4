//! # Drishti-Plan: Visibility-Aware Sampling Planner
//!
//! A 2D motion-planning library that computes low-cost, collision-free
//! paths across an occupancy map of rectangular obstacles, where "cost"
//! combines geometric distance with a penalty for traveling through poorly
//! observed regions.
//!
//! The planner is built for interactive, repeatedly re-queried operation:
//! the embedder calls [`Planner::step`] once per tick, the start point may
//! migrate over time, and the best path to the fixed goal is re-traced
//! after every step.
//!
//! ## Quick Start
//!
//! ```rust
//! use drishti_plan::{OccupancyMap, Planner, Point, Rect, RrtStar};
//!
//! let rects = vec![Rect::from_coords(40.0, 40.0, 60.0, 60.0)];
//! let map = OccupancyMap::rasterize(100, 100, &rects);
//!
//! let mut planner = RrtStar::new(
//!     map,
//!     &rects,
//!     10.0,
//!     Some(Point::new(10.0, 10.0)),
//!     Some(Point::new(90.0, 90.0)),
//! );
//!
//! for _ in 0..500 {
//!     planner.step();
//! }
//! // ordered goal -> start; empty until the goal is connected
//! let path = planner.best_path();
//! println!("{} waypoints, {} nodes", path.len(), planner.num_nodes());
//! ```
//!
//! ## Architecture
//!
//! - [`core`]: geometry primitives ([`Point`], [`Rect`], angle helpers)
//! - [`map`]: the occupancy raster and its collision predicates
//! - [`viewshed`]: sweeping-angle visibility polygons and their areas
//! - [`index`]: R-tree spatial index over search-tree nodes
//! - [`tree`]: arena-allocated search tree with rewire cost propagation
//! - [`planner`]: the shared base plus the [`RrtStar`] and [`FmtStar`]
//!   strategies
//! - [`agent`]: a path-following consumer with one-shot background replan
//!
//! ## Concurrency
//!
//! The planning core is single-threaded and cooperative: one `step` call
//! performs one bounded unit of work and never blocks on anything. The only
//! sanctioned concurrency is [`agent::PathFollower`]'s background replan,
//! which owns a private planner and publishes its result once.

pub mod agent;
pub mod core;
pub mod error;
pub mod index;
pub mod map;
pub mod planner;
pub mod tree;
pub mod viewshed;

// Re-export main types at crate root
pub use crate::core::{Point, Rect};
pub use agent::PathFollower;
pub use error::{PlanError, Result};
pub use map::OccupancyMap;
pub use planner::{CostModel, FmtStar, Planner, PlannerConfig, RrtStar};
pub use tree::{Node, NodeArena, NodeId, Status};
pub use viewshed::Viewshed;
