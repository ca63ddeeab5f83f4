//! Incremental RRT* strategy.

use log::trace;

use crate::core::{Point, Rect};
use crate::error::Result;
use crate::map::OccupancyMap;
use crate::tree::{NodeArena, NodeId, Status};
use crate::viewshed::Viewshed;

use super::base::PlannerBase;
use super::config::PlannerConfig;
use super::Planner;

/// Incremental sampling planner.
///
/// While the node budget lasts, every step draws one Halton sample, steers
/// it to within `max_segment` of the nearest tree node, connects it to the
/// best neighbor in the rewire radius, and rewires any neighbor that gets
/// cheaper through the new node. Once the budget is spent, steps only run
/// local rewire passes.
pub struct RrtStar {
    base: PlannerBase,
}

impl RrtStar {
    /// Create a planner with default configuration.
    ///
    /// Missing start/end points are drawn from open space; the end is kept
    /// at least half the map width from the start.
    pub fn new(
        map: OccupancyMap,
        obstacle_rects: &[Rect],
        max_segment: f64,
        start: Option<Point>,
        end: Option<Point>,
    ) -> Self {
        Self::with_config(
            map,
            obstacle_rects,
            max_segment,
            start,
            end,
            PlannerConfig::default(),
        )
    }

    /// Create a planner with explicit configuration.
    pub fn with_config(
        map: OccupancyMap,
        obstacle_rects: &[Rect],
        max_segment: f64,
        start: Option<Point>,
        end: Option<Point>,
        config: PlannerConfig,
    ) -> Self {
        Self {
            base: PlannerBase::new(map, obstacle_rects, max_segment, start, end, config),
        }
    }

    /// Root handle of the search tree.
    pub fn root(&self) -> NodeId {
        self.base.root
    }

    /// The search-tree arena, for tree walks by embedders.
    pub fn arena(&self) -> &NodeArena {
        &self.base.arena
    }

    /// The viewshed engine (embedders re-sweep it for display).
    pub fn viewshed_mut(&mut self) -> &mut Viewshed {
        &mut self.base.viewshed
    }

    /// Node budget for the growth phase.
    pub fn node_threshold(&self) -> u64 {
        self.base.node_threshold
    }

    /// Growth iteration: propose, steer, connect, rewire.
    fn sample_with_new_node(&mut self) {
        let sample = self.base.next_halton_point();

        let Some(nearest) = self.base.index.nearest(sample) else {
            return;
        };
        let Some(nearest_node) = self.base.arena.get(nearest) else {
            return;
        };
        let point = steer(nearest_node.coord, sample, self.base.max_segment);

        if !self
            .base
            .map
            .is_open(point, self.base.config.sample_free_below)
        {
            // sample landed in an obstacle; skip this iteration entirely
            return;
        }

        let unseen = self.base.unseen_area(point);
        let bn = self
            .base
            .best_neighbor(point, self.base.rewire_neighborhood, unseen);
        let Some(best) = bn.best else {
            return;
        };

        let new_node = self.base.arena.add_child(best, point, bn.best_cost, unseen);
        self.base.num_nodes += 1;
        self.base.index.insert(new_node, point);
        trace!(
            "[RrtStar] node {} at ({:.1}, {:.1}), cost {:.2}",
            self.base.num_nodes,
            point.x,
            point.y,
            bn.best_cost
        );

        let new_cumulative = self
            .base
            .arena
            .get(new_node)
            .map_or(0.0, |n| n.cumulative_cost);
        for (i, &neighbor) in bn.neighbors.iter().enumerate() {
            if neighbor == best {
                continue;
            }
            let Some(node) = self.base.arena.get(neighbor) else {
                continue;
            };
            if bn.costs[i] + new_cumulative < node.cumulative_cost {
                self.base.arena.rewire(neighbor, new_node, bn.costs[i]);
            }
        }
    }
}

/// Clamp a sample to lie within `max_segment` of the nearest node, along
/// the ray from the nearest node toward the sample.
fn steer(from: Point, sample: Point, max_segment: f64) -> Point {
    if from.distance(&sample) > max_segment {
        let angle = from.angle_to(&sample);
        from.point_at(angle, max_segment)
    } else {
        sample
    }
}

impl Planner for RrtStar {
    fn step(&mut self) {
        if self.is_adding_nodes() {
            self.sample_with_new_node();
        } else {
            self.base.rewire_pass(self.base.rewire_neighborhood);
        }
        self.base.refresh_best_path();
    }

    fn move_start(&mut self, dx: f64, dy: f64) {
        self.base.move_start(dx, dy, Status::Unvisited);
    }

    fn move_end(&mut self, dx: f64, dy: f64) {
        self.base.move_end(dx, dy);
    }

    fn prune(&mut self, minor_axis_squares: u32) {
        self.base.prune(minor_axis_squares);
    }

    fn best_path(&self) -> &[Point] {
        &self.base.best_path
    }

    fn num_nodes(&self) -> u64 {
        self.base.num_nodes
    }

    fn is_adding_nodes(&self) -> bool {
        self.base.num_nodes < self.base.node_threshold
    }

    fn start_point(&self) -> Point {
        self.base.start
    }

    fn end_point(&self) -> Point {
        self.base.end
    }

    fn render_unseen_cost_map(&mut self, path: &std::path::Path) -> Result<()> {
        self.base.render_unseen_cost_map(path)
    }
}
