//! Batch FMT* strategy.

use log::trace;

use crate::core::{Point, Rect};
use crate::error::Result;
use crate::index::NodeIndex;
use crate::map::OccupancyMap;
use crate::tree::{Node, NodeArena, NodeId, Status};
use crate::viewshed::Viewshed;

use super::base::PlannerBase;
use super::config::PlannerConfig;
use super::Planner;

/// Batch sampling planner.
///
/// The whole node pool is pre-sampled at construction: up to
/// `node_threshold` Halton points in free cells, each Unvisited with
/// infinite cost. Planning grows an open frontier outward from the root;
/// each step expands the cheapest open node, attaching its Unvisited
/// neighbors through their best open parent. When the frontier drains,
/// steps switch to local rewire passes over a slightly widened radius.
pub struct FmtStar {
    base: PlannerBase,
    /// Open frontier, scanned linearly for the cheapest member.
    open: Vec<NodeId>,
    /// Secondary index over the open frontier only.
    open_index: NodeIndex,
    /// Pre-inserted goal candidate; becomes the end node once attached.
    end_candidate: NodeId,
}

impl FmtStar {
    /// Create a planner with default configuration.
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
    ///
    /// Construction performs the batch sampling pass, so it is noticeably
    /// heavier than the incremental planner's.
    pub fn with_config(
        map: OccupancyMap,
        obstacle_rects: &[Rect],
        max_segment: f64,
        start: Option<Point>,
        end: Option<Point>,
        config: PlannerConfig,
    ) -> Self {
        let mut base = PlannerBase::new(map, obstacle_rects, max_segment, start, end, config);

        if let Some(root) = base.arena.get_mut(base.root) {
            root.status = Status::Open;
        }
        let mut open_index = NodeIndex::new(base.config.tolerance);
        open_index.insert(base.root, base.start);

        // pre-sample the candidate pool; obstacle draws are simply dropped
        for _ in 0..base.node_threshold {
            let point = base.next_halton_point();
            if base.map.is_open(point, base.config.sample_free_below) {
                let id = base
                    .arena
                    .insert(Node::with_status(point, f64::INFINITY, Status::Unvisited));
                base.index.insert(id, point);
            }
        }

        // the goal is an ordinary candidate until the frontier reaches it
        let end_candidate = base
            .arena
            .insert(Node::with_status(base.end, f64::INFINITY, Status::Unvisited));
        base.index.insert(end_candidate, base.end);

        let open = vec![base.root];
        Self {
            base,
            open,
            open_index,
            end_candidate,
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

    /// Remove and return the cheapest member of the open frontier.
    fn pop_best_open(&mut self) -> Option<NodeId> {
        if self.open.is_empty() {
            return None;
        }
        let mut best_index = 0;
        let mut best_cost = f64::MAX;
        for (i, &id) in self.open.iter().enumerate() {
            if let Some(node) = self.base.arena.get(id) {
                if node.cumulative_cost < best_cost {
                    best_cost = node.cumulative_cost;
                    best_index = i;
                }
            }
        }
        Some(self.open.remove(best_index))
    }

    /// Cheapest open-frontier parent for a candidate point.
    ///
    /// Unlike the main neighborhood query this applies no reachability
    /// filters; the expansion site checks the connecting segment itself.
    fn best_open_neighbor(&self, point: Point, radius: f64, unseen: f64) -> (Option<NodeId>, f64) {
        let mut best = None;
        let mut best_cost = f64::MAX;
        let mut best_cumulative = f64::MAX;
        for id in self.open_index.in_window(point, radius) {
            let Some(node) = self.base.arena.get(id) else {
                continue;
            };
            let cost = self
                .base
                .edge_cost(node.coord, point, node.unseen_area, unseen);
            if cost + node.cumulative_cost < best_cumulative {
                best_cumulative = cost + node.cumulative_cost;
                best_cost = cost;
                best = Some(id);
            }
        }
        (best, best_cost)
    }

    /// Expand the cheapest open node: attach every Unvisited neighbor in
    /// the rewire radius through its best open parent, then close it.
    fn expand(&mut self) {
        let Some(popped) = self.pop_best_open() else {
            return;
        };
        let popped_coord = match self.base.arena.get(popped) {
            Some(node) => node.coord,
            None => return,
        };

        for neighbor in self
            .base
            .index
            .in_window(popped_coord, self.base.rewire_neighborhood)
        {
            let Some(node) = self.base.arena.get(neighbor) else {
                continue;
            };
            // rewire passes and start migration can adopt candidates early;
            // only truly detached ones are attachable here
            if node.status != Status::Unvisited || node.parent.is_some() {
                continue;
            }
            let coord = node.coord;

            let unseen = self.base.unseen_area(coord);
            let (best_parent, best_cost) =
                self.best_open_neighbor(coord, self.base.rewire_neighborhood, unseen);
            let Some(parent) = best_parent else {
                continue;
            };
            let parent_coord = match self.base.arena.get(parent) {
                Some(node) => node.coord,
                None => continue,
            };
            if self.base.segment_blocked(coord, parent_coord) {
                continue;
            }

            self.base
                .arena
                .attach_existing(parent, neighbor, best_cost, unseen);
            if let Some(node) = self.base.arena.get_mut(neighbor) {
                node.status = Status::Open;
            }
            self.open.push(neighbor);
            self.open_index.insert(neighbor, coord);
            self.base.num_nodes += 1;
        }

        self.open_index.remove(popped, popped_coord);
        if let Some(node) = self.base.arena.get_mut(popped) {
            node.status = Status::Closed;
        }
        trace!(
            "[FmtStar] closed ({:.1}, {:.1}), frontier {}",
            popped_coord.x,
            popped_coord.y,
            self.open.len()
        );
    }

    /// Promote the goal candidate to end node once the frontier attached
    /// it, then re-trace.
    fn refresh_best_path(&mut self) {
        if self.base.end_node.is_none()
            && self
                .base
                .arena
                .get(self.end_candidate)
                .is_some_and(|node| node.parent.is_some())
        {
            self.base.end_node = Some(self.end_candidate);
        }
        self.base.trace_best_path();
    }
}

impl Planner for FmtStar {
    fn step(&mut self) {
        if self.is_adding_nodes() {
            self.expand();
        } else {
            let radius = self.base.rewire_neighborhood * self.base.config.post_build_rewire_scale;
            self.base.rewire_pass(radius);
        }
        self.refresh_best_path();
    }

    fn move_start(&mut self, dx: f64, dy: f64) {
        self.base.move_start(dx, dy, Status::Closed);
    }

    fn move_end(&mut self, dx: f64, dy: f64) {
        self.base.move_end(dx, dy);
        if let Some(id) = self.base.end_node {
            self.end_candidate = id;
        }
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
        !self.open.is_empty()
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

#[cfg(test)]
mod tests {
    use super::*;

    fn small_fmt() -> FmtStar {
        let map = OccupancyMap::rasterize(50, 50, &[]);
        FmtStar::new(
            map,
            &[],
            10.0,
            Some(Point::new(5.0, 5.0)),
            Some(Point::new(45.0, 45.0)),
        )
    }

    #[test]
    fn test_construction_presamples_candidates() {
        let planner = small_fmt();
        // root + 25 candidates + goal candidate (all free on an empty map)
        assert_eq!(planner.base.index.len(), 27);
        // only the root counts as a tree node so far
        assert_eq!(planner.num_nodes(), 1);
        assert!(planner.is_adding_nodes());
        assert_eq!(
            planner.arena().get(planner.root()).unwrap().status,
            Status::Open
        );
    }

    #[test]
    fn test_expansion_attaches_neighbors_and_closes() {
        let mut planner = small_fmt();
        planner.step();

        let root = planner.root();
        assert_eq!(planner.arena().get(root).unwrap().status, Status::Closed);
        // the root's neighborhood held at least one candidate
        assert!(planner.num_nodes() > 1);
        for &id in &planner.open {
            let node = planner.arena().get(id).unwrap();
            assert_eq!(node.status, Status::Open);
            assert!(node.cumulative_cost.is_finite());
            assert!(node.parent.is_some());
        }
    }

    #[test]
    fn test_frontier_drains_then_rewires() {
        let mut planner = small_fmt();
        let mut steps = 0;
        while planner.is_adding_nodes() && steps < 1000 {
            planner.step();
            steps += 1;
        }
        assert!(!planner.is_adding_nodes());

        let nodes_at_drain = planner.num_nodes();
        for _ in 0..10 {
            planner.step();
        }
        assert_eq!(planner.num_nodes(), nodes_at_drain);
    }

    #[test]
    fn test_goal_connects_through_frontier() {
        let mut planner = small_fmt();
        let mut steps = 0;
        while planner.best_path().is_empty() && steps < 1000 {
            planner.step();
            steps += 1;
        }
        let path = planner.best_path();
        assert!(!path.is_empty(), "goal never connected");
        assert_eq!(path[0], Point::new(45.0, 45.0));
        assert_eq!(*path.last().unwrap(), Point::new(5.0, 5.0));
    }

    #[test]
    fn test_obstacle_blocks_frontier_expansion() {
        // wall splitting the map in half, with no gap
        let map = OccupancyMap::rasterize(60, 60, &[Rect::from_coords(28.0, 0.0, 32.0, 59.0)]);
        let mut planner = FmtStar::new(
            map,
            &[Rect::from_coords(28.0, 0.0, 32.0, 59.0)],
            10.0,
            Some(Point::new(5.0, 30.0)),
            Some(Point::new(55.0, 30.0)),
        );
        for _ in 0..500 {
            planner.step();
        }
        // nothing on the far side of the wall is reachable
        assert!(planner.best_path().is_empty());
        for (_, node) in planner.arena().iter() {
            if node.parent.is_some() {
                assert!(node.coord.x < 28.0, "tree crossed the wall");
            }
        }
    }
}
