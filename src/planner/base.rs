//! Machinery shared by the RRT* and FMT* strategies.
//!
//! Owns the map, the search tree and its spatial index, the viewshed, the
//! Halton sampler pair, and the unseen-area memo. The strategy types wrap
//! this base and add their sampling policies on top.

use std::collections::HashMap;
use std::path::Path;

use image::{GrayImage, Luma};
use log::{debug, trace};

use crate::core::{Point, Rect};
use crate::error::Result;
use crate::index::NodeIndex;
use crate::map::OccupancyMap;
use crate::tree::{Node, NodeArena, NodeId, Status};
use crate::viewshed::Viewshed;

use super::config::{CostModel, PlannerConfig};
use super::halton::HaltonSampler;

/// Result of a neighborhood query around a candidate point.
pub(crate) struct BestNeighbor {
    /// Neighbor minimizing cumulative cost plus edge cost, if any survived.
    pub best: Option<NodeId>,
    /// Edge cost to the winning neighbor.
    pub best_cost: f64,
    /// All surviving neighbors (reachable, not co-located).
    pub neighbors: Vec<NodeId>,
    /// Candidate edge cost for each surviving neighbor, parallel to
    /// `neighbors`.
    pub costs: Vec<f64>,
}

/// Shared planner state and operations.
pub(crate) struct PlannerBase {
    pub config: PlannerConfig,
    pub map: OccupancyMap,
    pub width: f64,
    pub height: f64,
    pub max_segment: f64,
    pub rewire_neighborhood: f64,
    pub map_area: f64,
    pub arena: NodeArena,
    pub index: NodeIndex,
    pub viewshed: Viewshed,
    pub root: NodeId,
    pub start: Point,
    pub end: Point,
    pub end_node: Option<NodeId>,
    pub best_path: Vec<Point>,
    pub num_nodes: u64,
    pub node_threshold: u64,
    halton_x: HaltonSampler,
    halton_y: HaltonSampler,
    unseen_memo: HashMap<(u64, u64), f64>,
}

impl PlannerBase {
    /// Build the shared state: root node, loaded viewshed, spatial index.
    ///
    /// A missing start is drawn from open space; a missing end is drawn
    /// until it lies at least half the map width from the start.
    pub fn new(
        map: OccupancyMap,
        obstacle_rects: &[Rect],
        max_segment: f64,
        start: Option<Point>,
        end: Option<Point>,
        config: PlannerConfig,
    ) -> Self {
        let width = map.width() as f64;
        let height = map.height() as f64;

        let mut rng = rand::thread_rng();
        let start = start.unwrap_or_else(|| map.random_open_point(&mut rng));
        let end = end.unwrap_or_else(|| {
            // keep the goal at least half the map away for a non-trivial plan
            loop {
                let candidate = map.random_open_point(&mut rng);
                if start.distance(&candidate) >= width / 2.0 {
                    break candidate;
                }
            }
        });

        let mut viewshed = Viewshed::new();
        viewshed.load_map(width, height, 0.0, obstacle_rects, &[]);

        let mut arena = NodeArena::new();
        let root = arena.insert(Node::new(start, 0.0));
        let mut index = NodeIndex::new(config.tolerance);
        index.insert(root, start);

        let node_threshold = (config.node_density * width * height) as u64;
        let halton_x = HaltonSampler::new(config.halton_base_x);
        let halton_y = HaltonSampler::new(config.halton_base_y);
        let rewire_neighborhood = max_segment * config.rewire_factor;

        let mut base = Self {
            config,
            map,
            width,
            height,
            max_segment,
            rewire_neighborhood,
            map_area: width * height,
            arena,
            index,
            viewshed,
            root,
            start,
            end,
            end_node: None,
            best_path: Vec::new(),
            num_nodes: 1,
            node_threshold,
            halton_x,
            halton_y,
            unseen_memo: HashMap::new(),
        };

        let unseen = base.unseen_area(start);
        if let Some(root_node) = base.arena.get_mut(base.root) {
            root_node.unseen_area = unseen;
        }

        base
    }

    /// Next point of the 2D Halton sequence, scaled to the map.
    pub fn next_halton_point(&mut self) -> Point {
        Point::new(
            self.halton_x.next_value() * self.width,
            self.halton_y.next_value() * self.height,
        )
    }

    /// Visible polygon area from a point (full viewshed sweep).
    pub fn view_area(&mut self, point: Point) -> f64 {
        self.viewshed.update_center(point.x, point.y);
        self.viewshed.sweep();
        self.viewshed.polygon_area().abs()
    }

    /// Fraction of the map not visible from a point, in [0, 1]. Memoized
    /// per exact coordinate.
    pub fn unseen_area(&mut self, point: Point) -> f64 {
        if let Some(&cached) = self.unseen_memo.get(&point.bits()) {
            return cached;
        }
        let area = self.view_area(point);
        let unseen = ((self.map_area - area) / self.map_area).clamp(0.0, 1.0);
        self.unseen_memo.insert(point.bits(), unseen);
        unseen
    }

    /// Edge cost from `from` to `to` under the configured cost model.
    pub fn edge_cost(&self, from: Point, to: Point, from_unseen: f64, to_unseen: f64) -> f64 {
        let dist = from.distance(&to);
        match self.config.cost_model {
            CostModel::EndpointUnseen => {
                self.config.distance_k * dist + self.config.unseen_k * to_unseen
            }
            CostModel::TrapezoidUnseen => {
                self.config.distance_k * dist
                    + self.config.unseen_k * 0.5 * (from_unseen + to_unseen) * dist
            }
        }
    }

    /// Whether the segment between two points crosses an obstacle.
    #[inline]
    pub fn segment_blocked(&self, a: Point, b: Point) -> bool {
        self.map
            .segment_intersects_obstacle(a, b, self.config.min_obstacle_color)
    }

    /// Query the window [point ± radius] for connectable neighbors.
    ///
    /// Nodes co-located with the query point or behind an obstacle are
    /// skipped. `unseen` is the unseen fraction at the query point, used
    /// for the candidate edge costs.
    pub fn best_neighbor(&self, point: Point, radius: f64, unseen: f64) -> BestNeighbor {
        let mut result = BestNeighbor {
            best: None,
            best_cost: f64::MAX,
            neighbors: Vec::new(),
            costs: Vec::new(),
        };
        let mut best_cumulative = f64::MAX;

        for id in self.index.in_window(point, radius) {
            let Some(node) = self.arena.get(id) else {
                continue;
            };
            if node.coord == point || self.segment_blocked(point, node.coord) {
                continue;
            }
            let cost = self.edge_cost(node.coord, point, node.unseen_area, unseen);
            result.neighbors.push(id);
            result.costs.push(cost);
            if cost + node.cumulative_cost < best_cumulative {
                best_cumulative = cost + node.cumulative_cost;
                result.best_cost = cost;
                result.best = Some(id);
            }
        }

        result
    }

    /// Shift the start point and migrate the tree root.
    ///
    /// Inserts a new root at the shifted start, hangs the old root beneath
    /// it, then rewires every neighbor within the rewire radius that gets
    /// cheaper through the new root. A zero delta is a no-op, and a shift
    /// into an obstacle cell is rejected.
    pub fn move_start(&mut self, dx: f64, dy: f64, root_status: Status) {
        if dx == 0.0 && dy == 0.0 {
            return;
        }
        let new_start = Point::new(self.start.x + dx, self.start.y + dy);
        if self
            .map
            .point_intersects_obstacle(new_start, self.config.min_obstacle_color)
        {
            debug!(
                "[Planner] move_start rejected: ({:.2}, {:.2}) is blocked",
                new_start.x, new_start.y
            );
            return;
        }

        self.start = new_start;
        let unseen = self.unseen_area(new_start);
        let mut node = Node::with_status(new_start, 0.0, root_status);
        node.unseen_area = unseen;
        let new_root = self.arena.insert(node);
        self.num_nodes += 1;
        self.index.insert(new_root, new_start);

        let (old_coord, old_unseen) = match self.arena.get(self.root) {
            Some(old_root) => (old_root.coord, old_root.unseen_area),
            None => (self.start, 0.0),
        };
        let edge = self.edge_cost(new_start, old_coord, unseen, old_unseen);
        self.arena.rewire(self.root, new_root, edge);
        self.root = new_root;

        let bn = self.best_neighbor(new_start, self.rewire_neighborhood, unseen);
        for (i, &neighbor) in bn.neighbors.iter().enumerate() {
            let Some(node) = self.arena.get(neighbor) else {
                continue;
            };
            // the new root's cumulative cost is zero
            if bn.costs[i] < node.cumulative_cost {
                self.arena.rewire(neighbor, new_root, bn.costs[i]);
            }
        }
        trace!(
            "[Planner] start moved to ({:.2}, {:.2}), {} nodes",
            self.start.x,
            self.start.y,
            self.num_nodes
        );
    }

    /// Shift the goal point and reattach the end node.
    ///
    /// When no neighbor within the rewire radius can reach the shifted
    /// goal, the shift is reverted.
    pub fn move_end(&mut self, dx: f64, dy: f64) {
        if dx == 0.0 && dy == 0.0 {
            return;
        }
        let old_end = self.end;
        self.end = Point::new(old_end.x + dx, old_end.y + dy);

        let unseen = self.unseen_area(self.end);
        let bn = self.best_neighbor(self.end, self.rewire_neighborhood, unseen);

        // pick the best neighbor that is not the outgoing end node itself
        let mut best: Option<NodeId> = None;
        let mut best_cost = f64::MAX;
        let mut best_cumulative = f64::MAX;
        for (i, &neighbor) in bn.neighbors.iter().enumerate() {
            if Some(neighbor) == self.end_node {
                continue;
            }
            let Some(node) = self.arena.get(neighbor) else {
                continue;
            };
            if bn.costs[i] + node.cumulative_cost < best_cumulative {
                best_cumulative = bn.costs[i] + node.cumulative_cost;
                best_cost = bn.costs[i];
                best = Some(neighbor);
            }
        }

        let Some(best) = best else {
            debug!(
                "[Planner] move_end reverted: no reachable neighbor at ({:.2}, {:.2})",
                self.end.x, self.end.y
            );
            self.end = old_end;
            return;
        };

        // the previous end node stays in the tree unless it became a leaf
        if let Some(old_node) = self.end_node.take() {
            self.delete_leaf(old_node);
        }

        let id = self.arena.add_child(best, self.end, best_cost, unseen);
        self.num_nodes += 1;
        self.index.insert(id, self.end);
        self.end_node = Some(id);
        self.trace_best_path();
    }

    /// Consolidate the tree tile-by-tile.
    ///
    /// Tiles the map into squares of side `min(width, height) /
    /// minor_axis_squares`; around each tile center, rewires members
    /// through the locally best node when that is cheaper, then deletes
    /// whatever leaves remain in the window. Root and end node are kept.
    pub fn prune(&mut self, minor_axis_squares: u32) {
        if minor_axis_squares == 0 {
            return;
        }
        let square_size = self.map.width().min(self.map.height()) / minor_axis_squares;
        if square_size == 0 {
            return;
        }
        debug!("[Prune] square size: {}", square_size);

        let mut cy = square_size / 2;
        while cy < self.map.height() {
            let mut cx = square_size / 2;
            while cx < self.map.width() {
                self.prune_tile(Point::new(cx as f64, cy as f64), square_size as f64);
                cx += square_size;
            }
            cy += square_size;
        }
    }

    fn prune_tile(&mut self, center: Point, radius: f64) {
        let bn = self.best_neighbor(center, radius, 0.0);

        if let Some(best) = bn.best {
            let (best_coord, best_unseen, best_cumulative) = match self.arena.get(best) {
                Some(node) => (node.coord, node.unseen_area, node.cumulative_cost),
                None => return,
            };
            for &neighbor in &bn.neighbors {
                if neighbor == best {
                    continue;
                }
                let Some(node) = self.arena.get(neighbor) else {
                    continue;
                };
                if self.segment_blocked(best_coord, node.coord) {
                    continue;
                }
                let cost = self.edge_cost(best_coord, node.coord, best_unseen, node.unseen_area);
                if cost + best_cumulative < node.cumulative_cost {
                    self.arena.rewire(neighbor, best, cost);
                }
            }
        }

        for &neighbor in &bn.neighbors {
            if neighbor == self.root || Some(neighbor) == self.end_node {
                continue;
            }
            self.delete_leaf(neighbor);
        }
    }

    /// Remove a childless node from its parent, the index, and the arena.
    /// Returns false (and does nothing) when the node still has children.
    pub fn delete_leaf(&mut self, id: NodeId) -> bool {
        let (coord, parent, childless) = match self.arena.get(id) {
            Some(node) => (node.coord, node.parent, node.children.is_empty()),
            None => return false,
        };
        if !childless {
            return false;
        }
        if let Some(parent) = parent {
            self.arena.remove_child(parent, id);
        }
        self.index.remove(id, coord);
        self.arena.remove_leaf(id);
        self.num_nodes = self.num_nodes.saturating_sub(1);
        true
    }

    /// Re-trace the best path, first trying to connect the goal when it
    /// has no node yet (incremental strategy).
    ///
    /// The goal connects to the cheapest node within `2·max_segment` whose
    /// connecting segment is obstacle-free.
    pub fn refresh_best_path(&mut self) {
        if self.end_node.is_none() {
            let unseen = self.unseen_area(self.end);
            let mut best: Option<NodeId> = None;
            let mut best_cost = f64::MAX;
            for id in self.index.in_window(self.end, 2.0 * self.max_segment) {
                let Some(node) = self.arena.get(id) else {
                    continue;
                };
                let cost = self.edge_cost(node.coord, self.end, node.unseen_area, unseen);
                if cost < best_cost && !self.segment_blocked(self.end, node.coord) {
                    best_cost = cost;
                    best = Some(id);
                }
            }

            if let Some(best) = best {
                let id = self.arena.add_child(best, self.end, best_cost, unseen);
                self.num_nodes += 1;
                self.index.insert(id, self.end);
                self.end_node = Some(id);
                trace!("[Planner] goal connected, cost {:.2}", best_cost);
            }
        }
        self.trace_best_path();
    }

    /// Rebuild `best_path` by walking parents from the end node to the
    /// root. Empty while the goal is unconnected.
    pub fn trace_best_path(&mut self) {
        self.best_path.clear();
        let mut current = self.end_node;
        while let Some(id) = current {
            let Some(node) = self.arena.get(id) else {
                break;
            };
            self.best_path.push(node.coord);
            current = node.parent;
        }
    }

    /// One local rewire iteration around a fresh Halton sample.
    ///
    /// Neighbors of the sample that get cheaper through the locally best
    /// node are rewired beneath it. Used by both strategies once their
    /// node budget is spent.
    pub fn rewire_pass(&mut self, radius: f64) {
        let point = self.next_halton_point();
        let bn = self.best_neighbor(point, radius, 0.0);
        let Some(best) = bn.best else {
            return;
        };
        let (best_coord, best_unseen, best_cumulative) = match self.arena.get(best) {
            Some(node) => (node.coord, node.unseen_area, node.cumulative_cost),
            None => return,
        };

        for &neighbor in &bn.neighbors {
            if neighbor == best {
                continue;
            }
            let Some(node) = self.arena.get(neighbor) else {
                continue;
            };
            if self.segment_blocked(best_coord, node.coord) {
                continue;
            }
            let cost = self.edge_cost(best_coord, node.coord, best_unseen, node.unseen_area);
            if cost + best_cumulative < node.cumulative_cost {
                self.arena.rewire(neighbor, best, cost);
            }
        }
    }

    /// Write a grayscale PNG of per-pixel view area over free space.
    pub fn render_unseen_cost_map(&mut self, path: &Path) -> Result<()> {
        let width = self.map.width();
        let height = self.map.height();
        let mut cost_map = vec![0.0f64; (width * height) as usize];
        let mut max_value = 0.0f64;

        for row in 0..height {
            for col in 0..width {
                let value = self.map.value_at(col as i64, row as i64).unwrap_or(255);
                if value < self.config.min_obstacle_color {
                    let area = self.view_area(Point::new(col as f64, row as f64));
                    cost_map[(row * width + col) as usize] = area;
                    max_value = max_value.max(area);
                }
            }
        }

        let mut img = GrayImage::new(width, height);
        if max_value > 0.0 {
            let scale = 255.0 / max_value;
            for row in 0..height {
                for col in 0..width {
                    let value = (cost_map[(row * width + col) as usize] * scale) as u8;
                    img.put_pixel(col, row, Luma([value]));
                }
            }
        }
        img.save(path)?;
        Ok(())
    }
}
