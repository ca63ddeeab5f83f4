//! Spatial index over search-tree nodes.
//!
//! An R-tree keyed by a degenerate bounding rectangle around each node's
//! coordinate. The planners use it for nearest-neighbor lookups during
//! steering and for the rectangular window queries behind every
//! neighborhood search.

use rstar::{PointDistance, RTree, RTreeObject, AABB};

use crate::core::{Point, Rect};
use crate::tree::NodeId;

/// R-tree entry: a node handle plus its fixed coordinate.
#[derive(Clone, Copy, Debug)]
pub struct IndexedNode {
    /// Arena handle of the node.
    pub id: NodeId,
    /// Node position at insertion time.
    pub coord: Point,
    tolerance: f64,
}

impl PartialEq for IndexedNode {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl RTreeObject for IndexedNode {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_corners(
            [self.coord.x - self.tolerance, self.coord.y - self.tolerance],
            [self.coord.x + self.tolerance, self.coord.y + self.tolerance],
        )
    }
}

impl PointDistance for IndexedNode {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        self.coord.distance_squared(&Point::new(point[0], point[1]))
    }
}

/// Spatial index of planner nodes.
///
/// Removal takes the same handle and coordinate that were inserted; the
/// arena is the source of truth for both.
#[derive(Clone, Debug)]
pub struct NodeIndex {
    tree: RTree<IndexedNode>,
    tolerance: f64,
}

impl NodeIndex {
    /// Create an empty index with the given bounding-rectangle tolerance.
    pub fn new(tolerance: f64) -> Self {
        Self {
            tree: RTree::new(),
            tolerance,
        }
    }

    /// Number of indexed nodes.
    pub fn len(&self) -> usize {
        self.tree.size()
    }

    /// Check if the index is empty.
    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }

    /// Insert a node handle at its coordinate.
    pub fn insert(&mut self, id: NodeId, coord: Point) {
        self.tree.insert(IndexedNode {
            id,
            coord,
            tolerance: self.tolerance,
        });
    }

    /// Remove a previously inserted handle. Returns false if absent.
    pub fn remove(&mut self, id: NodeId, coord: Point) -> bool {
        self.tree
            .remove(&IndexedNode {
                id,
                coord,
                tolerance: self.tolerance,
            })
            .is_some()
    }

    /// Handle of the node nearest to a query point.
    pub fn nearest(&self, point: Point) -> Option<NodeId> {
        self.tree
            .nearest_neighbor(&[point.x, point.y])
            .map(|indexed| indexed.id)
    }

    /// Handles of all nodes whose bounding rectangle intersects the window
    /// [center ± radius]. Order is unspecified; entries are unique.
    pub fn in_window(&self, center: Point, radius: f64) -> Vec<NodeId> {
        let window = Rect::window(center, radius);
        let aabb = AABB::from_corners(
            [window.min.x, window.min.y],
            [window.max.x, window.max.y],
        );
        self.tree
            .locate_in_envelope_intersecting(&aabb)
            .map(|indexed| indexed.id)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(raw: usize) -> NodeId {
        NodeId::from_raw(raw)
    }

    #[test]
    fn test_insert_and_nearest() {
        let mut index = NodeIndex::new(0.01);
        index.insert(id(0), Point::new(1.0, 1.0));
        index.insert(id(1), Point::new(9.0, 9.0));

        assert_eq!(index.len(), 2);
        assert_eq!(index.nearest(Point::new(2.0, 2.0)), Some(id(0)));
        assert_eq!(index.nearest(Point::new(8.0, 8.0)), Some(id(1)));
    }

    #[test]
    fn test_nearest_on_empty() {
        let index = NodeIndex::new(0.01);
        assert!(index.nearest(Point::new(0.0, 0.0)).is_none());
    }

    #[test]
    fn test_window_query() {
        let mut index = NodeIndex::new(0.01);
        for i in 0..10 {
            index.insert(id(i), Point::new(i as f64, 0.0));
        }

        let mut found = index.in_window(Point::new(4.5, 0.0), 1.6);
        found.sort_by_key(|n| n.index());
        assert_eq!(found, vec![id(3), id(4), id(5), id(6)]);
    }

    #[test]
    fn test_window_has_no_duplicates() {
        let mut index = NodeIndex::new(0.01);
        index.insert(id(7), Point::new(5.0, 5.0));
        let found = index.in_window(Point::new(5.0, 5.0), 10.0);
        assert_eq!(found.len(), 1);
    }

    #[test]
    fn test_remove_same_identity() {
        let mut index = NodeIndex::new(0.01);
        let coord = Point::new(3.0, 4.0);
        index.insert(id(2), coord);

        assert!(index.remove(id(2), coord));
        assert!(!index.remove(id(2), coord));
        assert!(index.is_empty());
    }
}
