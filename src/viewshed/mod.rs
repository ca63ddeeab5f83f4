//! Sweeping-angle visibility polygon engine.
//!
//! Given a map (boundary, obstacle rectangles, optional free walls) and a
//! center point, computes the polygon of points visible from the center,
//! treating every obstacle edge as an occluder. The polygon area feeds the
//! planners' unseen-area cost term.
//!
//! # Algorithm
//!
//! 1. [`Viewshed::update_center`] computes, per segment, the angle of each
//!    endpoint from the center and a `begin` flag telling whether the
//!    forward sweep enters the segment at that endpoint.
//! 2. [`Viewshed::sweep`] sorts endpoints by (angle, begin-first) and walks
//!    them pairwise. At each event it finds the occluder segments whose
//!    angular extent covers the event angle, intersects the center ray with
//!    each, and emits the nearest hit. When the event endpoint itself lies
//!    on a covering segment ("pass-through") and the nearest other hit is
//!    farther away, the sweep emits both points, ordered by the `begin`
//!    flag, producing the step edges of the polygon.
//!
//! The polygon is rebuilt from scratch on every sweep; callers must not
//! hold on to previous vertex data.

pub mod segment;

use crate::core::math::{angle_within_extent, normalize_angle_delta};
use crate::core::{Point, Rect};

pub use segment::{EndpointRef, Segment, SegmentEnd};

/// Visibility polygon engine.
///
/// Segments and endpoints are loaded once per map and reused across sweeps;
/// only the center, per-endpoint angles, and the output polygon change.
#[derive(Clone, Debug, Default)]
pub struct Viewshed {
    segments: Vec<Segment>,
    endpoints: Vec<EndpointRef>,
    center: Point,
    viewable_polygon: Vec<Point>,
}

impl Viewshed {
    /// Create an empty viewshed with no loaded map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load occluder segments for a map.
    ///
    /// Clears any previous segments, then adds the four map-boundary edges
    /// inset by `margin`, the four edges of every obstacle rectangle
    /// (top, right, bottom, left), and each free wall.
    pub fn load_map(
        &mut self,
        width: f64,
        height: f64,
        margin: f64,
        rects: &[Rect],
        walls: &[(Point, Point)],
    ) {
        self.segments.clear();
        self.endpoints.clear();

        self.load_edge_of_map(width, height, margin);

        for rect in rects {
            self.add_segments_from_rect(rect);
        }

        for wall in walls {
            self.add_segment(wall.0.x, wall.0.y, wall.1.x, wall.1.y);
        }
    }

    fn load_edge_of_map(&mut self, width: f64, height: f64, margin: f64) {
        self.add_segment(margin, margin, margin, height - margin);
        self.add_segment(margin, height - margin, width - margin, height - margin);
        self.add_segment(width - margin, height - margin, width - margin, margin);
        self.add_segment(width - margin, margin, margin, margin);
    }

    fn add_segments_from_rect(&mut self, rect: &Rect) {
        self.add_segment(rect.min.x, rect.min.y, rect.max.x, rect.min.y);
        self.add_segment(rect.max.x, rect.min.y, rect.max.x, rect.max.y);
        self.add_segment(rect.max.x, rect.max.y, rect.min.x, rect.max.y);
        self.add_segment(rect.min.x, rect.max.y, rect.min.x, rect.min.y);
    }

    fn add_segment(&mut self, x1: f64, y1: f64, x2: f64, y2: f64) {
        let index = self.segments.len();
        self.segments
            .push(Segment::new(Point::new(x1, y1), Point::new(x2, y2)));
        self.endpoints.push(EndpointRef {
            segment: index,
            end: 0,
        });
        self.endpoints.push(EndpointRef {
            segment: index,
            end: 1,
        });
    }

    /// Number of loaded occluder segments.
    pub fn num_segments(&self) -> usize {
        self.segments.len()
    }

    /// Current sweep center.
    pub fn center(&self) -> Point {
        self.center
    }

    /// Move the sweep center and recompute per-endpoint angles.
    ///
    /// For each segment: the squared distance from the center to the
    /// midpoint, the atan2 angle of each endpoint, and the `begin` flags.
    /// P1 begins the segment iff the signed sweep P1→P2, normalized to
    /// (−π, π], is positive; P2 carries the negation.
    pub fn update_center(&mut self, x: f64, y: f64) {
        self.center = Point::new(x, y);

        for segment in &mut self.segments {
            let dx = 0.5 * (segment.ends[0].coord.x + segment.ends[1].coord.x) - x;
            let dy = 0.5 * (segment.ends[0].coord.y + segment.ends[1].coord.y) - y;
            segment.center_dist2 = dx * dx + dy * dy;

            let [p1, p2] = &mut segment.ends;
            p1.angle = (p1.coord.y - y).atan2(p1.coord.x - x);
            p2.angle = (p2.coord.y - y).atan2(p2.coord.x - x);

            let d_angle = normalize_angle_delta(p2.angle - p1.angle);
            p1.begin = d_angle > 0.0;
            p2.begin = !p1.begin;
        }
    }

    #[inline]
    fn end(&self, r: EndpointRef) -> &SegmentEnd {
        &self.segments[r.segment].ends[r.end]
    }

    /// Compute the visibility polygon for the current center.
    pub fn sweep(&mut self) {
        self.viewable_polygon.clear();

        let Self {
            segments,
            endpoints,
            ..
        } = self;
        endpoints.sort_by(|a, b| {
            let ea = &segments[a.segment].ends[a.end];
            let eb = &segments[b.segment].ends[b.end];
            ea.angle
                .partial_cmp(&eb.angle)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(eb.begin.cmp(&ea.begin))
        });

        for i in (0..self.endpoints.len()).step_by(2) {
            let e_ref = self.endpoints[i];
            let e = *self.end(e_ref);

            let mut intersected: Vec<usize> = Vec::new();
            let mut has_pass_through = false;
            for (index, segment) in self.segments.iter().enumerate() {
                if index == e_ref.segment {
                    continue;
                }
                let [p1, p2] = &segment.ends;
                if !angle_within_extent(e.angle, p1.angle, p2.angle) {
                    continue;
                }
                let pass_through = is_pass_through(&e, segment);
                if !pass_through {
                    intersected.push(index);
                }
                has_pass_through = has_pass_through || pass_through;
            }

            // the event point itself is the hit when nothing else covers it
            let mut closest = e.coord;
            let mut closest_dist = f64::MAX;
            for &index in &intersected {
                let [p1, p2] = &self.segments[index].ends;
                let hit = line_intersection(self.center, e.coord, p1.coord, p2.coord)
                    .unwrap_or(e.coord);
                let dist = self.center.distance_squared(&hit);
                if dist < closest_dist {
                    closest = hit;
                    closest_dist = dist;
                }
            }

            if has_pass_through && closest_dist > self.center.distance_squared(&e.coord) {
                if e.begin {
                    self.viewable_polygon.push(closest);
                    self.viewable_polygon.push(e.coord);
                } else {
                    self.viewable_polygon.push(e.coord);
                    self.viewable_polygon.push(closest);
                }
            } else {
                self.viewable_polygon.push(closest);
            }
        }
    }

    /// Vertices of the most recent sweep, in emission order, implicitly
    /// closed.
    pub fn viewable_polygon(&self) -> &[Point] {
        &self.viewable_polygon
    }

    /// Signed shoelace area of the most recent polygon.
    ///
    /// Vertices are emitted in angle-ascending order, so the sign follows
    /// the axis convention; callers typically take the absolute value.
    pub fn polygon_area(&self) -> f64 {
        polygon_area(&self.viewable_polygon)
    }
}

/// Whether the event endpoint coincides with one of the segment's endpoints
/// and agrees with its sweep direction.
///
/// Coordinates come verbatim from the shared map load, so exact equality is
/// the right test here.
fn is_pass_through(e: &SegmentEnd, segment: &Segment) -> bool {
    let [p1, p2] = &segment.ends;
    if e.coord == p1.coord {
        return e.begin == p1.begin;
    }
    if e.coord == p2.coord {
        return e.begin == p2.begin;
    }
    false
}

/// Intersection of the (infinite) lines p1-p2 and p3-p4.
///
/// Returns `None` when the lines are parallel enough that the division
/// produces a non-finite parameter; callers fall back to the event point.
fn line_intersection(p1: Point, p2: Point, p3: Point, p4: Point) -> Option<Point> {
    let s = ((p4.x - p3.x) * (p1.y - p3.y) - (p4.y - p3.y) * (p1.x - p3.x))
        / ((p4.y - p3.y) * (p2.x - p1.x) - (p4.x - p3.x) * (p2.y - p1.y));
    if !s.is_finite() {
        return None;
    }
    Some(Point::new(
        p1.x + s * (p2.x - p1.x),
        p1.y + s * (p2.y - p1.y),
    ))
}

/// Signed area of a polygon given as an implicitly closed vertex sequence.
///
/// Degenerate inputs with fewer than three vertices have zero area.
pub fn polygon_area(points: &[Point]) -> f64 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }

    let mut area = 0.0;
    for i in 1..n {
        let prev = points[i - 1];
        let next = points[(i + 1) % n];
        area += points[i].x * (next.y - prev.y);
    }
    area += points[0].x * (points[1].y - points[n - 1].y);
    area / 2.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_unloaded_map_yields_empty_polygon() {
        let mut vs = Viewshed::new();
        vs.update_center(5.0, 5.0);
        vs.sweep();
        assert!(vs.viewable_polygon().is_empty());
        assert_eq!(vs.polygon_area(), 0.0);
    }

    #[test]
    fn test_empty_map_area() {
        let mut vs = Viewshed::new();
        vs.load_map(100.0, 100.0, 0.0, &[], &[]);
        vs.update_center(50.0, 50.0);
        vs.sweep();
        assert!((vs.polygon_area().abs() - 10000.0).abs() <= 1.0);
    }

    #[test]
    fn test_single_centered_obstacle_area() {
        let mut vs = Viewshed::new();
        let rects = [Rect::from_coords(40.0, 40.0, 60.0, 60.0)];
        vs.load_map(100.0, 100.0, 0.0, &rects, &[]);
        vs.update_center(10.0, 10.0);
        vs.sweep();
        // tangent rays from (10,10) through the block corners (60,40) and
        // (40,60) hit the boundary at (100,64) and (64,100); the occluded
        // region behind the block is exactly 2640
        let area = vs.polygon_area().abs();
        assert!(area < 9600.0, "area {} not occluded enough", area);
        assert!((area - 7360.0).abs() < 1.0, "unexpected area {}", area);
    }

    #[test]
    fn test_single_centered_obstacle_vertex_count() {
        let mut vs = Viewshed::new();
        let rects = [Rect::from_coords(40.0, 40.0, 60.0, 60.0)];
        vs.load_map(100.0, 100.0, 0.0, &rects, &[]);
        vs.update_center(10.0, 10.0);
        vs.sweep();
        // coincident-corner events emit duplicate vertices; distinct ones
        // are the three visible map corners, the silhouette step points,
        // and the block's near corner
        let distinct: std::collections::HashSet<(u64, u64)> =
            vs.viewable_polygon().iter().map(|p| p.bits()).collect();
        let n = distinct.len();
        assert!((6..=8).contains(&n), "unexpected distinct vertex count {}", n);
    }

    #[test]
    fn test_sweep_is_idempotent() {
        let mut vs = Viewshed::new();
        let rects = [Rect::from_coords(30.0, 20.0, 55.0, 45.0)];
        vs.load_map(120.0, 90.0, 0.0, &rects, &[]);
        vs.update_center(12.0, 70.0);
        vs.sweep();
        let first: Vec<Point> = vs.viewable_polygon().to_vec();
        vs.sweep();
        assert_eq!(first, vs.viewable_polygon());
    }

    #[test]
    fn test_free_wall_occludes() {
        let mut vs = Viewshed::new();
        let wall = (Point::new(50.0, 20.0), Point::new(50.0, 80.0));
        vs.load_map(100.0, 100.0, 0.0, &[], &[wall]);
        vs.update_center(10.0, 50.0);
        vs.sweep();
        let with_wall = vs.polygon_area().abs();

        let mut open = Viewshed::new();
        open.load_map(100.0, 100.0, 0.0, &[], &[]);
        open.update_center(10.0, 50.0);
        open.sweep();
        let without_wall = open.polygon_area().abs();

        assert!(with_wall < without_wall);
    }

    #[test]
    fn test_polygon_area_rectangle() {
        let rect = [
            Point::new(0.0, 0.0),
            Point::new(4.0, 0.0),
            Point::new(4.0, 3.0),
            Point::new(0.0, 3.0),
        ];
        assert_relative_eq!(polygon_area(&rect).abs(), 12.0, epsilon = 1e-12);
    }

    #[test]
    fn test_polygon_area_degenerate() {
        assert_eq!(polygon_area(&[]), 0.0);
        assert_eq!(polygon_area(&[Point::new(1.0, 1.0)]), 0.0);
        assert_eq!(
            polygon_area(&[Point::new(1.0, 1.0), Point::new(2.0, 2.0)]),
            0.0
        );
    }

    #[test]
    fn test_update_center_sets_begin_flags() {
        let mut vs = Viewshed::new();
        vs.load_map(10.0, 10.0, 0.0, &[], &[]);
        vs.update_center(5.0, 5.0);
        for segment in &vs.segments {
            let [p1, p2] = &segment.ends;
            assert_ne!(p1.begin, p2.begin);
        }
    }
}
