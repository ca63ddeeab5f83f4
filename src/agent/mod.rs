//! Path-following consumer of the planner.
//!
//! A thin agent that walks along a planned path a bounded distance per
//! tick, and replans in the background when its path runs out. The replan
//! owns a private planner; its only shared state is the one-shot result
//! slot the agent reads on completion.

use std::sync::Arc;
use std::thread;

use log::debug;
use parking_lot::Mutex;

use crate::core::{Point, Rect};
use crate::map::OccupancyMap;
use crate::planner::{Planner, RrtStar};

/// Maximum distance walked per update tick (pixels).
const MAX_TRAVEL: f64 = 2.0;

/// Iteration cap for a background replan, so a sealed-off agent cannot
/// spin its planner forever.
const MAX_REPLAN_STEPS: u64 = 100_000;

/// In-flight background replan.
struct ReplanHandle {
    /// Written exactly once, by the replanner thread on completion.
    result: Arc<Mutex<Option<Vec<Point>>>>,
    thread: thread::JoinHandle<()>,
}

/// An agent that wanders the map by following freshly planned paths.
///
/// Each exhausted path triggers one background replan toward a new random
/// goal; the agent holds position until the result lands.
pub struct PathFollower {
    position: Point,
    map: OccupancyMap,
    obstacle_rects: Vec<Rect>,
    max_segment: f64,
    /// Remaining waypoints, ordered goal first (walked from the back).
    current_path: Vec<Point>,
    replan: Option<ReplanHandle>,
}

impl PathFollower {
    /// Create a follower standing at `start`.
    pub fn new(
        map: OccupancyMap,
        obstacle_rects: Vec<Rect>,
        max_segment: f64,
        start: Point,
    ) -> Self {
        Self {
            position: start,
            map,
            obstacle_rects,
            max_segment,
            current_path: Vec::new(),
            replan: None,
        }
    }

    /// Current agent position.
    pub fn position(&self) -> Point {
        self.position
    }

    /// Whether a background replan is in flight.
    pub fn is_replanning(&self) -> bool {
        self.replan.is_some()
    }

    /// Remaining waypoints of the active path.
    pub fn current_path(&self) -> &[Point] {
        &self.current_path
    }

    /// One movement tick.
    ///
    /// Collects a finished replan, walks toward the next waypoint, or
    /// kicks off a background replan when the path is exhausted. While a
    /// replan is in flight the agent holds position.
    pub fn update(&mut self) {
        if let Some(handle) = self.replan.take() {
            if !handle.thread.is_finished() {
                self.replan = Some(handle);
                return;
            }
            if handle.thread.join().is_err() {
                debug!("[PathFollower] background replan panicked; will retry");
            } else if let Some(path) = handle.result.lock().take() {
                self.current_path = path;
            }
        }

        let Some(&waypoint) = self.current_path.last() else {
            self.spawn_replan();
            return;
        };

        if self.position.distance(&waypoint) <= MAX_TRAVEL {
            self.position = waypoint;
            self.current_path.pop();
        } else {
            let angle = self.position.angle_to(&waypoint);
            self.position = self.position.point_at(angle, MAX_TRAVEL);
        }
    }

    /// Launch the one-shot background replan from the current position
    /// toward a fresh random goal.
    fn spawn_replan(&mut self) {
        let result = Arc::new(Mutex::new(None));
        let slot = Arc::clone(&result);
        let map = self.map.clone();
        let rects = self.obstacle_rects.clone();
        let start = self.position;
        let max_segment = self.max_segment;

        let thread = thread::spawn(move || {
            let mut planner = RrtStar::new(map, &rects, max_segment, Some(start), None);
            let mut steps = 0u64;
            while planner.best_path().is_empty() && steps < MAX_REPLAN_STEPS {
                planner.step();
                steps += 1;
            }
            let mut path = planner.best_path().to_vec();
            // the trailing waypoint is the root, where the agent stands
            path.pop();
            *slot.lock() = Some(path);
        });

        self.replan = Some(ReplanHandle { result, thread });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn settled_follower() -> PathFollower {
        let map = OccupancyMap::rasterize(60, 60, &[]);
        let mut follower = PathFollower::new(map, Vec::new(), 10.0, Point::new(5.0, 5.0));

        // first update launches the replan; poll until the path lands
        follower.update();
        assert!(follower.is_replanning());
        for _ in 0..500 {
            follower.update();
            if !follower.is_replanning() && !follower.current_path().is_empty() {
                return follower;
            }
            thread::sleep(Duration::from_millis(10));
        }
        panic!("background replan never completed");
    }

    #[test]
    fn test_replan_produces_path() {
        let follower = settled_follower();
        assert!(!follower.current_path().is_empty());
        // the agent's own position was trimmed off the path
        assert_ne!(*follower.current_path().last().unwrap(), follower.position());
    }

    #[test]
    fn test_update_walks_bounded_steps() {
        let mut follower = settled_follower();
        for _ in 0..20 {
            let before = follower.position();
            let waypoints_before = follower.current_path().len();
            follower.update();
            if follower.current_path().is_empty() {
                break;
            }
            let moved = before.distance(&follower.position());
            assert!(moved <= MAX_TRAVEL + 1e-9, "moved {} in one tick", moved);
            assert!(follower.current_path().len() <= waypoints_before);
        }
    }
}
