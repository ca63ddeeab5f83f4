//! Random obstacle layouts for demos, benches, and tests.

use rand::Rng;

use crate::core::{Point, Rect};

use super::OccupancyMap;

/// Margin by which the stored rectangles are inset relative to the painted
/// raster. Keeps viewshed edges strictly inside their obstacle pixels.
const RECT_INSET: f64 = 5.0;

/// Generate `count` non-overlapping random obstacle rectangles and the
/// matching raster.
///
/// Each rectangle is kept only if it is more than 2 px on a side and does
/// not intersect any previously placed rectangle. The returned rectangles
/// are inset by a few pixels from what was painted.
pub fn generate_obstacles<R: Rng>(
    width: u32,
    height: u32,
    count: usize,
    rng: &mut R,
) -> (Vec<Rect>, OccupancyMap) {
    let mut obstacles: Vec<Rect> = Vec::with_capacity(count);

    for _ in 0..count {
        // keep drawing until we get a non-intersecting rectangle
        let rect = loop {
            let a = random_point(width, height, rng);
            let b = random_point(width, height, rng);
            let rect = Rect::from_coords(a.x, a.y, b.x, b.y);
            if rect.width() > 2.0
                && rect.height() > 2.0
                && !obstacles.iter().any(|o| o.intersects(&rect))
            {
                break rect;
            }
        };
        obstacles.push(rect);
    }

    let map = OccupancyMap::rasterize(width, height, &obstacles);

    for rect in &mut obstacles {
        *rect = rect.inflate(-RECT_INSET);
    }

    (obstacles, map)
}

fn random_point<R: Rng>(width: u32, height: u32, rng: &mut R) -> Point {
    Point::new(
        rng.gen_range(0..width) as f64,
        rng.gen_range(0..height) as f64,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_obstacles_disjoint() {
        let mut rng = rand::thread_rng();
        let (rects, map) = generate_obstacles(200, 150, 8, &mut rng);
        assert_eq!(rects.len(), 8);
        assert_eq!(map.width(), 200);
        assert_eq!(map.height(), 150);

        for (i, a) in rects.iter().enumerate() {
            for b in rects.iter().skip(i + 1) {
                // inset rects keep a gap of at least twice the inset
                assert!(!a.intersects(b));
            }
        }
    }

    #[test]
    fn test_generated_raster_marks_obstacle_centers() {
        let mut rng = rand::thread_rng();
        let (rects, map) = generate_obstacles(200, 200, 4, &mut rng);
        for rect in &rects {
            let center = Point::new(
                (rect.min.x + rect.max.x) / 2.0,
                (rect.min.y + rect.max.y) / 2.0,
            );
            if rect.width() > 0.0 && rect.height() > 0.0 {
                assert!(map.point_intersects_obstacle(center, 200));
            }
        }
    }
}
