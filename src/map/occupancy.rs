//! Grayscale occupancy raster and its collision predicates.

use image::{GrayImage, Luma};

use crate::core::{Point, Rect};

/// Large stand-in slope for vertical segments, so the y-iteration still
/// samples the column.
const VERTICAL_SLOPE: f64 = 20000.0;

/// Read-only grayscale occupancy raster.
///
/// A pixel value above the caller-supplied obstacle color means the cell is
/// blocked. Queries outside the raster count as blocked; see
/// [`OccupancyMap::segment_intersects_obstacle`] for the one deliberate
/// exception.
#[derive(Clone, Debug)]
pub struct OccupancyMap {
    grid: GrayImage,
}

impl OccupancyMap {
    /// Wrap an existing grayscale raster.
    pub fn new(grid: GrayImage) -> Self {
        Self { grid }
    }

    /// Paint obstacle rectangles (white on black) into a fresh raster.
    pub fn rasterize(width: u32, height: u32, rects: &[Rect]) -> Self {
        let mut grid = GrayImage::new(width, height);
        for rect in rects {
            if rect.max.x < 0.0 || rect.max.y < 0.0 {
                continue;
            }
            let x0 = rect.min.x.max(0.0) as u32;
            let y0 = rect.min.y.max(0.0) as u32;
            let x1 = (rect.max.x as u32).min(width.saturating_sub(1));
            let y1 = (rect.max.y as u32).min(height.saturating_sub(1));
            for y in y0..=y1 {
                for x in x0..=x1 {
                    grid.put_pixel(x, y, Luma([255u8]));
                }
            }
        }
        Self { grid }
    }

    /// Raster width in pixels.
    #[inline]
    pub fn width(&self) -> u32 {
        self.grid.width()
    }

    /// Raster height in pixels.
    #[inline]
    pub fn height(&self) -> u32 {
        self.grid.height()
    }

    /// Underlying grayscale buffer.
    #[inline]
    pub fn grid(&self) -> &GrayImage {
        &self.grid
    }

    /// Pixel value at integer cell coordinates, or `None` out of bounds.
    #[inline]
    pub fn value_at(&self, x: i64, y: i64) -> Option<u8> {
        if x < 0 || y < 0 || x >= self.grid.width() as i64 || y >= self.grid.height() as i64 {
            return None;
        }
        Some(self.grid.get_pixel(x as u32, y as u32).0[0])
    }

    /// Pixel value at a real-valued point, truncated to its cell.
    #[inline]
    fn value_at_point(&self, point: Point) -> Option<u8> {
        if !point.x.is_finite() || !point.y.is_finite() {
            return None;
        }
        self.value_at(point.x as i64, point.y as i64)
    }

    /// Check whether a point sits in an obstacle cell.
    ///
    /// Out-of-bounds points count as obstacle.
    pub fn point_intersects_obstacle(&self, point: Point, min_obstacle_color: u8) -> bool {
        match self.value_at_point(point) {
            Some(value) => value > min_obstacle_color,
            None => true,
        }
    }

    /// Check whether a point is open enough to place a sample on.
    ///
    /// Stricter than the obstacle predicate: the pixel must be darker than
    /// `free_below`. Out-of-bounds points are never open.
    pub fn is_open(&self, point: Point, free_below: u8) -> bool {
        matches!(self.value_at_point(point), Some(value) if value < free_below)
    }

    /// Check whether the segment p1-p2 crosses any obstacle pixel.
    ///
    /// The segment is rasterized twice, once per axis: integer x over
    /// [min x, max x] sampling y = m·x + b, then integer y over
    /// [min y, max y] sampling x = (y − b)/m. Together the two passes touch
    /// every cell on the line regardless of slope; the redundancy is
    /// harmless. Vertical segments substitute a large slope so the
    /// y-iteration walks the column.
    ///
    /// Samples that fall outside the raster contribute nothing, so a segment
    /// fully outside the map reports no intersection even though point
    /// queries out there count as blocked.
    pub fn segment_intersects_obstacle(&self, p1: Point, p2: Point, min_obstacle_color: u8) -> bool {
        let dx = p2.x - p1.x;
        let dy = p2.y - p1.y;

        let m = if dx != 0.0 { dy / dx } else { VERTICAL_SLOPE };
        let b = -m * p1.x + p1.y;

        let min_x = p1.x.min(p2.x);
        let max_x = p1.x.max(p2.x);
        let mut ix = min_x;
        while ix <= max_x {
            let y = m * ix + b;
            if let Some(value) = self.value_at_point(Point::new(ix, y)) {
                if value > min_obstacle_color {
                    return true;
                }
            }
            ix += 1.0;
        }

        let min_y = p1.y.min(p2.y);
        let max_y = p1.y.max(p2.y);
        let mut iy = min_y;
        while iy <= max_y {
            let x = (iy - b) / m;
            if let Some(value) = self.value_at_point(Point::new(x, iy)) {
                if value > min_obstacle_color {
                    return true;
                }
            }
            iy += 1.0;
        }

        false
    }

    /// Total obstacle pixel area (cells above the obstacle color).
    pub fn obstacle_area(&self, min_obstacle_color: u8) -> f64 {
        self.grid
            .pixels()
            .filter(|p| p.0[0] > min_obstacle_color)
            .count() as f64
    }

    /// Rejection-sample an open cell, uniformly over the raster.
    pub fn random_open_point<R: rand::Rng>(&self, rng: &mut R) -> Point {
        loop {
            let point = Point::new(
                rng.gen_range(0..self.width()) as f64,
                rng.gen_range(0..self.height()) as f64,
            );
            if !self.point_intersects_obstacle(point, 200) {
                return point;
            }
        }
    }
}
