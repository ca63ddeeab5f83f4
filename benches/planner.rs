//! Planner benchmarks
//!
//! Benchmarks for the CPU-heavy planner operations:
//! - Viewshed sweep (segment sort + per-endpoint intersection scan)
//! - RRT* growth steps (sampling, neighborhood search, rewiring)
//! - FMT* construction (batch sampling) and frontier expansion
//!
//! Run with: `cargo bench`
//! View HTML reports in: `target/criterion/`

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use drishti_plan::{FmtStar, OccupancyMap, Planner, Point, Rect, RrtStar, Viewshed};

/// A ring of obstacle blocks around the map center.
fn obstacle_ring(width: f64, height: f64, count: usize) -> Vec<Rect> {
    let cx = width / 2.0;
    let cy = height / 2.0;
    let radius = width.min(height) / 3.0;
    (0..count)
        .map(|i| {
            let angle = (i as f64 / count as f64) * std::f64::consts::TAU;
            let x = cx + radius * angle.cos();
            let y = cy + radius * angle.sin();
            Rect::from_coords(x - 8.0, y - 8.0, x + 8.0, y + 8.0)
        })
        .collect()
}

fn bench_viewshed_sweep(c: &mut Criterion) {
    let rects = obstacle_ring(400.0, 400.0, 12);
    let mut viewshed = Viewshed::new();
    viewshed.load_map(400.0, 400.0, 0.0, &rects, &[]);
    viewshed.update_center(30.0, 30.0);

    c.bench_function("viewshed_sweep_12_blocks", |b| {
        b.iter(|| {
            viewshed.sweep();
            black_box(viewshed.polygon_area())
        })
    });
}

fn bench_rrt_growth(c: &mut Criterion) {
    let rects = obstacle_ring(200.0, 200.0, 8);
    let map = OccupancyMap::rasterize(200, 200, &rects);

    c.bench_function("rrt_star_400_steps", |b| {
        b.iter(|| {
            let mut planner = RrtStar::new(
                map.clone(),
                &rects,
                20.0,
                Some(Point::new(10.0, 10.0)),
                Some(Point::new(190.0, 190.0)),
            );
            for _ in 0..400 {
                planner.step();
            }
            black_box(planner.num_nodes())
        })
    });
}

fn bench_fmt_build_and_drain(c: &mut Criterion) {
    let rects = obstacle_ring(100.0, 100.0, 6);
    let map = OccupancyMap::rasterize(100, 100, &rects);

    c.bench_function("fmt_star_build_and_drain", |b| {
        b.iter(|| {
            let mut planner = FmtStar::new(
                map.clone(),
                &rects,
                10.0,
                Some(Point::new(5.0, 5.0)),
                Some(Point::new(95.0, 95.0)),
            );
            let mut steps = 0;
            while planner.is_adding_nodes() && steps < 500 {
                planner.step();
                steps += 1;
            }
            black_box(planner.num_nodes())
        })
    });
}

criterion_group!(
    benches,
    bench_viewshed_sweep,
    bench_rrt_growth,
    bench_fmt_build_and_drain
);
criterion_main!(benches);
