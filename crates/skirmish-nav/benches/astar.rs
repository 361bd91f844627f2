use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use skirmish_nav::{find_cell_path, find_path, Cell, NavGrid, SearchLimits};
use skirmish_core::Vec2;

/// Serpentine walls force the search to cover most of the grid.
fn serpentine(size: u32) -> NavGrid {
    let mut grid = NavGrid::new(size, size, 1.0);
    let s = size as i32;
    for x in (2..s - 1).step_by(4) {
        for y in 0..s - 1 {
            grid.set_blocked(x, y, true);
        }
        for y in 1..s {
            grid.set_blocked(x + 2, y, true);
        }
    }
    grid
}

fn bench_astar(c: &mut Criterion) {
    let mut group = c.benchmark_group("skirmish-nav/find_cell_path");
    let limits = SearchLimits {
        max_expansions: usize::MAX,
        start_snap_radius: 0,
    };

    for &size in &[32u32, 128u32] {
        let grid = serpentine(size);
        let goal = Cell::new(size as i32 - 1, size as i32 - 1);
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &_size| {
            b.iter(|| {
                let path = find_cell_path(&grid, Cell::new(0, 0), goal, limits);
                black_box(path.cells.len());
            })
        });
    }
    group.finish();

    let grid = serpentine(64).inflate(0.6);
    c.bench_function("skirmish-nav/find_path(smoothed, 64)", |b| {
        b.iter(|| {
            let result = find_path(&grid, Vec2::new(0.5, 0.5), Vec2::new(63.5, 63.5), limits);
            black_box(result.path.len());
        })
    });
}

criterion_group!(benches, bench_astar);
criterion_main!(benches);
