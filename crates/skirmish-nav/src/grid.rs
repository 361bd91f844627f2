use skirmish_core::{Bounds, TileKind, Vec2, WorldQuery};

/// Integer grid coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Cell {
    pub x: i32,
    pub y: i32,
}

impl Cell {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Chebyshev adjacency (8-connected), excluding the cell itself.
    pub fn is_adjacent(self, other: Cell) -> bool {
        let dx = (self.x - other.x).abs();
        let dy = (self.y - other.y).abs();
        dx <= 1 && dy <= 1 && (dx + dy) > 0
    }

    pub fn is_diagonal_to(self, other: Cell) -> bool {
        (self.x - other.x).abs() == 1 && (self.y - other.y).abs() == 1
    }
}

/// Largest width or height a grid accepts. Keeps cell counts and `i32` coordinates in range.
pub const MAX_DIMENSION: u32 = 1 << 14;

/// Occupancy grid of free/blocked cells.
///
/// Cells outside the grid read as blocked. A grid is immutable once built; map changes produce
/// a new grid (see [`crate::NavGridCache`]).
#[derive(Debug, Clone, PartialEq)]
pub struct NavGrid {
    width: i32,
    height: i32,
    cell_size: f32,
    origin: Vec2,
    blocked: Vec<bool>,
}

impl NavGrid {
    /// Panics when a dimension is zero or above [`MAX_DIMENSION`].
    pub fn new(width: u32, height: u32, cell_size: f32) -> Self {
        assert!(width > 0 && height > 0, "grid must be non-empty");
        assert!(
            width <= MAX_DIMENSION && height <= MAX_DIMENSION,
            "grid {width}x{height} exceeds {MAX_DIMENSION} cells per side"
        );
        assert!(cell_size > 0.0, "cell_size must be > 0");
        Self {
            width: width as i32,
            height: height as i32,
            cell_size,
            origin: Vec2::ZERO,
            blocked: vec![false; width as usize * height as usize],
        }
    }

    pub fn with_origin(mut self, origin: Vec2) -> Self {
        self.origin = origin;
        self
    }

    /// Sample the world's tile map at every cell center.
    pub fn from_world<W: WorldQuery + ?Sized>(world: &W, cell_size: f32) -> Self {
        let bounds = world.bounds();
        let cell_size = if cell_size > 0.0 { cell_size } else { 1.0 };
        let width = ((bounds.width() / cell_size).ceil() as u32).clamp(1, MAX_DIMENSION);
        let height = ((bounds.height() / cell_size).ceil() as u32).clamp(1, MAX_DIMENSION);
        let mut grid = Self::new(width, height, cell_size).with_origin(bounds.min);
        for y in 0..grid.height {
            for x in 0..grid.width {
                let cell = Cell::new(x, y);
                let tile = world.tile_at(grid.cell_center(cell));
                grid.set_blocked(x, y, !tile.is_walkable());
            }
        }
        grid
    }

    /// Build from a row-major tile slice (`tiles.len() == width * height`).
    pub fn from_tiles(width: u32, height: u32, cell_size: f32, tiles: &[TileKind]) -> Self {
        let mut grid = Self::new(width, height, cell_size);
        for (idx, tile) in tiles.iter().enumerate().take(grid.blocked.len()) {
            grid.blocked[idx] = !tile.is_walkable();
        }
        grid
    }

    pub fn width(&self) -> u32 {
        self.width as u32
    }

    pub fn height(&self) -> u32 {
        self.height as u32
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    pub fn bounds(&self) -> Bounds {
        Bounds::new(
            self.origin,
            self.origin
                + Vec2::new(
                    self.width as f32 * self.cell_size,
                    self.height as f32 * self.cell_size,
                ),
        )
    }

    pub fn set_blocked(&mut self, x: i32, y: i32, blocked: bool) {
        if let Some(idx) = self.idx(Cell { x, y }) {
            self.blocked[idx] = blocked;
        }
    }

    pub fn is_blocked(&self, x: i32, y: i32) -> bool {
        self.idx(Cell { x, y })
            .map(|idx| self.blocked[idx])
            .unwrap_or(true)
    }

    pub fn is_cell_blocked(&self, cell: Cell) -> bool {
        self.is_blocked(cell.x, cell.y)
    }

    pub fn blocked_count(&self) -> usize {
        self.blocked.iter().filter(|b| **b).count()
    }

    pub fn in_bounds(&self, cell: Cell) -> bool {
        cell.x >= 0 && cell.y >= 0 && cell.x < self.width && cell.y < self.height
    }

    pub(crate) fn idx(&self, cell: Cell) -> Option<usize> {
        if !self.in_bounds(cell) {
            return None;
        }
        Some((cell.y * self.width + cell.x) as usize)
    }

    pub(crate) fn cell_from_idx(&self, idx: usize) -> Cell {
        let idx = idx as i32;
        Cell {
            x: idx % self.width,
            y: idx / self.width,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.blocked.len()
    }

    pub(crate) fn blocked_at(&self, idx: usize) -> bool {
        self.blocked[idx]
    }

    pub fn world_to_cell(&self, p: Vec2) -> Option<Cell> {
        if !p.is_finite() {
            return None;
        }
        let local = p - self.origin;
        let cell = Cell {
            x: (local.x / self.cell_size).floor() as i32,
            y: (local.y / self.cell_size).floor() as i32,
        };
        if self.in_bounds(cell) {
            Some(cell)
        } else {
            None
        }
    }

    pub fn cell_center(&self, cell: Cell) -> Vec2 {
        self.origin
            + Vec2::new(
                (cell.x as f32 + 0.5) * self.cell_size,
                (cell.y as f32 + 0.5) * self.cell_size,
            )
    }

    /// Copy of this grid where every cell whose center lies within `clearance` of a blocked
    /// cell's footprint is blocked too.
    pub fn inflate(&self, clearance: f32) -> NavGrid {
        let mut out = self.clone();
        if !(clearance > 0.0) {
            return out;
        }

        let cs = self.cell_size;
        let reach = ((clearance + cs * 0.5) / cs).ceil() as i32;
        let mut mask: Vec<(i32, i32)> = Vec::new();
        for dy in -reach..=reach {
            for dx in -reach..=reach {
                if dx == 0 && dy == 0 {
                    continue;
                }
                // Gap between the neighbor's center and the blocked cell's square.
                let gx = (dx.abs() as f32 * cs - cs * 0.5).max(0.0);
                let gy = (dy.abs() as f32 * cs - cs * 0.5).max(0.0);
                if (gx * gx + gy * gy).sqrt() < clearance {
                    mask.push((dx, dy));
                }
            }
        }

        for idx in 0..self.blocked.len() {
            if !self.blocked[idx] {
                continue;
            }
            let c = self.cell_from_idx(idx);
            for &(dx, dy) in &mask {
                out.set_blocked(c.x + dx, c.y + dy, true);
            }
        }
        out
    }

    /// Nearest free cell to `cell` within `max_radius` rings, scanning rings in a fixed order.
    pub fn nearest_free(&self, cell: Cell, max_radius: i32) -> Option<Cell> {
        if self.in_bounds(cell) && !self.is_cell_blocked(cell) {
            return Some(cell);
        }
        for r in 1..=max_radius.max(0) {
            let mut best: Option<(i32, Cell)> = None;
            for dy in -r..=r {
                for dx in -r..=r {
                    if dx.abs() != r && dy.abs() != r {
                        continue;
                    }
                    let c = Cell::new(cell.x + dx, cell.y + dy);
                    if !self.in_bounds(c) || self.is_cell_blocked(c) {
                        continue;
                    }
                    let d2 = dx * dx + dy * dy;
                    if best.map_or(true, |(bd, _)| d2 < bd) {
                        best = Some((d2, c));
                    }
                }
            }
            if let Some((_, c)) = best {
                return Some(c);
            }
        }
        None
    }

    /// Conservative line-of-sight between two cell centers: every cell the segment touches must
    /// be free, and when the segment passes exactly through a grid corner both cells flanking
    /// that corner must be free.
    pub fn cells_visible(&self, a: Cell, b: Cell) -> bool {
        let dx = b.x - a.x;
        let dy = b.y - a.y;
        let nx = dx.abs() as i64;
        let ny = dy.abs() as i64;
        let sx = dx.signum();
        let sy = dy.signum();

        let mut p = a;
        if self.is_cell_blocked(p) {
            return false;
        }

        let (mut ix, mut iy) = (0i64, 0i64);
        while ix < nx || iy < ny {
            let decision = (1 + 2 * ix) * ny - (1 + 2 * iy) * nx;
            if decision == 0 {
                if self.is_blocked(p.x + sx, p.y) || self.is_blocked(p.x, p.y + sy) {
                    return false;
                }
                p.x += sx;
                p.y += sy;
                ix += 1;
                iy += 1;
            } else if decision < 0 {
                p.x += sx;
                ix += 1;
            } else {
                p.y += sy;
                iy += 1;
            }
            if self.is_cell_blocked(p) {
                return false;
            }
        }
        true
    }

    /// Line-of-sight between two world points, evaluated between their cell centers.
    pub fn segment_clear(&self, a: Vec2, b: Vec2) -> bool {
        match (self.world_to_cell(a), self.world_to_cell(b)) {
            (Some(ca), Some(cb)) => self.cells_visible(ca, cb),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inflation_blocks_cardinal_neighbors_for_wide_agents() {
        let mut grid = NavGrid::new(5, 5, 1.0);
        grid.set_blocked(2, 2, true);

        let thin = grid.inflate(0.4);
        assert_eq!(thin.blocked_count(), 1);

        let wide = grid.inflate(0.6);
        assert!(wide.is_blocked(2, 1) && wide.is_blocked(1, 2));
        assert!(!wide.is_blocked(1, 1), "diagonal gap is ~0.707");

        let wider = grid.inflate(0.8);
        assert!(wider.is_blocked(1, 1));
    }

    #[test]
    fn corner_crossing_needs_both_flanks_free() {
        let mut grid = NavGrid::new(3, 3, 1.0);
        grid.set_blocked(1, 0, true);
        assert!(!grid.cells_visible(Cell::new(0, 0), Cell::new(1, 1)));
        assert!(grid.cells_visible(Cell::new(0, 1), Cell::new(2, 1)));
    }

    #[test]
    fn nearest_free_escapes_inflated_start() {
        let mut grid = NavGrid::new(4, 4, 1.0);
        grid.set_blocked(0, 0, true);
        let c = grid.nearest_free(Cell::new(0, 0), 2).unwrap();
        assert!(!grid.is_cell_blocked(c));
        assert!(c.is_adjacent(Cell::new(0, 0)));
    }

    #[test]
    fn world_to_cell_respects_origin() {
        let grid = NavGrid::new(4, 4, 2.0).with_origin(Vec2::new(-4.0, -4.0));
        assert_eq!(grid.world_to_cell(Vec2::new(-3.0, -3.0)), Some(Cell::new(0, 0)));
        assert_eq!(grid.world_to_cell(Vec2::new(3.9, 3.9)), Some(Cell::new(3, 3)));
        assert_eq!(grid.world_to_cell(Vec2::new(4.1, 0.0)), None);
    }

    #[test]
    fn long_thin_grids_size_their_cells_without_overflow() {
        let grid = NavGrid::new(MAX_DIMENSION, 2, 1.0);
        assert_eq!(grid.width(), MAX_DIMENSION);
        assert!(!grid.is_blocked(MAX_DIMENSION as i32 - 1, 1));
    }

    #[test]
    #[should_panic(expected = "cells per side")]
    fn oversized_grids_are_refused() {
        NavGrid::new(50_000, 50_000, 1.0);
    }
}
