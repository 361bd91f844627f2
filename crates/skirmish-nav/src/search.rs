//! Bounded 8-connected A* over a [`NavGrid`].

use core::cmp::Ordering;
use core::f32::consts::SQRT_2;
use std::collections::BinaryHeap;

use skirmish_core::{SearchBound, Vec2};

use crate::{Cell, NavGrid, Path};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchLimits {
    /// Hard cap on expanded nodes; keeps a single query from stalling the frame.
    pub max_expansions: usize,
    /// How many rings to search for a free cell when the start lies inside an inflated obstacle.
    pub start_snap_radius: i32,
}

impl Default for SearchLimits {
    fn default() -> Self {
        Self {
            max_expansions: 4096,
            start_snap_radius: 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchOutcome {
    Found,
    /// The goal cell is blocked; no search was performed.
    GoalBlocked,
    /// No free cell near the start.
    StartBlocked,
    /// Start or goal lies outside the grid.
    OutOfBounds,
    Unreachable,
    BudgetExceeded(SearchBound),
}

impl SearchOutcome {
    pub fn is_found(self) -> bool {
        matches!(self, SearchOutcome::Found)
    }
}

/// Raw cell sequence produced by A*, before smoothing.
#[derive(Debug, Clone, PartialEq)]
pub struct CellPath {
    pub cells: Vec<Cell>,
    pub outcome: SearchOutcome,
    pub expansions: usize,
}

impl CellPath {
    fn failed(outcome: SearchOutcome, expansions: usize) -> Self {
        Self {
            cells: Vec::new(),
            outcome,
            expansions,
        }
    }
}

/// Smoothed world-space result.
#[derive(Debug, Clone)]
pub struct PathResult {
    pub path: Path,
    pub outcome: SearchOutcome,
    pub expansions: usize,
}

#[derive(Debug)]
struct OpenNode {
    f: f32,
    g: f32,
    cell: Cell,
    tie: u64,
}

impl PartialEq for OpenNode {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for OpenNode {}

impl PartialOrd for OpenNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OpenNode {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering to make BinaryHeap behave like a min-heap.
        other
            .f
            .total_cmp(&self.f)
            .then_with(|| other.g.total_cmp(&self.g))
            .then_with(|| other.cell.cmp(&self.cell))
            .then_with(|| other.tie.cmp(&self.tie))
    }
}

// Fixed order for determinism: N, NE, E, SE, S, SW, W, NW.
const NEIGHBORS: [(i32, i32); 8] = [
    (0, -1),
    (1, -1),
    (1, 0),
    (1, 1),
    (0, 1),
    (-1, 1),
    (-1, 0),
    (-1, -1),
];

fn heuristic(a: Cell, b: Cell) -> f32 {
    let dx = (a.x - b.x) as f32;
    let dy = (a.y - b.y) as f32;
    (dx * dx + dy * dy).sqrt()
}

fn reconstruct(grid: &NavGrid, came_from: &[Option<usize>], mut current: usize) -> Vec<Cell> {
    let mut out = vec![grid.cell_from_idx(current)];
    while let Some(prev) = came_from[current] {
        current = prev;
        out.push(grid.cell_from_idx(current));
    }
    out.reverse();
    out
}

/// A* from `start` to `goal` over 8-connected cells.
///
/// Cardinal steps cost 1 and diagonal steps cost √2; the Euclidean heuristic is consistent, so
/// found paths are optimal. A diagonal step is only taken when both flanking cardinal cells are
/// free. A blocked goal returns immediately with zero expansions.
pub fn find_cell_path(grid: &NavGrid, start: Cell, goal: Cell, limits: SearchLimits) -> CellPath {
    let Some(goal_idx) = grid.idx(goal) else {
        return CellPath::failed(SearchOutcome::OutOfBounds, 0);
    };
    if grid.blocked_at(goal_idx) {
        return CellPath::failed(SearchOutcome::GoalBlocked, 0);
    }
    if !grid.in_bounds(start) {
        return CellPath::failed(SearchOutcome::OutOfBounds, 0);
    }
    let Some(start) = grid.nearest_free(start, limits.start_snap_radius) else {
        return CellPath::failed(SearchOutcome::StartBlocked, 0);
    };
    let Some(start_idx) = grid.idx(start) else {
        return CellPath::failed(SearchOutcome::OutOfBounds, 0);
    };

    let mut open = BinaryHeap::<OpenNode>::new();
    let mut tie: u64 = 0;
    let mut g_score = vec![f32::INFINITY; grid.len()];
    let mut came_from: Vec<Option<usize>> = vec![None; grid.len()];
    let mut closed = vec![false; grid.len()];

    g_score[start_idx] = 0.0;
    open.push(OpenNode {
        f: heuristic(start, goal),
        g: 0.0,
        cell: start,
        tie,
    });
    tie += 1;

    let mut expansions: usize = 0;

    while let Some(node) = open.pop() {
        let Some(node_idx) = grid.idx(node.cell) else {
            continue;
        };
        if closed[node_idx] || node.g > g_score[node_idx] {
            // Stale heap entry.
            continue;
        }

        if node.cell == goal {
            return CellPath {
                cells: reconstruct(grid, &came_from, goal_idx),
                outcome: SearchOutcome::Found,
                expansions,
            };
        }

        if expansions >= limits.max_expansions {
            tracing::debug!(
                expansions,
                cap = limits.max_expansions,
                "path search hit its expansion cap"
            );
            return CellPath::failed(
                SearchOutcome::BudgetExceeded(SearchBound {
                    expanded: expansions,
                    cap: limits.max_expansions,
                }),
                expansions,
            );
        }
        expansions += 1;
        closed[node_idx] = true;

        for (dx, dy) in NEIGHBORS {
            let n = Cell::new(node.cell.x + dx, node.cell.y + dy);
            let Some(n_idx) = grid.idx(n) else { continue };
            if grid.blocked_at(n_idx) || closed[n_idx] {
                continue;
            }

            let diagonal = dx != 0 && dy != 0;
            if diagonal
                && (grid.is_blocked(node.cell.x + dx, node.cell.y)
                    || grid.is_blocked(node.cell.x, node.cell.y + dy))
            {
                continue;
            }

            let step = if diagonal { SQRT_2 } else { 1.0 };
            let tentative_g = node.g + step;
            if tentative_g >= g_score[n_idx] {
                continue;
            }

            came_from[n_idx] = Some(node_idx);
            g_score[n_idx] = tentative_g;
            open.push(OpenNode {
                f: tentative_g + heuristic(n, goal),
                g: tentative_g,
                cell: n,
                tie,
            });
            tie += 1;
        }
    }

    CellPath::failed(SearchOutcome::Unreachable, expansions)
}

/// String-pull a raw cell path: from each anchor, jump to the furthest later cell that is
/// visible through free space, dropping everything in between.
pub fn smooth_cells(grid: &NavGrid, cells: &[Cell]) -> Vec<Cell> {
    if cells.len() <= 2 {
        return cells.to_vec();
    }
    let last = cells.len() - 1;
    let mut out = vec![cells[0]];
    let mut anchor = 0;
    while anchor < last {
        let mut next = last;
        while next > anchor + 1 && !grid.cells_visible(cells[anchor], cells[next]) {
            next -= 1;
        }
        out.push(cells[next]);
        anchor = next;
    }
    out
}

/// Plan from world point `start` to world point `goal`.
///
/// Waypoints are smoothed cell centers: the first is the start cell center and the last is the
/// goal cell center. Failures return an empty path.
pub fn find_path(grid: &NavGrid, start: Vec2, goal: Vec2, limits: SearchLimits) -> PathResult {
    let (Some(start_cell), Some(goal_cell)) = (grid.world_to_cell(start), grid.world_to_cell(goal))
    else {
        return PathResult {
            path: Path::empty(goal),
            outcome: SearchOutcome::OutOfBounds,
            expansions: 0,
        };
    };

    let raw = find_cell_path(grid, start_cell, goal_cell, limits);
    if !raw.outcome.is_found() {
        return PathResult {
            path: Path::empty(goal),
            outcome: raw.outcome,
            expansions: raw.expansions,
        };
    }

    let waypoints = smooth_cells(grid, &raw.cells)
        .into_iter()
        .map(|c| grid.cell_center(c))
        .collect();
    PathResult {
        path: Path::new(waypoints, goal),
        outcome: SearchOutcome::Found,
        expansions: raw.expansions,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_list_pops_lowest_f_first() {
        let mut heap = BinaryHeap::new();
        for (i, f) in [3.0f32, 1.0, 2.0].into_iter().enumerate() {
            heap.push(OpenNode {
                f,
                g: 0.0,
                cell: Cell::new(i as i32, 0),
                tie: i as u64,
            });
        }
        let order: Vec<f32> = std::iter::from_fn(|| heap.pop().map(|n| n.f)).collect();
        assert_eq!(order, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn diagonal_path_cost_is_optimal() {
        let grid = NavGrid::new(5, 5, 1.0);
        let path = find_cell_path(&grid, Cell::new(0, 0), Cell::new(4, 4), SearchLimits::default());
        assert_eq!(path.cells.len(), 5, "pure diagonal");
    }

    #[test]
    fn smoothing_collapses_open_ground_to_endpoints() {
        let grid = NavGrid::new(6, 3, 1.0);
        let raw = find_cell_path(&grid, Cell::new(0, 0), Cell::new(5, 2), SearchLimits::default());
        let smooth = smooth_cells(&grid, &raw.cells);
        assert_eq!(smooth, vec![Cell::new(0, 0), Cell::new(5, 2)]);
    }
}
