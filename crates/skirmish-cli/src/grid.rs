//! `skirmish path`: plan on a hand-built grid and draw the result.

use std::fmt::Write as _;

use anyhow::{bail, ensure, Context, Result};
use skirmish_core::Vec2;
use skirmish_nav::{
    find_cell_path, find_path, Cell, NavGrid, SearchLimits, SearchOutcome, MAX_DIMENSION,
};

/// Parse `x,y` into a world point.
pub fn parse_point(s: &str) -> Result<Vec2, String> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| format!("expected x,y but got '{s}'"))?;
    let x: f32 = x.trim().parse().map_err(|e| format!("bad x in '{s}': {e}"))?;
    let y: f32 = y.trim().parse().map_err(|e| format!("bad y in '{s}': {e}"))?;
    Ok(Vec2::new(x, y))
}

/// Parse `x,y` into a grid cell.
pub fn parse_cell(s: &str) -> Result<Cell, String> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| format!("expected x,y but got '{s}'"))?;
    let x: i32 = x.trim().parse().map_err(|e| format!("bad x in '{s}': {e}"))?;
    let y: i32 = y.trim().parse().map_err(|e| format!("bad y in '{s}': {e}"))?;
    Ok(Cell::new(x, y))
}

pub struct PathRequest {
    pub width: u32,
    pub height: u32,
    pub start: Vec2,
    pub goal: Vec2,
    pub walls: Vec<Cell>,
    pub clearance: f32,
    pub max_expansions: usize,
}

#[derive(Debug)]
pub struct PathReport {
    pub outcome: SearchOutcome,
    pub expansions: usize,
    pub waypoints: Vec<Vec2>,
    pub drawing: String,
}

pub fn plan(req: &PathRequest) -> Result<PathReport> {
    ensure!(
        req.width > 0 && req.height > 0,
        "grid must be non-empty, got {}x{}",
        req.width,
        req.height
    );
    ensure!(
        req.width <= MAX_DIMENSION && req.height <= MAX_DIMENSION,
        "grid is limited to {MAX_DIMENSION} cells per side, got {}x{}",
        req.width,
        req.height
    );
    let mut grid = NavGrid::new(req.width, req.height, 1.0);
    for wall in &req.walls {
        if !grid.in_bounds(*wall) {
            bail!("wall {},{} is outside the {}x{} grid", wall.x, wall.y, req.width, req.height);
        }
        grid.set_blocked(wall.x, wall.y, true);
    }
    let grid = grid.inflate(req.clearance);
    let limits = SearchLimits {
        max_expansions: req.max_expansions,
        ..SearchLimits::default()
    };

    let result = find_path(&grid, req.start, req.goal, limits);
    let start = grid
        .world_to_cell(req.start)
        .context("start is outside the grid")?;
    let goal = grid
        .world_to_cell(req.goal)
        .context("goal is outside the grid")?;
    let raw = find_cell_path(&grid, start, goal, limits);

    Ok(PathReport {
        outcome: result.outcome,
        expansions: result.expansions,
        waypoints: result.path.waypoints().collect(),
        drawing: draw(&grid, &raw.cells, start, goal),
    })
}

/// One character per cell, top row first: `#` blocked, `*` on the path, `S`/`G` endpoints.
fn draw(grid: &NavGrid, path: &[Cell], start: Cell, goal: Cell) -> String {
    let mut out = String::new();
    for y in (0..grid.height() as i32).rev() {
        for x in 0..grid.width() as i32 {
            let cell = Cell::new(x, y);
            let ch = if cell == start {
                'S'
            } else if cell == goal {
                'G'
            } else if grid.is_cell_blocked(cell) {
                '#'
            } else if path.contains(&cell) {
                '*'
            } else {
                '.'
            };
            out.push(ch);
        }
        let _ = writeln!(out);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn points_and_cells_parse() {
        assert_eq!(parse_point("1.5, 2").unwrap(), Vec2::new(1.5, 2.0));
        assert_eq!(parse_cell("3,4").unwrap(), Cell::new(3, 4));
        assert!(parse_point("1.5").is_err());
        assert!(parse_cell("a,1").is_err());
    }

    #[test]
    fn drawn_path_goes_around_the_wall() {
        let report = plan(&PathRequest {
            width: 5,
            height: 3,
            start: Vec2::new(0.5, 0.5),
            goal: Vec2::new(4.5, 0.5),
            walls: vec![Cell::new(2, 0), Cell::new(2, 1)],
            clearance: 0.0,
            max_expansions: 256,
        })
        .unwrap();
        assert!(report.outcome.is_found());
        let rows: Vec<&str> = report.drawing.lines().collect();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].chars().nth(2), Some('*'), "crosses above the wall");
        assert_eq!(rows[2], "S.#.G");
    }

    #[test]
    fn walls_outside_the_grid_are_rejected() {
        let req = PathRequest {
            width: 2,
            height: 2,
            start: Vec2::new(0.5, 0.5),
            goal: Vec2::new(1.5, 1.5),
            walls: vec![Cell::new(5, 5)],
            clearance: 0.0,
            max_expansions: 64,
        };
        assert!(plan(&req).is_err());
    }

    #[test]
    fn oversized_grids_are_rejected() {
        let req = PathRequest {
            width: 50_000,
            height: 50_000,
            start: Vec2::new(0.5, 0.5),
            goal: Vec2::new(1.5, 1.5),
            walls: Vec::new(),
            clearance: 0.0,
            max_expansions: 64,
        };
        let err = plan(&req).unwrap_err();
        assert!(err.to_string().contains("cells per side"));
    }
}
