//! Square-tile terrain.

use skirmish_core::{Bounds, TileKind, Vec2};

use crate::{ArenaError, Result};

/// Row-major tile grid anchored at the world origin.
#[derive(Debug, Clone, PartialEq)]
pub struct TileMap {
    width: u32,
    height: u32,
    tile_size: f32,
    tiles: Vec<TileKind>,
}

impl TileMap {
    /// Open floor of `width` x `height` tiles.
    pub fn open(width: u32, height: u32, tile_size: f32) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(ArenaError::InvalidMap(format!(
                "map must be non-empty, got {width}x{height}"
            )));
        }
        if !(tile_size > 0.0) {
            return Err(ArenaError::InvalidMap(format!(
                "tile size must be > 0, got {tile_size}"
            )));
        }
        Ok(Self {
            width,
            height,
            tile_size,
            tiles: vec![TileKind::Floor; (width * height) as usize],
        })
    }

    /// Parse an ASCII layout: `.` floor, `#` wall, `~` water, `^` hazard. The first row is `y = 0`.
    pub fn from_rows<S: AsRef<str>>(rows: &[S], tile_size: f32) -> Result<Self> {
        let height = rows.len() as u32;
        let width = rows
            .first()
            .map(|r| r.as_ref().chars().count() as u32)
            .unwrap_or(0);
        let mut map = Self::open(width, height, tile_size)?;
        for (y, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            if row.chars().count() as u32 != width {
                return Err(ArenaError::InvalidMap(format!(
                    "row {y} has {} tiles, expected {width}",
                    row.chars().count()
                )));
            }
            for (x, ch) in row.chars().enumerate() {
                let tile = match ch {
                    '.' | ' ' => TileKind::Floor,
                    '#' => TileKind::Wall,
                    '~' => TileKind::Water,
                    '^' => TileKind::Hazard,
                    other => {
                        return Err(ArenaError::InvalidMap(format!(
                            "unknown tile '{other}' at ({x}, {y})"
                        )))
                    }
                };
                map.set(x as u32, y as u32, tile);
            }
        }
        Ok(map)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn tile_size(&self) -> f32 {
        self.tile_size
    }

    pub fn bounds(&self) -> Bounds {
        Bounds::from_size(
            self.width as f32 * self.tile_size,
            self.height as f32 * self.tile_size,
        )
    }

    pub fn get(&self, x: u32, y: u32) -> TileKind {
        if x >= self.width || y >= self.height {
            return TileKind::Void;
        }
        self.tiles[(y * self.width + x) as usize]
    }

    /// Returns `true` if the tile changed.
    pub fn set(&mut self, x: u32, y: u32, tile: TileKind) -> bool {
        if x >= self.width || y >= self.height {
            return false;
        }
        let idx = (y * self.width + x) as usize;
        let changed = self.tiles[idx] != tile;
        self.tiles[idx] = tile;
        changed
    }

    /// Fill the tiles covering `[min, max)` in world units. Returns the number of changed tiles.
    pub fn fill_rect(&mut self, min: Vec2, max: Vec2, tile: TileKind) -> usize {
        let to_tile = |v: f32| (v / self.tile_size).floor().max(0.0) as u32;
        let (x0, y0) = (to_tile(min.x), to_tile(min.y));
        let x1 = ((max.x / self.tile_size).ceil().max(0.0) as u32).min(self.width);
        let y1 = ((max.y / self.tile_size).ceil().max(0.0) as u32).min(self.height);
        let mut changed = 0;
        for y in y0..y1 {
            for x in x0..x1 {
                if self.set(x, y, tile) {
                    changed += 1;
                }
            }
        }
        changed
    }

    pub fn tile_at(&self, pos: Vec2) -> TileKind {
        if !pos.is_finite() || !self.bounds().contains(pos) {
            return TileKind::Void;
        }
        let x = (pos.x / self.tile_size).floor() as u32;
        let y = (pos.y / self.tile_size).floor() as u32;
        self.get(x, y)
    }

    /// Walls and the outside block sight; water and hazards do not.
    pub fn line_of_sight(&self, a: Vec2, b: Vec2) -> bool {
        let blocks = |p: Vec2| matches!(self.tile_at(p), TileKind::Wall | TileKind::Void);
        if blocks(a) || blocks(b) {
            return false;
        }
        let length = a.distance(b);
        let step = self.tile_size * 0.25;
        let samples = (length / step).ceil() as usize;
        (1..samples).all(|i| !blocks(a.lerp(b, i as f32 / samples as f32)))
    }

    pub fn count(&self, tile: TileKind) -> usize {
        self.tiles.iter().filter(|t| **t == tile).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_parse_into_tiles() {
        let map = TileMap::from_rows(&["..#", "~^."], 1.0).unwrap();
        assert_eq!(map.width(), 3);
        assert_eq!(map.height(), 2);
        assert_eq!(map.get(2, 0), TileKind::Wall);
        assert_eq!(map.get(0, 1), TileKind::Water);
        assert_eq!(map.tile_at(Vec2::new(1.5, 1.5)), TileKind::Hazard);
        assert_eq!(map.tile_at(Vec2::new(3.5, 0.5)), TileKind::Void);
    }

    #[test]
    fn ragged_rows_are_rejected() {
        assert!(TileMap::from_rows(&["...", ".."], 1.0).is_err());
        assert!(TileMap::from_rows(&["..x"], 1.0).is_err());
        assert!(TileMap::from_rows::<&str>(&[], 1.0).is_err());
    }

    #[test]
    fn walls_block_sight_but_water_does_not() {
        let map = TileMap::from_rows(&[".....", "..#..", ".~~~."], 1.0).unwrap();
        assert!(!map.line_of_sight(Vec2::new(0.5, 1.5), Vec2::new(4.5, 1.5)));
        assert!(map.line_of_sight(Vec2::new(0.5, 2.5), Vec2::new(4.5, 2.5)));
        assert!(map.line_of_sight(Vec2::new(0.5, 0.5), Vec2::new(4.5, 0.5)));
    }

    #[test]
    fn fill_rect_counts_changes() {
        let mut map = TileMap::open(4, 4, 1.0).unwrap();
        assert_eq!(map.fill_rect(Vec2::new(1.0, 1.0), Vec2::new(3.0, 2.0), TileKind::Wall), 2);
        assert_eq!(map.fill_rect(Vec2::new(1.0, 1.0), Vec2::new(3.0, 2.0), TileKind::Wall), 0);
        assert_eq!(map.count(TileKind::Wall), 2);
    }
}
