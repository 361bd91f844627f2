use std::collections::BTreeMap;

use skirmish_core::WorldQuery;

use crate::NavGrid;

/// Lazily built navigation grids, one per clearance radius.
///
/// The base grid is sampled from the tile map on first use and rebuilt (together with every
/// inflated variant) when the world reports a new map revision. Between rebuilds the grids are
/// read-only and shared by every agent with the same clearance.
#[derive(Debug, Clone)]
pub struct NavGridCache {
    cell_size: f32,
    revision: Option<u64>,
    base: Option<NavGrid>,
    inflated: BTreeMap<u32, NavGrid>,
    builds: u64,
}

impl NavGridCache {
    pub fn new(cell_size: f32) -> Self {
        Self {
            cell_size,
            revision: None,
            base: None,
            inflated: BTreeMap::new(),
            builds: 0,
        }
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Number of grids derived so far (base + inflated). Useful for asserting laziness.
    pub fn builds(&self) -> u64 {
        self.builds
    }

    pub fn invalidate(&mut self) {
        self.revision = None;
        self.base = None;
        self.inflated.clear();
    }

    /// Inflated grid for `clearance`, building it if needed.
    pub fn grid_for<W: WorldQuery + ?Sized>(&mut self, world: &W, clearance: f32) -> &NavGrid {
        let revision = world.map_revision();
        if self.revision != Some(revision) {
            if self.revision.is_some() {
                tracing::debug!(revision, "map changed; dropping cached navigation grids");
            }
            self.base = None;
            self.inflated.clear();
            self.revision = Some(revision);
        }

        let key = clearance_key(clearance);
        if !self.inflated.contains_key(&key) {
            let base = match self.base.take() {
                Some(base) => base,
                None => {
                    self.builds += 1;
                    NavGrid::from_world(world, self.cell_size)
                }
            };
            let grid = base.inflate(key as f32 / 1000.0);
            self.builds += 1;
            self.base = Some(base);
            self.inflated.insert(key, grid);
        }

        &self.inflated[&key]
    }
}

/// Clearances are bucketed to the millimetre so float noise does not create duplicate grids.
fn clearance_key(clearance: f32) -> u32 {
    if clearance.is_finite() && clearance > 0.0 {
        (clearance * 1000.0).round() as u32
    } else {
        0
    }
}
