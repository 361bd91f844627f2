use skirmish_core::Vec2;

use crate::{find_path, NavGrid, PathResult, SearchLimits};

/// Path-planning backend used by agents.
pub trait Navigator {
    fn plan(&self, start: Vec2, goal: Vec2, limits: SearchLimits) -> PathResult;

    /// Whether the straight segment `a -> b` stays in free space.
    fn segment_clear(&self, a: Vec2, b: Vec2) -> bool;

    fn is_walkable(&self, p: Vec2) -> bool;
}

impl Navigator for NavGrid {
    fn plan(&self, start: Vec2, goal: Vec2, limits: SearchLimits) -> PathResult {
        find_path(self, start, goal, limits)
    }

    fn segment_clear(&self, a: Vec2, b: Vec2) -> bool {
        NavGrid::segment_clear(self, a, b)
    }

    fn is_walkable(&self, p: Vec2) -> bool {
        self.world_to_cell(p)
            .is_some_and(|c| !self.is_cell_blocked(c))
    }
}
