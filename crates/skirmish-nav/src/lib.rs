//! Navigation primitives: an obstacle-inflated occupancy grid built from the world's tile map,
//! bounded 8-connected A* with string-pull smoothing, and per-agent path tracking.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

pub mod cache;
pub mod grid;
pub mod navigator;
pub mod path;
pub mod search;

pub use cache::NavGridCache;
pub use grid::{Cell, NavGrid, MAX_DIMENSION};
pub use navigator::Navigator;
pub use path::{Path, RecomputePolicy, RecomputeReason};
pub use search::{find_cell_path, find_path, smooth_cells, CellPath, PathResult, SearchLimits, SearchOutcome};
