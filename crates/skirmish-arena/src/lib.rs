//! Reference world for the skirmish control core.
//!
//! [`Arena`] is a plain in-memory implementation of the world collaborators: a tile map, a
//! generation-checked entity store and line of sight. [`ArenaCombat`] resolves effect requests
//! against it, [`JsonModelStore`] persists learned models to disk, and [`SkirmishConfig`] turns a
//! YAML scenario into a runnable [`Simulation`].

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

pub mod arena;
pub mod combat;
pub mod error;
pub mod map;
pub mod scenario;
pub mod simulation;
pub mod slab;
pub mod store;

pub use arena::{Arena, Body, DamageOutcome, UnitSpec};
pub use combat::{ArenaCombat, CombatConfig};
pub use error::{ArenaError, Result};
pub use map::TileMap;
pub use scenario::{
    MapConfig, PropSpawn, RectConfig, RespawnConfig, SkirmishConfig, UnitSpawn, PROJECT_SCENARIO,
};
pub use simulation::{RunSummary, Simulation};
pub use slab::EntitySlab;
pub use store::JsonModelStore;
