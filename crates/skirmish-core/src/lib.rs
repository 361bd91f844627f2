//! Deterministic, engine-agnostic primitives shared by every part of the unit control core.
//!
//! The world itself is an external collaborator: this crate only describes the queries the
//! control loop needs ([`WorldQuery`]), the single mutation it requests ([`WorldMut`]) and the
//! effect requests it hands to a [`CombatResolver`].

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

pub mod action;
pub mod combat;
pub mod error;
pub mod handle;
pub mod math;
pub mod rng;
pub mod schedule;
pub mod tick;
pub mod world;

pub use action::{ActionId, ActionSet};
pub use combat::{CombatResolver, EffectKind, EffectReport, EffectRequest};
pub use error::{ModelError, PersistenceError, SearchBound, Unavailable};
pub use handle::{AgentHandle, EntityHandle};
pub use math::{shortest_angle_delta, wrap_angle, Vec2};
pub use rng::{DeterministicRng, SplitMix64};
pub use schedule::ThinkSchedule;
pub use tick::TickContext;
pub use world::{
    AgentStatus, Bounds, EntityFilter, EntityKind, EntityRef, Faction, MotionCommand, TileKind,
    WorldMut, WorldQuery,
};
