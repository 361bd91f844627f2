use skirmish_core::{EntityHandle, Vec2};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ArenaError {
    #[error("invalid map: {0}")]
    InvalidMap(String),

    #[error("cannot place entity at ({}, {}): {reason}", .position.x, .position.y)]
    Placement { position: Vec2, reason: &'static str },

    #[error("entity {0} no longer exists")]
    Stale(EntityHandle),
}

pub type Result<T> = std::result::Result<T, ArenaError>;
