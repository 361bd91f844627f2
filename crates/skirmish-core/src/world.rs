//! World query service: the read-only view the control loop is given every frame.
//!
//! The entity store itself lives outside this crate. Implementations must treat stale handles as
//! absent ([`WorldQuery::agent`] returns `None`) rather than panicking.

use crate::{AgentHandle, EntityHandle, Vec2};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Coarse map tile classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum TileKind {
    #[default]
    Floor,
    Wall,
    Water,
    /// Walkable but damaging terrain.
    Hazard,
    /// Outside the map.
    Void,
}

impl TileKind {
    pub fn is_walkable(self) -> bool {
        matches!(self, TileKind::Floor | TileKind::Hazard)
    }
}

/// Team identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Faction(pub u8);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum EntityKind {
    Unit,
    Obstacle,
    Hazard,
    Resource,
    Objective,
    /// Transient world event (explosion zone, reinforcement drop, ...).
    Event,
}

impl EntityKind {
    const fn bit(self) -> u16 {
        1 << (self as u16)
    }
}

/// Axis-aligned world extents.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Bounds {
    pub min: Vec2,
    pub max: Vec2,
}

impl Bounds {
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    pub fn from_size(width: f32, height: f32) -> Self {
        Self::new(Vec2::ZERO, Vec2::new(width, height))
    }

    pub fn width(&self) -> f32 {
        (self.max.x - self.min.x).max(0.0)
    }

    pub fn height(&self) -> f32 {
        (self.max.y - self.min.y).max(0.0)
    }

    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.min.x && p.y >= self.min.y && p.x < self.max.x && p.y < self.max.y
    }

    pub fn clamp(&self, p: Vec2) -> Vec2 {
        Vec2::new(
            p.x.clamp(self.min.x, self.max.x),
            p.y.clamp(self.min.y, self.max.y),
        )
    }

    /// Position mapped into `[0, 1]` per axis.
    pub fn normalize(&self, p: Vec2) -> Vec2 {
        let w = self.width().max(f32::EPSILON);
        let h = self.height().max(f32::EPSILON);
        Vec2::new(
            ((p.x - self.min.x) / w).clamp(0.0, 1.0),
            ((p.y - self.min.y) / h).clamp(0.0, 1.0),
        )
    }

    /// Distance from `p` to the closest edge; zero outside.
    pub fn distance_to_edge(&self, p: Vec2) -> f32 {
        if !self.contains(p) {
            return 0.0;
        }
        let dx = (p.x - self.min.x).min(self.max.x - p.x);
        let dy = (p.y - self.min.y).min(self.max.y - p.y);
        dx.min(dy).max(0.0)
    }

    pub fn center(&self) -> Vec2 {
        self.min.lerp(self.max, 0.5)
    }
}

/// Lightweight entity record returned by spatial queries.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EntityRef {
    pub handle: EntityHandle,
    pub kind: EntityKind,
    pub faction: Option<Faction>,
    pub position: Vec2,
    pub radius: f32,
    /// Current health over maximum health; `1.0` for entities without health.
    pub health_ratio: f32,
    pub blocks_movement: bool,
    /// Defended high-value target (stand-off rule applies).
    pub high_value: bool,
    /// Under a debuff effect.
    pub debuffed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FactionFilter {
    Any,
    Same(Faction),
    Other(Faction),
}

/// Predicate for [`WorldQuery::entities_in_radius`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntityFilter {
    kinds: u16,
    faction: FactionFilter,
    exclude: Option<EntityHandle>,
}

impl Default for EntityFilter {
    fn default() -> Self {
        Self::any()
    }
}

impl EntityFilter {
    pub const fn any() -> Self {
        Self {
            kinds: u16::MAX,
            faction: FactionFilter::Any,
            exclude: None,
        }
    }

    pub const fn kind(kind: EntityKind) -> Self {
        Self {
            kinds: kind.bit(),
            faction: FactionFilter::Any,
            exclude: None,
        }
    }

    pub const fn with_kind(mut self, kind: EntityKind) -> Self {
        self.kinds |= kind.bit();
        self
    }

    pub const fn excluding(mut self, handle: EntityHandle) -> Self {
        self.exclude = Some(handle);
        self
    }

    /// Units of `faction`.
    pub const fn allies_of(faction: Faction) -> Self {
        Self {
            kinds: EntityKind::Unit.bit(),
            faction: FactionFilter::Same(faction),
            exclude: None,
        }
    }

    /// Units of any faction other than `faction`.
    pub const fn enemies_of(faction: Faction) -> Self {
        Self {
            kinds: EntityKind::Unit.bit(),
            faction: FactionFilter::Other(faction),
            exclude: None,
        }
    }

    pub fn matches(&self, entity: &EntityRef) -> bool {
        if self.kinds & entity.kind.bit() == 0 {
            return false;
        }
        if self.exclude == Some(entity.handle) {
            return false;
        }
        match self.faction {
            FactionFilter::Any => true,
            FactionFilter::Same(f) => entity.faction == Some(f),
            FactionFilter::Other(f) => entity.faction.is_some_and(|e| e != f),
        }
    }
}

/// Live state of one controllable unit.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentStatus {
    pub handle: AgentHandle,
    pub position: Vec2,
    /// Radians, counter-clockwise from +x.
    pub heading: f32,
    pub health: f32,
    pub max_health: f32,
    pub faction: Faction,
    /// Body radius; the navigation grid is inflated by this clearance.
    pub radius: f32,
    /// Remaining cooldown per ability slot, seconds.
    pub cooldowns: Vec<f32>,
    /// Full cooldown per ability slot, seconds.
    pub cooldown_durations: Vec<f32>,
}

impl AgentStatus {
    pub fn health_ratio(&self) -> f32 {
        if self.max_health <= 0.0 {
            return 0.0;
        }
        (self.health / self.max_health).clamp(0.0, 1.0)
    }

    pub fn is_alive(&self) -> bool {
        self.health > 0.0
    }

    /// Remaining cooldown over full cooldown for `slot`, in `[0, 1]`. Missing slots read as ready.
    pub fn cooldown_ratio(&self, slot: usize) -> f32 {
        let remaining = self.cooldowns.get(slot).copied().unwrap_or(0.0);
        let full = self.cooldown_durations.get(slot).copied().unwrap_or(0.0);
        if full <= 0.0 {
            return 0.0;
        }
        (remaining / full).clamp(0.0, 1.0)
    }

    pub fn ability_ready(&self, slot: usize) -> bool {
        self.cooldowns.get(slot).is_some_and(|c| *c <= 0.0)
    }
}

/// Steering output handed to the world for integration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionCommand {
    pub heading: f32,
    /// Signed: negative speeds reverse along the heading.
    pub speed: f32,
}

impl MotionCommand {
    pub fn new(heading: f32, speed: f32) -> Self {
        Self { heading, speed }
    }

    pub fn stop(heading: f32) -> Self {
        Self {
            heading,
            speed: 0.0,
        }
    }

    pub fn velocity(&self) -> Vec2 {
        Vec2::from_angle(self.heading) * self.speed
    }
}

pub trait WorldQuery {
    /// Live state of `handle`, or `None` if the entity is gone, stale or not a unit.
    fn agent(&self, handle: AgentHandle) -> Option<AgentStatus>;

    fn entities_in_radius(&self, pos: Vec2, radius: f32, filter: &EntityFilter) -> Vec<EntityRef>;

    fn tile_at(&self, pos: Vec2) -> TileKind;

    fn line_of_sight_clear(&self, a: Vec2, b: Vec2) -> bool;

    fn bounds(&self) -> Bounds;

    /// Bumped whenever the tile map changes. Consumers cache derived grids against it.
    fn map_revision(&self) -> u64 {
        0
    }
}

/// The single mutation the control loop requests from the world.
pub trait WorldMut: WorldQuery {
    /// Integrate one step of motion for `handle`. Returns `false` if the unit no longer exists.
    fn apply_motion(&mut self, handle: AgentHandle, motion: &MotionCommand, dt: f32) -> bool;
}
