//! Combat resolver boundary. The control core only requests effects; damage and healing rules
//! belong to the resolver, and their results show up through perception on the next tick.

use crate::{AgentHandle, EntityHandle, Vec2, WorldMut};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EffectKind {
    /// Basic attack against `target`.
    Attack,
    /// Cast the ability in `slot`.
    Ability { slot: usize },
    /// Heal `target` using the ability in `slot`.
    Heal { slot: usize },
    /// Debuff `target` using the ability in `slot`.
    Debuff { slot: usize },
    /// Self-destruct dealing area damage.
    Explode { radius: f32, damage: f32 },
    /// Pick up the resource `target`.
    Collect,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EffectRequest {
    pub kind: EffectKind,
    pub target: Option<EntityHandle>,
    pub position: Option<Vec2>,
}

impl EffectRequest {
    pub fn on(kind: EffectKind, target: EntityHandle) -> Self {
        Self {
            kind,
            target: Some(target),
            position: None,
        }
    }

    pub fn at(kind: EffectKind, position: Vec2) -> Self {
        Self {
            kind,
            target: None,
            position: Some(position),
        }
    }

    pub fn untargeted(kind: EffectKind) -> Self {
        Self {
            kind,
            target: None,
            position: None,
        }
    }
}

/// What happened when a request was resolved; feeds the reward shaper.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EffectReport {
    pub applied: bool,
    pub damage_dealt: f32,
    pub healing_done: f32,
    pub kills: u32,
    pub ability_used: bool,
    pub resources_collected: u32,
    pub self_destroyed: bool,
}

impl EffectReport {
    pub fn merge(&mut self, other: &EffectReport) {
        self.applied |= other.applied;
        self.damage_dealt += other.damage_dealt;
        self.healing_done += other.healing_done;
        self.kills = self.kills.saturating_add(other.kills);
        self.ability_used |= other.ability_used;
        self.resources_collected = self
            .resources_collected
            .saturating_add(other.resources_collected);
        self.self_destroyed |= other.self_destroyed;
    }
}

pub trait CombatResolver<W>
where
    W: WorldMut,
{
    fn resolve(&mut self, world: &mut W, source: AgentHandle, request: &EffectRequest)
        -> EffectReport;
}
