//! Reference combat rules for [`Arena`].

use serde::{Deserialize, Serialize};
use skirmish_core::{
    AgentHandle, CombatResolver, EffectKind, EffectReport, EffectRequest, EntityHandle,
    EntityKind, Faction, Vec2, WorldQuery,
};

use crate::Arena;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatConfig {
    pub attack_damage: f32,
    /// Surface-to-surface reach of a basic attack.
    pub attack_range: f32,
    pub ability_damage: f32,
    pub ability_range: f32,
    pub heal_amount: f32,
    pub heal_range: f32,
    pub debuff_duration: f32,
    pub debuff_range: f32,
    /// Damage multiplier against debuffed targets.
    pub debuff_vulnerability: f32,
    pub collect_range: f32,
    /// Explosions also hit units of the exploder's own faction.
    pub friendly_fire: bool,
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            attack_damage: 10.0,
            attack_range: 2.5,
            ability_damage: 25.0,
            ability_range: 6.0,
            heal_amount: 25.0,
            heal_range: 5.0,
            debuff_duration: 3.0,
            debuff_range: 6.0,
            debuff_vulnerability: 1.25,
            collect_range: 2.5,
            friendly_fire: false,
        }
    }
}

/// Resolves effect requests against an [`Arena`]. Requests that fail a range, cooldown or
/// targeting check come back as an unapplied report; nothing here panics on stale handles.
#[derive(Debug, Clone, Default)]
pub struct ArenaCombat {
    config: CombatConfig,
    resolved: u64,
    rejected: u64,
}

impl ArenaCombat {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: CombatConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &CombatConfig {
        &self.config
    }

    /// Requests that changed the world.
    pub fn resolved(&self) -> u64 {
        self.resolved
    }

    pub fn rejected(&self) -> u64 {
        self.rejected
    }

    fn strike(&self, arena: &mut Arena, target: EntityHandle, base: f32) -> EffectReport {
        let amount = match arena.body(target) {
            Some(b) if b.is_debuffed() => base * self.config.debuff_vulnerability,
            Some(_) => base,
            None => return EffectReport::default(),
        };
        match arena.damage(target, amount) {
            Ok(outcome) => EffectReport {
                applied: outcome.dealt > 0.0,
                damage_dealt: outcome.dealt,
                kills: u32::from(outcome.killed),
                ..EffectReport::default()
            },
            Err(_) => EffectReport::default(),
        }
    }

    fn attack(&self, arena: &mut Arena, source: &Source, target: EntityHandle) -> EffectReport {
        match source.target_unit(arena, target) {
            Some((faction, gap))
                if faction != source.faction && gap <= self.config.attack_range =>
            {
                self.strike(arena, target, self.config.attack_damage)
            }
            _ => EffectReport::default(),
        }
    }

    fn ability(
        &self,
        arena: &mut Arena,
        source: &Source,
        slot: usize,
        request: &EffectRequest,
    ) -> EffectReport {
        if !source.ready(slot) {
            return EffectReport::default();
        }
        let mut report = match request.target {
            Some(target) => match source.target_unit(arena, target) {
                Some((faction, gap))
                    if faction != source.faction && gap <= self.config.ability_range =>
                {
                    self.strike(arena, target, self.config.ability_damage)
                }
                _ => return EffectReport::default(),
            },
            // Ground-targeted casts still spend the cooldown.
            None => EffectReport {
                applied: true,
                ..EffectReport::default()
            },
        };
        start_cooldown(arena, source.handle, slot);
        report.ability_used = true;
        report.applied = true;
        report
    }

    fn heal(
        &self,
        arena: &mut Arena,
        source: &Source,
        slot: usize,
        target: EntityHandle,
    ) -> EffectReport {
        if !source.ready(slot) {
            return EffectReport::default();
        }
        match source.target_unit(arena, target) {
            Some((faction, gap))
                if faction == source.faction && gap <= self.config.heal_range => {}
            _ => return EffectReport::default(),
        }
        let restored = arena.heal(target, self.config.heal_amount).unwrap_or(0.0);
        start_cooldown(arena, source.handle, slot);
        EffectReport {
            applied: true,
            healing_done: restored,
            ability_used: true,
            ..EffectReport::default()
        }
    }

    fn debuff(
        &self,
        arena: &mut Arena,
        source: &Source,
        slot: usize,
        target: EntityHandle,
    ) -> EffectReport {
        if !source.ready(slot) {
            return EffectReport::default();
        }
        match source.target_unit(arena, target) {
            Some((faction, gap))
                if faction != source.faction && gap <= self.config.debuff_range => {}
            _ => return EffectReport::default(),
        }
        if let Some(body) = arena.body_mut(target) {
            body.debuff_remaining = body.debuff_remaining.max(self.config.debuff_duration);
        }
        start_cooldown(arena, source.handle, slot);
        EffectReport {
            applied: true,
            ability_used: true,
            ..EffectReport::default()
        }
    }

    fn explode(
        &self,
        arena: &mut Arena,
        source: &Source,
        center: Vec2,
        radius: f32,
        damage: f32,
    ) -> EffectReport {
        let victims: Vec<EntityHandle> = arena
            .bodies()
            .filter(|(handle, b)| {
                *handle != source.handle
                    && b.is_unit()
                    && (self.config.friendly_fire || b.faction != Some(source.faction))
                    && b.position.distance(center) <= radius + b.radius
            })
            .map(|(handle, _)| handle)
            .collect();

        let mut report = EffectReport {
            applied: true,
            self_destroyed: true,
            ..EffectReport::default()
        };
        for victim in victims {
            report.merge(&self.strike(arena, victim, damage));
        }
        arena.despawn(source.handle);
        tracing::debug!(
            unit = %source.handle,
            damage = report.damage_dealt,
            kills = report.kills,
            "detonated"
        );
        report
    }

    fn collect(
        &self,
        arena: &mut Arena,
        source: &Source,
        target: Option<EntityHandle>,
    ) -> EffectReport {
        let reach = self.config.collect_range;
        let target = target.or_else(|| {
            arena
                .bodies()
                .filter(|(_, b)| b.kind == EntityKind::Resource)
                .filter(|(_, b)| b.position.distance(source.position) <= reach + b.radius)
                .min_by(|(ha, a), (hb, b)| {
                    a.position
                        .distance_squared(source.position)
                        .total_cmp(&b.position.distance_squared(source.position))
                        .then_with(|| ha.stable_id().cmp(&hb.stable_id()))
                })
                .map(|(h, _)| h)
        });
        let Some(target) = target else {
            return EffectReport::default();
        };
        let in_reach = arena.body(target).is_some_and(|b| {
            b.kind == EntityKind::Resource
                && b.position.distance(source.position) <= reach + b.radius + source.radius
        });
        if !in_reach {
            return EffectReport::default();
        }
        arena.despawn(target);
        EffectReport {
            applied: true,
            resources_collected: 1,
            ..EffectReport::default()
        }
    }
}

/// The requesting unit, read once before the request mutates anything.
struct Source {
    handle: AgentHandle,
    faction: Faction,
    position: Vec2,
    radius: f32,
    cooldowns: Vec<f32>,
}

impl Source {
    fn ready(&self, slot: usize) -> bool {
        self.cooldowns.get(slot).is_some_and(|c| *c <= 0.0)
    }

    /// Faction and surface gap of a live target unit.
    fn target_unit(&self, arena: &Arena, target: EntityHandle) -> Option<(Faction, f32)> {
        let body = arena.body(target)?;
        if !body.is_unit() || target == self.handle {
            return None;
        }
        let gap = (body.position.distance(self.position) - body.radius - self.radius).max(0.0);
        Some((body.faction?, gap))
    }
}

fn start_cooldown(arena: &mut Arena, handle: AgentHandle, slot: usize) {
    if let Some(body) = arena.body_mut(handle) {
        let full = body.cooldown_durations.get(slot).copied().unwrap_or(0.0);
        if let Some(remaining) = body.cooldowns.get_mut(slot) {
            *remaining = full;
        }
    }
}

impl CombatResolver<Arena> for ArenaCombat {
    fn resolve(
        &mut self,
        world: &mut Arena,
        source: AgentHandle,
        request: &EffectRequest,
    ) -> EffectReport {
        let Some(status) = world.agent(source) else {
            self.rejected += 1;
            return EffectReport::default();
        };
        let src = Source {
            handle: source,
            faction: status.faction,
            position: status.position,
            radius: status.radius,
            cooldowns: status.cooldowns,
        };

        let report = match (request.kind, request.target) {
            (EffectKind::Attack, Some(target)) => self.attack(world, &src, target),
            (EffectKind::Ability { slot }, _) => self.ability(world, &src, slot, request),
            (EffectKind::Heal { slot }, Some(target)) => self.heal(world, &src, slot, target),
            (EffectKind::Debuff { slot }, Some(target)) => self.debuff(world, &src, slot, target),
            (EffectKind::Explode { radius, damage }, _) => {
                let center = request.position.unwrap_or(src.position);
                self.explode(world, &src, center, radius, damage)
            }
            (EffectKind::Collect, target) => self.collect(world, &src, target),
            _ => EffectReport::default(),
        };

        if report.applied {
            self.resolved += 1;
        } else {
            self.rejected += 1;
            tracing::trace!(unit = %source, kind = ?request.kind, "effect rejected");
        }
        report
    }
}
