#![allow(dead_code)]

use skirmish_core::{
    AgentHandle, AgentStatus, Bounds, CombatResolver, EffectKind, EffectReport, EffectRequest,
    EntityFilter, EntityHandle, EntityKind, EntityRef, Faction, MotionCommand, TileKind, Vec2,
    WorldMut, WorldQuery,
};

#[derive(Debug, Clone)]
pub struct Unit {
    pub handle: EntityHandle,
    pub faction: u8,
    pub position: Vec2,
    pub heading: f32,
    pub health: f32,
    pub max_health: f32,
    pub cooldowns: Vec<f32>,
    pub debuffed: bool,
}

/// Open 20x20 field with optional wall rectangles.
#[derive(Debug, Clone, Default)]
pub struct StubWorld {
    pub units: Vec<Unit>,
    pub walls: Vec<(Vec2, Vec2)>,
}

pub fn h(i: u32) -> EntityHandle {
    EntityHandle::new(i, 0)
}

impl StubWorld {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn unit(mut self, index: u32, faction: u8, position: Vec2, health: f32) -> Self {
        self.units.push(Unit {
            handle: h(index),
            faction,
            position,
            heading: 0.0,
            health,
            max_health: 100.0,
            cooldowns: vec![0.0, 0.0],
            debuffed: false,
        });
        self
    }

    pub fn wall(mut self, min: Vec2, max: Vec2) -> Self {
        self.walls.push((min, max));
        self
    }

    pub fn get(&self, handle: EntityHandle) -> Option<&Unit> {
        self.units.iter().find(|u| u.handle == handle)
    }

    pub fn get_mut(&mut self, handle: EntityHandle) -> Option<&mut Unit> {
        self.units.iter_mut().find(|u| u.handle == handle)
    }

    pub fn remove(&mut self, handle: EntityHandle) {
        self.units.retain(|u| u.handle != handle);
    }
}

impl WorldQuery for StubWorld {
    fn agent(&self, handle: AgentHandle) -> Option<AgentStatus> {
        let u = self.get(handle)?;
        Some(AgentStatus {
            handle,
            position: u.position,
            heading: u.heading,
            health: u.health,
            max_health: u.max_health,
            faction: Faction(u.faction),
            radius: 0.4,
            cooldowns: u.cooldowns.clone(),
            cooldown_durations: vec![4.0, 5.0],
        })
    }

    fn entities_in_radius(&self, pos: Vec2, radius: f32, filter: &EntityFilter) -> Vec<EntityRef> {
        self.units
            .iter()
            .filter(|u| u.health > 0.0)
            .map(|u| EntityRef {
                handle: u.handle,
                kind: EntityKind::Unit,
                faction: Some(Faction(u.faction)),
                position: u.position,
                radius: 0.4,
                health_ratio: u.health / u.max_health,
                blocks_movement: true,
                high_value: false,
                debuffed: u.debuffed,
            })
            .filter(|e| filter.matches(e) && e.position.distance(pos) <= radius)
            .collect()
    }

    fn tile_at(&self, pos: Vec2) -> TileKind {
        if !self.bounds().contains(pos) {
            return TileKind::Void;
        }
        let in_wall = self.walls.iter().any(|(min, max)| {
            pos.x >= min.x && pos.x < max.x && pos.y >= min.y && pos.y < max.y
        });
        if in_wall {
            TileKind::Wall
        } else {
            TileKind::Floor
        }
    }

    fn line_of_sight_clear(&self, _a: Vec2, _b: Vec2) -> bool {
        true
    }

    fn bounds(&self) -> Bounds {
        Bounds::from_size(20.0, 20.0)
    }
}

impl WorldMut for StubWorld {
    fn apply_motion(&mut self, handle: AgentHandle, motion: &MotionCommand, dt: f32) -> bool {
        let Some(u) = self.get_mut(handle) else {
            return false;
        };
        u.heading = motion.heading;
        u.position = u.position + motion.velocity() * dt;
        true
    }
}

/// Attacks deal 10 damage, heals restore 25, explosions hit everything in range.
#[derive(Debug, Default)]
pub struct StubCombat {
    pub resolved: Vec<(AgentHandle, EffectRequest)>,
}

impl CombatResolver<StubWorld> for StubCombat {
    fn resolve(
        &mut self,
        world: &mut StubWorld,
        source: AgentHandle,
        request: &EffectRequest,
    ) -> EffectReport {
        self.resolved.push((source, *request));
        let mut report = EffectReport::default();
        match request.kind {
            EffectKind::Attack => {
                if let Some(target) = request.target.and_then(|t| world.get_mut(t)) {
                    target.health = (target.health - 10.0).max(0.0);
                    report.applied = true;
                    report.damage_dealt = 10.0;
                    if target.health <= 0.0 {
                        report.kills = 1;
                    }
                }
            }
            EffectKind::Heal { .. } => {
                if let Some(target) = request.target.and_then(|t| world.get_mut(t)) {
                    target.health = (target.health + 25.0).min(target.max_health);
                    report.applied = true;
                    report.healing_done = 25.0;
                    report.ability_used = true;
                }
            }
            EffectKind::Explode { radius, damage } => {
                let center = request.position.unwrap_or(Vec2::ZERO);
                for u in world.units.iter_mut().filter(|u| u.handle != source) {
                    if u.position.distance(center) <= radius {
                        u.health = (u.health - damage).max(0.0);
                        report.damage_dealt += damage;
                        if u.health <= 0.0 {
                            report.kills += 1;
                        }
                    }
                }
                world.remove(source);
                report.applied = true;
                report.self_destroyed = true;
            }
            _ => {}
        }
        report
    }
}
