//! The in-memory world: terrain plus every entity the control loop can see.

use skirmish_core::{
    AgentHandle, AgentStatus, Bounds, EntityFilter, EntityHandle, EntityKind, EntityRef, Faction,
    MotionCommand, TileKind, Vec2, WorldMut, WorldQuery,
};

use crate::{ArenaError, EntitySlab, Result, TileMap};

/// Damage per second dealt to units standing on hazard tiles.
pub const DEFAULT_HAZARD_TILE_DPS: f32 = 5.0;

/// One stored entity. Fields that do not apply to a kind keep their neutral values.
#[derive(Debug, Clone, PartialEq)]
pub struct Body {
    pub kind: EntityKind,
    pub faction: Option<Faction>,
    pub position: Vec2,
    pub heading: f32,
    pub radius: f32,
    pub health: f32,
    pub max_health: f32,
    pub cooldowns: Vec<f32>,
    pub cooldown_durations: Vec<f32>,
    /// Seconds of debuff left.
    pub debuff_remaining: f32,
    pub high_value: bool,
    pub blocks_movement: bool,
    /// Damage per second to overlapping units (hazards).
    pub damage_per_second: f32,
    /// Remaining lifetime; `None` lives until removed.
    pub ttl: Option<f32>,
}

impl Body {
    fn base(kind: EntityKind, position: Vec2, radius: f32) -> Self {
        Self {
            kind,
            faction: None,
            position,
            heading: 0.0,
            radius,
            health: 1.0,
            max_health: 1.0,
            cooldowns: Vec::new(),
            cooldown_durations: Vec::new(),
            debuff_remaining: 0.0,
            high_value: false,
            blocks_movement: false,
            damage_per_second: 0.0,
            ttl: None,
        }
    }

    pub fn unit(spec: &UnitSpec) -> Self {
        Self {
            faction: Some(spec.faction),
            heading: spec.heading,
            health: spec.max_health,
            max_health: spec.max_health,
            cooldowns: vec![0.0; spec.cooldown_durations.len()],
            cooldown_durations: spec.cooldown_durations.clone(),
            blocks_movement: true,
            ..Self::base(EntityKind::Unit, spec.position, spec.radius)
        }
    }

    pub fn obstacle(position: Vec2, radius: f32) -> Self {
        Self {
            blocks_movement: true,
            ..Self::base(EntityKind::Obstacle, position, radius)
        }
    }

    pub fn hazard(position: Vec2, radius: f32, damage_per_second: f32) -> Self {
        Self {
            damage_per_second,
            ..Self::base(EntityKind::Hazard, position, radius)
        }
    }

    pub fn resource(position: Vec2) -> Self {
        Self::base(EntityKind::Resource, position, 0.3)
    }

    /// A defended high-value target owned by `faction`.
    pub fn objective(position: Vec2, radius: f32, faction: Option<Faction>) -> Self {
        Self {
            faction,
            high_value: true,
            blocks_movement: true,
            ..Self::base(EntityKind::Objective, position, radius)
        }
    }

    pub fn event(position: Vec2, radius: f32, ttl: f32) -> Self {
        Self {
            ttl: Some(ttl),
            ..Self::base(EntityKind::Event, position, radius)
        }
    }

    pub fn is_unit(&self) -> bool {
        self.kind == EntityKind::Unit
    }

    pub fn is_debuffed(&self) -> bool {
        self.debuff_remaining > 0.0
    }

    pub fn health_ratio(&self) -> f32 {
        if self.max_health <= 0.0 {
            return 0.0;
        }
        (self.health / self.max_health).clamp(0.0, 1.0)
    }

    fn entity_ref(&self, handle: EntityHandle) -> EntityRef {
        EntityRef {
            handle,
            kind: self.kind,
            faction: self.faction,
            position: self.position,
            radius: self.radius,
            health_ratio: self.health_ratio(),
            blocks_movement: self.blocks_movement,
            high_value: self.high_value,
            debuffed: self.is_debuffed(),
        }
    }
}

/// Spawn parameters for a unit.
#[derive(Debug, Clone, PartialEq)]
pub struct UnitSpec {
    pub faction: Faction,
    pub position: Vec2,
    pub heading: f32,
    pub radius: f32,
    pub max_health: f32,
    /// Full cooldown per ability slot, seconds.
    pub cooldown_durations: Vec<f32>,
}

impl UnitSpec {
    pub fn new(faction: Faction, position: Vec2) -> Self {
        Self {
            faction,
            position,
            heading: 0.0,
            radius: 0.4,
            max_health: 100.0,
            cooldown_durations: vec![4.0, 5.0],
        }
    }

    pub fn with_health(mut self, max_health: f32) -> Self {
        self.max_health = max_health;
        self
    }

    pub fn with_radius(mut self, radius: f32) -> Self {
        self.radius = radius;
        self
    }

    pub fn with_heading(mut self, heading: f32) -> Self {
        self.heading = heading;
        self
    }

    pub fn with_cooldowns(mut self, durations: Vec<f32>) -> Self {
        self.cooldown_durations = durations;
        self
    }
}

/// Result of [`Arena::damage`].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DamageOutcome {
    pub dealt: f32,
    pub killed: bool,
}

#[derive(Debug, Clone)]
pub struct Arena {
    map: TileMap,
    entities: EntitySlab<Body>,
    revision: u64,
    hazard_tile_dps: f32,
    elapsed: f32,
}

impl Arena {
    pub fn new(map: TileMap) -> Self {
        Self {
            map,
            entities: EntitySlab::new(),
            revision: 0,
            hazard_tile_dps: DEFAULT_HAZARD_TILE_DPS,
            elapsed: 0.0,
        }
    }

    pub fn with_hazard_tile_dps(mut self, dps: f32) -> Self {
        self.hazard_tile_dps = dps.max(0.0);
        self
    }

    pub fn map(&self) -> &TileMap {
        &self.map
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn set_tile(&mut self, x: u32, y: u32, tile: TileKind) {
        if self.map.set(x, y, tile) {
            self.revision += 1;
        }
    }

    pub fn fill_rect(&mut self, min: Vec2, max: Vec2, tile: TileKind) {
        if self.map.fill_rect(min, max, tile) > 0 {
            self.revision += 1;
        }
    }

    /// Insert `body`. Units must stand on walkable ground inside the map.
    pub fn spawn(&mut self, body: Body) -> Result<EntityHandle> {
        let position = body.position;
        if !position.is_finite() || !self.map.bounds().contains(position) {
            return Err(ArenaError::Placement {
                position,
                reason: "outside the map",
            });
        }
        if body.is_unit() && !self.map.tile_at(position).is_walkable() {
            return Err(ArenaError::Placement {
                position,
                reason: "tile is not walkable",
            });
        }
        let kind = body.kind;
        let handle = self.entities.insert(body);
        tracing::trace!(entity = %handle, ?kind, "spawned");
        Ok(handle)
    }

    pub fn spawn_unit(&mut self, spec: &UnitSpec) -> Result<AgentHandle> {
        self.spawn(Body::unit(spec))
    }

    pub fn despawn(&mut self, handle: EntityHandle) -> Option<Body> {
        self.entities.remove(handle)
    }

    pub fn body(&self, handle: EntityHandle) -> Option<&Body> {
        self.entities.get(handle)
    }

    pub fn body_mut(&mut self, handle: EntityHandle) -> Option<&mut Body> {
        self.entities.get_mut(handle)
    }

    pub fn bodies(&self) -> impl Iterator<Item = (EntityHandle, &Body)> {
        self.entities.iter()
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Live units of `faction`.
    pub fn units_of(&self, faction: Faction) -> usize {
        self.entities
            .iter()
            .filter(|(_, b)| b.is_unit() && b.faction == Some(faction))
            .count()
    }

    /// Apply `amount` damage; a unit reduced to zero health is removed from the store.
    pub fn damage(&mut self, handle: EntityHandle, amount: f32) -> Result<DamageOutcome> {
        let body = self
            .entities
            .get_mut(handle)
            .ok_or(ArenaError::Stale(handle))?;
        if !body.is_unit() || !(amount > 0.0) {
            return Ok(DamageOutcome::default());
        }
        let dealt = amount.min(body.health);
        body.health -= dealt;
        let killed = body.health <= 0.0;
        if killed {
            self.entities.remove(handle);
            tracing::debug!(unit = %handle, "unit destroyed");
        }
        Ok(DamageOutcome { dealt, killed })
    }

    /// Restore up to `amount` health. Returns the amount actually restored.
    pub fn heal(&mut self, handle: EntityHandle, amount: f32) -> Result<f32> {
        let body = self
            .entities
            .get_mut(handle)
            .ok_or(ArenaError::Stale(handle))?;
        if !body.is_unit() || !(amount > 0.0) {
            return Ok(0.0);
        }
        let restored = amount.min(body.max_health - body.health).max(0.0);
        body.health += restored;
        Ok(restored)
    }

    /// Advance timers by `dt`: cooldowns, debuffs, event lifetimes and hazard damage.
    /// Returns the units destroyed by hazards.
    pub fn advance(&mut self, dt: f32) -> Vec<AgentHandle> {
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        self.elapsed += dt;

        let hazards: Vec<(Vec2, f32, f32)> = self
            .entities
            .iter()
            .filter(|(_, b)| b.kind == EntityKind::Hazard && b.damage_per_second > 0.0)
            .map(|(_, b)| (b.position, b.radius, b.damage_per_second))
            .collect();

        let mut expired = Vec::new();
        let mut burning = Vec::new();
        for (handle, body) in self.entities.iter_mut() {
            if let Some(ttl) = body.ttl.as_mut() {
                *ttl -= dt;
                if *ttl <= 0.0 {
                    expired.push(handle);
                    continue;
                }
            }
            if !body.is_unit() {
                continue;
            }
            for cooldown in &mut body.cooldowns {
                *cooldown = (*cooldown - dt).max(0.0);
            }
            body.debuff_remaining = (body.debuff_remaining - dt).max(0.0);

            let mut dps: f32 = hazards
                .iter()
                .filter(|(pos, radius, _)| pos.distance(body.position) <= radius + body.radius)
                .map(|(_, _, dps)| dps)
                .sum();
            if self.map.tile_at(body.position) == TileKind::Hazard {
                dps += self.hazard_tile_dps;
            }
            if dps > 0.0 {
                burning.push((handle, dps * dt));
            }
        }

        for handle in expired {
            self.entities.remove(handle);
        }
        let mut destroyed = Vec::new();
        for (handle, amount) in burning {
            if let Ok(outcome) = self.damage(handle, amount) {
                if outcome.killed {
                    destroyed.push(handle);
                }
            }
        }
        destroyed
    }

    fn position_free(&self, mover: EntityHandle, position: Vec2, radius: f32) -> bool {
        if !self.map.bounds().contains(position) || !self.map.tile_at(position).is_walkable() {
            return false;
        }
        !self.entities.iter().any(|(handle, b)| {
            handle != mover
                && b.kind == EntityKind::Obstacle
                && b.blocks_movement
                && b.position.distance(position) < b.radius + radius
        })
    }
}

impl WorldQuery for Arena {
    fn agent(&self, handle: AgentHandle) -> Option<AgentStatus> {
        let body = self.entities.get(handle)?;
        if !body.is_unit() {
            return None;
        }
        Some(AgentStatus {
            handle,
            position: body.position,
            heading: body.heading,
            health: body.health,
            max_health: body.max_health,
            faction: body.faction?,
            radius: body.radius,
            cooldowns: body.cooldowns.clone(),
            cooldown_durations: body.cooldown_durations.clone(),
        })
    }

    /// Every entity whose footprint overlaps the query circle, in store order.
    fn entities_in_radius(&self, pos: Vec2, radius: f32, filter: &EntityFilter) -> Vec<EntityRef> {
        self.entities
            .iter()
            .filter(|(_, b)| b.position.distance(pos) <= radius + b.radius.max(0.0))
            .map(|(handle, b)| b.entity_ref(handle))
            .filter(|e| filter.matches(e))
            .collect()
    }

    fn tile_at(&self, pos: Vec2) -> TileKind {
        self.map.tile_at(pos)
    }

    fn line_of_sight_clear(&self, a: Vec2, b: Vec2) -> bool {
        self.map.line_of_sight(a, b)
    }

    fn bounds(&self) -> Bounds {
        self.map.bounds()
    }

    fn map_revision(&self) -> u64 {
        self.revision
    }
}

impl WorldMut for Arena {
    /// Moves are checked against terrain and obstacles; a blocked move slides along whichever
    /// axis is still free, otherwise the unit only turns.
    fn apply_motion(&mut self, handle: AgentHandle, motion: &MotionCommand, dt: f32) -> bool {
        let Some(body) = self.entities.get(handle) else {
            return false;
        };
        if !body.is_unit() {
            return false;
        }
        let (from, radius) = (body.position, body.radius);
        let step = motion.velocity() * dt;

        let mut to = from;
        if step.is_finite() && step.length_squared() > 0.0 {
            let candidates = [
                from + step,
                from + Vec2::new(step.x, 0.0),
                from + Vec2::new(0.0, step.y),
            ];
            if let Some(free) = candidates
                .into_iter()
                .find(|c| self.position_free(handle, *c, radius))
            {
                to = free;
            }
        }

        if let Some(body) = self.entities.get_mut(handle) {
            if motion.heading.is_finite() {
                body.heading = motion.heading;
            }
            body.position = to;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arena() -> Arena {
        Arena::new(TileMap::open(10, 10, 1.0).unwrap())
    }

    #[test]
    fn units_cannot_spawn_in_walls() {
        let mut a = arena();
        a.set_tile(2, 2, TileKind::Wall);
        let spec = UnitSpec::new(Faction(0), Vec2::new(2.5, 2.5));
        assert!(matches!(
            a.spawn_unit(&spec),
            Err(ArenaError::Placement { .. })
        ));
        assert!(a.spawn(Body::obstacle(Vec2::new(2.5, 2.5), 0.5)).is_ok());
    }

    #[test]
    fn tile_edits_bump_revision_once_per_change() {
        let mut a = arena();
        a.set_tile(1, 1, TileKind::Wall);
        a.set_tile(1, 1, TileKind::Wall);
        assert_eq!(a.map_revision(), 1);
    }

    #[test]
    fn lethal_damage_removes_the_unit() {
        let mut a = arena();
        let u = a
            .spawn_unit(&UnitSpec::new(Faction(0), Vec2::new(5.0, 5.0)).with_health(20.0))
            .unwrap();
        let hit = a.damage(u, 50.0).unwrap();
        assert_eq!(hit.dealt, 20.0);
        assert!(hit.killed);
        assert!(a.agent(u).is_none());
        assert!(matches!(a.damage(u, 1.0), Err(ArenaError::Stale(_))));
    }

    #[test]
    fn events_expire() {
        let mut a = arena();
        let e = a.spawn(Body::event(Vec2::new(3.0, 3.0), 1.0, 0.5)).unwrap();
        a.advance(0.25);
        assert!(a.body(e).is_some());
        a.advance(0.25);
        assert!(a.body(e).is_none());
    }
}
