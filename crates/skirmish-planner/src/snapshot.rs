use skirmish_core::{
    AgentHandle, EntityFilter, EntityHandle, EntityRef, Unavailable, Vec2, WorldQuery,
};

use crate::PlannerConfig;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlannerUnit {
    pub handle: EntityHandle,
    pub position: Vec2,
    /// Health ratio in `[0, 1]`.
    pub health: f32,
    /// Seconds of debuff left; `0` when unaffected.
    pub debuff_remaining: f32,
}

impl PlannerUnit {
    pub fn new(handle: EntityHandle, position: Vec2, health: f32) -> Self {
        Self {
            handle,
            position,
            health: health.clamp(0.0, 1.0),
            debuff_remaining: 0.0,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.health > 0.0
    }

    pub fn is_debuffed(&self) -> bool {
        self.debuff_remaining > 0.0
    }
}

/// Simplified, owned copy of the planner's neighborhood. Discarded after each search.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannerSnapshot {
    pub me: PlannerUnit,
    /// Seconds until the heal ability is ready.
    pub heal_cooldown: f32,
    pub debuff_cooldown: f32,
    pub allies: Vec<PlannerUnit>,
    pub enemies: Vec<PlannerUnit>,
}

impl PlannerSnapshot {
    pub fn new(me: PlannerUnit) -> Self {
        Self {
            me,
            heal_cooldown: 0.0,
            debuff_cooldown: 0.0,
            allies: Vec::new(),
            enemies: Vec::new(),
        }
    }

    pub fn with_ally(mut self, ally: PlannerUnit) -> Self {
        self.allies.push(ally);
        self
    }

    pub fn with_enemy(mut self, enemy: PlannerUnit) -> Self {
        self.enemies.push(enemy);
        self
    }

    pub fn ally(&self, handle: EntityHandle) -> Option<&PlannerUnit> {
        self.allies.iter().find(|u| u.handle == handle)
    }

    pub fn enemy(&self, handle: EntityHandle) -> Option<&PlannerUnit> {
        self.enemies.iter().find(|u| u.handle == handle)
    }

    /// Build a snapshot of `agent`'s surroundings, keeping the nearest units on each side.
    pub fn capture<W: WorldQuery + ?Sized>(
        agent: AgentHandle,
        world: &W,
        config: &PlannerConfig,
    ) -> Result<Self, Unavailable> {
        let status = world
            .agent(agent)
            .ok_or_else(|| Unavailable::new(agent, "status"))?;
        if !status.is_alive() {
            return Err(Unavailable::new(agent, "health"));
        }
        let pos = status.position;

        let collect = |filter: EntityFilter| -> Vec<PlannerUnit> {
            let mut found: Vec<EntityRef> =
                world.entities_in_radius(pos, config.awareness_radius, &filter.excluding(agent));
            found.sort_by(|a, b| {
                pos.distance_squared(a.position)
                    .total_cmp(&pos.distance_squared(b.position))
                    .then_with(|| a.handle.stable_id().cmp(&b.handle.stable_id()))
            });
            found
                .into_iter()
                .take(config.max_units_per_side)
                .map(|e| PlannerUnit {
                    handle: e.handle,
                    position: e.position,
                    health: e.health_ratio.clamp(0.0, 1.0),
                    debuff_remaining: if e.debuffed {
                        config.debuff_duration
                    } else {
                        0.0
                    },
                })
                .collect()
        };

        Ok(Self {
            me: PlannerUnit::new(agent, pos, status.health_ratio()),
            heal_cooldown: status
                .cooldowns
                .get(config.heal_slot)
                .copied()
                .unwrap_or(0.0)
                .max(0.0),
            debuff_cooldown: status
                .cooldowns
                .get(config.debuff_slot)
                .copied()
                .unwrap_or(0.0)
                .max(0.0),
            allies: collect(EntityFilter::allies_of(status.faction)),
            enemies: collect(EntityFilter::enemies_of(status.faction)),
        })
    }
}
