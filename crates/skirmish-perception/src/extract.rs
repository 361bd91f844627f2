use core::f32::consts::PI;

use skirmish_core::{
    shortest_angle_delta, AgentHandle, AgentStatus, EntityFilter, EntityKind, EntityRef, TileKind,
    Unavailable, Vec2, WorldQuery,
};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{features, PerceptionLayout, PerceptionVector};

/// Ring samples used for obstacle and hazard density.
const DENSITY_RINGS: [f32; 2] = [0.5, 1.0];
const DENSITY_SPOKES: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PerceptionConfig {
    /// Distances are normalized against this radius; nothing beyond it is perceived.
    pub detection_radius: f32,
    /// Radius considered "in contact" by rules and the reward shaper.
    pub near_range: f32,
    /// Counts saturate at this many entities.
    pub count_saturation: u32,
    pub event_radius: f32,
    pub resource_radius: f32,
    pub ability_slots: usize,
}

impl Default for PerceptionConfig {
    fn default() -> Self {
        Self {
            detection_radius: 10.0,
            near_range: 2.5,
            count_saturation: 5,
            event_radius: 4.0,
            resource_radius: 3.0,
            ability_slots: 2,
        }
    }
}

impl PerceptionConfig {
    pub fn layout(&self) -> PerceptionLayout {
        PerceptionLayout::new(self.ability_slots)
    }

    /// `near_range` expressed in the normalized distance units of the vector.
    pub fn near_range_normalized(&self) -> f32 {
        if self.detection_radius > 0.0 {
            (self.near_range / self.detection_radius).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }
}

/// Raw findings behind the vector, used to pick movement and effect targets.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub status: AgentStatus,
    pub nearest_enemy: Option<EntityRef>,
    pub enemies_in_near_range: usize,
    pub nearest_ally: Option<EntityRef>,
    /// Ally with the lowest health ratio below full health.
    pub weakest_ally: Option<EntityRef>,
    pub nearest_hazard: Option<EntityRef>,
    pub nearest_resource: Option<EntityRef>,
    pub nearest_event: Option<EntityRef>,
    pub objective: Option<EntityRef>,
    /// Nearest high-value target not of our faction; the stand-off rule applies to it.
    pub defended: Option<EntityRef>,
}

impl Observation {
    pub fn position(&self) -> Vec2 {
        self.status.position
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Percept {
    pub vector: PerceptionVector,
    pub observation: Observation,
}

fn nearest(from: Vec2, entities: &[EntityRef]) -> Option<EntityRef> {
    entities.iter().copied().min_by(|a, b| {
        from.distance_squared(a.position)
            .total_cmp(&from.distance_squared(b.position))
            .then_with(|| a.handle.stable_id().cmp(&b.handle.stable_id()))
    })
}

fn surface_distance(from: Vec2, entity: &EntityRef) -> f32 {
    (from.distance(entity.position) - entity.radius.max(0.0)).max(0.0)
}

fn count_ratio(count: usize, saturation: u32) -> f32 {
    if saturation == 0 {
        return if count > 0 { 1.0 } else { 0.0 };
    }
    (count as f32 / saturation as f32).min(1.0)
}

/// Build the perception vector and observation for `agent`.
///
/// `strategy_indicator` is the active strategy's normalized index, supplied by the caller.
pub fn extract_state<W: WorldQuery + ?Sized>(
    agent: AgentHandle,
    world: &W,
    config: &PerceptionConfig,
    strategy_indicator: f32,
) -> Result<Percept, Unavailable> {
    let status = world
        .agent(agent)
        .ok_or_else(|| Unavailable::new(agent, "status"))?;
    if !status.is_alive() {
        return Err(Unavailable::new(agent, "health"));
    }
    if !status.position.is_finite() {
        return Err(Unavailable::new(agent, "position"));
    }

    let pos = status.position;
    let radius = config.detection_radius.max(f32::EPSILON);
    let layout = config.layout();
    let mut vector = layout.neutral();

    let bounds = world.bounds();
    let normalized = bounds.normalize(pos);
    vector.set(features::POS_X, normalized.x);
    vector.set(features::POS_Y, normalized.y);
    vector.set(features::HEALTH, status.health_ratio());

    let enemies = world.entities_in_radius(
        pos,
        radius,
        &EntityFilter::enemies_of(status.faction).excluding(agent),
    );
    let nearest_enemy = nearest(pos, &enemies);
    vector.set(
        features::ENEMY_COUNT,
        count_ratio(enemies.len(), config.count_saturation),
    );
    if let Some(enemy) = nearest_enemy {
        vector.set(features::ENEMY_DISTANCE, pos.distance(enemy.position) / radius);
        let bearing = shortest_angle_delta(status.heading, (enemy.position - pos).angle());
        vector.set(features::ENEMY_BEARING, (bearing + PI) / (2.0 * PI));
    }
    let enemies_in_near_range = enemies
        .iter()
        .filter(|e| pos.distance(e.position) <= config.near_range)
        .count();

    let allies = world.entities_in_radius(
        pos,
        radius,
        &EntityFilter::allies_of(status.faction).excluding(agent),
    );
    let nearest_ally = nearest(pos, &allies);
    vector.set(
        features::ALLY_COUNT,
        count_ratio(allies.len(), config.count_saturation),
    );
    if let Some(ally) = nearest_ally {
        vector.set(features::ALLY_DISTANCE, pos.distance(ally.position) / radius);
    }
    let weakest_ally = allies
        .iter()
        .copied()
        .filter(|a| a.health_ratio < 1.0)
        .min_by(|a, b| {
            a.health_ratio
                .total_cmp(&b.health_ratio)
                .then_with(|| a.handle.stable_id().cmp(&b.handle.stable_id()))
        });

    let obstacles =
        world.entities_in_radius(pos, radius, &EntityFilter::kind(EntityKind::Obstacle));
    let hazards =
        world.entities_in_radius(pos, radius, &EntityFilter::kind(EntityKind::Hazard));

    let mut blocked_samples = 0usize;
    let mut hazard_samples = 0usize;
    let mut total = 0usize;
    for ring in DENSITY_RINGS {
        for spoke in 0..DENSITY_SPOKES {
            let angle = spoke as f32 * (2.0 * PI / DENSITY_SPOKES as f32);
            let sample = pos + Vec2::from_angle(angle) * (ring * radius);
            total += 1;
            let tile = if bounds.contains(sample) {
                world.tile_at(sample)
            } else {
                TileKind::Void
            };
            let covered = |list: &[EntityRef]| {
                list.iter()
                    .any(|e| e.position.distance(sample) <= e.radius.max(0.0))
            };
            if !tile.is_walkable() || covered(&obstacles) {
                blocked_samples += 1;
            }
            if tile == TileKind::Hazard || covered(&hazards) {
                hazard_samples += 1;
            }
        }
    }
    vector.set(features::OBSTACLE_DENSITY, blocked_samples as f32 / total as f32);
    vector.set(features::HAZARD_DENSITY, hazard_samples as f32 / total as f32);

    let nearest_hazard = hazards.iter().copied().min_by(|a, b| {
        surface_distance(pos, a)
            .total_cmp(&surface_distance(pos, b))
            .then_with(|| a.handle.stable_id().cmp(&b.handle.stable_id()))
    });
    if let Some(hazard) = nearest_hazard {
        vector.set(
            features::HAZARD_DISTANCE,
            surface_distance(pos, &hazard) / radius,
        );
    }

    let events = world.entities_in_radius(
        pos,
        config.event_radius,
        &EntityFilter::kind(EntityKind::Event),
    );
    let nearest_event = nearest(pos, &events);
    vector.set(
        features::EVENT_NEARBY,
        if nearest_event.is_some() { 1.0 } else { 0.0 },
    );

    let resources =
        world.entities_in_radius(pos, radius, &EntityFilter::kind(EntityKind::Resource));
    let nearest_resource = nearest(pos, &resources);
    let resource_close = nearest_resource
        .is_some_and(|r| pos.distance(r.position) <= config.resource_radius);
    vector.set(
        features::RESOURCE_NEARBY,
        if resource_close { 1.0 } else { 0.0 },
    );

    // Objectives are map-level: search the whole arena and normalize by its diagonal.
    let diagonal = Vec2::new(bounds.width(), bounds.height()).length().max(f32::EPSILON);
    let objectives =
        world.entities_in_radius(pos, diagonal, &EntityFilter::kind(EntityKind::Objective));
    let objective = nearest(pos, &objectives);
    if let Some(objective) = objective {
        vector.set(
            features::OBJECTIVE_DISTANCE,
            pos.distance(objective.position) / diagonal,
        );
    }

    let defended = nearest(
        pos,
        &objectives
            .iter()
            .chain(enemies.iter())
            .copied()
            .filter(|e| e.high_value && e.faction != Some(status.faction))
            .collect::<Vec<_>>(),
    );

    vector.set(features::STRATEGY, strategy_indicator);
    for slot in 0..layout.ability_slots {
        if let Some(idx) = layout.cooldown_index(slot) {
            vector.set(idx, status.cooldown_ratio(slot));
        }
    }

    Ok(Percept {
        vector,
        observation: Observation {
            status,
            nearest_enemy,
            enemies_in_near_range,
            nearest_ally,
            weakest_ally,
            nearest_hazard,
            nearest_resource,
            nearest_event,
            objective,
            defended,
        },
    })
}
