//! Reward shaping: an additive sum of independently weighted terms, clamped to
//! `[min_reward, max_reward]`.

use serde::{Deserialize, Serialize};
use skirmish_core::{Bounds, EffectReport, Vec2};
use skirmish_perception::Observation;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RewardWeights {
    /// Granted every step the unit is alive.
    pub survival: f32,
    pub movement: f32,
    /// Displacement per step above which the movement bonus applies.
    pub movement_threshold: f32,
    /// Penalty per consecutive stationary step, growing until `stationary_cap_steps`.
    pub stationary: f32,
    pub stationary_cap_steps: u32,
    /// Per unit of health ratio lost.
    pub damage_taken: f32,
    /// Per unit of health ratio gained.
    pub heal_received: f32,
    pub kill: f32,
    /// Ability used with enemies nearby.
    pub ability_used: f32,
    /// Ability used with no enemy nearby.
    pub ability_wasted: f32,
    /// First resource pickup; later pickups earn `resource / (1 + collected_before)`.
    pub resource: f32,
    /// Scaled by `1 / max(distance, 0.5)` inside `hazard_radius`.
    pub hazard_proximity: f32,
    pub hazard_radius: f32,
    pub edge_proximity: f32,
    pub edge_margin: f32,
    /// Per world unit of distance gained (positive) or lost (negative) toward the objective.
    pub objective_progress: f32,
    pub death: f32,
    pub min_reward: f32,
    pub max_reward: f32,
}

impl Default for RewardWeights {
    fn default() -> Self {
        Self {
            survival: 0.01,
            movement: 0.02,
            movement_threshold: 0.05,
            stationary: 0.01,
            stationary_cap_steps: 20,
            damage_taken: 2.0,
            heal_received: 1.0,
            kill: 5.0,
            ability_used: 0.5,
            ability_wasted: 0.3,
            resource: 1.0,
            hazard_proximity: 0.2,
            hazard_radius: 3.0,
            edge_proximity: 0.1,
            edge_margin: 1.0,
            objective_progress: 0.3,
            death: 10.0,
            min_reward: -10.0,
            max_reward: 10.0,
        }
    }
}

/// The slice of agent state the shaper compares between steps.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RewardSnapshot {
    pub position: Vec2,
    pub health_ratio: f32,
    pub alive: bool,
    pub enemies_nearby: usize,
    /// Surface distance to the nearest hazard, world units.
    pub hazard_distance: Option<f32>,
    pub edge_distance: f32,
    pub objective_distance: Option<f32>,
}

impl RewardSnapshot {
    pub fn from_observation(obs: &Observation, bounds: &Bounds) -> Self {
        let position = obs.position();
        Self {
            position,
            health_ratio: obs.status.health_ratio(),
            alive: obs.status.is_alive(),
            enemies_nearby: obs.enemies_in_near_range,
            hazard_distance: obs
                .nearest_hazard
                .map(|h| (position.distance(h.position) - h.radius.max(0.0)).max(0.0)),
            edge_distance: bounds.distance_to_edge(position),
            objective_distance: obs.objective.map(|o| position.distance(o.position)),
        }
    }

    /// Snapshot for a unit that is gone: keeps the last known position.
    pub fn dead(last: &RewardSnapshot) -> Self {
        Self {
            health_ratio: 0.0,
            alive: false,
            ..*last
        }
    }
}

/// Discrete outcomes of the step's effect requests.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RewardEvents {
    pub kills: u32,
    pub ability_used: bool,
    pub resources_collected: u32,
    pub died: bool,
}

impl From<&EffectReport> for RewardEvents {
    fn from(report: &EffectReport) -> Self {
        Self {
            kills: report.kills,
            ability_used: report.ability_used,
            resources_collected: report.resources_collected,
            died: report.self_destroyed,
        }
    }
}

/// Every term of one reward, before and after clamping.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RewardBreakdown {
    pub survival: f32,
    pub movement: f32,
    pub damage: f32,
    pub healing: f32,
    pub kills: f32,
    pub ability: f32,
    pub resources: f32,
    pub hazard: f32,
    pub edge: f32,
    pub objective: f32,
    pub death: f32,
    pub raw: f32,
    pub total: f32,
}

/// Stateful wrapper around [`RewardShaper::shape`]: tracks the stationary streak and how many
/// resources have been collected so far.
#[derive(Debug, Clone)]
pub struct RewardShaper {
    weights: RewardWeights,
    stationary_steps: u32,
    resources_collected: u32,
}

impl RewardShaper {
    pub fn new(weights: RewardWeights) -> Self {
        Self {
            weights,
            stationary_steps: 0,
            resources_collected: 0,
        }
    }

    pub fn weights(&self) -> &RewardWeights {
        &self.weights
    }

    pub fn reset(&mut self) {
        self.stationary_steps = 0;
        self.resources_collected = 0;
    }

    /// Reward for the step from `prev` to `current`; advances the internal streak counters.
    pub fn compute(
        &mut self,
        prev: &RewardSnapshot,
        current: &RewardSnapshot,
        events: &RewardEvents,
    ) -> RewardBreakdown {
        let moved = prev.position.distance(current.position) > self.weights.movement_threshold;
        let stationary_steps = if moved {
            0
        } else {
            self.stationary_steps.saturating_add(1)
        };
        let out = Self::shape(
            &self.weights,
            stationary_steps,
            self.resources_collected,
            prev,
            current,
            events,
        );
        self.stationary_steps = stationary_steps;
        self.resources_collected = self
            .resources_collected
            .saturating_add(events.resources_collected);
        out
    }

    /// Pure shaping function.
    ///
    /// `stationary_steps` is the current stationary streak including this step, and
    /// `collected_before` the resources collected earlier in the episode.
    pub fn shape(
        w: &RewardWeights,
        stationary_steps: u32,
        collected_before: u32,
        prev: &RewardSnapshot,
        current: &RewardSnapshot,
        events: &RewardEvents,
    ) -> RewardBreakdown {
        let mut b = RewardBreakdown::default();
        let died = events.died || (prev.alive && !current.alive);

        if current.alive {
            b.survival = w.survival;
        }

        let displacement = prev.position.distance(current.position);
        b.movement = if displacement > w.movement_threshold {
            w.movement
        } else {
            -w.stationary * stationary_steps.min(w.stationary_cap_steps).max(1) as f32
        };

        let delta_health = current.health_ratio - prev.health_ratio;
        if delta_health < 0.0 {
            b.damage = w.damage_taken * delta_health;
        } else {
            b.healing = w.heal_received * delta_health;
        }

        b.kills = w.kill * events.kills as f32;

        if events.ability_used {
            b.ability = if prev.enemies_nearby > 0 || current.enemies_nearby > 0 {
                w.ability_used
            } else {
                -w.ability_wasted
            };
        }

        for i in 0..events.resources_collected {
            b.resources += w.resource / (1.0 + collected_before.saturating_add(i) as f32);
        }

        if let Some(d) = current.hazard_distance {
            if d < w.hazard_radius {
                b.hazard = -w.hazard_proximity / d.max(0.5);
            }
        }

        if current.edge_distance < w.edge_margin && w.edge_margin > 0.0 {
            b.edge = -w.edge_proximity * (1.0 - current.edge_distance / w.edge_margin);
        }

        if let (Some(before), Some(after)) = (prev.objective_distance, current.objective_distance) {
            b.objective = w.objective_progress * (before - after);
        }

        if died {
            b.death = -w.death;
        }

        b.raw = b.survival
            + b.movement
            + b.damage
            + b.healing
            + b.kills
            + b.ability
            + b.resources
            + b.hazard
            + b.edge
            + b.objective
            + b.death;
        let (lo, hi) = if w.min_reward <= w.max_reward {
            (w.min_reward, w.max_reward)
        } else {
            (w.max_reward, w.min_reward)
        };
        b.total = if b.raw.is_finite() {
            b.raw.clamp(lo, hi)
        } else if b.raw == f32::INFINITY {
            hi
        } else {
            lo
        };
        b
    }
}
