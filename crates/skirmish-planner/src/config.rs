#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct EvaluationWeights {
    /// Per unit of ally health ratio.
    pub ally_health: f32,
    pub self_health: f32,
    /// Subtracted per unit of enemy health ratio.
    pub enemy_health: f32,
    /// Per debuffed enemy.
    pub debuff: f32,
    /// Per ally within heal range.
    pub ally_proximity: f32,
    /// Subtracted per enemy within danger range.
    pub enemy_proximity: f32,
    /// Subtracted per unit of remaining cooldown fraction.
    pub cooldown: f32,
}

impl Default for EvaluationWeights {
    fn default() -> Self {
        Self {
            ally_health: 10.0,
            self_health: 6.0,
            enemy_health: 4.0,
            debuff: 1.5,
            ally_proximity: 0.5,
            enemy_proximity: 1.0,
            cooldown: 0.5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PlannerConfig {
    /// Plies searched; each ply is one simulated step.
    pub depth: u32,
    /// Hard cap on visited nodes per search.
    pub node_budget: usize,
    /// Radius used when capturing a snapshot from the world.
    pub awareness_radius: f32,
    /// Nearest allies and enemies kept in a snapshot, per side.
    pub max_units_per_side: usize,
    pub heal_range: f32,
    pub debuff_range: f32,
    /// Enemies inside this radius are threats: they enable flee and cost proximity score.
    pub danger_range: f32,
    /// Health ratio restored by one heal.
    pub heal_amount: f32,
    pub heal_cooldown: f32,
    pub heal_slot: usize,
    pub debuff_duration: f32,
    pub debuff_cooldown: f32,
    pub debuff_slot: usize,
    /// Seconds of simulated time per ply.
    pub step_seconds: f32,
    /// Distance covered by one move or flee ply.
    pub move_step: f32,
    pub weights: EvaluationWeights,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            depth: 3,
            node_budget: 4096,
            awareness_radius: 12.0,
            max_units_per_side: 4,
            heal_range: 5.0,
            debuff_range: 6.0,
            danger_range: 4.0,
            heal_amount: 0.25,
            heal_cooldown: 4.0,
            heal_slot: 0,
            debuff_duration: 3.0,
            debuff_cooldown: 5.0,
            debuff_slot: 1,
            step_seconds: 1.0,
            move_step: 2.0,
            weights: EvaluationWeights::default(),
        }
    }
}
