//! Per-archetype tunables, loadable from YAML.

use std::path::Path;

use anyhow::{ensure, Context, Result};
use serde::{Deserialize, Serialize};
use skirmish_learn::{PolicyConfig, RewardWeights, StrategyConfig};
use skirmish_nav::{RecomputePolicy, SearchLimits};
use skirmish_perception::PerceptionConfig;
use skirmish_planner::PlannerConfig;
use skirmish_steer::SteeringConfig;

/// Which decision component drives the unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BrainKind {
    /// Rule table plus learned estimator.
    #[default]
    Reactive,
    /// Alpha-beta lookahead over a planner snapshot.
    Planner,
}

/// Archetype-specific effect logic layered over the shared control loop.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum BehaviorConfig {
    #[default]
    Standard,
    /// Charges the nearest enemy and detonates on contact.
    Exploder {
        #[serde(default = "default_trigger_range")]
        trigger_range: f32,
        #[serde(default = "default_blast_radius")]
        blast_radius: f32,
        #[serde(default = "default_blast_damage")]
        blast_damage: f32,
    },
}

fn default_trigger_range() -> f32 {
    1.2
}
fn default_blast_radius() -> f32 {
    3.0
}
fn default_blast_damage() -> f32 {
    60.0
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavigationConfig {
    /// Extra clearance added to the unit's body radius when inflating the grid.
    pub clearance_margin: f32,
    /// Replan when the movement target moved further than this.
    pub recompute_distance: f32,
    pub recompute_interval: f32,
    pub lookahead_waypoints: usize,
    pub probe_radius: f32,
    pub max_expansions: usize,
    pub start_snap_radius: i32,
    /// A waypoint closer than this counts as reached.
    pub arrival_radius: f32,
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            clearance_margin: 0.1,
            recompute_distance: 2.0,
            recompute_interval: 3.0,
            lookahead_waypoints: 3,
            probe_radius: 0.5,
            max_expansions: 4096,
            start_snap_radius: 2,
            arrival_radius: 0.5,
        }
    }
}

impl NavigationConfig {
    pub fn limits(&self) -> SearchLimits {
        SearchLimits {
            max_expansions: self.max_expansions,
            start_snap_radius: self.start_snap_radius,
        }
    }

    pub fn recompute_policy(&self) -> RecomputePolicy {
        RecomputePolicy {
            target_moved_distance: self.recompute_distance,
            interval_seconds: self.recompute_interval,
            lookahead_waypoints: self.lookahead_waypoints,
            probe_radius: self.probe_radius,
        }
    }
}

/// Everything one archetype needs; every section falls back to its defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArchetypeConfig {
    pub brain: BrainKind,
    pub behavior: BehaviorConfig,
    /// Decisions happen every this many ticks; steering runs every tick.
    pub think_every_ticks: u32,
    /// Movement, sensors, stuck recovery and stand-off.
    pub steering: SteeringConfig,
    pub navigation: NavigationConfig,
    pub perception: PerceptionConfig,
    pub policy: PolicyConfig,
    pub rewards: RewardWeights,
    pub strategy: StrategyConfig,
    pub planner: PlannerConfig,
}

impl Default for ArchetypeConfig {
    fn default() -> Self {
        Self {
            brain: BrainKind::Reactive,
            behavior: BehaviorConfig::Standard,
            think_every_ticks: 4,
            steering: SteeringConfig::default(),
            navigation: NavigationConfig::default(),
            perception: PerceptionConfig::default(),
            policy: PolicyConfig::default(),
            rewards: RewardWeights::default(),
            strategy: StrategyConfig::default(),
            planner: PlannerConfig::default(),
        }
    }
}

impl ArchetypeConfig {
    /// Preset for the support role: planner brain with the support action set.
    pub fn support() -> Self {
        Self {
            brain: BrainKind::Planner,
            policy: PolicyConfig {
                actions: skirmish_core::ActionSet::support(),
                ..PolicyConfig::default()
            },
            ..Self::default()
        }
    }

    /// Preset for the exploder archetype.
    pub fn exploder() -> Self {
        Self {
            behavior: BehaviorConfig::Exploder {
                trigger_range: default_trigger_range(),
                blast_radius: default_blast_radius(),
                blast_damage: default_blast_damage(),
            },
            ..Self::default()
        }
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(content).context("Failed to parse archetype")?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read archetype from {}", path.display()))?;
        let config: Self = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse archetype from {}", path.display()))?;
        Ok(config)
    }

    /// Reject tunables the control loop cannot run with.
    pub fn validate(&self) -> Result<()> {
        let s = &self.steering;
        ensure!(s.max_speed > 0.0, "steering.max_speed must be > 0");
        ensure!(s.max_turn_rate > 0.0, "steering.max_turn_rate must be > 0");
        ensure!(
            s.sensors.probe_length > 0.0,
            "steering.sensors.probe_length must be > 0"
        );
        ensure!(
            s.sensors.samples_per_probe > 0,
            "steering.sensors.samples_per_probe must be > 0"
        );
        ensure!(
            s.standoff.min_radius >= 0.0 && s.standoff.min_radius <= s.standoff.hold_radius,
            "steering.standoff radii must satisfy 0 <= min_radius <= hold_radius"
        );
        ensure!(
            s.stuck.window_seconds > 0.0,
            "steering.stuck.window_seconds must be > 0"
        );

        let n = &self.navigation;
        ensure!(n.max_expansions > 0, "navigation.max_expansions must be > 0");
        ensure!(n.arrival_radius > 0.0, "navigation.arrival_radius must be > 0");

        let p = &self.perception;
        ensure!(
            p.detection_radius > 0.0,
            "perception.detection_radius must be > 0"
        );

        let policy = &self.policy;
        ensure!(
            (0.0..=1.0).contains(&policy.epsilon),
            "policy.epsilon must be within [0, 1], got {}",
            policy.epsilon
        );
        ensure!(
            policy.buffer_capacity > 0,
            "policy.buffer_capacity must be > 0"
        );
        ensure!(policy.batch_size > 0, "policy.batch_size must be > 0");

        ensure!(
            self.rewards.min_reward <= self.rewards.max_reward,
            "rewards.min_reward ({}) exceeds rewards.max_reward ({})",
            self.rewards.min_reward,
            self.rewards.max_reward
        );

        ensure!(self.strategy.window > 0, "strategy.window must be > 0");
        ensure!(
            self.planner.node_budget > 0,
            "planner.node_budget must be > 0"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_yaml_keeps_defaults() {
        let config = ArchetypeConfig::from_yaml(
            "brain: planner\nsteering:\n  max_speed: 6.0\npolicy:\n  epsilon: 0.5\n",
        )
        .unwrap();
        assert_eq!(config.brain, BrainKind::Planner);
        assert_eq!(config.steering.max_speed, 6.0);
        assert_eq!(config.steering.slow_radius, SteeringConfig::default().slow_radius);
        assert_eq!(config.policy.epsilon, 0.5);
        assert_eq!(config.navigation, NavigationConfig::default());
        config.validate().unwrap();
    }

    #[test]
    fn exploder_behavior_is_tagged() {
        let config = ArchetypeConfig::from_yaml("behavior:\n  kind: exploder\n  blast_damage: 80\n")
            .unwrap();
        assert_eq!(
            config.behavior,
            BehaviorConfig::Exploder {
                trigger_range: 1.2,
                blast_radius: 3.0,
                blast_damage: 80.0,
            }
        );
    }

    #[test]
    fn validation_rejects_bad_tunables() {
        let mut config = ArchetypeConfig::default();
        config.policy.epsilon = 1.5;
        assert!(config.validate().is_err());

        let mut config = ArchetypeConfig::default();
        config.rewards.min_reward = 5.0;
        config.rewards.max_reward = 1.0;
        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("min_reward"), "{err}");

        let mut config = ArchetypeConfig::default();
        config.steering.max_speed = 0.0;
        assert!(config.validate().is_err());

        let mut config = ArchetypeConfig::default();
        config.policy.buffer_capacity = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn empty_action_set_fails_to_parse() {
        assert!(ArchetypeConfig::from_yaml("policy:\n  actions: []\n").is_err());
    }
}
