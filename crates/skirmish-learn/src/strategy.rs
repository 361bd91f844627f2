use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

/// Adjustments a profile applies on top of the archetype's base tunables.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategyModifiers {
    /// Added to the retreat health threshold.
    pub retreat_health_offset: f32,
    /// Multiplies the near-range threshold used by the attack rule.
    pub engage_range_scale: f32,
    /// Multiplies the commanded movement speed.
    pub speed_scale: f32,
}

impl Default for StrategyModifiers {
    fn default() -> Self {
        Self {
            retreat_health_offset: 0.0,
            engage_range_scale: 1.0,
            speed_scale: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyProfile {
    pub name: String,
    #[serde(default)]
    pub modifiers: StrategyModifiers,
}

impl StrategyProfile {
    pub fn new(name: impl Into<String>, modifiers: StrategyModifiers) -> Self {
        Self {
            name: name.into(),
            modifiers,
        }
    }

    /// Balanced, aggressive, defensive and tactical.
    pub fn standard_set() -> Vec<StrategyProfile> {
        vec![
            StrategyProfile::new("balanced", StrategyModifiers::default()),
            StrategyProfile::new(
                "aggressive",
                StrategyModifiers {
                    retreat_health_offset: -0.1,
                    engage_range_scale: 1.4,
                    speed_scale: 1.1,
                },
            ),
            StrategyProfile::new(
                "defensive",
                StrategyModifiers {
                    retreat_health_offset: 0.15,
                    engage_range_scale: 0.8,
                    speed_scale: 0.9,
                },
            ),
            StrategyProfile::new(
                "tactical",
                StrategyModifiers {
                    retreat_health_offset: 0.05,
                    engage_range_scale: 1.0,
                    speed_scale: 1.0,
                },
            ),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategyConfig {
    pub profiles: Vec<StrategyProfile>,
    /// Outcomes remembered per profile.
    pub window: usize,
    /// Re-evaluate after this many outcomes.
    pub evaluate_every: u32,
    /// Switch away when the active success rate drops below this.
    pub switch_threshold: f32,
    /// Success rate assumed for profiles with no history.
    pub optimistic_prior: f32,
    /// Outcomes the active profile must accumulate before it can be replaced.
    pub min_dwell: u32,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            profiles: StrategyProfile::standard_set(),
            window: 20,
            evaluate_every: 10,
            switch_threshold: 0.4,
            optimistic_prior: 0.6,
            min_dwell: 20,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StrategySwitch {
    pub from: String,
    pub to: String,
    pub success_rate: f32,
}

/// Tracks rolling success per profile and keeps exactly one profile active.
#[derive(Debug, Clone)]
pub struct StrategySelector {
    config: StrategyConfig,
    active: usize,
    history: Vec<VecDeque<bool>>,
    since_eval: u32,
    since_switch: u32,
    switches: u32,
}

impl StrategySelector {
    pub fn new(mut config: StrategyConfig) -> Self {
        if config.profiles.is_empty() {
            config.profiles = vec![StrategyProfile::new("balanced", StrategyModifiers::default())];
        }
        let history = vec![VecDeque::new(); config.profiles.len()];
        Self {
            config,
            active: 0,
            history,
            since_eval: 0,
            since_switch: 0,
            switches: 0,
        }
    }

    pub fn active(&self) -> &StrategyProfile {
        &self.config.profiles[self.active]
    }

    pub fn active_index(&self) -> usize {
        self.active
    }

    pub fn modifiers(&self) -> StrategyModifiers {
        self.active().modifiers
    }

    pub fn profiles(&self) -> &[StrategyProfile] {
        &self.config.profiles
    }

    pub fn switches(&self) -> u32 {
        self.switches
    }

    /// Active profile index mapped into `[0, 1]`, fed to perception.
    pub fn indicator(&self) -> f32 {
        let n = self.config.profiles.len();
        if n <= 1 {
            0.0
        } else {
            self.active as f32 / (n - 1) as f32
        }
    }

    /// Rolling success rate of `profile`, or `None` with no history.
    pub fn success_rate(&self, profile: usize) -> Option<f32> {
        let h = self.history.get(profile)?;
        if h.is_empty() {
            return None;
        }
        Some(h.iter().filter(|s| **s).count() as f32 / h.len() as f32)
    }

    fn rating(&self, profile: usize) -> f32 {
        self.success_rate(profile)
            .unwrap_or(self.config.optimistic_prior)
    }

    /// Record one outcome for the active profile; may switch profiles.
    pub fn record_outcome(&mut self, success: bool) -> Option<StrategySwitch> {
        let window = self.config.window.max(1);
        let h = &mut self.history[self.active];
        h.push_back(success);
        while h.len() > window {
            h.pop_front();
        }
        self.since_eval = self.since_eval.saturating_add(1);
        self.since_switch = self.since_switch.saturating_add(1);

        if self.since_eval < self.config.evaluate_every.max(1) {
            return None;
        }
        self.since_eval = 0;
        self.evaluate()
    }

    fn evaluate(&mut self) -> Option<StrategySwitch> {
        if self.config.profiles.len() < 2 || self.since_switch < self.config.min_dwell {
            return None;
        }
        let current = self.rating(self.active);
        if current >= self.config.switch_threshold {
            return None;
        }

        let mut best: Option<(usize, f32)> = None;
        for idx in (0..self.config.profiles.len()).filter(|i| *i != self.active) {
            let r = self.rating(idx);
            if best.map_or(true, |(_, br)| r > br) {
                best = Some((idx, r));
            }
        }
        let (next, _) = best?;

        let switch = StrategySwitch {
            from: self.config.profiles[self.active].name.clone(),
            to: self.config.profiles[next].name.clone(),
            success_rate: current,
        };
        tracing::info!(
            from = %switch.from,
            to = %switch.to,
            success_rate = current,
            "strategy switched"
        );
        self.active = next;
        self.since_switch = 0;
        self.switches += 1;
        Some(switch)
    }
}
