use core::ops::Index;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Indices of the base features. Cooldown ratios follow at [`BASE_LEN`](features::BASE_LEN)`+ slot`.
pub mod features {
    pub const POS_X: usize = 0;
    pub const POS_Y: usize = 1;
    pub const HEALTH: usize = 2;
    pub const ENEMY_COUNT: usize = 3;
    pub const ENEMY_DISTANCE: usize = 4;
    /// Bearing of the nearest enemy relative to the heading: `0.5` is dead ahead.
    pub const ENEMY_BEARING: usize = 5;
    pub const ALLY_COUNT: usize = 6;
    pub const ALLY_DISTANCE: usize = 7;
    pub const OBSTACLE_DENSITY: usize = 8;
    pub const HAZARD_DENSITY: usize = 9;
    pub const HAZARD_DISTANCE: usize = 10;
    pub const EVENT_NEARBY: usize = 11;
    pub const OBJECTIVE_DISTANCE: usize = 12;
    pub const RESOURCE_NEARBY: usize = 13;
    pub const STRATEGY: usize = 14;

    pub const BASE_LEN: usize = 15;

    pub const NAMES: [&str; BASE_LEN] = [
        "pos_x",
        "pos_y",
        "health",
        "enemy_count",
        "enemy_distance",
        "enemy_bearing",
        "ally_count",
        "ally_distance",
        "obstacle_density",
        "hazard_density",
        "hazard_distance",
        "event_nearby",
        "objective_distance",
        "resource_nearby",
        "strategy",
    ];
}

/// Vector shape for one archetype: the base features plus one cooldown ratio per ability slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PerceptionLayout {
    pub ability_slots: usize,
}

impl PerceptionLayout {
    pub const fn new(ability_slots: usize) -> Self {
        Self { ability_slots }
    }

    pub const fn len(&self) -> usize {
        features::BASE_LEN + self.ability_slots
    }

    pub const fn is_empty(&self) -> bool {
        false
    }

    pub const fn cooldown_index(&self, slot: usize) -> Option<usize> {
        if slot < self.ability_slots {
            Some(features::BASE_LEN + slot)
        } else {
            None
        }
    }

    /// The neutral vector: nothing perceived, full health, every ability ready.
    pub fn neutral(&self) -> PerceptionVector {
        let mut values = vec![0.0; self.len()];
        values[features::POS_X] = 0.5;
        values[features::POS_Y] = 0.5;
        values[features::HEALTH] = 1.0;
        values[features::ENEMY_DISTANCE] = 1.0;
        values[features::ENEMY_BEARING] = 0.5;
        values[features::ALLY_DISTANCE] = 1.0;
        values[features::HAZARD_DISTANCE] = 1.0;
        values[features::OBJECTIVE_DISTANCE] = 1.0;
        PerceptionVector { values }
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PerceptionVector {
    values: Vec<f32>,
}

impl PerceptionVector {
    /// Wrap raw values, clamping each into `[0, 1]` (non-finite values become `0`).
    pub fn from_values(values: impl Into<Vec<f32>>) -> Self {
        let mut values = values.into();
        for v in &mut values {
            *v = if v.is_finite() { v.clamp(0.0, 1.0) } else { 0.0 };
        }
        Self { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, feature: usize) -> Option<f32> {
        self.values.get(feature).copied()
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.values
    }

    pub fn health(&self) -> f32 {
        self.get(features::HEALTH).unwrap_or(1.0)
    }

    /// Normalized distance to the nearest enemy; `1.0` when none is perceived.
    pub fn enemy_distance(&self) -> f32 {
        self.get(features::ENEMY_DISTANCE).unwrap_or(1.0)
    }

    pub fn has_enemy(&self) -> bool {
        self.get(features::ENEMY_COUNT).is_some_and(|c| c > 0.0)
    }

    pub(crate) fn set(&mut self, feature: usize, value: f32) {
        if let Some(slot) = self.values.get_mut(feature) {
            *slot = if value.is_finite() {
                value.clamp(0.0, 1.0)
            } else {
                0.0
            };
        }
    }
}

impl Index<usize> for PerceptionVector {
    type Output = f32;

    fn index(&self, index: usize) -> &f32 {
        &self.values[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_appends_cooldowns() {
        let layout = PerceptionLayout::new(3);
        assert_eq!(layout.len(), 18);
        assert_eq!(layout.cooldown_index(0), Some(15));
        assert_eq!(layout.cooldown_index(3), None);
        assert_eq!(layout.neutral().len(), 18);
    }

    #[test]
    fn raw_values_are_clamped() {
        let v = PerceptionVector::from_values(vec![-1.0, 2.0, f32::NAN, 0.25]);
        assert_eq!(v.as_slice(), &[0.0, 1.0, 0.0, 0.25]);
    }
}
