use core::f32::consts::PI;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SensorConfig {
    /// Probe directions relative to the current heading, radians. Positive is to the left.
    pub angles: Vec<f32>,
    /// Samples taken along each probe, evenly spaced up to `probe_length`.
    pub samples_per_probe: u32,
    pub probe_length: f32,
    /// Radians of heading bias per unit of accumulated repulsion.
    pub repulsion_weight: f32,
    /// Probes within this angle of straight ahead count as center-forward.
    pub center_cone: f32,
    /// Speed scale when a center-forward probe is blocked at point-blank range.
    pub min_throttle: f32,
    /// Heading bias toward the held avoidance side while the center is blocked, radians.
    pub avoid_bias: f32,
    /// Radius around each sample checked for blocking entities.
    pub sample_radius: f32,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            angles: vec![-PI / 3.0, -PI / 6.0, 0.0, PI / 6.0, PI / 3.0],
            samples_per_probe: 4,
            probe_length: 3.0,
            repulsion_weight: 0.6,
            center_cone: PI / 12.0,
            min_throttle: 0.2,
            avoid_bias: PI / 2.0,
            sample_radius: 0.25,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct StuckConfig {
    pub window_seconds: f32,
    /// Displacement over one window below which the window counts as stuck.
    pub min_displacement: f32,
    pub windows_required: u32,
    pub recovery_seconds: f32,
    pub reverse_speed: f32,
    /// Maximum random heading offset applied when recovery starts, radians.
    pub heading_jitter: f32,
}

impl Default for StuckConfig {
    fn default() -> Self {
        Self {
            window_seconds: 0.5,
            min_displacement: 0.1,
            windows_required: 3,
            recovery_seconds: 0.6,
            reverse_speed: 1.0,
            heading_jitter: PI / 2.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct StandoffConfig {
    /// Inside this radius the unit withdraws.
    pub min_radius: f32,
    /// Between `min_radius` and this radius, with clear line of sight, the unit holds.
    pub hold_radius: f32,
}

impl Default for StandoffConfig {
    fn default() -> Self {
        Self {
            min_radius: 3.0,
            hold_radius: 6.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SteeringConfig {
    pub max_speed: f32,
    /// Radians per second.
    pub max_turn_rate: f32,
    /// Distance to the final target inside which speed ramps down.
    pub slow_radius: f32,
    pub sensors: SensorConfig,
    pub stuck: StuckConfig,
    pub standoff: StandoffConfig,
}

impl Default for SteeringConfig {
    fn default() -> Self {
        Self {
            max_speed: 4.0,
            max_turn_rate: PI,
            slow_radius: 1.0,
            sensors: SensorConfig::default(),
            stuck: StuckConfig::default(),
            standoff: StandoffConfig::default(),
        }
    }
}
