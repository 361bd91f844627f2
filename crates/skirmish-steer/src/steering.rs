use core::f32::consts::PI;

use skirmish_core::{shortest_angle_delta, wrap_angle, DeterministicRng, Vec2};

use crate::sensors::{self, ObstacleProbe, Side};
use crate::{SteeringConfig, StuckDetector};

/// A defended high-value target the unit must keep its distance from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StandoffTarget {
    pub position: Vec2,
    pub line_of_sight: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SteeringInput {
    pub position: Vec2,
    pub heading: f32,
    /// Point to move toward (next waypoint or direct target). `None` stops the unit.
    pub target: Option<Vec2>,
    /// Commanded speed before throttling; capped at the configured max speed.
    pub desired_speed: f32,
    /// Ramp speed down when closing on `target` (final waypoint).
    pub arrive: bool,
    /// Move directly away from `target` instead of toward it.
    pub flee: bool,
    pub standoff: Option<StandoffTarget>,
}

impl SteeringInput {
    pub fn toward(position: Vec2, heading: f32, target: Vec2, desired_speed: f32) -> Self {
        Self {
            position,
            heading,
            target: Some(target),
            desired_speed,
            arrive: false,
            flee: false,
            standoff: None,
        }
    }

    pub fn stop(position: Vec2, heading: f32) -> Self {
        Self {
            position,
            heading,
            target: None,
            desired_speed: 0.0,
            arrive: false,
            flee: false,
            standoff: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SteeringOutput {
    pub heading: f32,
    /// Signed; negative while reversing out of a stuck spot.
    pub speed: f32,
    pub velocity: Vec2,
    pub avoid_side: Option<Side>,
    pub recovering: bool,
    pub holding: bool,
    pub withdrawing: bool,
}

/// Rotate `heading` toward `desired` by at most `max_step` radians.
pub fn turn_toward(heading: f32, desired: f32, max_step: f32) -> f32 {
    let max_step = max_step.max(0.0);
    let delta = shortest_angle_delta(heading, desired).clamp(-max_step, max_step);
    wrap_angle(heading + delta)
}

#[derive(Debug, Clone, Copy)]
struct Recovery {
    remaining: f32,
    heading: f32,
}

/// Per-agent steering state: held avoidance side, stuck detector and any active recovery.
#[derive(Debug, Clone)]
pub struct Steering {
    config: SteeringConfig,
    avoid_side: Option<Side>,
    stuck: StuckDetector,
    recovery: Option<Recovery>,
    last_speed: f32,
}

impl Steering {
    pub fn new(config: SteeringConfig) -> Self {
        Self {
            config,
            avoid_side: None,
            stuck: StuckDetector::new(),
            recovery: None,
            last_speed: 0.0,
        }
    }

    pub fn config(&self) -> &SteeringConfig {
        &self.config
    }

    pub fn avoid_side(&self) -> Option<Side> {
        self.avoid_side
    }

    pub fn stuck_detector(&self) -> &StuckDetector {
        &self.stuck
    }

    pub fn is_recovering(&self) -> bool {
        self.recovery.is_some()
    }

    /// Forget held side, stuck history and recovery (e.g. after a respawn).
    pub fn reset(&mut self) {
        self.avoid_side = None;
        self.stuck.reset();
        self.recovery = None;
        self.last_speed = 0.0;
    }

    /// One steering tick. The returned heading differs from `input.heading` by at most
    /// `max_turn_rate * dt`.
    pub fn steer<P, R>(
        &mut self,
        input: &SteeringInput,
        probe: &P,
        rng: &mut R,
        dt: f32,
    ) -> SteeringOutput
    where
        P: ObstacleProbe + ?Sized,
        R: DeterministicRng + ?Sized,
    {
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        let max_step = self.config.max_turn_rate.max(0.0) * dt;
        let heading = if input.heading.is_finite() {
            input.heading
        } else {
            0.0
        };

        if self
            .stuck
            .observe(&self.config.stuck, input.position, self.last_speed != 0.0, dt)
        {
            let jitter = self.config.stuck.heading_jitter.abs();
            let offset = rng.next_f32_range(-jitter, jitter);
            self.recovery = Some(Recovery {
                remaining: self.config.stuck.recovery_seconds.max(dt),
                heading: wrap_angle(heading + offset),
            });
            self.avoid_side = None;
        }

        if let Some(mut recovery) = self.recovery.take() {
            recovery.remaining -= dt;
            if recovery.remaining > 0.0 {
                self.recovery = Some(recovery);
            }
            let new_heading = turn_toward(heading, recovery.heading, max_step);
            let speed = -self.config.stuck.reverse_speed.abs();
            return self.finish(new_heading, speed, true, false, false);
        }

        let max_speed = self.config.max_speed.max(0.0);
        let mut speed = input.desired_speed.clamp(0.0, max_speed);

        if let Some(standoff) = input.standoff {
            let to_target = standoff.position - input.position;
            let dist = to_target.length();
            let band = &self.config.standoff;
            if dist < band.min_radius {
                let away = if dist > f32::EPSILON {
                    (-to_target).angle()
                } else {
                    heading + PI
                };
                speed = max_speed;
                let desired = self.avoid(input, heading, away, probe, &mut speed);
                let new_heading = turn_toward(heading, desired, max_step);
                return self.finish(new_heading, speed, false, false, true);
            }
            if dist <= band.hold_radius && standoff.line_of_sight {
                self.avoid_side = None;
                let new_heading = turn_toward(heading, to_target.angle(), max_step);
                return self.finish(new_heading, 0.0, false, true, false);
            }
        }

        let Some(target) = input.target else {
            self.avoid_side = None;
            return self.finish(heading, 0.0, false, false, false);
        };
        let offset = target - input.position;
        let dist = offset.length();
        if dist <= f32::EPSILON && !input.flee {
            self.avoid_side = None;
            return self.finish(heading, 0.0, false, false, false);
        }
        let base = if input.flee {
            if dist > f32::EPSILON {
                (-offset).angle()
            } else {
                heading + PI
            }
        } else {
            offset.angle()
        };

        if input.arrive && !input.flee && self.config.slow_radius > 0.0 {
            speed *= (dist / self.config.slow_radius).min(1.0);
        }

        let desired = self.avoid(input, heading, base, probe, &mut speed);
        let new_heading = turn_toward(heading, desired, max_step);
        self.finish(new_heading, speed, false, false, false)
    }

    /// Bias `base` by the sensor fan and throttle `speed` for a blocked center.
    fn avoid<P: ObstacleProbe + ?Sized>(
        &mut self,
        input: &SteeringInput,
        heading: f32,
        base: f32,
        probe: &P,
        speed: &mut f32,
    ) -> f32 {
        let sensors = &self.config.sensors;
        let scan = sensors::scan(sensors, input.position, heading, probe);

        let Some(hit) = scan.center_hit else {
            self.avoid_side = None;
            return base + scan.repulsion;
        };

        let side = match self.avoid_side {
            Some(side) => side,
            None => {
                let side = scan.clearer_side().unwrap_or_else(|| {
                    if shortest_angle_delta(heading, base) < 0.0 {
                        Side::Right
                    } else {
                        Side::Left
                    }
                });
                tracing::trace!(?side, "avoidance side chosen");
                side
            }
        };
        self.avoid_side = Some(side);

        let length = sensors.probe_length.max(f32::EPSILON);
        let samples = sensors.samples_per_probe.max(1) as f32;
        let closeness = ((length - hit) / length + 1.0 / samples).clamp(0.0, 1.0);
        let min_throttle = sensors.min_throttle.clamp(0.0, 1.0);
        *speed *= 1.0 - (1.0 - min_throttle) * closeness;

        heading + side.sign() * sensors.avoid_bias.abs() + scan.repulsion
    }

    fn finish(
        &mut self,
        heading: f32,
        speed: f32,
        recovering: bool,
        holding: bool,
        withdrawing: bool,
    ) -> SteeringOutput {
        self.last_speed = speed;
        SteeringOutput {
            heading,
            speed,
            velocity: Vec2::from_angle(heading) * speed,
            avoid_side: self.avoid_side,
            recovering,
            holding,
            withdrawing,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skirmish_core::SplitMix64;

    #[test]
    fn turn_toward_takes_the_short_way() {
        let h = turn_toward(3.0, -3.0, 0.1);
        assert!((h - 3.1).abs() < 1e-5);
        let h = turn_toward(0.0, 0.05, 0.1);
        assert!((h - 0.05).abs() < 1e-6);
    }

    #[test]
    fn no_target_means_stop() {
        let mut s = Steering::new(SteeringConfig::default());
        let mut rng = SplitMix64::new(1);
        let out = s.steer(
            &SteeringInput::stop(Vec2::ZERO, 0.5),
            &|_: Vec2| false,
            &mut rng,
            0.1,
        );
        assert_eq!(out.speed, 0.0);
        assert_eq!(out.heading, 0.5);
    }

    #[test]
    fn arrival_ramps_speed_down() {
        let mut s = Steering::new(SteeringConfig::default());
        let mut rng = SplitMix64::new(1);
        let mut input = SteeringInput::toward(Vec2::ZERO, 0.0, Vec2::new(0.5, 0.0), 4.0);
        input.arrive = true;
        let out = s.steer(&input, &|_: Vec2| false, &mut rng, 0.1);
        assert!((out.speed - 2.0).abs() < 1e-5);
    }
}
