use skirmish_core::{AgentHandle, EntityFilter, EntityKind, Vec2, WorldQuery};

use crate::SensorConfig;

/// Point-occupancy test used by the sensor fan.
pub trait ObstacleProbe {
    fn is_blocked(&self, point: Vec2) -> bool;
}

impl<F> ObstacleProbe for F
where
    F: Fn(Vec2) -> bool,
{
    fn is_blocked(&self, point: Vec2) -> bool {
        self(point)
    }
}

/// Probe over a [`WorldQuery`]: a point is blocked when its tile is not walkable or a
/// movement-blocking entity (other than `owner`) overlaps it.
pub struct WorldProbe<'a, W: ?Sized> {
    world: &'a W,
    owner: AgentHandle,
    sample_radius: f32,
}

impl<'a, W: WorldQuery + ?Sized> WorldProbe<'a, W> {
    pub fn new(world: &'a W, owner: AgentHandle, sample_radius: f32) -> Self {
        Self {
            world,
            owner,
            sample_radius: sample_radius.max(0.0),
        }
    }
}

impl<W: WorldQuery + ?Sized> ObstacleProbe for WorldProbe<'_, W> {
    fn is_blocked(&self, point: Vec2) -> bool {
        if !self.world.bounds().contains(point) || !self.world.tile_at(point).is_walkable() {
            return true;
        }
        let filter = EntityFilter::kind(EntityKind::Obstacle)
            .with_kind(EntityKind::Unit)
            .excluding(self.owner);
        self.world
            .entities_in_radius(point, self.sample_radius, &filter)
            .iter()
            .any(|e| e.blocks_movement && e.position.distance(point) <= e.radius + self.sample_radius)
    }
}

/// Avoidance side relative to the heading. `Left` turns counter-clockwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub fn sign(self) -> f32 {
        match self {
            Side::Left => 1.0,
            Side::Right => -1.0,
        }
    }

    pub fn opposite(self) -> Side {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }
}

/// Result of one sweep of the sensor fan.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SensorScan {
    /// Signed heading bias in radians; positive turns left.
    pub repulsion: f32,
    /// Summed blocked weight on probes left of the heading.
    pub left_weight: f32,
    pub right_weight: f32,
    /// Distance to the closest blocked center-forward sample, if any.
    pub center_hit: Option<f32>,
}

impl SensorScan {
    pub fn center_blocked(&self) -> bool {
        self.center_hit.is_some()
    }

    /// The side with less blocked weight, or `None` on a tie.
    pub fn clearer_side(&self) -> Option<Side> {
        if self.left_weight < self.right_weight {
            Some(Side::Left)
        } else if self.right_weight < self.left_weight {
            Some(Side::Right)
        } else {
            None
        }
    }
}

/// Sweep every probe of the fan from `position` around `heading`.
///
/// Each probe stops at its first blocked sample. That sample contributes `1 - d / length` of
/// repulsion, pushing away from the probe's side. Probes within the center cone feed
/// `center_hit` and split their weight evenly between both sides.
pub fn scan<P: ObstacleProbe + ?Sized>(
    config: &SensorConfig,
    position: Vec2,
    heading: f32,
    probe: &P,
) -> SensorScan {
    let mut out = SensorScan::default();
    let samples = config.samples_per_probe.max(1);
    let length = config.probe_length.max(f32::EPSILON);

    for &offset in &config.angles {
        let dir = Vec2::from_angle(heading + offset);
        let is_center = offset.abs() <= config.center_cone;
        for k in 1..=samples {
            let d = length * k as f32 / samples as f32;
            if !probe.is_blocked(position + dir * d) {
                continue;
            }
            let strength = (1.0 - d / length).max(0.0) + 1.0 / samples as f32;
            if is_center {
                out.center_hit = Some(out.center_hit.map_or(d, |c: f32| c.min(d)));
                out.left_weight += strength * 0.5;
                out.right_weight += strength * 0.5;
            } else if offset > 0.0 {
                out.left_weight += strength;
                out.repulsion -= strength;
            } else {
                out.right_weight += strength;
                out.repulsion += strength;
            }
            break;
        }
    }
    out.repulsion *= config.repulsion_weight;
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn left_obstacle_pushes_right() {
        let config = SensorConfig::default();
        // Everything with y > 0.5 is blocked: only left probes hit.
        let probe = |p: Vec2| p.y > 0.5;
        let s = scan(&config, Vec2::ZERO, 0.0, &probe);
        assert!(s.repulsion < 0.0);
        assert!(s.left_weight > s.right_weight);
        assert!(!s.center_blocked());
        assert_eq!(s.clearer_side(), Some(Side::Right));
    }

    #[test]
    fn closer_hits_weigh_more() {
        let config = SensorConfig::default();
        let near = scan(&config, Vec2::ZERO, 0.0, &|p: Vec2| p.x > 0.5);
        let far = scan(&config, Vec2::ZERO, 0.0, &|p: Vec2| p.x > 2.0);
        assert!(near.center_hit.unwrap() < far.center_hit.unwrap());
        assert!(near.left_weight > far.left_weight);
    }

    #[test]
    fn open_ground_is_quiet() {
        let s = scan(&SensorConfig::default(), Vec2::ZERO, 1.0, &|_: Vec2| false);
        assert_eq!(s, SensorScan::default());
        assert_eq!(s.clearer_side(), None);
    }
}
