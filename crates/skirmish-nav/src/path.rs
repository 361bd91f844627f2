use std::collections::VecDeque;

use skirmish_core::{AgentHandle, EntityFilter, EntityKind, Vec2, WorldQuery};

/// Waypoints owned by one agent. The head is popped as it is reached.
#[derive(Debug, Clone, PartialEq)]
pub struct Path {
    waypoints: VecDeque<Vec2>,
    target: Vec2,
    age_seconds: f32,
}

impl Path {
    pub fn new(waypoints: Vec<Vec2>, target: Vec2) -> Self {
        Self {
            waypoints: waypoints.into(),
            target,
            age_seconds: 0.0,
        }
    }

    pub fn empty(target: Vec2) -> Self {
        Self::new(Vec::new(), target)
    }

    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    /// The target this path was planned toward.
    pub fn target(&self) -> Vec2 {
        self.target
    }

    pub fn age_seconds(&self) -> f32 {
        self.age_seconds
    }

    pub fn waypoints(&self) -> impl Iterator<Item = Vec2> + '_ {
        self.waypoints.iter().copied()
    }

    pub fn next_waypoint(&self) -> Option<Vec2> {
        self.waypoints.front().copied()
    }

    pub fn tick(&mut self, dt: f32) {
        self.age_seconds += dt.max(0.0);
    }

    /// Pop every head waypoint within `arrival_radius` of `position` and return the new head.
    pub fn advance(&mut self, position: Vec2, arrival_radius: f32) -> Option<Vec2> {
        let r2 = arrival_radius.max(0.0) * arrival_radius.max(0.0);
        while let Some(head) = self.waypoints.front() {
            if head.distance_squared(position) <= r2 {
                self.waypoints.pop_front();
            } else {
                break;
            }
        }
        self.next_waypoint()
    }

    /// Total remaining length from `position` through every waypoint.
    pub fn remaining_length(&self, position: Vec2) -> f32 {
        let mut total = 0.0;
        let mut prev = position;
        for wp in self.waypoints.iter() {
            total += prev.distance(*wp);
            prev = *wp;
        }
        total
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecomputeReason {
    TargetMoved,
    TimerElapsed,
    Obstructed,
}

/// When a held path should be thrown away and replanned.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecomputePolicy {
    /// Replan when the target moved further than this since planning.
    pub target_moved_distance: f32,
    /// Replan when the path is older than this.
    pub interval_seconds: f32,
    /// How many upcoming waypoints to scan for new blockers.
    pub lookahead_waypoints: usize,
    /// Radius around each scanned waypoint that must be clear of blocking entities.
    pub probe_radius: f32,
}

impl Default for RecomputePolicy {
    fn default() -> Self {
        Self {
            target_moved_distance: 2.0,
            interval_seconds: 3.0,
            lookahead_waypoints: 3,
            probe_radius: 0.5,
        }
    }
}

impl RecomputePolicy {
    pub fn check<W: WorldQuery + ?Sized>(
        &self,
        path: &Path,
        current_target: Vec2,
        world: &W,
        owner: AgentHandle,
    ) -> Option<RecomputeReason> {
        if path.target().distance(current_target) > self.target_moved_distance {
            return Some(RecomputeReason::TargetMoved);
        }
        if path.age_seconds() >= self.interval_seconds {
            return Some(RecomputeReason::TimerElapsed);
        }

        let filter = EntityFilter::kind(EntityKind::Obstacle)
            .with_kind(EntityKind::Unit)
            .excluding(owner);
        let blocked = path
            .waypoints()
            .take(self.lookahead_waypoints)
            .any(|wp| {
                world
                    .entities_in_radius(wp, self.probe_radius, &filter)
                    .iter()
                    .any(|e| e.blocks_movement)
            });
        if blocked {
            return Some(RecomputeReason::Obstructed);
        }
        None
    }
}
