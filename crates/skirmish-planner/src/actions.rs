use core::fmt;

use skirmish_core::{ActionId, EntityHandle, Vec2};

use crate::{PlannerConfig, PlannerSnapshot};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanAction {
    Heal { target: EntityHandle },
    Debuff { target: EntityHandle },
    MoveToAlly { target: EntityHandle },
    Flee { from: EntityHandle },
    Wait,
}

impl PlanAction {
    pub fn id(self) -> ActionId {
        match self {
            PlanAction::Heal { .. } => ActionId::HealAlly,
            PlanAction::Debuff { .. } => ActionId::DebuffEnemy,
            PlanAction::MoveToAlly { .. } => ActionId::MoveToAlly,
            PlanAction::Flee { .. } => ActionId::Flee,
            PlanAction::Wait => ActionId::Wait,
        }
    }

    pub fn target(self) -> Option<EntityHandle> {
        match self {
            PlanAction::Heal { target }
            | PlanAction::Debuff { target }
            | PlanAction::MoveToAlly { target } => Some(target),
            PlanAction::Flee { from } => Some(from),
            PlanAction::Wait => None,
        }
    }

    /// Search order: heal, debuff, move, flee, wait.
    pub fn priority(self) -> u8 {
        match self {
            PlanAction::Heal { .. } => 0,
            PlanAction::Debuff { .. } => 1,
            PlanAction::MoveToAlly { .. } => 2,
            PlanAction::Flee { .. } => 3,
            PlanAction::Wait => 4,
        }
    }
}

impl fmt::Display for PlanAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.target() {
            Some(t) => write!(f, "{}({t})", self.id()),
            None => write!(f, "{}", self.id()),
        }
    }
}

/// Candidate actions for one ply, already in search order.
pub fn generate_actions(
    snapshot: &PlannerSnapshot,
    maximizing: bool,
    config: &PlannerConfig,
) -> Vec<PlanAction> {
    if !maximizing {
        return vec![PlanAction::Wait];
    }

    let me = snapshot.me.position;
    let mut out = Vec::new();

    if snapshot.heal_cooldown <= 0.0 {
        out.extend(
            snapshot
                .allies
                .iter()
                .filter(|a| a.is_alive() && a.health < 1.0)
                .filter(|a| me.distance(a.position) <= config.heal_range)
                .map(|a| PlanAction::Heal { target: a.handle }),
        );
    }

    if snapshot.debuff_cooldown <= 0.0 {
        out.extend(
            snapshot
                .enemies
                .iter()
                .filter(|e| e.is_alive() && !e.is_debuffed())
                .filter(|e| me.distance(e.position) <= config.debuff_range)
                .map(|e| PlanAction::Debuff { target: e.handle }),
        );
    }

    out.extend(
        snapshot
            .allies
            .iter()
            .filter(|a| a.is_alive() && a.health < 1.0)
            .filter(|a| me.distance(a.position) > config.heal_range)
            .map(|a| PlanAction::MoveToAlly { target: a.handle }),
    );

    let threat = snapshot
        .enemies
        .iter()
        .filter(|e| e.is_alive() && me.distance(e.position) <= config.danger_range)
        .min_by(|a, b| {
            me.distance_squared(a.position)
                .total_cmp(&me.distance_squared(b.position))
        });
    if let Some(enemy) = threat {
        out.push(PlanAction::Flee { from: enemy.handle });
    }

    out.push(PlanAction::Wait);
    out
}

fn step_toward(from: Vec2, to: Vec2, step: f32) -> Vec2 {
    let offset = to - from;
    let dist = offset.length();
    if dist <= step || dist <= f32::EPSILON {
        to
    } else {
        from + offset * (step / dist)
    }
}

/// Apply `action` to a copy of `snapshot` after advancing timers by one step.
pub fn simulate(
    snapshot: &PlannerSnapshot,
    action: PlanAction,
    config: &PlannerConfig,
) -> PlannerSnapshot {
    let mut next = snapshot.clone();
    let dt = config.step_seconds.max(0.0);
    next.heal_cooldown = (next.heal_cooldown - dt).max(0.0);
    next.debuff_cooldown = (next.debuff_cooldown - dt).max(0.0);
    for unit in next.allies.iter_mut().chain(next.enemies.iter_mut()) {
        unit.debuff_remaining = (unit.debuff_remaining - dt).max(0.0);
    }

    match action {
        PlanAction::Heal { target } => {
            if let Some(ally) = next.allies.iter_mut().find(|a| a.handle == target) {
                ally.health = (ally.health + config.heal_amount).min(1.0);
                next.heal_cooldown = config.heal_cooldown.max(0.0);
            }
        }
        PlanAction::Debuff { target } => {
            if let Some(enemy) = next.enemies.iter_mut().find(|e| e.handle == target) {
                enemy.debuff_remaining = config.debuff_duration.max(0.0);
                next.debuff_cooldown = config.debuff_cooldown.max(0.0);
            }
        }
        PlanAction::MoveToAlly { target } => {
            if let Some(ally) = snapshot.ally(target) {
                next.me.position = step_toward(next.me.position, ally.position, config.move_step);
            }
        }
        PlanAction::Flee { from } => {
            if let Some(enemy) = snapshot.enemy(from) {
                let away = (next.me.position - enemy.position).normalize_or_zero();
                let away = if away == Vec2::ZERO {
                    Vec2::new(1.0, 0.0)
                } else {
                    away
                };
                next.me.position = next.me.position + away * config.move_step;
            }
        }
        PlanAction::Wait => {}
    }
    next
}
