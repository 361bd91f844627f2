use skirmish_core::{ActionId, EffectKind, EffectRequest, EntityHandle, EntityRef, Vec2};
use skirmish_perception::Observation;

use crate::{ArchetypeConfig, BehaviorConfig};

/// The entity a decision is about, with its last known position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Focus {
    pub handle: EntityHandle,
    pub position: Vec2,
    pub radius: f32,
    /// Defended target: approach under the stand-off rule.
    pub high_value: bool,
}

impl From<&EntityRef> for Focus {
    fn from(e: &EntityRef) -> Self {
        Self {
            handle: e.handle,
            position: e.position,
            radius: e.radius,
            high_value: e.high_value,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AgentDecision {
    pub action: ActionId,
    pub focus: Option<Focus>,
}

impl AgentDecision {
    pub fn new(action: ActionId) -> Self {
        Self {
            action,
            focus: None,
        }
    }

    /// Decision for `action`, focused on whatever the observation offers for it.
    pub fn from_observation(action: ActionId, obs: &Observation) -> Self {
        let focus = match action {
            ActionId::Approach => obs.nearest_enemy.or(obs.defended).or(obs.objective),
            ActionId::Attack
            | ActionId::Retreat
            | ActionId::Strafe
            | ActionId::UseAbility
            | ActionId::DebuffEnemy
            | ActionId::Flee => obs.nearest_enemy,
            ActionId::Collect => obs.nearest_resource,
            ActionId::HealAlly => obs.weakest_ally,
            ActionId::MoveToAlly => obs.weakest_ally.or(obs.nearest_ally),
            ActionId::Idle | ActionId::Patrol | ActionId::Hold | ActionId::Wait => None,
        };
        Self {
            action,
            focus: focus.as_ref().map(Focus::from),
        }
    }

    /// Update the focus position if the observation still sees it.
    pub fn refresh(&mut self, obs: &Observation) {
        let Some(focus) = self.focus.as_mut() else {
            return;
        };
        let seen = [
            obs.nearest_enemy,
            obs.nearest_ally,
            obs.weakest_ally,
            obs.nearest_resource,
            obs.defended,
            obs.objective,
        ];
        if let Some(e) = seen.iter().flatten().find(|e| e.handle == focus.handle) {
            *focus = Focus::from(e);
        }
    }
}

/// How the unit should move this tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MovementIntent {
    Stay,
    Patrol,
    MoveTo { point: Vec2, arrive: bool },
    /// Close on a target; `standoff` applies the hold/withdraw radii.
    Engage { point: Vec2, standoff: bool },
    Flee { from: Vec2 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ActionPlan {
    pub intent: MovementIntent,
    pub effects: Vec<EffectRequest>,
}

impl ActionPlan {
    pub fn moving(intent: MovementIntent) -> Self {
        Self {
            intent,
            effects: Vec::new(),
        }
    }

    pub fn with_effect(mut self, effect: EffectRequest) -> Self {
        self.effects.push(effect);
        self
    }
}

/// Ranges and slots the action mapping needs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActionTuning {
    pub near_range: f32,
    pub heal_range: f32,
    pub debuff_range: f32,
    pub ability_slot: usize,
    pub heal_slot: usize,
    pub debuff_slot: usize,
    /// Sideways step used by strafing.
    pub strafe_step: f32,
}

impl ActionTuning {
    pub fn from_config(config: &ArchetypeConfig) -> Self {
        Self {
            near_range: config.perception.near_range,
            heal_range: config.planner.heal_range,
            debuff_range: config.planner.debuff_range,
            ability_slot: 0,
            heal_slot: config.planner.heal_slot,
            debuff_slot: config.planner.debuff_slot,
            strafe_step: 2.0,
        }
    }
}

impl Default for ActionTuning {
    fn default() -> Self {
        Self::from_config(&ArchetypeConfig::default())
    }
}

fn in_reach(me: Vec2, focus: &Focus, range: f32) -> bool {
    me.distance(focus.position) <= range + focus.radius.max(0.0)
}

/// Shared mapping from an action to movement and effect requests.
pub fn standard_plan(
    decision: &AgentDecision,
    obs: &Observation,
    tuning: &ActionTuning,
) -> ActionPlan {
    let me = obs.position();
    let focus = decision.focus;

    match (decision.action, focus) {
        (ActionId::Idle | ActionId::Hold | ActionId::Wait, _) => {
            ActionPlan::moving(MovementIntent::Stay)
        }
        (ActionId::Patrol, _) => ActionPlan::moving(MovementIntent::Patrol),

        (ActionId::Approach, Some(f)) => ActionPlan::moving(MovementIntent::Engage {
            point: f.position,
            standoff: f.high_value,
        }),

        (ActionId::Attack, Some(f)) => {
            let plan = ActionPlan::moving(MovementIntent::Engage {
                point: f.position,
                standoff: f.high_value,
            });
            if in_reach(me, &f, tuning.near_range) {
                plan.with_effect(EffectRequest::on(EffectKind::Attack, f.handle))
            } else {
                plan
            }
        }

        (ActionId::Retreat, Some(f)) => match obs.nearest_ally {
            Some(ally) if ally.position.distance(f.position) > me.distance(f.position) => {
                ActionPlan::moving(MovementIntent::MoveTo {
                    point: ally.position,
                    arrive: true,
                })
            }
            _ => ActionPlan::moving(MovementIntent::Flee { from: f.position }),
        },

        (ActionId::Flee, Some(f)) => ActionPlan::moving(MovementIntent::Flee { from: f.position }),

        (ActionId::Strafe, Some(f)) => {
            let radial = (me - f.position).normalize_or_zero();
            let side = Vec2::new(-radial.y, radial.x);
            ActionPlan::moving(MovementIntent::MoveTo {
                point: me + side * tuning.strafe_step,
                arrive: false,
            })
        }

        (ActionId::UseAbility, target) => {
            let kind = EffectKind::Ability {
                slot: tuning.ability_slot,
            };
            let effect = match target {
                Some(f) => EffectRequest::on(kind, f.handle),
                None => EffectRequest::untargeted(kind),
            };
            ActionPlan::moving(MovementIntent::Stay).with_effect(effect)
        }

        (ActionId::Collect, Some(f)) => {
            let plan = ActionPlan::moving(MovementIntent::MoveTo {
                point: f.position,
                arrive: true,
            });
            if in_reach(me, &f, tuning.near_range) {
                plan.with_effect(EffectRequest::on(EffectKind::Collect, f.handle))
            } else {
                plan
            }
        }

        (ActionId::HealAlly, Some(f)) => {
            if in_reach(me, &f, tuning.heal_range) {
                ActionPlan::moving(MovementIntent::Stay).with_effect(EffectRequest::on(
                    EffectKind::Heal {
                        slot: tuning.heal_slot,
                    },
                    f.handle,
                ))
            } else {
                ActionPlan::moving(MovementIntent::MoveTo {
                    point: f.position,
                    arrive: true,
                })
            }
        }

        (ActionId::DebuffEnemy, Some(f)) => {
            if in_reach(me, &f, tuning.debuff_range) {
                ActionPlan::moving(MovementIntent::Stay).with_effect(EffectRequest::on(
                    EffectKind::Debuff {
                        slot: tuning.debuff_slot,
                    },
                    f.handle,
                ))
            } else {
                ActionPlan::moving(MovementIntent::Engage {
                    point: f.position,
                    standoff: false,
                })
            }
        }

        (ActionId::MoveToAlly, Some(f)) => ActionPlan::moving(MovementIntent::MoveTo {
            point: f.position,
            arrive: true,
        }),

        // Nothing to act on: approach falls back to patrolling, the rest hold still.
        (ActionId::Approach, None) => ActionPlan::moving(MovementIntent::Patrol),
        (_, None) => ActionPlan::moving(MovementIntent::Stay),
    }
}

/// Archetype-specific effects layered over the shared control loop.
pub trait ArchetypeBehavior {
    fn name(&self) -> &str;

    /// Map the held decision to movement and effect requests. Effects are only forwarded on
    /// ticks where a new decision was made.
    fn interpret(
        &mut self,
        decision: &AgentDecision,
        obs: &Observation,
        tuning: &ActionTuning,
    ) -> ActionPlan {
        standard_plan(decision, obs, tuning)
    }

    /// Effect fired on any tick regardless of the decision cadence (contact triggers).
    fn reflex(&mut self, _obs: &Observation) -> Option<EffectRequest> {
        None
    }

    /// Forget per-life state on respawn.
    fn reset(&mut self) {}
}

impl<B: ArchetypeBehavior + ?Sized> ArchetypeBehavior for Box<B> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn interpret(
        &mut self,
        decision: &AgentDecision,
        obs: &Observation,
        tuning: &ActionTuning,
    ) -> ActionPlan {
        (**self).interpret(decision, obs, tuning)
    }

    fn reflex(&mut self, obs: &Observation) -> Option<EffectRequest> {
        (**self).reflex(obs)
    }

    fn reset(&mut self) {
        (**self).reset()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Standard;

impl ArchetypeBehavior for Standard {
    fn name(&self) -> &str {
        "standard"
    }
}

/// Charges enemies directly (no stand-off) and detonates once when one comes within reach.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Exploder {
    pub trigger_range: f32,
    pub blast_radius: f32,
    pub blast_damage: f32,
    detonated: bool,
}

impl Exploder {
    pub fn new(trigger_range: f32, blast_radius: f32, blast_damage: f32) -> Self {
        Self {
            trigger_range,
            blast_radius,
            blast_damage,
            detonated: false,
        }
    }

    pub fn has_detonated(&self) -> bool {
        self.detonated
    }
}

impl ArchetypeBehavior for Exploder {
    fn name(&self) -> &str {
        "exploder"
    }

    fn interpret(
        &mut self,
        decision: &AgentDecision,
        obs: &Observation,
        tuning: &ActionTuning,
    ) -> ActionPlan {
        match (decision.action, obs.nearest_enemy) {
            (ActionId::Approach | ActionId::Attack, Some(enemy)) => {
                ActionPlan::moving(MovementIntent::Engage {
                    point: enemy.position,
                    standoff: false,
                })
            }
            _ => standard_plan(decision, obs, tuning),
        }
    }

    fn reflex(&mut self, obs: &Observation) -> Option<EffectRequest> {
        if self.detonated {
            return None;
        }
        let enemy = obs.nearest_enemy?;
        let reach = self.trigger_range + enemy.radius.max(0.0) + obs.status.radius.max(0.0);
        if obs.position().distance(enemy.position) > reach {
            return None;
        }
        self.detonated = true;
        tracing::debug!(agent = %obs.status.handle, target = %enemy.handle, "exploder detonating");
        Some(EffectRequest::at(
            EffectKind::Explode {
                radius: self.blast_radius,
                damage: self.blast_damage,
            },
            obs.position(),
        ))
    }

    fn reset(&mut self) {
        self.detonated = false;
    }
}

/// Behavior object for a configured archetype.
pub fn behavior_for(config: &BehaviorConfig) -> Box<dyn ArchetypeBehavior> {
    match *config {
        BehaviorConfig::Standard => Box::new(Standard),
        BehaviorConfig::Exploder {
            trigger_range,
            blast_radius,
            blast_damage,
        } => Box::new(Exploder::new(trigger_range, blast_radius, blast_damage)),
    }
}
