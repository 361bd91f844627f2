use core::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Closed vocabulary of discrete actions a unit can choose.
///
/// Each archetype declares the subset it may use as an [`ActionSet`]; decision components only
/// ever return members of that set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ActionId {
    Idle,
    Patrol,
    Approach,
    Attack,
    Retreat,
    Strafe,
    UseAbility,
    Collect,
    Hold,
    HealAlly,
    DebuffEnemy,
    MoveToAlly,
    Flee,
    Wait,
}

impl ActionId {
    pub const ALL: [ActionId; 14] = [
        ActionId::Idle,
        ActionId::Patrol,
        ActionId::Approach,
        ActionId::Attack,
        ActionId::Retreat,
        ActionId::Strafe,
        ActionId::UseAbility,
        ActionId::Collect,
        ActionId::Hold,
        ActionId::HealAlly,
        ActionId::DebuffEnemy,
        ActionId::MoveToAlly,
        ActionId::Flee,
        ActionId::Wait,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ActionId::Idle => "idle",
            ActionId::Patrol => "patrol",
            ActionId::Approach => "approach",
            ActionId::Attack => "attack",
            ActionId::Retreat => "retreat",
            ActionId::Strafe => "strafe",
            ActionId::UseAbility => "use_ability",
            ActionId::Collect => "collect",
            ActionId::Hold => "hold",
            ActionId::HealAlly => "heal_ally",
            ActionId::DebuffEnemy => "debuff_enemy",
            ActionId::MoveToAlly => "move_to_ally",
            ActionId::Flee => "flee",
            ActionId::Wait => "wait",
        }
    }

    /// Whether choosing this action implies no movement target.
    pub fn is_stationary(self) -> bool {
        matches!(
            self,
            ActionId::Idle | ActionId::Hold | ActionId::Wait | ActionId::UseAbility
        )
    }
}

impl fmt::Display for ActionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Ordered, duplicate-free, non-empty set of actions available to one archetype.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "Vec<ActionId>", into = "Vec<ActionId>"))]
pub struct ActionSet {
    actions: Vec<ActionId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("an action set must contain at least one action")]
pub struct EmptyActionSet;

impl ActionSet {
    pub fn new(actions: impl IntoIterator<Item = ActionId>) -> Result<Self, EmptyActionSet> {
        let mut out: Vec<ActionId> = Vec::new();
        for a in actions {
            if !out.contains(&a) {
                out.push(a);
            }
        }
        if out.is_empty() {
            return Err(EmptyActionSet);
        }
        Ok(Self { actions: out })
    }

    /// Default set for reactive combat units.
    pub fn combat() -> Self {
        Self {
            actions: vec![
                ActionId::Patrol,
                ActionId::Approach,
                ActionId::Attack,
                ActionId::Retreat,
                ActionId::Strafe,
                ActionId::UseAbility,
                ActionId::Collect,
            ],
        }
    }

    /// Default set for the support role driven by the lookahead planner.
    pub fn support() -> Self {
        Self {
            actions: vec![
                ActionId::HealAlly,
                ActionId::DebuffEnemy,
                ActionId::MoveToAlly,
                ActionId::Flee,
                ActionId::Wait,
            ],
        }
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn contains(&self, action: ActionId) -> bool {
        self.actions.contains(&action)
    }

    pub fn get(&self, index: usize) -> Option<ActionId> {
        self.actions.get(index).copied()
    }

    pub fn index_of(&self, action: ActionId) -> Option<usize> {
        self.actions.iter().position(|a| *a == action)
    }

    pub fn iter(&self) -> impl Iterator<Item = ActionId> + '_ {
        self.actions.iter().copied()
    }

    pub fn as_slice(&self) -> &[ActionId] {
        &self.actions
    }

    /// First member of the set. Always exists.
    pub fn first(&self) -> ActionId {
        self.actions[0]
    }
}

impl TryFrom<Vec<ActionId>> for ActionSet {
    type Error = EmptyActionSet;

    fn try_from(value: Vec<ActionId>) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ActionSet> for Vec<ActionId> {
    fn from(value: ActionSet) -> Self {
        value.actions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_set_is_rejected() {
        assert_eq!(ActionSet::new([]), Err(EmptyActionSet));
    }

    #[test]
    fn duplicates_collapse_in_order() {
        let set = ActionSet::new([ActionId::Attack, ActionId::Retreat, ActionId::Attack]).unwrap();
        assert_eq!(set.as_slice(), &[ActionId::Attack, ActionId::Retreat]);
        assert_eq!(set.index_of(ActionId::Retreat), Some(1));
    }
}
