use crate::AgentHandle;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Decision cadence: an agent thinks every `every_ticks` frames, offset so a squad does not
/// all think on the same frame. Steering still runs every frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ThinkSchedule {
    pub every_ticks: u32,
    pub offset_ticks: u32,
}

impl Default for ThinkSchedule {
    fn default() -> Self {
        Self {
            every_ticks: 1,
            offset_ticks: 0,
        }
    }
}

impl ThinkSchedule {
    pub fn deterministic(agent: AgentHandle, every_ticks: u32) -> Self {
        let every = every_ticks.max(1);
        let offset = (agent.stable_id() % (every as u64)) as u32;
        Self {
            every_ticks: every,
            offset_ticks: offset,
        }
    }

    pub fn should_think(&self, tick: u64) -> bool {
        let every = self.every_ticks.max(1) as u64;
        ((tick + (self.offset_ticks as u64)) % every) == 0
    }
}
