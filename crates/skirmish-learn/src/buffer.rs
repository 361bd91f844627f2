use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use skirmish_core::ActionId;
use skirmish_perception::PerceptionVector;

/// One transition. `terminal` marks the last step of an episode (no bootstrap).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Experience {
    pub state: PerceptionVector,
    pub action: ActionId,
    pub reward: f32,
    pub next_state: PerceptionVector,
    #[serde(default)]
    pub terminal: bool,
}

/// Bounded FIFO: pushing past capacity evicts the oldest entry. Training reads from it without
/// removing anything.
#[derive(Debug, Clone)]
pub struct ExperienceBuffer {
    items: VecDeque<Experience>,
    capacity: usize,
    pushed: u64,
}

impl ExperienceBuffer {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            items: VecDeque::with_capacity(capacity.min(4096)),
            capacity,
            pushed: 0,
        }
    }

    pub fn push(&mut self, experience: Experience) {
        while self.items.len() >= self.capacity {
            self.items.pop_front();
        }
        self.items.push_back(experience);
        self.pushed += 1;
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Total pushes over the buffer's lifetime, including evicted entries.
    pub fn total_pushed(&self) -> u64 {
        self.pushed
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Experience> + ExactSizeIterator + '_ {
        self.items.iter()
    }

    /// The `n` most recent experiences, oldest first.
    pub fn recent(&self, n: usize) -> Vec<Experience> {
        let skip = self.items.len().saturating_sub(n);
        self.items.iter().skip(skip).cloned().collect()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}
