use core::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Generation-checked reference into the world's entity store.
///
/// Handles are plain values: holding one never keeps an entity alive. When the slot at `index`
/// is reused the store bumps its generation, so a stale handle fails the lookup instead of
/// silently aliasing a new entity.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EntityHandle {
    pub index: u32,
    pub generation: u32,
}

/// Handle to a controllable unit. Units live in the same store as every other entity.
pub type AgentHandle = EntityHandle;

impl EntityHandle {
    pub const fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Stable numeric id for seeding and logs.
    pub fn stable_id(self) -> u64 {
        ((self.generation as u64) << 32) | self.index as u64
    }
}

impl fmt::Debug for EntityHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}v{}", self.index, self.generation)
    }
}

impl fmt::Display for EntityHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stable_id_distinguishes_generations() {
        let a = EntityHandle::new(3, 0);
        let b = EntityHandle::new(3, 1);
        assert_ne!(a.stable_id(), b.stable_id());
        assert_eq!(a.stable_id(), 3);
    }
}
