//! Error taxonomy of the control core.
//!
//! None of these escape a per-agent update: missing data falls back to an idle command, model
//! faults fall back to rules, search bounds return the best partial result and persistence
//! failures are only logged.

use thiserror::Error;

use crate::AgentHandle;

/// A component the agent needs this frame is absent (usually: the unit died mid-frame).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("agent {handle} unavailable: missing {component}")]
pub struct Unavailable {
    pub handle: AgentHandle,
    pub component: &'static str,
}

impl Unavailable {
    pub fn new(handle: AgentHandle, component: &'static str) -> Self {
        Self { handle, component }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    #[error("input length mismatch: expected {expected}, got {actual}")]
    ShapeMismatch { expected: usize, actual: usize },

    #[error("model produced a non-finite value")]
    NonFinite,

    #[error("model has not been trained")]
    NotTrained,

    #[error("action {0} is not scored by this model")]
    UnknownAction(crate::ActionId),

    #[error("corrupt model: {0}")]
    Corrupt(String),
}

/// A bounded search stopped at its cap. The search still returns its best-so-far result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("search stopped after {expanded} expansions (cap {cap})")]
pub struct SearchBound {
    pub expanded: usize,
    pub cap: usize,
}

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to encode model: {0}")]
    Encode(String),

    #[error("failed to decode model: {0}")]
    Decode(String),

    #[error("model format {found} is not supported (expected {expected})")]
    Version { expected: u32, found: u32 },
}
