//! Learning side of the control core.
//!
//! - [`DecisionPolicy`]: epsilon-greedy over a learned [`Estimator`] with an ordered rule table as
//!   the always-available fallback.
//! - [`ExperienceBuffer`]: bounded FIFO of `(state, action, reward, next_state)` transitions.
//! - [`BackgroundTrainer`]: fits a model copy off the frame loop.
//! - [`RewardShaper`]: additive, clamped reward from state deltas and effect events.
//! - [`StrategySelector`]: rolling success tracking per named profile.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

pub mod buffer;
pub mod estimator;
pub mod persist;
pub mod policy;
pub mod reward;
pub mod strategy;
pub mod trainer;

pub use buffer::{Experience, ExperienceBuffer};
pub use estimator::{Estimator, FitParams, FitReport, LinearQModel};
pub use persist::{MemoryModelStore, ModelMetadata, ModelStore, MODEL_FORMAT_VERSION};
pub use policy::{
    Decision, DecisionPolicy, DecisionSource, PolicyConfig, PolicyMode, RuleThresholds,
};
pub use reward::{RewardBreakdown, RewardEvents, RewardShaper, RewardSnapshot, RewardWeights};
pub use strategy::{
    StrategyConfig, StrategyModifiers, StrategyProfile, StrategySelector, StrategySwitch,
};
pub use trainer::{BackgroundTrainer, TrainingMode};
