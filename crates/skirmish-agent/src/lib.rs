//! The per-unit control loop and the frame driver that runs a squad of units.
//!
//! A [`TacticalAgent`] runs perception, then a decision (reactive policy or lookahead planner,
//! on its think cadence), then pathfinding when the movement target changes or a recompute
//! trigger fires, then steering. It returns an [`AgentCommand`] and never fails: missing data
//! yields the idle command. [`Squad::step`] applies the commands to the world only after every
//! agent has computed its own.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

pub mod agent;
pub mod behavior;
pub mod config;
pub mod squad;

pub use agent::{AgentCommand, EpisodeStats, StepOutcome, TacticalAgent};
pub use behavior::{
    behavior_for, standard_plan, ActionPlan, ActionTuning, AgentDecision, ArchetypeBehavior,
    Exploder, Focus, MovementIntent, Standard,
};
pub use config::{ArchetypeConfig, BehaviorConfig, BrainKind, NavigationConfig};
pub use squad::{FrameReport, Squad};
