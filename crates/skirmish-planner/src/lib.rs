//! Lookahead planner for the support role.
//!
//! A [`PlannerSnapshot`] is a small deep copy of the neighborhood (self, nearby allies and
//! enemies). [`search`] runs depth-bounded alpha-beta over it with a hard node budget and
//! returns the best action found, even when the budget cuts the search short.
//!
//! The minimizing side only ever plays [`PlanAction::Wait`]: the search is a depth-limited
//! self-simulation rather than full two-player minimax.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

mod actions;
mod config;
mod planner;
mod search;
mod snapshot;

pub use actions::{generate_actions, simulate, PlanAction};
pub use config::{EvaluationWeights, PlannerConfig};
pub use planner::{LookaheadPlanner, PlannerDecision};
pub use search::{evaluate, search, SearchResult};
pub use snapshot::{PlannerSnapshot, PlannerUnit};
