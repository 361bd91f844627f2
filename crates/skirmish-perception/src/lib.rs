//! Perception: one fixed-length, normalized feature vector per agent per decision.
//!
//! [`extract_state`] is a pure read of the world. Every feature lies in `[0, 1]`; an absent
//! category reads as "maximum distance, zero count" rather than an error. A dead or missing
//! agent yields [`Unavailable`](skirmish_core::Unavailable) so the caller can fall back to idle.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

mod extract;
mod layout;

pub use extract::{extract_state, Observation, Percept, PerceptionConfig};
pub use layout::{features, PerceptionLayout, PerceptionVector};
