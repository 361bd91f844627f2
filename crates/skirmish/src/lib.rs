//! Umbrella crate that re-exports the `skirmish-*` building blocks.
//!
//! Each component sits behind a cargo feature of the same name; `full` (the default) enables all
//! of them. Start with [`arena`] for a runnable scenario or [`agent`] to drive units in your own
//! world.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

#[cfg(feature = "core")]
#[cfg_attr(docsrs, doc(cfg(feature = "core")))]
pub use skirmish_core as core;

#[cfg(feature = "perception")]
#[cfg_attr(docsrs, doc(cfg(feature = "perception")))]
pub use skirmish_perception as perception;

#[cfg(feature = "nav")]
#[cfg_attr(docsrs, doc(cfg(feature = "nav")))]
pub use skirmish_nav as nav;

#[cfg(feature = "steer")]
#[cfg_attr(docsrs, doc(cfg(feature = "steer")))]
pub use skirmish_steer as steer;

#[cfg(feature = "learn")]
#[cfg_attr(docsrs, doc(cfg(feature = "learn")))]
pub use skirmish_learn as learn;

#[cfg(feature = "planner")]
#[cfg_attr(docsrs, doc(cfg(feature = "planner")))]
pub use skirmish_planner as planner;

#[cfg(feature = "agent")]
#[cfg_attr(docsrs, doc(cfg(feature = "agent")))]
pub use skirmish_agent as agent;

#[cfg(feature = "arena")]
#[cfg_attr(docsrs, doc(cfg(feature = "arena")))]
pub use skirmish_arena as arena;

#[cfg(doc)]
pub mod guides {
    #![allow(clippy::all)]

    #[doc = include_str!("../../../docs/guides/control-loop.md")]
    pub mod control_loop {}
}
