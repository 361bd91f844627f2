//! Deterministic local steering: a fan of sensor probes around the current heading, a bounded
//! turn-rate controller, stuck detection with a short recovery maneuver, and the stand-off rule
//! near defended targets.
//!
//! Steering runs every tick, independent of how often the agent makes decisions.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

pub mod config;
pub mod sensors;
pub mod steering;
pub mod stuck;

pub use config::{SensorConfig, StandoffConfig, SteeringConfig, StuckConfig};
pub use sensors::{ObstacleProbe, SensorScan, Side, WorldProbe};
pub use steering::{turn_toward, StandoffTarget, Steering, SteeringInput, SteeringOutput};
pub use stuck::StuckDetector;
