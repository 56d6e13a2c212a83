//! Pure planning stages for the Reelforge assembly engine.
//!
//! Two stages, both deterministic and free of I/O:
//! - [`VisualAssigner`]: decides each segment's visual treatment under the
//!   budget tier ("DoP").
//! - [`TimelinePlanner`]: combines the assignment with measured audio
//!   durations into an ordered, time-stamped assembly manifest.
//!
//! Planning-logic errors here are bugs and fatal; asset degradation is
//! handled by downgrading segments and flagging them, never by failing
//! the build.

pub mod assigner;
pub mod error;
pub mod planner;

pub use assigner::VisualAssigner;
pub use error::{PlanError, PlanResult};
pub use planner::{PlannerConfig, SegmentAudio, TimelinePlanner};
