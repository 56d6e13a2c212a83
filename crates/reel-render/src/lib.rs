//! Segment rendering and final assembly for Reelforge.
//!
//! This crate hosts the I/O half of the engine:
//! - [`SegmentRenderer`]: renders each manifest entry to a fixed-duration
//!   clip on a bounded worker pool, with timeout, one retry, and a
//!   placeholder fallback.
//! - [`Concatenator`]: joins all clips behind a completion barrier and
//!   writes the final media plus the manifest used.
//! - [`AssemblyPipeline`]: wires assignment, duration probing, planning,
//!   rendering, and concatenation into one build.

pub mod cache;
pub mod concatenator;
pub mod config;
pub mod error;
pub mod logging;
pub mod pipeline;
pub mod renderer;

pub use cache::RenderCache;
pub use concatenator::{Concatenator, FinalOutput};
pub use config::RenderConfig;
pub use error::{RenderError, RenderResult};
pub use logging::BuildLogger;
pub use pipeline::{AssemblyPipeline, BuildOutput};
pub use renderer::{RenderedSegment, SegmentRenderer};
