//! Shared data models for the Reelforge assembly engine.
//!
//! This crate provides Serde-serializable types for:
//! - Script segments and narration intents
//! - Display modes and budget tiers
//! - Asset records and their approval lifecycle
//! - Visual assignments and assembly manifests
//! - Encoding configuration

pub mod asset;
pub mod assignment;
pub mod budget;
pub mod display_mode;
pub mod encoding;
pub mod manifest;
pub mod segment;

// Re-export common types
pub use asset::{AssetRecord, AssetStatus, AssetType, TransitionError};
pub use assignment::{SegmentVisual, VisualAssignment};
pub use budget::BudgetTier;
pub use display_mode::DisplayMode;
pub use encoding::EncodingConfig;
pub use manifest::{
    round3, AssemblyManifest, AssemblySegment, AudioRef, SegmentFlag, VisualRef,
};
pub use segment::{Script, ScriptError, Segment, SegmentIntent};
