//! Planning error types.

use reel_models::budget::TierParseError;
use reel_models::segment::ScriptError;
use thiserror::Error;

pub type PlanResult<T> = Result<T, PlanError>;

/// Fatal planning errors. These fail the build before any manifest is
/// produced.
#[derive(Debug, Error)]
pub enum PlanError {
    #[error("Invalid script: {0}")]
    InvalidScript(#[from] ScriptError),

    #[error(transparent)]
    UnknownTier(#[from] TierParseError),

    #[error("Audio entries ({audio}) do not match script segments ({segments})")]
    AudioCountMismatch { audio: usize, segments: usize },
}
