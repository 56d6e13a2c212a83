//! Render pipeline error types.

use thiserror::Error;

pub type RenderResult<T> = Result<T, RenderError>;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Planning failed: {0}")]
    Plan(#[from] reel_plan::PlanError),

    #[error("Registry error: {0}")]
    Registry(#[from] reel_registry::RegistryError),

    #[error("Media error: {0}")]
    Media(#[from] reel_media::MediaError),

    #[error("Segment {segment_index} render failed: {message}")]
    RenderFailed {
        segment_index: usize,
        message: String,
    },

    #[error("Concatenation failed: {0}")]
    Concatenation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl RenderError {
    pub fn render_failed(segment_index: usize, message: impl Into<String>) -> Self {
        Self::RenderFailed {
            segment_index,
            message: message.into(),
        }
    }
}
