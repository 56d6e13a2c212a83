//! Visual display modes for assembled segments.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// How a segment is presented visually.
///
/// Closed variant; the renderer dispatches on it exhaustively, so adding a
/// mode is a compile-time checked change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum DisplayMode {
    /// Show the source figure this segment narrates, time-aligned to it
    FigureSync,
    /// Show a freshly generated visual with a slow Ken Burns zoom
    Generated,
    /// Reuse the nearest preceding segment's visual as a static hold
    CarryForward,
    /// Progressive word-by-word text highlight over a plain background
    TextOnly,
}

impl DisplayMode {
    /// Returns the mode name as used in filenames and manifests.
    pub fn as_str(&self) -> &'static str {
        match self {
            DisplayMode::FigureSync => "figure_sync",
            DisplayMode::Generated => "generated",
            DisplayMode::CarryForward => "carry_forward",
            DisplayMode::TextOnly => "text_only",
        }
    }

    /// Whether this mode requires a visual asset file to render.
    pub fn requires_visual(&self) -> bool {
        matches!(
            self,
            DisplayMode::FigureSync | DisplayMode::Generated | DisplayMode::CarryForward
        )
    }
}

impl fmt::Display for DisplayMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for DisplayMode {
    type Err = DisplayModeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "figure_sync" => Ok(DisplayMode::FigureSync),
            "generated" => Ok(DisplayMode::Generated),
            "carry_forward" => Ok(DisplayMode::CarryForward),
            "text_only" => Ok(DisplayMode::TextOnly),
            _ => Err(DisplayModeParseError(s.to_string())),
        }
    }
}

#[derive(Debug, Error)]
#[error("Unknown display mode: {0}")]
pub struct DisplayModeParseError(String);
