//! Assembly manifest: the authoritative timing-and-asset plan.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::asset::AssetStatus;
use crate::budget::BudgetTier;
use crate::display_mode::DisplayMode;

/// Tolerance for duration-sum consistency checks, in seconds.
pub const DURATION_TOLERANCE_SEC: f64 = 1e-3;

/// Round a timestamp to milliseconds for stable serialization.
pub fn round3(seconds: f64) -> f64 {
    (seconds * 1000.0).round() / 1000.0
}

/// Degradations recorded against a segment during planning or rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum SegmentFlag {
    /// No active visual asset was found at plan time
    MissingVisual,
    /// The active visual asset was rejected before the build
    RejectedVisual,
    /// No audio file was available; a silent placeholder was used
    MissingAudio,
    /// The duration probe failed; the configured default was substituted
    DefaultDuration,
    /// Rendering failed twice; a placeholder clip was substituted
    RenderPlaceholder,
}

impl SegmentFlag {
    pub fn as_str(&self) -> &'static str {
        match self {
            SegmentFlag::MissingVisual => "missing_visual",
            SegmentFlag::RejectedVisual => "rejected_visual",
            SegmentFlag::MissingAudio => "missing_audio",
            SegmentFlag::DefaultDuration => "default_duration",
            SegmentFlag::RenderPlaceholder => "render_placeholder",
        }
    }
}

impl fmt::Display for SegmentFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Reference to the visual asset used for a segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct VisualRef {
    /// Path to the visual file, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Provider/source tag
    pub source: String,
    /// Approval status at plan time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<AssetStatus>,
}

impl VisualRef {
    /// A reference for segments rendered without a visual asset.
    pub fn none() -> Self {
        Self {
            path: None,
            source: "none".to_string(),
            status: None,
        }
    }
}

/// Reference to the audio narration used for a segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AudioRef {
    /// Path to the audio file, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Measured (or defaulted) duration in seconds
    pub duration_sec: f64,
    /// Provider/source tag
    pub source: String,
}

impl AudioRef {
    /// A silent placeholder of the given duration.
    pub fn silence(duration_sec: f64) -> Self {
        Self {
            path: None,
            duration_sec,
            source: "silence".to_string(),
        }
    }
}

/// One entry of the assembly manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AssemblySegment {
    /// Script segment index
    pub segment_index: usize,
    /// Final display mode (after plan-time downgrades)
    pub display_mode: DisplayMode,
    /// Segment start on the master timeline, seconds
    pub start_time: f64,
    /// Segment end on the master timeline, seconds
    pub end_time: f64,
    /// Narration text, carried for text rendering and captions
    pub text: String,
    /// Visual asset reference
    pub visual: VisualRef,
    /// Audio narration reference
    pub audio: AudioRef,
    /// Degradations applied to this segment
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub flags: Vec<SegmentFlag>,
}

impl AssemblySegment {
    /// Segment duration in seconds.
    pub fn duration(&self) -> f64 {
        self.end_time - self.start_time
    }

    /// Record a degradation flag (deduplicated).
    pub fn flag(&mut self, flag: SegmentFlag) {
        if !self.flags.contains(&flag) {
            self.flags.push(flag);
        }
    }
}

/// The ordered, time-stamped build plan for one assembly.
///
/// Created fresh per build and immutable once rendering begins; a new
/// build produces a new manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AssemblyManifest {
    /// Unique id for this build
    pub assembly_id: String,
    /// When the manifest was created
    pub created_at: DateTime<Utc>,
    /// Budget tier the build was planned under
    pub tier: BudgetTier,
    /// Total timeline duration in seconds
    pub total_duration_sec: f64,
    /// Segments in timeline order
    pub segments: Vec<AssemblySegment>,
}

impl AssemblyManifest {
    /// Create a manifest with a fresh assembly id.
    pub fn new(tier: BudgetTier, segments: Vec<AssemblySegment>) -> Self {
        let total_duration_sec = round3(segments.iter().map(|s| s.duration()).sum());
        Self {
            assembly_id: Uuid::new_v4().to_string(),
            created_at: Utc::now(),
            tier,
            total_duration_sec,
            segments,
        }
    }

    /// Check that segment windows are contiguous and non-overlapping.
    pub fn validate_monotonic(&self) -> bool {
        let mut cursor = 0.0f64;
        for segment in &self.segments {
            if (segment.start_time - cursor).abs() > DURATION_TOLERANCE_SEC {
                return false;
            }
            if segment.end_time < segment.start_time {
                return false;
            }
            cursor = segment.end_time;
        }
        true
    }

    /// Check that the duration sum matches `total_duration_sec`.
    pub fn duration_consistent(&self) -> bool {
        let sum: f64 = self.segments.iter().map(|s| s.duration()).sum();
        (sum - self.total_duration_sec).abs() <= DURATION_TOLERANCE_SEC
    }
}
