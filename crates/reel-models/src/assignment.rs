//! Visual assignment produced by the assigner.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::display_mode::DisplayMode;

/// Visual treatment chosen for one segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SegmentVisual {
    /// How the segment is displayed
    pub display_mode: DisplayMode,
    /// Short direction hint for the visual generator, keyed by intent
    pub direction_hint: String,
}

/// Mapping from segment index to its visual treatment.
///
/// Backed by a `BTreeMap` so that serialization is deterministic: identical
/// inputs must serialize to byte-identical assignments.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
pub struct VisualAssignment {
    /// Per-segment visual decisions, ordered by segment index
    pub segments: BTreeMap<usize, SegmentVisual>,
}

impl VisualAssignment {
    /// Create an empty assignment.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a decision for a segment.
    pub fn insert(&mut self, segment_index: usize, visual: SegmentVisual) {
        self.segments.insert(segment_index, visual);
    }

    /// Look up the decision for a segment.
    pub fn get(&self, segment_index: usize) -> Option<&SegmentVisual> {
        self.segments.get(&segment_index)
    }

    /// Display mode for a segment, if assigned.
    pub fn mode(&self, segment_index: usize) -> Option<DisplayMode> {
        self.segments.get(&segment_index).map(|v| v.display_mode)
    }

    /// Count segments assigned a given mode.
    pub fn count_mode(&self, mode: DisplayMode) -> usize {
        self.segments
            .values()
            .filter(|v| v.display_mode == mode)
            .count()
    }

    /// Number of assigned segments.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Whether the assignment is empty.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}
