//! Script segments and narration intents.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Narration intent of a script segment.
///
/// Closed category assigned by the upstream script generator; drives the
/// visual-direction hint lookup in the assigner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum SegmentIntent {
    /// Opening segment of the script
    Intro,
    /// Bridge between topics
    Transition,
    /// A claim or thesis statement
    Claim,
    /// Supporting evidence for a claim
    Evidence,
    /// Narration that references a specific source figure
    FigureReference,
    /// A worked example or illustration
    Example,
    /// A recap of preceding material
    Summary,
    /// Closing segment
    Outro,
}

impl SegmentIntent {
    /// Returns the intent name as used in serialized documents.
    pub fn as_str(&self) -> &'static str {
        match self {
            SegmentIntent::Intro => "intro",
            SegmentIntent::Transition => "transition",
            SegmentIntent::Claim => "claim",
            SegmentIntent::Evidence => "evidence",
            SegmentIntent::FigureReference => "figure_reference",
            SegmentIntent::Example => "example",
            SegmentIntent::Summary => "summary",
            SegmentIntent::Outro => "outro",
        }
    }
}

impl fmt::Display for SegmentIntent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SegmentIntent {
    type Err = IntentParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "intro" => Ok(SegmentIntent::Intro),
            "transition" => Ok(SegmentIntent::Transition),
            "claim" => Ok(SegmentIntent::Claim),
            "evidence" => Ok(SegmentIntent::Evidence),
            "figure_reference" => Ok(SegmentIntent::FigureReference),
            "example" => Ok(SegmentIntent::Example),
            "summary" => Ok(SegmentIntent::Summary),
            "outro" => Ok(SegmentIntent::Outro),
            _ => Err(IntentParseError(s.to_string())),
        }
    }
}

#[derive(Debug, Error)]
#[error("Unknown segment intent: {0}")]
pub struct IntentParseError(String);

/// A single narrated segment of the script.
///
/// Created by the external script generator; immutable once handed to the
/// assembly core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Segment {
    /// Stable segment identifier
    pub id: String,
    /// Position in the script, 0-based and contiguous
    pub order_index: usize,
    /// Narration text
    pub text: String,
    /// Narration intent
    pub intent: SegmentIntent,
    /// External figure id this segment narrates, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub figure_ref: Option<String>,
    /// Importance in [0, 1]; drives budget ranking
    pub importance_score: f64,
}

impl Segment {
    /// Validate a single segment.
    pub fn validate(&self) -> Result<(), ScriptError> {
        if self.id.is_empty() {
            return Err(ScriptError::EmptyId(self.order_index));
        }
        if self.text.trim().is_empty() {
            return Err(ScriptError::EmptyText(self.order_index));
        }
        if !(0.0..=1.0).contains(&self.importance_score) || !self.importance_score.is_finite() {
            return Err(ScriptError::ImportanceOutOfRange {
                order_index: self.order_index,
                score: self.importance_score,
            });
        }
        Ok(())
    }
}

/// An ordered script document handed in by the script generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Script {
    /// Segments in narration order
    pub segments: Vec<Segment>,
}

impl Script {
    /// Create a script, validating segment ordering and contents.
    pub fn new(segments: Vec<Segment>) -> Result<Self, ScriptError> {
        let script = Self { segments };
        script.validate()?;
        Ok(script)
    }

    /// Validate the whole script.
    ///
    /// Segments must be non-empty, individually valid, and ordered with
    /// `order_index` contiguous from 0.
    pub fn validate(&self) -> Result<(), ScriptError> {
        if self.segments.is_empty() {
            return Err(ScriptError::Empty);
        }
        for (i, segment) in self.segments.iter().enumerate() {
            segment.validate()?;
            if segment.order_index != i {
                return Err(ScriptError::OrderMismatch {
                    position: i,
                    order_index: segment.order_index,
                });
            }
        }
        Ok(())
    }

    /// Number of segments.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Whether the script has no segments.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

/// Validation errors for script input.
///
/// These are fatal: a malformed script fails the build before any manifest
/// is produced.
#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("Script has no segments")]
    Empty,

    #[error("Segment at position {0} has an empty id")]
    EmptyId(usize),

    #[error("Segment at position {0} has empty text")]
    EmptyText(usize),

    #[error("Segment {order_index} importance_score {score} outside [0, 1]")]
    ImportanceOutOfRange { order_index: usize, score: f64 },

    #[error("Segment at position {position} has order_index {order_index} (must be contiguous from 0)")]
    OrderMismatch { position: usize, order_index: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segment(order_index: usize) -> Segment {
        Segment {
            id: format!("seg_{order_index}"),
            order_index,
            text: "Some narration.".to_string(),
            intent: SegmentIntent::Claim,
            figure_ref: None,
            importance_score: 0.5,
        }
    }

    #[test]
    fn test_valid_script() {
        let script = Script::new(vec![segment(0), segment(1), segment(2)]).unwrap();
        assert_eq!(script.len(), 3);
    }

    #[test]
    fn test_empty_script_rejected() {
        assert!(matches!(Script::new(vec![]), Err(ScriptError::Empty)));
    }

    #[test]
    fn test_non_contiguous_order_rejected() {
        let result = Script::new(vec![segment(0), segment(2)]);
        assert!(matches!(
            result,
            Err(ScriptError::OrderMismatch { position: 1, order_index: 2 })
        ));
    }

    #[test]
    fn test_importance_out_of_range_rejected() {
        let mut s = segment(0);
        s.importance_score = 1.5;
        assert!(matches!(
            Script::new(vec![s]),
            Err(ScriptError::ImportanceOutOfRange { .. })
        ));
    }

    #[test]
    fn test_intent_roundtrip() {
        for intent in [
            SegmentIntent::Intro,
            SegmentIntent::Transition,
            SegmentIntent::Claim,
            SegmentIntent::Evidence,
            SegmentIntent::FigureReference,
            SegmentIntent::Example,
            SegmentIntent::Summary,
            SegmentIntent::Outro,
        ] {
            assert_eq!(intent.as_str().parse::<SegmentIntent>().unwrap(), intent);
        }
        assert!("narrate".parse::<SegmentIntent>().is_err());
    }
}
