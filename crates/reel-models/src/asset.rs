//! Generated asset records and their approval lifecycle.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Type of a generated asset.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum AssetType {
    Image,
    Audio,
    Video,
    Figure,
}

impl AssetType {
    /// Get string representation of the type.
    pub fn as_str(&self) -> &'static str {
        match self {
            AssetType::Image => "image",
            AssetType::Audio => "audio",
            AssetType::Video => "video",
            AssetType::Figure => "figure",
        }
    }
}

impl fmt::Display for AssetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Approval state of an asset.
///
/// Legal transitions: `draft -> {review, approved, rejected}`,
/// `review -> {approved, rejected}`, `rejected -> revised`,
/// `revised -> draft`. Anything else is rejected with [`TransitionError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum AssetStatus {
    /// Freshly generated, not yet reviewed
    #[default]
    Draft,
    /// Submitted for human review
    Review,
    /// Approved for use in builds
    Approved,
    /// Rejected; excluded from builds until revised
    Rejected,
    /// Being reworked after rejection
    Revised,
}

impl AssetStatus {
    /// Get string representation of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            AssetStatus::Draft => "draft",
            AssetStatus::Review => "review",
            AssetStatus::Approved => "approved",
            AssetStatus::Rejected => "rejected",
            AssetStatus::Revised => "revised",
        }
    }

    /// Whether a transition to `next` is legal.
    pub fn can_transition_to(&self, next: AssetStatus) -> bool {
        use AssetStatus::*;
        matches!(
            (self, next),
            (Draft, Review)
                | (Draft, Approved)
                | (Draft, Rejected)
                | (Review, Approved)
                | (Review, Rejected)
                | (Rejected, Revised)
                | (Revised, Draft)
        )
    }

    /// Whether assets in this state count as active at build time.
    pub fn is_active(&self) -> bool {
        !matches!(self, AssetStatus::Rejected)
    }
}

impl fmt::Display for AssetStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Attempted an illegal status transition.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("Invalid asset status transition: {from} -> {to}")]
pub struct TransitionError {
    pub from: AssetStatus,
    pub to: AssetStatus,
}

/// Record of a single generated asset.
///
/// Owned by the registry; mutated only through validated status
/// transitions or idempotent registration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AssetRecord {
    /// Unique asset identifier
    pub asset_id: String,
    /// Kind of asset
    pub asset_type: AssetType,
    /// Current approval state
    pub status: AssetStatus,
    /// Script segment this asset belongs to
    pub segment_index: usize,
    /// Path to the asset file
    pub path: String,
    /// Provider/source tag (e.g. "sdxl", "figure_extractor", "tts")
    pub source: String,
    /// Generation cost in provider units
    pub cost: f64,
    /// When the record was first registered
    pub created_at: DateTime<Utc>,
    /// When the record was last mutated
    pub updated_at: DateTime<Utc>,
}

impl AssetRecord {
    /// Create a new draft record with fresh timestamps.
    pub fn new(
        asset_id: impl Into<String>,
        asset_type: AssetType,
        segment_index: usize,
        path: impl Into<String>,
        source: impl Into<String>,
        cost: f64,
    ) -> Self {
        let now = Utc::now();
        Self {
            asset_id: asset_id.into(),
            asset_type,
            status: AssetStatus::Draft,
            segment_index,
            path: path.into(),
            source: source.into(),
            cost,
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply a status transition, validating it against the legal graph.
    pub fn transition_to(&mut self, next: AssetStatus) -> Result<(), TransitionError> {
        if !self.status.can_transition_to(next) {
            return Err(TransitionError {
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        self.updated_at = Utc::now();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> AssetRecord {
        AssetRecord::new("asset-1", AssetType::Image, 0, "/tmp/a.png", "sdxl", 0.02)
    }

    #[test]
    fn test_new_record_is_draft() {
        let r = record();
        assert_eq!(r.status, AssetStatus::Draft);
        assert!(r.status.is_active());
    }

    #[test]
    fn test_legal_lifecycle() {
        let mut r = record();
        r.transition_to(AssetStatus::Review).unwrap();
        r.transition_to(AssetStatus::Rejected).unwrap();
        assert!(!r.status.is_active());
        r.transition_to(AssetStatus::Revised).unwrap();
        r.transition_to(AssetStatus::Draft).unwrap();
        r.transition_to(AssetStatus::Approved).unwrap();
        assert_eq!(r.status, AssetStatus::Approved);
    }

    #[test]
    fn test_illegal_transitions_rejected() {
        let mut r = record();
        r.transition_to(AssetStatus::Approved).unwrap();

        // Approved is terminal
        let err = r.transition_to(AssetStatus::Draft).unwrap_err();
        assert_eq!(err.from, AssetStatus::Approved);
        assert_eq!(err.to, AssetStatus::Draft);

        // Rejected cannot go straight back to draft
        let mut r = record();
        r.transition_to(AssetStatus::Rejected).unwrap();
        assert!(r.transition_to(AssetStatus::Draft).is_err());
        assert!(r.transition_to(AssetStatus::Approved).is_err());
    }

    #[test]
    fn test_transition_bumps_updated_at() {
        let mut r = record();
        let before = r.updated_at;
        r.transition_to(AssetStatus::Review).unwrap();
        assert!(r.updated_at >= before);
    }
}
