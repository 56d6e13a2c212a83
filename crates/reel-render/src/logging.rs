//! Structured build logging utilities.
//!
//! Provides consistent, structured logging for assembly builds with
//! tracing spans and contextual information.

use tracing::{error, info, warn};

/// Build logger for structured logging with consistent formatting.
///
/// Carries the assembly ID and current stage so every line of a build is
/// attributable without threading context through each call site.
#[derive(Debug, Clone)]
pub struct BuildLogger {
    assembly_id: String,
    stage: String,
}

impl BuildLogger {
    /// Create a new logger for a specific assembly and stage.
    pub fn new(assembly_id: &str, stage: &str) -> Self {
        Self {
            assembly_id: assembly_id.to_string(),
            stage: stage.to_string(),
        }
    }

    /// Same assembly, different stage.
    pub fn stage(&self, stage: &str) -> Self {
        Self {
            assembly_id: self.assembly_id.clone(),
            stage: stage.to_string(),
        }
    }

    /// Log the start of a stage.
    pub fn log_start(&self, message: &str) {
        info!(
            assembly_id = %self.assembly_id,
            stage = %self.stage,
            "Stage started: {}", message
        );
    }

    /// Log a progress update.
    pub fn log_progress(&self, message: &str) {
        info!(
            assembly_id = %self.assembly_id,
            stage = %self.stage,
            "Stage progress: {}", message
        );
    }

    /// Log a warning.
    pub fn log_warning(&self, message: &str) {
        warn!(
            assembly_id = %self.assembly_id,
            stage = %self.stage,
            "Stage warning: {}", message
        );
    }

    /// Log an error.
    pub fn log_error(&self, message: &str) {
        error!(
            assembly_id = %self.assembly_id,
            stage = %self.stage,
            "Stage error: {}", message
        );
    }

    /// Log stage completion.
    pub fn log_completion(&self, message: &str) {
        info!(
            assembly_id = %self.assembly_id,
            stage = %self.stage,
            "Stage completed: {}", message
        );
    }

    /// The assembly ID.
    pub fn assembly_id(&self) -> &str {
        &self.assembly_id
    }
}
