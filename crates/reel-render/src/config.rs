//! Render configuration.

use std::time::Duration;

use reel_models::EncodingConfig;

/// Render configuration.
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Maximum concurrent FFmpeg segment renders
    pub max_parallel_renders: usize,
    /// Per-attempt timeout for a single segment render
    pub segment_timeout: Duration,
    /// Work directory for clips and scratch files
    pub work_dir: String,
    /// Duration substituted when the audio probe fails
    pub default_duration_sec: f64,
    /// Output encoding settings shared by every clip
    pub encoding: EncodingConfig,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            max_parallel_renders: 4,
            segment_timeout: Duration::from_secs(120),
            work_dir: "/tmp/reelforge".to_string(),
            default_duration_sec: 3.0,
            encoding: EncodingConfig::default(),
        }
    }
}

impl RenderConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            max_parallel_renders: std::env::var("RENDER_MAX_PARALLEL")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(4),
            segment_timeout: Duration::from_secs(
                std::env::var("RENDER_SEGMENT_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(120),
            ),
            work_dir: std::env::var("RENDER_WORK_DIR")
                .unwrap_or_else(|_| "/tmp/reelforge".to_string()),
            default_duration_sec: std::env::var("RENDER_DEFAULT_DURATION_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(3.0),
            encoding: match std::env::var("RENDER_CRF").ok().and_then(|s| s.parse().ok()) {
                Some(crf) => EncodingConfig::default().with_crf(crf),
                None => EncodingConfig::default(),
            },
        }
    }

    /// Directory holding rendered (and cached) segment clips.
    ///
    /// Clip filenames are content-addressed, so this directory is shared
    /// across builds and doubles as the skip-existing render cache.
    pub fn clips_dir(&self) -> std::path::PathBuf {
        std::path::Path::new(&self.work_dir).join("clips")
    }

    /// Scratch directory for in-progress render output.
    pub fn scratch_dir(&self) -> std::path::PathBuf {
        std::path::Path::new(&self.work_dir).join("scratch")
    }

    /// Timeout in whole seconds, as the FFmpeg runner expects.
    pub fn segment_timeout_secs(&self) -> u64 {
        self.segment_timeout.as_secs().max(1)
    }
}
