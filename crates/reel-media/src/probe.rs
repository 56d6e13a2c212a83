//! FFprobe audio duration probe.

use async_trait::async_trait;
use serde::Deserialize;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;

use crate::error::{MediaError, MediaResult};

/// FFprobe JSON output format.
#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    format: FfprobeFormat,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
}

/// Probe a media file for its duration in seconds.
pub async fn probe_duration(path: impl AsRef<Path>) -> MediaResult<f64> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(MediaError::FileNotFound(path.to_path_buf()));
    }

    which::which("ffprobe").map_err(|_| MediaError::FfprobeNotFound)?;

    let output = Command::new("ffprobe")
        .args(["-v", "quiet", "-print_format", "json", "-show_format"])
        .arg(path)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await?;

    if !output.status.success() {
        return Err(MediaError::ffprobe_failed(
            "FFprobe failed",
            Some(String::from_utf8_lossy(&output.stderr).to_string()),
        ));
    }

    parse_duration(&output.stdout, path)
}

/// Parse the duration out of ffprobe's JSON output.
fn parse_duration(stdout: &[u8], path: &Path) -> MediaResult<f64> {
    let probe: FfprobeOutput = serde_json::from_slice(stdout)?;
    let duration = probe
        .format
        .duration
        .as_ref()
        .and_then(|d| d.parse::<f64>().ok())
        .ok_or_else(|| MediaError::InvalidAudio(format!("{} has no duration", path.display())))?;
    Ok(duration)
}

/// Duration-probe seam.
///
/// The pipeline depends on this trait rather than on ffprobe directly so
/// planning can be driven by a fake in tests.
#[async_trait]
pub trait DurationProbe: Send + Sync {
    /// Duration of the file in seconds.
    async fn duration_sec(&self, path: &Path) -> MediaResult<f64>;
}

/// The real probe, backed by ffprobe.
#[derive(Debug, Default, Clone)]
pub struct FfprobeDurationProbe;

#[async_trait]
impl DurationProbe for FfprobeDurationProbe {
    async fn duration_sec(&self, path: &Path) -> MediaResult<f64> {
        probe_duration(path).await
    }
}
