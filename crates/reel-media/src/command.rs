//! FFmpeg command builder and runner.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::error::{MediaError, MediaResult};

/// One FFmpeg input with its per-input arguments (the ones before `-i`).
#[derive(Debug, Clone)]
struct FfmpegInput {
    args: Vec<String>,
    path: String,
}

/// Builder for FFmpeg commands.
///
/// Supports multiple inputs because segment rendering pairs a looped
/// still image (or a synthetic source) with a narration track.
#[derive(Debug, Clone)]
pub struct FfmpegCommand {
    /// Input files in order
    inputs: Vec<FfmpegInput>,
    /// Output file path
    output: PathBuf,
    /// Output arguments (between inputs and output path)
    output_args: Vec<String>,
    /// Whether to overwrite output
    overwrite: bool,
    /// Log level
    log_level: String,
}

impl FfmpegCommand {
    /// Create a new FFmpeg command for the given output.
    pub fn new(output: impl AsRef<Path>) -> Self {
        Self {
            inputs: Vec::new(),
            output: output.as_ref().to_path_buf(),
            output_args: Vec::new(),
            overwrite: true,
            log_level: "error".to_string(),
        }
    }

    /// Add a plain file input.
    pub fn input(self, path: impl AsRef<Path>) -> Self {
        self.input_with_args(path, Vec::<String>::new())
    }

    /// Add a file input with per-input arguments (placed before `-i`).
    pub fn input_with_args<I, S>(mut self, path: impl AsRef<Path>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.inputs.push(FfmpegInput {
            args: args.into_iter().map(Into::into).collect(),
            path: path.as_ref().to_string_lossy().to_string(),
        });
        self
    }

    /// Add a still image input looped for the whole output duration.
    pub fn looped_image(self, path: impl AsRef<Path>) -> Self {
        self.input_with_args(path, ["-loop", "1"])
    }

    /// Add a lavfi synthetic input (e.g. `color=...` or `anullsrc=...`).
    pub fn lavfi(mut self, spec: impl Into<String>) -> Self {
        self.inputs.push(FfmpegInput {
            args: vec!["-f".to_string(), "lavfi".to_string()],
            path: spec.into(),
        });
        self
    }

    /// Add an output argument.
    pub fn output_arg(mut self, arg: impl Into<String>) -> Self {
        self.output_args.push(arg.into());
        self
    }

    /// Add multiple output arguments.
    pub fn output_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.output_args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Set output duration.
    pub fn duration(self, seconds: f64) -> Self {
        self.output_arg("-t").output_arg(format!("{seconds:.3}"))
    }

    /// Stop at the shortest input.
    pub fn shortest(self) -> Self {
        self.output_arg("-shortest")
    }

    /// Set video filter.
    pub fn video_filter(self, filter: impl Into<String>) -> Self {
        self.output_arg("-vf").output_arg(filter)
    }

    /// Map a stream into the output.
    pub fn map(self, spec: impl Into<String>) -> Self {
        self.output_arg("-map").output_arg(spec)
    }

    /// Set log level.
    pub fn log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Build the command arguments.
    pub fn build_args(&self) -> Vec<String> {
        let mut args = Vec::new();

        if self.overwrite {
            args.push("-y".to_string());
        }

        args.push("-v".to_string());
        args.push(self.log_level.clone());

        for input in &self.inputs {
            args.extend(input.args.clone());
            args.push("-i".to_string());
            args.push(input.path.clone());
        }

        args.extend(self.output_args.clone());
        args.push(self.output.to_string_lossy().to_string());

        args
    }

    /// The output path.
    pub fn output_path(&self) -> &Path {
        &self.output
    }
}

/// Runner for FFmpeg commands with an optional timeout.
#[derive(Debug, Default)]
pub struct FfmpegRunner {
    /// Timeout in seconds
    timeout_secs: Option<u64>,
}

impl FfmpegRunner {
    /// Create a new runner.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    /// Run an FFmpeg command to completion.
    pub async fn run(&self, cmd: &FfmpegCommand) -> MediaResult<()> {
        which::which("ffmpeg").map_err(|_| MediaError::FfmpegNotFound)?;

        let args = cmd.build_args();
        debug!("Running FFmpeg: ffmpeg {}", args.join(" "));

        let mut child = Command::new("ffmpeg")
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let output = if let Some(timeout_secs) = self.timeout_secs {
            let wait = tokio::time::timeout(
                std::time::Duration::from_secs(timeout_secs),
                child.wait_with_output(),
            );
            match wait.await {
                Ok(result) => result?,
                Err(_) => {
                    warn!(
                        timeout_secs,
                        output = %cmd.output_path().display(),
                        "FFmpeg timed out, killing process"
                    );
                    return Err(MediaError::Timeout(timeout_secs));
                }
            }
        } else {
            child.wait_with_output().await?
        };

        if output.status.success() {
            Ok(())
        } else {
            Err(MediaError::ffmpeg_failed(
                "FFmpeg exited with non-zero status",
                Some(String::from_utf8_lossy(&output.stderr).to_string()),
                output.status.code(),
            ))
        }
    }
}

/// Executor seam for built commands.
///
/// Rendering logic depends on this trait rather than spawning ffmpeg
/// directly, so retry and fallback behavior can be driven by a fake
/// without ffmpeg on the host (same seam shape as `DurationProbe`).
#[async_trait]
pub trait ClipEncoder: Send + Sync {
    /// Execute the command to completion.
    async fn encode(&self, cmd: &FfmpegCommand) -> MediaResult<()>;
}

#[async_trait]
impl ClipEncoder for FfmpegRunner {
    async fn encode(&self, cmd: &FfmpegCommand) -> MediaResult<()> {
        self.run(cmd).await
    }
}

/// Check if FFmpeg is available.
pub fn check_ffmpeg() -> MediaResult<PathBuf> {
    which::which("ffmpeg").map_err(|_| MediaError::FfmpegNotFound)
}

/// Check if FFprobe is available.
pub fn check_ffprobe() -> MediaResult<PathBuf> {
    which::which("ffprobe").map_err(|_| MediaError::FfprobeNotFound)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_builder_single_input() {
        let cmd = FfmpegCommand::new("out.mp4")
            .input("in.wav")
            .duration(3.5)
            .output_args(["-c:a", "aac"]);

        let args = cmd.build_args();
        assert_eq!(args.first().map(String::as_str), Some("-y"));
        assert!(args.contains(&"-i".to_string()));
        assert!(args.contains(&"in.wav".to_string()));
        assert!(args.contains(&"-t".to_string()));
        assert!(args.contains(&"3.500".to_string()));
        assert_eq!(args.last().map(String::as_str), Some("out.mp4"));
    }

    #[test]
    fn test_looped_image_args_precede_input() {
        let cmd = FfmpegCommand::new("out.mp4")
            .looped_image("visual.png")
            .input("audio.wav");

        let args = cmd.build_args();
        let loop_pos = args.iter().position(|a| a == "-loop").unwrap();
        let image_pos = args.iter().position(|a| a == "visual.png").unwrap();
        let audio_pos = args.iter().position(|a| a == "audio.wav").unwrap();
        assert!(loop_pos < image_pos);
        assert!(image_pos < audio_pos);
    }

    #[test]
    fn test_lavfi_input() {
        let cmd = FfmpegCommand::new("out.mp4").lavfi("color=c=black:s=1920x1080");
        let args = cmd.build_args();
        let f_pos = args.iter().position(|a| a == "-f").unwrap();
        assert_eq!(args[f_pos + 1], "lavfi");
        assert!(args.contains(&"color=c=black:s=1920x1080".to_string()));
    }

    #[test]
    fn test_map_and_filter() {
        let cmd = FfmpegCommand::new("out.mp4")
            .input("a.mp4")
            .input("b.wav")
            .map("0:v")
            .map("1:a")
            .video_filter("scale=1920:1080");

        let args = cmd.build_args();
        assert_eq!(args.iter().filter(|a| *a == "-map").count(), 2);
        assert!(args.contains(&"-vf".to_string()));
    }
}
