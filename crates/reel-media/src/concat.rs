//! Final clip concatenation and audio muxing.

use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::info;

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};

/// Join rendered clips in order and mux the audio into the final output.
///
/// Uses the concat demuxer with stream copy for video: clips were all
/// encoded with the same settings, so the join is lossless and fast.
/// With a `master_audio` track the clips' own audio is replaced wholesale;
/// otherwise the per-segment audio already muxed into each clip is kept.
pub async fn concat_clips(
    clips: &[PathBuf],
    master_audio: Option<&Path>,
    output: &Path,
) -> MediaResult<()> {
    if clips.is_empty() {
        return Err(MediaError::ffmpeg_failed("No clips to concatenate", None, None));
    }
    for clip in clips {
        if !clip.exists() {
            return Err(MediaError::FileNotFound(clip.clone()));
        }
    }

    let list_dir = tempfile::tempdir()?;
    let list_path = list_dir.path().join("concat.txt");
    fs::write(&list_path, concat_list(clips)).await?;

    let mut cmd = FfmpegCommand::new(output)
        .input_with_args(&list_path, ["-f", "concat", "-safe", "0"]);

    cmd = match master_audio {
        Some(audio) => cmd
            .input(audio)
            .map("0:v")
            .map("1:a")
            .output_args(["-c:v", "copy", "-c:a", "aac"])
            .shortest(),
        None => cmd.output_args(["-c", "copy"]),
    };

    info!(
        clips = clips.len(),
        output = %output.display(),
        master_audio = master_audio.is_some(),
        "Concatenating clips"
    );
    FfmpegRunner::new().run(&cmd).await?;
    Ok(())
}

/// Build the concat-demuxer list file contents.
fn concat_list(clips: &[PathBuf]) -> String {
    let mut list = String::new();
    for clip in clips {
        // Single quotes in paths are closed, escaped, and reopened per
        // the concat demuxer's quoting rules.
        let escaped = clip.to_string_lossy().replace('\'', "'\\''");
        list.push_str(&format!("file '{escaped}'\n"));
    }
    list
}
