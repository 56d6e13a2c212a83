//! Parallel segment rendering.
//!
//! Each manifest entry becomes one fixed-duration clip. Renders run on a
//! semaphore-bounded pool, write to scratch paths, and publish with an
//! atomic move so the content-addressed cache never sees partial output.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures::future::join_all;
use tokio::fs;
use tokio::sync::Semaphore;
use tracing::debug;
use uuid::Uuid;

use reel_media::{
    ken_burns_filter, move_file, placeholder_filter, static_hold_filter, word_highlight_filter,
    ClipEncoder, FfmpegCommand, FfmpegRunner, MediaError, MediaResult,
};
use reel_models::{AssemblyManifest, AssemblySegment, DisplayMode};

use crate::cache::RenderCache;
use crate::config::RenderConfig;
use crate::error::{RenderError, RenderResult};
use crate::logging::BuildLogger;

/// Background color for text-only segments.
const TEXT_BACKGROUND: &str = "0x101018";

/// Maximum caption length on placeholder clips.
const CAPTION_MAX_CHARS: usize = 60;

/// Outcome of rendering one segment.
#[derive(Debug, Clone)]
pub struct RenderedSegment {
    /// Index into the manifest
    pub segment_index: usize,
    /// Published clip location
    pub clip_path: PathBuf,
    /// Clip already existed in the cache; no FFmpeg run happened
    pub skipped: bool,
    /// Both render attempts failed; a placeholder clip was substituted
    pub placeholder: bool,
}

/// Renders manifest segments to clips with bounded parallelism.
///
/// A segment is attempted at most twice (one retry after a failure,
/// timeout, or failed publish); if both attempts fail, a placeholder
/// clip takes its place so one bad segment never sinks the whole
/// assembly.
pub struct SegmentRenderer<E: ClipEncoder> {
    config: RenderConfig,
    encoder: E,
}

impl SegmentRenderer<FfmpegRunner> {
    /// Renderer backed by ffmpeg with the configured per-attempt timeout.
    pub fn new(config: RenderConfig) -> Self {
        let encoder = FfmpegRunner::new().with_timeout(config.segment_timeout_secs());
        Self { config, encoder }
    }
}

impl<E: ClipEncoder> SegmentRenderer<E> {
    /// Renderer with a custom encoder.
    pub fn with_encoder(config: RenderConfig, encoder: E) -> Self {
        Self { config, encoder }
    }

    /// Render every segment of the manifest, in parallel up to the
    /// configured limit. The returned vec is in manifest order.
    pub async fn render_all(
        &self,
        manifest: &AssemblyManifest,
    ) -> RenderResult<Vec<RenderedSegment>> {
        let clips_dir = self.config.clips_dir();
        let scratch_dir = self.config.scratch_dir();
        fs::create_dir_all(&clips_dir).await?;
        fs::create_dir_all(&scratch_dir).await?;

        let logger = BuildLogger::new(&manifest.assembly_id, "render");
        logger.log_start(&format!(
            "Rendering {} segments ({} parallel)",
            manifest.segments.len(),
            self.config.max_parallel_renders
        ));

        let semaphore = Arc::new(Semaphore::new(self.config.max_parallel_renders.max(1)));
        let futures = manifest.segments.iter().map(|segment| {
            let semaphore = Arc::clone(&semaphore);
            let clips_dir = clips_dir.clone();
            let scratch_dir = scratch_dir.clone();
            let logger = logger.clone();
            async move {
                let _permit = semaphore.acquire().await.map_err(|_| {
                    RenderError::render_failed(segment.segment_index, "render pool closed")
                })?;
                self.render_segment(segment, &clips_dir, &scratch_dir, &logger)
                    .await
            }
        });

        let results: Vec<RenderedSegment> = join_all(futures)
            .await
            .into_iter()
            .collect::<RenderResult<_>>()?;

        let skipped = results.iter().filter(|r| r.skipped).count();
        let placeholders = results.iter().filter(|r| r.placeholder).count();
        logger.log_completion(&format!(
            "{} clips ready ({} cached, {} placeholders)",
            results.len(),
            skipped,
            placeholders
        ));
        Ok(results)
    }

    /// Render one segment, consulting the cache first.
    async fn render_segment(
        &self,
        segment: &AssemblySegment,
        clips_dir: &Path,
        scratch_dir: &Path,
        logger: &BuildLogger,
    ) -> RenderResult<RenderedSegment> {
        let clip_path = RenderCache::clip_path(clips_dir, segment);

        if fs::try_exists(&clip_path).await? {
            debug!(
                segment_index = segment.segment_index,
                clip = %clip_path.display(),
                "Cache hit, skipping render"
            );
            return Ok(RenderedSegment {
                segment_index: segment.segment_index,
                clip_path,
                skipped: true,
                placeholder: false,
            });
        }

        let scratch = scratch_dir.join(format!(
            "seg_{:03}_{}.part.mp4",
            segment.segment_index,
            Uuid::new_v4()
        ));

        // An attempt covers encode and publish together; a clip that
        // rendered but could not be moved into place counts as failed.
        for attempt in 1..=2u32 {
            match self.render_and_publish(segment, &scratch, &clip_path).await {
                Ok(()) => {
                    return Ok(RenderedSegment {
                        segment_index: segment.segment_index,
                        clip_path,
                        skipped: false,
                        placeholder: false,
                    });
                }
                Err(e) => {
                    logger.log_warning(&format!(
                        "Segment {} render attempt {attempt} failed: {e}",
                        segment.segment_index
                    ));
                }
            }
        }

        // Both attempts failed; the placeholder keeps the timeline intact.
        logger.log_warning(&format!(
            "Segment {} falling back to placeholder clip",
            segment.segment_index
        ));
        self.render_placeholder(segment, &scratch)
            .await
            .map_err(|e| RenderError::render_failed(segment.segment_index, e.to_string()))?;
        move_file(&scratch, &clip_path).await?;

        Ok(RenderedSegment {
            segment_index: segment.segment_index,
            clip_path,
            skipped: false,
            placeholder: true,
        })
    }

    /// One render attempt: encode to scratch, then publish atomically.
    async fn render_and_publish(
        &self,
        segment: &AssemblySegment,
        scratch: &Path,
        clip_path: &Path,
    ) -> MediaResult<()> {
        let cmd = self.build_command(segment, scratch)?;
        self.encoder.encode(&cmd).await?;
        move_file(scratch, clip_path).await
    }

    /// Build the FFmpeg command for a segment's display mode.
    ///
    /// Input 0 is always the video source and input 1 the audio source,
    /// so every branch shares the same stream mapping.
    fn build_command(
        &self,
        segment: &AssemblySegment,
        output: &Path,
    ) -> MediaResult<FfmpegCommand> {
        let enc = &self.config.encoding;
        let duration = segment.duration();

        let cmd = match segment.display_mode {
            DisplayMode::Generated => {
                // zoompan synthesizes the frames, so the still is read once
                FfmpegCommand::new(output)
                    .input(self.visual_path(segment)?)
                    .video_filter(ken_burns_filter(duration, enc.fps, enc.width, enc.height))
            }
            DisplayMode::FigureSync | DisplayMode::CarryForward => FfmpegCommand::new(output)
                .looped_image(self.visual_path(segment)?)
                .video_filter(static_hold_filter(enc.width, enc.height)),
            DisplayMode::TextOnly => FfmpegCommand::new(output)
                .lavfi(format!(
                    "color=c={TEXT_BACKGROUND}:s={}x{}:r={}",
                    enc.width, enc.height, enc.fps
                ))
                .video_filter(word_highlight_filter(&segment.text, duration)),
        };

        Ok(self.finish_command(cmd, segment, duration))
    }

    /// Placeholder: caption over black, same duration and audio, so the
    /// concatenated timeline is unaffected by the failure.
    ///
    /// This is one further bounded encoder run after the two attempts.
    /// There is no degradation left below a placeholder, so a failure
    /// here fails the whole build.
    async fn render_placeholder(
        &self,
        segment: &AssemblySegment,
        output: &Path,
    ) -> MediaResult<()> {
        let enc = &self.config.encoding;
        let duration = segment.duration();

        let cmd = FfmpegCommand::new(output)
            .lavfi(format!(
                "color=c=black:s={}x{}:r={}",
                enc.width, enc.height, enc.fps
            ))
            .video_filter(placeholder_filter(&truncate_caption(&segment.text)));
        let cmd = self.finish_command(cmd, segment, duration);

        self.encoder.encode(&cmd).await
    }

    /// Attach the audio input, stream maps, duration, and encoding args.
    fn finish_command(
        &self,
        cmd: FfmpegCommand,
        segment: &AssemblySegment,
        duration: f64,
    ) -> FfmpegCommand {
        let cmd = match &segment.audio.path {
            Some(path) => cmd.input(path),
            None => cmd.lavfi("anullsrc=r=44100:cl=stereo"),
        };
        cmd.map("0:v")
            .map("1:a")
            .duration(duration)
            .output_args(self.config.encoding.to_ffmpeg_args())
    }

    fn visual_path<'a>(&self, segment: &'a AssemblySegment) -> MediaResult<&'a str> {
        segment
            .visual
            .path
            .as_deref()
            .ok_or_else(|| MediaError::FileNotFound(PathBuf::from(format!(
                "<no visual for segment {}>",
                segment.segment_index
            ))))
    }
}

/// Clamp narration text to a caption-sized prefix on a char boundary.
fn truncate_caption(text: &str) -> String {
    if text.chars().count() <= CAPTION_MAX_CHARS {
        return text.to_string();
    }
    let prefix: String = text.chars().take(CAPTION_MAX_CHARS).collect();
    format!("{}...", prefix.trim_end())
}
