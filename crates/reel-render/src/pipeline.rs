//! The end-to-end assembly pipeline.
//!
//! One `build` call runs the full chain: snapshot the registry, assign
//! visuals, probe narration durations, plan the timeline, render all
//! clips, and concatenate the final video.

use std::path::{Path, PathBuf};

use tracing::warn;

use reel_media::{DurationProbe, FfprobeDurationProbe};
use reel_models::{AssemblyManifest, AssetType, BudgetTier, Script, SegmentFlag};
use reel_plan::{PlannerConfig, SegmentAudio, TimelinePlanner, VisualAssigner};
use reel_registry::{AssetRegistry, RegistrySnapshot};

use crate::concatenator::Concatenator;
use crate::config::RenderConfig;
use crate::error::RenderResult;
use crate::logging::BuildLogger;
use crate::renderer::{RenderedSegment, SegmentRenderer};

/// Everything a finished build produced.
#[derive(Debug, Clone)]
pub struct BuildOutput {
    /// The manifest the build was rendered from, including render-time flags
    pub manifest: AssemblyManifest,
    /// Path to the assembled video
    pub media_path: PathBuf,
    /// Path to the published manifest JSON
    pub manifest_path: PathBuf,
    /// Segments rendered by FFmpeg in this build
    pub rendered: usize,
    /// Segments satisfied from the clip cache
    pub skipped: usize,
    /// Segments that fell back to a placeholder clip
    pub placeholders: usize,
}

/// Orchestrates one assembly build from script to published video.
///
/// Generic over the duration probe so planning can be exercised without
/// ffprobe on the host.
pub struct AssemblyPipeline<P: DurationProbe> {
    config: RenderConfig,
    probe: P,
}

impl AssemblyPipeline<FfprobeDurationProbe> {
    /// Pipeline with the real ffprobe-backed duration probe.
    pub fn new(config: RenderConfig) -> Self {
        Self {
            config,
            probe: FfprobeDurationProbe,
        }
    }
}

impl<P: DurationProbe> AssemblyPipeline<P> {
    /// Pipeline with a custom duration probe.
    pub fn with_probe(config: RenderConfig, probe: P) -> Self {
        Self { config, probe }
    }

    /// Run a complete build.
    ///
    /// Per-segment problems degrade that segment and continue; only a
    /// planning bug or the final concatenation can fail the build.
    pub async fn build(
        &self,
        script: &Script,
        tier: BudgetTier,
        registry: &AssetRegistry,
        master_audio: Option<&Path>,
        output_dir: &Path,
    ) -> RenderResult<BuildOutput> {
        let snapshot = registry.snapshot()?;
        let assignment = VisualAssigner::assign(script, tier, &snapshot)?;
        let audio = self.gather_audio(script, &snapshot).await;

        let planner_config = PlannerConfig {
            default_duration_sec: self.config.default_duration_sec,
        };
        let mut manifest =
            TimelinePlanner::plan(script, tier, &assignment, &audio, &snapshot, &planner_config)?;

        let logger = BuildLogger::new(&manifest.assembly_id, "build");
        logger.log_start(&format!(
            "{} segments, tier {tier}, {:.3}s total",
            manifest.segments.len(),
            manifest.total_duration_sec
        ));

        let renderer = SegmentRenderer::new(self.config.clone());
        let rendered = renderer.render_all(&manifest).await?;
        Self::apply_render_flags(&mut manifest, &rendered);

        logger.log_progress(&format!(
            "Concatenating {} clips into {}",
            rendered.len(),
            output_dir.display()
        ));
        let output = match Concatenator::new()
            .concatenate(&manifest, &rendered, master_audio, output_dir)
            .await
        {
            Ok(output) => output,
            Err(e) => {
                logger.log_error(&format!("Concatenation failed: {e}"));
                return Err(e);
            }
        };

        let skipped = rendered.iter().filter(|r| r.skipped).count();
        let placeholders = rendered.iter().filter(|r| r.placeholder).count();
        logger.log_completion(&format!(
            "Published {} ({} rendered, {} cached, {} placeholders)",
            output.media_path.display(),
            rendered.len() - skipped,
            skipped,
            placeholders
        ));

        Ok(BuildOutput {
            manifest,
            media_path: output.media_path,
            manifest_path: output.manifest_path,
            rendered: rendered.len() - skipped,
            skipped,
            placeholders,
        })
    }

    /// Record render-time degradations in the manifest before it is
    /// published next to the video.
    fn apply_render_flags(manifest: &mut AssemblyManifest, rendered: &[RenderedSegment]) {
        for result in rendered {
            if result.placeholder {
                if let Some(entry) = manifest
                    .segments
                    .iter_mut()
                    .find(|s| s.segment_index == result.segment_index)
                {
                    entry.flag(SegmentFlag::RenderPlaceholder);
                }
            }
        }
    }

    /// Look up each segment's narration asset and probe its duration.
    ///
    /// Probe failures are per-segment and non-fatal; the planner will
    /// substitute the default duration and flag the segment.
    async fn gather_audio(&self, script: &Script, snapshot: &RegistrySnapshot) -> Vec<SegmentAudio> {
        let mut audio = Vec::with_capacity(script.len());
        for segment in &script.segments {
            let entry = match snapshot.active(segment.order_index, AssetType::Audio) {
                Some(record) => match self.probe.duration_sec(Path::new(&record.path)).await {
                    Ok(duration) => SegmentAudio::measured(&record.path, duration, &record.source),
                    Err(e) => {
                        warn!(
                            segment_index = segment.order_index,
                            path = %record.path,
                            "Audio probe failed: {e}"
                        );
                        SegmentAudio::unprobed(&record.path, &record.source)
                    }
                },
                None => SegmentAudio::missing(),
            };
            audio.push(entry);
        }
        audio
    }
}
