//! Timeline planning: assignment + audio durations -> assembly manifest.

use tracing::{debug, warn};

use reel_models::{
    round3, AssemblyManifest, AssemblySegment, AssetStatus, AssetType, AudioRef, BudgetTier,
    DisplayMode, Script, SegmentFlag, VisualAssignment, VisualRef,
};
use reel_registry::RegistrySnapshot;

use crate::error::{PlanError, PlanResult};

/// Planner configuration.
#[derive(Debug, Clone)]
pub struct PlannerConfig {
    /// Duration substituted when the probe fails or reports zero.
    pub default_duration_sec: f64,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            default_duration_sec: 3.0,
        }
    }
}

/// Per-segment audio as reported by the external duration probe.
#[derive(Debug, Clone)]
pub struct SegmentAudio {
    /// Path to the narration file, if one was generated
    pub path: Option<String>,
    /// Measured duration in seconds; `None` when the probe failed
    pub duration_sec: Option<f64>,
    /// Provider/source tag
    pub source: String,
}

impl SegmentAudio {
    /// Audio with a successfully measured duration.
    pub fn measured(path: impl Into<String>, duration_sec: f64, source: impl Into<String>) -> Self {
        Self {
            path: Some(path.into()),
            duration_sec: Some(duration_sec),
            source: source.into(),
        }
    }

    /// No narration file exists for this segment.
    pub fn missing() -> Self {
        Self {
            path: None,
            duration_sec: None,
            source: "silence".to_string(),
        }
    }

    /// A narration file exists but the probe failed.
    pub fn unprobed(path: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            path: Some(path.into()),
            duration_sec: None,
            source: source.into(),
        }
    }
}

/// Combines the visual assignment with measured audio durations into an
/// ordered, time-stamped assembly manifest.
///
/// Audio duration is authoritative for segment length; narration fidelity
/// wins over visual pacing. For `FigureSync` segments the sync window is
/// the segment's own time window, since each segment narrates its own
/// figure.
pub struct TimelinePlanner;

impl TimelinePlanner {
    /// Produce the manifest for one build.
    ///
    /// Plan-time degradations (missing/rejected visual, failed probe,
    /// missing audio) downgrade or flag the affected segment and
    /// continue; they never fail the build.
    pub fn plan(
        script: &Script,
        tier: BudgetTier,
        assignment: &VisualAssignment,
        audio: &[SegmentAudio],
        registry: &RegistrySnapshot,
        config: &PlannerConfig,
    ) -> PlanResult<AssemblyManifest> {
        script.validate()?;
        if audio.len() != script.len() {
            return Err(PlanError::AudioCountMismatch {
                audio: audio.len(),
                segments: script.len(),
            });
        }

        let mut entries: Vec<AssemblySegment> = Vec::with_capacity(script.len());
        let mut cursor = 0.0f64;

        for (segment, segment_audio) in script.segments.iter().zip(audio) {
            let index = segment.order_index;
            let assigned_mode = assignment
                .mode(index)
                // The assigner covers every segment; an unassigned one can
                // only come from a mismatched assignment document.
                .unwrap_or(DisplayMode::TextOnly);

            let mut flags = Vec::new();

            // Audio duration is authoritative; probe failures get the
            // configured default and a non-fatal warning flag.
            let duration = match segment_audio.duration_sec {
                Some(d) if d > 0.0 && d.is_finite() => d,
                _ => {
                    warn!(
                        segment_index = index,
                        default = config.default_duration_sec,
                        "No usable audio duration, substituting default"
                    );
                    flags.push(SegmentFlag::DefaultDuration);
                    config.default_duration_sec
                }
            };
            if segment_audio.path.is_none() {
                flags.push(SegmentFlag::MissingAudio);
            }
            let audio_ref = AudioRef {
                path: segment_audio.path.clone(),
                duration_sec: duration,
                source: segment_audio.source.clone(),
            };

            // Resolve the visual, downgrading to text when the asset the
            // assignment depends on is not actually usable.
            let (display_mode, visual) =
                Self::resolve_visual(assigned_mode, index, registry, &entries, &mut flags);

            let start_time = round3(cursor);
            let end_time = round3(cursor + duration);
            cursor = end_time;

            debug!(
                segment_index = index,
                display_mode = %display_mode,
                start_time,
                end_time,
                "Planned segment"
            );

            let mut entry = AssemblySegment {
                segment_index: index,
                display_mode,
                start_time,
                end_time,
                text: segment.text.clone(),
                visual,
                audio: audio_ref,
                flags: Vec::new(),
            };
            for flag in flags {
                entry.flag(flag);
            }
            entries.push(entry);
        }

        Ok(AssemblyManifest::new(tier, entries))
    }

    /// Resolve the visual reference for a segment, applying plan-time
    /// downgrades. This override is independent of the original
    /// assignment: a rejected or vanished asset sends the segment to
    /// `TextOnly` no matter what the DoP chose.
    fn resolve_visual(
        assigned: DisplayMode,
        segment_index: usize,
        registry: &RegistrySnapshot,
        planned: &[AssemblySegment],
        flags: &mut Vec<SegmentFlag>,
    ) -> (DisplayMode, VisualRef) {
        match assigned {
            DisplayMode::TextOnly => (DisplayMode::TextOnly, VisualRef::none()),

            DisplayMode::FigureSync | DisplayMode::Generated => {
                let asset_type = match assigned {
                    DisplayMode::FigureSync => AssetType::Figure,
                    _ => AssetType::Image,
                };
                match registry.active(segment_index, asset_type) {
                    Some(record) => (
                        assigned,
                        VisualRef {
                            path: Some(record.path.clone()),
                            source: record.source.clone(),
                            status: Some(record.status),
                        },
                    ),
                    None => {
                        let flag = if registry.latest_status(segment_index, asset_type)
                            == Some(AssetStatus::Rejected)
                        {
                            SegmentFlag::RejectedVisual
                        } else {
                            SegmentFlag::MissingVisual
                        };
                        warn!(
                            segment_index,
                            assigned = %assigned,
                            flag = %flag,
                            "Downgrading segment to text_only"
                        );
                        flags.push(flag);
                        (DisplayMode::TextOnly, VisualRef::none())
                    }
                }
            }

            DisplayMode::CarryForward => {
                // Nearest preceding segment that resolved to a concrete
                // visual file.
                let previous = planned
                    .iter()
                    .rev()
                    .find(|entry| entry.visual.path.is_some());
                match previous {
                    Some(entry) => (DisplayMode::CarryForward, entry.visual.clone()),
                    None => (DisplayMode::TextOnly, VisualRef::none()),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reel_models::{AssetRecord, Segment, SegmentIntent, SegmentVisual};
    use reel_registry::AssetRegistry;

    use crate::assigner::VisualAssigner;

    fn segment(index: usize) -> Segment {
        Segment {
            id: format!("seg_{index}"),
            order_index: index,
            text: format!("Narration {index}."),
            intent: SegmentIntent::Claim,
            figure_ref: None,
            importance_score: 0.5,
        }
    }

    fn script(n: usize) -> Script {
        Script::new((0..n).map(segment).collect()).unwrap()
    }

    fn audio(n: usize, duration: f64) -> Vec<SegmentAudio> {
        (0..n)
            .map(|i| SegmentAudio::measured(format!("/audio/{i}.wav"), duration, "tts"))
            .collect()
    }

    fn registry_with_images(segments: &[usize]) -> AssetRegistry {
        let registry = AssetRegistry::new();
        for &i in segments {
            let id = format!("img-{i}");
            registry
                .register(AssetRecord::new(&id, AssetType::Image, i, format!("/a/{i}.png"), "sdxl", 0.02))
                .unwrap();
            registry.approve(&id).unwrap();
        }
        registry
    }

    #[test]
    fn test_sequential_accumulation() {
        let script = script(4);
        let registry = registry_with_images(&[0, 1, 2, 3]);
        let snapshot = registry.snapshot().unwrap();
        let assignment = VisualAssigner::assign(&script, BudgetTier::Full, &snapshot).unwrap();

        let durations = [2.5, 3.25, 1.0, 4.0];
        let audio: Vec<SegmentAudio> = durations
            .iter()
            .enumerate()
            .map(|(i, d)| SegmentAudio::measured(format!("/audio/{i}.wav"), *d, "tts"))
            .collect();

        let manifest = TimelinePlanner::plan(
            &script,
            BudgetTier::Full,
            &assignment,
            &audio,
            &snapshot,
            &PlannerConfig::default(),
        )
        .unwrap();

        assert_eq!(manifest.segments[0].start_time, 0.0);
        assert_eq!(manifest.segments[0].end_time, 2.5);
        assert_eq!(manifest.segments[1].start_time, 2.5);
        assert_eq!(manifest.segments[3].end_time, 10.75);
        assert!(manifest.validate_monotonic());
        assert!(manifest.duration_consistent());
        assert!((manifest.total_duration_sec - 10.75).abs() < 1e-3);
    }

    #[test]
    fn test_rejected_asset_downgrades_to_text_only() {
        // Scenario: segment 4's active asset is rejected before the
        // build; the manifest shows text_only despite the assignment.
        let script = script(5);
        let registry = registry_with_images(&[0, 1, 2, 3]);
        registry
            .register(AssetRecord::new("img-4", AssetType::Image, 4, "/a/4.png", "sdxl", 0.02))
            .unwrap();
        let snapshot_before = registry.snapshot().unwrap();
        let assignment =
            VisualAssigner::assign(&script, BudgetTier::Full, &snapshot_before).unwrap();
        assert_eq!(assignment.mode(4), Some(DisplayMode::Generated));

        // Review workflow rejects the draft between assignment and build.
        registry.reject("img-4").unwrap();
        let snapshot = registry.snapshot().unwrap();

        let manifest = TimelinePlanner::plan(
            &script,
            BudgetTier::Full,
            &assignment,
            &audio(5, 3.0),
            &snapshot,
            &PlannerConfig::default(),
        )
        .unwrap();

        let entry = &manifest.segments[4];
        assert_eq!(entry.display_mode, DisplayMode::TextOnly);
        assert!(entry.flags.contains(&SegmentFlag::RejectedVisual));
        assert!(entry.visual.path.is_none());
    }

    #[test]
    fn test_missing_asset_flagged_distinctly() {
        let script = script(2);
        let registry = registry_with_images(&[0]);
        let snapshot = registry.snapshot().unwrap();

        // Hand-build an assignment claiming segment 1 is generated even
        // though no asset exists for it.
        let mut assignment = VisualAssignment::new();
        assignment.insert(0, SegmentVisual { display_mode: DisplayMode::Generated, direction_hint: String::new() });
        assignment.insert(1, SegmentVisual { display_mode: DisplayMode::Generated, direction_hint: String::new() });

        let manifest = TimelinePlanner::plan(
            &script,
            BudgetTier::Full,
            &assignment,
            &audio(2, 3.0),
            &snapshot,
            &PlannerConfig::default(),
        )
        .unwrap();

        assert_eq!(manifest.segments[1].display_mode, DisplayMode::TextOnly);
        assert!(manifest.segments[1].flags.contains(&SegmentFlag::MissingVisual));
    }

    #[test]
    fn test_zero_duration_uses_default() {
        // Scenario: probe returns 0 for segment 6; the default duration
        // is substituted and the total reflects it.
        let script = script(8);
        let registry = AssetRegistry::new();
        let snapshot = registry.snapshot().unwrap();
        let assignment = VisualAssigner::assign(&script, BudgetTier::Micro, &snapshot).unwrap();

        let mut audio = audio(8, 2.0);
        audio[6].duration_sec = Some(0.0);

        let manifest = TimelinePlanner::plan(
            &script,
            BudgetTier::Micro,
            &assignment,
            &audio,
            &snapshot,
            &PlannerConfig::default(),
        )
        .unwrap();

        let entry = &manifest.segments[6];
        assert!((entry.duration() - 3.0).abs() < 1e-3);
        assert!(entry.flags.contains(&SegmentFlag::DefaultDuration));
        assert!((manifest.total_duration_sec - (7.0 * 2.0 + 3.0)).abs() < 1e-3);
    }

    #[test]
    fn test_missing_audio_gets_silence_flag() {
        let script = script(2);
        let snapshot = AssetRegistry::new().snapshot().unwrap();
        let assignment = VisualAssigner::assign(&script, BudgetTier::Micro, &snapshot).unwrap();

        let audio = vec![
            SegmentAudio::measured("/audio/0.wav", 2.0, "tts"),
            SegmentAudio::missing(),
        ];

        let manifest = TimelinePlanner::plan(
            &script,
            BudgetTier::Micro,
            &assignment,
            &audio,
            &snapshot,
            &PlannerConfig::default(),
        )
        .unwrap();

        let entry = &manifest.segments[1];
        assert!(entry.flags.contains(&SegmentFlag::MissingAudio));
        assert!(entry.flags.contains(&SegmentFlag::DefaultDuration));
        assert_eq!(entry.audio.source, "silence");
        assert!(entry.audio.path.is_none());
    }

    #[test]
    fn test_carry_forward_reuses_preceding_visual() {
        let script = script(3);
        let registry = registry_with_images(&[0]);
        let snapshot = registry.snapshot().unwrap();
        let assignment = VisualAssigner::assign(&script, BudgetTier::Low, &snapshot).unwrap();
        assert_eq!(assignment.mode(0), Some(DisplayMode::Generated));
        assert_eq!(assignment.mode(1), Some(DisplayMode::CarryForward));

        let manifest = TimelinePlanner::plan(
            &script,
            BudgetTier::Low,
            &assignment,
            &audio(3, 2.0),
            &snapshot,
            &PlannerConfig::default(),
        )
        .unwrap();

        assert_eq!(manifest.segments[1].display_mode, DisplayMode::CarryForward);
        assert_eq!(
            manifest.segments[1].visual.path,
            manifest.segments[0].visual.path
        );
        assert_eq!(manifest.segments[1].visual.path.as_deref(), Some("/a/0.png"));
    }

    #[test]
    fn test_carry_forward_without_preceding_visual_downgrades() {
        // Assignment says carry_forward but every preceding segment
        // degraded to text: nothing to carry, so the segment degrades too.
        let script = script(2);
        let snapshot = AssetRegistry::new().snapshot().unwrap();

        let mut assignment = VisualAssignment::new();
        assignment.insert(0, SegmentVisual { display_mode: DisplayMode::Generated, direction_hint: String::new() });
        assignment.insert(1, SegmentVisual { display_mode: DisplayMode::CarryForward, direction_hint: String::new() });

        let manifest = TimelinePlanner::plan(
            &script,
            BudgetTier::Low,
            &assignment,
            &audio(2, 2.0),
            &snapshot,
            &PlannerConfig::default(),
        )
        .unwrap();

        assert_eq!(manifest.segments[0].display_mode, DisplayMode::TextOnly);
        assert_eq!(manifest.segments[1].display_mode, DisplayMode::TextOnly);
    }

    #[test]
    fn test_audio_count_mismatch_is_fatal() {
        let script = script(3);
        let snapshot = AssetRegistry::new().snapshot().unwrap();
        let assignment = VisualAssigner::assign(&script, BudgetTier::Micro, &snapshot).unwrap();

        let result = TimelinePlanner::plan(
            &script,
            BudgetTier::Micro,
            &assignment,
            &audio(2, 2.0),
            &snapshot,
            &PlannerConfig::default(),
        );
        assert!(matches!(result, Err(PlanError::AudioCountMismatch { audio: 2, segments: 3 })));
    }

    #[test]
    fn test_figure_sync_window_is_own_segment() {
        let mut segments: Vec<Segment> = (0..3).map(segment).collect();
        segments[1].figure_ref = Some("fig_001".to_string());
        let script = Script::new(segments).unwrap();

        let registry = AssetRegistry::new();
        registry
            .register(AssetRecord::new("fig-1", AssetType::Figure, 1, "/figs/1.png", "figure_extractor", 0.0))
            .unwrap();
        registry.approve("fig-1").unwrap();
        let snapshot = registry.snapshot().unwrap();

        let assignment = VisualAssigner::assign(&script, BudgetTier::Micro, &snapshot).unwrap();
        let manifest = TimelinePlanner::plan(
            &script,
            BudgetTier::Micro,
            &assignment,
            &audio(3, 2.0),
            &snapshot,
            &PlannerConfig::default(),
        )
        .unwrap();

        let entry = &manifest.segments[1];
        assert_eq!(entry.display_mode, DisplayMode::FigureSync);
        assert_eq!(entry.visual.path.as_deref(), Some("/figs/1.png"));
        // The figure shows exactly for the segment's own narration window.
        assert_eq!(entry.start_time, 2.0);
        assert_eq!(entry.end_time, 4.0);
    }
}
