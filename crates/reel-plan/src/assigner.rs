//! Budget-aware visual assignment ("DoP").

use tracing::debug;

use reel_models::{
    BudgetTier, DisplayMode, Script, Segment, SegmentIntent, SegmentVisual, VisualAssignment,
};
use reel_registry::RegistrySnapshot;

use crate::error::PlanResult;

/// Deterministic mapping from (script, tier, registry) to a per-segment
/// visual treatment.
///
/// Pure function: no network, no filesystem. Identical inputs always
/// produce an identical assignment, which reproducible builds and the
/// skip-existing render cache rely on.
pub struct VisualAssigner;

impl VisualAssigner {
    /// Assign a display mode and direction hint to every segment.
    ///
    /// Phases, in strict order:
    /// 1. Segments with a `figure_ref` get `FigureSync` unconditionally
    ///    and do not count against the generation budget.
    /// 2. A zero-ratio tier sends all remaining segments to `TextOnly`.
    /// 3. `budget_count` sizes the generation budget over the remaining
    ///    segments.
    /// 4. Segments that already hold an approved generated image are
    ///    selected first (they fill budget slots at no new cost); the
    ///    rest rank by importance descending, order index ascending.
    /// 5. Everything else carries the nearest preceding visual forward;
    ///    with no preceding visual the segment falls back to `TextOnly`.
    /// 6. Each segment gets an intent-keyed direction hint.
    pub fn assign(
        script: &Script,
        tier: BudgetTier,
        registry: &RegistrySnapshot,
    ) -> PlanResult<VisualAssignment> {
        script.validate()?;

        let mut modes: Vec<Option<DisplayMode>> = vec![None; script.len()];

        // Phase 1: figure priority
        for segment in &script.segments {
            if segment.figure_ref.is_some() {
                modes[segment.order_index] = Some(DisplayMode::FigureSync);
            }
        }

        let remaining: Vec<&Segment> = script
            .segments
            .iter()
            .filter(|s| s.figure_ref.is_none())
            .collect();

        let ratio = tier.generation_ratio();
        if ratio > 0.0 {
            // Phase 3: budget sizing
            let budget_count = Self::budget_count(ratio, remaining.len());
            debug!(
                tier = %tier,
                remaining = remaining.len(),
                budget_count,
                "Sized generation budget"
            );

            // Phase 4: reuse-first selection
            let mut reuse: Vec<&Segment> = Vec::new();
            let mut fresh: Vec<&Segment> = Vec::new();
            for segment in &remaining {
                if registry.has_approved_image(segment.order_index) {
                    reuse.push(segment);
                } else {
                    fresh.push(segment);
                }
            }
            // Total order within each group: importance descending, then
            // order index ascending.
            let rank = |a: &&Segment, b: &&Segment| {
                b.importance_score
                    .partial_cmp(&a.importance_score)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then(a.order_index.cmp(&b.order_index))
            };
            reuse.sort_by(rank);
            fresh.sort_by(rank);

            for segment in reuse.iter().chain(fresh.iter()).take(budget_count) {
                modes[segment.order_index] = Some(DisplayMode::Generated);
            }
        }

        if ratio > 0.0 {
            // Phase 5: fallback. Walk in order so carry-forward always
            // points at a concrete preceding visual.
            let mut last_visual: Option<usize> = None;
            for segment in &script.segments {
                let index = segment.order_index;
                match modes[index] {
                    Some(DisplayMode::FigureSync) | Some(DisplayMode::Generated) => {
                        last_visual = Some(index);
                    }
                    _ => {
                        modes[index] = Some(if last_visual.is_some() {
                            DisplayMode::CarryForward
                        } else {
                            DisplayMode::TextOnly
                        });
                    }
                }
            }
        } else {
            // Phase 2: a zero-budget tier renders everything but figures
            // as text, with no carry-forward.
            for mode in modes.iter_mut() {
                if mode.is_none() {
                    *mode = Some(DisplayMode::TextOnly);
                }
            }
        }

        // Phase 6: direction hints
        let mut assignment = VisualAssignment::new();
        for segment in &script.segments {
            let display_mode = modes[segment.order_index].expect("every segment assigned");
            assignment.insert(
                segment.order_index,
                SegmentVisual {
                    display_mode,
                    direction_hint: Self::direction_hint(segment),
                },
            );
        }
        Ok(assignment)
    }

    /// Generation budget over the non-figure segments.
    ///
    /// Rounding rule: `f64::round` (half away from zero). Chosen over
    /// floor/ceil so the count stays proportional to the ratio; tests
    /// pin the rule.
    pub fn budget_count(ratio: f64, remaining: usize) -> usize {
        (ratio * remaining as f64).round() as usize
    }

    /// Short visual-direction hint keyed by intent, with an emphasis
    /// suffix for high-importance segments.
    fn direction_hint(segment: &Segment) -> String {
        let base = match segment.intent {
            SegmentIntent::Intro => "wide establishing shot, inviting tone",
            SegmentIntent::Transition => "subtle motion, neutral palette",
            SegmentIntent::Claim => "bold central subject, high contrast",
            SegmentIntent::Evidence => "detailed close-up on the subject",
            SegmentIntent::FigureReference => "clean reproduction of the source figure",
            SegmentIntent::Example => "concrete scene illustrating the narration",
            SegmentIntent::Summary => "calm recap montage",
            SegmentIntent::Outro => "closing wide shot, fade-ready",
        };
        if segment.importance_score >= 0.8 {
            format!("{base}; emphasize composition")
        } else {
            base.to_string()
        }
    }
}
