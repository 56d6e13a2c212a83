//! Cross-crate tests for the planning half of a build: assignment,
//! timeline planning, cache keying, and manifest serialization, driven
//! through the public APIs the pipeline uses.

use reel_models::{
    AssetRecord, AssetType, BudgetTier, DisplayMode, Script, Segment, SegmentIntent,
};
use reel_plan::{PlannerConfig, SegmentAudio, TimelinePlanner, VisualAssigner};
use reel_registry::{AssetRegistry, JsonFileRepository, RegistryRepository};
use reel_render::RenderCache;
use tempfile::TempDir;

fn script(n: usize) -> Script {
    Script::new(
        (0..n)
            .map(|i| Segment {
                id: format!("seg_{i}"),
                order_index: i,
                text: format!("Narration for segment {i}."),
                intent: SegmentIntent::Claim,
                figure_ref: None,
                importance_score: 0.5,
            })
            .collect(),
    )
    .unwrap()
}

fn audio(n: usize) -> Vec<SegmentAudio> {
    (0..n)
        .map(|i| SegmentAudio::measured(format!("/audio/{i}.wav"), 2.0 + i as f64 * 0.5, "tts"))
        .collect()
}

fn plan(script: &Script, tier: BudgetTier, registry: &AssetRegistry) -> reel_models::AssemblyManifest {
    let snapshot = registry.snapshot().unwrap();
    let assignment = VisualAssigner::assign(script, tier, &snapshot).unwrap();
    TimelinePlanner::plan(
        script,
        tier,
        &assignment,
        &audio(script.len()),
        &snapshot,
        &PlannerConfig::default(),
    )
    .unwrap()
}

#[test]
fn unchanged_inputs_produce_identical_clip_paths() {
    // The cache contract across whole builds: same script, tier, and
    // registry state resolve every segment to the same clip filename,
    // so a rerun renders nothing.
    let script = script(6);
    let registry = AssetRegistry::new();
    for i in 0..6 {
        let id = format!("img-{i}");
        registry
            .register(AssetRecord::new(&id, AssetType::Image, i, format!("/a/{i}.png"), "sdxl", 0.02))
            .unwrap();
        registry.approve(&id).unwrap();
    }

    let first = plan(&script, BudgetTier::Medium, &registry);
    let second = plan(&script, BudgetTier::Medium, &registry);

    for (a, b) in first.segments.iter().zip(&second.segments) {
        assert_eq!(RenderCache::clip_filename(a), RenderCache::clip_filename(b));
    }
    // The two builds are distinct artifacts with identical content.
    assert_ne!(first.assembly_id, second.assembly_id);
    assert_eq!(first.segments, second.segments);
    assert_eq!(first.total_duration_sec, second.total_duration_sec);
}

#[test]
fn registry_change_invalidates_only_affected_segments() {
    let script = script(4);
    let registry = AssetRegistry::new();
    for i in 0..4 {
        let id = format!("img-{i}");
        registry
            .register(AssetRecord::new(&id, AssetType::Image, i, format!("/a/{i}.png"), "sdxl", 0.02))
            .unwrap();
        registry.approve(&id).unwrap();
    }

    let before = plan(&script, BudgetTier::Full, &registry);

    // Replace segment 2's visual with a revised file.
    registry
        .register(AssetRecord::new("img-2b", AssetType::Image, 2, "/a/2b.png", "sdxl", 0.02))
        .unwrap();
    registry.approve("img-2b").unwrap();
    let after = plan(&script, BudgetTier::Full, &registry);

    for i in [0usize, 1, 3] {
        assert_eq!(
            RenderCache::clip_filename(&before.segments[i]),
            RenderCache::clip_filename(&after.segments[i]),
            "segment {i} should be unaffected"
        );
    }
    assert_ne!(
        RenderCache::clip_filename(&before.segments[2]),
        RenderCache::clip_filename(&after.segments[2])
    );
}

#[test]
fn manifest_survives_registry_persistence_roundtrip() {
    // An approval workflow edits the registry on disk between builds;
    // a reloaded registry must plan identically to the live one.
    let dir = TempDir::new().unwrap();
    let repo = JsonFileRepository::new(dir.path().join("registry.json"));

    let script = script(5);
    let registry = AssetRegistry::new();
    registry
        .register(AssetRecord::new("img-1", AssetType::Image, 1, "/a/1.png", "sdxl", 0.02))
        .unwrap();
    registry.approve("img-1").unwrap();
    registry
        .register(AssetRecord::new("img-3", AssetType::Image, 3, "/a/3.png", "sdxl", 0.02))
        .unwrap();
    registry.reject("img-3").unwrap();

    repo.save(&registry).unwrap();
    let reloaded = repo.load().unwrap();

    let live = plan(&script, BudgetTier::Low, &registry);
    let persisted = plan(&script, BudgetTier::Low, &reloaded);
    assert_eq!(live.segments, persisted.segments);
}

#[test]
fn manifest_json_is_a_complete_build_record() {
    let script = script(3);
    let manifest = plan(&script, BudgetTier::Micro, &AssetRegistry::new());

    let json = serde_json::to_value(&manifest).unwrap();
    assert!(json.get("assembly_id").is_some());
    assert!(json.get("created_at").is_some());
    assert_eq!(json["tier"], "micro");
    assert_eq!(json["segments"].as_array().unwrap().len(), 3);
    // Micro with no figures: all text, no visual paths serialized
    for entry in json["segments"].as_array().unwrap() {
        assert_eq!(entry["display_mode"], "text_only");
        assert!(entry["visual"].get("path").is_none());
    }
}
