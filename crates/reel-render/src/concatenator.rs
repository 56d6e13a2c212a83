//! Final assembly: clip join, audio mux, and manifest publication.

use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::info;

use reel_media::concat_clips;
use reel_models::AssemblyManifest;

use crate::error::{RenderError, RenderResult};
use crate::renderer::RenderedSegment;

/// Paths of the published build artifacts.
#[derive(Debug, Clone)]
pub struct FinalOutput {
    /// The assembled video
    pub media_path: PathBuf,
    /// The manifest the build was rendered from
    pub manifest_path: PathBuf,
}

/// Joins rendered clips into the final video.
///
/// This is the one fatal stage of a build: every earlier failure
/// degrades a single segment, but a concat failure has no partial
/// output worth keeping.
#[derive(Debug, Default)]
pub struct Concatenator;

impl Concatenator {
    pub fn new() -> Self {
        Self
    }

    /// Join all clips in manifest order, mux the master audio if one is
    /// provided, and write the manifest beside the video.
    ///
    /// Callers must pass the complete render results; a missing segment
    /// is a hard error, never a silently shorter video.
    pub async fn concatenate(
        &self,
        manifest: &AssemblyManifest,
        rendered: &[RenderedSegment],
        master_audio: Option<&Path>,
        output_dir: &Path,
    ) -> RenderResult<FinalOutput> {
        if rendered.len() != manifest.segments.len() {
            return Err(RenderError::Concatenation(format!(
                "{} clips for {} manifest segments",
                rendered.len(),
                manifest.segments.len()
            )));
        }

        let mut ordered: Vec<&RenderedSegment> = rendered.iter().collect();
        ordered.sort_by_key(|r| r.segment_index);
        for (entry, clip) in manifest.segments.iter().zip(&ordered) {
            if entry.segment_index != clip.segment_index {
                return Err(RenderError::Concatenation(format!(
                    "clip for segment {} does not match manifest segment {}",
                    clip.segment_index, entry.segment_index
                )));
            }
        }
        let clips: Vec<PathBuf> = ordered.iter().map(|r| r.clip_path.clone()).collect();

        fs::create_dir_all(output_dir).await?;
        let media_path = output_dir.join(format!("assembly_{}.mp4", manifest.assembly_id));

        concat_clips(&clips, master_audio, &media_path)
            .await
            .map_err(|e| RenderError::Concatenation(e.to_string()))?;

        let manifest_path = output_dir.join(format!("assembly_{}.json", manifest.assembly_id));
        self.write_manifest(manifest, &manifest_path).await?;

        info!(
            assembly_id = %manifest.assembly_id,
            media = %media_path.display(),
            duration_sec = manifest.total_duration_sec,
            "Assembly published"
        );
        Ok(FinalOutput {
            media_path,
            manifest_path,
        })
    }

    /// Write the manifest via temp file and rename, same as the clips.
    async fn write_manifest(&self, manifest: &AssemblyManifest, path: &Path) -> RenderResult<()> {
        let json = serde_json::to_string_pretty(manifest)?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json.as_bytes()).await?;
        fs::rename(&tmp, path).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reel_models::{
        AssemblySegment, AudioRef, BudgetTier, DisplayMode, VisualRef,
    };
    use tempfile::TempDir;

    fn manifest(n: usize) -> AssemblyManifest {
        let segments = (0..n)
            .map(|i| AssemblySegment {
                segment_index: i,
                display_mode: DisplayMode::TextOnly,
                start_time: i as f64 * 3.0,
                end_time: (i + 1) as f64 * 3.0,
                text: format!("Narration {i}."),
                visual: VisualRef::none(),
                audio: AudioRef::silence(3.0),
                flags: Vec::new(),
            })
            .collect();
        AssemblyManifest::new(BudgetTier::Micro, segments)
    }

    fn rendered(n: usize, dir: &Path) -> Vec<RenderedSegment> {
        (0..n)
            .map(|i| RenderedSegment {
                segment_index: i,
                clip_path: dir.join(format!("segment_{i:03}.mp4")),
                skipped: false,
                placeholder: false,
            })
            .collect()
    }

    #[tokio::test]
    async fn test_clip_count_mismatch_is_fatal() {
        let dir = TempDir::new().unwrap();
        let concatenator = Concatenator::new();
        let result = concatenator
            .concatenate(&manifest(3), &rendered(2, dir.path()), None, dir.path())
            .await;
        assert!(matches!(result, Err(RenderError::Concatenation(_))));
    }

    #[tokio::test]
    async fn test_missing_clip_file_is_fatal() {
        // Counts match but the files were never rendered.
        let dir = TempDir::new().unwrap();
        let concatenator = Concatenator::new();
        let result = concatenator
            .concatenate(&manifest(2), &rendered(2, dir.path()), None, dir.path())
            .await;
        assert!(matches!(result, Err(RenderError::Concatenation(_))));
    }

    #[tokio::test]
    async fn test_manifest_written_atomically() {
        let dir = TempDir::new().unwrap();
        let concatenator = Concatenator::new();
        let manifest = manifest(1);
        let path = dir.path().join("manifest.json");

        concatenator.write_manifest(&manifest, &path).await.unwrap();

        let parsed: AssemblyManifest =
            serde_json::from_slice(&fs::read(&path).await.unwrap()).unwrap();
        assert_eq!(parsed, manifest);
        assert!(!path.with_extension("json.tmp").exists());
    }
}
