//! Content-addressed render cache.
//!
//! Clip filenames embed a digest of the render inputs, so an unchanged
//! segment resolves to the same path across builds and an existing file
//! means the render can be skipped outright.

use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use reel_models::AssemblySegment;

/// Length of the digest prefix embedded in clip filenames.
const KEY_PREFIX_LEN: usize = 16;

/// Computes cache keys and clip paths for rendered segments.
pub struct RenderCache;

impl RenderCache {
    /// Digest of everything that affects a segment's rendered bytes:
    /// display mode, visual path, audio path, and duration in integer
    /// milliseconds. Millisecond quantization keeps float noise in the
    /// probed duration from defeating the cache.
    pub fn cache_key(segment: &AssemblySegment) -> String {
        let duration_ms = (segment.duration() * 1000.0).round() as u64;

        let mut hasher = Sha256::new();
        hasher.update(segment.display_mode.as_str().as_bytes());
        hasher.update([0u8]);
        hasher.update(segment.visual.path.as_deref().unwrap_or("").as_bytes());
        hasher.update([0u8]);
        hasher.update(segment.audio.path.as_deref().unwrap_or("").as_bytes());
        hasher.update([0u8]);
        hasher.update(duration_ms.to_be_bytes());

        let digest = hasher.finalize();
        hex_encode(&digest)
    }

    /// Clip filename for a segment: index for ordering and readability,
    /// digest prefix for content addressing.
    pub fn clip_filename(segment: &AssemblySegment) -> String {
        let key = Self::cache_key(segment);
        format!(
            "segment_{:03}_{}.mp4",
            segment.segment_index,
            &key[..KEY_PREFIX_LEN]
        )
    }

    /// Full clip path under the clips directory.
    pub fn clip_path(clips_dir: &Path, segment: &AssemblySegment) -> PathBuf {
        clips_dir.join(Self::clip_filename(segment))
    }
}

fn hex_encode(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        out.push_str(&format!("{b:02x}"));
    }
    out
}
