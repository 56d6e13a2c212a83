//! Persistence boundary for the asset registry.
//!
//! Core logic only depends on the in-memory [`AssetRegistry`] contract;
//! where its contents live between builds is a repository concern, so the
//! storage backend can change without touching planning or rendering.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::RegistryResult;
use crate::registry::AssetRegistry;

/// Load/save boundary for registry persistence.
pub trait RegistryRepository {
    /// Load the registry. An absent store yields an empty registry.
    fn load(&self) -> RegistryResult<AssetRegistry>;

    /// Persist the registry's current state.
    fn save(&self, registry: &AssetRegistry) -> RegistryResult<()>;
}

/// JSON file backend.
///
/// Writes go to a temp file in the same directory and are renamed into
/// place, so a crash mid-save never leaves a truncated store. Output is
/// pretty-printed for the external review workflow.
#[derive(Debug, Clone)]
pub struct JsonFileRepository {
    path: PathBuf,
}

impl JsonFileRepository {
    /// Create a repository backed by the given file path.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// The backing file path.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RegistryRepository for JsonFileRepository {
    fn load(&self) -> RegistryResult<AssetRegistry> {
        if !self.path.exists() {
            info!(path = %self.path.display(), "No registry file, starting empty");
            return Ok(AssetRegistry::new());
        }
        let bytes = fs::read(&self.path)?;
        let state = serde_json::from_slice(&bytes)?;
        Ok(AssetRegistry::from_state(state))
    }

    fn save(&self, registry: &AssetRegistry) -> RegistryResult<()> {
        let state = registry.export_state()?;
        let json = serde_json::to_vec_pretty(&state)?;

        if let Some(parent) = self.path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        info!(path = %self.path.display(), "Registry saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reel_models::{AssetRecord, AssetStatus, AssetType};
    use tempfile::TempDir;

    #[test]
    fn test_load_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let repo = JsonFileRepository::new(dir.path().join("registry.json"));
        let registry = repo.load().unwrap();
        assert!(registry.is_empty().unwrap());
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = TempDir::new().unwrap();
        let repo = JsonFileRepository::new(dir.path().join("registry.json"));

        let registry = AssetRegistry::new();
        registry
            .register(AssetRecord::new(
                "a", AssetType::Image, 0, "/tmp/a.png", "sdxl", 0.02,
            ))
            .unwrap();
        registry.approve("a").unwrap();
        repo.save(&registry).unwrap();

        let loaded = repo.load().unwrap();
        let record = loaded.get("a").unwrap().unwrap();
        assert_eq!(record.status, AssetStatus::Approved);
        assert_eq!(loaded.len().unwrap(), 1);
    }

    #[test]
    fn test_save_creates_parent_dirs() {
        let dir = TempDir::new().unwrap();
        let repo = JsonFileRepository::new(dir.path().join("nested/state/registry.json"));
        repo.save(&AssetRegistry::new()).unwrap();
        assert!(repo.path().exists());
    }

    #[test]
    fn test_no_temp_file_left_behind() {
        let dir = TempDir::new().unwrap();
        let repo = JsonFileRepository::new(dir.path().join("registry.json"));
        repo.save(&AssetRegistry::new()).unwrap();
        assert!(!dir.path().join("registry.tmp").exists());
    }
}
