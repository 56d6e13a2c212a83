//! Concurrent in-memory asset registry.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::RwLock;

use serde::{Deserialize, Serialize};
use tracing::debug;

use reel_models::{AssetRecord, AssetStatus, AssetType};

use crate::error::{RegistryError, RegistryResult};

/// Filter for listing assets.
#[derive(Debug, Clone, Default)]
pub struct AssetFilter {
    pub segment_index: Option<usize>,
    pub asset_type: Option<AssetType>,
    pub status: Option<AssetStatus>,
}

impl AssetFilter {
    fn matches(&self, record: &AssetRecord) -> bool {
        self.segment_index.is_none_or(|i| record.segment_index == i)
            && self.asset_type.is_none_or(|t| record.asset_type == t)
            && self.status.is_none_or(|s| record.status == s)
    }
}

/// Persistent record of every generated asset and its approval state.
///
/// Registration is idempotent by asset id so concurrent generation tasks
/// cannot corrupt state; status changes go through the validated
/// transition graph. History is retained: rejected assets stay in the
/// store, they just stop being "active".
#[derive(Debug, Default)]
pub struct AssetRegistry {
    inner: RwLock<RegistryState>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub(crate) struct RegistryState {
    /// asset_id -> record
    assets: HashMap<String, AssetRecord>,
    /// Insertion counter, used as the final get_active tie-break
    #[serde(default)]
    next_seq: u64,
    /// asset_id -> insertion sequence
    #[serde(default)]
    seq: HashMap<String, u64>,
}

impl AssetRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an asset. Idempotent by `asset_id`: re-registering an
    /// existing id is a no-op and returns `false`.
    pub fn register(&self, record: AssetRecord) -> RegistryResult<bool> {
        let mut state = self.write()?;
        if state.assets.contains_key(&record.asset_id) {
            debug!(asset_id = %record.asset_id, "Asset already registered, skipping");
            return Ok(false);
        }
        let seq = state.next_seq;
        state.next_seq += 1;
        state.seq.insert(record.asset_id.clone(), seq);
        debug!(
            asset_id = %record.asset_id,
            segment_index = record.segment_index,
            asset_type = %record.asset_type,
            "Registered asset"
        );
        state.assets.insert(record.asset_id.clone(), record);
        Ok(true)
    }

    /// The active asset of a given type for a segment: the latest
    /// non-rejected record, by `updated_at` then insertion order.
    pub fn get_active(
        &self,
        segment_index: usize,
        asset_type: AssetType,
    ) -> RegistryResult<Option<AssetRecord>> {
        let state = self.read()?;
        let mut candidates: Vec<&AssetRecord> = state
            .assets
            .values()
            .filter(|r| {
                r.segment_index == segment_index
                    && r.asset_type == asset_type
                    && r.status.is_active()
            })
            .collect();
        candidates.sort_by_key(|r| (r.updated_at, state.seq.get(&r.asset_id).copied()));
        Ok(candidates.last().cloned().cloned())
    }

    /// Look up a record by id.
    pub fn get(&self, asset_id: &str) -> RegistryResult<Option<AssetRecord>> {
        Ok(self.read()?.assets.get(asset_id).cloned())
    }

    /// Apply a status transition to an asset.
    ///
    /// Fails with `InvalidTransition` if the transition is not in the
    /// legal graph, and `AssetNotFound` for unknown ids.
    pub fn set_status(&self, asset_id: &str, status: AssetStatus) -> RegistryResult<()> {
        let mut state = self.write()?;
        let record = state
            .assets
            .get_mut(asset_id)
            .ok_or_else(|| RegistryError::AssetNotFound(asset_id.to_string()))?;
        let from = record.status;
        record.transition_to(status)?;
        debug!(asset_id = %asset_id, from = %from, to = %status, "Asset status changed");
        Ok(())
    }

    /// Approve an asset (draft or review -> approved).
    pub fn approve(&self, asset_id: &str) -> RegistryResult<()> {
        self.set_status(asset_id, AssetStatus::Approved)
    }

    /// Reject an asset (draft or review -> rejected).
    pub fn reject(&self, asset_id: &str) -> RegistryResult<()> {
        self.set_status(asset_id, AssetStatus::Rejected)
    }

    /// List assets matching a filter, ordered by segment then insertion.
    pub fn list(&self, filter: &AssetFilter) -> RegistryResult<Vec<AssetRecord>> {
        let state = self.read()?;
        let mut records: Vec<AssetRecord> = state
            .assets
            .values()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect();
        records.sort_by_key(|r| (r.segment_index, state.seq.get(&r.asset_id).copied()));
        Ok(records)
    }

    /// Number of registered assets (history included).
    pub fn len(&self) -> RegistryResult<usize> {
        Ok(self.read()?.assets.len())
    }

    /// Whether the registry has no assets.
    pub fn is_empty(&self) -> RegistryResult<bool> {
        Ok(self.read()?.assets.is_empty())
    }

    /// Take an immutable point-in-time view for planning.
    ///
    /// Planning stages are pure functions over this snapshot, so a build
    /// is unaffected by registrations that race with it.
    pub fn snapshot(&self) -> RegistryResult<RegistrySnapshot> {
        let state = self.read()?;
        let mut active: BTreeMap<(usize, AssetType), AssetRecord> = BTreeMap::new();
        let mut grouped: HashMap<(usize, AssetType), Vec<&AssetRecord>> = HashMap::new();
        for record in state.assets.values().filter(|r| r.status.is_active()) {
            grouped
                .entry((record.segment_index, record.asset_type))
                .or_default()
                .push(record);
        }
        for ((segment_index, asset_type), mut records) in grouped {
            records.sort_by_key(|r| (r.updated_at, state.seq.get(&r.asset_id).copied()));
            if let Some(latest) = records.last() {
                active.insert((segment_index, asset_type), (*latest).clone());
            }
        }

        let approved_images = active
            .iter()
            .filter(|((_, t), r)| *t == AssetType::Image && r.status == AssetStatus::Approved)
            .map(|((i, _), _)| *i)
            .collect();

        // Latest status per (segment, type) across history, so plan-time
        // downgrades can distinguish "rejected" from "never generated".
        let mut latest_status: BTreeMap<(usize, AssetType), AssetStatus> = BTreeMap::new();
        let mut all: Vec<&AssetRecord> = state.assets.values().collect();
        all.sort_by_key(|r| (r.updated_at, state.seq.get(&r.asset_id).copied()));
        for record in all {
            latest_status.insert((record.segment_index, record.asset_type), record.status);
        }

        Ok(RegistrySnapshot {
            active,
            approved_images,
            latest_status,
        })
    }

    fn read(&self) -> RegistryResult<std::sync::RwLockReadGuard<'_, RegistryState>> {
        self.inner.read().map_err(|_| RegistryError::Poisoned)
    }

    fn write(&self) -> RegistryResult<std::sync::RwLockWriteGuard<'_, RegistryState>> {
        self.inner.write().map_err(|_| RegistryError::Poisoned)
    }

    pub(crate) fn from_state(state: RegistryState) -> Self {
        Self {
            inner: RwLock::new(state),
        }
    }

    pub(crate) fn export_state(&self) -> RegistryResult<RegistryState> {
        let state = self.read()?;
        Ok(RegistryState {
            assets: state.assets.clone(),
            next_seq: state.next_seq,
            seq: state.seq.clone(),
        })
    }
}

/// Immutable point-in-time view of the registry used by planning.
#[derive(Debug, Clone, Default)]
pub struct RegistrySnapshot {
    /// Active (latest non-rejected) asset per segment and type
    active: BTreeMap<(usize, AssetType), AssetRecord>,
    /// Segments that already hold an approved generated image
    approved_images: BTreeSet<usize>,
    /// Most recent status per segment and type, rejected included
    latest_status: BTreeMap<(usize, AssetType), AssetStatus>,
}

impl RegistrySnapshot {
    /// The active asset of a type for a segment.
    pub fn active(&self, segment_index: usize, asset_type: AssetType) -> Option<&AssetRecord> {
        self.active.get(&(segment_index, asset_type))
    }

    /// Whether a segment already has an approved generated image.
    pub fn has_approved_image(&self, segment_index: usize) -> bool {
        self.approved_images.contains(&segment_index)
    }

    /// Most recent status of a type for a segment, rejected included.
    pub fn latest_status(&self, segment_index: usize, asset_type: AssetType) -> Option<AssetStatus> {
        self.latest_status.get(&(segment_index, asset_type)).copied()
    }

    /// Segments with an approved generated image, ascending.
    pub fn approved_image_segments(&self) -> impl Iterator<Item = usize> + '_ {
        self.approved_images.iter().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image(id: &str, segment: usize) -> AssetRecord {
        AssetRecord::new(id, AssetType::Image, segment, format!("/tmp/{id}.png"), "sdxl", 0.02)
    }

    #[test]
    fn test_register_is_idempotent() {
        let registry = AssetRegistry::new();
        assert!(registry.register(image("a", 0)).unwrap());
        assert!(!registry.register(image("a", 0)).unwrap());
        assert_eq!(registry.len().unwrap(), 1);
    }

    #[test]
    fn test_get_active_skips_rejected() {
        let registry = AssetRegistry::new();
        registry.register(image("a", 0)).unwrap();
        registry.reject("a").unwrap();
        assert!(registry.get_active(0, AssetType::Image).unwrap().is_none());

        registry.register(image("b", 0)).unwrap();
        let active = registry.get_active(0, AssetType::Image).unwrap().unwrap();
        assert_eq!(active.asset_id, "b");
    }

    #[test]
    fn test_get_active_prefers_latest() {
        let registry = AssetRegistry::new();
        registry.register(image("a", 3)).unwrap();
        registry.register(image("b", 3)).unwrap();
        // b was approved later, so its updated_at is newest
        registry.approve("b").unwrap();
        let active = registry.get_active(3, AssetType::Image).unwrap().unwrap();
        assert_eq!(active.asset_id, "b");
    }

    #[test]
    fn test_set_status_unknown_asset() {
        let registry = AssetRegistry::new();
        assert!(matches!(
            registry.set_status("ghost", AssetStatus::Approved),
            Err(RegistryError::AssetNotFound(_))
        ));
    }

    #[test]
    fn test_set_status_rejects_illegal_transition() {
        let registry = AssetRegistry::new();
        registry.register(image("a", 0)).unwrap();
        registry.approve("a").unwrap();
        assert!(matches!(
            registry.set_status("a", AssetStatus::Draft),
            Err(RegistryError::InvalidTransition(_))
        ));
        // Record unchanged after the failed transition
        assert_eq!(registry.get("a").unwrap().unwrap().status, AssetStatus::Approved);
    }

    #[test]
    fn test_list_with_filter() {
        let registry = AssetRegistry::new();
        registry.register(image("a", 0)).unwrap();
        registry.register(image("b", 1)).unwrap();
        registry
            .register(AssetRecord::new("n", AssetType::Audio, 0, "/tmp/n.wav", "tts", 0.0))
            .unwrap();
        registry.approve("b").unwrap();

        let images = registry
            .list(&AssetFilter {
                asset_type: Some(AssetType::Image),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(images.len(), 2);

        let approved = registry
            .list(&AssetFilter {
                status: Some(AssetStatus::Approved),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(approved.len(), 1);
        assert_eq!(approved[0].asset_id, "b");
    }

    #[test]
    fn test_snapshot_approved_images() {
        let registry = AssetRegistry::new();
        registry.register(image("a", 0)).unwrap();
        registry.register(image("b", 2)).unwrap();
        registry.approve("b").unwrap();

        let snapshot = registry.snapshot().unwrap();
        assert!(!snapshot.has_approved_image(0)); // still draft
        assert!(snapshot.has_approved_image(2));
        assert_eq!(snapshot.approved_image_segments().collect::<Vec<_>>(), vec![2]);
    }

    #[test]
    fn test_snapshot_latest_status_sees_rejection() {
        let registry = AssetRegistry::new();
        registry.register(image("a", 4)).unwrap();
        registry.reject("a").unwrap();

        let snapshot = registry.snapshot().unwrap();
        assert!(snapshot.active(4, AssetType::Image).is_none());
        assert_eq!(
            snapshot.latest_status(4, AssetType::Image),
            Some(AssetStatus::Rejected)
        );
        assert_eq!(snapshot.latest_status(5, AssetType::Image), None);
    }

    #[test]
    fn test_concurrent_idempotent_registration() {
        use std::sync::Arc;
        let registry = Arc::new(AssetRegistry::new());
        let mut handles = Vec::new();
        for _ in 0..8 {
            let registry = Arc::clone(&registry);
            handles.push(std::thread::spawn(move || {
                for i in 0..20 {
                    let _ = registry.register(image(&format!("asset-{i}"), i));
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(registry.len().unwrap(), 20);
    }
}
