//! Artifact registry
//!
//! Provides [`ArtifactRegistry`], the single source of truth for cataloged
//! artifacts. Two indexes are kept under one lock:
//! - by id, in insertion order (for `get_all` and deterministic queries)
//! - by storage path (for the path-identity invariant)
//!
//! The critical section of every operation is pure in-memory work; callers do
//! their file I/O before or after, never while the lock is held.

use crate::stats::RegistryStats;
use coa_artifact::{Artifact, ArtifactId, ArtifactType, MediaType, StoragePath};
use indexmap::IndexMap;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use tokio::sync::RwLock;

/// Async-safe artifact catalog
///
/// # Invariants
/// - At most one artifact per distinct storage path
/// - An id, once stored, stays attached to its path until removed
/// - Lookups never fail: misses are `None` or empty collections
#[derive(Debug, Default)]
pub struct ArtifactRegistry {
    state: RwLock<RegistryState>,
}

#[derive(Debug, Default)]
struct RegistryState {
    /// Insertion-ordered primary index
    by_id: IndexMap<ArtifactId, Artifact>,
    /// Path identity index
    by_path: HashMap<StoragePath, ArtifactId>,
}

impl RegistryState {
    /// Insert or merge one artifact, returning the stored record
    fn upsert(&mut self, incoming: Artifact) -> Artifact {
        if let Some(existing_id) = self.by_path.get(&incoming.storage_path).copied() {
            if let Some(stored) = self.by_id.get_mut(&existing_id) {
                merge_on_path_collision(stored, incoming);
                return stored.clone();
            }
            // Stale path entry; fall through and re-index.
            self.by_path.remove(&incoming.storage_path);
        }

        // Same id re-registered under a new path: drop the old path key.
        if let Some(previous) = self.by_id.get(&incoming.id) {
            self.by_path.remove(&previous.storage_path);
        }

        self.by_path
            .insert(incoming.storage_path.clone(), incoming.id);
        self.by_id.insert(incoming.id, incoming.clone());
        incoming
    }
}

/// Apply the path-collision merge rule in place
///
/// The stored id is always preserved. If `incoming` is at least as recent as
/// `stored` (ties favor `incoming`), every other field is taken from
/// `incoming`, except lineage: a non-empty stored `derived_from` is never
/// replaced, while an empty one adopts the incoming parents.
pub fn merge_on_path_collision(stored: &mut Artifact, incoming: Artifact) {
    if incoming.created_at < stored.created_at {
        tracing::debug!(
            path = %stored.storage_path,
            id = %stored.id,
            "ignoring older registration for existing path"
        );
        return;
    }

    let id = stored.id;
    let lineage = std::mem::take(&mut stored.derived_from);
    *stored = incoming;
    stored.id = id;
    if !lineage.is_empty() {
        stored.derived_from = lineage;
    }

    tracing::debug!(
        path = %stored.storage_path,
        id = %stored.id,
        "merged registration into existing artifact"
    );
}

impl ArtifactRegistry {
    /// Create empty registry
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an artifact, merging on path collision
    ///
    /// Returns the artifact as stored, which keeps the original id when the
    /// path was already cataloged.
    pub async fn register(&self, artifact: Artifact) -> Artifact {
        let mut state = self.state.write().await;
        state.upsert(artifact)
    }

    /// Register many artifacts under a single lock acquisition
    pub async fn register_batch(&self, artifacts: Vec<Artifact>) -> Vec<Artifact> {
        let mut state = self.state.write().await;
        artifacts
            .into_iter()
            .map(|artifact| state.upsert(artifact))
            .collect()
    }

    /// Lookup by id
    pub async fn get_by_id(&self, id: &ArtifactId) -> Option<Artifact> {
        self.state.read().await.by_id.get(id).cloned()
    }

    /// Lookup by exact storage path
    ///
    /// Paths that fail validation can never be stored, so they simply miss.
    pub async fn get_by_path(&self, path: impl AsRef<Path>) -> Option<Artifact> {
        let key = StoragePath::new(path).ok()?;
        let state = self.state.read().await;
        let id = state.by_path.get(&key)?;
        state.by_id.get(id).cloned()
    }

    /// True if an artifact is cataloged at `path`
    pub async fn contains_path(&self, path: impl AsRef<Path>) -> bool {
        let Ok(key) = StoragePath::new(path) else {
            return false;
        };
        self.state.read().await.by_path.contains_key(&key)
    }

    /// Artifacts created by a task, in insertion order
    pub async fn get_by_task(&self, task_id: &str) -> Vec<Artifact> {
        self.filter(|a| a.created_by_task == task_id).await
    }

    /// Artifacts of a given type, in insertion order
    pub async fn get_by_type(&self, artifact_type: ArtifactType) -> Vec<Artifact> {
        self.filter(|a| a.artifact_type == artifact_type).await
    }

    /// Artifacts of a given media kind, in insertion order
    pub async fn get_by_media(&self, media_type: MediaType) -> Vec<Artifact> {
        self.filter(|a| a.media_type == media_type).await
    }

    /// Every artifact, in insertion order
    pub async fn get_all(&self) -> Vec<Artifact> {
        self.state.read().await.by_id.values().cloned().collect()
    }

    /// Resolve an artifact's parents, skipping ids that no longer exist
    pub async fn get_lineage(&self, id: &ArtifactId) -> Vec<Artifact> {
        let state = self.state.read().await;
        let Some(artifact) = state.by_id.get(id) else {
            return Vec::new();
        };
        artifact
            .derived_from
            .iter()
            .filter_map(|parent| state.by_id.get(parent).cloned())
            .collect()
    }

    /// Every artifact that lists `id` as a parent
    pub async fn get_descendants(&self, id: &ArtifactId) -> Vec<Artifact> {
        self.filter(|a| a.is_derived_from(id)).await
    }

    /// Remove one artifact; returns whether it existed
    pub async fn remove(&self, id: &ArtifactId) -> bool {
        let mut state = self.state.write().await;
        match state.by_id.shift_remove(id) {
            Some(removed) => {
                state.by_path.remove(&removed.storage_path);
                true
            }
            None => false,
        }
    }

    /// Remove everything; returns how many artifacts were dropped
    pub async fn clear(&self) -> usize {
        let mut state = self.state.write().await;
        let count = state.by_id.len();
        state.by_id.clear();
        state.by_path.clear();
        count
    }

    /// Number of cataloged artifacts
    pub async fn len(&self) -> usize {
        self.state.read().await.by_id.len()
    }

    /// True if nothing is cataloged
    pub async fn is_empty(&self) -> bool {
        self.state.read().await.by_id.is_empty()
    }

    /// Aggregate statistics
    pub async fn get_stats(&self) -> RegistryStats {
        let state = self.state.read().await;
        let mut stats = RegistryStats {
            total_artifacts: state.by_id.len(),
            ..RegistryStats::default()
        };
        let mut tasks = HashSet::new();
        for artifact in state.by_id.values() {
            tasks.insert(artifact.created_by_task.as_str());
            *stats
                .by_artifact_type
                .entry(artifact.artifact_type.as_str().to_string())
                .or_default() += 1;
            *stats
                .by_media_type
                .entry(artifact.media_type.as_str().to_string())
                .or_default() += 1;
        }
        stats.unique_tasks = tasks.len();
        stats
    }

    async fn filter(&self, predicate: impl Fn(&Artifact) -> bool) -> Vec<Artifact> {
        self.state
            .read()
            .await
            .by_id
            .values()
            .filter(|a| predicate(a))
            .cloned()
            .collect()
    }
}
