//! Testing utilities for the COA artifact workspace
//!
//! Shared fixtures: temporary execution roots and artifact builders.

#![allow(missing_docs)]

use chrono::{DateTime, Duration, Utc};
use coa_artifact::{Artifact, ArtifactType};
use coa_detection::{ExecutionContext, LocalStorage};
use coa_registry::ArtifactRegistry;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

/// A throwaway execution directory with a context over a fresh registry
///
/// The directory lives as long as the fixture.
#[derive(Debug)]
pub struct TestExecution {
    _dir: TempDir,
    pub ctx: ExecutionContext,
}

impl TestExecution {
    /// Execution that started `started_secs_ago` seconds ago
    pub fn new(started_secs_ago: i64) -> Self {
        Self::with_registry(started_secs_ago, Arc::new(ArtifactRegistry::new()))
    }

    pub fn with_registry(started_secs_ago: i64, registry: Arc<ArtifactRegistry>) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::open(dir.path(), "exec-test").unwrap();
        let ctx = ExecutionContext::new(registry, Arc::new(storage))
            .with_started_at(Utc::now() - Duration::seconds(started_secs_ago));
        Self { _dir: dir, ctx }
    }

    /// Canonical execution root
    pub fn root(&self) -> &Path {
        self.ctx.root()
    }

    pub fn registry(&self) -> &Arc<ArtifactRegistry> {
        self.ctx.registry()
    }

    /// Write `contents` at `relative`, creating parents
    pub fn write(&self, relative: &str, contents: &str) -> PathBuf {
        let path = self.root().join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&path, contents).unwrap();
        path
    }
}

impl Default for TestExecution {
    fn default() -> Self {
        Self::new(60)
    }
}

/// Artifact at `path` produced by `task` with an inferred type
pub fn artifact(path: impl AsRef<Path>, task: &str) -> Artifact {
    Artifact::builder(path).created_by(task, "test").build().unwrap()
}

/// Artifact with an explicit type and creation time
pub fn artifact_at(
    path: impl AsRef<Path>,
    task: &str,
    artifact_type: ArtifactType,
    created_at: DateTime<Utc>,
) -> Artifact {
    Artifact::builder(path)
        .created_by(task, "test")
        .artifact_type(artifact_type)
        .created_at(created_at)
        .build()
        .unwrap()
}

/// Registry pre-filled with `artifacts`
pub async fn registry_with(artifacts: Vec<Artifact>) -> Arc<ArtifactRegistry> {
    let registry = Arc::new(ArtifactRegistry::new());
    registry.register_batch(artifacts).await;
    registry
}
