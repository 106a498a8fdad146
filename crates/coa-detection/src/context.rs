//! Execution context passed explicitly into every detection entry point

use crate::storage::ByteStorage;
use chrono::{DateTime, Utc};
use coa_registry::ArtifactRegistry;
use std::path::Path;
use std::sync::Arc;

/// Everything a detector needs to know about the running execution
///
/// Cloning is cheap; the registry and storage are shared.
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    execution_id: String,
    started_at: DateTime<Utc>,
    registry: Arc<ArtifactRegistry>,
    storage: Arc<dyn ByteStorage>,
}

impl ExecutionContext {
    /// Context for an execution starting now
    ///
    /// The execution id and root directory come from `storage`.
    #[must_use]
    pub fn new(registry: Arc<ArtifactRegistry>, storage: Arc<dyn ByteStorage>) -> Self {
        Self {
            execution_id: storage.execution_id().to_string(),
            started_at: Utc::now(),
            registry,
            storage,
        }
    }

    /// Override the start time (the filesystem scan compares mtimes against it)
    #[inline]
    #[must_use]
    pub fn with_started_at(mut self, started_at: DateTime<Utc>) -> Self {
        self.started_at = started_at;
        self
    }

    #[inline]
    #[must_use]
    pub fn execution_id(&self) -> &str {
        &self.execution_id
    }

    /// Execution root directory
    #[inline]
    #[must_use]
    pub fn root(&self) -> &Path {
        self.storage.root()
    }

    #[inline]
    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[inline]
    #[must_use]
    pub fn registry(&self) -> &Arc<ArtifactRegistry> {
        &self.registry
    }

    #[inline]
    #[must_use]
    pub fn storage(&self) -> &Arc<dyn ByteStorage> {
        &self.storage
    }
}

/// Task and module credited with producing an artifact
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Producer {
    /// Task id
    pub task_id: String,
    /// Toolkit, tool or detector name
    pub module: String,
}

impl Producer {
    /// Create a producer
    #[inline]
    #[must_use]
    pub fn new(task_id: impl Into<String>, module: impl Into<String>) -> Self {
        Self {
            task_id: task_id.into(),
            module: module.into(),
        }
    }
}
