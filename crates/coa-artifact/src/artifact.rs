//! Cataloged artifact record
//!
//! Defines [`Artifact`], the record the registry stores for every file a task
//! produced, and [`ArtifactBuilder`], the only way to construct one. Building
//! validates the storage path; nothing else about an artifact can fail.

use crate::artifact_type::ArtifactType;
use crate::error::ArtifactError;
use crate::media::MediaType;
use crate::metadata::ArtifactMetadata;
use crate::path::StoragePath;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use std::path::Path;
use std::str::FromStr;
use uuid::Uuid;

/// Unique artifact identifier
///
/// Generated once at construction and never reassigned, even when a later
/// registration for the same path overwrites the rest of the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArtifactId(pub Uuid);

impl ArtifactId {
    /// Generate a new random id
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ArtifactId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for ArtifactId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ArtifactId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim()).map(Self)
    }
}

/// A file produced during execution, with identity, type, and provenance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artifact {
    /// Identity
    pub id: ArtifactId,
    /// Display name
    pub name: String,
    /// Semantic category
    pub artifact_type: ArtifactType,
    /// Media kind
    pub media_type: MediaType,
    /// Location on disk (identity key within the registry)
    pub storage_path: StoragePath,
    /// Task that produced the file
    pub created_by_task: String,
    /// Module (toolkit, tool or detector) that produced the file
    pub created_by_module: String,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Descriptive metadata
    pub metadata: ArtifactMetadata,
    /// Parent artifacts this one was derived from
    #[serde(default)]
    pub derived_from: Vec<ArtifactId>,
}

impl Artifact {
    /// Start building an artifact stored at `path`
    #[inline]
    #[must_use]
    pub fn builder(path: impl AsRef<Path>) -> ArtifactBuilder {
        ArtifactBuilder::new(path)
    }

    /// Description shortcut
    #[inline]
    #[must_use]
    pub fn description(&self) -> &str {
        self.metadata.description()
    }

    /// Storage path as a [`Path`]
    #[inline]
    #[must_use]
    pub fn path(&self) -> &Path {
        self.storage_path.as_path()
    }

    /// True if `parent` appears in this artifact's lineage
    #[inline]
    #[must_use]
    pub fn is_derived_from(&self, parent: &ArtifactId) -> bool {
        self.derived_from.contains(parent)
    }
}

/// Builder for [`Artifact`]
///
/// Anything not set is inferred from the path: the name from the file name,
/// the types from the extension, the description from the stem.
#[derive(Debug, Clone)]
pub struct ArtifactBuilder {
    path: std::path::PathBuf,
    id: Option<ArtifactId>,
    name: Option<String>,
    artifact_type: Option<ArtifactType>,
    media_type: Option<MediaType>,
    created_by_task: String,
    created_by_module: String,
    created_at: Option<DateTime<Utc>>,
    metadata: Option<ArtifactMetadata>,
    derived_from: Vec<ArtifactId>,
}

impl ArtifactBuilder {
    /// Create builder for the given path
    #[must_use]
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            id: None,
            name: None,
            artifact_type: None,
            media_type: None,
            created_by_task: String::new(),
            created_by_module: String::new(),
            created_at: None,
            metadata: None,
            derived_from: Vec::new(),
        }
    }

    /// Use a pre-assigned id instead of generating one
    #[inline]
    #[must_use]
    pub fn id(mut self, id: ArtifactId) -> Self {
        self.id = Some(id);
        self
    }

    /// Display name
    #[inline]
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Semantic category
    #[inline]
    #[must_use]
    pub fn artifact_type(mut self, artifact_type: ArtifactType) -> Self {
        self.artifact_type = Some(artifact_type);
        self
    }

    /// Media kind
    #[inline]
    #[must_use]
    pub fn media_type(mut self, media_type: MediaType) -> Self {
        self.media_type = Some(media_type);
        self
    }

    /// Producing task and module
    #[inline]
    #[must_use]
    pub fn created_by(mut self, task: impl Into<String>, module: impl Into<String>) -> Self {
        self.created_by_task = task.into();
        self.created_by_module = module.into();
        self
    }

    /// Creation time (defaults to now)
    #[inline]
    #[must_use]
    pub fn created_at(mut self, at: DateTime<Utc>) -> Self {
        self.created_at = Some(at);
        self
    }

    /// Full metadata block
    #[inline]
    #[must_use]
    pub fn metadata(mut self, metadata: ArtifactMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Description only (keeps any other metadata already set)
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        match self.metadata.as_mut() {
            Some(meta) => meta.set_description(description),
            None => self.metadata = Some(ArtifactMetadata::new(description)),
        }
        self
    }

    /// Lineage parents
    #[inline]
    #[must_use]
    pub fn derived_from(mut self, parents: impl IntoIterator<Item = ArtifactId>) -> Self {
        self.derived_from = parents.into_iter().collect();
        self
    }

    /// Validate the path and finish
    ///
    /// # Errors
    /// Returns the path validation error from [`StoragePath::new`]
    pub fn build(self) -> Result<Artifact, ArtifactError> {
        let storage_path = StoragePath::new(&self.path)?;
        let stem = storage_path
            .file_stem()
            .or_else(|| storage_path.file_name())
            .unwrap_or("artifact")
            .to_string();
        let name = self
            .name
            .or_else(|| storage_path.file_name().map(str::to_string))
            .unwrap_or_else(|| stem.clone());
        let artifact_type = self
            .artifact_type
            .unwrap_or_else(|| ArtifactType::from_path(storage_path.as_path()));
        let media_type = self
            .media_type
            .unwrap_or_else(|| MediaType::from_path(storage_path.as_path()));
        let metadata = self
            .metadata
            .unwrap_or_else(|| ArtifactMetadata::new(default_description(&stem)));

        Ok(Artifact {
            id: self.id.unwrap_or_default(),
            name,
            artifact_type,
            media_type,
            storage_path,
            created_by_task: self.created_by_task,
            created_by_module: self.created_by_module,
            created_at: self.created_at.unwrap_or_else(Utc::now),
            metadata,
            derived_from: self.derived_from,
        })
    }
}

/// Fallback description used when a producer gives none
#[inline]
#[must_use]
pub fn default_description(name: &str) -> String {
    format!("Artifact: {name}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_infers_from_path() {
        let artifact = Artifact::builder("/exec/results/summary.md")
            .created_by("task-1", "writer")
            .build()
            .unwrap();

        assert_eq!(artifact.name, "summary.md");
        assert_eq!(artifact.artifact_type, ArtifactType::Report);
        assert_eq!(artifact.media_type, MediaType::Text);
        assert_eq!(artifact.description(), "Artifact: summary");
        assert_eq!(artifact.created_by_task, "task-1");
        assert_eq!(artifact.created_by_module, "writer");
        assert!(artifact.derived_from.is_empty());
    }

    #[test]
    fn builder_explicit_fields_win() {
        let parent = ArtifactId::new();
        let artifact = Artifact::builder("/exec/a.bin")
            .name("weights")
            .artifact_type(ArtifactType::DataAnalysis)
            .media_type(MediaType::File)
            .description("model weights")
            .derived_from([parent])
            .build()
            .unwrap();

        assert_eq!(artifact.name, "weights");
        assert_eq!(artifact.artifact_type, ArtifactType::DataAnalysis);
        assert_eq!(artifact.description(), "model weights");
        assert!(artifact.is_derived_from(&parent));
    }

    #[test]
    fn builder_description_keeps_other_metadata() {
        let artifact = Artifact::builder("/exec/a.csv")
            .metadata(ArtifactMetadata::new("old").with_size_bytes(10))
            .description("new")
            .build()
            .unwrap();

        assert_eq!(artifact.description(), "new");
        assert_eq!(artifact.metadata.size_bytes, Some(10));
    }

    #[test]
    fn builder_rejects_relative_path() {
        let result = Artifact::builder("out/a.csv").build();
        assert!(matches!(result, Err(ArtifactError::RelativePath(_))));
    }

    #[test]
    fn builder_rejects_traversal() {
        let result = Artifact::builder("/exec/../a.csv").build();
        assert!(matches!(result, Err(ArtifactError::PathTraversal(_))));
    }

    #[test]
    fn ids_are_unique_and_parse() {
        let a = ArtifactId::new();
        let b = ArtifactId::new();
        assert_ne!(a, b);
        assert_eq!(a.to_string().parse::<ArtifactId>().unwrap(), a);
    }

    #[test]
    fn serde_roundtrip_preserves_record() {
        let artifact = Artifact::builder("/exec/data.json")
            .created_by("t", "m")
            .build()
            .unwrap();
        let json = serde_json::to_string(&artifact).unwrap();
        let back: Artifact = serde_json::from_str(&json).unwrap();
        assert_eq!(back, artifact);
    }
}
