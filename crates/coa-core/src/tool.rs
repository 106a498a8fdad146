//! Explicit artifact registration
//!
//! The one entry point where validation errors reach the caller. Unlike the
//! detectors this goes straight to [`ArtifactRegistry::register`], so a
//! second registration of the same path merges instead of being skipped.
//!
//! [`ArtifactRegistry::register`]: coa_registry::ArtifactRegistry::register

use crate::error::RegistrationError;
use coa_artifact::{mime_type_for, Artifact, ArtifactId, ArtifactMetadata, ArtifactType};
use coa_detection::{ExecutionContext, Producer};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Request body of the registration tool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterArtifactRequest {
    pub file_path: String,
    pub name: String,
    pub artifact_type: String,
    pub description: String,
    /// Comma-separated parent artifact ids
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub derived_from: Option<String>,
}

impl RegisterArtifactRequest {
    #[must_use]
    pub fn new(
        file_path: impl Into<String>,
        name: impl Into<String>,
        artifact_type: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            file_path: file_path.into(),
            name: name.into(),
            artifact_type: artifact_type.into(),
            description: description.into(),
            derived_from: None,
        }
    }

    #[inline]
    #[must_use]
    pub fn with_derived_from(mut self, ids: impl Into<String>) -> Self {
        self.derived_from = Some(ids.into());
        self
    }
}

/// Parse a comma-separated id list, ignoring blank entries
///
/// # Errors
/// [`RegistrationError::InvalidParentId`] for the first entry that is not a
/// UUID.
pub fn parse_lineage(raw: &str) -> Result<Vec<ArtifactId>, RegistrationError> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| ArtifactId::from_str(s).map_err(|_| RegistrationError::InvalidParentId(s.to_string())))
        .collect()
}

fn resolve(root: &Path, file_path: &str) -> PathBuf {
    let path = Path::new(file_path.trim());
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}

/// Validate `request` and register the file it names
///
/// Relative paths resolve against the execution root.
///
/// # Errors
/// Missing file, non-file target, unknown type, bad lineage id, or a path the
/// artifact model rejects.
pub async fn register_artifact(
    ctx: &ExecutionContext,
    producer: &Producer,
    request: &RegisterArtifactRequest,
) -> Result<Artifact, RegistrationError> {
    let path = resolve(ctx.root(), &request.file_path);

    let fs_meta = match tokio::fs::metadata(&path).await {
        Ok(meta) => meta,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(RegistrationError::FileNotFound(path));
        }
        Err(e) => return Err(RegistrationError::io_error(path, e)),
    };
    if !fs_meta.is_file() {
        return Err(RegistrationError::NotAFile(path));
    }
    let path = tokio::fs::canonicalize(&path)
        .await
        .map_err(|e| RegistrationError::io_error(&path, e))?;

    let artifact_type = ArtifactType::from_str(&request.artifact_type)
        .map_err(|_| RegistrationError::InvalidArtifactType(request.artifact_type.clone()))?;
    let lineage = match &request.derived_from {
        Some(raw) => parse_lineage(raw)?,
        None => Vec::new(),
    };

    let mut metadata = ArtifactMetadata::new(request.description.as_str())
        .with_size_bytes(fs_meta.len())
        .with_custom("registered_via", serde_json::Value::from("tool"));
    if let Some(mime) = mime_type_for(&path) {
        metadata = metadata.with_mime_type(mime);
    }

    let mut builder = Artifact::builder(&path)
        .artifact_type(artifact_type)
        .created_by(producer.task_id.as_str(), producer.module.as_str())
        .metadata(metadata)
        .derived_from(lineage);
    if !request.name.trim().is_empty() {
        builder = builder.name(request.name.trim());
    }
    let artifact = builder.build()?;

    let stored = ctx.registry().register(artifact).await;
    tracing::info!(
        task_id = %producer.task_id,
        artifact_id = %stored.id,
        path = %stored.storage_path,
        "artifact registered explicitly"
    );
    Ok(stored)
}
