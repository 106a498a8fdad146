//! The four artifact detectors
//!
//! - [`PriorityStore`]: persists oversized toolkit results and registers them
//! - [`ToolOutputScanner`]: finds absolute file paths inside tool results
//! - [`DeclarationDetector`]: reads artifact declarations out of generated text
//! - [`FilesystemScanner`]: fallback walk of the execution root
//!
//! All of them apply the same pipeline-level rule before building an
//! artifact: if the registry already knows the path, skip it.

mod declaration;
mod filesystem;
mod priority;
mod tool_output;

pub use declaration::{ArtifactDeclaration, DeclarationDetector};
pub use filesystem::{is_ignored, FilesystemScanner, IGNORED_DIRS, IGNORED_SUFFIXES};
pub use priority::{
    format_call, rich_description, serialized_size_kb, ArgValue, PriorityStore, ToolkitCall,
    REUSE_INSTRUCTION,
};
pub use tool_output::{candidate_paths, ToolOutput, ToolOutputScanner};

use crate::context::{ExecutionContext, Producer};
use crate::error::{DetectionError, DetectionResult};
use crate::report::DetectionReport;
use coa_artifact::{default_description, mime_type_for, Artifact, ArtifactError, ArtifactMetadata};
use std::fs::Metadata;
use std::path::{Path, PathBuf};

/// Canonical form of the execution root
pub(crate) async fn canonical_root(ctx: &ExecutionContext) -> DetectionResult<PathBuf> {
    let root = ctx.root();
    tokio::fs::canonicalize(root)
        .await
        .map_err(|e| DetectionError::io_error(root, e))
}

/// Resolve `candidate` to a regular file inside `root`
///
/// `root` must already be canonical. Containment is decided on the resolved
/// path, so symlinks and `..` segments cannot escape the root.
pub(crate) async fn contained_file(root: &Path, candidate: &Path) -> Option<(PathBuf, Metadata)> {
    if !candidate.is_absolute() {
        return None;
    }
    let resolved = tokio::fs::canonicalize(candidate).await.ok()?;
    resolved.strip_prefix(root).ok()?;
    let metadata = tokio::fs::metadata(&resolved).await.ok()?;
    metadata.is_file().then_some((resolved, metadata))
}

/// Build an artifact for a file found on disk
///
/// Type and media kind come from the extension. Without an explicit
/// description the default `Artifact: {stem}` form is used.
pub(crate) fn file_artifact(
    path: &Path,
    fs_meta: &Metadata,
    producer: &Producer,
    description: Option<String>,
) -> Result<Artifact, ArtifactError> {
    let description = description.unwrap_or_else(|| {
        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("artifact");
        default_description(stem)
    });
    let mut metadata = ArtifactMetadata::new(description).with_size_bytes(fs_meta.len());
    if let Some(mime) = mime_type_for(path) {
        metadata = metadata.with_mime_type(mime);
    }
    Artifact::builder(path)
        .created_by(&producer.task_id, &producer.module)
        .metadata(metadata)
        .build()
}

/// Register every artifact whose path the registry does not know yet
///
/// Existing paths are counted as skipped. The remainder goes through one
/// `register_batch` call.
pub(crate) async fn register_new(
    ctx: &ExecutionContext,
    candidates: Vec<Artifact>,
    mut report: DetectionReport,
) -> DetectionReport {
    let registry = ctx.registry();
    let mut fresh = Vec::with_capacity(candidates.len());
    for artifact in candidates {
        if registry.contains_path(artifact.path()).await {
            report.skipped += 1;
        } else {
            fresh.push(artifact);
        }
    }
    if !fresh.is_empty() {
        report.registered.extend(registry.register_batch(fresh).await);
    }
    report
}
