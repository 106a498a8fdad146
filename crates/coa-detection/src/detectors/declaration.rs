//! Text-declaration detector
//!
//! Runs every declaration grammar over a piece of generated text, validates
//! the candidates against the execution root, merges them in grammar order
//! (first occurrence of a path wins) and registers what is new.

use super::{canonical_root, contained_file, file_artifact, register_new};
use crate::context::{ExecutionContext, Producer};
use crate::error::DetectionResult;
use crate::parsers::{default_parsers, DeclarationFormat, DeclarationParser, RawDeclaration};
use crate::report::DetectionReport;
use coa_artifact::{default_description, Artifact, ArtifactType};
use indexmap::IndexMap;
use serde_json::Value;
use std::fs::Metadata;
use std::path::{Path, PathBuf};

/// A validated declaration naming a real file inside the execution root
#[derive(Debug, Clone, PartialEq)]
pub struct ArtifactDeclaration {
    pub name: String,
    /// Canonical path
    pub path: PathBuf,
    pub artifact_type: ArtifactType,
    pub description: String,
    pub format: DeclarationFormat,
}

/// Detector (c)
#[derive(Debug)]
pub struct DeclarationDetector {
    parsers: Vec<Box<dyn DeclarationParser>>,
}

impl Default for DeclarationDetector {
    fn default() -> Self {
        Self::new()
    }
}

/// Validate one raw declaration against the canonical `root`
async fn validate(
    raw: RawDeclaration,
    format: DeclarationFormat,
    root: &Path,
) -> Option<(ArtifactDeclaration, Metadata)> {
    let declared = raw.path?;
    let (path, fs_meta) = contained_file(root, Path::new(&declared)).await?;

    let artifact_type = raw
        .artifact_type
        .and_then(|t| t.parse::<ArtifactType>().ok())
        .unwrap_or_else(|| ArtifactType::from_path(&path));
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("artifact")
        .to_string();
    let description = raw.description.unwrap_or_else(|| {
        let label = raw.name.clone().unwrap_or_else(|| {
            path.file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("artifact")
                .to_string()
        });
        default_description(&label)
    });

    Some((
        ArtifactDeclaration {
            name: raw.name.unwrap_or(file_name),
            path,
            artifact_type,
            description,
            format,
        },
        fs_meta,
    ))
}

impl DeclarationDetector {
    /// Detector with the built-in grammars
    #[must_use]
    pub fn new() -> Self {
        Self::with_parsers(default_parsers())
    }

    /// Detector with a custom grammar list (merge order is list order)
    #[must_use]
    pub fn with_parsers(parsers: Vec<Box<dyn DeclarationParser>>) -> Self {
        Self { parsers }
    }

    /// Valid declarations in `text`, deduplicated by path
    ///
    /// The second element counts candidates that were discarded.
    ///
    /// # Errors
    /// Only if the execution root itself cannot be resolved.
    pub async fn declarations(
        &self,
        ctx: &ExecutionContext,
        text: &str,
    ) -> DetectionResult<(Vec<(ArtifactDeclaration, Metadata)>, usize)> {
        let root = canonical_root(ctx).await?;
        let mut merged: IndexMap<PathBuf, (ArtifactDeclaration, Metadata)> = IndexMap::new();
        let mut discarded = 0;

        for parser in &self.parsers {
            let format = parser.format();
            for raw in parser.parse(text) {
                let declared = raw.path.clone();
                match validate(raw, format, &root).await {
                    Some((decl, fs_meta)) => {
                        merged.entry(decl.path.clone()).or_insert((decl, fs_meta));
                    }
                    None => {
                        tracing::debug!(grammar = %format, path = ?declared, "discarding invalid declaration");
                        discarded += 1;
                    }
                }
            }
        }
        Ok((merged.into_values().collect(), discarded))
    }

    /// Register every new artifact declared in `text`
    ///
    /// # Errors
    /// Only if the execution root itself cannot be resolved.
    pub async fn detect(
        &self,
        ctx: &ExecutionContext,
        producer: &Producer,
        text: &str,
    ) -> DetectionResult<DetectionReport> {
        let (declarations, discarded) = self.declarations(ctx, text).await?;
        let mut report = DetectionReport {
            failed: discarded,
            ..DetectionReport::default()
        };

        let mut artifacts: Vec<Artifact> = Vec::with_capacity(declarations.len());
        for (decl, fs_meta) in declarations {
            match file_artifact(&decl.path, &fs_meta, producer, Some(decl.description)) {
                Ok(mut artifact) => {
                    artifact.name = decl.name;
                    artifact.artifact_type = decl.artifact_type;
                    artifact
                        .metadata
                        .custom
                        .insert("declared_via".to_string(), Value::from(decl.format.to_string()));
                    artifacts.push(artifact);
                }
                Err(e) => {
                    tracing::warn!(path = %decl.path.display(), error = %e, "skipping declaration");
                    report.failed += 1;
                }
            }
        }

        let report = register_new(ctx, artifacts, report).await;
        if !report.is_empty() {
            tracing::info!(
                task = %producer.task_id,
                registered = report.count(),
                skipped = report.skipped,
                failed = report.failed,
                "declaration scan complete"
            );
        }
        Ok(report)
    }
}
