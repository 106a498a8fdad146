//! Tool-output path scanner
//!
//! Tool results come in any shape. [`ToolOutput`] models them as a small
//! recursive sum type; the scanner walks every string leaf, pulls out
//! substrings that look like absolute paths, and registers those that are
//! regular files inside the execution root.

use super::{canonical_root, contained_file, file_artifact, register_new};
use crate::context::{ExecutionContext, Producer};
use crate::error::DetectionResult;
use crate::report::DetectionReport;
use indexmap::IndexSet;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::path::{Path, PathBuf};

static ABSOLUTE_PATH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/[A-Za-z0-9_./-]+").expect("valid path regex"));

/// Result returned by a tool call
#[derive(Debug, Clone, PartialEq)]
pub enum ToolOutput {
    Text(String),
    Mapping(Vec<(String, ToolOutput)>),
    Sequence(Vec<ToolOutput>),
    /// Numbers, booleans, null and anything else without text
    Other,
}

impl ToolOutput {
    /// Visit every string leaf, depth first
    pub fn walk<'a, F>(&'a self, visit: &mut F)
    where
        F: FnMut(&'a str),
    {
        match self {
            Self::Text(text) => visit(text),
            Self::Mapping(entries) => entries.iter().for_each(|(_, v)| v.walk(visit)),
            Self::Sequence(items) => items.iter().for_each(|v| v.walk(visit)),
            Self::Other => {}
        }
    }
}

impl From<Value> for ToolOutput {
    fn from(value: Value) -> Self {
        match value {
            Value::String(s) => Self::Text(s),
            Value::Array(items) => Self::Sequence(items.into_iter().map(Self::from).collect()),
            Value::Object(map) => {
                Self::Mapping(map.into_iter().map(|(k, v)| (k, Self::from(v))).collect())
            }
            Value::Null | Value::Bool(_) | Value::Number(_) => Self::Other,
        }
    }
}

impl From<&str> for ToolOutput {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for ToolOutput {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

/// Every distinct absolute-path-looking substring, in order of appearance
///
/// Trailing dots are trimmed so sentence punctuation does not stick to a path.
#[must_use]
pub fn candidate_paths(output: &ToolOutput) -> Vec<String> {
    let mut found: IndexSet<String> = IndexSet::new();
    output.walk(&mut |text| {
        for m in ABSOLUTE_PATH.find_iter(text) {
            let candidate = m.as_str().trim_end_matches('.');
            if candidate.len() > 1 {
                found.insert(candidate.to_string());
            }
        }
    });
    found.into_iter().collect()
}

/// Detector (b)
#[derive(Debug, Clone, Copy, Default)]
pub struct ToolOutputScanner;

impl ToolOutputScanner {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Register files referenced by `output`
    ///
    /// # Errors
    /// Only if the execution root itself cannot be resolved.
    pub async fn scan(
        &self,
        ctx: &ExecutionContext,
        producer: &Producer,
        output: &ToolOutput,
    ) -> DetectionResult<DetectionReport> {
        let candidates = candidate_paths(output);
        if candidates.is_empty() {
            return Ok(DetectionReport::empty());
        }

        let root = canonical_root(ctx).await?;
        let mut seen: IndexSet<PathBuf> = IndexSet::new();
        let mut artifacts = Vec::new();
        let mut report = DetectionReport::empty();

        for candidate in &candidates {
            let Some((path, fs_meta)) = contained_file(&root, Path::new(candidate)).await else {
                continue;
            };
            if !seen.insert(path.clone()) {
                continue;
            }
            match file_artifact(&path, &fs_meta, producer, None) {
                Ok(artifact) => artifacts.push(artifact),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "skipping tool output path");
                    report.failed += 1;
                }
            }
        }

        let report = register_new(ctx, artifacts, report).await;
        tracing::info!(
            tool = %producer.module,
            candidates = candidates.len(),
            registered = report.count(),
            skipped = report.skipped,
            failed = report.failed,
            "tool output scan complete"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::LocalStorage;
    use coa_registry::ArtifactRegistry;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::sync::Arc;

    fn context() -> (tempfile::TempDir, ExecutionContext) {
        let dir = tempfile::tempdir().unwrap();
        let storage = Arc::new(LocalStorage::open(dir.path().join("run"), "exec-t").unwrap());
        let ctx = ExecutionContext::new(Arc::new(ArtifactRegistry::new()), storage);
        (dir, ctx)
    }

    #[test]
    fn walks_nested_shapes() {
        let output = ToolOutput::from(json!({
            "summary": "wrote /a/b.csv and /a/c.png.",
            "files": ["/a/b.csv", {"nested": "/d/e.txt"}],
            "count": 3
        }));
        assert_eq!(candidate_paths(&output), vec!["/a/b.csv", "/a/c.png", "/d/e.txt"]);
    }

    #[test]
    fn non_text_has_no_candidates() {
        assert!(candidate_paths(&ToolOutput::from(json!([1, true, null]))).is_empty());
        assert!(candidate_paths(&ToolOutput::from("a / b")).is_empty());
    }

    #[tokio::test]
    async fn registers_existing_files_inside_root_once() {
        let (dir, ctx) = context();
        let inside = ctx.root().join("out").join("report.md");
        std::fs::create_dir_all(inside.parent().unwrap()).unwrap();
        std::fs::write(&inside, "# r").unwrap();
        let outside = dir.path().join("elsewhere.txt");
        std::fs::write(&outside, "x").unwrap();

        let text = format!(
            "saved {} (also {}) missing {}/nope.txt outside {}",
            inside.display(),
            inside.display(),
            ctx.root().display(),
            outside.display()
        );
        let producer = Producer::new("t1", "writer");
        let report = ToolOutputScanner::new()
            .scan(&ctx, &producer, &ToolOutput::from(text))
            .await
            .unwrap();

        assert_eq!(report.count(), 1);
        assert_eq!(report.registered[0].path(), inside.as_path());
        assert_eq!(report.registered[0].created_by_module, "writer");
        assert_eq!(ctx.registry().len().await, 1);
    }

    #[tokio::test]
    async fn second_scan_skips_registered_paths() {
        let (_dir, ctx) = context();
        let file = ctx.root().join("data.csv");
        std::fs::write(&file, "a,b\n1,2\n").unwrap();
        let output = ToolOutput::from(json!({"path": file.display().to_string()}));
        let producer = Producer::new("t1", "pandas");
        let scanner = ToolOutputScanner::new();

        let first = scanner.scan(&ctx, &producer, &output).await.unwrap();
        let second = scanner.scan(&ctx, &producer, &output).await.unwrap();

        assert_eq!(first.count(), 1);
        assert_eq!(second.count(), 0);
        assert_eq!(second.skipped, 1);
        assert_eq!(ctx.registry().len().await, 1);
    }
}
