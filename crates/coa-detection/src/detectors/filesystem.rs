//! Filesystem scanner, the fallback detector
//!
//! Walks the execution root with `ignore::WalkBuilder` (every ignore-file
//! mechanism switched off, hidden entries visited so the name filter decides)
//! and keeps regular files modified since the execution started. The walk is
//! blocking and runs on the blocking pool.

use super::{file_artifact, register_new};
use crate::context::{ExecutionContext, Producer};
use crate::error::{DetectionError, DetectionResult};
use crate::report::DetectionReport;
use ignore::WalkBuilder;
use std::fs::Metadata;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

/// Directory names whose contents are never artifacts
pub const IGNORED_DIRS: &[&str] = &["__pycache__"];

/// File-name suffixes that are never artifacts
pub const IGNORED_SUFFIXES: &[&str] = &[
    ".tmp", ".git", ".DS_Store", ".pyc", ".pyo", ".swp", ".bak", "~",
];

/// True if `relative` (a path below the root) must not be registered
#[must_use]
pub fn is_ignored(relative: &Path) -> bool {
    let in_ignored_dir = relative.components().any(|c| {
        c.as_os_str()
            .to_str()
            .is_some_and(|name| IGNORED_DIRS.contains(&name))
    });
    if in_ignored_dir {
        return true;
    }
    let Some(name) = relative.file_name().and_then(|n| n.to_str()) else {
        return true;
    };
    name.starts_with('.') || IGNORED_SUFFIXES.iter().any(|suffix| name.ends_with(suffix))
}

/// Detector (d)
#[derive(Debug, Clone, Copy, Default)]
pub struct FilesystemScanner {
    buffer: Duration,
}

impl FilesystemScanner {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Also accept files modified up to `buffer` before the execution start
    #[inline]
    #[must_use]
    pub fn with_buffer(mut self, buffer: Duration) -> Self {
        self.buffer = buffer;
        self
    }

    /// Regular files under `root` modified at or after `since`
    ///
    /// Entries that fail mid-walk are logged and skipped.
    ///
    /// # Errors
    /// Only if the blocking walk task itself cannot complete.
    pub async fn candidates(
        &self,
        root: &Path,
        since: SystemTime,
    ) -> DetectionResult<Vec<(PathBuf, Metadata)>> {
        let root = root.to_path_buf();
        tokio::task::spawn_blocking(move || walk(&root, since))
            .await
            .map_err(|e| DetectionError::Walk(e.to_string()))
    }

    /// Register new files written during the execution
    ///
    /// # Errors
    /// Only if the walk task itself cannot complete.
    pub async fn scan(
        &self,
        ctx: &ExecutionContext,
        producer: &Producer,
    ) -> DetectionResult<DetectionReport> {
        let started: SystemTime = ctx.started_at().into();
        let since = started.checked_sub(self.buffer).unwrap_or(SystemTime::UNIX_EPOCH);
        let found = self.candidates(ctx.root(), since).await?;

        let mut report = DetectionReport::empty();
        let mut artifacts = Vec::with_capacity(found.len());
        for (path, fs_meta) in found {
            match file_artifact(&path, &fs_meta, producer, None) {
                Ok(artifact) => artifacts.push(artifact),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "skipping scanned file");
                    report.failed += 1;
                }
            }
        }

        let report = register_new(ctx, artifacts, report).await;
        tracing::info!(
            root = %ctx.root().display(),
            registered = report.count(),
            skipped = report.skipped,
            failed = report.failed,
            "filesystem scan complete"
        );
        Ok(report)
    }
}

fn walk(root: &Path, since: SystemTime) -> Vec<(PathBuf, Metadata)> {
    let walker = WalkBuilder::new(root)
        .hidden(false)
        .ignore(false)
        .git_ignore(false)
        .git_global(false)
        .git_exclude(false)
        .parents(false)
        .build();

    let mut found = Vec::new();
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!(error = %e, "skipping unreadable entry");
                continue;
            }
        };
        if !entry.file_type().is_some_and(|t| t.is_file()) {
            continue;
        }
        let path = entry.path();
        let Ok(relative) = path.strip_prefix(root) else {
            continue;
        };
        if is_ignored(relative) {
            continue;
        }
        let fs_meta = match entry.metadata() {
            Ok(meta) => meta,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "skipping file without metadata");
                continue;
            }
        };
        let modified = match fs_meta.modified() {
            Ok(modified) => modified,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "skipping file without mtime");
                continue;
            }
        };
        if modified >= since {
            found.push((path.to_path_buf(), fs_meta));
        }
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::LocalStorage;
    use chrono::{Duration as ChronoDuration, Utc};
    use coa_registry::ArtifactRegistry;
    use std::sync::Arc;

    fn context() -> (tempfile::TempDir, ExecutionContext) {
        let dir = tempfile::tempdir().unwrap();
        let storage = Arc::new(LocalStorage::open(dir.path(), "exec-f").unwrap());
        let ctx = ExecutionContext::new(Arc::new(ArtifactRegistry::new()), storage)
            .with_started_at(Utc::now() - ChronoDuration::seconds(60));
        (dir, ctx)
    }

    #[test]
    fn ignore_rules() {
        assert!(is_ignored(Path::new(".hidden")));
        assert!(is_ignored(Path::new("cache.pyc")));
        assert!(is_ignored(Path::new("old.bak")));
        assert!(is_ignored(Path::new("notes.txt~")));
        assert!(is_ignored(Path::new("repo.git")));
        assert!(is_ignored(Path::new("pkg/__pycache__/mod.txt")));
        assert!(!is_ignored(Path::new("keep.txt")));
        assert!(!is_ignored(Path::new("sub/dir/data.csv")));
    }

    #[tokio::test]
    async fn only_keep_txt_survives() {
        let (_dir, ctx) = context();
        for name in ["keep.txt", ".hidden", "cache.pyc", "old.bak"] {
            std::fs::write(ctx.root().join(name), "x").unwrap();
        }

        let since: SystemTime = ctx.started_at().into();
        let found = FilesystemScanner::new().candidates(ctx.root(), since).await.unwrap();

        let names: Vec<_> = found
            .iter()
            .filter_map(|(p, _)| p.file_name().and_then(|n| n.to_str()))
            .collect();
        assert_eq!(names, vec!["keep.txt"]);
    }

    #[tokio::test]
    async fn files_older_than_start_are_ignored() {
        let (_dir, ctx) = context();
        std::fs::write(ctx.root().join("fresh.txt"), "x").unwrap();

        let future = SystemTime::now() + Duration::from_secs(3600);
        let found = FilesystemScanner::new().candidates(ctx.root(), future).await.unwrap();
        assert!(found.is_empty());
    }

    #[tokio::test]
    async fn walks_into_subdirectories_but_not_bytecode_caches() {
        let (_dir, ctx) = context();
        let nested = ctx.root().join("out").join("plots");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(nested.join("chart.png"), "png").unwrap();
        let cache = ctx.root().join("__pycache__");
        std::fs::create_dir_all(&cache).unwrap();
        std::fs::write(cache.join("mod.txt"), "x").unwrap();

        let report = FilesystemScanner::new()
            .scan(&ctx, &Producer::new("t1", "fs-scan"))
            .await
            .unwrap();

        assert_eq!(report.count(), 1);
        assert_eq!(report.registered[0].name, "chart.png");
    }

    #[tokio::test]
    async fn second_scan_registers_nothing_new() {
        let (_dir, ctx) = context();
        std::fs::write(ctx.root().join("result.json"), "{}").unwrap();
        let scanner = FilesystemScanner::new();
        let producer = Producer::new("t1", "fs-scan");

        let first = scanner.scan(&ctx, &producer).await.unwrap();
        let second = scanner.scan(&ctx, &producer).await.unwrap();

        assert_eq!(first.count(), 1);
        assert_eq!(second.count(), 0);
        assert_eq!(second.skipped, 1);
        assert_eq!(ctx.registry().len().await, 1);
    }
}
