//! COA Artifact Detection
//!
//! Discovers files produced during a task's execution and registers them.
//!
//! # Detectors
//!
//! Four independent detectors, each behind a [`DetectionPipeline`] entry point:
//!
//! | Moment | Detector | What it registers |
//! |--------|----------|-------------------|
//! | toolkit returns a table | [`PriorityStore`] | the table, persisted as a columnar file |
//! | tool call returns | [`ToolOutputScanner`] | absolute paths found in the result |
//! | model emits text | [`DeclarationDetector`] | `## ARTIFACT:`, JSON and `<artifact>` declarations |
//! | task finishes | [`FilesystemScanner`] | files modified since the execution started |
//!
//! A detector never re-registers a path the registry already knows, and
//! never lets an error reach the caller.
//!
//! # Collaborators
//!
//! - [`ByteStorage`]: keyed byte store rooted at the execution directory
//! - [`TableEncoder`]: columnar serialization for the priority store
//! - [`ExecutionContext`]: registry, storage and start time, passed explicitly

#![warn(unreachable_pub)]
#![allow(missing_docs)]

// Core modules
pub mod columnar;
pub mod config;
pub mod context;
pub mod detectors;
pub mod error;
pub mod parsers;
pub mod pipeline;
pub mod report;
pub mod storage;

// Re-exports
pub use columnar::{
    parse_timestamp, Column, ColumnType, CompressionCodec, JsonColumnarEncoder, Table,
    TableEncoder, TableSummary, TimeRange,
};
pub use config::DetectionConfig;
pub use context::{ExecutionContext, Producer};
pub use detectors::{
    format_call, rich_description, ArgValue, ArtifactDeclaration, DeclarationDetector,
    FilesystemScanner, PriorityStore, ToolOutput, ToolOutputScanner, ToolkitCall,
    REUSE_INSTRUCTION,
};
pub use error::{DetectionError, DetectionResult, EncodeError, StorageError};
pub use parsers::{DeclarationFormat, DeclarationParser, RawDeclaration};
pub use pipeline::DetectionPipeline;
pub use report::DetectionReport;
pub use storage::{ByteStorage, LocalStorage};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod integration_tests {
    use super::*;
    use coa_registry::ArtifactRegistry;
    use serde_json::json;
    use std::sync::Arc;

    #[tokio::test]
    async fn every_detector_feeds_one_registry() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Arc::new(LocalStorage::open(dir.path(), "exec-all").unwrap());
        let ctx = ExecutionContext::new(Arc::new(ArtifactRegistry::new()), storage)
            .with_started_at(chrono::Utc::now() - chrono::Duration::seconds(10));
        let pipeline =
            DetectionPipeline::new(DetectionConfig::default().with_priority_threshold_kb(0.0));
        let producer = Producer::new("task-1", "analyst");

        let table = Table::new().with_column("x", ColumnType::Integer, [json!(1), json!(2)]);
        let call = ToolkitCall::new("Calc", "series");
        let persisted = pipeline
            .on_toolkit_result(Some(&ctx), &producer, &call, &table)
            .await;

        let csv = ctx.root().join("clean.csv");
        std::fs::write(&csv, "a\n1\n").unwrap();
        let tool = pipeline
            .on_tool_output(
                Some(&ctx),
                &producer,
                &ToolOutput::from(json!({"saved": csv.display().to_string()})),
            )
            .await;

        let md = ctx.root().join("report.md");
        std::fs::write(&md, "# Report").unwrap();
        let text = format!("<artifact><path>{}</path><type>report</type></artifact>", md.display());
        let declared = pipeline.on_generated_text(Some(&ctx), &producer, &text).await;

        let log = ctx.root().join("run.log");
        std::fs::write(&log, "ok").unwrap();
        let scanned = pipeline.on_execution_complete(Some(&ctx), &producer).await;

        let mut total = persisted;
        total += tool;
        total += declared;
        total += scanned.clone();

        assert_eq!(total.count(), 4);
        assert_eq!(scanned.count(), 1);
        assert_eq!(scanned.registered[0].name, "run.log");
        assert_eq!(scanned.skipped, 3);
        assert_eq!(ctx.registry().len().await, 4);
        assert_eq!(ctx.registry().get_by_task("task-1").await.len(), 4);
    }
}
