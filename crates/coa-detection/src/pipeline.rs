//! Detection pipeline
//!
//! One entry point per moment in a task's life where artifacts can appear.
//! Every entry point is infallible: a missing context, a disabled detector
//! or a detector error all end in a (possibly empty) [`DetectionReport`].
//! Errors are logged at warn, a missing context at debug.

use crate::columnar::{JsonColumnarEncoder, Table, TableEncoder};
use crate::config::DetectionConfig;
use crate::context::{ExecutionContext, Producer};
use crate::detectors::{
    DeclarationDetector, FilesystemScanner, PriorityStore, ToolOutput, ToolOutputScanner,
    ToolkitCall,
};
use crate::error::DetectionResult;
use crate::report::DetectionReport;
use std::sync::Arc;

/// The four detectors behind their enable switches
#[derive(Debug)]
pub struct DetectionPipeline {
    config: DetectionConfig,
    priority: PriorityStore,
    tool_output: ToolOutputScanner,
    declarations: DeclarationDetector,
    filesystem: FilesystemScanner,
}

impl Default for DetectionPipeline {
    fn default() -> Self {
        Self::new(DetectionConfig::default())
    }
}

fn settle(stage: &'static str, result: DetectionResult<DetectionReport>) -> DetectionReport {
    match result {
        Ok(report) => report,
        Err(e) => {
            tracing::warn!(stage, error = %e, "detection failed, treating as nothing found");
            DetectionReport::failure()
        }
    }
}

fn active<'a>(
    stage: &'static str,
    enabled: bool,
    ctx: Option<&'a ExecutionContext>,
) -> Option<&'a ExecutionContext> {
    if !enabled {
        tracing::trace!(stage, "detector disabled");
        return None;
    }
    if ctx.is_none() {
        tracing::debug!(stage, "no execution context, 0 artifacts processed");
    }
    ctx
}

impl DetectionPipeline {
    /// Pipeline using the bundled columnar encoder
    #[must_use]
    pub fn new(config: DetectionConfig) -> Self {
        Self::with_encoder(config, Arc::new(JsonColumnarEncoder::new()))
    }

    /// Pipeline with a custom table encoder for the priority store
    #[must_use]
    pub fn with_encoder(config: DetectionConfig, encoder: Arc<dyn TableEncoder>) -> Self {
        let priority = PriorityStore::new(encoder)
            .with_threshold_kb(config.priority_threshold_kb)
            .with_codecs(config.preferred_codec, config.fallback_codec);
        let filesystem = FilesystemScanner::new().with_buffer(config.filesystem_buffer());
        Self {
            config,
            priority,
            tool_output: ToolOutputScanner::new(),
            declarations: DeclarationDetector::new(),
            filesystem,
        }
    }

    #[inline]
    #[must_use]
    pub fn config(&self) -> &DetectionConfig {
        &self.config
    }

    /// A toolkit returned a table (detector a)
    pub async fn on_toolkit_result(
        &self,
        ctx: Option<&ExecutionContext>,
        producer: &Producer,
        call: &ToolkitCall,
        table: &Table,
    ) -> DetectionReport {
        let Some(ctx) = active("priority_store", self.config.priority_store, ctx) else {
            return DetectionReport::empty();
        };
        let result = self
            .priority
            .persist(ctx, producer, call, table)
            .await
            .map(|stored| DetectionReport {
                registered: stored.into_iter().collect(),
                ..DetectionReport::default()
            });
        settle("priority_store", result)
    }

    /// A tool call returned (detector b)
    pub async fn on_tool_output(
        &self,
        ctx: Option<&ExecutionContext>,
        producer: &Producer,
        output: &ToolOutput,
    ) -> DetectionReport {
        let Some(ctx) = active("tool_output_scan", self.config.tool_output_scan, ctx) else {
            return DetectionReport::empty();
        };
        settle(
            "tool_output_scan",
            self.tool_output.scan(ctx, producer, output).await,
        )
    }

    /// The model produced text (detector c)
    pub async fn on_generated_text(
        &self,
        ctx: Option<&ExecutionContext>,
        producer: &Producer,
        text: &str,
    ) -> DetectionReport {
        let Some(ctx) = active("declaration_parser", self.config.declaration_parser, ctx) else {
            return DetectionReport::empty();
        };
        settle(
            "declaration_parser",
            self.declarations.detect(ctx, producer, text).await,
        )
    }

    /// The task finished (detector d, runs last)
    pub async fn on_execution_complete(
        &self,
        ctx: Option<&ExecutionContext>,
        producer: &Producer,
    ) -> DetectionReport {
        let Some(ctx) = active("filesystem_scan", self.config.filesystem_scan, ctx) else {
            return DetectionReport::empty();
        };
        settle("filesystem_scan", self.filesystem.scan(ctx, producer).await)
    }
}
