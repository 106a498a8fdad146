//! Priority store: oversized toolkit results become columnar artifacts
//!
//! When a toolkit returns a table whose serialized size exceeds the
//! threshold, the table is encoded, written through [`ByteStorage`], and
//! registered immediately with a description rich enough that a downstream
//! task can reuse the file instead of repeating the call.
//!
//! [`ByteStorage`]: crate::storage::ByteStorage

use crate::columnar::{CompressionCodec, Table, TableEncoder, TableSummary};
use crate::context::{ExecutionContext, Producer};
use crate::error::{DetectionResult, EncodeError};
use chrono::{DateTime, Timelike, Utc};
use coa_artifact::{Artifact, ArtifactMetadata, ArtifactType, ELLIPSIS, MAX_DESCRIPTION_CHARS};
use serde_json::Value;
use std::fmt::{self, Display, Formatter, Write};
use std::sync::Arc;
use uuid::Uuid;

/// Closing line of every priority-store description
pub const REUSE_INSTRUCTION: &str = "REUSE THIS ARTIFACT: load the data from this file \
instead of calling the same tool again with the same arguments.";

/// Column names listed before eliding the rest
const MAX_LISTED_COLUMNS: usize = 15;

/// Literal argument value, rendered deterministically
#[derive(Debug, Clone, PartialEq)]
pub enum ArgValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<ArgValue>),
    Map(Vec<(String, ArgValue)>),
}

fn write_quoted(f: &mut Formatter<'_>, s: &str) -> fmt::Result {
    f.write_char('\'')?;
    for c in s.chars() {
        match c {
            '\\' => f.write_str("\\\\")?,
            '\'' => f.write_str("\\'")?,
            '\n' => f.write_str("\\n")?,
            other => f.write_char(other)?,
        }
    }
    f.write_char('\'')
}

impl Display for ArgValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) if x.is_finite() && x.fract() == 0.0 && x.abs() < 1e16 => {
                write!(f, "{x:.1}")
            }
            Self::Float(x) => write!(f, "{x}"),
            Self::Str(s) => write_quoted(f, s),
            Self::List(items) => {
                f.write_char('[')?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_char(']')
            }
            Self::Map(entries) => {
                f.write_char('{')?;
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write_quoted(f, key)?;
                    write!(f, ": {value}")?;
                }
                f.write_char('}')
            }
        }
    }
}

impl From<&str> for ArgValue {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

impl From<String> for ArgValue {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl From<i64> for ArgValue {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<i32> for ArgValue {
    fn from(i: i32) -> Self {
        Self::Int(i64::from(i))
    }
}

impl From<f64> for ArgValue {
    fn from(x: f64) -> Self {
        Self::Float(x)
    }
}

impl From<bool> for ArgValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl<T: Into<ArgValue>> From<Vec<T>> for ArgValue {
    fn from(items: Vec<T>) -> Self {
        Self::List(items.into_iter().map(Into::into).collect())
    }
}

impl From<Value> for ArgValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(b),
            Value::Number(n) => n
                .as_i64()
                .map(Self::Int)
                .or_else(|| n.as_f64().map(Self::Float))
                .unwrap_or(Self::Null),
            Value::String(s) => Self::Str(s),
            Value::Array(items) => Self::List(items.into_iter().map(Self::from).collect()),
            Value::Object(map) => {
                Self::Map(map.into_iter().map(|(k, v)| (k, Self::from(v))).collect())
            }
        }
    }
}

/// The toolkit invocation that produced a table
#[derive(Debug, Clone, PartialEq)]
pub struct ToolkitCall {
    pub toolkit: String,
    pub tool: String,
    /// Arguments in call order
    pub args: Vec<(String, ArgValue)>,
    /// Storage grouping below the toolkit directory
    pub data_type: String,
}

impl ToolkitCall {
    #[must_use]
    pub fn new(toolkit: impl Into<String>, tool: impl Into<String>) -> Self {
        Self {
            toolkit: toolkit.into(),
            tool: tool.into(),
            args: Vec::new(),
            data_type: "data".to_string(),
        }
    }

    #[inline]
    #[must_use]
    pub fn with_arg(mut self, name: impl Into<String>, value: impl Into<ArgValue>) -> Self {
        self.args.push((name.into(), value.into()));
        self
    }

    #[inline]
    #[must_use]
    pub fn with_data_type(mut self, data_type: impl Into<String>) -> Self {
        self.data_type = data_type.into();
        self
    }
}

/// Render `Toolkit.tool(arg=value, ...)`
#[must_use]
pub fn format_call(call: &ToolkitCall) -> String {
    let args = call
        .args
        .iter()
        .map(|(name, value)| format!("{name}={value}"))
        .collect::<Vec<_>>()
        .join(", ");
    format!("{}.{}({args})", call.toolkit, call.tool)
}

fn format_stamp(at: DateTime<Utc>) -> String {
    if at.num_seconds_from_midnight() == 0 && at.nanosecond() == 0 {
        at.format("%Y-%m-%d").to_string()
    } else {
        at.format("%Y-%m-%d %H:%M:%S").to_string()
    }
}

/// Build the description registered for a persisted table
///
/// The body is shortened if needed so the result always fits the
/// description limit and still ends with [`REUSE_INSTRUCTION`].
#[must_use]
pub fn rich_description(
    call: &ToolkitCall,
    fetched_at: DateTime<Utc>,
    summary: Option<&TableSummary>,
) -> String {
    let mut lines = vec![
        format!("Data from {}", format_call(call)),
        format!("Fetched at: {} UTC", fetched_at.format("%Y-%m-%d %H:%M:%S")),
    ];

    if let Some(summary) = summary {
        lines.push(format!(
            "Shape: {} rows x {} columns",
            summary.row_count,
            summary.column_count()
        ));
        let mut names: Vec<&str> = summary
            .schema
            .keys()
            .take(MAX_LISTED_COLUMNS)
            .map(String::as_str)
            .collect();
        if summary.schema.len() > MAX_LISTED_COLUMNS {
            names.push(ELLIPSIS);
        }
        if !names.is_empty() {
            lines.push(format!("Columns: {}", names.join(", ")));
        }
        for range in &summary.time_ranges {
            lines.push(format!(
                "Date range ({}): {} to {}",
                range.column,
                format_stamp(range.start),
                format_stamp(range.end)
            ));
        }
    }

    let mut body = lines.join("\n");
    let budget = MAX_DESCRIPTION_CHARS - REUSE_INSTRUCTION.chars().count() - 1;
    if body.chars().count() > budget {
        body = body
            .chars()
            .take(budget - ELLIPSIS.chars().count())
            .collect::<String>();
        body.push_str(ELLIPSIS);
    }
    format!("{body}\n{REUSE_INSTRUCTION}")
}

fn sanitize_segment(segment: &str) -> String {
    let cleaned: String = segment
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    if cleaned.is_empty() {
        "unknown".to_string()
    } else {
        cleaned
    }
}

/// Size proxy used for the threshold: serialized JSON length in KB
#[must_use]
pub fn serialized_size_kb(table: &Table) -> f64 {
    let bytes = serde_json::to_vec(table).map_or(0, |b| b.len());
    bytes as f64 / 1024.0
}

/// Detector (a): persists oversized tables and registers them
#[derive(Debug, Clone)]
pub struct PriorityStore {
    encoder: Arc<dyn TableEncoder>,
    threshold_kb: f64,
    preferred_codec: CompressionCodec,
    fallback_codec: CompressionCodec,
}

impl PriorityStore {
    /// Store with a 1000 KB threshold preferring zstd, falling back to none
    #[must_use]
    pub fn new(encoder: Arc<dyn TableEncoder>) -> Self {
        Self {
            encoder,
            threshold_kb: 1000.0,
            preferred_codec: CompressionCodec::Zstd,
            fallback_codec: CompressionCodec::None,
        }
    }

    #[inline]
    #[must_use]
    pub fn with_threshold_kb(mut self, threshold_kb: f64) -> Self {
        self.threshold_kb = threshold_kb;
        self
    }

    #[inline]
    #[must_use]
    pub fn with_codecs(mut self, preferred: CompressionCodec, fallback: CompressionCodec) -> Self {
        self.preferred_codec = preferred;
        self.fallback_codec = fallback;
        self
    }

    #[inline]
    #[must_use]
    pub fn threshold_kb(&self) -> f64 {
        self.threshold_kb
    }

    /// True if `table` is large enough to be persisted
    #[must_use]
    pub fn should_persist(&self, table: &Table) -> bool {
        serialized_size_kb(table) > self.threshold_kb
    }

    fn encode(&self, table: &Table) -> Result<(Vec<u8>, CompressionCodec), EncodeError> {
        match self.encoder.encode(table, self.preferred_codec) {
            Ok(bytes) => Ok((bytes, self.preferred_codec)),
            Err(EncodeError::CodecUnavailable { .. }) => {
                tracing::debug!(
                    preferred = %self.preferred_codec,
                    fallback = %self.fallback_codec,
                    encoder = self.encoder.format_name(),
                    "preferred codec unavailable, using fallback"
                );
                self.encoder
                    .encode(table, self.fallback_codec)
                    .map(|bytes| (bytes, self.fallback_codec))
            }
            Err(e) => Err(e),
        }
    }

    /// `artifacts/{toolkit}/{data_type}/{tool}_{timestamp}_{suffix}.{ext}`
    fn storage_key(&self, call: &ToolkitCall, at: DateTime<Utc>) -> String {
        let suffix = Uuid::new_v4().simple().to_string();
        format!(
            "artifacts/{}/{}/{}_{}_{}.{}",
            sanitize_segment(&call.toolkit),
            sanitize_segment(&call.data_type),
            sanitize_segment(&call.tool),
            at.format("%Y%m%d_%H%M%S_%6f"),
            &suffix[..8],
            self.encoder.extension()
        )
    }

    /// Persist and register `table` if it exceeds the threshold
    ///
    /// Returns `Ok(None)` when the table is small or its path is already
    /// registered. Bytes written for an artifact that then fails validation
    /// are deleted again.
    ///
    /// # Errors
    /// Encoding, storage and path validation failures.
    pub async fn persist(
        &self,
        ctx: &ExecutionContext,
        producer: &Producer,
        call: &ToolkitCall,
        table: &Table,
    ) -> DetectionResult<Option<Artifact>> {
        if !self.should_persist(table) {
            return Ok(None);
        }

        let fetched_at = Utc::now();
        let (bytes, codec) = self.encode(table)?;
        let size_bytes = bytes.len() as u64;
        let key = self.storage_key(call, fetched_at);
        let path = ctx.storage().put(&key, bytes).await?;

        if ctx.registry().contains_path(&path).await {
            tracing::debug!(path = %path.display(), "priority artifact already registered");
            return Ok(None);
        }

        let summary = if self.encoder.is_columnar() {
            self.read_summary(ctx, &key).await
        } else {
            None
        };

        let mut metadata = ArtifactMetadata::new(rich_description(call, fetched_at, summary.as_ref()))
            .with_mime_type(self.encoder.mime_type())
            .with_size_bytes(size_bytes)
            .with_usage_hint(format!("Reuse instead of calling {}", format_call(call)))
            .with_custom("toolkit", Value::from(call.toolkit.as_str()))
            .with_custom("tool", Value::from(call.tool.as_str()))
            .with_custom("codec", Value::from(codec.as_str()))
            .with_custom("execution_id", Value::from(ctx.execution_id()));
        if let Some(summary) = &summary {
            metadata = metadata
                .with_shape(summary.row_count, summary.column_count())
                .with_schema(
                    summary
                        .schema
                        .iter()
                        .map(|(name, ty)| (name.clone(), ty.to_string()))
                        .collect(),
                );
        }

        let built = Artifact::builder(&path)
            .artifact_type(ArtifactType::DataProcessed)
            .created_by(&producer.task_id, &producer.module)
            .created_at(fetched_at)
            .metadata(metadata)
            .build();
        let artifact = match built {
            Ok(artifact) => artifact,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "discarding stored table");
                if let Err(cleanup) = ctx.storage().delete(&key).await {
                    tracing::warn!(key = %key, error = %cleanup, "failed to delete orphaned table");
                }
                return Err(e.into());
            }
        };
        let stored = ctx.registry().register(artifact).await;

        tracing::info!(
            path = %path.display(),
            toolkit = %call.toolkit,
            tool = %call.tool,
            codec = %codec,
            "persisted oversized toolkit result"
        );
        Ok(Some(stored))
    }

    /// Read the stored bytes back and summarize them; failures only lose enrichment
    async fn read_summary(&self, ctx: &ExecutionContext, key: &str) -> Option<TableSummary> {
        let bytes = match ctx.storage().get(key).await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!(key, error = %e, "could not read back persisted table");
                return None;
            }
        };
        match self.encoder.inspect(&bytes) {
            Ok(summary) => Some(summary),
            Err(e) => {
                tracing::warn!(key, error = %e, "could not inspect persisted table");
                None
            }
        }
    }
}
