//! Descriptive metadata attached to every artifact

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Maximum description length in characters
pub const MAX_DESCRIPTION_CHARS: usize = 1000;

/// Marker appended to truncated descriptions
pub const ELLIPSIS: &str = "...";

/// Metadata describing an artifact's content
///
/// Only `description` is required. Everything else is filled in by whichever
/// detector knows it (size from a stat, schema from a columnar file, ...).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArtifactMetadata {
    /// Human-readable description, at most [`MAX_DESCRIPTION_CHARS`] characters
    #[serde(deserialize_with = "deserialize_description")]
    description: String,
    /// MIME type
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    /// Size on disk
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<u64>,
    /// Number of rows for tabular data
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub row_count: Option<u64>,
    /// Number of columns for tabular data
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column_count: Option<u64>,
    /// Ordered column name -> type name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<IndexMap<String, String>>,
    /// Short content preview
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview: Option<String>,
    /// Hints for downstream consumers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage_hints: Option<Vec<String>>,
    /// Open key-value bag
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub custom: serde_json::Map<String, serde_json::Value>,
}

impl ArtifactMetadata {
    /// Create metadata with a description (truncated if too long)
    #[must_use]
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: truncate_description(description.into()),
            ..Self::default()
        }
    }

    /// Description text
    #[inline]
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Replace the description (truncated if too long)
    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = truncate_description(description.into());
    }

    /// With MIME type
    #[inline]
    #[must_use]
    pub fn with_mime_type(mut self, mime: impl Into<String>) -> Self {
        self.mime_type = Some(mime.into());
        self
    }

    /// With size in bytes
    #[inline]
    #[must_use]
    pub fn with_size_bytes(mut self, size: u64) -> Self {
        self.size_bytes = Some(size);
        self
    }

    /// With row and column counts
    #[inline]
    #[must_use]
    pub fn with_shape(mut self, rows: u64, columns: u64) -> Self {
        self.row_count = Some(rows);
        self.column_count = Some(columns);
        self
    }

    /// With ordered schema
    #[inline]
    #[must_use]
    pub fn with_schema(mut self, schema: IndexMap<String, String>) -> Self {
        self.schema = Some(schema);
        self
    }

    /// With preview text
    #[inline]
    #[must_use]
    pub fn with_preview(mut self, preview: impl Into<String>) -> Self {
        self.preview = Some(preview.into());
        self
    }

    /// Append a usage hint
    #[must_use]
    pub fn with_usage_hint(mut self, hint: impl Into<String>) -> Self {
        self.usage_hints.get_or_insert_with(Vec::new).push(hint.into());
        self
    }

    /// Insert a custom entry
    #[must_use]
    pub fn with_custom(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.custom.insert(key.into(), value);
        self
    }

    /// Size in kilobytes, if the size is known
    #[inline]
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn size_kb(&self) -> Option<f64> {
        self.size_bytes.map(|b| b as f64 / 1024.0)
    }
}

fn deserialize_description<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    String::deserialize(deserializer).map(truncate_description)
}

fn truncate_description(description: String) -> String {
    if description.chars().count() <= MAX_DESCRIPTION_CHARS {
        return description;
    }
    let keep = MAX_DESCRIPTION_CHARS - ELLIPSIS.len();
    let mut truncated: String = description.chars().take(keep).collect();
    truncated.push_str(ELLIPSIS);
    truncated
}
