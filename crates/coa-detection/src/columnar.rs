//! Tabular results and the columnar encoder seam
//!
//! Large toolkit results are tables. A [`TableEncoder`] turns a [`Table`] into
//! bytes with a requested [`CompressionCodec`] and can read those bytes back
//! into a [`TableSummary`] for metadata enrichment.
//!
//! The bundled [`JsonColumnarEncoder`] writes a column-major JSON document. It
//! understands only [`CompressionCodec::None`]; asking it for anything else
//! yields [`EncodeError::CodecUnavailable`], which is how the priority store's
//! codec fallback gets exercised without a native compression library.

use crate::error::EncodeError;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt::{self, Debug, Display, Formatter};
use std::str::FromStr;

/// Logical column type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Integer,
    Float,
    Boolean,
    String,
    Timestamp,
}

impl ColumnType {
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Integer => "integer",
            Self::Float => "float",
            Self::Boolean => "boolean",
            Self::String => "string",
            Self::Timestamp => "timestamp",
        }
    }
}

impl Display for ColumnType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One named, typed column of values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub column_type: ColumnType,
    pub values: Vec<Value>,
}

/// Column-major table
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub columns: Vec<Column>,
}

impl Table {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a column
    #[must_use]
    pub fn with_column(
        mut self,
        name: impl Into<String>,
        column_type: ColumnType,
        values: impl IntoIterator<Item = Value>,
    ) -> Self {
        self.columns.push(Column {
            name: name.into(),
            column_type,
            values: values.into_iter().collect(),
        });
        self
    }

    /// Longest column length
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.columns.iter().map(|c| c.values.len()).max().unwrap_or(0)
    }

    #[inline]
    #[must_use]
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.row_count() == 0
    }
}

/// Compression codec requested from an encoder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompressionCodec {
    None,
    Zstd,
    Snappy,
    Gzip,
}

impl CompressionCodec {
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Zstd => "zstd",
            Self::Snappy => "snappy",
            Self::Gzip => "gzip",
        }
    }
}

impl Display for CompressionCodec {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CompressionCodec {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" | "uncompressed" => Ok(Self::None),
            "zstd" => Ok(Self::Zstd),
            "snappy" => Ok(Self::Snappy),
            "gzip" => Ok(Self::Gzip),
            other => Err(format!("unknown compression codec: '{other}'")),
        }
    }
}

/// Inclusive time span covered by a timestamp column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeRange {
    pub column: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Shape and schema read back from encoded bytes
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TableSummary {
    pub row_count: u64,
    /// Column name to type, in column order
    pub schema: IndexMap<String, ColumnType>,
    pub time_ranges: Vec<TimeRange>,
}

impl TableSummary {
    #[inline]
    #[must_use]
    pub fn column_count(&self) -> u64 {
        self.schema.len() as u64
    }
}

/// Table serialization format
pub trait TableEncoder: Send + Sync + Debug {
    /// Short format name used in logs and errors
    fn format_name(&self) -> &'static str;

    /// File extension (without dot) for encoded output
    fn extension(&self) -> &'static str;

    fn mime_type(&self) -> &'static str;

    /// True if `inspect` can recover schema and shape
    fn is_columnar(&self) -> bool;

    /// Encode `table` with `codec`
    ///
    /// # Errors
    /// [`EncodeError::CodecUnavailable`] if the codec is unsupported, otherwise
    /// [`EncodeError::Serialize`].
    fn encode(&self, table: &Table, codec: CompressionCodec) -> Result<Vec<u8>, EncodeError>;

    /// Read shape, schema and timestamp ranges from encoded bytes
    ///
    /// # Errors
    /// [`EncodeError::Malformed`] if the bytes are not in this format.
    fn inspect(&self, bytes: &[u8]) -> Result<TableSummary, EncodeError>;
}

const COLUMNAR_FORMAT_TAG: &str = "columnar-json/1";

#[derive(Serialize, Deserialize)]
struct ColumnarDocument {
    format: String,
    codec: CompressionCodec,
    row_count: u64,
    schema: Vec<SchemaField>,
    columns: IndexMap<String, Vec<Value>>,
}

#[derive(Serialize, Deserialize)]
struct SchemaField {
    name: String,
    #[serde(rename = "type")]
    column_type: ColumnType,
}

/// Column-major JSON encoder
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonColumnarEncoder;

impl JsonColumnarEncoder {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl TableEncoder for JsonColumnarEncoder {
    fn format_name(&self) -> &'static str {
        "columnar-json"
    }

    fn extension(&self) -> &'static str {
        "json"
    }

    fn mime_type(&self) -> &'static str {
        "application/json"
    }

    fn is_columnar(&self) -> bool {
        true
    }

    fn encode(&self, table: &Table, codec: CompressionCodec) -> Result<Vec<u8>, EncodeError> {
        if codec != CompressionCodec::None {
            return Err(EncodeError::CodecUnavailable {
                codec: codec.to_string(),
                format: self.format_name().to_string(),
            });
        }

        let doc = ColumnarDocument {
            format: COLUMNAR_FORMAT_TAG.to_string(),
            codec,
            row_count: table.row_count() as u64,
            schema: table
                .columns
                .iter()
                .map(|c| SchemaField {
                    name: c.name.clone(),
                    column_type: c.column_type,
                })
                .collect(),
            columns: table
                .columns
                .iter()
                .map(|c| (c.name.clone(), c.values.clone()))
                .collect(),
        };
        serde_json::to_vec(&doc).map_err(|e| EncodeError::Serialize(e.to_string()))
    }

    fn inspect(&self, bytes: &[u8]) -> Result<TableSummary, EncodeError> {
        let doc: ColumnarDocument =
            serde_json::from_slice(bytes).map_err(|e| EncodeError::Malformed(e.to_string()))?;
        if doc.format != COLUMNAR_FORMAT_TAG {
            return Err(EncodeError::Malformed(format!(
                "unexpected format tag '{}'",
                doc.format
            )));
        }

        let mut time_ranges = Vec::new();
        for field in &doc.schema {
            if field.column_type != ColumnType::Timestamp {
                continue;
            }
            let values = doc.columns.get(&field.name).map(Vec::as_slice).unwrap_or_default();
            if let Some(range) = time_range(&field.name, values) {
                time_ranges.push(range);
            }
        }

        Ok(TableSummary {
            row_count: doc.row_count,
            schema: doc
                .schema
                .into_iter()
                .map(|f| (f.name, f.column_type))
                .collect(),
            time_ranges,
        })
    }
}

fn time_range(column: &str, values: &[Value]) -> Option<TimeRange> {
    let mut stamps = values.iter().filter_map(parse_timestamp);
    let first = stamps.next()?;
    let (start, end) = stamps.fold((first, first), |(lo, hi), t| (lo.min(t), hi.max(t)));
    Some(TimeRange {
        column: column.to_string(),
        start,
        end,
    })
}

/// Interpret a cell as a UTC timestamp
///
/// Accepts RFC 3339 strings, `YYYY-MM-DD[ HH:MM:SS]` strings and integer
/// epoch milliseconds.
#[must_use]
pub fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => {
            let s = s.trim();
            if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
                return Some(dt.with_timezone(&Utc));
            }
            for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
                if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
                    return Some(naive.and_utc());
                }
            }
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(|naive| naive.and_utc())
        }
        Value::Number(n) => n.as_i64().and_then(DateTime::from_timestamp_millis),
        _ => None,
    }
}
