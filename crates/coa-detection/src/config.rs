//! Detection settings

use crate::columnar::CompressionCodec;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Per-detector switches and tuning
///
/// Every field has a default, so a partial TOML table is enough.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Persist oversized toolkit results
    pub priority_store: bool,
    /// Scan tool results for file paths
    pub tool_output_scan: bool,
    /// Parse declarations out of generated text
    pub declaration_parser: bool,
    /// Walk the execution root at the end of a task
    pub filesystem_scan: bool,
    /// Size above which a toolkit result is persisted
    pub priority_threshold_kb: f64,
    /// How far before the execution start the filesystem scan looks
    pub filesystem_buffer_secs: u64,
    pub preferred_codec: CompressionCodec,
    pub fallback_codec: CompressionCodec,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            priority_store: true,
            tool_output_scan: true,
            declaration_parser: true,
            filesystem_scan: true,
            priority_threshold_kb: 1000.0,
            filesystem_buffer_secs: 0,
            preferred_codec: CompressionCodec::Zstd,
            fallback_codec: CompressionCodec::None,
        }
    }
}

impl DetectionConfig {
    /// Every detector switched off
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            priority_store: false,
            tool_output_scan: false,
            declaration_parser: false,
            filesystem_scan: false,
            ..Self::default()
        }
    }

    #[inline]
    #[must_use]
    pub fn with_priority_threshold_kb(mut self, threshold_kb: f64) -> Self {
        self.priority_threshold_kb = threshold_kb;
        self
    }

    #[inline]
    #[must_use]
    pub fn with_filesystem_buffer(mut self, buffer: Duration) -> Self {
        self.filesystem_buffer_secs = buffer.as_secs();
        self
    }

    #[inline]
    #[must_use]
    pub fn filesystem_buffer(&self) -> Duration {
        Duration::from_secs(self.filesystem_buffer_secs)
    }
}
