//! Artifact classification
//!
//! Defines [`ArtifactType`], the semantic category of a cataloged file, and the
//! total extension lookup used whenever a detector has nothing better to go on.

use crate::error::ArtifactError;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// Semantic category of an artifact
///
/// The three `Data*` variants describe tabular or structured data at different
/// stages of a pipeline; the rest describe human-facing documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactType {
    /// Raw data fetched from an external source
    DataFetch,
    /// Data after cleaning or transformation
    DataProcessed,
    /// Results of an analysis step
    DataAnalysis,
    /// Narrative report
    Report,
    /// Chart or plot
    Plot,
    /// Source code
    Code,
    /// Image that is not a plot
    Image,
    /// Anything else
    Document,
}

impl ArtifactType {
    /// Every variant, in declaration order
    pub const ALL: [ArtifactType; 8] = [
        Self::DataFetch,
        Self::DataProcessed,
        Self::DataAnalysis,
        Self::Report,
        Self::Plot,
        Self::Code,
        Self::Image,
        Self::Document,
    ];

    /// Wire name (`data_fetch`, `report`, ...)
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DataFetch => "data_fetch",
            Self::DataProcessed => "data_processed",
            Self::DataAnalysis => "data_analysis",
            Self::Report => "report",
            Self::Plot => "plot",
            Self::Code => "code",
            Self::Image => "image",
            Self::Document => "document",
        }
    }

    /// True for the three `data_*` variants
    #[inline]
    #[must_use]
    pub fn is_data(&self) -> bool {
        matches!(
            self,
            Self::DataFetch | Self::DataProcessed | Self::DataAnalysis
        )
    }

    /// True for every non-data variant
    #[inline]
    #[must_use]
    pub fn is_document(&self) -> bool {
        !self.is_data()
    }

    /// Infer type from a file extension
    ///
    /// Accepts the extension with or without its leading dot and in any case.
    /// Unknown extensions resolve to [`ArtifactType::Document`].
    #[must_use]
    pub fn from_extension(ext: &str) -> Self {
        let ext = ext.trim_start_matches('.').to_ascii_lowercase();
        match ext.as_str() {
            "csv" | "json" | "parquet" | "xlsx" | "xls" | "tsv" | "jsonl" => Self::DataProcessed,
            "png" | "jpg" | "jpeg" | "svg" | "pdf" => Self::Plot,
            "md" | "markdown" | "txt" | "html" | "htm" => Self::Report,
            "py" | "js" | "ts" | "java" | "cpp" | "c" | "go" | "rs" | "sh" => Self::Code,
            "gif" | "bmp" | "tiff" | "webp" => Self::Image,
            _ => Self::Document,
        }
    }

    /// Infer type from a path's extension
    ///
    /// Paths without an extension resolve to [`ArtifactType::Document`].
    #[must_use]
    pub fn from_path(path: &std::path::Path) -> Self {
        path.extension()
            .and_then(|e| e.to_str())
            .map_or(Self::Document, Self::from_extension)
    }
}

impl Display for ArtifactType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ArtifactType {
    type Err = ArtifactError;

    /// Case-insensitive parse of the wire name
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.as_str().eq_ignore_ascii_case(needle))
            .ok_or_else(|| ArtifactError::UnknownArtifactType(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::path::Path;

    #[test]
    fn extension_lookup_table() {
        assert_eq!(ArtifactType::from_extension(".csv"), ArtifactType::DataProcessed);
        assert_eq!(ArtifactType::from_extension("jsonl"), ArtifactType::DataProcessed);
        assert_eq!(ArtifactType::from_extension(".png"), ArtifactType::Plot);
        assert_eq!(ArtifactType::from_extension("PDF"), ArtifactType::Plot);
        assert_eq!(ArtifactType::from_extension("htm"), ArtifactType::Report);
        assert_eq!(ArtifactType::from_extension(".py"), ArtifactType::Code);
        assert_eq!(ArtifactType::from_extension("webp"), ArtifactType::Image);
        assert_eq!(ArtifactType::from_extension("pptx"), ArtifactType::Document);
        assert_eq!(ArtifactType::from_extension("weird"), ArtifactType::Document);
        assert_eq!(ArtifactType::from_extension(""), ArtifactType::Document);
    }

    #[test]
    fn from_path_uses_extension() {
        assert_eq!(
            ArtifactType::from_path(Path::new("/exec/out/chart.svg")),
            ArtifactType::Plot
        );
        assert_eq!(
            ArtifactType::from_path(Path::new("/exec/Makefile")),
            ArtifactType::Document
        );
    }

    #[test]
    fn data_and_document_partition() {
        let data: Vec<_> = ArtifactType::ALL.iter().filter(|t| t.is_data()).collect();
        assert_eq!(data.len(), 3);
        for t in ArtifactType::ALL {
            assert_ne!(t.is_data(), t.is_document());
        }
    }

    #[test]
    fn parse_rejects_unknown() {
        let result = "spreadsheet".parse::<ArtifactType>();
        assert!(matches!(result, Err(ArtifactError::UnknownArtifactType(_))));
    }

    #[test]
    fn serde_uses_wire_names() {
        let json = serde_json::to_string(&ArtifactType::DataAnalysis).unwrap();
        assert_eq!(json, "\"data_analysis\"");
    }

    proptest! {
        #[test]
        fn display_parse_roundtrip_any_case(idx in 0..8usize, upper in any::<bool>()) {
            let t = ArtifactType::ALL[idx];
            let text = if upper { t.to_string().to_uppercase() } else { t.to_string() };
            prop_assert_eq!(text.parse::<ArtifactType>().unwrap(), t);
        }
    }
}
