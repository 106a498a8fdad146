//! Media classification shared with the message layer

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use std::path::Path;

/// Coarse media kind of a file, as understood by prompt assembly
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MediaType {
    /// Human-readable text (including structured text such as CSV or JSON)
    Text,
    /// Raster or vector image
    Image,
    /// Audio recording
    Audio,
    /// Video recording
    Video,
    /// Opaque file
    File,
}

impl MediaType {
    /// Wire name (`TEXT`, `IMAGE`, ...)
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "TEXT",
            Self::Image => "IMAGE",
            Self::Audio => "AUDIO",
            Self::Video => "VIDEO",
            Self::File => "FILE",
        }
    }

    /// Classify by extension (with or without the dot)
    #[must_use]
    pub fn from_extension(ext: &str) -> Self {
        let ext = ext.trim_start_matches('.').to_ascii_lowercase();
        match ext.as_str() {
            "txt" | "md" | "markdown" | "csv" | "tsv" | "json" | "jsonl" | "html" | "htm"
            | "xml" | "yaml" | "yml" | "toml" | "py" | "js" | "ts" | "java" | "cpp" | "c"
            | "go" | "rs" | "sh" | "log" => Self::Text,
            "png" | "jpg" | "jpeg" | "gif" | "bmp" | "tiff" | "webp" | "svg" => Self::Image,
            "mp3" | "wav" | "flac" | "ogg" | "m4a" => Self::Audio,
            "mp4" | "mov" | "avi" | "mkv" | "webm" => Self::Video,
            _ => Self::File,
        }
    }

    /// Classify by a path's extension
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        path.extension()
            .and_then(|e| e.to_str())
            .map_or(Self::File, Self::from_extension)
    }
}

/// Best-effort MIME type for a path's extension
#[must_use]
pub fn mime_type_for(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    let mime = match ext.as_str() {
        "txt" | "log" => "text/plain",
        "md" | "markdown" => "text/markdown",
        "csv" => "text/csv",
        "tsv" => "text/tab-separated-values",
        "json" => "application/json",
        "jsonl" => "application/x-ndjson",
        "html" | "htm" => "text/html",
        "xml" => "application/xml",
        "yaml" | "yml" => "application/yaml",
        "pdf" => "application/pdf",
        "parquet" => "application/vnd.apache.parquet",
        "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "webp" => "image/webp",
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "mp4" => "video/mp4",
        "zip" => "application/zip",
        _ => return None,
    };
    Some(mime)
}

impl Display for MediaType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mime_lookup() {
        assert_eq!(mime_type_for(Path::new("/x/a.CSV")), Some("text/csv"));
        assert_eq!(mime_type_for(Path::new("/x/a.png")), Some("image/png"));
        assert_eq!(mime_type_for(Path::new("/x/a.unknown")), None);
        assert_eq!(mime_type_for(Path::new("/x/noext")), None);
    }

    #[test]
    fn classifies_common_extensions() {
        assert_eq!(MediaType::from_extension("csv"), MediaType::Text);
        assert_eq!(MediaType::from_extension(".PNG"), MediaType::Image);
        assert_eq!(MediaType::from_extension("wav"), MediaType::Audio);
        assert_eq!(MediaType::from_extension("mp4"), MediaType::Video);
        assert_eq!(MediaType::from_extension("parquet"), MediaType::File);
    }

    #[test]
    fn path_without_extension_is_file() {
        assert_eq!(MediaType::from_path(Path::new("/exec/blob")), MediaType::File);
    }
}
