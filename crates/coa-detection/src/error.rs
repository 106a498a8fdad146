//! Error types for the detection pipeline
//!
//! Detection never lets an error escape to the host. These types exist so
//! each detector can propagate with `?` internally and the pipeline can log a
//! precise reason before degrading to "nothing found".

use coa_artifact::ArtifactError;
use std::path::PathBuf;

/// Errors from the byte storage collaborator
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Key is absolute, empty, or climbs out of the storage root
    #[error("invalid storage key: '{0}'")]
    InvalidKey(String),

    /// Filesystem failure
    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl StorageError {
    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Errors from a table encoder
#[derive(Debug, thiserror::Error)]
pub enum EncodeError {
    /// Requested compression codec is not supported by this encoder
    #[error("codec '{codec}' unavailable for format '{format}'")]
    CodecUnavailable { codec: String, format: String },

    /// Table could not be written
    #[error("serialization failed: {0}")]
    Serialize(String),

    /// Bytes could not be read back as a table
    #[error("malformed table: {0}")]
    Malformed(String),
}

/// Combined detection error
#[derive(Debug, thiserror::Error)]
pub enum DetectionError {
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("encode error: {0}")]
    Encode(#[from] EncodeError),

    #[error("artifact error: {0}")]
    Artifact(#[from] ArtifactError),

    /// Filesystem failure outside of storage
    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Directory walk could not run to completion
    #[error("filesystem walk failed: {0}")]
    Walk(String),
}

impl DetectionError {
    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type alias for detection operations
pub type DetectionResult<T> = Result<T, DetectionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_error_display() {
        let err = StorageError::InvalidKey("../x".to_string());
        assert_eq!(err.to_string(), "invalid storage key: '../x'");
    }

    #[test]
    fn encode_error_display() {
        let err = EncodeError::CodecUnavailable {
            codec: "zstd".to_string(),
            format: "columnar-json".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "codec 'zstd' unavailable for format 'columnar-json'"
        );
    }

    #[test]
    fn error_conversions() {
        let err: DetectionError = StorageError::InvalidKey("/abs".to_string()).into();
        assert!(matches!(err, DetectionError::Storage(_)));

        let err: DetectionError = ArtifactError::EmptyPath.into();
        assert!(matches!(err, DetectionError::Artifact(_)));
    }
}
