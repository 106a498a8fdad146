//! Errors raised while constructing artifact model values

use std::path::PathBuf;

/// Validation errors for the artifact model
///
/// These are the only errors the model can produce; lookups elsewhere in the
/// system report misses as `None` or empty collections instead.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ArtifactError {
    /// Storage path is empty
    #[error("storage path is empty")]
    EmptyPath,

    /// Storage path is not absolute
    #[error("storage path must be absolute: {0}")]
    RelativePath(PathBuf),

    /// Storage path contains a `..` segment
    #[error("storage path contains parent-directory traversal: {0}")]
    PathTraversal(PathBuf),

    /// Artifact type string does not name a known type
    #[error("unknown artifact type: '{0}'")]
    UnknownArtifactType(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = ArtifactError::RelativePath(PathBuf::from("out.csv"));
        assert_eq!(err.to_string(), "storage path must be absolute: out.csv");

        let err = ArtifactError::UnknownArtifactType("blob".to_string());
        assert_eq!(err.to_string(), "unknown artifact type: 'blob'");
    }
}
