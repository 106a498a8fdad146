//! Validated storage paths
//!
//! Provides [`StoragePath`], the absolute, lexically normalized location an
//! artifact is identified by. Validation is purely lexical: it never touches
//! the filesystem and is not a sandbox.

use crate::error::ArtifactError;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use std::path::{Component, Path, PathBuf};

/// Absolute, normalized path of an artifact on disk
///
/// # Invariants
/// - Always absolute
/// - Never contains `..`
/// - `.` segments and repeated separators are removed
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "PathBuf", into = "PathBuf")]
pub struct StoragePath(PathBuf);

impl StoragePath {
    /// Validate and normalize a path
    ///
    /// # Errors
    /// - [`ArtifactError::EmptyPath`] for an empty input
    /// - [`ArtifactError::RelativePath`] if the path is not absolute
    /// - [`ArtifactError::PathTraversal`] if any segment is `..`
    pub fn new(path: impl AsRef<Path>) -> Result<Self, ArtifactError> {
        let path = path.as_ref();
        if path.as_os_str().is_empty() {
            return Err(ArtifactError::EmptyPath);
        }
        if !path.is_absolute() {
            return Err(ArtifactError::RelativePath(path.to_path_buf()));
        }

        let mut normalized = PathBuf::new();
        for component in path.components() {
            match component {
                Component::ParentDir => {
                    return Err(ArtifactError::PathTraversal(path.to_path_buf()));
                }
                Component::CurDir => {}
                other => normalized.push(other.as_os_str()),
            }
        }
        Ok(Self(normalized))
    }

    /// Borrow as a [`Path`]
    #[inline]
    #[must_use]
    pub fn as_path(&self) -> &Path {
        &self.0
    }

    /// Final component, if any
    #[inline]
    #[must_use]
    pub fn file_name(&self) -> Option<&str> {
        self.0.file_name().and_then(|n| n.to_str())
    }

    /// File name without its extension
    #[inline]
    #[must_use]
    pub fn file_stem(&self) -> Option<&str> {
        self.0.file_stem().and_then(|n| n.to_str())
    }

    /// Extension without the dot
    #[inline]
    #[must_use]
    pub fn extension(&self) -> Option<&str> {
        self.0.extension().and_then(|n| n.to_str())
    }

    /// Unwrap into the inner [`PathBuf`]
    #[inline]
    #[must_use]
    pub fn into_path_buf(self) -> PathBuf {
        self.0
    }
}

impl Display for StoragePath {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

impl AsRef<Path> for StoragePath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl TryFrom<PathBuf> for StoragePath {
    type Error = ArtifactError;

    fn try_from(value: PathBuf) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for StoragePath {
    type Error = ArtifactError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<StoragePath> for PathBuf {
    fn from(value: StoragePath) -> Self {
        value.0
    }
}
