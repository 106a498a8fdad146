//! Byte storage collaborator
//!
//! Detectors never write to disk directly. They hand bytes to a
//! [`ByteStorage`] under a relative key and get back the absolute location,
//! which becomes the artifact's storage path.

use crate::error::StorageError;
use async_trait::async_trait;
use std::fmt::Debug;
use std::path::{Component, Path, PathBuf};

/// Keyed byte store rooted at an execution directory
#[async_trait]
pub trait ByteStorage: Send + Sync + Debug {
    /// Absolute root every key resolves under
    fn root(&self) -> &Path;

    /// Execution this storage belongs to
    fn execution_id(&self) -> &str;

    /// Store bytes under `key`, returning the absolute path written
    async fn put(&self, key: &str, bytes: Vec<u8>) -> Result<PathBuf, StorageError>;

    /// Read bytes stored under `key`; `None` if nothing is stored there
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError>;

    /// Remove whatever is stored under `key`; a missing entry is not an error
    async fn delete(&self, key: &str) -> Result<(), StorageError>;
}

/// Local-disk storage backed by `tokio::fs`
#[derive(Debug, Clone)]
pub struct LocalStorage {
    root: PathBuf,
    execution_id: String,
}

impl LocalStorage {
    /// Open storage at `root`, creating the directory if needed
    ///
    /// The root is canonicalized so that paths handed out by `put` compare
    /// equal to paths discovered by walking the same directory.
    ///
    /// # Errors
    /// Returns [`StorageError::Io`] if the directory cannot be created or resolved.
    pub fn open(root: impl AsRef<Path>, execution_id: impl Into<String>) -> Result<Self, StorageError> {
        let root = root.as_ref();
        std::fs::create_dir_all(root).map_err(|e| StorageError::io_error(root, e))?;
        let root = std::fs::canonicalize(root).map_err(|e| StorageError::io_error(root, e))?;
        Ok(Self {
            root,
            execution_id: execution_id.into(),
        })
    }

    /// Resolve a key to an absolute path under the root
    ///
    /// # Errors
    /// Returns [`StorageError::InvalidKey`] for empty, absolute or escaping keys.
    pub fn resolve(&self, key: &str) -> Result<PathBuf, StorageError> {
        let relative = Path::new(key);
        if key.is_empty() {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if escapes {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl ByteStorage for LocalStorage {
    fn root(&self) -> &Path {
        &self.root
    }

    fn execution_id(&self) -> &str {
        &self.execution_id
    }

    async fn put(&self, key: &str, bytes: Vec<u8>) -> Result<PathBuf, StorageError> {
        let path = self.resolve(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StorageError::io_error(parent, e))?;
        }
        tokio::fs::write(&path, &bytes)
            .await
            .map_err(|e| StorageError::io_error(&path, e))?;

        tracing::debug!(key, bytes = bytes.len(), path = %path.display(), "stored bytes");
        Ok(path)
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        let path = self.resolve(key)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::io_error(&path, e)),
        }
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        let path = self.resolve(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                tracing::debug!(key, path = %path.display(), "deleted bytes");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::io_error(&path, e)),
        }
    }
}
