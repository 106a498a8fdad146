//! Error types for the lifecycle layer
//!
//! Detection never fails loudly. The two things that can are handled here:
//! - explicit, user-invoked registration ([`RegistrationError`])
//! - loading configuration ([`ConfigError`])

use coa_artifact::{Artifact, ArtifactError, ArtifactId};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Validation failures of an explicit registration request
#[derive(Debug, thiserror::Error)]
pub enum RegistrationError {
    /// Target file does not exist
    #[error("file not found: {0}")]
    FileNotFound(PathBuf),

    /// Target exists but is not a regular file
    #[error("not a regular file: {0}")]
    NotAFile(PathBuf),

    /// Artifact type string does not name a known type
    #[error("invalid artifact type: '{0}'")]
    InvalidArtifactType(String),

    /// Lineage entry is not an artifact id
    #[error("invalid parent artifact id: '{0}'")]
    InvalidParentId(String),

    /// Storage path rejected by the artifact model
    #[error("invalid path: {0}")]
    InvalidPath(#[from] ArtifactError),

    /// Filesystem failure while checking the target
    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl RegistrationError {
    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Structured result handed back to the caller of the registration tool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationOutcome {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifact_id: Option<ArtifactId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<&Result<Artifact, RegistrationError>> for RegistrationOutcome {
    fn from(result: &Result<Artifact, RegistrationError>) -> Self {
        match result {
            Ok(artifact) => Self {
                success: true,
                artifact_id: Some(artifact.id),
                error: None,
            },
            Err(e) => Self {
                success: false,
                artifact_id: None,
                error: Some(e.to_string()),
            },
        }
    }
}

/// Configuration loading failures
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registration_error_display() {
        let err = RegistrationError::InvalidArtifactType("spreadsheet".to_string());
        assert_eq!(err.to_string(), "invalid artifact type: 'spreadsheet'");

        let err: RegistrationError = ArtifactError::RelativePath(PathBuf::from("a.txt")).into();
        assert!(matches!(err, RegistrationError::InvalidPath(_)));
    }

    #[test]
    fn outcome_from_results() {
        let artifact = Artifact::builder("/exec/a.txt").build().unwrap();
        let result: Result<Artifact, RegistrationError> = Ok(artifact.clone());
        let ok = RegistrationOutcome::from(&result);
        assert!(ok.success);
        assert_eq!(ok.artifact_id, Some(artifact.id));

        let result: Result<Artifact, RegistrationError> =
            Err(RegistrationError::FileNotFound(PathBuf::from("/exec/missing.txt")));
        let err = RegistrationOutcome::from(&result);
        assert!(!err.success);
        assert_eq!(err.error.as_deref(), Some("file not found: /exec/missing.txt"));

        let json = serde_json::to_string(&err).unwrap();
        assert!(!json.contains("artifact_id"));
    }
}
