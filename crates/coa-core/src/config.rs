//! Artifact lifecycle configuration
//!
//! Loaded from TOML; every field is optional.
//!
//! ```toml
//! injection_mode = "dependencies"
//!
//! [detection]
//! filesystem_scan = true
//! priority_threshold_kb = 1000.0
//! filesystem_buffer_secs = 0
//! preferred_codec = "zstd"
//! fallback_codec = "none"
//! ```

use crate::error::ConfigError;
use coa_detection::DetectionConfig;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use std::path::Path;
use std::str::FromStr;

/// Which artifacts a task gets to see in its prompt context
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InjectionMode {
    /// Nothing
    None,
    /// Artifacts of the tasks this one depends on
    #[default]
    Dependencies,
    /// Artifacts within the task's planning subgraph
    Subtask,
    /// Everything in the registry
    Full,
}

impl InjectionMode {
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Dependencies => "dependencies",
            Self::Subtask => "subtask",
            Self::Full => "full",
        }
    }
}

impl Display for InjectionMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InjectionMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(Self::None),
            "dependencies" => Ok(Self::Dependencies),
            "subtask" => Ok(Self::Subtask),
            "full" => Ok(Self::Full),
            other => Err(ConfigError::InvalidValue {
                field: "injection_mode",
                reason: format!("unknown mode '{other}'"),
            }),
        }
    }
}

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ArtifactConfig {
    pub injection_mode: InjectionMode,
    pub detection: DetectionConfig,
}

impl ArtifactConfig {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    #[must_use]
    pub fn with_injection_mode(mut self, mode: InjectionMode) -> Self {
        self.injection_mode = mode;
        self
    }

    #[inline]
    #[must_use]
    pub fn with_detection(mut self, detection: DetectionConfig) -> Self {
        self.detection = detection;
        self
    }

    /// Parse and validate a TOML document
    ///
    /// # Errors
    /// [`ConfigError::Parse`] for malformed TOML, [`ConfigError::InvalidValue`]
    /// for out-of-range values.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file
    ///
    /// # Errors
    /// [`ConfigError::Io`] if the file cannot be read, otherwise as
    /// [`ArtifactConfig::from_toml_str`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&source)
    }

    /// Check value ranges
    ///
    /// # Errors
    /// [`ConfigError::InvalidValue`] naming the offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let threshold = self.detection.priority_threshold_kb;
        if !threshold.is_finite() || threshold < 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "detection.priority_threshold_kb",
                reason: format!("must be a non-negative number, got {threshold}"),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use coa_detection::CompressionCodec;

    #[test]
    fn empty_document_is_default() {
        let config = ArtifactConfig::from_toml_str("").unwrap();
        assert_eq!(config, ArtifactConfig::default());
        assert_eq!(config.injection_mode, InjectionMode::Dependencies);
    }

    #[test]
    fn partial_document() {
        let config = ArtifactConfig::from_toml_str(
            r#"
injection_mode = "subtask"

[detection]
filesystem_scan = false
filesystem_buffer_secs = 5
fallback_codec = "snappy"
"#,
        )
        .unwrap();

        assert_eq!(config.injection_mode, InjectionMode::Subtask);
        assert!(!config.detection.filesystem_scan);
        assert!(config.detection.declaration_parser);
        assert_eq!(config.detection.filesystem_buffer_secs, 5);
        assert_eq!(config.detection.fallback_codec, CompressionCodec::Snappy);
    }

    #[test]
    fn rejects_unknown_keys_and_bad_values() {
        assert!(matches!(
            ArtifactConfig::from_toml_str("mode = \"full\""),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            ArtifactConfig::from_toml_str("[detection]\npriority_threshold_kb = -1.0"),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn load_reports_missing_file() {
        let err = ArtifactConfig::load("/definitely/not/here.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn mode_parsing() {
        assert_eq!("FULL".parse::<InjectionMode>().unwrap(), InjectionMode::Full);
        assert_eq!(InjectionMode::None.to_string(), "none");
        assert!("everything".parse::<InjectionMode>().is_err());
    }
}
