// SPDX-License-Identifier: MIT OR Apache-2.0
//! Timeline settings persisted as RON.

use crate::keyframe::Frame;
use crate::play_data::DEFAULT_TOTAL_FRAMES;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Errors raised while loading or saving a config file
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File could not be read or written
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// File is not valid RON for this config
    #[error("Failed to parse config: {0}")]
    Parse(#[from] ron::error::SpannedError),
    /// Config could not be encoded
    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] ron::Error),
    /// A field is out of range
    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Timeline settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimelineConfig {
    /// Length of a new document
    pub default_total_frames: Frame,
    /// Spaces per nesting level when writing documents
    pub indent: usize,
    /// Whether a document without a version tag is loaded
    pub accept_missing_version: bool,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            default_total_frames: DEFAULT_TOTAL_FRAMES,
            indent: 2,
            accept_missing_version: true,
        }
    }
}

impl TimelineConfig {
    /// Parse from a RON string
    pub fn from_ron(s: &str) -> Result<Self, ConfigError> {
        let config: Self = ron::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Encode as a RON string
    pub fn to_ron(&self) -> Result<String, ConfigError> {
        let pretty = ron::ser::PrettyConfig::default().struct_names(true);
        Ok(ron::ser::to_string_pretty(self, pretty)?)
    }

    /// Load from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_ron(&content)?;
        tracing::debug!("Loaded timeline config from {:?}", path);
        Ok(config)
    }

    /// Save to a file
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        std::fs::write(path, self.to_ron()?)?;
        Ok(())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.default_total_frames <= 0 {
            return Err(ConfigError::Invalid(format!(
                "default_total_frames must be positive, got {}",
                self.default_total_frames
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip() {
        let config = TimelineConfig {
            default_total_frames: 240,
            indent: 4,
            accept_missing_version: false,
        };
        let ron = config.to_ron().unwrap();
        assert_eq!(TimelineConfig::from_ron(&ron).unwrap(), config);
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let config = TimelineConfig::from_ron("(indent: 8)").unwrap();
        assert_eq!(config.indent, 8);
        assert_eq!(config.default_total_frames, 600);
        assert!(config.accept_missing_version);
    }

    #[test]
    fn test_rejects_empty_document_length() {
        let err = TimelineConfig::from_ron("(default_total_frames: 0)").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_rejects_malformed_ron() {
        assert!(matches!(
            TimelineConfig::from_ron("(indent: \"two\")"),
            Err(ConfigError::Parse(_))
        ));
    }
}
