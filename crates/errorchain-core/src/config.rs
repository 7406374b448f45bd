//! Codec configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Limits applied by the encoder and decoder.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodecConfig {
    /// Deepest layer (root = 1) an encoded chain may have. The encoder
    /// flattens the node at this depth, with everything beneath it, into a
    /// single leaf; the decoder substitutes a placeholder for anything deeper.
    /// `None` means unbounded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_depth: Option<usize>,
}

impl CodecConfig {
    pub fn unbounded() -> Self {
        Self { max_depth: None }
    }

    pub fn with_max_depth(max_depth: usize) -> Self {
        Self {
            max_depth: Some(max_depth),
        }
    }

    /// Parse and validate a JSON config document.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_depth == Some(0) {
            return Err(ConfigError::InvalidValue {
                field: "max_depth".into(),
                reason: "must be at least 1".into(),
            });
        }
        Ok(())
    }

    /// `true` if a node at `depth` (root = 1) lies beyond the cap.
    pub fn exceeds(&self, depth: usize) -> bool {
        self.max_depth.is_some_and(|max| depth > max)
    }

    /// `true` if the causes of a node at `depth` would lie beyond the cap.
    pub fn at_limit(&self, depth: usize) -> bool {
        self.max_depth.is_some_and(|max| depth >= max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_unbounded() {
        let config = CodecConfig::default();
        assert_eq!(config, CodecConfig::unbounded());
        assert!(!config.exceeds(1_000_000));
        assert!(!config.at_limit(1_000_000));
    }

    #[test]
    fn parse_and_validate() {
        let config = CodecConfig::from_json(r#"{ "max_depth": 4 }"#).unwrap();
        assert_eq!(config.max_depth, Some(4));
        assert!(!config.exceeds(4));
        assert!(config.exceeds(5));
        assert!(!config.at_limit(3));
        assert!(config.at_limit(4));

        assert_eq!(CodecConfig::from_json("{}").unwrap(), CodecConfig::unbounded());
        assert!(matches!(
            CodecConfig::from_json(r#"{ "max_depth": 0 }"#),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(matches!(
            CodecConfig::from_json("not json"),
            Err(ConfigError::Parse(_))
        ));
    }
}
