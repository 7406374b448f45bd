//! CLI configuration file.
//!
//! ```json
//! {
//!   "log":   { "level": "info", "components": { "errorchain-codec": "debug" } },
//!   "codec": { "max_depth": 64 }
//! }
//! ```

use std::path::Path;

use anyhow::Context;
use errorchain_core::CodecConfig;
use serde::{Deserialize, Serialize};

use crate::logging::LogConfig;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CliConfig {
    #[serde(default)]
    pub log: LogConfig,
    #[serde(default)]
    pub codec: CodecConfig,
}

impl CliConfig {
    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        let config: Self = serde_json::from_str(json).context("invalid config JSON")?;
        config.codec.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        Self::from_json(&content).with_context(|| format!("loading {}", path.display()))
    }
}
