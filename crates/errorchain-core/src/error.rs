//! Error types for the ErrorChain wire and configuration layers.
//!
//! The encode/decode/render paths never return these to their callers; they
//! surface only where text is parsed (wire JSON, payloads, config files).

use thiserror::Error;

/// Errors converting wire trees or payloads to and from bytes.
#[derive(Debug, Error)]
pub enum WireError {
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("Invalid payload for {type_url}: {reason}")]
    InvalidPayload { type_url: String, reason: String },
}

/// Errors loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}
