//! Wire form of an error chain.
//!
//! JSON, internally tagged by `kind`:
//!
//! ```json
//! { "kind": "wrapper",
//!   "type_key": "errorchain_core::types::WithPrefix",
//!   "message_fragment": "world",
//!   "message_mode": "prefix",
//!   "cause": { "kind": "leaf", "type_key": "errorchain_core::types::BasicError", "message": "hello" } }
//! ```
//!
//! Messages written before `message_mode` existed decode as `prefix`. When such
//! a legacy wrapper stored its full message as the fragment, the cause text is
//! rendered twice; that behavior is kept as-is.

use serde::{Deserialize, Serialize};

use crate::chain::TypeKey;
use crate::error::WireError;

/// How a wrapper's message relates to its fragment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageMode {
    /// message = fragment + ": " + cause message (just the cause message when
    /// the fragment is empty).
    #[default]
    Prefix,
    /// The fragment is the whole message.
    Full,
}

/// Build a wrapper's message from its fragment.
pub fn compose_message(fragment: &str, mode: MessageMode, cause_message: &str) -> String {
    match mode {
        MessageMode::Full => fragment.to_string(),
        MessageMode::Prefix if fragment.is_empty() => cause_message.to_string(),
        MessageMode::Prefix => format!("{fragment}: {cause_message}"),
    }
}

/// Recover a wrapper's fragment by stripping the cause message off the end of
/// its own message. Falls back to [`MessageMode::Full`] with the whole message
/// when the suffix does not match cleanly, so decoding never repeats the
/// cause text.
pub fn derive_fragment(message: &str, cause_message: &str) -> (String, MessageMode) {
    if message == cause_message {
        return (String::new(), MessageMode::Prefix);
    }
    if let Some(prefix) = message
        .strip_suffix(cause_message)
        .and_then(|rest| rest.strip_suffix(": "))
    {
        if !prefix.is_empty() {
            return (prefix.to_string(), MessageMode::Prefix);
        }
    }
    (message.to_string(), MessageMode::Full)
}

/// Join per-cause messages the way a multi-cause join does.
pub fn join_messages<I, S>(messages: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out = String::new();
    for (i, m) in messages.into_iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        out.push_str(m.as_ref());
    }
    out
}

// ─── Details ──────────────────────────────────────────────────────────────────

/// Per-node payload shared by every encoded shape.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Details {
    /// Strings known to be free of sensitive data.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub safe_details: Vec<String>,
    /// Codec-specific bytes, hex-encoded on the wire.
    #[serde(default, with = "hex_bytes", skip_serializing_if = "Vec::is_empty")]
    pub opaque_payload: Vec<u8>,
    /// Identifies the payload's format.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub opaque_payload_type_url: String,
}

impl Details {
    pub fn with_safe_details(safe_details: Vec<String>) -> Self {
        Self {
            safe_details,
            ..Self::default()
        }
    }

    pub fn with_payload(mut self, type_url: impl Into<String>, payload: Vec<u8>) -> Self {
        self.opaque_payload_type_url = type_url.into();
        self.opaque_payload = payload;
        self
    }

    pub fn has_payload(&self) -> bool {
        !self.opaque_payload.is_empty() || !self.opaque_payload_type_url.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.safe_details.is_empty() && !self.has_payload()
    }
}

mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<u8>, D::Error> {
        let text = String::deserialize(d)?;
        hex::decode(text).map_err(serde::de::Error::custom)
    }
}

// ─── EncodedNode ──────────────────────────────────────────────────────────────

/// Wire mirror of an error chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EncodedNode {
    Leaf {
        #[serde(default)]
        type_key: TypeKey,
        #[serde(default)]
        message: String,
        #[serde(default, skip_serializing_if = "Details::is_empty")]
        details: Details,
    },
    Wrapper {
        #[serde(default)]
        type_key: TypeKey,
        #[serde(default = "absent_cause")]
        cause: Box<EncodedNode>,
        #[serde(default)]
        message_fragment: String,
        #[serde(default)]
        message_mode: MessageMode,
        #[serde(default, skip_serializing_if = "Details::is_empty")]
        details: Details,
    },
    MultiCauseJoin {
        #[serde(default)]
        type_key: TypeKey,
        #[serde(default)]
        causes: Vec<EncodedNode>,
        /// The join's own message when it differs from the joined cause
        /// messages. Empty means "join the causes", so a join whose message is
        /// itself empty cannot be told apart and decodes with the joined text.
        #[serde(default)]
        message_fragment: String,
        #[serde(default, skip_serializing_if = "Details::is_empty")]
        details: Details,
    },
    /// No error.
    Absent,
}

fn absent_cause() -> Box<EncodedNode> {
    Box::new(EncodedNode::Absent)
}

impl EncodedNode {
    pub fn leaf(type_key: impl Into<TypeKey>, message: impl Into<String>) -> Self {
        Self::Leaf {
            type_key: type_key.into(),
            message: message.into(),
            details: Details::default(),
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }

    pub fn type_key(&self) -> Option<&TypeKey> {
        match self {
            Self::Leaf { type_key, .. }
            | Self::Wrapper { type_key, .. }
            | Self::MultiCauseJoin { type_key, .. } => Some(type_key),
            Self::Absent => None,
        }
    }

    pub fn details(&self) -> Option<&Details> {
        match self {
            Self::Leaf { details, .. }
            | Self::Wrapper { details, .. }
            | Self::MultiCauseJoin { details, .. } => Some(details),
            Self::Absent => None,
        }
    }

    /// The message a decoded chain would report, computed without decoding.
    pub fn message(&self) -> String {
        match self {
            Self::Leaf { message, .. } => message.clone(),
            Self::Wrapper {
                cause,
                message_fragment,
                message_mode,
                ..
            } => compose_message(message_fragment, *message_mode, &cause.message()),
            Self::MultiCauseJoin {
                causes,
                message_fragment,
                ..
            } => {
                if message_fragment.is_empty() {
                    join_messages(causes.iter().map(EncodedNode::message))
                } else {
                    message_fragment.clone()
                }
            }
            Self::Absent => String::new(),
        }
    }

    pub fn to_json(&self) -> Result<String, WireError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn to_json_pretty(&self) -> Result<String, WireError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse wire text. Nesting depth is not limited here; chains are as deep
    /// as their encoder made them (see [`crate::CodecConfig::max_depth`]).
    pub fn from_json(json: &str) -> Result<Self, WireError> {
        Self::from_deserializer(serde_json::Deserializer::from_str(json))
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, WireError> {
        Self::from_deserializer(serde_json::Deserializer::from_slice(bytes))
    }

    fn from_deserializer<'de, R: serde_json::de::Read<'de>>(
        mut de: serde_json::Deserializer<R>,
    ) -> Result<Self, WireError> {
        de.disable_recursion_limit();
        let node = Self::deserialize(serde_stacker::Deserializer::new(&mut de))?;
        de.end()?;
        Ok(node)
    }
}
