//! `ChainDecoder` — [`EncodedNode`] → error chain.
//!
//! Decoding never fails. Per layer:
//! 1. Resolve the type key through registered migrations
//! 2. Registered decoder that accepts the wire shape → concrete node
//! 3. Unknown kind or declined shape → opaque stand-in
//! 4. Malformed or missing data → `DecodeFailure` placeholder

use std::sync::Arc;

use errorchain_core::registry::{JoinInput, LeafInput, WrapperInput};
use errorchain_core::{
    BoxedNode, CodecConfig, DecodeFailure, EncodedNode, OpaqueJoin, OpaqueLeaf, OpaqueWrapper,
    TypeRegistry,
};

/// Message of the placeholder standing in for a cause absent from the wire.
pub const MISSING_CAUSE: &str = "missing error cause";

/// Decodes error chains received from another process.
#[derive(Debug, Clone)]
pub struct ChainDecoder {
    registry: Arc<TypeRegistry>,
    config: CodecConfig,
}

impl ChainDecoder {
    /// A decoder backed by the process-wide registry.
    pub fn new() -> Self {
        Self::with_registry(TypeRegistry::global())
    }

    /// A decoder backed by a custom registry (for tests or relays).
    pub fn with_registry(registry: Arc<TypeRegistry>) -> Self {
        Self {
            registry,
            config: CodecConfig::default(),
        }
    }

    pub fn with_config(mut self, config: CodecConfig) -> Self {
        self.config = config;
        self
    }

    pub fn registry(&self) -> &Arc<TypeRegistry> {
        &self.registry
    }

    /// `None` for [`EncodedNode::Absent`].
    pub fn decode(&self, encoded: &EncodedNode) -> Option<BoxedNode> {
        if encoded.is_absent() {
            return None;
        }
        Some(self.decode_layer(encoded, 1))
    }

    /// Parse JSON wire text and decode it. Unparseable input yields a
    /// `DecodeFailure` describing the parse error.
    pub fn decode_json(&self, json: &str) -> Option<BoxedNode> {
        match EncodedNode::from_json(json) {
            Ok(encoded) => self.decode(&encoded),
            Err(e) => {
                tracing::warn!(error = %e, "malformed encoded error");
                Some(Box::new(DecodeFailure::new(format!(
                    "malformed encoded error: {e}"
                ))))
            }
        }
    }

    fn decode_layer(&self, encoded: &EncodedNode, depth: usize) -> BoxedNode {
        if self.config.exceeds(depth) {
            tracing::warn!(
                depth,
                max_depth = ?self.config.max_depth,
                "encoded error chain exceeds max depth; substituting placeholder"
            );
            return Box::new(DecodeFailure::new(encoded.message()));
        }

        match encoded {
            EncodedNode::Absent => {
                tracing::warn!(depth, "encoded error is missing a cause");
                Box::new(DecodeFailure::new(MISSING_CAUSE))
            }
            EncodedNode::Leaf {
                type_key,
                message,
                details,
            } => {
                let resolved = self.registry.resolve(type_key);
                if let Some(decoder) = self.registry.leaf_decoder(&resolved) {
                    let input = LeafInput {
                        type_key: &resolved,
                        message,
                        details,
                    };
                    if let Some(node) = decoder(&input) {
                        return node;
                    }
                    tracing::debug!(type_key = %resolved, "leaf decoder declined payload");
                } else {
                    tracing::debug!(type_key = %resolved, "unknown leaf kind; decoding opaquely");
                }
                Box::new(OpaqueLeaf::new(type_key.clone(), message.as_str(), details.clone()))
            }
            EncodedNode::Wrapper {
                type_key,
                cause,
                message_fragment,
                message_mode,
                details,
            } => {
                let mut decoded_cause = self.decode_layer(cause, depth + 1);
                let resolved = self.registry.resolve(type_key);
                if let Some(decoder) = self.registry.wrapper_decoder(&resolved) {
                    let input = WrapperInput {
                        type_key: &resolved,
                        fragment: message_fragment,
                        mode: *message_mode,
                        details,
                    };
                    match decoder(decoded_cause, &input) {
                        Ok(node) => return node,
                        Err(cause) => {
                            tracing::debug!(type_key = %resolved, "wrapper decoder declined payload");
                            decoded_cause = cause;
                        }
                    }
                } else {
                    tracing::debug!(type_key = %resolved, "unknown wrapper kind; decoding opaquely");
                }
                Box::new(OpaqueWrapper::new(
                    type_key.clone(),
                    decoded_cause,
                    message_fragment.as_str(),
                    *message_mode,
                    details.clone(),
                ))
            }
            EncodedNode::MultiCauseJoin {
                type_key,
                causes,
                message_fragment,
                details,
            } => {
                let mut decoded_causes: Vec<BoxedNode> = causes
                    .iter()
                    .map(|c| self.decode_layer(c, depth + 1))
                    .collect();
                let resolved = self.registry.resolve(type_key);
                if let Some(decoder) = self.registry.multi_cause_decoder(&resolved) {
                    let input = JoinInput {
                        type_key: &resolved,
                        fragment: message_fragment,
                        details,
                    };
                    match decoder(decoded_causes, &input) {
                        Ok(node) => return node,
                        Err(causes) => {
                            tracing::debug!(type_key = %resolved, "multi-cause decoder declined payload");
                            decoded_causes = causes;
                        }
                    }
                } else {
                    tracing::debug!(type_key = %resolved, "unknown multi-cause kind; decoding opaquely");
                }
                Box::new(OpaqueJoin::new(
                    type_key.clone(),
                    decoded_causes,
                    message_fragment.as_str(),
                    details.clone(),
                ))
            }
        }
    }
}

impl Default for ChainDecoder {
    fn default() -> Self {
        Self::new()
    }
}
