//! `ChainEncoder` — error chain → [`EncodedNode`].
//!
//! Per layer:
//! 1. Opaque stand-ins  → re-emit exactly what they preserved
//! 2. Registered codec  → use its parts
//! 3. Fallback          → structural derivation from `message()`

use std::sync::Arc;

use errorchain_core::registry::{JoinParts, LeafParts, WrapperParts};
use errorchain_core::wire::join_messages;
use errorchain_core::{
    derive_fragment, CodecConfig, Decomposed, Details, EncodedNode, ErrorNode, OpaqueJoin,
    OpaqueLeaf, OpaqueWrapper, TypeRegistry,
};

/// Encodes error chains for transport.
#[derive(Debug, Clone)]
pub struct ChainEncoder {
    registry: Arc<TypeRegistry>,
    config: CodecConfig,
}

impl ChainEncoder {
    /// An encoder backed by the process-wide registry.
    pub fn new() -> Self {
        Self::with_registry(TypeRegistry::global())
    }

    /// An encoder backed by a custom registry (for tests or relays).
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

    pub fn encode(&self, node: &dyn ErrorNode) -> EncodedNode {
        self.encode_layer(node, 1)
    }

    /// `None` encodes as [`EncodedNode::Absent`].
    pub fn encode_opt(&self, node: Option<&dyn ErrorNode>) -> EncodedNode {
        match node {
            Some(node) => self.encode(node),
            None => EncodedNode::Absent,
        }
    }

    fn encode_layer(&self, node: &dyn ErrorNode, depth: usize) -> EncodedNode {
        // The node at the cap keeps its identity and message but sheds its
        // causes, so the encoded tree is never deeper than `max_depth`.
        if self.config.at_limit(depth) && !matches!(node.decompose(), Decomposed::Leaf) {
            tracing::warn!(
                depth,
                max_depth = ?self.config.max_depth,
                type_key = %node.type_key(),
                "error chain exceeds max depth; flattening remainder"
            );
            return EncodedNode::Leaf {
                type_key: node.type_key(),
                message: node.message(),
                details: Details::with_safe_details(node.safe_details()),
            };
        }

        if let Some(encoded) = self.encode_opaque(node, depth) {
            return encoded;
        }

        let type_key = node.type_key();
        tracing::trace!(type_key = %type_key, depth, "encoding layer");

        match node.decompose() {
            Decomposed::Leaf => {
                let parts = match self.registry.leaf_encoder(&type_key) {
                    Some(encoder) => encoder(node),
                    None => LeafParts {
                        message: node.message(),
                        details: Details::with_safe_details(node.safe_details()),
                    },
                };
                EncodedNode::Leaf {
                    type_key,
                    message: parts.message,
                    details: parts.details,
                }
            }
            Decomposed::Wrapper(cause) => {
                let encoded_cause = self.encode_layer(cause, depth + 1);
                let parts = match self.registry.wrapper_encoder(&type_key) {
                    Some(encoder) => encoder(node),
                    None => {
                        let (fragment, mode) = derive_fragment(&node.message(), &cause.message());
                        WrapperParts {
                            fragment,
                            mode,
                            details: Details::with_safe_details(node.safe_details()),
                        }
                    }
                };
                EncodedNode::Wrapper {
                    type_key,
                    cause: Box::new(encoded_cause),
                    message_fragment: parts.fragment,
                    message_mode: parts.mode,
                    details: parts.details,
                }
            }
            Decomposed::Join(causes) => {
                let encoded_causes = causes
                    .iter()
                    .map(|c| self.encode_layer(&**c, depth + 1))
                    .collect();
                let parts = match self.registry.multi_cause_encoder(&type_key) {
                    Some(encoder) => encoder(node),
                    None => {
                        let message = node.message();
                        let joined = join_messages(causes.iter().map(|c| c.message()));
                        if message.is_empty() && !joined.is_empty() {
                            tracing::debug!(
                                type_key = %type_key,
                                "join with empty message will decode with its causes' text"
                            );
                        }
                        JoinParts {
                            fragment: if message == joined { String::new() } else { message },
                            details: Details::with_safe_details(node.safe_details()),
                        }
                    }
                };
                EncodedNode::MultiCauseJoin {
                    type_key,
                    causes: encoded_causes,
                    message_fragment: parts.fragment,
                    details: parts.details,
                }
            }
        }
    }

    fn encode_opaque(&self, node: &dyn ErrorNode, depth: usize) -> Option<EncodedNode> {
        if let Some(leaf) = node.downcast_ref::<OpaqueLeaf>() {
            return Some(EncodedNode::Leaf {
                type_key: leaf.type_key(),
                message: leaf.message(),
                details: leaf.details().clone(),
            });
        }
        if let Some(wrapper) = node.downcast_ref::<OpaqueWrapper>() {
            return Some(EncodedNode::Wrapper {
                type_key: wrapper.type_key(),
                cause: Box::new(self.encode_layer(wrapper.cause(), depth + 1)),
                message_fragment: wrapper.fragment().to_string(),
                message_mode: wrapper.mode(),
                details: wrapper.details().clone(),
            });
        }
        if let Some(join) = node.downcast_ref::<OpaqueJoin>() {
            return Some(EncodedNode::MultiCauseJoin {
                type_key: join.type_key(),
                causes: node
                    .causes()
                    .into_iter()
                    .map(|c| self.encode_layer(c, depth + 1))
                    .collect(),
                message_fragment: join.fragment().to_string(),
                details: join.details().clone(),
            });
        }
        None
    }
}

impl Default for ChainEncoder {
    fn default() -> Self {
        Self::new()
    }
}
