//! errorchain-core — the error chain model shared by the ErrorChain crates.
//!
//! This crate defines:
//! - [`ErrorNode`] — a chain node that decomposes into leaf / wrapper / join
//! - [`Describer`], [`SafeDetailProvider`], [`StackProvider`] — optional capabilities
//! - built-in kinds ([`BasicError`], [`WithPrefix`], [`WithMessage`], [`WithStack`], [`Join`])
//! - [`OpaqueLeaf`], [`OpaqueWrapper`], [`OpaqueJoin`] — stand-ins for unknown kinds
//! - [`EncodedNode`] — the wire schema
//! - [`TypeRegistry`] — per-kind codecs and type migrations
//! - [`RedactableString`] — text with untrusted regions marked for redaction

pub mod capability;
pub mod chain;
pub mod config;
pub mod error;
pub mod opaque;
pub mod redact;
pub mod registry;
pub mod stack;
pub mod types;
pub mod wire;

pub use capability::{Describer, LayerDescription, SafeDetailProvider, StackProvider};
pub use chain::{
    chain_contains, depth, equivalent, root_cause, walk, BoxedNode, Decomposed, ErrorNode, TypeKey,
};
pub use config::CodecConfig;
pub use error::{ConfigError, WireError};
pub use opaque::{OpaqueJoin, OpaqueLeaf, OpaqueWrapper};
pub use redact::{RedactableLine, RedactableString};
pub use registry::{
    register_leaf_decoder, register_leaf_encoder, register_multi_cause_decoder,
    register_multi_cause_encoder, register_type_migration, register_wrapper_decoder,
    register_wrapper_encoder, JoinInput, JoinParts, LeafInput, LeafParts, TypeRegistry,
    WrapperInput, WrapperParts,
};
pub use stack::{capture_stack, elide_shared_suffix, Frame, StackTrace};
pub use types::{
    join, new_error, new_error_with_stack, with_stack, wrap, wrap_full, BasicError,
    DecodeFailure, Join, WithMessage, WithPrefix, WithStack,
};
pub use wire::{compose_message, derive_fragment, Details, EncodedNode, MessageMode};
