//! Type registry — maps [`TypeKey`]s to custom encoders and decoders.
//!
//! Lookups fall through to structural encoding and opaque decoding, so a
//! registry only needs entries for kinds that carry extra data (payloads) or
//! that must come back as their concrete type after a round trip.
//!
//! One process-wide instance is available through [`TypeRegistry::global`];
//! the free `register_*` functions write to it. Separate instances can be
//! built for tests or for relays that must stay ignorant of every kind.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::RwLock;

use crate::chain::{BoxedNode, ErrorNode, TypeKey};
use crate::stack::{StackTrace, STACK_PAYLOAD_TYPE_URL};
use crate::types::{BasicError, DecodeFailure, Join, WithMessage, WithPrefix, WithStack};
use crate::wire::{derive_fragment, Details, MessageMode};

// ─── Codec parts ──────────────────────────────────────────────────────────────

/// What a leaf encoder contributes to the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LeafParts {
    pub message: String,
    pub details: Details,
}

/// What a wrapper encoder contributes to the wire. The cause is encoded
/// separately.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WrapperParts {
    pub fragment: String,
    pub mode: MessageMode,
    pub details: Details,
}

/// What a multi-cause encoder contributes to the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JoinParts {
    pub fragment: String,
    pub details: Details,
}

/// Wire fields handed to a leaf decoder.
#[derive(Debug, Clone, Copy)]
pub struct LeafInput<'a> {
    pub type_key: &'a TypeKey,
    pub message: &'a str,
    pub details: &'a Details,
}

/// Wire fields handed to a wrapper decoder, next to the decoded cause.
#[derive(Debug, Clone, Copy)]
pub struct WrapperInput<'a> {
    pub type_key: &'a TypeKey,
    pub fragment: &'a str,
    pub mode: MessageMode,
    pub details: &'a Details,
}

/// Wire fields handed to a multi-cause decoder, next to the decoded causes.
#[derive(Debug, Clone, Copy)]
pub struct JoinInput<'a> {
    pub type_key: &'a TypeKey,
    pub fragment: &'a str,
    pub details: &'a Details,
}

pub type LeafEncoder = Arc<dyn Fn(&dyn ErrorNode) -> LeafParts + Send + Sync>;
pub type WrapperEncoder = Arc<dyn Fn(&dyn ErrorNode) -> WrapperParts + Send + Sync>;
pub type JoinEncoder = Arc<dyn Fn(&dyn ErrorNode) -> JoinParts + Send + Sync>;

/// Returns `None` to decline the wire shape.
pub type LeafDecoder = Arc<dyn Fn(&LeafInput<'_>) -> Option<BoxedNode> + Send + Sync>;
/// Returns `Err(cause)` to decline, handing the cause back untouched.
pub type WrapperDecoder =
    Arc<dyn Fn(BoxedNode, &WrapperInput<'_>) -> Result<BoxedNode, BoxedNode> + Send + Sync>;
/// Returns `Err(causes)` to decline, handing the causes back untouched.
pub type JoinDecoder = Arc<
    dyn Fn(Vec<BoxedNode>, &JoinInput<'_>) -> Result<BoxedNode, Vec<BoxedNode>> + Send + Sync,
>;

// ─── TypeRegistry ─────────────────────────────────────────────────────────────

#[derive(Default)]
struct Inner {
    leaf_encoders: HashMap<TypeKey, LeafEncoder>,
    leaf_decoders: HashMap<TypeKey, LeafDecoder>,
    wrapper_encoders: HashMap<TypeKey, WrapperEncoder>,
    wrapper_decoders: HashMap<TypeKey, WrapperDecoder>,
    join_encoders: HashMap<TypeKey, JoinEncoder>,
    join_decoders: HashMap<TypeKey, JoinDecoder>,
    /// (old module path, old type name) → current key
    migrations: HashMap<(String, String), TypeKey>,
}

/// Registry of per-kind codecs and type migrations.
///
/// Registration replaces any earlier entry for the same key. There is no
/// unregister.
pub struct TypeRegistry {
    inner: RwLock<Inner>,
}

static GLOBAL: Lazy<Arc<TypeRegistry>> = Lazy::new(|| Arc::new(TypeRegistry::new()));

impl TypeRegistry {
    /// A registry with no entries at all; every kind decodes opaquely.
    pub fn empty() -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
        }
    }

    /// A registry pre-loaded with the built-in kinds.
    pub fn new() -> Self {
        let registry = Self::empty();
        registry.register_builtins();
        registry
    }

    /// The process-wide registry.
    pub fn global() -> Arc<TypeRegistry> {
        Arc::clone(&GLOBAL)
    }

    pub fn register_leaf_encoder<F>(&self, key: TypeKey, encoder: F)
    where
        F: Fn(&dyn ErrorNode) -> LeafParts + Send + Sync + 'static,
    {
        tracing::debug!(type_key = %key, "registering leaf encoder");
        self.inner.write().leaf_encoders.insert(key, Arc::new(encoder));
    }

    pub fn register_leaf_decoder<F>(&self, key: TypeKey, decoder: F)
    where
        F: Fn(&LeafInput<'_>) -> Option<BoxedNode> + Send + Sync + 'static,
    {
        tracing::debug!(type_key = %key, "registering leaf decoder");
        self.inner.write().leaf_decoders.insert(key, Arc::new(decoder));
    }

    pub fn register_wrapper_encoder<F>(&self, key: TypeKey, encoder: F)
    where
        F: Fn(&dyn ErrorNode) -> WrapperParts + Send + Sync + 'static,
    {
        tracing::debug!(type_key = %key, "registering wrapper encoder");
        self.inner
            .write()
            .wrapper_encoders
            .insert(key, Arc::new(encoder));
    }

    pub fn register_wrapper_decoder<F>(&self, key: TypeKey, decoder: F)
    where
        F: Fn(BoxedNode, &WrapperInput<'_>) -> Result<BoxedNode, BoxedNode> + Send + Sync + 'static,
    {
        tracing::debug!(type_key = %key, "registering wrapper decoder");
        self.inner
            .write()
            .wrapper_decoders
            .insert(key, Arc::new(decoder));
    }

    pub fn register_multi_cause_encoder<F>(&self, key: TypeKey, encoder: F)
    where
        F: Fn(&dyn ErrorNode) -> JoinParts + Send + Sync + 'static,
    {
        tracing::debug!(type_key = %key, "registering multi-cause encoder");
        self.inner.write().join_encoders.insert(key, Arc::new(encoder));
    }

    pub fn register_multi_cause_decoder<F>(&self, key: TypeKey, decoder: F)
    where
        F: Fn(Vec<BoxedNode>, &JoinInput<'_>) -> Result<BoxedNode, Vec<BoxedNode>>
            + Send
            + Sync
            + 'static,
    {
        tracing::debug!(type_key = %key, "registering multi-cause decoder");
        self.inner.write().join_decoders.insert(key, Arc::new(decoder));
    }

    /// Record that a kind formerly known as `old_module_path::old_type_name`
    /// is now `new_key`.
    pub fn register_type_migration(&self, old_module_path: &str, old_type_name: &str, new_key: TypeKey) {
        tracing::debug!(
            old_module_path,
            old_type_name,
            new_type_key = %new_key,
            "registering type migration"
        );
        self.inner.write().migrations.insert(
            (old_module_path.to_string(), old_type_name.to_string()),
            new_key,
        );
    }

    /// Follow migrations from `key` to its current name. Chains of renames are
    /// followed; a cycle stops after visiting every migration once.
    pub fn resolve(&self, key: &TypeKey) -> TypeKey {
        let inner = self.inner.read();
        let mut current = key.clone();
        for _ in 0..inner.migrations.len() {
            let (module, name) = current.split();
            match inner.migrations.get(&(module.to_string(), name.to_string())) {
                Some(next) if *next != current => current = next.clone(),
                _ => break,
            }
        }
        current
    }

    pub fn leaf_encoder(&self, key: &TypeKey) -> Option<LeafEncoder> {
        self.inner.read().leaf_encoders.get(key).cloned()
    }

    pub fn leaf_decoder(&self, key: &TypeKey) -> Option<LeafDecoder> {
        self.inner.read().leaf_decoders.get(key).cloned()
    }

    pub fn wrapper_encoder(&self, key: &TypeKey) -> Option<WrapperEncoder> {
        self.inner.read().wrapper_encoders.get(key).cloned()
    }

    pub fn wrapper_decoder(&self, key: &TypeKey) -> Option<WrapperDecoder> {
        self.inner.read().wrapper_decoders.get(key).cloned()
    }

    pub fn multi_cause_encoder(&self, key: &TypeKey) -> Option<JoinEncoder> {
        self.inner.read().join_encoders.get(key).cloned()
    }

    pub fn multi_cause_decoder(&self, key: &TypeKey) -> Option<JoinDecoder> {
        self.inner.read().join_decoders.get(key).cloned()
    }

    /// Total number of registered codecs and migrations.
    pub fn len(&self) -> usize {
        let inner = self.inner.read();
        inner.leaf_encoders.len()
            + inner.leaf_decoders.len()
            + inner.wrapper_encoders.len()
            + inner.wrapper_decoders.len()
            + inner.join_encoders.len()
            + inner.join_decoders.len()
            + inner.migrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn register_builtins(&self) {
        // BasicError carries nothing but its message.
        self.register_leaf_decoder(BasicError::kind_key(), |input| {
            if !input.details.is_empty() {
                return None;
            }
            Some(Box::new(BasicError::new(input.message)))
        });

        self.register_leaf_decoder(DecodeFailure::kind_key(), |input| {
            Some(Box::new(DecodeFailure::new(input.message)))
        });

        self.register_wrapper_encoder(WithPrefix::kind_key(), |node| {
            let fragment = match node.downcast_ref::<WithPrefix>() {
                Some(w) => w.prefix().to_string(),
                None => derive_from_cause(node).0,
            };
            WrapperParts {
                fragment,
                mode: MessageMode::Prefix,
                details: Details::default(),
            }
        });
        self.register_wrapper_decoder(WithPrefix::kind_key(), |cause, input| {
            if input.mode != MessageMode::Prefix || !input.details.is_empty() {
                return Err(cause);
            }
            Ok(Box::new(WithPrefix::new(cause, input.fragment)))
        });

        self.register_wrapper_encoder(WithMessage::kind_key(), |node| WrapperParts {
            fragment: node.message(),
            mode: MessageMode::Full,
            details: Details::default(),
        });
        self.register_wrapper_decoder(WithMessage::kind_key(), |cause, input| {
            if input.mode != MessageMode::Full || !input.details.is_empty() {
                return Err(cause);
            }
            Ok(Box::new(WithMessage::new(cause, input.fragment)))
        });

        self.register_wrapper_encoder(WithStack::kind_key(), |node| {
            let payload = node
                .as_stack_provider()
                .map(|p| p.stack_trace().to_payload())
                .transpose();
            let details = match payload {
                Ok(Some(bytes)) => Details::default().with_payload(STACK_PAYLOAD_TYPE_URL, bytes),
                Ok(None) => Details::default(),
                Err(e) => {
                    tracing::warn!(error = %e, "failed to serialize stack trace; dropping it");
                    Details::default()
                }
            };
            WrapperParts {
                fragment: String::new(),
                mode: MessageMode::Prefix,
                details,
            }
        });
        self.register_wrapper_decoder(WithStack::kind_key(), |cause, input| {
            if !input.fragment.is_empty() {
                return Err(cause);
            }
            let details = input.details;
            let stack =
                StackTrace::from_payload(&details.opaque_payload_type_url, &details.opaque_payload);
            match stack {
                Ok(stack) => Ok(Box::new(WithStack::from_parts(cause, stack))),
                Err(e) => {
                    tracing::debug!(error = %e, "stack payload rejected");
                    Err(cause)
                }
            }
        });

        self.register_multi_cause_encoder(Join::kind_key(), |_| JoinParts::default());
        self.register_multi_cause_decoder(Join::kind_key(), |causes, input| {
            if !input.fragment.is_empty() || !input.details.is_empty() {
                return Err(causes);
            }
            Ok(Box::new(Join::new(causes)))
        });
    }
}

fn derive_from_cause(node: &dyn ErrorNode) -> (String, MessageMode) {
    let cause_message = node
        .causes()
        .first()
        .map(|c| c.message())
        .unwrap_or_default();
    derive_fragment(&node.message(), &cause_message)
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.read();
        f.debug_struct("TypeRegistry")
            .field("leaf_encoders", &inner.leaf_encoders.len())
            .field("leaf_decoders", &inner.leaf_decoders.len())
            .field("wrapper_encoders", &inner.wrapper_encoders.len())
            .field("wrapper_decoders", &inner.wrapper_decoders.len())
            .field("multi_cause_encoders", &inner.join_encoders.len())
            .field("multi_cause_decoders", &inner.join_decoders.len())
            .field("migrations", &inner.migrations.len())
            .finish()
    }
}

// ─── Global registration ──────────────────────────────────────────────────────

pub fn register_leaf_encoder<F>(key: TypeKey, encoder: F)
where
    F: Fn(&dyn ErrorNode) -> LeafParts + Send + Sync + 'static,
{
    GLOBAL.register_leaf_encoder(key, encoder)
}

pub fn register_leaf_decoder<F>(key: TypeKey, decoder: F)
where
    F: Fn(&LeafInput<'_>) -> Option<BoxedNode> + Send + Sync + 'static,
{
    GLOBAL.register_leaf_decoder(key, decoder)
}

pub fn register_wrapper_encoder<F>(key: TypeKey, encoder: F)
where
    F: Fn(&dyn ErrorNode) -> WrapperParts + Send + Sync + 'static,
{
    GLOBAL.register_wrapper_encoder(key, encoder)
}

pub fn register_wrapper_decoder<F>(key: TypeKey, decoder: F)
where
    F: Fn(BoxedNode, &WrapperInput<'_>) -> Result<BoxedNode, BoxedNode> + Send + Sync + 'static,
{
    GLOBAL.register_wrapper_decoder(key, decoder)
}

pub fn register_multi_cause_encoder<F>(key: TypeKey, encoder: F)
where
    F: Fn(&dyn ErrorNode) -> JoinParts + Send + Sync + 'static,
{
    GLOBAL.register_multi_cause_encoder(key, encoder)
}

pub fn register_multi_cause_decoder<F>(key: TypeKey, decoder: F)
where
    F: Fn(Vec<BoxedNode>, &JoinInput<'_>) -> Result<BoxedNode, Vec<BoxedNode>>
        + Send
        + Sync
        + 'static,
{
    GLOBAL.register_multi_cause_decoder(key, decoder)
}

pub fn register_type_migration(old_module_path: &str, old_type_name: &str, new_key: TypeKey) {
    GLOBAL.register_type_migration(old_module_path, old_type_name, new_key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stack::Frame;
    use crate::types::new_error;

    #[test]
    fn empty_registry_has_no_entries() {
        let reg = TypeRegistry::empty();
        assert!(reg.is_empty());
        assert!(reg.leaf_decoder(&BasicError::kind_key()).is_none());
    }

    #[test]
    fn builtins_are_registered() {
        let reg = TypeRegistry::new();
        assert!(!reg.is_empty());
        assert!(reg.leaf_decoder(&BasicError::kind_key()).is_some());
        assert!(reg.wrapper_decoder(&WithPrefix::kind_key()).is_some());
        assert!(reg.wrapper_encoder(&WithStack::kind_key()).is_some());
        assert!(reg.multi_cause_decoder(&Join::kind_key()).is_some());
    }

    #[test]
    fn last_registration_wins() {
        let reg = TypeRegistry::empty();
        let key = TypeKey::new("acme::Thing");
        reg.register_leaf_encoder(key.clone(), |_| LeafParts {
            message: "first".into(),
            ..LeafParts::default()
        });
        reg.register_leaf_encoder(key.clone(), |_| LeafParts {
            message: "second".into(),
            ..LeafParts::default()
        });
        let encoder = reg.leaf_encoder(&key).unwrap();
        assert_eq!(encoder(&*new_error("x")).message, "second");
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn migrations_resolve_through_chains() {
        let reg = TypeRegistry::empty();
        reg.register_type_migration("old::errs", "Gone", TypeKey::new("mid::errs::Gone"));
        reg.register_type_migration("mid::errs", "Gone", TypeKey::new("new::errs::Gone"));
        assert_eq!(
            reg.resolve(&TypeKey::new("old::errs::Gone")),
            TypeKey::new("new::errs::Gone")
        );
        assert_eq!(
            reg.resolve(&TypeKey::new("other::Kept")),
            TypeKey::new("other::Kept")
        );
    }

    #[test]
    fn migration_cycle_terminates() {
        let reg = TypeRegistry::empty();
        reg.register_type_migration("a", "T", TypeKey::new("b::T"));
        reg.register_type_migration("b", "T", TypeKey::new("a::T"));
        let resolved = reg.resolve(&TypeKey::new("a::T"));
        assert!(resolved == TypeKey::new("a::T") || resolved == TypeKey::new("b::T"));
    }

    #[test]
    fn basic_decoder_declines_payload() {
        let reg = TypeRegistry::new();
        let decoder = reg.leaf_decoder(&BasicError::kind_key()).unwrap();
        let key = BasicError::kind_key();
        let plain = Details::default();
        let with_payload = Details::default().with_payload("x/y", vec![1]);

        let input = LeafInput { type_key: &key, message: "m", details: &plain };
        assert_eq!(decoder(&input).unwrap().message(), "m");
        let input = LeafInput { type_key: &key, message: "m", details: &with_payload };
        assert!(decoder(&input).is_none());
    }

    #[test]
    fn prefix_decoder_requires_prefix_mode() {
        let reg = TypeRegistry::new();
        let key = WithPrefix::kind_key();
        let decoder = reg.wrapper_decoder(&key).unwrap();
        let details = Details::default();

        let input = WrapperInput {
            type_key: &key,
            fragment: "world",
            mode: MessageMode::Prefix,
            details: &details,
        };
        let node = decoder(new_error("hello"), &input).unwrap();
        assert_eq!(node.message(), "world: hello");

        let input = WrapperInput { mode: MessageMode::Full, ..input };
        let declined = decoder(new_error("hello"), &input).unwrap_err();
        assert_eq!(declined.message(), "hello");
    }

    #[test]
    fn stack_codec_carries_frames() {
        let reg = TypeRegistry::new();
        let key = WithStack::kind_key();
        let trace = StackTrace::new(vec![Frame::new("app::f").at("src/f.rs", 3)]);
        let node = WithStack::from_parts(new_error("boom"), trace.clone());

        let parts = reg.wrapper_encoder(&key).unwrap()(&node);
        assert_eq!(parts.fragment, "");
        assert_eq!(parts.details.opaque_payload_type_url, STACK_PAYLOAD_TYPE_URL);

        let input = WrapperInput {
            type_key: &key,
            fragment: &parts.fragment,
            mode: parts.mode,
            details: &parts.details,
        };
        let decoded = reg.wrapper_decoder(&key).unwrap()(new_error("boom"), &input).unwrap();
        let stack = decoded.downcast_ref::<WithStack>().unwrap().stack();
        assert_eq!(stack, &trace);

        let bad = Details::default().with_payload(STACK_PAYLOAD_TYPE_URL, b"nope".to_vec());
        let input = WrapperInput { details: &bad, ..input };
        assert!(reg.wrapper_decoder(&key).unwrap()(new_error("boom"), &input).is_err());

        let foreign = parts
            .details
            .clone()
            .with_payload("acme/stack-v0", parts.details.opaque_payload.clone());
        let input = WrapperInput { details: &foreign, ..input };
        assert!(reg.wrapper_decoder(&key).unwrap()(new_error("boom"), &input).is_err());
    }

    #[test]
    fn global_registry_is_shared() {
        let key = TypeKey::new("errorchain_core::registry::tests::GlobalOnly");
        register_leaf_decoder(key.clone(), |input| Some(new_error(input.message)));
        assert!(TypeRegistry::global().leaf_decoder(&key).is_some());
    }
}
