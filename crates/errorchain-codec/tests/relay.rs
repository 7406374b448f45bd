//! Integration tests for encoding, decoding and relaying error chains.
//!
//! Two application kinds are defined here, `CardDeclined` (leaf) and
//! `Retried` (wrapper), each with a custom codec that uses a binary payload.
//! Relays build their decoders from `TypeRegistry::empty()` so that every
//! layer passes through them as an opaque stand-in.

use std::sync::Arc;

use errorchain_codec::{ChainDecoder, ChainEncoder};
use errorchain_core::registry::{LeafParts, WrapperParts};
use errorchain_core::{
    depth, equivalent, join, new_error, wrap, BasicError, BoxedNode, CodecConfig, DecodeFailure,
    Decomposed, Details, EncodedNode, ErrorNode, Join, MessageMode, OpaqueLeaf, OpaqueWrapper,
    SafeDetailProvider, TypeKey, TypeRegistry, WithPrefix,
};
use errorchain_core::type_key;

// ─── Application kinds ────────────────────────────────────────────────────────

const CARD_URL: &str = "acme/card-declined";
const RETRY_URL: &str = "acme/retried";

#[derive(Debug)]
struct CardDeclined {
    issuer: String,
    code: u32,
}

impl ErrorNode for CardDeclined {
    fn message(&self) -> String {
        format!("card declined (code {})", self.code)
    }

    fn type_key(&self) -> TypeKey {
        type_key!(CardDeclined)
    }

    fn as_safe_details(&self) -> Option<&dyn SafeDetailProvider> {
        Some(self)
    }
}

impl SafeDetailProvider for CardDeclined {
    fn safe_details(&self) -> Vec<String> {
        vec![format!("issuer={}", self.issuer)]
    }
}

#[derive(Debug)]
struct Retried {
    attempts: u32,
    cause: BoxedNode,
}

impl ErrorNode for Retried {
    fn message(&self) -> String {
        format!("after {} attempts: {}", self.attempts, self.cause.message())
    }

    fn type_key(&self) -> TypeKey {
        type_key!(Retried)
    }

    fn decompose(&self) -> Decomposed<'_> {
        Decomposed::Wrapper(&*self.cause)
    }
}

fn register_acme(registry: &TypeRegistry) {
    registry.register_leaf_encoder(type_key!(CardDeclined), |node| {
        let code = node
            .downcast_ref::<CardDeclined>()
            .map(|c| c.code)
            .unwrap_or_default();
        LeafParts {
            message: node.message(),
            details: Details::with_safe_details(node.safe_details())
                .with_payload(CARD_URL, code.to_be_bytes().to_vec()),
        }
    });
    registry.register_leaf_decoder(type_key!(CardDeclined), |input| {
        if input.details.opaque_payload_type_url != CARD_URL {
            return None;
        }
        let code = u32::from_be_bytes(input.details.opaque_payload.as_slice().try_into().ok()?);
        let issuer = input
            .details
            .safe_details
            .first()?
            .strip_prefix("issuer=")?
            .to_string();
        Some(Box::new(CardDeclined { issuer, code }))
    });

    registry.register_wrapper_encoder(type_key!(Retried), |node| {
        let attempts = node
            .downcast_ref::<Retried>()
            .map(|r| r.attempts)
            .unwrap_or_default();
        WrapperParts {
            fragment: format!("after {attempts} attempts"),
            mode: MessageMode::Prefix,
            details: Details::default().with_payload(RETRY_URL, attempts.to_be_bytes().to_vec()),
        }
    });
    registry.register_wrapper_decoder(type_key!(Retried), |cause, input| {
        if input.details.opaque_payload_type_url != RETRY_URL {
            return Err(cause);
        }
        match <[u8; 4]>::try_from(input.details.opaque_payload.as_slice()) {
            Ok(bytes) => Ok(Box::new(Retried {
                attempts: u32::from_be_bytes(bytes),
                cause,
            })),
            Err(_) => Err(cause),
        }
    });
}

// ─── Helpers ──────────────────────────────────────────────────────────────────

fn knowing() -> Arc<TypeRegistry> {
    let registry = TypeRegistry::new();
    register_acme(&registry);
    Arc::new(registry)
}

fn ignorant() -> Arc<TypeRegistry> {
    Arc::new(TypeRegistry::empty())
}

fn declined_card() -> BoxedNode {
    Box::new(Retried {
        attempts: 3,
        cause: Box::new(CardDeclined {
            issuer: "visa".into(),
            code: 51,
        }),
    })
}

/// Decode with `registry` and re-encode with the same registry.
fn relay(registry: Arc<TypeRegistry>, encoded: &EncodedNode) -> EncodedNode {
    let node = ChainDecoder::with_registry(Arc::clone(&registry))
        .decode(encoded)
        .expect("relay received an absent error");
    ChainEncoder::with_registry(registry).encode(&*node)
}

// ─── Round trips ──────────────────────────────────────────────────────────────

#[test]
fn registered_kinds_round_trip() {
    let original = declined_card();
    let encoded = ChainEncoder::with_registry(knowing()).encode(&*original);
    let decoded = ChainDecoder::with_registry(knowing()).decode(&encoded).unwrap();

    assert_eq!(decoded.message(), "after 3 attempts: card declined (code 51)");
    assert_eq!(decoded.type_key(), original.type_key());
    let retried = decoded.downcast_ref::<Retried>().unwrap();
    assert_eq!(retried.attempts, 3);
    let card = retried.cause.downcast_ref::<CardDeclined>().unwrap();
    assert_eq!(card.issuer, "visa");
    assert_eq!(card.code, 51);
    assert!(equivalent(&*original, &*decoded));
}

#[test]
fn round_trip_through_json_text() {
    let original = declined_card();
    let json = ChainEncoder::with_registry(knowing())
        .encode(&*original)
        .to_json()
        .unwrap();
    let decoded = ChainDecoder::with_registry(knowing()).decode_json(&json).unwrap();
    assert!(equivalent(&*original, &*decoded));
}

#[test]
fn wrapped_leaf_round_trip() {
    let registry = Arc::new(TypeRegistry::new());
    let encoded = ChainEncoder::with_registry(Arc::clone(&registry))
        .encode(&*wrap(new_error("hello"), "world"));
    let decoded = ChainDecoder::with_registry(registry).decode(&encoded).unwrap();

    assert_eq!(decoded.message(), "world: hello");
    assert!(decoded.is::<WithPrefix>());
    assert!(decoded.causes()[0].is::<BasicError>());
}

#[test]
fn unregistered_leaf_keeps_message_and_safe_details() {
    let encoded = ChainEncoder::with_registry(knowing()).encode(&CardDeclined {
        issuer: "line1".into(),
        code: 7,
    });
    let decoded = ChainDecoder::with_registry(Arc::new(TypeRegistry::new()))
        .decode(&encoded)
        .unwrap();

    let opaque = decoded.downcast_ref::<OpaqueLeaf>().unwrap();
    assert_eq!(opaque.message(), "card declined (code 7)");
    assert_eq!(opaque.type_key(), type_key!(CardDeclined));
    assert_eq!(decoded.safe_details(), vec!["issuer=line1".to_string()]);
}

#[test]
fn join_round_trip() {
    let registry = Arc::new(TypeRegistry::new());
    let encoded = ChainEncoder::with_registry(Arc::clone(&registry))
        .encode(&*join(vec![new_error("a"), new_error("b")]));
    let decoded = ChainDecoder::with_registry(registry).decode(&encoded).unwrap();

    assert_eq!(decoded.message(), "a\nb");
    assert!(decoded.is::<Join>());
    assert_eq!(decoded.causes().len(), 2);
}

// ─── Relays ───────────────────────────────────────────────────────────────────

#[test]
fn ignorant_relay_is_lossless() {
    let encoded = ChainEncoder::with_registry(knowing()).encode(&*declined_card());
    let relayed = relay(ignorant(), &encoded);

    assert_eq!(relayed, encoded);
    assert_eq!(relayed.to_json().unwrap(), encoded.to_json().unwrap());
}

#[test]
fn two_hop_relay_restores_identity() {
    let original = declined_card();
    let encoded = ChainEncoder::with_registry(knowing()).encode(&*original);

    // Hop 1 knows neither kind.
    let hop1 = ChainDecoder::with_registry(ignorant()).decode(&encoded).unwrap();
    assert!(hop1.is::<OpaqueWrapper>());
    assert_eq!(hop1.message(), original.message());
    let forwarded = ChainEncoder::with_registry(ignorant()).encode(&*hop1);

    // Hop 2 knows both.
    let via_relay = ChainDecoder::with_registry(knowing()).decode(&forwarded).unwrap();
    let direct = ChainDecoder::with_registry(knowing()).decode(&encoded).unwrap();

    assert!(equivalent(&*via_relay, &*direct));
    let card = via_relay.causes()[0].downcast_ref::<CardDeclined>().unwrap();
    assert_eq!(card.issuer, "visa");
    assert_eq!(card.code, 51);
}

#[test]
fn relay_of_mixed_chain_keeps_builtin_kinds() {
    let chain = wrap(join(vec![declined_card(), new_error("second")]), "batch failed");
    let encoded = ChainEncoder::with_registry(knowing()).encode(&*chain);
    let relayed = relay(Arc::new(TypeRegistry::new()), &encoded);
    assert_eq!(relayed, encoded);

    let decoded = ChainDecoder::with_registry(knowing()).decode(&relayed).unwrap();
    assert!(equivalent(&*chain, &*decoded));
}

// ─── Degraded input ───────────────────────────────────────────────────────────

#[test]
fn declined_payload_decodes_opaquely() {
    let encoded = EncodedNode::Leaf {
        type_key: type_key!(CardDeclined),
        message: "card declined (code 9)".into(),
        details: Details::with_safe_details(vec!["issuer=amex".into()])
            .with_payload("acme/card-declined-v2", vec![0, 0, 0, 9, 1]),
    };
    let decoded = ChainDecoder::with_registry(knowing()).decode(&encoded).unwrap();
    assert!(decoded.is::<OpaqueLeaf>());
    assert_eq!(decoded.message(), "card declined (code 9)");

    // Still re-encodes to exactly what arrived.
    let again = ChainEncoder::with_registry(knowing()).encode(&*decoded);
    assert_eq!(again, encoded);
}

#[test]
fn legacy_wrapper_without_mode_decodes_as_prefix() {
    let json = r#"{
        "kind": "wrapper",
        "type_key": "legacy::Context",
        "message_fragment": "loading config",
        "cause": { "kind": "leaf", "type_key": "legacy::Io", "message": "not found" }
    }"#;
    let decoded = ChainDecoder::with_registry(ignorant()).decode_json(json).unwrap();
    assert_eq!(decoded.message(), "loading config: not found");
}

#[test]
fn renamed_kind_decodes_through_migration() {
    let registry = knowing();
    let current = type_key!(CardDeclined);
    registry.register_type_migration("acme::payments::v1", "Declined", current);

    let encoded = EncodedNode::Leaf {
        type_key: TypeKey::new("acme::payments::v1::Declined"),
        message: "card declined (code 5)".into(),
        details: Details::with_safe_details(vec!["issuer=visa".into()])
            .with_payload(CARD_URL, 5u32.to_be_bytes().to_vec()),
    };
    let decoded = ChainDecoder::with_registry(registry).decode(&encoded).unwrap();
    let card = decoded.downcast_ref::<CardDeclined>().unwrap();
    assert_eq!(card.code, 5);
}

#[test]
fn truncated_json_yields_placeholder() {
    let decoded = ChainDecoder::with_registry(knowing())
        .decode_json(r#"{"kind":"leaf","type_key":"acme::X","mess"#)
        .unwrap();
    assert!(decoded.message().starts_with("malformed encoded error"));
}

// ─── Deep chains ──────────────────────────────────────────────────────────────

#[test]
fn deep_chain_survives_json_text() {
    let mut chain = new_error("root");
    for i in 0..150 {
        chain = wrap(chain, format!("l{i}"));
    }
    let registry = Arc::new(TypeRegistry::new());
    let json = ChainEncoder::with_registry(Arc::clone(&registry))
        .encode(&*chain)
        .to_json()
        .unwrap();
    let decoded = ChainDecoder::with_registry(registry).decode_json(&json).unwrap();

    assert!(!decoded.is::<DecodeFailure>());
    assert_eq!(decoded.message(), chain.message());
    assert_eq!(depth(&*decoded), 151);
    assert!(equivalent(&*chain, &*decoded));
}

#[test]
fn capped_chain_decodes_with_same_cap() {
    let chain = wrap(wrap(wrap(new_error("root"), "c"), "b"), "a");
    let config = CodecConfig::with_max_depth(2);
    let registry = Arc::new(TypeRegistry::new());
    let json = ChainEncoder::with_registry(Arc::clone(&registry))
        .with_config(config.clone())
        .encode(&*chain)
        .to_json()
        .unwrap();
    let decoded = ChainDecoder::with_registry(registry)
        .with_config(config)
        .decode_json(&json)
        .unwrap();

    assert_eq!(decoded.message(), "a: b: c: root");
    assert!(decoded.is::<WithPrefix>());
    let flattened = decoded.causes()[0];
    assert!(flattened.is::<OpaqueLeaf>());
    assert_eq!(flattened.type_key(), chain.causes()[0].type_key());
    assert_eq!(flattened.message(), "b: c: root");
}
