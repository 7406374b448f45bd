//! Stand-ins for node kinds the local registry does not know.
//!
//! An opaque node keeps everything the wire carried for the original kind
//! (type key, message text, safe details, raw payload) so that re-encoding it
//! reproduces the original encoding byte for byte, and a process that does
//! know the kind can decode it fully.

use crate::capability::{Describer, LayerDescription, SafeDetailProvider};
use crate::chain::{BoxedNode, Decomposed, ErrorNode, TypeKey};
use crate::wire::{compose_message, join_messages, Details, MessageMode};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpaqueLeaf {
    type_key: TypeKey,
    message: String,
    details: Details,
}

impl OpaqueLeaf {
    pub fn new(type_key: TypeKey, message: impl Into<String>, details: Details) -> Self {
        Self {
            type_key,
            message: message.into(),
            details,
        }
    }

    pub fn details(&self) -> &Details {
        &self.details
    }
}

impl ErrorNode for OpaqueLeaf {
    fn message(&self) -> String {
        self.message.clone()
    }

    fn type_key(&self) -> TypeKey {
        self.type_key.clone()
    }

    fn as_describer(&self) -> Option<&dyn Describer> {
        Some(self)
    }

    fn as_safe_details(&self) -> Option<&dyn SafeDetailProvider> {
        Some(self)
    }
}

impl Describer for OpaqueLeaf {
    fn describe(&self, out: &mut LayerDescription) {
        out.headline(&self.message);
        describe_opaque(out, "(opaque error leaf)", &self.type_key, &self.details);
    }
}

impl SafeDetailProvider for OpaqueLeaf {
    fn safe_details(&self) -> Vec<String> {
        self.details.safe_details.clone()
    }
}

/// A wrapper of unknown kind. Its message honors the stored [`MessageMode`].
#[derive(Debug)]
pub struct OpaqueWrapper {
    type_key: TypeKey,
    cause: BoxedNode,
    fragment: String,
    mode: MessageMode,
    details: Details,
}

impl OpaqueWrapper {
    pub fn new(
        type_key: TypeKey,
        cause: BoxedNode,
        fragment: impl Into<String>,
        mode: MessageMode,
        details: Details,
    ) -> Self {
        Self {
            type_key,
            cause,
            fragment: fragment.into(),
            mode,
            details,
        }
    }

    pub fn cause(&self) -> &dyn ErrorNode {
        &*self.cause
    }

    pub fn fragment(&self) -> &str {
        &self.fragment
    }

    pub fn mode(&self) -> MessageMode {
        self.mode
    }

    pub fn details(&self) -> &Details {
        &self.details
    }
}

impl ErrorNode for OpaqueWrapper {
    fn message(&self) -> String {
        compose_message(&self.fragment, self.mode, &self.cause.message())
    }

    fn decompose(&self) -> Decomposed<'_> {
        Decomposed::Wrapper(&*self.cause)
    }

    fn type_key(&self) -> TypeKey {
        self.type_key.clone()
    }

    fn as_describer(&self) -> Option<&dyn Describer> {
        Some(self)
    }

    fn as_safe_details(&self) -> Option<&dyn SafeDetailProvider> {
        Some(self)
    }
}

impl Describer for OpaqueWrapper {
    fn describe(&self, out: &mut LayerDescription) {
        out.headline(&self.fragment);
        describe_opaque(out, "(opaque error wrapper)", &self.type_key, &self.details);
    }
}

impl SafeDetailProvider for OpaqueWrapper {
    fn safe_details(&self) -> Vec<String> {
        self.details.safe_details.clone()
    }
}

/// A multi-cause join of unknown kind.
#[derive(Debug)]
pub struct OpaqueJoin {
    type_key: TypeKey,
    causes: Vec<BoxedNode>,
    fragment: String,
    details: Details,
}

impl OpaqueJoin {
    pub fn new(
        type_key: TypeKey,
        causes: Vec<BoxedNode>,
        fragment: impl Into<String>,
        details: Details,
    ) -> Self {
        Self {
            type_key,
            causes,
            fragment: fragment.into(),
            details,
        }
    }

    pub fn fragment(&self) -> &str {
        &self.fragment
    }

    pub fn details(&self) -> &Details {
        &self.details
    }
}

impl ErrorNode for OpaqueJoin {
    fn message(&self) -> String {
        if self.fragment.is_empty() {
            join_messages(self.causes.iter().map(|c| c.message()))
        } else {
            self.fragment.clone()
        }
    }

    fn decompose(&self) -> Decomposed<'_> {
        Decomposed::Join(&self.causes)
    }

    fn type_key(&self) -> TypeKey {
        self.type_key.clone()
    }

    fn as_describer(&self) -> Option<&dyn Describer> {
        Some(self)
    }

    fn as_safe_details(&self) -> Option<&dyn SafeDetailProvider> {
        Some(self)
    }
}

impl Describer for OpaqueJoin {
    fn describe(&self, out: &mut LayerDescription) {
        out.headline(&self.fragment);
        describe_opaque(out, "(opaque error join)", &self.type_key, &self.details);
    }
}

impl SafeDetailProvider for OpaqueJoin {
    fn safe_details(&self) -> Vec<String> {
        self.details.safe_details.clone()
    }
}

fn describe_opaque(out: &mut LayerDescription, label: &str, type_key: &TypeKey, details: &Details) {
    out.detail_safe(label);
    out.detail_safe(&format!("type name: {type_key}"));
    for (i, detail) in details.safe_details.iter().enumerate() {
        out.detail_safe(&format!("reportable {i}: {detail}"));
    }
    if details.has_payload() {
        out.detail_safe(&format!(
            "payload type: {} ({} bytes)",
            details.opaque_payload_type_url,
            details.opaque_payload.len()
        ));
    }
}
