//! Per-layer headline and detail derivation.

use errorchain_core::wire::join_messages;
use errorchain_core::{derive_fragment, Decomposed, ErrorNode, LayerDescription};

/// Headline and details for one layer.
///
/// A node with a [`Describer`](errorchain_core::Describer) describes itself.
/// Otherwise the headline is derived from the message and any safe details
/// become safe detail lines.
pub fn describe_layer(node: &dyn ErrorNode) -> LayerDescription {
    let mut out = LayerDescription::new();
    if let Some(describer) = node.as_describer() {
        describer.describe(&mut out);
        return out;
    }
    out.headline(&derived_headline(node));
    for detail in node.safe_details() {
        out.detail_safe(&detail);
    }
    out
}

/// The text a layer adds over its causes.
///
/// Leaves report their whole message. Wrappers report what remains after the
/// cause's message is stripped from their own. A join reports nothing when
/// its message is just its causes' messages.
pub fn derived_headline(node: &dyn ErrorNode) -> String {
    match node.decompose() {
        Decomposed::Leaf => node.message(),
        Decomposed::Wrapper(cause) => derive_fragment(&node.message(), &cause.message()).0,
        Decomposed::Join(causes) => {
            let message = node.message();
            if message == join_messages(causes.iter().map(|c| c.message())) {
                String::new()
            } else {
                message
            }
        }
    }
}
