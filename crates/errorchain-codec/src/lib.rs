//! errorchain-codec — move error chains across process boundaries.
//!
//! ```rust
//! use errorchain_codec::{decode_error, encode_error};
//! use errorchain_core::{new_error, wrap, EncodedNode, ErrorNode};
//!
//! let chain = wrap(new_error("connection refused"), "fetching balance");
//! let wire = encode_error(&*chain).to_json().unwrap();
//!
//! // ... on the receiving side
//! let encoded = EncodedNode::from_json(&wire).unwrap();
//! let back = decode_error(&encoded).unwrap();
//! assert_eq!(back.message(), "fetching balance: connection refused");
//! ```

pub mod decoder;
pub mod encoder;

pub use decoder::{ChainDecoder, MISSING_CAUSE};
pub use encoder::ChainEncoder;

use errorchain_core::{BoxedNode, EncodedNode, ErrorNode};

/// Encode with the process-wide registry.
pub fn encode_error(node: &dyn ErrorNode) -> EncodedNode {
    ChainEncoder::new().encode(node)
}

/// Decode with the process-wide registry.
pub fn decode_error(encoded: &EncodedNode) -> Option<BoxedNode> {
    ChainDecoder::new().decode(encoded)
}
