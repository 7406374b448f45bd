//! Built-in node kinds and constructors.
//!
//! These are registered with every [`TypeRegistry`](crate::registry::TypeRegistry)
//! created through `TypeRegistry::new()`, so chains built from them survive a
//! round trip with their concrete types intact.

use std::fmt;

use crate::capability::{Describer, LayerDescription, StackProvider};
use crate::chain::{BoxedNode, Decomposed, ErrorNode, TypeKey};
use crate::stack::{capture_stack, StackTrace};
use crate::wire::join_messages;

// ─── BasicError ───────────────────────────────────────────────────────────────

/// A leaf carrying only a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasicError {
    message: String,
}

impl BasicError {
    /// Wire identity of this kind.
    pub fn kind_key() -> TypeKey {
        crate::type_key!(BasicError)
    }

    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for BasicError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl ErrorNode for BasicError {
    fn type_key(&self) -> TypeKey {
        Self::kind_key()
    }

    fn message(&self) -> String {
        self.message.clone()
    }
}

// ─── WithPrefix ───────────────────────────────────────────────────────────────

/// A wrapper whose message is `prefix: cause`.
#[derive(Debug)]
pub struct WithPrefix {
    prefix: String,
    cause: BoxedNode,
}

impl WithPrefix {
    pub fn kind_key() -> TypeKey {
        crate::type_key!(WithPrefix)
    }

    pub fn new(cause: BoxedNode, prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            cause,
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn cause(&self) -> &dyn ErrorNode {
        &*self.cause
    }
}

impl ErrorNode for WithPrefix {
    fn type_key(&self) -> TypeKey {
        Self::kind_key()
    }

    fn message(&self) -> String {
        if self.prefix.is_empty() {
            self.cause.message()
        } else {
            format!("{}: {}", self.prefix, self.cause.message())
        }
    }

    fn decompose(&self) -> Decomposed<'_> {
        Decomposed::Wrapper(&*self.cause)
    }
}

// ─── WithMessage ──────────────────────────────────────────────────────────────

/// A wrapper whose message replaces the cause's text entirely.
#[derive(Debug)]
pub struct WithMessage {
    message: String,
    cause: BoxedNode,
}

impl WithMessage {
    pub fn kind_key() -> TypeKey {
        crate::type_key!(WithMessage)
    }

    pub fn new(cause: BoxedNode, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            cause,
        }
    }

    pub fn cause(&self) -> &dyn ErrorNode {
        &*self.cause
    }
}

impl ErrorNode for WithMessage {
    fn type_key(&self) -> TypeKey {
        Self::kind_key()
    }

    fn message(&self) -> String {
        self.message.clone()
    }

    fn decompose(&self) -> Decomposed<'_> {
        Decomposed::Wrapper(&*self.cause)
    }
}

// ─── WithStack ────────────────────────────────────────────────────────────────

/// A wrapper that records where it was created. Adds no text of its own.
#[derive(Debug)]
pub struct WithStack {
    cause: BoxedNode,
    stack: StackTrace,
}

impl WithStack {
    pub fn kind_key() -> TypeKey {
        crate::type_key!(WithStack)
    }

    /// Wrap `cause`, capturing the caller's stack.
    pub fn new(cause: BoxedNode) -> Self {
        Self {
            cause,
            stack: capture_stack(1),
        }
    }

    pub fn from_parts(cause: BoxedNode, stack: StackTrace) -> Self {
        Self { cause, stack }
    }

    pub fn cause(&self) -> &dyn ErrorNode {
        &*self.cause
    }

    pub fn stack(&self) -> &StackTrace {
        &self.stack
    }
}

impl ErrorNode for WithStack {
    fn type_key(&self) -> TypeKey {
        Self::kind_key()
    }

    fn message(&self) -> String {
        self.cause.message()
    }

    fn decompose(&self) -> Decomposed<'_> {
        Decomposed::Wrapper(&*self.cause)
    }

    fn as_describer(&self) -> Option<&dyn Describer> {
        Some(self)
    }

    fn as_stack_provider(&self) -> Option<&dyn StackProvider> {
        Some(self)
    }
}

impl Describer for WithStack {
    fn describe(&self, out: &mut LayerDescription) {
        out.headline_safe("attached stack trace");
    }
}

impl StackProvider for WithStack {
    fn stack_trace(&self) -> &StackTrace {
        &self.stack
    }
}

// ─── Join ─────────────────────────────────────────────────────────────────────

/// Independent failures combined into one error, e.g. from parallel work.
#[derive(Debug)]
pub struct Join {
    causes: Vec<BoxedNode>,
}

impl Join {
    pub fn kind_key() -> TypeKey {
        crate::type_key!(Join)
    }

    pub fn new(causes: Vec<BoxedNode>) -> Self {
        Self { causes }
    }
}

impl ErrorNode for Join {
    fn type_key(&self) -> TypeKey {
        Self::kind_key()
    }

    fn message(&self) -> String {
        join_messages(self.causes.iter().map(|c| c.message()))
    }

    fn decompose(&self) -> Decomposed<'_> {
        Decomposed::Join(&self.causes)
    }
}

// ─── DecodeFailure ────────────────────────────────────────────────────────────

/// Placeholder leaf substituted for malformed or incomplete wire data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeFailure {
    message: String,
}

impl DecodeFailure {
    pub fn kind_key() -> TypeKey {
        crate::type_key!(DecodeFailure)
    }

    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl ErrorNode for DecodeFailure {
    fn type_key(&self) -> TypeKey {
        Self::kind_key()
    }

    fn message(&self) -> String {
        self.message.clone()
    }

    fn as_describer(&self) -> Option<&dyn Describer> {
        Some(self)
    }
}

impl Describer for DecodeFailure {
    fn describe(&self, out: &mut LayerDescription) {
        out.headline(&self.message);
        out.detail_safe("(placeholder for undecodable error data)");
    }
}

// ─── Constructors ─────────────────────────────────────────────────────────────

/// A new leaf error.
pub fn new_error(message: impl Into<String>) -> BoxedNode {
    Box::new(BasicError::new(message))
}

/// A new leaf error with the caller's stack attached.
pub fn new_error_with_stack(message: impl Into<String>) -> BoxedNode {
    Box::new(WithStack::from_parts(
        new_error(message),
        capture_stack(1),
    ))
}

/// Add `prefix: ` in front of the cause's message.
pub fn wrap(cause: BoxedNode, prefix: impl Into<String>) -> BoxedNode {
    Box::new(WithPrefix::new(cause, prefix))
}

/// Replace the cause's message while keeping it as the cause.
pub fn wrap_full(cause: BoxedNode, message: impl Into<String>) -> BoxedNode {
    Box::new(WithMessage::new(cause, message))
}

/// Attach the caller's stack to `cause`.
pub fn with_stack(cause: BoxedNode) -> BoxedNode {
    Box::new(WithStack::from_parts(cause, capture_stack(1)))
}

/// Combine independent causes.
pub fn join(causes: Vec<BoxedNode>) -> BoxedNode {
    Box::new(Join::new(causes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stack::Frame;

    #[test]
    fn prefix_wrapper_message() {
        assert_eq!(wrap(new_error("hello"), "world").message(), "world: hello");
        assert_eq!(wrap(new_error("hello"), "").message(), "hello");
    }

    #[test]
    fn full_wrapper_message() {
        let chain = wrap_full(new_error("hello"), "replaced");
        assert_eq!(chain.message(), "replaced");
        assert_eq!(chain.causes()[0].message(), "hello");
    }

    #[test]
    fn join_message() {
        assert_eq!(join(vec![new_error("a"), new_error("b")]).message(), "a\nb");
        assert_eq!(join(vec![]).message(), "");
    }

    #[test]
    fn stack_wrapper_is_transparent() {
        let chain = with_stack(new_error("boom"));
        assert_eq!(chain.message(), "boom");
        assert!(chain.as_stack_provider().is_some());
        assert!(chain.as_describer().is_some());

        let fixed = WithStack::from_parts(
            new_error("boom"),
            StackTrace::new(vec![Frame::new("app::main")]),
        );
        assert_eq!(fixed.stack().len(), 1);
    }

    #[test]
    fn stacked_error_constructor() {
        let chain = new_error_with_stack("boom");
        assert_eq!(chain.message(), "boom");
        assert!(chain.is::<WithStack>());
    }
}
