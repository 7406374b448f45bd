//! The error chain model — [`ErrorNode`] and its three shapes.
//!
//! Every node decomposes into exactly one of:
//! - a leaf (no cause),
//! - a wrapper (one cause),
//! - a multi-cause join (an ordered list of causes).
//!
//! Everything else in the workspace (encoder, decoder, renderer) dispatches
//! on [`Decomposed`].

use std::any::Any;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::capability::{Describer, SafeDetailProvider, StackProvider};

/// An owned, type-erased chain node.
pub type BoxedNode = Box<dyn ErrorNode>;

// ─── TypeKey ──────────────────────────────────────────────────────────────────

/// Stable identity of a node's original concrete kind.
///
/// The key has the form `module::path::Type`, so it splits into a module path
/// and a type name for migration lookups. Kinds that cross process boundaries
/// should build it with [`type_key!`](crate::type_key), which fixes the text
/// at the declaring module. [`TypeKey::of`] is only a fallback for kinds that
/// declare nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeKey(String);

impl TypeKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// The key derived from `std::any::type_name`. Its text is not
    /// guaranteed to match across compiler versions, so two binaries built
    /// with different toolchains may disagree on it.
    pub fn of<T: ?Sized>() -> Self {
        Self(std::any::type_name::<T>().to_string())
    }

    /// Build a key from a module path and a type name.
    pub fn from_parts(module_path: &str, type_name: &str) -> Self {
        if module_path.is_empty() {
            Self(type_name.to_string())
        } else {
            Self(format!("{module_path}::{type_name}"))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Split into `(module_path, type_name)` at the last `::` outside any
    /// generic argument list.
    pub fn split(&self) -> (&str, &str) {
        let base_end = self.0.find('<').unwrap_or(self.0.len());
        match self.0[..base_end].rfind("::") {
            Some(i) => (&self.0[..i], &self.0[i + 2..]),
            None => ("", self.0.as_str()),
        }
    }

    pub fn module_path(&self) -> &str {
        self.split().0
    }

    pub fn type_name(&self) -> &str {
        self.split().1
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TypeKey {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for TypeKey {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// The key of a kind declared in the current module:
/// `module_path!()` + `::` + the bare type name.
///
/// ```
/// use errorchain_core::{type_key, ErrorNode, TypeKey};
///
/// #[derive(Debug)]
/// struct Timeout;
///
/// impl ErrorNode for Timeout {
///     fn message(&self) -> String {
///         "deadline exceeded".into()
///     }
///
///     fn type_key(&self) -> TypeKey {
///         type_key!(Timeout)
///     }
/// }
///
/// assert_eq!(Timeout.type_key().type_name(), "Timeout");
/// ```
#[macro_export]
macro_rules! type_key {
    ($kind:ident) => {
        $crate::TypeKey::from_parts(::core::module_path!(), ::core::stringify!($kind))
    };
}

// ─── ErrorNode ────────────────────────────────────────────────────────────────

/// The three-way shape of a node.
#[derive(Clone, Copy)]
pub enum Decomposed<'a> {
    Leaf,
    Wrapper(&'a dyn ErrorNode),
    Join(&'a [BoxedNode]),
}

/// Upcast helper so `&dyn ErrorNode` can be downcast to its concrete type.
pub trait AsAny: Any {
    fn as_any(&self) -> &dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// A node in an error chain.
///
/// Nodes are immutable once constructed. Capabilities are optional and are
/// looked up through the `as_*` accessors, which default to `None`; a node opts
/// in by returning `Some(self)`.
pub trait ErrorNode: AsAny + fmt::Debug + Send + Sync + 'static {
    /// The display message of this node, including its causes' text where
    /// the node's shape implies it. Must be pure.
    fn message(&self) -> String;

    /// Leaf / wrapper / join.
    fn decompose(&self) -> Decomposed<'_> {
        Decomposed::Leaf
    }

    /// Identity used for registry lookups and equivalence. Override with
    /// [`type_key!`](crate::type_key) for a key that stays fixed across
    /// toolchains; the default falls back to [`TypeKey::of`].
    fn type_key(&self) -> TypeKey {
        TypeKey::of::<Self>()
    }

    fn as_describer(&self) -> Option<&dyn Describer> {
        None
    }

    fn as_safe_details(&self) -> Option<&dyn SafeDetailProvider> {
        None
    }

    fn as_stack_provider(&self) -> Option<&dyn StackProvider> {
        None
    }
}

impl dyn ErrorNode {
    pub fn downcast_ref<T: ErrorNode>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    pub fn is<T: ErrorNode>(&self) -> bool {
        self.as_any().is::<T>()
    }

    /// Direct causes in order (empty for a leaf).
    pub fn causes(&self) -> Vec<&dyn ErrorNode> {
        match self.decompose() {
            Decomposed::Leaf => Vec::new(),
            Decomposed::Wrapper(cause) => vec![cause],
            Decomposed::Join(causes) => causes.iter().map(|c| &**c).collect(),
        }
    }

    /// Safe details if the node provides any.
    pub fn safe_details(&self) -> Vec<String> {
        self.as_safe_details()
            .map(|p| p.safe_details())
            .unwrap_or_default()
    }
}

impl fmt::Display for dyn ErrorNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message())
    }
}

// ─── Chain utilities ──────────────────────────────────────────────────────────

/// `true` if both nodes have the same kind and the same structural content.
///
/// Message equality alone is not enough: two different kinds with identical
/// text compare unequal. Safe details are compared when both sides expose
/// them.
pub fn equivalent(a: &dyn ErrorNode, b: &dyn ErrorNode) -> bool {
    if a.type_key() != b.type_key() || a.message() != b.message() {
        return false;
    }
    if let (Some(x), Some(y)) = (a.as_safe_details(), b.as_safe_details()) {
        if x.safe_details() != y.safe_details() {
            return false;
        }
    }
    match (a.decompose(), b.decompose()) {
        (Decomposed::Leaf, Decomposed::Leaf) => true,
        (Decomposed::Wrapper(x), Decomposed::Wrapper(y)) => equivalent(x, y),
        (Decomposed::Join(xs), Decomposed::Join(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| equivalent(&**x, &**y))
        }
        _ => false,
    }
}

/// `true` if any node of `chain` is equivalent to `reference`.
pub fn chain_contains(chain: &dyn ErrorNode, reference: &dyn ErrorNode) -> bool {
    let mut found = false;
    walk(chain, &mut |node, _| {
        if !found && equivalent(node, reference) {
            found = true;
        }
    });
    found
}

/// Pre-order visit of every node with its depth (the root is depth 0).
pub fn walk<'a>(node: &'a dyn ErrorNode, visit: &mut dyn FnMut(&'a dyn ErrorNode, usize)) {
    fn go<'a>(
        node: &'a dyn ErrorNode,
        depth: usize,
        visit: &mut dyn FnMut(&'a dyn ErrorNode, usize),
    ) {
        visit(node, depth);
        match node.decompose() {
            Decomposed::Leaf => {}
            Decomposed::Wrapper(cause) => go(cause, depth + 1, visit),
            Decomposed::Join(causes) => {
                for cause in causes {
                    go(&**cause, depth + 1, visit);
                }
            }
        }
    }
    go(node, 0, visit)
}

/// Number of layers on the longest path from `node` to a leaf.
pub fn depth(node: &dyn ErrorNode) -> usize {
    let mut max = 0;
    walk(node, &mut |_, d| max = max.max(d + 1));
    max
}

/// Follow wrappers down to the first leaf or join.
pub fn root_cause(node: &dyn ErrorNode) -> &dyn ErrorNode {
    let mut current = node;
    while let Decomposed::Wrapper(cause) = current.decompose() {
        current = cause;
    }
    current
}
