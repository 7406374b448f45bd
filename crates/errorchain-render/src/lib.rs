//! errorchain-render — human-readable and redaction-aware error output.
//!
//! Every mode starts from the chain's top-level `message()`; plain output is
//! exactly that message. Verbose output adds one entry per layer (see
//! [`report`]), and the redactable variant wraps every piece of untrusted
//! text in `‹` … `›` so it can later be masked with
//! [`RedactableString::redact`].

pub mod layer;
pub mod report;

use std::fmt;
use std::str::FromStr;

use errorchain_core::{ErrorNode, RedactableString};
use thiserror::Error;

pub use layer::{describe_layer, derived_headline};
pub use report::VerboseReport;

/// The one-line message.
pub fn format_message(node: &dyn ErrorNode) -> String {
    node.message()
}

/// The message as a Rust string literal, escapes included.
pub fn format_quoted(node: &dyn ErrorNode) -> String {
    format!("{:?}", node.message())
}

/// The layer-by-layer report.
pub fn format_verbose(node: &dyn ErrorNode) -> String {
    VerboseReport::build(node).to_plain()
}

/// The layer-by-layer report with untrusted text marked.
pub fn format_verbose_redactable(node: &dyn ErrorNode) -> RedactableString {
    VerboseReport::build(node).to_redactable()
}

/// Output modes selectable by name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RenderMode {
    #[default]
    Plain,
    Quoted,
    Verbose,
    /// Verbose with redaction markers left in place.
    Redactable,
    /// Verbose with every untrusted region masked.
    Redacted,
}

#[derive(Debug, Error)]
#[error("Unknown render mode '{0}' (expected plain, quoted, verbose, redactable or redacted)")]
pub struct UnknownModeError(pub String);

impl FromStr for RenderMode {
    type Err = UnknownModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "plain" => Ok(Self::Plain),
            "quoted" => Ok(Self::Quoted),
            "verbose" => Ok(Self::Verbose),
            "redactable" => Ok(Self::Redactable),
            "redacted" => Ok(Self::Redacted),
            _ => Err(UnknownModeError(s.to_string())),
        }
    }
}

impl fmt::Display for RenderMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Plain => "plain",
            Self::Quoted => "quoted",
            Self::Verbose => "verbose",
            Self::Redactable => "redactable",
            Self::Redacted => "redacted",
        };
        f.write_str(name)
    }
}

/// Render `node` in `mode`.
pub fn render(node: &dyn ErrorNode, mode: RenderMode) -> String {
    match mode {
        RenderMode::Plain => format_message(node),
        RenderMode::Quoted => format_quoted(node),
        RenderMode::Verbose => format_verbose(node),
        RenderMode::Redactable => format_verbose_redactable(node).into_string(),
        RenderMode::Redacted => format_verbose_redactable(node).redact(),
    }
}
