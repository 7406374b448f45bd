//! Optional node capabilities queried by the encoder and the renderer.

use crate::redact::RedactableLine;
use crate::stack::StackTrace;

/// Supplies a layer's headline and detail lines to the verbose renderer.
///
/// Without it the renderer derives the headline from the node's message.
pub trait Describer {
    fn describe(&self, out: &mut LayerDescription);
}

/// Supplies strings known to be free of sensitive data.
pub trait SafeDetailProvider {
    fn safe_details(&self) -> Vec<String>;
}

/// Exposes a call stack captured when the node was built.
pub trait StackProvider {
    fn stack_trace(&self) -> &StackTrace;
}

/// Headline and detail lines collected from a [`Describer`].
///
/// Text added through the `*_safe` methods is emitted as-is in redactable
/// output; everything else is wrapped in redaction markers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LayerDescription {
    headline: RedactableLine,
    details: Vec<RedactableLine>,
}

impl LayerDescription {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append untrusted text to the headline.
    pub fn headline(&mut self, text: &str) -> &mut Self {
        self.headline.push_untrusted(text);
        self
    }

    /// Append safe text to the headline.
    pub fn headline_safe(&mut self, text: &str) -> &mut Self {
        self.headline.push_safe(text);
        self
    }

    /// Add an untrusted detail line.
    pub fn detail(&mut self, text: &str) -> &mut Self {
        self.details.push(RedactableLine::untrusted(text));
        self
    }

    /// Add a safe detail line.
    pub fn detail_safe(&mut self, text: &str) -> &mut Self {
        self.details.push(RedactableLine::safe(text));
        self
    }

    /// Add a detail line mixing safe and untrusted fragments.
    pub fn detail_line(&mut self, line: RedactableLine) -> &mut Self {
        self.details.push(line);
        self
    }

    pub fn headline_line(&self) -> &RedactableLine {
        &self.headline
    }

    pub fn detail_lines(&self) -> &[RedactableLine] {
        &self.details
    }

    pub fn into_parts(self) -> (RedactableLine, Vec<RedactableLine>) {
        (self.headline, self.details)
    }
}
