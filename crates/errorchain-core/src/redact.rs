//! Redaction markers.
//!
//! Rendered text is a sequence of fragments, each either *safe* (known free of
//! sensitive data: type names, stack frames, registered safe details) or
//! *untrusted* (arbitrary application strings). In redactable output every
//! untrusted fragment is enclosed in `‹` … `›` so a later pass can mask it.
//! Marker characters found inside any fragment are escaped to `?` first, so
//! untrusted text can never forge a boundary.

use std::fmt;

/// Opens an untrusted region.
pub const START_MARKER: char = '‹';
/// Closes an untrusted region.
pub const END_MARKER: char = '›';
/// Replacement for marker characters found inside text.
pub const ESCAPED_MARKER: char = '?';
/// What a masked region shows after [`RedactableString::redact`].
pub const REDACTED: &str = "×";

/// Replace any marker characters in `text` with [`ESCAPED_MARKER`].
pub fn escape(text: &str) -> String {
    text.replace([START_MARKER, END_MARKER], &ESCAPED_MARKER.to_string())
}

// ─── Fragment / RedactableLine ────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    pub text: String,
    pub safe: bool,
}

/// An ordered run of safe and untrusted fragments.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RedactableLine {
    fragments: Vec<Fragment>,
}

impl RedactableLine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn safe(text: &str) -> Self {
        let mut line = Self::new();
        line.push_safe(text);
        line
    }

    pub fn untrusted(text: &str) -> Self {
        let mut line = Self::new();
        line.push_untrusted(text);
        line
    }

    pub fn push_safe(&mut self, text: &str) -> &mut Self {
        self.push(text, true)
    }

    pub fn push_untrusted(&mut self, text: &str) -> &mut Self {
        self.push(text, false)
    }

    fn push(&mut self, text: &str, safe: bool) -> &mut Self {
        if !text.is_empty() {
            self.fragments.push(Fragment {
                text: text.to_string(),
                safe,
            });
        }
        self
    }

    pub fn append(&mut self, other: RedactableLine) -> &mut Self {
        self.fragments.extend(other.fragments);
        self
    }

    pub fn fragments(&self) -> &[Fragment] {
        &self.fragments
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    /// A copy of this line with a safe prefix in front.
    pub fn prefixed(&self, prefix: &str) -> RedactableLine {
        let mut line = RedactableLine::safe(prefix);
        line.fragments.extend(self.fragments.iter().cloned());
        line
    }

    /// Split at newlines, keeping each fragment's safety.
    pub fn split_lines(&self) -> Vec<RedactableLine> {
        let mut lines = vec![RedactableLine::new()];
        for fragment in &self.fragments {
            let mut pieces = fragment.text.split('\n');
            if let Some(first) = pieces.next() {
                if let Some(current) = lines.last_mut() {
                    current.push(first, fragment.safe);
                }
            }
            for piece in pieces {
                let mut line = RedactableLine::new();
                line.push(piece, fragment.safe);
                lines.push(line);
            }
        }
        lines
    }

    /// The text with no markers and no escaping.
    pub fn to_plain(&self) -> String {
        self.fragments.iter().map(|f| f.text.as_str()).collect()
    }

    /// The text with untrusted fragments enclosed in markers.
    pub fn to_redactable(&self) -> RedactableString {
        let mut out = RedactableString::new();
        for fragment in &self.fragments {
            if fragment.safe {
                out.push_safe(&fragment.text);
            } else {
                out.push_untrusted(&fragment.text);
            }
        }
        out
    }
}

// ─── RedactableString ─────────────────────────────────────────────────────────

/// Text whose untrusted regions are enclosed in redaction markers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct RedactableString(String);

impl RedactableString {
    pub fn new() -> Self {
        Self::default()
    }

    /// Join lines with `\n`.
    pub fn from_lines(lines: &[RedactableLine]) -> Self {
        let mut out = Self::new();
        for (i, line) in lines.iter().enumerate() {
            if i > 0 {
                out.0.push('\n');
            }
            out.0.push_str(line.to_redactable().as_str());
        }
        out
    }

    pub fn push_safe(&mut self, text: &str) {
        self.0.push_str(&escape(text));
    }

    /// Enclose `text` in markers, one region per line.
    pub fn push_untrusted(&mut self, text: &str) {
        for (i, piece) in text.split('\n').enumerate() {
            if i > 0 {
                self.0.push('\n');
            }
            if !piece.is_empty() {
                self.0.push(START_MARKER);
                self.0.push_str(&escape(piece));
                self.0.push(END_MARKER);
            }
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// Mask every untrusted region as `‹×›`. An unterminated region is masked
    /// to the end of the string.
    pub fn redact(&self) -> String {
        let mut out = String::with_capacity(self.0.len());
        let mut inside = false;
        for c in self.0.chars() {
            match (c, inside) {
                (START_MARKER, false) => {
                    inside = true;
                    out.push(START_MARKER);
                    out.push_str(REDACTED);
                    out.push(END_MARKER);
                }
                (END_MARKER, true) => inside = false,
                (_, true) => {}
                (c, false) => out.push(c),
            }
        }
        out
    }

    /// Drop the markers, keeping all text.
    pub fn strip_markers(&self) -> String {
        self.0
            .chars()
            .filter(|c| *c != START_MARKER && *c != END_MARKER)
            .collect()
    }
}

impl fmt::Display for RedactableString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
