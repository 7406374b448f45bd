//! Call-stack snapshots and shared-suffix elision.
//!
//! Frames are ordered innermost first: index 0 is the most recent call, the
//! last frame is the oldest (typically `main` or a thread entry point).

use std::backtrace::Backtrace;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::WireError;

/// One frame of a captured stack.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Frame {
    pub function: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
}

impl Frame {
    pub fn new(function: impl Into<String>) -> Self {
        Self {
            function: function.into(),
            file: None,
            line: None,
        }
    }

    pub fn at(mut self, file: impl Into<String>, line: u32) -> Self {
        self.file = Some(file.into());
        self.line = Some(line);
        self
    }

    /// `file:line`, if known.
    pub fn location(&self) -> Option<String> {
        match (&self.file, self.line) {
            (Some(file), Some(line)) => Some(format!("{file}:{line}")),
            (Some(file), None) => Some(file.clone()),
            _ => None,
        }
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.location() {
            Some(loc) => write!(f, "{} ({loc})", self.function),
            None => f.write_str(&self.function),
        }
    }
}

/// A frame-list snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StackTrace {
    frames: Vec<Frame>,
}

/// Type URL of a JSON-encoded [`StackTrace`] payload.
pub const STACK_PAYLOAD_TYPE_URL: &str = "errorchain/stack+json";

impl StackTrace {
    pub fn new(frames: Vec<Frame>) -> Self {
        Self { frames }
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn to_payload(&self) -> Result<Vec<u8>, WireError> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Parse a payload tagged `type_url`. Anything other than
    /// [`STACK_PAYLOAD_TYPE_URL`] carrying a JSON frame list is rejected.
    pub fn from_payload(type_url: &str, bytes: &[u8]) -> Result<Self, WireError> {
        if type_url != STACK_PAYLOAD_TYPE_URL {
            return Err(WireError::InvalidPayload {
                type_url: type_url.to_string(),
                reason: format!("expected {STACK_PAYLOAD_TYPE_URL}"),
            });
        }
        serde_json::from_slice(bytes).map_err(|e| WireError::InvalidPayload {
            type_url: type_url.to_string(),
            reason: e.to_string(),
        })
    }
}

/// Capture the current call stack, dropping the capture machinery itself and
/// then `skip` more caller frames.
pub fn capture_stack(skip: usize) -> StackTrace {
    let text = Backtrace::force_capture().to_string();
    let frames = parse_backtrace(&text);
    let machinery = frames
        .iter()
        .take_while(|f| is_capture_frame(&f.function))
        .count();
    StackTrace::new(frames.into_iter().skip(machinery + skip).collect())
}

fn is_capture_frame(function: &str) -> bool {
    function.contains("backtrace") || function.contains("capture_stack")
}

/// Parse the `Display` form of a [`Backtrace`]:
///
/// ```text
///    0: app::module::function
///              at ./src/module.rs:12:5
/// ```
fn parse_backtrace(text: &str) -> Vec<Frame> {
    let mut frames: Vec<Frame> = Vec::new();
    for line in text.lines() {
        let trimmed = line.trim();
        if let Some(location) = trimmed.strip_prefix("at ") {
            if let Some(frame) = frames.last_mut() {
                let (file, line) = split_location(location);
                frame.file = Some(file);
                frame.line = line;
            }
            continue;
        }
        if let Some((index, function)) = trimmed.split_once(": ") {
            if !index.is_empty() && index.chars().all(|c| c.is_ascii_digit()) {
                frames.push(Frame::new(function));
            }
        }
    }
    frames
}

/// `path/file.rs:12:5` → (`path/file.rs`, Some(12)).
fn split_location(location: &str) -> (String, Option<u32>) {
    let mut parts = location.rsplitn(3, ':');
    let last = parts.next();
    let middle = parts.next();
    let rest = parts.next();
    match (rest, middle, last) {
        (Some(file), Some(line), Some(_col)) if line.parse::<u32>().is_ok() => {
            (file.to_string(), line.parse().ok())
        }
        (None, Some(file), Some(line)) if line.parse::<u32>().is_ok() => {
            (file.to_string(), line.parse().ok())
        }
        _ => (location.to_string(), None),
    }
}

/// Drop from `cur` the longest tail it shares with `prev` (compared from the
/// oldest frame backwards). The innermost frame of `cur` is always kept.
///
/// Returns the reduced frames and whether anything was removed.
pub fn elide_shared_suffix(prev: &[Frame], cur: &[Frame]) -> (Vec<Frame>, bool) {
    if prev.is_empty() || cur.is_empty() {
        return (cur.to_vec(), false);
    }
    let shared = prev
        .iter()
        .rev()
        .zip(cur.iter().rev())
        .take_while(|(a, b)| a == b)
        .count()
        .min(cur.len() - 1);
    (cur[..cur.len() - shared].to_vec(), shared > 0)
}
