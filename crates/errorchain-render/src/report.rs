//! Verbose, layer-by-layer error reports.
//!
//! ```text
//! <message>
//! (1) <innermost headline>
//!   | <detail>
//! Wraps: (2) <headline>
//!   | -- stack trace:
//!   | <function>
//!   | 	<file>:<line>
//!   | [...repeated from (1)...]
//! Error types: (1) <type key> (2) <type key>
//! ```
//!
//! Layers are numbered in post-order: the causes of a join get their numbers
//! (and their nested sub-reports) before the join itself.

use errorchain_core::{
    elide_shared_suffix, Decomposed, ErrorNode, Frame, RedactableLine, RedactableString, TypeKey,
};

use crate::layer::describe_layer;

const DETAIL_PREFIX: &str = "  | ";
const CAUSE_FIRST_PREFIX: &str = "  └─ ";
const CAUSE_CONT_PREFIX: &str = "     ";

/// A fully laid-out verbose report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerboseReport {
    lines: Vec<RedactableLine>,
}

impl VerboseReport {
    pub fn build(node: &dyn ErrorNode) -> Self {
        let mut builder = ReportBuilder::default();
        let mut lines = RedactableLine::untrusted(&node.message()).split_lines();
        lines.extend(builder.chain(node));

        let mut types = RedactableLine::safe("Error types:");
        for (number, key) in &builder.types {
            types.push_safe(&format!(" ({number}) {key}"));
        }
        lines.push(types);

        Self { lines }
    }

    pub fn lines(&self) -> &[RedactableLine] {
        &self.lines
    }

    pub fn to_plain(&self) -> String {
        self.lines
            .iter()
            .map(RedactableLine::to_plain)
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn to_redactable(&self) -> RedactableString {
        RedactableString::from_lines(&self.lines)
    }
}

#[derive(Default)]
struct ReportBuilder {
    next: usize,
    types: Vec<(usize, TypeKey)>,
    /// Full frames and number of the nearest inner layer that had a stack.
    last_stack: Option<(Vec<Frame>, usize)>,
}

impl ReportBuilder {
    fn assign(&mut self, node: &dyn ErrorNode) -> usize {
        self.next += 1;
        self.types.push((self.next, node.type_key()));
        self.next
    }

    /// Lines for `node` and every wrapper beneath it, innermost first.
    fn chain(&mut self, node: &dyn ErrorNode) -> Vec<RedactableLine> {
        let mut main_line = vec![node];
        let mut current = node;
        while let Decomposed::Wrapper(cause) = current.decompose() {
            main_line.push(cause);
            current = cause;
        }

        let mut out = Vec::new();
        for (i, &layer) in main_line.iter().rev().enumerate() {
            let mut cause_numbers = Vec::new();
            if let Decomposed::Join(causes) = layer.decompose() {
                for cause in causes {
                    self.last_stack = None;
                    let sub = self.chain(&**cause);
                    cause_numbers.push(self.next);
                    for (j, line) in sub.iter().enumerate() {
                        let prefix = if j == 0 { CAUSE_FIRST_PREFIX } else { CAUSE_CONT_PREFIX };
                        out.push(line.prefixed(prefix));
                    }
                }
                self.last_stack = None;
            }
            let number = self.assign(layer);
            out.extend(self.layer(layer, number, i == 0, &cause_numbers));
        }
        out
    }

    fn layer(
        &mut self,
        node: &dyn ErrorNode,
        number: usize,
        innermost: bool,
        cause_numbers: &[usize],
    ) -> Vec<RedactableLine> {
        let (headline, details) = describe_layer(node).into_parts();
        let mut lines = Vec::new();

        let label = if innermost {
            format!("({number})")
        } else {
            format!("Wraps: ({number})")
        };
        let mut headline_lines = headline.split_lines().into_iter();
        let mut head = RedactableLine::safe(&label);
        if let Some(first) = headline_lines.next().filter(|l| !l.is_empty()) {
            head.push_safe(" ").append(first);
        }
        lines.push(head);
        for extra in headline_lines {
            lines.push(extra.prefixed(DETAIL_PREFIX));
        }

        for detail in details {
            for line in detail.split_lines() {
                lines.push(line.prefixed(DETAIL_PREFIX));
            }
        }

        if !cause_numbers.is_empty() {
            let refs: Vec<String> = cause_numbers.iter().map(|n| format!("({n})")).collect();
            lines.push(RedactableLine::safe(&format!(
                "{DETAIL_PREFIX}causes: {}",
                refs.join(", ")
            )));
        }

        if let Some(provider) = node.as_stack_provider() {
            let frames = provider.stack_trace().frames();
            if !frames.is_empty() {
                lines.extend(self.stack_lines(frames, number));
            }
        }
        lines
    }

    fn stack_lines(&mut self, frames: &[Frame], number: usize) -> Vec<RedactableLine> {
        let (shown, repeated_from) = match &self.last_stack {
            Some((prev, prev_number)) => {
                let (reduced, elided) = elide_shared_suffix(prev, frames);
                (reduced, elided.then_some(*prev_number))
            }
            None => (frames.to_vec(), None),
        };
        self.last_stack = Some((frames.to_vec(), number));

        let mut lines = vec![RedactableLine::safe(&format!("{DETAIL_PREFIX}-- stack trace:"))];
        for frame in &shown {
            lines.push(RedactableLine::safe(&format!("{DETAIL_PREFIX}{}", frame.function)));
            if let Some(location) = frame.location() {
                lines.push(RedactableLine::safe(&format!("{DETAIL_PREFIX}\t{location}")));
            }
        }
        if let Some(from) = repeated_from {
            lines.push(RedactableLine::safe(&format!(
                "{DETAIL_PREFIX}[...repeated from ({from})...]"
            )));
        }
        lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use errorchain_core::{join, new_error, wrap, StackTrace, WithStack};
    use pretty_assertions::assert_eq;

    fn stacked(cause: errorchain_core::BoxedNode, frames: &[(&str, &str, u32)]) -> errorchain_core::BoxedNode {
        let frames = frames
            .iter()
            .map(|(f, file, line)| Frame::new(*f).at(*file, *line))
            .collect();
        Box::new(WithStack::from_parts(cause, StackTrace::new(frames)))
    }

    #[test]
    fn single_leaf() {
        let report = VerboseReport::build(&*new_error("hello"));
        assert_eq!(
            report.to_plain(),
            "hello\n(1) hello\nError types: (1) errorchain_core::types::BasicError"
        );
    }

    #[test]
    fn wrapper_layers_count_outward() {
        let report = VerboseReport::build(&*wrap(wrap(new_error("c"), "b"), "a"));
        assert_eq!(
            report.to_plain(),
            "a: b: c\n\
             (1) c\n\
             Wraps: (2) b\n\
             Wraps: (3) a\n\
             Error types: (1) errorchain_core::types::BasicError \
             (2) errorchain_core::types::WithPrefix (3) errorchain_core::types::WithPrefix"
        );
    }

    #[test]
    fn join_causes_are_numbered_first() {
        let chain = join(vec![wrap(new_error("a"), "ctx"), new_error("b")]);
        let report = VerboseReport::build(&*chain);
        assert_eq!(
            report.to_plain(),
            "ctx: a\n\
             b\n  \
             └─ (1) a\n     \
             Wraps: (2) ctx\n  \
             └─ (3) b\n\
             (4)\n  \
             | causes: (2), (3)\n\
             Error types: (1) errorchain_core::types::BasicError \
             (2) errorchain_core::types::WithPrefix (3) errorchain_core::types::BasicError \
             (4) errorchain_core::types::Join"
        );
    }

    #[test]
    fn repeated_stack_tail_is_elided() {
        let inner = stacked(
            new_error("boom"),
            &[("app::inner", "a.rs", 1), ("app::main", "main.rs", 9)],
        );
        let outer = stacked(inner, &[("app::outer", "b.rs", 2), ("app::main", "main.rs", 9)]);
        let report = VerboseReport::build(&*outer).to_plain();
        let lines: Vec<&str> = report.lines().collect();
        assert_eq!(
            lines,
            vec![
                "boom",
                "(1) boom",
                "Wraps: (2) attached stack trace",
                "  | -- stack trace:",
                "  | app::inner",
                "  | \ta.rs:1",
                "  | app::main",
                "  | \tmain.rs:9",
                "Wraps: (3) attached stack trace",
                "  | -- stack trace:",
                "  | app::outer",
                "  | \tb.rs:2",
                "  | [...repeated from (2)...]",
                "Error types: (1) errorchain_core::types::BasicError \
                 (2) errorchain_core::types::WithStack (3) errorchain_core::types::WithStack",
            ]
        );
    }

    #[test]
    fn stacks_in_separate_join_branches_are_not_compared() {
        let frames = [("app::work", "w.rs", 4), ("app::main", "main.rs", 1)];
        let chain = join(vec![
            stacked(new_error("a"), &frames),
            stacked(new_error("b"), &frames),
        ]);
        let report = VerboseReport::build(&*chain).to_plain();
        assert!(!report.contains("repeated from"));
    }

    #[test]
    fn redactable_report_marks_only_untrusted_text() {
        let report = VerboseReport::build(&*wrap(new_error("alice"), "user"));
        assert_eq!(
            report.to_redactable().as_str(),
            "‹user: alice›\n\
             (1) ‹alice›\n\
             Wraps: (2) ‹user›\n\
             Error types: (1) errorchain_core::types::BasicError (2) errorchain_core::types::WithPrefix"
        );
        assert_eq!(
            report.to_redactable().redact(),
            "‹×›\n\
             (1) ‹×›\n\
             Wraps: (2) ‹×›\n\
             Error types: (1) errorchain_core::types::BasicError (2) errorchain_core::types::WithPrefix"
        );
    }
}
