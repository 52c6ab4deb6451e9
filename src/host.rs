//! The host side of the comparator extension point: flag registration,
//! ellipsis matching, and the default comparator and diff renderer that a
//! custom checker falls back on.

use itertools::Itertools;
use regex::Regex;

use crate::diff;
use crate::errors::Result;
use crate::flags::{FlagRegistry, OptionFlags};

/// A comparator a runner calls once per example.
pub trait OutputChecker: Send + Sync {
    /// Does `got` satisfy `want` under `flags`?
    fn check_output(&self, want: &str, got: &str, flags: OptionFlags) -> bool;

    /// Human-readable explanation of a failed check. Never changes the outcome.
    fn output_difference(&self, want: &str, got: &str, flags: OptionFlags) -> String;
}

/// What a custom checker needs from the framework it plugs into.
pub trait Host: OutputChecker {
    /// Bit for `name`, allocating one on first registration.
    fn register_flag(&mut self, name: &str) -> Result<OptionFlags>;

    fn registry(&self) -> &FlagRegistry;

    fn flag(&self, name: &str) -> Option<OptionFlags> {
        self.registry().get(name)
    }

    /// `...` in `want` matches any substring of `got`.
    fn ellipsis_match(&self, want: &str, got: &str) -> bool;
}

/// Collapse every whitespace run to one space and trim the ends.
pub fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().join(" ")
}

/// Prefix every non-empty line with four spaces.
pub(crate) fn indent(s: &str) -> String {
    s.split_inclusive('\n')
        .map(|line| if line == "\n" { line.to_string() } else { format!("    {line}") })
        .collect()
}

/// Default doctest-style behavior.
#[derive(Debug, Clone)]
pub struct StandardHost {
    registry: FlagRegistry,
    blankline_marker: String,
    ellipsis_marker: String,
    want_blankline: Regex,
    got_blankline: Regex,
}

impl Default for StandardHost {
    fn default() -> Self {
        Self::new()
    }
}

impl StandardHost {
    pub fn new() -> Self {
        Self::with_markers("<BLANKLINE>", "...")
    }

    pub fn with_markers(blankline_marker: &str, ellipsis_marker: &str) -> Self {
        Self {
            registry: FlagRegistry::with_builtins(),
            blankline_marker: blankline_marker.to_string(),
            ellipsis_marker: ellipsis_marker.to_string(),
            want_blankline: blankline_regex(blankline_marker),
            // lines of spaces/tabs only, newline excluded
            got_blankline: Regex::new(r"(?m)^[^\S\n]+$").expect("constant pattern compiles"),
        }
    }

    pub fn blankline_marker(&self) -> &str {
        &self.blankline_marker
    }

    pub fn ellipsis_marker(&self) -> &str {
        &self.ellipsis_marker
    }

    /// Replace blank lines in `got` with the marker so they show up in reports.
    fn mark_blank_lines(&self, got: &str) -> String {
        got.split_inclusive('\n')
            .map(|line| match line.strip_suffix('\n') {
                Some(body) if body.chars().all(|c| c == ' ') => format!("{}\n", self.blankline_marker),
                _ => line.to_string(),
            })
            .collect()
    }
}

/// `(?m)^<marker>\s*?$`: the marker alone on a line.
pub(crate) fn blankline_regex(marker: &str) -> Regex {
    Regex::new(&format!(r"(?m)^{}\s*?$", regex::escape(marker))).expect("escaped marker compiles")
}

fn wants_fancy_diff(want: &str, got: &str, flags: OptionFlags) -> bool {
    if !flags.intersects(OptionFlags::REPORT_DIFFS) {
        return false;
    }
    if flags.contains(OptionFlags::REPORT_NDIFF) {
        return true;
    }
    want.matches('\n').count() > 2 && got.matches('\n').count() > 2
}

impl OutputChecker for StandardHost {
    fn check_output(&self, want: &str, got: &str, flags: OptionFlags) -> bool {
        if got == want {
            return true;
        }

        if !flags.contains(OptionFlags::DONT_ACCEPT_TRUE_FOR_1)
            && matches!((got, want), ("True\n", "1\n") | ("False\n", "0\n"))
        {
            return true;
        }

        let (mut want, mut got) = (want.to_string(), got.to_string());
        if !flags.contains(OptionFlags::DONT_ACCEPT_BLANKLINE) {
            want = self.want_blankline.replace_all(&want, "").into_owned();
            got = self.got_blankline.replace_all(&got, "").into_owned();
            if got == want {
                return true;
            }
        }

        if flags.contains(OptionFlags::NORMALIZE_WHITESPACE) {
            got = normalize_whitespace(&got);
            want = normalize_whitespace(&want);
            if got == want {
                return true;
            }
        }

        flags.contains(OptionFlags::ELLIPSIS) && self.ellipsis_match(&want, &got)
    }

    fn output_difference(&self, want: &str, got: &str, flags: OptionFlags) -> String {
        let got = if flags.contains(OptionFlags::DONT_ACCEPT_BLANKLINE) {
            got.to_string()
        } else {
            self.mark_blank_lines(got)
        };

        if wants_fancy_diff(want, &got, flags) {
            let (kind, body) = if flags.contains(OptionFlags::REPORT_UDIFF) {
                ("unified diff with -expected +actual", diff::unified(want, &got))
            } else if flags.contains(OptionFlags::REPORT_CDIFF) {
                ("context diff with expected followed by actual", diff::context(want, &got))
            } else {
                ("ndiff with -expected +actual", diff::ndiff(want, &got))
            };
            return format!("Differences ({kind}):\n{}", indent(&body));
        }

        match (want.is_empty(), got.is_empty()) {
            (false, false) => format!("Expected:\n{}Got:\n{}", indent(want), indent(&got)),
            (false, true) => format!("Expected:\n{}Got nothing\n", indent(want)),
            (true, false) => format!("Expected nothing\nGot:\n{}", indent(&got)),
            (true, true) => "Expected nothing\nGot nothing\n".to_string(),
        }
    }
}

impl Host for StandardHost {
    fn register_flag(&mut self, name: &str) -> Result<OptionFlags> {
        self.registry.register(name)
    }

    fn registry(&self) -> &FlagRegistry {
        &self.registry
    }

    fn ellipsis_match(&self, want: &str, got: &str) -> bool {
        let marker = self.ellipsis_marker.as_str();
        if !want.contains(marker) {
            return want == got;
        }

        let pieces: Vec<&str> = want.split(marker).collect();
        let mut rest = &pieces[..];
        let (mut start, mut end) = (0, got.len());

        // anchored head
        if let Some((&head, tail)) = rest.split_first() {
            if !head.is_empty() {
                if !got.starts_with(head) {
                    return false;
                }
                start = head.len();
                rest = tail;
            }
        }
        // anchored tail
        if let Some((&last, init)) = rest.split_last() {
            if !last.is_empty() {
                if !got.ends_with(last) {
                    return false;
                }
                end -= last.len();
                rest = init;
            }
        }
        // head and tail overlap
        if start > end {
            return false;
        }

        for piece in rest {
            match got[start..end].find(piece) {
                Some(at) => start += at + piece.len(),
                None => return false,
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn ellipsis_matching() {
        let h = StandardHost::new();
        assert!(h.ellipsis_match("a...c", "abbbc"));
        assert!(h.ellipsis_match("...", ""));
        assert!(h.ellipsis_match("a...b...c", "aXbYc"));
        assert!(!h.ellipsis_match("a...b...c", "aXcYb"));
        assert!(!h.ellipsis_match("aa...aa", "aaa"));
        assert!(h.ellipsis_match("aa...aa", "aaaa"));
        assert!(h.ellipsis_match("plain", "plain"));
        assert!(!h.ellipsis_match("plain", "plainer"));
    }

    #[test]
    fn default_comparator() {
        let h = StandardHost::new();
        assert!(h.check_output("1\n", "True\n", OptionFlags::empty()));
        assert!(!h.check_output("1\n", "True\n", OptionFlags::DONT_ACCEPT_TRUE_FOR_1));
        assert!(h.check_output("a\n<BLANKLINE>\nb\n", "a\n  \nb\n", OptionFlags::empty()));
        assert!(!h.check_output("a\n<BLANKLINE>\nb\n", "a\n\nb\n", OptionFlags::DONT_ACCEPT_BLANKLINE));
        assert!(h.check_output("a  b\n c", "a b c", OptionFlags::NORMALIZE_WHITESPACE));
        assert!(h.check_output("[1, ..., 9]", "[1, 2, 3, 9]", OptionFlags::ELLIPSIS));
        assert!(!h.check_output("[1, ..., 9]", "[1, 2, 3, 9]", OptionFlags::empty()));
    }

    #[test]
    fn plain_report() {
        let h = StandardHost::new();
        let out = h.output_difference("1\n2\n", "1\n\n3\n", OptionFlags::empty());
        assert_eq!(out, "Expected:\n    1\n    2\nGot:\n    1\n    <BLANKLINE>\n    3\n");
        assert_eq!(h.output_difference("", "", OptionFlags::empty()), "Expected nothing\nGot nothing\n");
        assert_eq!(h.output_difference("x\n", "", OptionFlags::empty()), "Expected:\n    x\nGot nothing\n");
        assert_eq!(h.output_difference("", "y\n", OptionFlags::empty()), "Expected nothing\nGot:\n    y\n");
    }

    #[test]
    fn fancy_report_needs_enough_lines() {
        let h = StandardHost::new();
        let short = h.output_difference("a\nb\n", "a\nc\n", OptionFlags::REPORT_UDIFF);
        assert!(short.starts_with("Expected:\n"));
        let long = h.output_difference("a\nb\nc\nd\n", "a\nB\nc\nd\n", OptionFlags::REPORT_UDIFF);
        assert!(long.starts_with("Differences (unified diff with -expected +actual):\n    @@"));
        assert!(long.contains("    -b\n    +B\n"));
        // ndiff ignores the line count
        let nd = h.output_difference("a\n", "b\n", OptionFlags::REPORT_NDIFF);
        assert_eq!(nd, "Differences (ndiff with -expected +actual):\n    - a\n    + b\n");
    }

    #[test]
    fn indent_skips_empty_lines() {
        assert_eq!(indent("a\n\nb"), "    a\n\n    b");
    }
}
