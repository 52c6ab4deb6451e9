//! Numeric token extraction and positional reconciliation.
//!
//! A numeric token is a float-looking literal (`1.`, `-.5`, `2.5e-3`, `1e10`)
//! whose neighbours are separators: whitespace, a configured boundary
//! character, or the edge of the text. Tokens from the expected and actual
//! output are paired strictly by position.

use std::ops::Range;

use itertools::Itertools;
use regex::Regex;

use crate::config::{Boundaries, Tolerance};
use crate::errors::{CheckError, Result};

const NUMBER: &str = r"[+-]?(?:[0-9]+\.[0-9]*(?:e[+-]?[0-9]+)?|\.[0-9]+(?:e[+-]?[0-9]+)?|[0-9]+e[+-]?[0-9]+)";

/// One numeric token found in a text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumericToken<'a> {
    /// Full matched text, including a trailing ellipsis marker if any.
    pub text: &'a str,
    /// Byte range of `text` in the scanned string.
    pub span: Range<usize>,
    /// Length of the trailing ellipsis marker, 0 when absent.
    ellipsis_len: usize,
}

impl<'a> NumericToken<'a> {
    fn new(text: &'a str, start: usize, ellipsis_len: usize) -> Self {
        Self { text, span: start..start + text.len(), ellipsis_len }
    }

    /// Whether this (expected-side) token ends with an ellipsis and so
    /// accepts any value.
    pub fn is_wildcard(&self) -> bool {
        self.ellipsis_len > 0
    }

    /// The number without any ellipsis marker.
    pub fn number(&self) -> &'a str {
        &self.text[..self.text.len() - self.ellipsis_len]
    }

    pub fn value(&self) -> Result<f64> {
        self.number()
            .parse::<f64>()
            .map_err(|_| CheckError::InvalidNumber { token: self.number().to_string() })
    }
}

/// Precompiled token grammar for both sides of a comparison.
#[derive(Debug, Clone)]
pub struct TokenScanner {
    got_rgx: Regex,
    want_rgx: Regex,
    boundaries: Boundaries,
}

impl TokenScanner {
    pub fn new(boundaries: Boundaries, ellipsis_marker: &str) -> Self {
        let got = format!(r"\A(?:{NUMBER})");
        let want = format!(r"\A(?:{NUMBER})(?P<ellipsis>{})?", regex::escape(ellipsis_marker));
        // NUMBER is a constant and the marker is escaped.
        Self {
            got_rgx: Regex::new(&got).expect("numeric token pattern compiles"),
            want_rgx: Regex::new(&want).expect("numeric token pattern compiles"),
            boundaries,
        }
    }

    pub fn boundaries(&self) -> &Boundaries {
        &self.boundaries
    }

    /// Tokens of an actual output, left to right.
    pub fn scan_got<'a>(&self, text: &'a str) -> Vec<NumericToken<'a>> {
        self.scan(text, &self.got_rgx)
    }

    /// Tokens of an expected output, left to right; these may carry an
    /// ellipsis suffix.
    pub fn scan_want<'a>(&self, text: &'a str) -> Vec<NumericToken<'a>> {
        self.scan(text, &self.want_rgx)
    }

    fn scan<'a>(&self, text: &'a str, rgx: &Regex) -> Vec<NumericToken<'a>> {
        let mut tokens = Vec::new();
        let mut pos = 0;
        while pos < text.len() {
            let front_ok = match text[..pos].chars().next_back() {
                None => true,
                Some(prev) => self.boundaries.is_front(prev),
            };
            if front_ok {
                if let Some(tok) = self.match_at(text, pos, rgx) {
                    pos = tok.span.end;
                    tokens.push(tok);
                    continue;
                }
            }
            // pos is always on a char boundary here
            pos += text[pos..].chars().next().map_or(1, char::len_utf8);
        }
        tokens
    }

    fn match_at<'a>(&self, text: &'a str, pos: usize, rgx: &Regex) -> Option<NumericToken<'a>> {
        let caps = rgx.captures(&text[pos..])?;
        let matched = &text[pos..pos + caps.get(0)?.end()];
        // only the expected-side pattern has this group
        let ellipsis_len = caps.name("ellipsis").map_or(0, |m| m.len());

        if self.back_ok(text, pos + matched.len()) {
            return Some(NumericToken::new(matched, pos, ellipsis_len));
        }
        // Without the marker the number may still stand on its own.
        if ellipsis_len > 0 {
            let bare = &matched[..matched.len() - ellipsis_len];
            if self.back_ok(text, pos + bare.len()) {
                return Some(NumericToken::new(bare, pos, 0));
            }
        }
        None
    }

    fn back_ok(&self, text: &str, end: usize) -> bool {
        match text[end..].chars().next() {
            None => true,
            Some(next) => self.boundaries.is_back(next),
        }
    }
}

/// Outcome of reconciling two token sequences.
#[derive(Debug, Clone, PartialEq)]
pub enum Reconciliation<'a> {
    /// Different number of tokens on each side.
    CountMismatch { got: usize, want: usize },
    /// The pair at `index` is not numerically close.
    OutOfTolerance { index: usize, got: &'a str, want: &'a str },
    /// Every pair agrees. `replacements[i]` is the text that stands in for
    /// the i-th actual token: the expected text, or the actual text where the
    /// expected token was a wildcard.
    Agreed { replacements: Vec<&'a str> },
}

/// Pair `got` and `want` tokens by index and compare each pair.
///
/// Requires equal counts; a wildcard expected token accepts any actual
/// value and keeps the actual text.
pub fn reconcile<'a>(
    got: &[NumericToken<'a>],
    want: &[NumericToken<'a>],
    tolerance: &Tolerance,
) -> Result<Reconciliation<'a>> {
    if got.len() != want.len() {
        return Ok(Reconciliation::CountMismatch { got: got.len(), want: want.len() });
    }
    let mut replacements = Vec::with_capacity(got.len());
    for (index, (g, w)) in got.iter().zip_eq(want.iter()).enumerate() {
        if w.is_wildcard() {
            replacements.push(g.text);
            continue;
        }
        let (gv, wv) = (g.value()?, w.value()?);
        if !tolerance.is_close(gv, wv) {
            return Ok(Reconciliation::OutOfTolerance { index, got: g.text, want: w.text });
        }
        replacements.push(w.text);
    }
    Ok(Reconciliation::Agreed { replacements })
}

/// Rebuild `text`, replacing each token span with the matching replacement.
/// Everything between tokens is copied through untouched.
pub fn splice(text: &str, tokens: &[NumericToken<'_>], replacements: &[&str]) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for (tok, rep) in tokens.iter().zip_eq(replacements) {
        out.push_str(&text[last..tok.span.start]);
        out.push_str(rep);
        last = tok.span.end;
    }
    out.push_str(&text[last..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn scanner() -> TokenScanner {
        TokenScanner::new(Boundaries::default(), "...")
    }

    fn texts<'a>(tokens: &[NumericToken<'a>]) -> Vec<&'a str> {
        tokens.iter().map(|t| t.text).collect()
    }

    #[test]
    fn finds_float_forms() {
        let s = scanner();
        let toks = s.scan_got("1.0 -2.5 .5 3. 1e10 +4.5e-3");
        assert_eq!(texts(&toks), vec!["1.0", "-2.5", ".5", "3.", "1e10", "+4.5e-3"]);
    }

    #[test]
    fn integers_are_not_tokens() {
        let s = scanner();
        assert!(s.scan_got("42 and [1, 2]").is_empty());
    }

    #[test]
    fn boundaries_are_required() {
        let s = scanner();
        // embedded in identifiers or followed by other text
        assert!(s.scan_got("x1.5 1.5x a_2.0").is_empty());
        let toks = s.scan_got("array([1.5, 2.5])");
        assert_eq!(texts(&toks), vec!["1.5", "2.5"]);
        let toks = s.scan_got("<1.5>");
        assert_eq!(texts(&toks), vec!["1.5"]);
    }

    #[test]
    fn complex_parts() {
        let s = scanner();
        let toks = s.scan_got("(1.5+2.5j)");
        assert_eq!(texts(&toks), vec!["1.5", "2.5"]);
        let toks = s.scan_got("(1.5-2.5j)");
        assert_eq!(texts(&toks), vec!["1.5", "2.5"]);
    }

    #[test]
    fn spans_point_into_text() {
        let s = scanner();
        let text = "é 1.25 ü,3.5";
        let toks = s.scan_got(text);
        assert_eq!(texts(&toks), vec!["1.25", "3.5"]);
        for t in &toks {
            assert_eq!(&text[t.span.clone()], t.text);
        }
    }

    #[test]
    fn want_tokens_may_carry_ellipsis() {
        let s = scanner();
        let toks = s.scan_want("value: 1.5... and 2.0");
        assert_eq!(texts(&toks), vec!["1.5...", "2.0"]);
        assert!(toks[0].is_wildcard());
        assert_eq!(toks[0].number(), "1.5");
        assert!(!toks[1].is_wildcard());
        // the got side never absorbs the marker
        assert!(s.scan_got("1.5...").is_empty());
    }

    #[test]
    fn ellipsis_dropped_when_it_breaks_the_boundary() {
        let s = TokenScanner::new(Boundaries::default(), "*");
        let toks = s.scan_want("1.5*x");
        assert_eq!(texts(&toks), vec!["1.5"]);
        assert!(!toks[0].is_wildcard());
    }

    #[test]
    fn custom_boundaries() {
        let s = TokenScanner::new(Boundaries::new(":", ";"), "...");
        assert_eq!(texts(&s.scan_got("a:1.5;")), vec!["1.5"]);
        assert!(s.scan_got("(1.5)").is_empty());
    }

    #[test]
    fn reconcile_and_splice() {
        let s = scanner();
        let got = "{'a': 1.0000001, 'b': [2.5, 7.0]}";
        let want = "{'a': 1.0, 'b': [2.50, 7.0...]}";
        let g = s.scan_got(got);
        let w = s.scan_want(want);
        let r = reconcile(&g, &w, &Tolerance::default()).unwrap();
        let Reconciliation::Agreed { replacements } = r else {
            panic!("expected agreement, got {r:?}");
        };
        assert_eq!(replacements, vec!["1.0", "2.50", "7.0"]);
        assert_eq!(splice(got, &g, &replacements), "{'a': 1.0, 'b': [2.50, 7.0]}");
        assert_eq!(splice(want, &w, &replacements), "{'a': 1.0, 'b': [2.50, 7.0]}");
    }

    #[test]
    fn reconcile_reports_failures() {
        let s = scanner();
        let tol = Tolerance::default();
        let r = reconcile(&s.scan_got("1.0"), &s.scan_want("1.0 2.0"), &tol).unwrap();
        assert_eq!(r, Reconciliation::CountMismatch { got: 1, want: 2 });
        let r = reconcile(&s.scan_got("1.0 3.2"), &s.scan_want("1.0 3.14159"), &tol).unwrap();
        assert_eq!(r, Reconciliation::OutOfTolerance { index: 1, got: "3.2", want: "3.14159" });
    }

    #[test]
    fn value_errors_are_typed() {
        let tok = NumericToken::new("1.2.3", 0, 0);
        assert!(matches!(tok.value(), Err(CheckError::InvalidNumber { token }) if token == "1.2.3"));
    }
}
