//! Line diffs for failure reports, in the three classic layouts.
//!
//! Every rendered line keeps its trailing whitespace but ends in exactly
//! one newline, so a final line without `\n` renders the same as one with it.

use similar::{ChangeTag, DiffOp, DiffTag, TextDiff};

/// Unchanged lines kept around each hunk.
const CONTEXT: usize = 2;

fn push_line(out: &mut String, prefix: &str, line: &str) {
    out.push_str(prefix);
    out.push_str(line.trim_end_matches(['\n', '\r']));
    out.push('\n');
}

fn span(group: &[DiffOp]) -> Option<(std::ops::Range<usize>, std::ops::Range<usize>)> {
    let first = group.first()?.as_tag_tuple();
    let last = group.last()?.as_tag_tuple();
    Some((first.1.start..last.1.end, first.2.start..last.2.end))
}

fn unified_range(r: &std::ops::Range<usize>) -> String {
    let len = r.end - r.start;
    match len {
        0 => format!("{},0", r.start),
        1 => format!("{}", r.start + 1),
        _ => format!("{},{}", r.start + 1, len),
    }
}

fn context_range(r: &std::ops::Range<usize>) -> String {
    let len = r.end - r.start;
    match len {
        0 => format!("{}", r.start),
        1 => format!("{}", r.start + 1),
        _ => format!("{},{}", r.start + 1, r.start + len),
    }
}

/// Unified diff hunks (`-` expected, `+` actual), without file headers.
pub fn unified(want: &str, got: &str) -> String {
    let diff = TextDiff::from_lines(want, got);
    let (old, new) = (diff.old_slices(), diff.new_slices());
    let mut out = String::new();
    for group in diff.grouped_ops(CONTEXT) {
        let Some((old_span, new_span)) = span(&group) else { continue };
        out.push_str(&format!("@@ -{} +{} @@\n", unified_range(&old_span), unified_range(&new_span)));
        for op in &group {
            let (tag, o, n) = op.as_tag_tuple();
            match tag {
                DiffTag::Equal => old[o].iter().for_each(|l| push_line(&mut out, " ", l)),
                DiffTag::Delete => old[o].iter().for_each(|l| push_line(&mut out, "-", l)),
                DiffTag::Insert => new[n].iter().for_each(|l| push_line(&mut out, "+", l)),
                DiffTag::Replace => {
                    old[o].iter().for_each(|l| push_line(&mut out, "-", l));
                    new[n].iter().for_each(|l| push_line(&mut out, "+", l));
                }
            }
        }
    }
    out
}

/// Context diff: each hunk shows the expected block, then the actual block.
pub fn context(want: &str, got: &str) -> String {
    let diff = TextDiff::from_lines(want, got);
    let (old, new) = (diff.old_slices(), diff.new_slices());
    let mut out = String::new();
    for group in diff.grouped_ops(CONTEXT) {
        let Some((old_span, new_span)) = span(&group) else { continue };
        let tags: Vec<DiffTag> = group.iter().map(|op| op.as_tag_tuple().0).collect();

        out.push_str("***************\n");
        out.push_str(&format!("*** {} ****\n", context_range(&old_span)));
        if tags.iter().any(|t| matches!(t, DiffTag::Delete | DiffTag::Replace)) {
            for op in &group {
                let (tag, o, _) = op.as_tag_tuple();
                let prefix = match tag {
                    DiffTag::Insert => continue,
                    DiffTag::Equal => "  ",
                    DiffTag::Delete => "- ",
                    DiffTag::Replace => "! ",
                };
                old[o].iter().for_each(|l| push_line(&mut out, prefix, l));
            }
        }

        out.push_str(&format!("--- {} ----\n", context_range(&new_span)));
        if tags.iter().any(|t| matches!(t, DiffTag::Insert | DiffTag::Replace)) {
            for op in &group {
                let (tag, _, n) = op.as_tag_tuple();
                let prefix = match tag {
                    DiffTag::Delete => continue,
                    DiffTag::Equal => "  ",
                    DiffTag::Insert => "+ ",
                    DiffTag::Replace => "! ",
                };
                new[n].iter().for_each(|l| push_line(&mut out, prefix, l));
            }
        }
    }
    out
}

/// Full line-by-line listing: `- ` expected only, `+ ` actual only,
/// two spaces for shared lines.
pub fn ndiff(want: &str, got: &str) -> String {
    let diff = TextDiff::from_lines(want, got);
    let mut out = String::new();
    for change in diff.iter_all_changes() {
        let prefix = match change.tag() {
            ChangeTag::Equal => "  ",
            ChangeTag::Delete => "- ",
            ChangeTag::Insert => "+ ",
        };
        push_line(&mut out, prefix, change.value());
    }
    out
}
