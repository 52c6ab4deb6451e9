//! Textual fixups for repr artifacts that differ between platforms and
//! library versions but carry no meaning in example output.

use regex::Regex;

/// The four precompiled substitutions behind `FIX`.
#[derive(Debug, Clone)]
pub struct Fixups {
    str_literal: Regex,
    byteorder: Regex,
    width: Regex,
    long_int: Regex,
}

impl Default for Fixups {
    fn default() -> Self {
        Self::new()
    }
}

impl Fixups {
    pub fn new() -> Self {
        // Constant patterns; a failure here is a bug in the literal.
        let compile = |pat: &str| Regex::new(pat).expect("fixup pattern compiles");
        Self {
            // u'x' / U"x" / ur'x' -> 'x' / "x" / r'x'
            str_literal: compile(r#"(\W|^)[uU]([rR]?['"])"#),
            // '|S9' -> 'S9', '<f8' -> 'f8'
            byteorder: compile(r#"(['"])[|<>]([biufcSaUV][0-9]+)(['"])"#),
            // 'i4', 'i8' -> 'i'; 'u4', 'u8' -> 'u'
            width: compile(r#"(['"])([iu])[48](['"])"#),
            // 10L -> 10
            long_int: compile(r"([0-9]+)L"),
        }
    }

    /// Normalize one string.
    pub fn apply(&self, text: &str) -> String {
        let s = self.str_literal.replace_all(text, "${1}${2}");
        let s = self.byteorder.replace_all(&s, "${1}${2}${3}");
        let s = self.width.replace_all(&s, "${1}${2}${3}");
        self.long_int.replace_all(&s, "${1}").into_owned()
    }

    /// Normalize both sides of a comparison.
    pub fn do_fixes(&self, want: &str, got: &str) -> (String, String) {
        (self.apply(want), self.apply(got))
    }
}
