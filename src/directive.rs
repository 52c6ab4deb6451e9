// src/directive.rs
//! Option directives: `# doctest: +FLOAT_CMP, -ELLIPSIS`.

use crate::errors::{CheckError, Result};
use crate::flags::{FlagRegistry, OptionFlags};

/// Flags switched on and off by one directive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Directive {
    pub enable: OptionFlags,
    pub disable: OptionFlags,
}

impl Directive {
    /// `(base | enable) - disable`
    pub fn apply(&self, base: OptionFlags) -> OptionFlags {
        base.union(self.enable).difference(self.disable)
    }
}

/// Parse a directive against `registry`. A leading `#` and `doctest:`
/// prefix are optional; items are separated by commas and/or whitespace.
pub fn parse_directives(registry: &FlagRegistry, text: &str) -> Result<Directive> {
    let mut p = Scanner::new(text);
    p.skip_ws();
    p.consume_char('#');
    p.skip_ws();
    if p.peek_str("doctest:") {
        p.advance("doctest:".len());
    }

    let mut out = Directive::default();
    loop {
        p.skip_separators();
        let Some(sign) = p.peek_char() else { break };
        if sign != '+' && sign != '-' {
            return Err(CheckError::Parse(format!(
                "expected '+' or '-' before option name at {:?}",
                p.rest()
            )));
        }
        p.advance(1);
        let name = p.parse_identifier()?;
        let bit = registry
            .get(&name)
            .ok_or_else(|| CheckError::UnknownFlag(name.clone()))?;
        if sign == '+' {
            out.enable |= bit;
            out.disable = out.disable.difference(bit);
        } else {
            out.disable |= bit;
            out.enable = out.enable.difference(bit);
        }
    }
    Ok(out)
}

/// Convenience: parse `text` and apply it to `base`.
pub fn apply_directives(registry: &FlagRegistry, base: OptionFlags, text: &str) -> Result<OptionFlags> {
    Ok(parse_directives(registry, text)?.apply(base))
}

struct Scanner<'a> {
    s: &'a str,
    i: usize,
}

impl<'a> Scanner<'a> {
    fn new(s: &'a str) -> Self {
        Self { s, i: 0 }
    }

    fn parse_identifier(&mut self) -> Result<String> {
        let start = self.i;
        while let Some(c) = self.peek_char() {
            if c == '_' || c.is_ascii_alphanumeric() {
                self.i += c.len_utf8();
            } else {
                break;
            }
        }
        if self.i == start {
            return Err(CheckError::Parse("option name expected".into()));
        }
        Ok(self.s[start..self.i].to_string())
    }

    fn consume_char(&mut self, c: char) -> bool {
        if self.peek_char() == Some(c) {
            self.i += c.len_utf8();
            true
        } else {
            false
        }
    }

    fn advance(&mut self, n: usize) {
        self.i = (self.i + n).min(self.s.len());
    }

    fn peek_char(&self) -> Option<char> {
        self.s[self.i..].chars().next()
    }

    fn peek_str(&self, lit: &str) -> bool {
        self.s[self.i..].starts_with(lit)
    }

    fn rest(&self) -> &'a str {
        &self.s[self.i..]
    }

    fn skip_ws(&mut self) {
        while let Some(c) = self.peek_char() {
            if c.is_whitespace() {
                self.i += c.len_utf8();
            } else {
                break;
            }
        }
    }

    fn skip_separators(&mut self) {
        while let Some(c) = self.peek_char() {
            if c.is_whitespace() || c == ',' {
                self.i += c.len_utf8();
            } else {
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn plus_and_minus() {
        let reg = FlagRegistry::with_builtins();
        let d = parse_directives(&reg, "# doctest: +ELLIPSIS, -NORMALIZE_WHITESPACE").unwrap();
        assert_eq!(d.enable, OptionFlags::ELLIPSIS);
        assert_eq!(d.disable, OptionFlags::NORMALIZE_WHITESPACE);
        let applied = d.apply(OptionFlags::NORMALIZE_WHITESPACE | OptionFlags::SKIP);
        assert_eq!(applied, OptionFlags::ELLIPSIS | OptionFlags::SKIP);
    }

    #[test]
    fn last_mention_wins() {
        let reg = FlagRegistry::with_builtins();
        let d = parse_directives(&reg, "+SKIP -SKIP +SKIP").unwrap();
        assert_eq!(d.enable, OptionFlags::SKIP);
        assert!(d.disable.is_empty());
    }

    #[test]
    fn empty_directive_is_noop() {
        let reg = FlagRegistry::with_builtins();
        assert_eq!(parse_directives(&reg, "  ").unwrap(), Directive::default());
        assert_eq!(parse_directives(&reg, "doctest:").unwrap(), Directive::default());
    }

    #[test]
    fn errors() {
        let reg = FlagRegistry::with_builtins();
        assert!(matches!(parse_directives(&reg, "ELLIPSIS"), Err(CheckError::Parse(_))));
        assert!(matches!(parse_directives(&reg, "+"), Err(CheckError::Parse(_))));
        assert!(matches!(
            parse_directives(&reg, "+NOPE"),
            Err(CheckError::UnknownFlag(name)) if name == "NOPE"
        ));
    }
}
