//! The numeric-aware output checker.

use std::borrow::Cow;

use regex::Regex;
use tracing::{debug, trace, warn};

use crate::config::{CheckerConfig, Tolerance};
use crate::directive::apply_directives;
use crate::errors::Result;
use crate::fixups::Fixups;
use crate::flags::OptionFlags;
use crate::host::{blankline_regex, normalize_whitespace, Host, OutputChecker, StandardHost};
use crate::numeric::{reconcile, splice, Reconciliation, TokenScanner};

/// Bits of the five options this checker registers with its host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckerFlags {
    /// Normalize repr artifacts before comparing
    pub fix: OptionFlags,
    /// Compare numbers by value
    pub float_cmp: OptionFlags,
    /// Accept any output
    pub ignore_output: OptionFlags,
    /// Accept any output on the legacy runtime generation only; inert here
    pub ignore_output_2: OptionFlags,
    /// Accept any output on the current runtime generation
    pub ignore_output_3: OptionFlags,
}

impl CheckerFlags {
    pub fn register<H: Host + ?Sized>(host: &mut H) -> Result<Self> {
        Ok(Self {
            fix: host.register_flag("FIX")?,
            float_cmp: host.register_flag("FLOAT_CMP")?,
            ignore_output: host.register_flag("IGNORE_OUTPUT")?,
            ignore_output_2: host.register_flag("IGNORE_OUTPUT_2")?,
            ignore_output_3: host.register_flag("IGNORE_OUTPUT_3")?,
        })
    }

    /// Flags that force a match on this runtime.
    pub fn ignoring(&self) -> OptionFlags {
        self.ignore_output | self.ignore_output_3
    }
}

/// Output checker that compares floats numerically and can normalize
/// platform-specific repr noise.
///
/// All state is built in the constructor and read-only afterwards, so one
/// checker can be shared between threads.
#[derive(Debug, Clone)]
pub struct NumericOutputChecker<H = StandardHost> {
    host: H,
    flags: CheckerFlags,
    fixups: Fixups,
    scanner: TokenScanner,
    tolerance: Tolerance,
    want_blankline: Regex,
    got_blankline: Regex,
}

impl Default for NumericOutputChecker<StandardHost> {
    fn default() -> Self {
        Self::new()
    }
}

impl NumericOutputChecker<StandardHost> {
    /// Checker with default settings on a fresh [`StandardHost`].
    pub fn new() -> Self {
        Self::with_config(CheckerConfig::default()).expect("default configuration is valid")
    }

    pub fn with_config(config: CheckerConfig) -> Result<Self> {
        let host = StandardHost::with_markers(&config.blankline_marker, &config.ellipsis_marker);
        Self::with_host(host, config)
    }
}

impl<H: Host> NumericOutputChecker<H> {
    /// Register this checker's options with `host` and precompile patterns.
    pub fn with_host(mut host: H, config: CheckerConfig) -> Result<Self> {
        config.validate()?;
        let flags = CheckerFlags::register(&mut host)?;
        Ok(Self {
            host,
            flags,
            fixups: Fixups::new(),
            scanner: TokenScanner::new(config.boundaries, &config.ellipsis_marker),
            tolerance: config.tolerance,
            want_blankline: blankline_regex(&config.blankline_marker),
            got_blankline: Regex::new(r"(?m)^\s*?$").expect("constant pattern compiles"),
        })
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn flags(&self) -> &CheckerFlags {
        &self.flags
    }

    /// Flags named by a directive such as `+FLOAT_CMP +ELLIPSIS`.
    pub fn options(&self, directive: &str) -> Result<OptionFlags> {
        apply_directives(self.host.registry(), OptionFlags::empty(), directive)
    }

    pub fn do_fixes(&self, want: &str, got: &str) -> (String, String) {
        self.fixups.do_fixes(want, got)
    }

    /// Numeric-aware comparison. A token the float parser rejects makes the
    /// comparison fail.
    pub fn normalize_floats(&self, want: &str, got: &str, flags: OptionFlags) -> bool {
        match self.try_normalize_floats(want, got, flags) {
            Ok(matched) => matched,
            Err(err) => {
                warn!(error = %err, "numeric comparison aborted");
                false
            }
        }
    }

    /// Like [`normalize_floats`](Self::normalize_floats), but surfaces
    /// unparseable numeric tokens as errors.
    pub fn try_normalize_floats(&self, want: &str, got: &str, flags: OptionFlags) -> Result<bool> {
        if got == want {
            return Ok(true);
        }

        let got_tokens = self.scanner.scan_got(got);
        let want_tokens = self.scanner.scan_want(want);
        let mut got = match reconcile(&got_tokens, &want_tokens, &self.tolerance)? {
            Reconciliation::CountMismatch { got, want } => {
                debug!(got, want, "numeric token counts differ");
                return Ok(false);
            }
            Reconciliation::OutOfTolerance { index, got, want } => {
                debug!(index, got, want, "numbers not close");
                return Ok(false);
            }
            Reconciliation::Agreed { replacements } if replacements.is_empty() => got.to_string(),
            Reconciliation::Agreed { replacements } => {
                trace!(count = replacements.len(), "numeric tokens reconciled");
                splice(got, &got_tokens, &replacements)
            }
        };

        // `want` with each wildcard number replaced by the actual value. Only
        // an extra equality candidate; the ellipsis match sees `want` as written.
        let mut filled = want_tokens.iter().any(|t| t.is_wildcard()).then(|| {
            let texts: Vec<&str> = want_tokens
                .iter()
                .zip(&got_tokens)
                .map(|(w, g)| if w.is_wildcard() { g.text } else { w.text })
                .collect();
            splice(want, &want_tokens, &texts)
        });
        let mut want = want.to_string();
        let agrees = |want: &str, filled: &Option<String>, got: &str| {
            got == want || filled.as_deref() == Some(got)
        };

        if !flags.contains(OptionFlags::DONT_ACCEPT_BLANKLINE) {
            want = self.want_blankline.replace_all(&want, "").into_owned();
            filled = filled.map(|f| self.want_blankline.replace_all(&f, "").into_owned());
            got = self.got_blankline.replace_all(&got, "").into_owned();
            if agrees(&want, &filled, &got) {
                return Ok(true);
            }
        }

        if flags.contains(OptionFlags::NORMALIZE_WHITESPACE) {
            got = normalize_whitespace(&got);
            want = normalize_whitespace(&want);
            filled = filled.map(|f| normalize_whitespace(&f));
            if agrees(&want, &filled, &got) {
                return Ok(true);
            }
        }

        Ok(flags.contains(OptionFlags::ELLIPSIS) && self.host.ellipsis_match(&want, &got))
    }

    fn fixed<'a>(&self, want: &'a str, got: &'a str, flags: OptionFlags) -> (Cow<'a, str>, Cow<'a, str>) {
        if flags.contains(self.flags.fix) {
            let (w, g) = self.do_fixes(want, got);
            (Cow::Owned(w), Cow::Owned(g))
        } else {
            (Cow::Borrowed(want), Cow::Borrowed(got))
        }
    }
}

impl<H: Host> OutputChecker for NumericOutputChecker<H> {
    fn check_output(&self, want: &str, got: &str, flags: OptionFlags) -> bool {
        if flags.intersects(self.flags.ignoring()) {
            debug!("output ignored by option");
            return true;
        }

        let (want, got) = self.fixed(want, got, flags);

        if flags.contains(self.flags.float_cmp) {
            return self.normalize_floats(&want, &got, flags);
        }

        self.host.check_output(&want, &got, flags)
    }

    fn output_difference(&self, want: &str, got: &str, flags: OptionFlags) -> String {
        let (want, got) = self.fixed(want, got, flags);
        self.host.output_difference(&want, &got, flags)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn registers_five_distinct_bits() {
        let checker = NumericOutputChecker::new();
        let f = checker.flags();
        let all = [f.fix, f.float_cmp, f.ignore_output, f.ignore_output_2, f.ignore_output_3];
        let union = all.iter().fold(OptionFlags::empty(), |acc, b| acc | *b);
        assert_eq!(union.bits().count_ones(), 5);
        assert_eq!(checker.host().flag("FLOAT_CMP"), Some(f.float_cmp));
    }

    #[test]
    fn options_parse_against_host_registry() {
        let checker = NumericOutputChecker::new();
        let flags = checker.options("+FLOAT_CMP +ELLIPSIS").unwrap();
        assert_eq!(flags, checker.flags().float_cmp | OptionFlags::ELLIPSIS);
        assert!(checker.options("+NOT_A_FLAG").is_err());
    }

    #[test]
    fn wildcard_numbers_take_the_actual_value() {
        let checker = NumericOutputChecker::new();
        let flags = checker.flags().float_cmp;
        assert!(checker.normalize_floats("[0.1, 0.2...]", "[0.1000000001, 0.25]", flags));
        assert!(!checker.normalize_floats("[0.1, 0.2]", "[0.1000000001, 0.25]", flags));
    }

    #[test]
    fn wildcard_number_keeps_its_marker_for_ellipsis() {
        let checker = NumericOutputChecker::new();
        let flags = checker.flags().float_cmp | OptionFlags::ELLIPSIS;
        assert!(checker.normalize_floats("x = 1.5...", "x = 1.5 units", flags));
        assert!(checker.normalize_floats("mean 2.0...\n", "mean 2.0 (n=3)\n", flags));
        assert!(!checker.normalize_floats("x = 1.5...", "x = 1.5 units", checker.flags().float_cmp));
    }

    #[test]
    fn dont_accept_blankline_disables_the_reconciled_match() {
        let checker = NumericOutputChecker::new();
        let flags = checker.flags().float_cmp;
        assert!(checker.normalize_floats("1.0\n<BLANKLINE>\n2.0\n", "1.0\n   \n2.0\n", flags));
        let strict = flags | OptionFlags::DONT_ACCEPT_BLANKLINE;
        assert!(!checker.normalize_floats("1.0\n<BLANKLINE>\n2.0\n", "1.0\n   \n2.0\n", strict));
        assert!(!checker.normalize_floats("1.0\n", "1.00000000001\n", strict));
        // whitespace normalization still compares the reconciled text
        assert!(checker.normalize_floats("1.0\n", "1.00000000001\n", strict | OptionFlags::NORMALIZE_WHITESPACE));
    }
}
