pub mod errors;
pub mod config;
pub mod flags;
pub mod directive;
pub mod host;
pub mod fixups;
pub mod numeric;
pub mod diff;
mod checker;

pub use checker::{CheckerFlags, NumericOutputChecker};
pub use config::{Boundaries, CheckerConfig, Tolerance};
pub use errors::{CheckError, Result};
pub use flags::{FlagRegistry, OptionFlags};
pub use host::{Host, OutputChecker, StandardHost};

/// Convenience: compare with a default checker and options given as a
/// directive, e.g. `"+FLOAT_CMP +NORMALIZE_WHITESPACE"`.
pub fn check(want: &str, got: &str, directive: &str) -> Result<bool> {
    let checker = NumericOutputChecker::new();
    let flags = checker.options(directive)?;
    Ok(checker.check_output(want, got, flags))
}

/// Convenience: the failure report a default checker would print.
pub fn difference(want: &str, got: &str, directive: &str) -> Result<String> {
    let checker = NumericOutputChecker::new();
    let flags = checker.options(directive)?;
    Ok(checker.output_difference(want, got, flags))
}
