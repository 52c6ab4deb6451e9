//! Option flags and the name registry that hands out their bits.

use std::sync::Arc;

use crate::errors::{CheckError, Result};

bitflags::bitflags! {
    /// Comparison option bitmask.
    ///
    /// The named constants are the host's built-in options. Options registered
    /// later (such as `FLOAT_CMP`) take the next free bit and are only known
    /// through a [`FlagRegistry`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct OptionFlags: u64 {
        /// `1` and `True` (`0` and `False`) are not interchangeable
        const DONT_ACCEPT_TRUE_FOR_1 = 1 << 0;
        /// `<BLANKLINE>` is literal text
        const DONT_ACCEPT_BLANKLINE = 1 << 1;
        /// Runs of whitespace compare equal
        const NORMALIZE_WHITESPACE = 1 << 2;
        /// `...` in the expected output matches any substring
        const ELLIPSIS = 1 << 3;
        const SKIP = 1 << 4;
        const IGNORE_EXCEPTION_DETAIL = 1 << 5;
        /// Report failures as a unified diff
        const REPORT_UDIFF = 1 << 6;
        /// Report failures as a context diff
        const REPORT_CDIFF = 1 << 7;
        /// Report failures as an ndiff
        const REPORT_NDIFF = 1 << 8;
        const REPORT_ONLY_FIRST_FAILURE = 1 << 9;
        const FAIL_FAST = 1 << 10;

        // registered bits are still real bits
        const _ = !0;
    }
}

impl OptionFlags {
    /// Any of these asks for a line diff in failure reports.
    pub const REPORT_DIFFS: OptionFlags = OptionFlags::REPORT_UDIFF
        .union(OptionFlags::REPORT_CDIFF)
        .union(OptionFlags::REPORT_NDIFF);
}

const BUILTIN_NAMES: [&str; 11] = [
    "DONT_ACCEPT_TRUE_FOR_1",
    "DONT_ACCEPT_BLANKLINE",
    "NORMALIZE_WHITESPACE",
    "ELLIPSIS",
    "SKIP",
    "IGNORE_EXCEPTION_DETAIL",
    "REPORT_UDIFF",
    "REPORT_CDIFF",
    "REPORT_NDIFF",
    "REPORT_ONLY_FIRST_FAILURE",
    "FAIL_FAST",
];

/// Name -> bit table. Bit `n` belongs to `names[n]`.
///
/// Clones share storage until one side registers a new name.
#[derive(Debug, Clone, Default)]
pub struct FlagRegistry {
    names: Arc<Vec<String>>,
}

impl FlagRegistry {
    /// An empty registry with no bits assigned.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry pre-populated with the built-in options, in bit order.
    pub fn with_builtins() -> Self {
        Self {
            names: Arc::new(BUILTIN_NAMES.iter().map(|s| s.to_string()).collect()),
        }
    }

    /// Returns the bit for `name`, assigning the next free one on first use.
    pub fn register(&mut self, name: &str) -> Result<OptionFlags> {
        if let Some(bit) = self.get(name) {
            return Ok(bit);
        }
        if name.is_empty() || !name.chars().all(|c| c == '_' || c.is_ascii_alphanumeric()) {
            return Err(CheckError::Parse(format!("invalid flag name {name:?}")));
        }
        let index = self.names.len();
        if index >= u64::BITS as usize {
            return Err(CheckError::Config(format!(
                "cannot register {name}: all {} option bits are taken",
                u64::BITS
            )));
        }
        Arc::make_mut(&mut self.names).push(name.to_string());
        tracing::trace!(flag = name, bit = index, "registered option flag");
        Ok(OptionFlags::from_bits_retain(1 << index))
    }

    pub fn get(&self, name: &str) -> Option<OptionFlags> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|i| OptionFlags::from_bits_retain(1 << i))
    }

    /// Names of every registered bit set in `flags`, in bit order.
    pub fn names_of(&self, flags: OptionFlags) -> Vec<&str> {
        self.names
            .iter()
            .enumerate()
            .filter(|(i, _)| flags.bits() & (1 << i) != 0)
            .map(|(_, n)| n.as_str())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
