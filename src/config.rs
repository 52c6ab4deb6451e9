use serde::Deserialize;

use crate::errors::{CheckError, Result};

/// Relative + absolute tolerance for numeric closeness.
///
/// Two values are close when `|got - want| <= atol + rtol * |want|`.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct Tolerance {
    pub rtol: f64,
    pub atol: f64,
}

impl Default for Tolerance {
    fn default() -> Self {
        Self { rtol: 1e-5, atol: 1e-8 }
    }
}

impl Tolerance {
    pub fn new(rtol: f64, atol: f64) -> Self {
        Self { rtol, atol }
    }

    /// Closeness test; asymmetric in the same way as numpy's `allclose`,
    /// `want` is the reference value. Equal infinities are close, NaN never is.
    pub fn is_close(&self, got: f64, want: f64) -> bool {
        if got == want {
            return true;
        }
        if !got.is_finite() || !want.is_finite() {
            return false;
        }
        (got - want).abs() <= self.atol + self.rtol * want.abs()
    }
}

/// Characters allowed immediately around a numeric token.
///
/// Whitespace and the string boundaries always qualify; these sets add to them.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Boundaries {
    pub front: String,
    pub back: String,
}

impl Default for Boundaries {
    fn default() -> Self {
        Self {
            front: "*+-,<=([".to_string(),
            back: "*+-,<=([>j)]".to_string(),
        }
    }
}

impl Boundaries {
    pub fn new(front: impl Into<String>, back: impl Into<String>) -> Self {
        Self { front: front.into(), back: back.into() }
    }

    pub fn is_front(&self, c: char) -> bool {
        c.is_whitespace() || self.front.contains(c)
    }

    pub fn is_back(&self, c: char) -> bool {
        c.is_whitespace() || self.back.contains(c)
    }
}

/// Checker configuration. Every field has a default, so an empty JSON
/// object is a valid config.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct CheckerConfig {
    pub tolerance: Tolerance,
    pub boundaries: Boundaries,
    pub blankline_marker: String,
    pub ellipsis_marker: String,
}

impl Default for CheckerConfig {
    fn default() -> Self {
        Self {
            tolerance: Tolerance::default(),
            boundaries: Boundaries::default(),
            blankline_marker: "<BLANKLINE>".to_string(),
            ellipsis_marker: "...".to_string(),
        }
    }
}

impl CheckerConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let cfg: CheckerConfig = serde_json::from_str(json)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_path(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn with_tolerance(mut self, tolerance: Tolerance) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn with_boundaries(mut self, boundaries: Boundaries) -> Self {
        self.boundaries = boundaries;
        self
    }

    pub fn validate(&self) -> Result<()> {
        let Tolerance { rtol, atol } = self.tolerance;
        if !(rtol >= 0.0 && atol >= 0.0) {
            return Err(CheckError::Config(format!(
                "tolerances must be non-negative (rtol={rtol}, atol={atol})"
            )));
        }
        // A separator that can also start or continue a token would make the
        // scan ambiguous.
        let clash = |set: &str| set.chars().find(|c| c.is_ascii_digit() || *c == '.' || *c == 'e');
        for (side, set) in [("front", &self.boundaries.front), ("back", &self.boundaries.back)] {
            if let Some(c) = clash(set) {
                return Err(CheckError::Config(format!(
                    "{side} boundary set may not contain {c:?}"
                )));
            }
        }
        if self.blankline_marker.is_empty() || self.ellipsis_marker.is_empty() {
            return Err(CheckError::Config("markers must not be empty".into()));
        }
        Ok(())
    }
}
