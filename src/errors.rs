use thiserror::Error; // Import the `Error` derive macro from the `thiserror` crate

// Errors raised while configuring a checker or parsing its inputs.
// A failed comparison is never an error: it is reported as `false`.
#[derive(Debug, Error)]
pub enum CheckError {
    // Malformed option directive, e.g. a dangling `+`
    #[error("parse error: {0}")]
    Parse(String),

    // Directive names a flag the registry has never seen
    #[error("unknown option flag: {0}")]
    UnknownFlag(String),

    // Text matched the numeric token grammar but is not a valid f64
    #[error("invalid numeric token: {token:?}")]
    InvalidNumber { token: String },

    // Bad configuration document or out-of-range settings
    #[error("config error: {0}")]
    Config(String),

    // Reading a config or an output file failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for CheckError {
    fn from(err: serde_json::Error) -> Self {
        CheckError::Config(err.to_string())
    }
}

// Type alias for results that use `CheckError` as the error type
pub type Result<T> = std::result::Result<T, CheckError>;
