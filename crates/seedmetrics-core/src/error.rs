//! Error taxonomy for report construction.
//!
//! Only configuration-time problems are fatal. Everything that can go wrong
//! while rendering (overflowing lines, empty data, divide-by-zero candidates)
//! degrades to a truncated line or an empty section and is logged instead of
//! returned.

use thiserror::Error;

/// Errors surfaced to callers of the library.
#[derive(Debug, Error)]
pub enum ReportError {
    /// Invalid threshold ordering, non-positive width, unknown rating/severity/section key.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Failure reading a config file or appending to the run log.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed JSON in a config or job-result document.
    #[error("parse error: {0}")]
    Parse(String),
}

impl ReportError {
    /// Shorthand for building a [`ReportError::Configuration`].
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }
}

impl From<serde_json::Error> for ReportError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse(err.to_string())
    }
}

/// Library result alias.
pub type Result<T> = std::result::Result<T, ReportError>;
