//! Errors in the library.
use thiserror::Error;

/// Errors in the library.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum DeepqError {
    /// Record key error.
    #[error("Record key error: {0}")]
    RecordKeyError(String),

    /// Record value type error.
    #[error("Record value type error: {0}")]
    RecordValueTypeError(String),

    /// A configuration value is out of its valid range or inconsistent with another one.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}
