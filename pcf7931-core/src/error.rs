//! Core error types.

use thiserror::Error;

/// Caller-input errors. Raised before any packet is built or any
/// configuration is changed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    #[error("invalid password '{input}': expected {expected} hex digits")]
    InvalidPassword { input: String, expected: usize },

    #[error("invalid hex byte: '{input}'")]
    InvalidHexByte { input: String },

    #[error("invalid decimal value for {field}: '{input}'")]
    InvalidDecimal { field: &'static str, input: String },

    #[error("block address {block} out of range (0-7)")]
    BlockOutOfRange { block: u64 },

    #[error("byte address {byte_index} out of range (0-15)")]
    ByteIndexOutOfRange { byte_index: u64 },

    #[error("tries {tries} out of range (0-255)")]
    TriesOutOfRange { tries: u64 },

    #[error("missing argument: {0}")]
    MissingArgument(&'static str),

    #[error("unexpected argument: '{0}'")]
    UnexpectedArgument(String),

    #[error("unknown command: '{0}'")]
    UnknownCommand(String),
}

impl CoreError {
    /// Returns whether showing the command's usage text helps the operator.
    pub fn wants_usage(&self) -> bool {
        !matches!(self, CoreError::UnknownCommand(_))
    }
}
