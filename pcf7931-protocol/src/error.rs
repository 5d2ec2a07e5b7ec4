//! Protocol error types.

use thiserror::Error;

/// Errors that can occur while building or parsing frames.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("frame data too large: {size} bytes (max {max})")]
    DataTooLarge { size: usize, max: usize },

    #[error("short frame: got {actual} bytes, need {expected}")]
    ShortFrame { expected: usize, actual: usize },

    #[error("unknown request command: {0:#06x}")]
    UnknownCommand(u64),

    #[error("payload slot {0} out of range")]
    SlotOutOfRange(usize),

    #[error("invalid debug string length: {0}")]
    InvalidStringLength(u64),

    #[error("invalid UTF-8 in debug string")]
    InvalidUtf8,

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
