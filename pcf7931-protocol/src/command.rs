//! Command codes understood by the peripheral firmware.
//!
//! These values are part of the firmware contract and must not change.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Generic acknowledgment sent by the firmware.
pub const CMD_ACK: u64 = 0x00FF;
/// Firmware debug text; `arg[0]` holds the length, the text is in the data area.
pub const CMD_DEBUG_PRINT_STRING: u64 = 0x0100;
/// Firmware debug integers, carried in `arg[0..3]`.
pub const CMD_DEBUG_PRINT_INTEGERS: u64 = 0x0101;

pub const CMD_PCF7931_READ: u64 = 0x0217;
pub const CMD_PCF7931_WRITE: u64 = 0x0222;
pub const CMD_PCF7931_BRUTEFORCE: u64 = 0x0226;

/// PCF7931 request operations that have a wire form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Opcode {
    Read,
    Write,
    Bruteforce,
}

impl Opcode {
    /// Returns the firmware command code.
    pub fn code(&self) -> u64 {
        match self {
            Opcode::Read => CMD_PCF7931_READ,
            Opcode::Write => CMD_PCF7931_WRITE,
            Opcode::Bruteforce => CMD_PCF7931_BRUTEFORCE,
        }
    }

    pub fn from_code(code: u64) -> Option<Self> {
        match code {
            CMD_PCF7931_READ => Some(Opcode::Read),
            CMD_PCF7931_WRITE => Some(Opcode::Write),
            CMD_PCF7931_BRUTEFORCE => Some(Opcode::Bruteforce),
            _ => None,
        }
    }

    /// Returns whether the firmware answers this request with an ACK.
    ///
    /// WRITE and BRUTEFORCE are fire-and-forget: the firmware never reports
    /// back, so their outcome cannot be observed from the host.
    pub fn expects_ack(&self) -> bool {
        matches!(self, Opcode::Read)
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Opcode::Read => write!(f, "READ"),
            Opcode::Write => write!(f, "WRITE"),
            Opcode::Bruteforce => write!(f, "BRUTEFORCE"),
        }
    }
}

/// Classification of a frame received from the peripheral.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyKind {
    Ack,
    DebugString,
    DebugIntegers,
    Other(u64),
}

impl From<u64> for ReplyKind {
    fn from(code: u64) -> Self {
        match code {
            CMD_ACK => ReplyKind::Ack,
            CMD_DEBUG_PRINT_STRING => ReplyKind::DebugString,
            CMD_DEBUG_PRINT_INTEGERS => ReplyKind::DebugIntegers,
            other => ReplyKind::Other(other),
        }
    }
}
