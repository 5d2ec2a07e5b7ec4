//! # pcf7931-protocol
//!
//! Wire layout of the commands exchanged with the RF peripheral.
//!
//! This crate provides:
//! - Command codes for PCF7931 requests and the peripheral's replies
//! - Fixed-size little-endian frame encoding and decoding
//! - Structured request packets with named payload slots
//! - A streaming decoder for reply frames

pub mod codec;
pub mod command;
pub mod error;
pub mod frame;
pub mod packet;

pub use codec::{Decoder, Encoder};
pub use command::{Opcode, ReplyKind};
pub use error::ProtocolError;
pub use frame::{Frame, ARG_COUNT, DATA_SIZE, FRAME_SIZE};
pub use packet::{Payload, RequestPacket, TimingSlots, PASSWORD_LEN};

/// Number of 32-bit payload slots carried by PCF7931 requests.
pub const PAYLOAD_SLOTS: usize = 10;

/// Constant added to signed timing offsets before transmission.
pub const OFFSET_BIAS: i32 = 128;
