//! Structured PCF7931 request packets.
//!
//! A [`RequestPacket`] is built per operation and converted to a [`Frame`]
//! only when it is sent. The payload has named slots instead of a raw
//! overlay of the frame's data area:
//!
//! | data bytes | slot | WRITE                 | BRUTEFORCE            |
//! |------------|------|-----------------------|-----------------------|
//! | 0..7       | 0..7 | password bytes        | unused (zero)         |
//! | 28..32     | 7    | offset width + 128    | offset width + 128    |
//! | 32..36     | 8    | offset position + 128 | offset position + 128 |
//! | 36..40     | 9    | init delay            | init delay            |
//!
//! The firmware reads the password as the first seven bytes of the data
//! area, so the password slots are byte-wide on the wire.

use crate::command::Opcode;
use crate::error::ProtocolError;
use crate::frame::{Frame, ARG_COUNT, SLOT_WIDTH};
use crate::{OFFSET_BIAS, PAYLOAD_SLOTS};
use bytes::{BufMut, BytesMut};
use serde::{Deserialize, Serialize};

/// Length of a PCF7931 password in bytes.
pub const PASSWORD_LEN: usize = 7;

/// Applies the transport bias to a signed timing offset.
///
/// Computed in 32-bit two's complement, so offsets below -128 wrap.
pub fn bias_offset(offset: i32) -> u32 {
    offset.wrapping_add(OFFSET_BIAS) as u32
}

/// Inverse of [`bias_offset`].
pub fn unbias_offset(biased: u32) -> i32 {
    (biased as i32).wrapping_sub(OFFSET_BIAS)
}

/// Packs a password into a 56-bit integer, most significant byte first.
pub fn pack_password(password: &[u8; PASSWORD_LEN]) -> u64 {
    password
        .iter()
        .fold(0u64, |acc, &b| (acc << 8) | u64::from(b))
}

/// Inverse of [`pack_password`]. Bits above 56 are ignored.
pub fn unpack_password(packed: u64) -> [u8; PASSWORD_LEN] {
    let be = packed.to_be_bytes();
    let mut out = [0u8; PASSWORD_LEN];
    out.copy_from_slice(&be[8 - PASSWORD_LEN..]);
    out
}

/// Timing slots 7, 8 and 9, already biased for the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimingSlots {
    /// Slot 7.
    pub offset_width: u32,
    /// Slot 8.
    pub offset_position: u32,
    /// Slot 9.
    pub init_delay: u32,
}

impl TimingSlots {
    pub const OFFSET_WIDTH_SLOT: usize = 7;
    pub const OFFSET_POSITION_SLOT: usize = 8;
    pub const INIT_DELAY_SLOT: usize = 9;

    /// Builds the slots from host-side values, applying the bias.
    pub fn new(init_delay: u16, offset_width: i32, offset_position: i32) -> Self {
        Self {
            offset_width: bias_offset(offset_width),
            offset_position: bias_offset(offset_position),
            init_delay: u32::from(init_delay),
        }
    }

    fn read(frame: &Frame) -> Result<Self, ProtocolError> {
        Ok(Self {
            offset_width: frame.slot(Self::OFFSET_WIDTH_SLOT)?,
            offset_position: frame.slot(Self::OFFSET_POSITION_SLOT)?,
            init_delay: frame.slot(Self::INIT_DELAY_SLOT)?,
        })
    }
}

/// Operation-specific payload of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Payload {
    Empty,
    Write {
        password: [u8; PASSWORD_LEN],
        timing: TimingSlots,
    },
    Bruteforce {
        timing: TimingSlots,
    },
}

impl Payload {
    /// Password bytes 0 to 6, present for WRITE only.
    pub fn password(&self) -> Option<&[u8; PASSWORD_LEN]> {
        match self {
            Payload::Write { password, .. } => Some(password),
            _ => None,
        }
    }

    /// Timing slots 7, 8 and 9, present for WRITE and BRUTEFORCE.
    pub fn timing(&self) -> Option<&TimingSlots> {
        match self {
            Payload::Write { timing, .. } | Payload::Bruteforce { timing } => Some(timing),
            Payload::Empty => None,
        }
    }

    /// Serializes the payload into the leading bytes of a frame data area.
    fn to_data(self) -> BytesMut {
        let Some(timing) = self.timing().copied() else {
            return BytesMut::new();
        };

        let mut buf = BytesMut::with_capacity(PAYLOAD_SLOTS * SLOT_WIDTH);
        let password = self.password().copied().unwrap_or([0; PASSWORD_LEN]);
        buf.put_slice(&password);
        buf.put_bytes(0, TimingSlots::OFFSET_WIDTH_SLOT * SLOT_WIDTH - PASSWORD_LEN);
        buf.put_u32_le(timing.offset_width);
        buf.put_u32_le(timing.offset_position);
        buf.put_u32_le(timing.init_delay);
        buf
    }
}

/// A request ready to be handed to the transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestPacket {
    opcode: Opcode,
    args: [u64; ARG_COUNT],
    payload: Payload,
}

impl RequestPacket {
    /// READ: no operands, no payload.
    pub fn read() -> Self {
        Self {
            opcode: Opcode::Read,
            args: [0; ARG_COUNT],
            payload: Payload::Empty,
        }
    }

    /// WRITE one byte of a block, authenticated with `password`.
    pub fn write(
        block: u8,
        byte_index: u8,
        data: u8,
        password: [u8; PASSWORD_LEN],
        timing: TimingSlots,
    ) -> Self {
        Self {
            opcode: Opcode::Write,
            args: [u64::from(block), u64::from(byte_index), u64::from(data)],
            payload: Payload::Write { password, timing },
        }
    }

    /// BRUTEFORCE starting from `start_password`, sending each candidate `tries` times.
    pub fn bruteforce(
        start_password: &[u8; PASSWORD_LEN],
        tries: u8,
        timing: TimingSlots,
    ) -> Self {
        Self {
            opcode: Opcode::Bruteforce,
            args: [pack_password(start_password), u64::from(tries), 0],
            payload: Payload::Bruteforce { timing },
        }
    }

    pub fn opcode(&self) -> Opcode {
        self.opcode
    }

    pub fn args(&self) -> &[u64; ARG_COUNT] {
        &self.args
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    /// Converts the packet into its wire frame.
    pub fn to_frame(&self) -> Frame {
        Frame {
            command: self.opcode.code(),
            args: self.args,
            data: self.payload.to_data().freeze(),
        }
    }

    /// Encodes the packet into wire bytes.
    pub fn encode(&self) -> Result<BytesMut, ProtocolError> {
        self.to_frame().encode()
    }

    /// Recovers a request from a frame (used by simulators and tests).
    pub fn from_frame(frame: &Frame) -> Result<Self, ProtocolError> {
        let opcode =
            Opcode::from_code(frame.command).ok_or(ProtocolError::UnknownCommand(frame.command))?;

        let payload = match opcode {
            Opcode::Read => Payload::Empty,
            Opcode::Write => {
                let mut password = [0u8; PASSWORD_LEN];
                for (i, b) in password.iter_mut().enumerate() {
                    *b = frame.data.get(i).copied().unwrap_or(0);
                }
                Payload::Write {
                    password,
                    timing: TimingSlots::read(frame)?,
                }
            }
            Opcode::Bruteforce => Payload::Bruteforce {
                timing: TimingSlots::read(frame)?,
            },
        };

        Ok(Self {
            opcode,
            args: frame.args,
            payload,
        })
    }
}
