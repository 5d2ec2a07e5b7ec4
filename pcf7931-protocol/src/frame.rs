//! Fixed-size command frame exchanged with the peripheral.
//!
//! Frame layout (544 bytes, all fields little-endian):
//!
//! ```text
//! +---------+---------+---------+---------+------------------------+
//! |   cmd   | arg[0]  | arg[1]  | arg[2]  |          data          |
//! | 8 bytes | 8 bytes | 8 bytes | 8 bytes |       512 bytes        |
//! +---------+---------+---------+---------+------------------------+
//! ```
//!
//! The data area is also addressed as 128 32-bit slots.

use crate::command::{ReplyKind, CMD_DEBUG_PRINT_STRING};
use crate::error::ProtocolError;
use bytes::{Buf, BufMut, Bytes, BytesMut};

/// Number of scalar arguments in every frame.
pub const ARG_COUNT: usize = 3;

/// Size of the data area in bytes.
pub const DATA_SIZE: usize = 512;

/// Size of the header (command + arguments).
pub const HEADER_SIZE: usize = 8 + 8 * ARG_COUNT;

/// Total size of an encoded frame (8 + 24 + 512 = 544).
pub const FRAME_SIZE: usize = HEADER_SIZE + DATA_SIZE;

/// Width of one data slot in bytes.
pub const SLOT_WIDTH: usize = 4;

/// A raw frame, as sent to or received from the peripheral.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Command code.
    pub command: u64,
    /// Scalar arguments.
    pub args: [u64; ARG_COUNT],
    /// Data area. Shorter data is zero-padded on encode.
    pub data: Bytes,
}

impl Frame {
    /// Creates a frame with zero arguments and an empty data area.
    pub fn new(command: u64) -> Self {
        Self {
            command,
            args: [0; ARG_COUNT],
            data: Bytes::new(),
        }
    }

    pub fn with_args(mut self, args: [u64; ARG_COUNT]) -> Self {
        self.args = args;
        self
    }

    pub fn with_data(mut self, data: impl Into<Bytes>) -> Result<Self, ProtocolError> {
        let data = data.into();
        if data.len() > DATA_SIZE {
            return Err(ProtocolError::DataTooLarge {
                size: data.len(),
                max: DATA_SIZE,
            });
        }
        self.data = data;
        Ok(self)
    }

    /// Classifies this frame by its command code.
    pub fn kind(&self) -> ReplyKind {
        ReplyKind::from(self.command)
    }

    /// Reads a 32-bit data slot. Bytes beyond the stored data read as zero.
    pub fn slot(&self, index: usize) -> Result<u32, ProtocolError> {
        if index >= DATA_SIZE / SLOT_WIDTH {
            return Err(ProtocolError::SlotOutOfRange(index));
        }
        let start = index * SLOT_WIDTH;
        let mut word = [0u8; SLOT_WIDTH];
        for (i, b) in word.iter_mut().enumerate() {
            *b = self.data.get(start + i).copied().unwrap_or(0);
        }
        Ok(u32::from_le_bytes(word))
    }

    /// Returns the text of a debug-print frame, or `None` for other frames.
    pub fn debug_string(&self) -> Result<Option<String>, ProtocolError> {
        if self.command != CMD_DEBUG_PRINT_STRING {
            return Ok(None);
        }
        let len = self.args[0];
        if len > DATA_SIZE as u64 {
            return Err(ProtocolError::InvalidStringLength(len));
        }
        let len = (len as usize).min(self.data.len());
        let text =
            std::str::from_utf8(&self.data[..len]).map_err(|_| ProtocolError::InvalidUtf8)?;
        Ok(Some(text.trim_end_matches('\0').to_string()))
    }

    /// Encodes the frame into exactly [`FRAME_SIZE`] bytes.
    pub fn encode(&self) -> Result<BytesMut, ProtocolError> {
        if self.data.len() > DATA_SIZE {
            return Err(ProtocolError::DataTooLarge {
                size: self.data.len(),
                max: DATA_SIZE,
            });
        }

        let mut buf = BytesMut::with_capacity(FRAME_SIZE);
        buf.put_u64_le(self.command);
        for arg in self.args {
            buf.put_u64_le(arg);
        }
        buf.put_slice(&self.data);
        buf.put_bytes(0, DATA_SIZE - self.data.len());

        Ok(buf)
    }

    /// Decodes a frame from the front of `buf`.
    ///
    /// Returns `Ok(None)` if fewer than [`FRAME_SIZE`] bytes are buffered.
    pub fn decode(buf: &mut BytesMut) -> Result<Option<Self>, ProtocolError> {
        if buf.len() < FRAME_SIZE {
            return Ok(None);
        }

        let mut frame = buf.split_to(FRAME_SIZE);
        let command = frame.get_u64_le();
        let mut args = [0u64; ARG_COUNT];
        for arg in args.iter_mut() {
            *arg = frame.get_u64_le();
        }
        let data = frame.freeze();

        Ok(Some(Self {
            command,
            args,
            data,
        }))
    }

    /// Parses exactly one frame from a byte slice.
    pub fn parse(bytes: &[u8]) -> Result<Self, ProtocolError> {
        if bytes.len() != FRAME_SIZE {
            return Err(ProtocolError::ShortFrame {
                expected: FRAME_SIZE,
                actual: bytes.len(),
            });
        }
        let mut buf = BytesMut::from(bytes);
        Self::decode(&mut buf)?.ok_or(ProtocolError::ShortFrame {
            expected: FRAME_SIZE,
            actual: bytes.len(),
        })
    }

    /// Hex rendering of the encoded frame, 32 bytes per line.
    pub fn hex_dump(&self) -> Result<String, ProtocolError> {
        let encoded = self.encode()?;
        let lines: Vec<String> = encoded
            .chunks(32)
            .enumerate()
            .map(|(i, chunk)| format!("{:04x}: {}", i * 32, hex::encode(chunk)))
            .collect();
        Ok(lines.join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::CMD_ACK;

    #[test]
    fn test_frame_roundtrip() {
        let frame = Frame::new(0x0222)
            .with_args([2, 1, 0xFF])
            .with_data(Bytes::from_static(&[1, 2, 3, 4, 5]))
            .unwrap();

        let mut buf = frame.encode().unwrap();
        assert_eq!(buf.len(), FRAME_SIZE);

        let decoded = Frame::decode(&mut buf).unwrap().unwrap();
        assert_eq!(decoded.command, 0x0222);
        assert_eq!(decoded.args, [2, 1, 0xFF]);
        assert_eq!(decoded.data.len(), DATA_SIZE);
        assert_eq!(&decoded.data[..5], &[1, 2, 3, 4, 5]);
        assert!(buf.is_empty());
    }

    #[test]
    fn test_field_offsets() {
        let frame = Frame::new(0x0217).with_args([0x11, 0x22, 0x33]);
        let encoded = frame.encode().unwrap();

        assert_eq!(&encoded[0..8], &0x0217u64.to_le_bytes());
        assert_eq!(&encoded[8..16], &0x11u64.to_le_bytes());
        assert_eq!(&encoded[16..24], &0x22u64.to_le_bytes());
        assert_eq!(&encoded[24..32], &0x33u64.to_le_bytes());
        assert!(encoded[32..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_incomplete_frame() {
        let mut buf = BytesMut::from(&[0u8; 100][..]);
        assert!(Frame::decode(&mut buf).unwrap().is_none());
        assert_eq!(buf.len(), 100);
    }

    #[test]
    fn test_data_too_large() {
        let result = Frame::new(CMD_ACK).with_data(vec![0u8; DATA_SIZE + 1]);
        assert!(matches!(result, Err(ProtocolError::DataTooLarge { .. })));
    }

    #[test]
    fn test_slot_reads() {
        let mut data = vec![0u8; 40];
        data[28..32].copy_from_slice(&118u32.to_le_bytes());
        data[36..40].copy_from_slice(&20000u32.to_le_bytes());
        let frame = Frame::new(0x0222).with_data(data).unwrap();

        assert_eq!(frame.slot(7).unwrap(), 118);
        assert_eq!(frame.slot(9).unwrap(), 20000);
        // Beyond stored data but inside the data area
        assert_eq!(frame.slot(50).unwrap(), 0);
        assert!(matches!(
            frame.slot(128),
            Err(ProtocolError::SlotOutOfRange(128))
        ));
        assert!(matches!(
            frame.slot(usize::MAX),
            Err(ProtocolError::SlotOutOfRange(usize::MAX))
        ));
    }

    #[test]
    fn test_debug_string() {
        let text = b"Block 0 : 00 11 22 33\0\0";
        let frame = Frame::new(CMD_DEBUG_PRINT_STRING)
            .with_args([text.len() as u64, 0, 0])
            .with_data(&text[..])
            .unwrap();
        assert_eq!(
            frame.debug_string().unwrap().as_deref(),
            Some("Block 0 : 00 11 22 33")
        );

        let ack = Frame::new(CMD_ACK);
        assert!(ack.debug_string().unwrap().is_none());
    }

    #[test]
    fn test_debug_string_invalid_length() {
        let frame = Frame::new(CMD_DEBUG_PRINT_STRING).with_args([4096, 0, 0]);
        assert!(matches!(
            frame.debug_string(),
            Err(ProtocolError::InvalidStringLength(4096))
        ));
    }

    #[test]
    fn test_parse_requires_exact_size() {
        let result = Frame::parse(&[0u8; 32]);
        assert!(matches!(
            result,
            Err(ProtocolError::ShortFrame {
                expected: FRAME_SIZE,
                actual: 32
            })
        ));

        let encoded = Frame::new(CMD_ACK).encode().unwrap();
        let parsed = Frame::parse(&encoded).unwrap();
        assert_eq!(parsed.kind(), ReplyKind::Ack);
    }

    #[test]
    fn test_multiple_frames_in_buffer() {
        let mut buf = BytesMut::new();
        buf.extend_from_slice(&Frame::new(CMD_DEBUG_PRINT_STRING).encode().unwrap());
        buf.extend_from_slice(&Frame::new(CMD_ACK).encode().unwrap());

        let first = Frame::decode(&mut buf).unwrap().unwrap();
        assert_eq!(first.kind(), ReplyKind::DebugString);
        let second = Frame::decode(&mut buf).unwrap().unwrap();
        assert_eq!(second.kind(), ReplyKind::Ack);
        assert!(Frame::decode(&mut buf).unwrap().is_none());
    }

    #[test]
    fn test_hex_dump() {
        let dump = Frame::new(0x0217).hex_dump().unwrap();
        let lines: Vec<&str> = dump.lines().collect();
        assert_eq!(lines.len(), FRAME_SIZE / 32);
        assert!(lines[0].starts_with("0000: 1702000000000000"));
    }
}
