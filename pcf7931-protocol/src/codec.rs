//! Encoder and decoder for peripheral frames.

use crate::error::ProtocolError;
use crate::frame::{Frame, FRAME_SIZE};
use crate::packet::RequestPacket;
use bytes::BytesMut;

/// Encodes requests into wire frames.
pub struct Encoder;

impl Encoder {
    /// Encodes a request into a frame.
    pub fn encode_request(request: &RequestPacket) -> Result<BytesMut, ProtocolError> {
        request.encode()
    }

    /// Renders a request as pretty JSON, for dry runs and debug output.
    pub fn describe(request: &RequestPacket) -> Result<String, ProtocolError> {
        Ok(serde_json::to_string_pretty(request)?)
    }
}

/// Accumulates received bytes and splits them into frames.
pub struct Decoder {
    buffer: BytesMut,
}

impl Decoder {
    pub fn new() -> Self {
        Self {
            buffer: BytesMut::with_capacity(FRAME_SIZE * 4),
        }
    }

    /// Appends data to the internal buffer.
    pub fn extend(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    /// Attempts to decode the next frame from the buffer.
    pub fn decode_frame(&mut self) -> Result<Option<Frame>, ProtocolError> {
        Frame::decode(&mut self.buffer)
    }

    /// Returns the number of bytes currently buffered.
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Clears the internal buffer.
    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}

impl Default for Decoder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{ReplyKind, CMD_ACK, CMD_DEBUG_PRINT_STRING};
    use crate::packet::TimingSlots;

    #[test]
    fn test_encoder_decoder_roundtrip() {
        let request = RequestPacket::write(3, 4, 0x42, [1; 7], TimingSlots::new(17500, 0, 0));
        let encoded = Encoder::encode_request(&request).unwrap();

        let mut decoder = Decoder::new();
        decoder.extend(&encoded);

        let frame = decoder.decode_frame().unwrap().unwrap();
        assert_eq!(RequestPacket::from_frame(&frame).unwrap(), request);
        assert_eq!(decoder.buffered(), 0);
    }

    #[test]
    fn test_partial_frame_decoding() {
        let encoded = Frame::new(CMD_ACK).encode().unwrap();

        let mut decoder = Decoder::new();
        decoder.extend(&encoded[..100]);
        assert!(decoder.decode_frame().unwrap().is_none());

        decoder.extend(&encoded[100..]);
        let frame = decoder.decode_frame().unwrap().unwrap();
        assert_eq!(frame.kind(), ReplyKind::Ack);
    }

    #[test]
    fn test_decoder_buffered() {
        let mut decoder = Decoder::new();
        assert_eq!(decoder.buffered(), 0);

        decoder.extend(b"some data");
        assert_eq!(decoder.buffered(), 9);

        decoder.clear();
        assert_eq!(decoder.buffered(), 0);
    }

    #[test]
    fn test_decoder_debug_frame() {
        let text = b"hello";
        let frame = Frame::new(CMD_DEBUG_PRINT_STRING)
            .with_args([text.len() as u64, 0, 0])
            .with_data(&text[..])
            .unwrap();
        let encoded = frame.encode().unwrap();

        let mut decoder = Decoder::default();
        decoder.extend(&encoded);

        let decoded = decoder.decode_frame().unwrap().unwrap();
        assert_eq!(decoded.debug_string().unwrap().as_deref(), Some("hello"));
    }

    #[test]
    fn test_describe() {
        let description = Encoder::describe(&RequestPacket::read()).unwrap();
        assert!(description.contains("\"READ\""));
        assert!(description.contains("empty"));
    }
}
