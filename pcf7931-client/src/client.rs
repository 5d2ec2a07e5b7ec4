//! High-level client API.

use crate::connection::{Ack, Connection, ConnectionConfig};
use crate::error::ClientError;
use crate::stream::DeviceStream;
use pcf7931_protocol::RequestPacket;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};

/// What happened to a request after it was handed to the peripheral.
#[derive(Debug, Clone)]
pub enum Outcome {
    /// The peripheral acknowledged the request.
    Acknowledged(Ack),
    /// The request was written; the firmware sends no acknowledgment for it.
    Dispatched,
}

impl Outcome {
    pub fn is_acknowledged(&self) -> bool {
        matches!(self, Outcome::Acknowledged(_))
    }

    /// Debug output printed by the firmware before the ACK.
    pub fn device_output(&self) -> &[String] {
        match self {
            Outcome::Acknowledged(ack) => &ack.device_output,
            Outcome::Dispatched => &[],
        }
    }
}

/// High-level client for the PCF7931 peripheral.
pub struct Client<S = DeviceStream> {
    conn: Connection<S>,
    ack_timeout: Duration,
}

impl Client<DeviceStream> {
    /// Opens the device named in `config`.
    pub async fn open(config: &ConnectionConfig) -> Result<Self, ClientError> {
        let conn = Connection::open(config).await?;
        Ok(Self::new(conn, config.ack_timeout))
    }
}

impl<S> Client<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    pub fn new(conn: Connection<S>, ack_timeout: Duration) -> Self {
        Self { conn, ack_timeout }
    }

    /// Sends one request.
    ///
    /// READ waits for an ACK and fails with [`ClientError::Timeout`] when none
    /// arrives. WRITE and BRUTEFORCE return as soon as the frame is written.
    pub async fn execute(&mut self, packet: &RequestPacket) -> Result<Outcome, ClientError> {
        self.conn.send(packet).await?;

        if !packet.opcode().expects_ack() {
            tracing::debug!(op = %packet.opcode(), "Request dispatched without acknowledgment");
            return Ok(Outcome::Dispatched);
        }

        let ack = self.conn.await_ack(self.ack_timeout).await?;
        Ok(Outcome::Acknowledged(ack))
    }

    /// Returns whether the client is connected.
    pub fn is_connected(&self) -> bool {
        self.conn.is_connected()
    }

    /// Closes the connection.
    pub async fn close(&mut self) -> Result<(), ClientError> {
        self.conn.close().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pcf7931_protocol::command::{CMD_ACK, CMD_DEBUG_PRINT_STRING};
    use pcf7931_protocol::{Frame, TimingSlots, FRAME_SIZE};
    use tokio::io::{duplex, AsyncReadExt, AsyncWriteExt};

    fn timing() -> TimingSlots {
        TimingSlots::new(20000, -10, 30)
    }

    #[tokio::test]
    async fn test_write_is_fire_and_forget() {
        let packet = RequestPacket::write(2, 1, 0xFF, [0; 7], timing());
        let expected = packet.encode().unwrap();
        assert_eq!(expected.len(), FRAME_SIZE);

        // The mock holds nothing to read, only the expected write.
        let mock = tokio_test::io::Builder::new().write(&expected).build();
        let mut client = Client::new(
            Connection::from_stream(mock, "mock"),
            Duration::from_secs(1),
        );

        let outcome = client.execute(&packet).await.unwrap();
        assert!(!outcome.is_acknowledged());
        assert!(outcome.device_output().is_empty());
    }

    #[tokio::test]
    async fn test_bruteforce_is_fire_and_forget() {
        let packet = RequestPacket::bruteforce(&[0, 0, 0, 0, 0x12, 0x34, 0x56], 3, timing());
        let expected = packet.encode().unwrap();

        let mock = tokio_test::io::Builder::new().write(&expected).build();
        let mut client = Client::new(
            Connection::from_stream(mock, "mock"),
            Duration::from_secs(1),
        );

        assert!(matches!(
            client.execute(&packet).await.unwrap(),
            Outcome::Dispatched
        ));
    }

    #[tokio::test]
    async fn test_read_waits_for_ack() {
        let (stream, mut device) = duplex(4096);
        let mut client = Client::new(
            Connection::from_stream(stream, "duplex"),
            Duration::from_secs(1),
        );

        let responder = tokio::spawn(async move {
            let mut request = vec![0u8; FRAME_SIZE];
            device.read_exact(&mut request).await.unwrap();
            let frame = Frame::parse(&request).unwrap();
            assert_eq!(frame.command, 0x0217);

            let text = "#db# tag found";
            let debug = Frame::new(CMD_DEBUG_PRINT_STRING)
                .with_args([text.len() as u64, 0, 0])
                .with_data(text.as_bytes().to_vec())
                .unwrap();
            device.write_all(&debug.encode().unwrap()).await.unwrap();
            device
                .write_all(&Frame::new(CMD_ACK).encode().unwrap())
                .await
                .unwrap();
            device
        });

        let outcome = client.execute(&RequestPacket::read()).await.unwrap();
        assert!(outcome.is_acknowledged());
        assert_eq!(outcome.device_output(), ["#db# tag found".to_string()]);
        let _device = responder.await.unwrap();
    }

    #[tokio::test]
    async fn test_read_timeout() {
        let (stream, mut device) = duplex(4096);
        let mut client = Client::new(
            Connection::from_stream(stream, "duplex"),
            Duration::from_millis(30),
        );

        let result = client.execute(&RequestPacket::read()).await;
        assert!(matches!(result, Err(ClientError::Timeout)));

        // The request still went out.
        let mut request = vec![0u8; FRAME_SIZE];
        device.read_exact(&mut request).await.unwrap();
        assert_eq!(Frame::parse(&request).unwrap().command, 0x0217);
    }

    #[tokio::test]
    async fn test_close() {
        let (stream, _device) = duplex(64);
        let mut client = Client::new(
            Connection::from_stream(stream, "duplex"),
            Duration::from_millis(30),
        );
        assert!(client.is_connected());
        client.close().await.unwrap();
        assert!(!client.is_connected());
        assert!(matches!(
            client.execute(&RequestPacket::read()).await,
            Err(ClientError::NotConnected)
        ));
    }
}
