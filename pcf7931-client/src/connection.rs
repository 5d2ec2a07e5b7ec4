//! Connection management.

use crate::error::ClientError;
use crate::serial::{SerialConfig, DEFAULT_BAUD_RATE};
use crate::stream::DeviceStream;
use pcf7931_protocol::{Decoder, Encoder, Frame, ReplyKind, RequestPacket, FRAME_SIZE};
use std::fmt;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::Instant;

/// Default time to wait for an ACK (2.5 s).
pub const DEFAULT_ACK_TIMEOUT: Duration = Duration::from_millis(2500);

/// Size of one stream read.
const READ_BUFFER_SIZE: usize = FRAME_SIZE;

/// Where the peripheral is reached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceAddr {
    Serial(SerialConfig),
    Tcp(SocketAddr),
}

impl fmt::Display for DeviceAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceAddr::Serial(serial) => write!(f, "{}", serial.path),
            DeviceAddr::Tcp(addr) => write!(f, "tcp://{}", addr),
        }
    }
}

/// Connection configuration.
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Peripheral address.
    pub device: DeviceAddr,
    /// TCP connect timeout.
    pub connect_timeout: Duration,
    /// Time to wait for an ACK after READ.
    pub ack_timeout: Duration,
}

impl ConnectionConfig {
    pub fn new(device: DeviceAddr) -> Self {
        Self {
            device,
            connect_timeout: Duration::from_secs(5),
            ack_timeout: DEFAULT_ACK_TIMEOUT,
        }
    }

    pub fn serial(path: impl Into<String>) -> Self {
        Self::new(DeviceAddr::Serial(
            SerialConfig::new(path).with_baud_rate(DEFAULT_BAUD_RATE),
        ))
    }

    pub fn tcp(addr: SocketAddr) -> Self {
        Self::new(DeviceAddr::Tcp(addr))
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_ack_timeout(mut self, timeout: Duration) -> Self {
        self.ack_timeout = timeout;
        self
    }
}

/// An acknowledgment, plus whatever the firmware printed before sending it.
#[derive(Debug, Clone)]
pub struct Ack {
    /// The ACK frame itself.
    pub frame: Frame,
    /// Debug output received while waiting, in arrival order.
    pub device_output: Vec<String>,
}

/// A frame-level connection to the peripheral.
pub struct Connection<S = DeviceStream> {
    stream: Option<S>,
    decoder: Decoder,
    /// Frames still arriving that answer an earlier request.
    stale_frames: usize,
    label: String,
}

impl Connection<DeviceStream> {
    /// Opens the device named in `config`.
    pub async fn open(config: &ConnectionConfig) -> Result<Self, ClientError> {
        let label = config.device.to_string();
        tracing::debug!("Connecting to {}...", label);

        let stream = match &config.device {
            DeviceAddr::Serial(serial) => DeviceStream::Serial {
                stream: serial.open()?,
            },
            DeviceAddr::Tcp(addr) => {
                let tcp = tokio::time::timeout(config.connect_timeout, TcpStream::connect(addr))
                    .await
                    .map_err(|_| {
                        tracing::debug!("Connection timeout");
                        ClientError::Timeout
                    })?
                    .map_err(|e| {
                        tracing::debug!("Connection failed: {}", e);
                        ClientError::Io(e)
                    })?;
                tcp.set_nodelay(true).ok();
                DeviceStream::Tcp { stream: tcp }
            }
        };

        tracing::debug!("Connected to {}", label);
        Ok(Self::from_stream(stream, label))
    }
}

impl<S> Connection<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    /// Wraps an already-open stream.
    pub fn from_stream(stream: S, label: impl Into<String>) -> Self {
        Self {
            stream: Some(stream),
            decoder: Decoder::new(),
            stale_frames: 0,
            label: label.into(),
        }
    }

    /// Sends one request.
    ///
    /// Replies to earlier requests are discarded first, so a later
    /// [`await_ack`](Self::await_ack) only sees replies to this one.
    pub async fn send(&mut self, packet: &RequestPacket) -> Result<(), ClientError> {
        let encoded = Encoder::encode_request(packet)?;
        self.discard_stale().await?;

        let stream = self.stream.as_mut().ok_or(ClientError::NotConnected)?;
        tracing::debug!(
            device = %self.label,
            op = %packet.opcode(),
            bytes = encoded.len(),
            "Sending request"
        );
        stream.write_all(&encoded).await.map_err(ClientError::Io)?;
        stream.flush().await.map_err(ClientError::Io)?;
        Ok(())
    }

    /// Drops replies to earlier requests.
    ///
    /// Complete frames already received or ready on the stream are dropped.
    /// A partial frame stays buffered so the stream keeps its frame
    /// alignment, and is skipped by `await_ack` once its tail arrives.
    async fn discard_stale(&mut self) -> Result<(), ClientError> {
        let stream = self.stream.as_mut().ok_or(ClientError::NotConnected)?;
        let mut buf = [0u8; READ_BUFFER_SIZE];

        // A zero timeout still polls the read once: only ready bytes are taken.
        while let Ok(read) = tokio::time::timeout(Duration::ZERO, stream.read(&mut buf)).await {
            let n = read.map_err(ClientError::Io)?;
            if n == 0 {
                tracing::debug!(device = %self.label, "Connection closed (0 bytes)");
                self.stream = None;
                return Err(ClientError::ConnectionClosed);
            }
            self.decoder.extend(&buf[..n]);
        }

        let mut dropped = 0usize;
        while self.decoder.decode_frame()?.is_some() {
            dropped += 1;
        }
        let partial = self.decoder.buffered();
        self.stale_frames = usize::from(partial > 0);

        if dropped > 0 || partial > 0 {
            tracing::debug!(
                device = %self.label,
                frames = dropped,
                partial_bytes = partial,
                "Discarding stale replies"
            );
        }
        Ok(())
    }

    /// Waits up to `timeout` for an ACK frame.
    ///
    /// Debug frames received on the way are collected into
    /// [`Ack::device_output`]; other frames are skipped.
    pub async fn await_ack(&mut self, timeout: Duration) -> Result<Ack, ClientError> {
        let deadline = Instant::now() + timeout;
        let mut device_output = Vec::new();
        let mut buf = [0u8; READ_BUFFER_SIZE];

        loop {
            while let Some(frame) = self.decoder.decode_frame()? {
                if self.stale_frames > 0 {
                    self.stale_frames -= 1;
                    tracing::debug!(
                        device = %self.label,
                        cmd = %format!("{:#06x}", frame.command),
                        "Dropping reply to an earlier request"
                    );
                    continue;
                }
                match frame.kind() {
                    ReplyKind::Ack => {
                        tracing::debug!(device = %self.label, "ACK received");
                        return Ok(Ack {
                            frame,
                            device_output,
                        });
                    }
                    ReplyKind::DebugString => {
                        if let Some(text) = frame.debug_string()? {
                            tracing::info!(device = %self.label, "{}", text);
                            device_output.push(text);
                        }
                    }
                    ReplyKind::DebugIntegers => {
                        let text = format!(
                            "#db# {:08x}, {:08x}, {:08x}",
                            frame.args[0], frame.args[1], frame.args[2]
                        );
                        tracing::info!(device = %self.label, "{}", text);
                        device_output.push(text);
                    }
                    ReplyKind::Other(cmd) => {
                        tracing::debug!(cmd = %format!("{:#06x}", cmd), "Skipping frame");
                    }
                }
            }

            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                tracing::debug!(device = %self.label, "ACK timeout");
                return Err(ClientError::Timeout);
            }

            let stream = self.stream.as_mut().ok_or(ClientError::NotConnected)?;
            let n = tokio::time::timeout(remaining, stream.read(&mut buf))
                .await
                .map_err(|_| {
                    tracing::debug!(device = %self.label, "ACK timeout");
                    ClientError::Timeout
                })?
                .map_err(ClientError::Io)?;

            tracing::trace!(device = %self.label, bytes = n, "Received data");
            if n == 0 {
                tracing::debug!(device = %self.label, "Connection closed (0 bytes)");
                self.stream = None;
                return Err(ClientError::ConnectionClosed);
            }
            self.decoder.extend(&buf[..n]);
        }
    }

    /// Returns whether the stream is still open.
    pub fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    /// Name of the device, for display.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Closes the connection.
    pub async fn close(&mut self) -> Result<(), ClientError> {
        if let Some(mut stream) = self.stream.take() {
            tracing::debug!(device = %self.label, "Closing connection");
            let _ = stream.shutdown().await;
        }
        self.decoder.clear();
        self.stale_frames = 0;
        Ok(())
    }
}
