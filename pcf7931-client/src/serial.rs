//! Serial port setup.
//!
//! The peripheral enumerates as a USB CDC device. The baud rate is ignored by
//! CDC but still has to be set when opening the port.

use crate::error::ClientError;
use tokio_serial::{SerialPortBuilderExt, SerialStream};

/// Default baud rate for the peripheral's CDC port.
pub const DEFAULT_BAUD_RATE: u32 = 115_200;

/// Serial port configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerialConfig {
    /// Port path, e.g. `/dev/ttyACM0` or `COM3`.
    pub path: String,
    /// Baud rate.
    pub baud_rate: u32,
}

impl SerialConfig {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            baud_rate: DEFAULT_BAUD_RATE,
        }
    }

    pub fn with_baud_rate(mut self, baud_rate: u32) -> Self {
        self.baud_rate = baud_rate;
        self
    }

    /// Opens the port (8N1, no flow control).
    pub fn open(&self) -> Result<SerialStream, ClientError> {
        tracing::debug!(port = %self.path, baud_rate = self.baud_rate, "Opening serial port");

        let stream = tokio_serial::new(&self.path, self.baud_rate)
            .data_bits(tokio_serial::DataBits::Eight)
            .stop_bits(tokio_serial::StopBits::One)
            .parity(tokio_serial::Parity::None)
            .flow_control(tokio_serial::FlowControl::None)
            .open_native_async()
            .map_err(|e| {
                tracing::error!(port = %self.path, error = %e, "Failed to open serial port");
                ClientError::SerialOpen {
                    port: self.path.clone(),
                    reason: e.to_string(),
                }
            })?;

        tracing::info!(port = %self.path, "Serial port opened");
        Ok(stream)
    }
}
